//! 预览缩放状态
//!
//! 两个预览面板（原始 / 结果）共用一个缩放比例

/// 最小缩放（百分比）
pub const MIN_ZOOM: u16 = 50;
/// 最大缩放（百分比）
pub const MAX_ZOOM: u16 = 200;
/// 每次缩放步长
pub const ZOOM_STEP: u16 = 20;
/// 默认缩放
pub const DEFAULT_ZOOM: u16 = 100;

/// 预览控制器，纯状态，无副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewController {
    zoom: u16,
}

impl Default for PreviewController {
    fn default() -> Self {
        Self { zoom: DEFAULT_ZOOM }
    }
}

impl PreviewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
        self.zoom
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.zoom = self.zoom.saturating_sub(ZOOM_STEP).max(MIN_ZOOM);
        self.zoom
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = DEFAULT_ZOOM;
    }

    /// 面板宽度，如 `"120%"`
    pub fn width_css(&self) -> String {
        format!("{}%", self.zoom)
    }

    pub fn original_title(&self) -> &'static str {
        "Original Document"
    }

    pub fn result_title(&self, highlight_only: bool) -> &'static str {
        if highlight_only {
            "Highlighted Preview"
        } else {
            "Protected Document"
        }
    }
}
