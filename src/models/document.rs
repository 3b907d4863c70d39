use std::path::Path;
use std::sync::Arc;

use tokio::fs;

use crate::error::{AppError, AppResult, ValidationError};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 用户选择的文档
///
/// 内容用 `Arc` 共享，提交时克隆文档不会复制字节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl Document {
    /// 创建文档，只接受 PDF
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let media_type = media_type.into();
        if !media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
            return Err(ValidationError::UnsupportedMediaType { name, media_type });
        }
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ValidationError::EmptyDocument { name });
        }
        Ok(Self {
            name,
            media_type: PDF_MEDIA_TYPE.to_string(),
            bytes,
        })
    }

    /// 从磁盘读取 PDF 文件
    pub async fn load(path: &Path) -> AppResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for(path);
        if media_type != PDF_MEDIA_TYPE {
            return Err(ValidationError::UnsupportedMediaType {
                name,
                media_type: media_type.to_string(),
            }
            .into());
        }

        let bytes = fs::read(path)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;

        Ok(Self::new(name, media_type, bytes)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 是否以 `%PDF` 开头
    pub fn has_pdf_signature(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

/// 根据扩展名推断媒体类型
pub fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MEDIA_TYPE,
        _ => "application/octet-stream",
    }
}
