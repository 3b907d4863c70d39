//! 工作流外壳 - 编排层
//!
//! ## 职责
//!
//! 组合所有组件，持有规范的转换参数和当前选中的文档。
//!
//! ## 核心功能
//!
//! 1. **挂载**：初始化时拉取一次审计日志
//! 2. **选择文档**：为原始文档创建预览句柄（替换旧句柄）
//! 3. **参数编辑**：隐私模式、遮盖样式、只高亮
//! 4. **提交**：取参数快照，委托 `UploadFlow`
//! 5. **重置**：回收全部句柄，清空文档，参数保留

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::TransformService;
use crate::error::HandleError;
use crate::infrastructure::{DisplayHandle, HandleRegistry, HandleRole};
use crate::models::{Document, PrivacyMode, RedactionStyle, TransformParameters};
use crate::services::{AuditLogSync, PreviewController};
use crate::workflow::{NotificationController, SubmitOutcome, UploadFlow, UploadState};

/// 工作流外壳
pub struct WorkflowShell<S: ?Sized> {
    params: TransformParameters,
    document: Option<Document>,
    registry: Arc<HandleRegistry>,
    audit_log: Arc<AuditLogSync<S>>,
    upload: UploadFlow<S>,
    preview: PreviewController,
    notifications: NotificationController,
}

impl<S: TransformService + ?Sized> WorkflowShell<S> {
    /// 创建新的工作流
    pub fn new(service: Arc<S>, params: TransformParameters) -> Self {
        let registry = Arc::new(HandleRegistry::new());
        let audit_log = Arc::new(AuditLogSync::new(service.clone()));
        let upload = UploadFlow::new(service, registry.clone(), audit_log.clone());
        let notifications = NotificationController::new(upload.subscribe());
        Self {
            params,
            document: None,
            registry,
            audit_log,
            upload,
            preview: PreviewController::new(),
            notifications,
        }
    }

    /// 挂载：拉取初始审计日志，失败只记录诊断日志
    pub async fn mount(&self) {
        match self.audit_log.refresh().await {
            Ok(count) => info!("📋 已加载 {} 条审计记录", count),
            Err(e) => debug!("初始审计日志不可用: {}", e),
        }
    }

    /// 选择文档，替换之前的原始预览
    pub fn select_document(&mut self, document: Document) -> DisplayHandle {
        let handle = self
            .registry
            .install(HandleRole::Original, document.bytes().clone());
        info!("📄 已选择文档: {} ({} bytes)", document.name(), document.len());
        self.document = Some(document);
        handle
    }

    /// 取消选择，回收原始预览
    pub fn clear_document(&mut self) {
        self.document = None;
        self.registry.release(HandleRole::Original);
    }

    pub fn set_privacy_mode(&mut self, mode: PrivacyMode) {
        self.params.privacy_mode = mode;
    }

    pub fn set_redaction_style(&mut self, style: RedactionStyle) {
        self.params.redaction_style = style;
    }

    pub fn set_highlight_only(&mut self, highlight_only: bool) {
        self.params.highlight_only = highlight_only;
    }

    pub fn params(&self) -> TransformParameters {
        self.params
    }

    /// 提交按钮是否可用
    pub fn can_submit(&self) -> bool {
        self.document.is_some() && !self.upload.is_submitting()
    }

    /// 用当前参数的快照提交当前文档
    pub async fn submit(&mut self) -> SubmitOutcome {
        let snapshot = self.params;
        let outcome = self.upload.submit(self.document.as_ref(), snapshot).await;
        self.notifications.sync();
        outcome
    }

    /// 重置工作流，参数保留
    pub fn reset(&mut self) -> bool {
        if !self.upload.reset() {
            return false;
        }
        self.document = None;
        self.notifications.sync();
        true
    }

    /// 拆除：回收所有句柄
    pub fn teardown(self) {
        self.registry.release_all();
        debug!("工作流已拆除");
    }

    pub fn state(&self) -> UploadState {
        self.upload.state()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn original_handle(&self) -> Option<DisplayHandle> {
        self.registry.current(HandleRole::Original)
    }

    pub fn result_handle(&self) -> Option<DisplayHandle> {
        self.registry.current(HandleRole::Result)
    }

    /// 当前结果的内容，没有结果或已回收时报错
    pub fn result_bytes(&self) -> Result<Arc<[u8]>, HandleError> {
        let handle = self
            .result_handle()
            .ok_or(HandleError::Missing(HandleRole::Result))?;
        self.registry.resolve(&handle)
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    pub fn audit_log(&self) -> &AuditLogSync<S> {
        &self.audit_log
    }

    pub fn upload(&self) -> &UploadFlow<S> {
        &self.upload
    }

    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewController {
        &mut self.preview
    }

    pub fn notifications(&self) -> &NotificationController {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationController {
        &mut self.notifications
    }
}
