//! 通知控制器
//!
//! 订阅提交状态：成功时给出摘要和下载动作，失败时给出错误文本

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, HandleError};
use crate::infrastructure::{DisplayHandle, HandleRegistry};
use crate::models::AuditLogEntry;
use crate::workflow::UploadState;

/// 成功摘要，来自最新的审计记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub file: String,
    pub privacy_mode: String,
    pub redaction_style: String,
    pub signatures_detected: u64,
    pub entities_redacted: BTreeMap<String, u64>,
    pub highlight_only: bool,
}

impl SubmissionSummary {
    pub fn from_entry(entry: &AuditLogEntry) -> Self {
        Self {
            file: entry.file.clone(),
            privacy_mode: entry.privacy_mode.clone(),
            redaction_style: entry.redaction_style.clone(),
            signatures_detected: entry.signatures_detected,
            entities_redacted: entry.entities_redacted.clone(),
            highlight_only: entry.highlight_only,
        }
    }

    /// 逐行展示的摘要
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("File: {}", self.file),
            format!("Mode: {}", self.privacy_mode),
            format!("Style: {}", self.redaction_style),
            format!("Signatures Detected: {}", self.signatures_detected),
        ];
        if self.entities_redacted.is_empty() {
            lines.push("Entities Redacted: None".to_string());
        } else {
            lines.push("Entities Redacted:".to_string());
            lines.extend(
                self.entities_redacted
                    .iter()
                    .map(|(kind, count)| format!("{}: {}", kind, count)),
            );
        }
        if self.highlight_only {
            lines.push("Highlight Only: Yes".to_string());
        }
        lines
    }
}

impl fmt::Display for SubmissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// "下载结果"动作
///
/// 引用的是成功状态里的结果句柄；句柄被回收后执行会直接报错
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAction {
    handle: DisplayHandle,
    file_name: String,
}

impl DownloadAction {
    pub fn handle(&self) -> &DisplayHandle {
        &self.handle
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 读取结果内容
    pub fn bytes(&self, registry: &HandleRegistry) -> Result<Arc<[u8]>, HandleError> {
        registry.resolve(&self.handle)
    }

    /// 保存到目录，返回写入的文件路径
    pub async fn save_to(&self, registry: &HandleRegistry, dir: &Path) -> AppResult<PathBuf> {
        let bytes = self.bytes(registry)?;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::file(dir.display().to_string(), e))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;
        info!("💾 结果已保存: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// 成功通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessNotice {
    /// 读取最新审计记录失败时没有摘要
    pub summary: Option<SubmissionSummary>,
    pub download: DownloadAction,
    pub dismissed: bool,
}

/// 当前要展示的通知
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Notification {
    #[default]
    None,
    Success(SuccessNotice),
    Error(String),
}

/// 通知控制器
///
/// 职责：
/// - 观察提交状态迁移
/// - 同一时间只保留一条错误，新的提交开始时清空
/// - 关闭成功通知不影响流程状态和句柄
pub struct NotificationController {
    receiver: watch::Receiver<UploadState>,
    current: Notification,
}

impl NotificationController {
    pub fn new(mut receiver: watch::Receiver<UploadState>) -> Self {
        let current = Self::compose(&receiver.borrow_and_update());
        Self { receiver, current }
    }

    /// 根据状态生成通知
    pub fn compose(state: &UploadState) -> Notification {
        match state {
            UploadState::Idle | UploadState::Submitting { .. } => Notification::None,
            UploadState::Success {
                ctx,
                result,
                latest,
            } => Notification::Success(SuccessNotice {
                summary: latest.as_ref().map(SubmissionSummary::from_entry),
                download: DownloadAction {
                    handle: result.clone(),
                    file_name: ctx.result_file_name(),
                },
                dismissed: false,
            }),
            UploadState::Failed { error, .. } => Notification::Error(error.user_message()),
        }
    }

    /// 应用尚未处理的状态迁移
    pub fn sync(&mut self) -> &Notification {
        if self.receiver.has_changed().unwrap_or(false) {
            let next = Self::compose(&self.receiver.borrow_and_update());
            debug!("通知更新: {:?} -> {:?}", self.current_kind(), next_kind(&next));
            self.current = next;
        }
        &self.current
    }

    /// 等待下一次状态迁移；流程被销毁时返回 None
    pub async fn next_transition(&mut self) -> Option<&Notification> {
        self.receiver.changed().await.ok()?;
        self.current = Self::compose(&self.receiver.borrow_and_update());
        Some(&self.current)
    }

    pub fn current(&self) -> &Notification {
        &self.current
    }

    /// 关闭成功通知
    pub fn dismiss(&mut self) {
        if let Notification::Success(notice) = &mut self.current {
            notice.dismissed = true;
        }
    }

    /// 未关闭的成功通知
    pub fn success(&self) -> Option<&SuccessNotice> {
        match &self.current {
            Notification::Success(notice) if !notice.dismissed => Some(notice),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.current {
            Notification::Error(message) => Some(message),
            _ => None,
        }
    }

    fn current_kind(&self) -> &'static str {
        next_kind(&self.current)
    }
}

fn next_kind(notification: &Notification) -> &'static str {
    match notification {
        Notification::None => "None",
        Notification::Success(_) => "Success",
        Notification::Error(_) => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmitError;
    use crate::infrastructure::HandleRole;
    use crate::models::TransformParameters;
    use crate::workflow::SubmissionCtx;

    fn ctx() -> SubmissionCtx {
        SubmissionCtx::new(1, "contract.pdf", TransformParameters::default())
    }

    fn latest() -> AuditLogEntry {
        AuditLogEntry {
            timestamp: "2024-03-01T10:00:00".to_string(),
            file: "contract.pdf".to_string(),
            privacy_mode: "signer".to_string(),
            redaction_style: "blur".to_string(),
            signatures_detected: 2,
            entities_redacted: BTreeMap::from([("SIGNER".to_string(), 1)]),
            highlight_only: false,
            error: None,
        }
    }

    #[test]
    fn test_success_summary_lines() {
        let summary = SubmissionSummary::from_entry(&latest());
        let lines = summary.lines();
        assert!(lines.contains(&"Signatures Detected: 2".to_string()));
        assert!(lines.contains(&"SIGNER: 1".to_string()));
        assert!(lines.contains(&"Mode: signer".to_string()));
    }

    #[test]
    fn test_error_replaced_by_next_submission() {
        let (tx, rx) = watch::channel(UploadState::Idle);
        let mut notifications = NotificationController::new(rx);

        tx.send_replace(UploadState::Failed {
            ctx: ctx(),
            error: SubmitError::transport("connection refused"),
        });
        assert_eq!(
            notifications.sync(),
            &Notification::Error("Network error: connection refused".to_string())
        );

        tx.send_replace(UploadState::Submitting { ctx: ctx() });
        assert_eq!(notifications.sync(), &Notification::None);
        assert_eq!(notifications.error_message(), None);
    }

    #[test]
    fn test_dismiss_survives_sync_without_transition() {
        let registry = HandleRegistry::new();
        let handle = registry.install(HandleRole::Result, b"out".to_vec());
        let (tx, rx) = watch::channel(UploadState::Idle);
        let mut notifications = NotificationController::new(rx);

        tx.send_replace(UploadState::Success {
            ctx: ctx(),
            result: handle.clone(),
            latest: None,
        });
        notifications.sync();
        let notice = notifications.success().unwrap();
        assert!(notice.summary.is_none());
        assert_eq!(notice.download.file_name(), "redacted_contract.pdf");

        notifications.dismiss();
        notifications.sync();
        assert!(notifications.success().is_none());
        assert!(registry.is_live(&handle));
    }

    #[test]
    fn test_download_after_revoke_fails_loudly() {
        let registry = HandleRegistry::new();
        let handle = registry.install(HandleRole::Result, b"out".to_vec());
        let notification = NotificationController::compose(&UploadState::Success {
            ctx: ctx(),
            result: handle,
            latest: Some(latest()),
        });
        let Notification::Success(notice) = notification else {
            panic!("expected success notice");
        };

        assert_eq!(&*notice.download.bytes(&registry).unwrap(), b"out");
        registry.release_all();
        assert!(matches!(
            notice.download.bytes(&registry),
            Err(HandleError::Revoked { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_to_writes_result_file() {
        let registry = HandleRegistry::new();
        let handle = registry.install(HandleRole::Result, b"%PDF-out".to_vec());
        let Notification::Success(notice) = NotificationController::compose(&UploadState::Success {
            ctx: ctx(),
            result: handle,
            latest: None,
        }) else {
            panic!("expected success notice");
        };

        let dir = tempfile::tempdir().unwrap();
        let path = notice.download.save_to(&registry, dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "redacted_contract.pdf");
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-out");
    }

    #[tokio::test]
    async fn test_next_transition_ends_when_flow_dropped() {
        let (tx, rx) = watch::channel(UploadState::Idle);
        let mut notifications = NotificationController::new(rx);
        drop(tx);
        assert!(notifications.next_transition().await.is_none());
    }
}
