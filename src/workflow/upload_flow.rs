//! 提交流程 - 流程层
//!
//! 核心职责：定义"一次提交"的完整状态迁移
//!
//! 流程顺序：
//! 1. 校验（没有文档 / 正在提交 → 直接拒绝）
//! 2. Idle|Success|Failed → Submitting
//! 3. 上传 → 成功：安装结果句柄 → 刷新审计日志 → 读取最新记录 → Success
//! 4. 上传失败 → Failed（不创建句柄，不刷新日志）

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clients::TransformService;
use crate::error::ValidationError;
use crate::infrastructure::{HandleRegistry, HandleRole};
use crate::models::{Document, TransformParameters};
use crate::services::AuditLogSync;
use crate::workflow::{SubmissionCtx, SubmitOutcome, UploadState};

/// 提交流程
///
/// - 同一时间最多一个提交在进行
/// - 状态通过 watch 通道发布，通知层订阅即可
/// - 不做重试，不做取消
pub struct UploadFlow<S: ?Sized> {
    service: Arc<S>,
    registry: Arc<HandleRegistry>,
    audit_log: Arc<AuditLogSync<S>>,
    state: watch::Sender<UploadState>,
    next_seq: AtomicU64,
}

impl<S: TransformService + ?Sized> UploadFlow<S> {
    /// 创建新的提交流程
    pub fn new(
        service: Arc<S>,
        registry: Arc<HandleRegistry>,
        audit_log: Arc<AuditLogSync<S>>,
    ) -> Self {
        let (state, _) = watch::channel(UploadState::Idle);
        Self {
            service,
            registry,
            audit_log,
            state,
            next_seq: AtomicU64::new(1),
        }
    }

    /// 当前状态的快照
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    /// 订阅状态迁移
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.borrow().is_submitting()
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// 提交文档
    ///
    /// # 参数
    /// - `document`: 当前选中的文档，没有选中时直接拒绝
    /// - `params`: 参数快照
    ///
    /// # 返回
    /// 被拒绝时状态不变，也不会发出任何请求
    pub async fn submit(
        &self,
        document: Option<&Document>,
        params: TransformParameters,
    ) -> SubmitOutcome {
        let Some(document) = document else {
            debug!("没有选择文档，忽略提交");
            return SubmitOutcome::Rejected(ValidationError::NoDocument);
        };

        let Some(ctx) = self.begin(document, params) else {
            warn!("⚠️ 上一次提交尚未完成，忽略本次提交: {}", document.name());
            return SubmitOutcome::Rejected(ValidationError::Busy);
        };

        info!("{} 📤 正在提交 ({})...", ctx, params);

        match self.service.upload(document, &params).await {
            Ok(artifact) => {
                let size = artifact.len();
                let result = self.registry.install(HandleRole::Result, artifact);
                info!("{} ✓ 转换成功，结果 {} bytes -> {}", ctx, size, result.url());

                // 日志同步失败不影响本次提交的结果
                if let Err(e) = self.audit_log.refresh().await {
                    debug!("{} 审计日志刷新失败: {}", ctx, e);
                }
                let latest = self.audit_log.fetch_latest().await.unwrap_or_else(|e| {
                    debug!("{} 无法读取最新审计记录: {}", ctx, e);
                    None
                });

                info!("{} ✅ 提交完成，用时 {} ms", ctx, ctx.elapsed_ms());
                self.state.send_replace(UploadState::Success {
                    ctx,
                    result: result.clone(),
                    latest,
                });
                SubmitOutcome::Succeeded(result)
            }
            Err(err) => {
                error!("{} ❌ 提交失败: {}", ctx, err);
                self.state.send_replace(UploadState::Failed {
                    ctx,
                    error: err.clone(),
                });
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// 原子地进入 Submitting，正在提交时返回 None
    fn begin(&self, document: &Document, params: TransformParameters) -> Option<SubmissionCtx> {
        let mut started = None;
        self.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let ctx = SubmissionCtx::new(seq, document.name(), params);
            *state = UploadState::Submitting { ctx: ctx.clone() };
            started = Some(ctx);
            true
        });
        started
    }

    /// 回到 Idle 并回收原始文档和结果的句柄
    ///
    /// 正在提交时不允许重置（请求无法取消），返回 false
    pub fn reset(&self) -> bool {
        let registry = &self.registry;
        let reset = self.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            registry.release_all();
            *state = UploadState::Idle;
            true
        });
        if reset {
            info!("🔄 工作流已重置");
        } else {
            warn!("⚠️ 提交进行中，无法重置");
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LogSyncError, SubmitError};
    use crate::models::{AuditLogEntry, PrivacyMode, RedactionStyle, PDF_MEDIA_TYPE};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// 内存中的转换服务
    #[derive(Default)]
    struct FakeService {
        uploads: AtomicUsize,
        log_reads: AtomicUsize,
        upload_result: Mutex<Option<Result<Vec<u8>, SubmitError>>>,
        log: Mutex<Vec<AuditLogEntry>>,
        log_fails: Mutex<bool>,
        /// 只让第 N 次读取失败（从 1 开始）
        fail_log_read: Option<usize>,
        /// 设置后上传会等待放行
        gate: Option<Arc<Notify>>,
        last_params: Mutex<Option<TransformParameters>>,
    }

    #[async_trait]
    impl TransformService for FakeService {
        async fn upload(
            &self,
            _document: &Document,
            params: &TransformParameters,
        ) -> Result<Vec<u8>, SubmitError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock().unwrap() = Some(*params);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.upload_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(b"%PDF-redacted".to_vec()))
        }

        async fn fetch_audit_log(&self) -> Result<Vec<AuditLogEntry>, LogSyncError> {
            let read = self.log_reads.fetch_add(1, Ordering::SeqCst) + 1;
            if *self.log_fails.lock().unwrap() || self.fail_log_read == Some(read) {
                return Err(LogSyncError::Unavailable("log offline".into()));
            }
            Ok(self.log.lock().unwrap().clone())
        }
    }

    fn entry(file: &str, signatures: u64) -> AuditLogEntry {
        AuditLogEntry {
            timestamp: "2024-03-01T10:00:00".to_string(),
            file: file.to_string(),
            privacy_mode: "signer".to_string(),
            redaction_style: "blur".to_string(),
            signatures_detected: signatures,
            entities_redacted: BTreeMap::from([("SIGNER".to_string(), 1)]),
            highlight_only: false,
            error: None,
        }
    }

    fn doc() -> Document {
        Document::new("contract.pdf", PDF_MEDIA_TYPE, b"%PDF-1.4".to_vec()).unwrap()
    }

    fn flow(service: Arc<FakeService>) -> UploadFlow<FakeService> {
        let audit_log = Arc::new(AuditLogSync::new(service.clone()));
        UploadFlow::new(service, Arc::new(HandleRegistry::new()), audit_log)
    }

    fn params() -> TransformParameters {
        TransformParameters {
            privacy_mode: PrivacyMode::Signer,
            redaction_style: RedactionStyle::Blur,
            highlight_only: false,
        }
    }

    #[tokio::test]
    async fn test_submit_without_document_is_noop() {
        let service = Arc::new(FakeService::default());
        let flow = flow(service.clone());

        let outcome = flow.submit(None, params()).await;

        assert_eq!(outcome, SubmitOutcome::Rejected(ValidationError::NoDocument));
        assert_eq!(flow.state(), UploadState::Idle);
        assert_eq!(service.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(service.log_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_installs_handle_and_reads_log_twice() {
        let service = Arc::new(FakeService::default());
        service.log.lock().unwrap().push(entry("contract.pdf", 2));
        let flow = flow(service.clone());

        let outcome = flow.submit(Some(&doc()), params()).await;

        let SubmitOutcome::Succeeded(handle) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(&*flow.registry().resolve(&handle).unwrap(), b"%PDF-redacted");
        assert_eq!(service.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(service.log_reads.load(Ordering::SeqCst), 2);
        assert_eq!(*service.last_params.lock().unwrap(), Some(params()));

        match flow.state() {
            UploadState::Success { result, latest, ctx } => {
                assert_eq!(result, handle);
                assert_eq!(latest.unwrap().signatures_detected, 2);
                assert_eq!(ctx.seq, 1);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_success_revokes_previous_result() {
        let service = Arc::new(FakeService::default());
        let flow = flow(service);

        let SubmitOutcome::Succeeded(first) = flow.submit(Some(&doc()), params()).await else {
            panic!("first submit failed");
        };
        let SubmitOutcome::Succeeded(second) = flow.submit(Some(&doc()), params()).await else {
            panic!("second submit failed");
        };

        assert!(!flow.registry().is_live(&first));
        assert!(flow.registry().is_live(&second));
        assert_eq!(flow.registry().current(HandleRole::Result), Some(second));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result_and_skips_log() {
        let service = Arc::new(FakeService::default());
        let flow = flow(service.clone());

        let SubmitOutcome::Succeeded(previous) = flow.submit(Some(&doc()), params()).await else {
            panic!("first submit failed");
        };
        let reads_before = service.log_reads.load(Ordering::SeqCst);

        *service.upload_result.lock().unwrap() = Some(Err(SubmitError::Service {
            status: 422,
            message: "corrupt PDF".to_string(),
        }));
        let outcome = flow.submit(Some(&doc()), params()).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(service.log_reads.load(Ordering::SeqCst), reads_before);
        assert_eq!(flow.registry().current(HandleRole::Result), Some(previous));
        assert_eq!(flow.registry().stats().created, 1);
        match flow.state() {
            UploadState::Failed { error, .. } => assert_eq!(error.user_message(), "corrupt PDF"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_failure_still_reaches_success() {
        let service = Arc::new(FakeService::default());
        *service.log_fails.lock().unwrap() = true;
        let flow = flow(service);

        let outcome = flow.submit(Some(&doc()), params()).await;

        assert!(outcome.is_success());
        assert!(matches!(flow.state(), UploadState::Success { latest: None, .. }));
    }

    #[tokio::test]
    async fn test_latest_entry_failure_keeps_refreshed_log() {
        let service = Arc::new(FakeService {
            fail_log_read: Some(2),
            ..Default::default()
        });
        service.log.lock().unwrap().push(entry("contract.pdf", 2));
        let audit_log = Arc::new(AuditLogSync::new(service.clone()));
        let flow = UploadFlow::new(
            service.clone(),
            Arc::new(HandleRegistry::new()),
            audit_log.clone(),
        );

        let outcome = flow.submit(Some(&doc()), params()).await;

        assert!(outcome.is_success());
        assert_eq!(service.log_reads.load(Ordering::SeqCst), 2);
        assert!(matches!(flow.state(), UploadState::Success { latest: None, .. }));
        assert_eq!(audit_log.len(), 1);
        assert_eq!(audit_log.entries()[0].file, "contract.pdf");
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected_while_submitting() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let flow = flow(service.clone());
        let document = doc();

        let first = flow.submit(Some(&document), params());
        let second = async {
            tokio::task::yield_now().await;
            assert!(flow.is_submitting());
            let outcome = flow.submit(Some(&document), params()).await;
            // 第二次被拒绝时状态仍是 Submitting，也不能重置
            assert!(flow.is_submitting());
            assert!(!flow.reset());
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_success());
        assert_eq!(second, SubmitOutcome::Rejected(ValidationError::Busy));
        assert_eq!(service.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_revokes_all_handles() {
        let service = Arc::new(FakeService::default());
        let flow = flow(service);
        let original = flow.registry().install(HandleRole::Original, b"in".to_vec());
        let SubmitOutcome::Succeeded(result) = flow.submit(Some(&doc()), params()).await else {
            panic!("submit failed");
        };

        let mut observer = flow.subscribe();
        assert!(flow.reset());

        assert!(observer.has_changed().unwrap());
        assert_eq!(*observer.borrow_and_update(), UploadState::Idle);
        assert!(!flow.registry().is_live(&original));
        assert!(!flow.registry().is_live(&result));
        assert_eq!(flow.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn test_observer_sees_submitting_then_success() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let flow = flow(service);
        let mut observer = flow.subscribe();
        let document = doc();

        let submit = flow.submit(Some(&document), params());
        let watch = async {
            observer.changed().await.unwrap();
            let seen = observer.borrow_and_update().name();
            gate.notify_one();
            observer.changed().await.unwrap();
            (seen, observer.borrow_and_update().name())
        };

        let (_, (first_seen, second_seen)) = tokio::join!(submit, watch);
        assert_eq!(first_seen, "Submitting");
        assert_eq!(second_seen, "Success");
    }
}
