//! 集成测试共用的内存转换服务
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sigsecure_client::models::PDF_MEDIA_TYPE;
use sigsecure_client::{
    AuditLogEntry, Document, LogSyncError, SubmitError, TransformParameters, TransformService,
};

/// 记录调用次数的内存服务
///
/// 上传成功时会像真实服务一样追加一条审计记录
#[derive(Default)]
pub struct RecordingService {
    pub uploads: AtomicUsize,
    pub log_reads: AtomicUsize,
    pub next_upload: Mutex<Option<Result<Vec<u8>, SubmitError>>>,
    pub log: Mutex<Vec<AuditLogEntry>>,
    pub log_offline: Mutex<bool>,
    pub seen_params: Mutex<Vec<TransformParameters>>,
    pub signatures_per_upload: u64,
}

impl RecordingService {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn log_reads(&self) -> usize {
        self.log_reads.load(Ordering::SeqCst)
    }

    pub fn fail_next_upload(&self, err: SubmitError) {
        *self.next_upload.lock().unwrap() = Some(Err(err));
    }

    pub fn set_log_offline(&self, offline: bool) {
        *self.log_offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl TransformService for RecordingService {
    async fn upload(
        &self,
        document: &Document,
        params: &TransformParameters,
    ) -> Result<Vec<u8>, SubmitError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.seen_params.lock().unwrap().push(*params);

        let result = self
            .next_upload
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(format!("%PDF-redacted-{}", document.name()).into_bytes()));

        if result.is_ok() {
            self.log.lock().unwrap().push(AuditLogEntry {
                timestamp: "2024-03-01T10:00:00".to_string(),
                file: document.name().to_string(),
                privacy_mode: params.privacy_mode.to_string(),
                redaction_style: params.redaction_style.to_string(),
                signatures_detected: self.signatures_per_upload,
                entities_redacted: BTreeMap::from([("SIGNER".to_string(), 1)]),
                highlight_only: params.highlight_only,
                error: None,
            });
        }
        result
    }

    async fn fetch_audit_log(&self) -> Result<Vec<AuditLogEntry>, LogSyncError> {
        self.log_reads.fetch_add(1, Ordering::SeqCst);
        if *self.log_offline.lock().unwrap() {
            return Err(LogSyncError::Unavailable("connection reset".into()));
        }
        Ok(self.log.lock().unwrap().clone())
    }
}

pub fn pdf(name: &str) -> Document {
    Document::new(name, PDF_MEDIA_TYPE, b"%PDF-1.4 fixture".to_vec()).unwrap()
}
