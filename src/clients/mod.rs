pub mod sigsecure_client;

pub use sigsecure_client::SigSecureClient;

use async_trait::async_trait;

use crate::error::{LogSyncError, SubmitError};
use crate::models::{AuditLogEntry, Document, TransformParameters};

/// 远端转换服务的能力
///
/// 流程层只依赖这个 trait，测试时可以替换成内存实现
#[async_trait]
pub trait TransformService: Send + Sync {
    /// 上传文档并返回转换后的 PDF 字节
    async fn upload(
        &self,
        document: &Document,
        params: &TransformParameters,
    ) -> Result<Vec<u8>, SubmitError>;

    /// 读取完整的审计日志（按时间顺序）
    async fn fetch_audit_log(&self) -> Result<Vec<AuditLogEntry>, LogSyncError>;
}
