//! 审计日志同步服务 - 业务能力层
//!
//! 只负责"拉取并持有审计日志"能力，不关心提交流程

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::clients::TransformService;
use crate::error::LogSyncError;
use crate::models::AuditLogEntry;

/// 审计日志同步服务
///
/// 职责：
/// - 每次都拉取完整日志，整体替换本地副本
/// - 拉取失败时保留旧副本，只写诊断日志
/// - 不修改任何单条记录
pub struct AuditLogSync<S: ?Sized> {
    service: Arc<S>,
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl<S: TransformService + ?Sized> AuditLogSync<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 重新拉取完整日志
    ///
    /// # 返回
    /// 成功时返回当前条目数；失败时本地副本不变
    pub async fn refresh(&self) -> Result<usize, LogSyncError> {
        match self.service.fetch_audit_log().await {
            Ok(fresh) => {
                let count = fresh.len();
                *self.entries.write().unwrap_or_else(|p| p.into_inner()) = fresh;
                debug!("审计日志已刷新，共 {} 条", count);
                Ok(count)
            }
            Err(e) => {
                warn!("⚠️ 审计日志刷新失败，保留旧数据: {}", e);
                Err(e)
            }
        }
    }

    /// 再读一次日志，取最新的一条（用于成功通知）
    ///
    /// 不修改本地副本
    pub async fn fetch_latest(&self) -> Result<Option<AuditLogEntry>, LogSyncError> {
        let latest = self
            .service
            .fetch_audit_log()
            .await
            .map_err(|e| {
                warn!("⚠️ 读取最新审计记录失败: {}", e);
                e
            })?
            .pop();
        if let Some(entry) = &latest {
            info!("📋 最新审计记录: {}", entry.file);
        }
        Ok(latest)
    }

    /// 按时间顺序的日志副本
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// 最新的在前
    pub fn newest_first(&self) -> Vec<AuditLogEntry> {
        let mut entries = self.entries();
        entries.reverse();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
