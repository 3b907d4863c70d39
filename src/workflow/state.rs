//! 提交状态机的状态定义

use crate::error::{SubmitError, ValidationError};
use crate::infrastructure::DisplayHandle;
use crate::models::AuditLogEntry;
use crate::workflow::SubmissionCtx;

/// 提交状态
///
/// 每个变体只携带该状态下有意义的数据，不存在"加载中又有错误"的组合
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Submitting {
        ctx: SubmissionCtx,
    },
    Success {
        ctx: SubmissionCtx,
        /// 本次提交安装的结果句柄
        result: DisplayHandle,
        /// 第二次读取日志得到的最新记录，读取失败时为空
        latest: Option<AuditLogEntry>,
    },
    Failed {
        ctx: SubmissionCtx,
        error: SubmitError,
    },
}

impl UploadState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, UploadState::Submitting { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "Idle",
            UploadState::Submitting { .. } => "Submitting",
            UploadState::Success { .. } => "Success",
            UploadState::Failed { .. } => "Failed",
        }
    }

    pub fn ctx(&self) -> Option<&SubmissionCtx> {
        match self {
            UploadState::Idle => None,
            UploadState::Submitting { ctx }
            | UploadState::Success { ctx, .. }
            | UploadState::Failed { ctx, .. } => Some(ctx),
        }
    }
}

/// 一次 `submit` 调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 本地拒绝，没有发出请求，状态不变
    Rejected(ValidationError),
    /// 转换成功，返回新的结果句柄
    Succeeded(DisplayHandle),
    /// 转换失败
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }
}
