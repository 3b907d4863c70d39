//! 提交上下文
//!
//! 封装"这是第几次提交、提交的是哪个文件、用的什么参数"这一信息

use std::fmt::Display;

use chrono::{DateTime, Local};

use crate::models::TransformParameters;

/// 一次提交的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCtx {
    /// 提交序号（从 1 开始）
    pub seq: u64,

    /// 文件名
    pub file_name: String,

    /// 提交时的参数快照
    pub params: TransformParameters,

    /// 开始时间
    pub started_at: DateTime<Local>,
}

impl SubmissionCtx {
    pub fn new(seq: u64, file_name: impl Into<String>, params: TransformParameters) -> Self {
        Self {
            seq,
            file_name: file_name.into(),
            params,
            started_at: Local::now(),
        }
    }

    /// 结果文件名，与服务端的下载名一致
    pub fn result_file_name(&self) -> String {
        format!("redacted_{}", self.file_name)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Local::now() - self.started_at).num_milliseconds()
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[提交 #{} {}]", self.seq, self.file_name)
    }
}
