//! # SigSecure Client
//!
//! 提交 PDF 做签名隐私处理（遮盖或高亮），并同步服务端审计日志的客户端
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有预览句柄这种需要手动回收的资源
//! - `HandleRegistry` - 唯一的句柄所有者，每个角色最多一个存活句柄
//! - `clients/` - `SigSecureClient`，远端转换服务的 HTTP 封装
//!
//! ### ② 业务能力层（Services）
//! - `AuditLogSync` - 拉取并持有完整审计日志
//! - `PreviewController` - 预览缩放
//!
//! ### ③ 流程层（Workflow）
//! - `UploadFlow` - 提交状态机（Idle → Submitting → Success / Failed）
//! - `NotificationController` - 根据状态迁移给出成功摘要或错误
//!
//! ### ④ 编排层（Orchestration）
//! - `WorkflowShell` - 组合以上组件，持有参数和文档
//! - `App` - 命令行批量处理入口
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{SigSecureClient, TransformService};
pub use config::Config;
pub use error::{AppError, AppResult, HandleError, LogSyncError, SubmitError, ValidationError};
pub use infrastructure::{DisplayHandle, HandleRegistry, HandleRole};
pub use models::{AuditLogEntry, Document, PrivacyMode, RedactionStyle, TransformParameters};
pub use orchestrator::{App, WorkflowShell};
pub use services::{AuditLogSync, PreviewController};
pub use workflow::{Notification, NotificationController, SubmitOutcome, UploadFlow, UploadState};
