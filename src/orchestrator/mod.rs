//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `shell` - 工作流外壳
//! - 持有转换参数和当前文档
//! - 组合句柄登记表、审计日志、提交流程、预览和通知
//!
//! ### `batch_runner` - 批量文档处理器
//! - 命令行入口，逐个提交 PDF 并保存结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (处理 Vec<PathBuf>)
//!     ↓
//! shell::WorkflowShell (持有参数 / 文档)
//!     ↓
//! workflow::UploadFlow (处理单次提交)
//!     ↓
//! services (能力层：audit_log / preview)
//!     ↓
//! infrastructure (基础设施：HandleRegistry) + clients (SigSecureClient)
//! ```

pub mod batch_runner;
pub mod shell;

pub use batch_runner::App;
pub use shell::WorkflowShell;
