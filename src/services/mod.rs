pub mod audit_log;
pub mod preview;

pub use audit_log::AuditLogSync;
pub use preview::PreviewController;
