pub mod audit;
pub mod document;
pub mod params;

pub use audit::{AuditLogEntry, TOTAL_ENTITIES_KEY};
pub use document::{Document, PDF_MEDIA_TYPE};
pub use params::{PrivacyMode, RedactionStyle, TransformParameters};
