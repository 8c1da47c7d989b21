pub mod audit;
pub mod types;

pub use audit::{AuditAction, AuditChain, AuditError, AuditEvent};
pub use types::{Notice, Point, Region, Severity};
