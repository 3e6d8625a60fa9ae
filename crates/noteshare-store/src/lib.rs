//! Note persistence, audit buffering, and the expiry sweeper.

pub mod audit_log;
pub mod memory;
pub mod store;
pub mod sweeper;

pub use audit_log::AuditLog;
pub use memory::{MemoryAuditSink, MemoryNoteBackend};
pub use store::NoteStore;
pub use sweeper::ExpirySweeper;
