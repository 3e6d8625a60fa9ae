//! Core domain types and traits for the Noteshare blind-store services.

pub mod audit;
pub mod config;
pub mod error;
pub mod ids;
pub mod limit;
pub mod note;
pub mod traits;

pub use audit::{AuditEvent, AuditKind};
pub use config::{Config, ConfigError};
pub use error::{CoreError, CoreResult};
pub use ids::{InvalidNoteId, NoteId};
pub use limit::{OpClass, RateLimitPolicy, RateLimiter};
pub use note::{Note, Tombstone, DEFAULT_CRYPTO_VERSION};
pub use traits::{AuditSink, NoteBackend};
