use thiserror::Error;

/// Canonical error type for note store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No record and no tombstone exist for the identifier, or the
    /// identifier failed codec validation.
    #[error("note `{id}` was not found")]
    NotFound {
        /// Identifier as supplied by the caller.
        id: String,
    },

    /// The note existed but was purged after its retention window elapsed.
    #[error("note `{id}` expired and was purged")]
    Gone {
        /// Identifier of the purged note.
        id: String,
    },

    /// A record with this identifier already exists.
    #[error("note `{id}` already exists")]
    AlreadyExists {
        /// Identifier that conflicts.
        id: String,
    },

    /// Identifier assignment kept colliding; practically unreachable with a
    /// 48-bit random prefix unless the backend is misbehaving.
    #[error("identifier assignment failed after {attempts} attempts")]
    IdentifierExhausted {
        /// Number of generate-and-insert attempts made.
        attempts: u32,
    },

    /// Input data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistence-layer failure. The message is for operator logs only and
    /// must never be surfaced to clients verbatim.
    #[error("storage error: {0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a `Gone` variant.
    #[must_use]
    pub fn gone(id: impl Into<String>) -> Self {
        Self::Gone { id: id.into() }
    }

    /// Creates an `AlreadyExists` variant.
    #[must_use]
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates a `Storage` variant.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
