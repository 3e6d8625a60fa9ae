//! Note and tombstone domain records.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::ids::NoteId;

/// Crypto scheme tag assumed when a write request omits one.
pub const DEFAULT_CRYPTO_VERSION: &str = "v1";

/// Immutable encrypted-payload record.
///
/// The service never inspects `ciphertext` or `hmac`; both are stored and
/// returned byte-for-byte. All fields are fixed at creation — only the
/// record's existence (present / tombstoned / absent) changes over time.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,
    pub ciphertext: Bytes,
    pub hmac: Bytes,
    /// Client-side scheme tag, opaque to the store.
    pub crypto_version: String,
    pub insert_time: DateTime<Utc>,
    pub expire_time: DateTime<Utc>,
}

impl Note {
    /// Combined payload size (ciphertext + authentication tag) in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        (self.ciphertext.len() + self.hmac.len()) as u64
    }

    /// True once the retention window has elapsed.
    ///
    /// An expired note is only *eligible* for purge; it stays readable
    /// until the sweeper actually deletes it.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time <= now
    }
}

/// Durable marker that an identifier existed and was purged after expiry.
///
/// Distinguishes "Gone" from "Not Found" on reads. Written atomically with
/// the note deletion and never updated; pruned after a bounded retention
/// horizon, at which point the id degrades to "Not Found".
#[derive(Debug, Clone)]
pub struct Tombstone {
    pub id: NoteId,
    pub purged_at: DateTime<Utc>,
}
