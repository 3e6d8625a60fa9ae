use std::fmt;
use std::str::FromStr;

use crc::{Crc, CRC_16_ARC};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the cryptographically random prefix, in hex characters.
const RANDOM_LEN: usize = 12;
/// Length of the CRC-16 checksum suffix, in hex characters.
const CHECKSUM_LEN: usize = 4;
/// Total identifier length.
const ID_LEN: usize = RANDOM_LEN + CHECKSUM_LEN;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Public note identifier: 12 random lowercase hex characters followed by a
/// 4-character CRC-16 checksum of the random portion.
///
/// The checksum lets the service reject mistyped or fabricated identifiers
/// in O(1) without a storage round trip. A `NoteId` is checksum-valid by
/// construction; raw strings enter through [`NoteId::parse`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteId([u8; ID_LEN]);

/// Reason a raw string failed identifier validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidNoteId {
    #[error("identifier must be {ID_LEN} characters, got {0}")]
    WrongLength(usize),

    #[error("identifier must be lowercase hexadecimal")]
    NotLowercaseHex,

    #[error("identifier checksum mismatch")]
    ChecksumMismatch,
}

impl NoteId {
    /// Generates a fresh identifier from 6 random bytes plus checksum.
    #[must_use]
    pub fn generate() -> Self {
        let mut raw = [0u8; RANDOM_LEN / 2];
        rand::thread_rng().fill(&mut raw);

        let mut buf = [0u8; ID_LEN];
        buf[..RANDOM_LEN].copy_from_slice(hex::encode(raw).as_bytes());
        let sum = CRC16.checksum(&buf[..RANDOM_LEN]);
        buf[RANDOM_LEN..].copy_from_slice(format!("{sum:04x}").as_bytes());
        Self(buf)
    }

    /// Validates a raw string and returns the identifier on success.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNoteId`] on wrong length, non-lowercase-hex input,
    /// or a checksum that does not match the random prefix.
    pub fn parse(s: &str) -> Result<Self, InvalidNoteId> {
        if s.len() != ID_LEN {
            return Err(InvalidNoteId::WrongLength(s.len()));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(InvalidNoteId::NotLowercaseHex);
        }

        let bytes = s.as_bytes();
        let sum = CRC16.checksum(&bytes[..RANDOM_LEN]);
        if format!("{sum:04x}").as_bytes() != &bytes[RANDOM_LEN..] {
            return Err(InvalidNoteId::ChecksumMismatch);
        }

        let mut buf = [0u8; ID_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Returns true when the raw string is a well-formed identifier.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Invariant: buffer is ASCII hex by construction.
        std::str::from_utf8(&self.0).expect("NoteId bytes are ASCII")
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({})", self.as_str())
    }
}

impl FromStr for NoteId {
    type Err = InvalidNoteId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NoteId {
    type Error = InvalidNoteId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NoteId> for String {
    fn from(value: NoteId) -> Self {
        value.as_str().to_owned()
    }
}
