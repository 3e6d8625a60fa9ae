//! Input validation utilities

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;

use crate::handlers::ApiError;
use noteshare_core::NoteId;

/// Decode a base64 wire field into raw bytes.
pub fn decode_payload_field(field: &str, value: &str) -> Result<Bytes, ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} cannot be empty")));
    }

    BASE64
        .decode(value)
        .map(Bytes::from)
        .map_err(|_| ApiError::Validation(format!("{field} is not valid base64")))
}

/// Validate a caller-supplied user id against the identifier-checksum
/// scheme. The value is never verified against any registry; it only has to
/// be well-formed.
pub fn validate_user_id(user_id: &str) -> Result<(), ApiError> {
    if !NoteId::is_valid(user_id) {
        return Err(ApiError::Validation(
            "user_id must be a 16-character checksummed hex identifier".to_string(),
        ));
    }

    Ok(())
}

/// Validate a plugin version of the form `X.Y.Z`.
pub fn validate_plugin_version(version: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.len() <= 4 && p.bytes().all(|b| b.is_ascii_digit()));

    if !well_formed {
        return Err(ApiError::Validation(format!(
            "plugin_version must be of the form X.Y.Z, got {version:?}"
        )));
    }

    Ok(())
}

/// Validate a crypto scheme tag of the form `vN`.
pub fn validate_crypto_version(version: &str) -> Result<(), ApiError> {
    let digits = version.strip_prefix('v').unwrap_or("");
    let well_formed =
        !digits.is_empty() && digits.len() <= 4 && digits.bytes().all(|b| b.is_ascii_digit());

    if !well_formed {
        return Err(ApiError::Validation(format!(
            "crypto_version must be of the form vN, got {version:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload_field() {
        assert_eq!(
            decode_payload_field("ciphertext", "aGVsbG8=").unwrap(),
            Bytes::from_static(b"hello")
        );

        assert!(decode_payload_field("ciphertext", "").is_err());
        assert!(decode_payload_field("ciphertext", "%%%not-base64%%%").is_err());
    }

    #[test]
    fn test_validate_user_id() {
        let id = NoteId::generate();
        assert!(validate_user_id(id.as_str()).is_ok());

        assert!(validate_user_id("deadbeef").is_err()); // wrong length
        assert!(validate_user_id("0123456789abcdef").is_err()); // bad checksum
        assert!(validate_user_id("not-hex-not-hex!").is_err());
    }

    #[test]
    fn test_validate_plugin_version() {
        assert!(validate_plugin_version("1.0.0").is_ok());
        assert!(validate_plugin_version("0.12.345").is_ok());

        assert!(validate_plugin_version("1.0").is_err());
        assert!(validate_plugin_version("1.0.0.0").is_err());
        assert!(validate_plugin_version("1.0.x").is_err());
        assert!(validate_plugin_version("v1.0.0").is_err());
        assert!(validate_plugin_version("1..0").is_err());
        assert!(validate_plugin_version("1.0.00000").is_err());
    }

    #[test]
    fn test_validate_crypto_version() {
        assert!(validate_crypto_version("v1").is_ok());
        assert!(validate_crypto_version("v12").is_ok());

        assert!(validate_crypto_version("1").is_err());
        assert!(validate_crypto_version("v").is_err());
        assert!(validate_crypto_version("vx").is_err());
        assert!(validate_crypto_version("version1").is_err());
        assert!(validate_crypto_version("v99999").is_err());
    }
}
