//! Note write and read handlers.
//!
//! Every request that reaches these handlers produces exactly one audit
//! event, success or failure — including rate-limit rejections and bodies
//! the JSON extractor refused. Handlers therefore record at a single point
//! after the outcome is decided.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{handlers::ApiError, state::AppState, validation};
use noteshare_core::{AuditEvent, AuditKind, Note, OpClass, DEFAULT_CRYPTO_VERSION};

/// Request to store a note
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    /// Encrypted payload, base64
    pub ciphertext: String,
    /// Authentication tag, base64
    pub hmac: String,
    /// Optional caller-supplied id; must pass the identifier checksum
    /// scheme but is otherwise unverified
    pub user_id: Option<String>,
    /// Optional editor plugin version, `X.Y.Z`
    pub plugin_version: Option<String>,
    #[serde(default = "default_crypto_version")]
    pub crypto_version: String,
}

fn default_crypto_version() -> String {
    DEFAULT_CRYPTO_VERSION.to_string()
}

/// Response for a stored note
#[derive(Debug, Serialize)]
pub struct CreateNoteResponse {
    pub view_url: String,
    pub expire_time: DateTime<Utc>,
}

/// Response for a retrieved note
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub ciphertext: String,
    pub hmac: String,
    pub expire_time: DateTime<Utc>,
    pub insert_time: DateTime<Utc>,
    pub crypto_version: String,
}

impl From<&Note> for NoteResponse {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.as_str().to_owned(),
            ciphertext: BASE64.encode(&note.ciphertext),
            hmac: BASE64.encode(&note.hmac),
            expire_time: note.expire_time,
            insert_time: note.insert_time,
            crypto_version: note.crypto_version.clone(),
        }
    }
}

/// Resolve the caller address for rate limiting and audit logging.
///
/// The service runs behind a reverse proxy, so `X-Forwarded-For` is the
/// usual source; the first hop in the list is the client.
fn client_host(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Store a new note
pub async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<Json<CreateNoteResponse>, ApiError> {
    let host = client_host(&headers);

    if !state.limiter.allow(&host, OpClass::Write) {
        let err = ApiError::RateLimited;
        state.audit.record(
            AuditEvent::new(AuditKind::Write, false, host).with_error(err.audit_description()),
        );
        return Err(err);
    }

    let (user_meta, outcome) = match payload {
        Ok(Json(req)) => {
            let meta = (req.user_id.clone(), req.plugin_version.clone());
            (meta, create_inner(&state, req).await)
        }
        Err(rejection) => {
            // The body never parsed; an oversized body surfaces here too
            // when the transport-level cap buffers short.
            let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge {
                    limit: state.config.limits.max_payload_bytes,
                }
            } else {
                ApiError::Validation(rejection.body_text())
            };
            ((None, None), Err(err))
        }
    };

    match outcome {
        Ok(note) => {
            state.audit.record(
                AuditEvent::new(AuditKind::Write, true, host)
                    .with_note_id(note.id.as_str())
                    .with_user(user_meta.0, user_meta.1)
                    .with_size_bytes(note.size_bytes())
                    .with_expire_window_days(state.store.retention_days()),
            );
            info!(note_id = %note.id, size_bytes = note.size_bytes(), "note stored");

            Ok(Json(CreateNoteResponse {
                view_url: state.view_url(note.id.as_str()),
                expire_time: note.expire_time,
            }))
        }
        Err(err) => {
            state.audit.record(
                AuditEvent::new(AuditKind::Write, false, host)
                    .with_user(user_meta.0, user_meta.1)
                    .with_error(err.audit_description()),
            );
            Err(err)
        }
    }
}

/// Validation and persistence for a parsed write request.
async fn create_inner(state: &AppState, req: CreateNoteRequest) -> Result<Note, ApiError> {
    if let Some(user_id) = &req.user_id {
        validation::validate_user_id(user_id)?;
    }
    if let Some(plugin_version) = &req.plugin_version {
        validation::validate_plugin_version(plugin_version)?;
    }
    validation::validate_crypto_version(&req.crypto_version)?;

    let ciphertext = validation::decode_payload_field("ciphertext", &req.ciphertext)?;
    let hmac = validation::decode_payload_field("hmac", &req.hmac)?;

    let limit = state.config.limits.max_payload_bytes;
    if ciphertext.len() + hmac.len() > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let note = state
        .store
        .create(ciphertext, hmac, req.crypto_version)
        .await?;
    Ok(note)
}

/// Retrieve a note by identifier
pub async fn get_note(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<NoteResponse>, ApiError> {
    let host = client_host(&headers);

    if !state.limiter.allow(&host, OpClass::Read) {
        let err = ApiError::RateLimited;
        state.audit.record(
            AuditEvent::new(AuditKind::Read, false, host)
                .with_note_id(raw_id.as_str())
                .with_error(err.audit_description()),
        );
        return Err(err);
    }

    match state.store.read(&raw_id).await {
        Ok(note) => {
            state.audit.record(
                AuditEvent::new(AuditKind::Read, true, host)
                    .with_note_id(note.id.as_str())
                    .with_size_bytes(note.size_bytes()),
            );
            debug!(note_id = %note.id, "note served");

            Ok(Json(NoteResponse::from(&note)))
        }
        Err(core_err) => {
            let err = ApiError::from(core_err);
            state.audit.record(
                AuditEvent::new(AuditKind::Read, false, host)
                    .with_note_id(raw_id.as_str())
                    .with_error(err.audit_description()),
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_host_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2"),
        );
        assert_eq!(client_host(&headers), "203.0.113.9");
    }

    #[test]
    fn client_host_defaults_when_absent_or_empty() {
        assert_eq!(client_host(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_host(&headers), "unknown");
    }
}
