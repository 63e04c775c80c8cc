//! Client identity extraction from proxy headers.
//!
//! The identifier is client-controlled and therefore only good for abuse
//! deterrence, never for access control.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Identifier used when no forwarding header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Headers consulted in order; the first non-empty one wins.
const CANDIDATE_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip"];

/// Derive the rate-limiting key for a request.
///
/// For `X-Forwarded-For` only the first hop (the original client) is used.
/// Always returns a non-empty string.
pub fn client_identifier(headers: &HeaderMap) -> String {
    CANDIDATE_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Short SHA-256 fingerprint of an identifier, safe to put in logs.
pub fn client_fingerprint(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hex::encode(&hasher.finalize()[..6])
}
