//! Basic credential extraction.
//!
//! An absent or malformed `Authorization` header is not an error here: it
//! simply yields no credentials, and the gate decides what that means.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

/// Identifier/secret pair taken from a Basic `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Parse `Basic base64(identifier:secret)`. The split happens at the first
/// colon, so secrets may contain colons.
pub fn parse_basic(value: &str) -> Option<Credentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (identifier, secret) = decoded.split_once(':')?;

    Some(Credentials {
        identifier: identifier.to_string(),
        secret: secret.to_string(),
    })
}

/// Extract Basic credentials from request headers
pub fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic)
}

/// Build a Basic `Authorization` header value
pub fn encode_basic(identifier: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{identifier}:{secret}")))
}
