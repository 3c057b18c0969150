//! Bearer-token extraction from the Authorization header.
//!
//! Pure function of the header map; no verification happens here. Whether
//! the token itself is a well-formed JWT is the verifier's concern.

use axum::http::{HeaderMap, header};

use super::error::AuthError;

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// Accepted shape is exactly two whitespace-separated parts, the first one
/// equal to "bearer" case-insensitively. Everything else is malformed.
pub fn extract(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::HeaderMissing)?;

    let value = value.to_str().map_err(|_| AuthError::HeaderMalformed)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::HeaderMalformed),
    }
}
