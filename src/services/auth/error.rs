use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::FailureBody;

/// Errors produced by the authorization pipeline (header extraction, JWKS
/// fetch, token verification, permission check).
///
/// Each variant maps to one HTTP status and one stable machine-readable code.
/// The pipeline is staged so that every failure mode stays diagnosable
/// instead of collapsing into a single "invalid token".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is expected")]
    HeaderMissing,

    #[error("authorization header must be of the form 'Bearer <token>'")]
    HeaderMalformed,

    #[error("unable to parse authentication token")]
    TokenMalformed,

    #[error("token must be signed with RS256")]
    UnsupportedAlgorithm,

    #[error("unable to find a key matching the token's key id")]
    UnknownSigningKey,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token is expired")]
    TokenExpired,

    #[error("incorrect claims, please check the audience and issuer")]
    ClaimValidationFailed,

    #[error("permissions claim not included in token")]
    PermissionsClaimMissing,

    #[error("permission not found")]
    PermissionDenied,

    // Service-level fault: says nothing about the caller's credentials.
    // Provider responses must not leak into the message.
    #[error("unable to fetch verification keys")]
    JwksUnavailable,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionsClaimMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::JwksUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable code for structured logs and clients that match on strings.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::HeaderMissing => "authorization_header_missing",
            AuthError::HeaderMalformed
            | AuthError::TokenMalformed
            | AuthError::UnsupportedAlgorithm
            | AuthError::UnknownSigningKey => "invalid_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::ClaimValidationFailed | AuthError::PermissionsClaimMissing => {
                "invalid_claims"
            }
            AuthError::PermissionDenied => "unauthorized",
            AuthError::JwksUnavailable => "jwks_unavailable",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = FailureBody::new(status, self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AuthError::HeaderMissing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::PermissionsClaimMissing.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::JwksUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
