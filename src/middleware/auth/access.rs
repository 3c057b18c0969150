//! Per-route authorization guard.
//!
//! Each protected handler is wrapped with this middleware, parameterized by
//! the permission that route requires:
//!
//! ```ignore
//! .route(
//!     "/drinks",
//!     post(create_drink.layer(from_fn_with_state(
//!         Guard::new(&auth, "post:drinks"),
//!         check_access,
//!     ))),
//! )
//! ```
//!
//! Pipeline: extract bearer token → verify against JWKS → check the
//! required permission → stash the decoded claims in request extensions for
//! the handler's extractor. Any failure short-circuits with the
//! corresponding `AuthError`; nothing downstream runs.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::services::auth::{AuthService, bearer, error::AuthError, permissions};

/// Guard configuration for one route: the shared verifier plus the
/// permission this route demands.
#[derive(Clone)]
pub struct Guard {
    auth: Arc<AuthService>,
    permission: &'static str,
}

impl Guard {
    pub fn new(auth: &Arc<AuthService>, permission: &'static str) -> Self {
        Self {
            auth: Arc::clone(auth),
            permission,
        }
    }
}

pub async fn check_access(
    State(guard): State<Guard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer::extract(req.headers())?;

    let claims = match guard.auth.verify(token).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(code = err.code(), "access token verification failed");
            return Err(err);
        }
    };

    permissions::check(&claims, guard.permission)?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
