use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::Claims;

/// Handler で検証済み claims を受け取るための extractor。
/// middleware が Claims を request.extensions() に insert 済みである前提。
/// 見つからない場合は 401（認可 middleware 未設定のルートから使われた）。
pub struct AccessClaims(pub Claims);

impl<S> FromRequestParts<S> for AccessClaims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AccessClaims)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
