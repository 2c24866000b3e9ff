use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::RequestCtx;

/// Handler で RequestCtx を受け取るための extractor
/// instrumentation middleware が RequestCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は middleware の配線ミスなので 500 を返す
pub struct Ctx(pub RequestCtx);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestCtx>()
            .cloned()
            .map(Ctx)
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("RequestCtx missing from request")))
    }
}
