//! Bearer token 検証 → Claims を RequestCtx に載せる
//!
//! 2 つのモードがある:
//! - `apply`          : optional。token が無い/壊れていても素通しし、guard と handler に判断させる
//! - `apply_required` : strict。有効な token と role が無ければその場で 403 を返す
//!
//! どちらのモードでも、拒否理由 (期限切れ / 署名不一致 / 想定外 alg) はログにだけ出す。

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::Span;

use crate::api::extractors::RequestCtx;
use crate::error::{AppError, FORBIDDEN};
use crate::services::auth::{Claims, Role, TokenCodec, VerificationError};

const BEARER_PREFIX_LEN: usize = "Bearer ".len();

/// Optional authentication for every route of `router`.
pub fn apply<S>(router: Router<S>, tokens: Arc<TokenCodec>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(tokens, authenticate))
}

/// Strict authentication: only requests carrying a valid token whose role
/// satisfies `role` reach the routes.
pub fn apply_required<S>(router: Router<S>, tokens: Arc<TokenCodec>, role: Role) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        Required { tokens, role },
        authenticate_required,
    ))
}

#[derive(Clone)]
struct Required {
    tokens: Arc<TokenCodec>,
    role: Role,
}

async fn authenticate(
    State(tokens): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(claims) = verify(&tokens, req.headers()) {
        attach(&mut req, claims);
    }
    next.run(req).await
}

async fn authenticate_required(
    State(required): State<Required>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify(&required.tokens, req.headers()).ok_or(AppError::Forbidden(FORBIDDEN))?;

    if !claims.role.satisfies(required.role) {
        tracing::info!(
            role = claims.role.bits(),
            required = required.role.bits(),
            "role does not satisfy requirement"
        );
        return Err(AppError::Forbidden(FORBIDDEN));
    }

    attach(&mut req, claims);
    Ok(next.run(req).await)
}

fn verify(tokens: &TokenCodec, headers: &HeaderMap) -> Option<Claims> {
    let token = bearer_token(headers)?;

    match tokens.decode(token) {
        Ok(claims) => Some(claims),
        Err(err @ VerificationError::UnexpectedAlgorithm) => {
            tracing::warn!(error = %err, "bearer token rejected");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            None
        }
    }
}

fn attach(req: &mut Request, claims: Claims) {
    // instrumentation layer が無い構成 (テスト用 router など) でも Claims は失わない
    let mut ctx = req
        .extensions_mut()
        .remove::<RequestCtx>()
        .unwrap_or_else(|| RequestCtx::new(String::new(), Span::current()));
    ctx.attach_claims(claims);
    req.extensions_mut().insert(ctx);
}

/// `Authorization: Bearer <token>` から token 部分を取り出す。
///
/// scheme は大文字小文字を区別しない。区切りはちょうど 1 つの空白。
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_at_checked(BEARER_PREFIX_LEN)?;

    if !scheme.eq_ignore_ascii_case("bearer ") || token.is_empty() || token.starts_with(' ') {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn extracts_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer xyz")), Some("xyz"));
        assert_eq!(bearer_token(&headers("BEARER xyz")), Some("xyz"));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer  xyz")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Token xyz")), None);
    }
}
