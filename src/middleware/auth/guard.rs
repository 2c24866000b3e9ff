//! Route-level authorization.
//!
//! Runs after `access::apply` has (maybe) attached claims:
//! - no claims         → 401 "login required"
//! - role not granted  → 403 "forbidden"
//!
//! `Role::NONE` as the requirement admits any authenticated principal.

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::RequestCtx;
use crate::error::{AppError, FORBIDDEN};
use crate::services::auth::Role;

pub fn apply<S>(router: Router<S>, required: Role) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(required, guard))
}

async fn guard(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<RequestCtx>()
        .and_then(RequestCtx::claims)
        .ok_or_else(|| {
            tracing::debug!("no claims found");
            AppError::Unauthorized
        })?;

    if !claims.role.satisfies(required) {
        tracing::info!(
            role = claims.role.bits(),
            required = required.bits(),
            "role does not satisfy requirement"
        );
        return Err(AppError::Forbidden(FORBIDDEN));
    }

    Ok(next.run(req).await)
}
