/*
 * Responsibility
 * - /auth 系 handler (check / init / login)
 * - JsonBody で受け、DTO validation → UserStore / password / TokenCodec 呼び出し
 * - ログは request span の中で出す (trace id はそこから付く)
 */
use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, info, warn};

use crate::{
    api::{
        dto::auth::Credentials,
        extractors::{Ctx, JsonBody},
    },
    error::AppError,
    repos::{NewUser, error::RepoError},
    services::auth::{Role, password},
    state::AppState,
};

pub const USERS_NOT_FOUND: &str = "users not found";
pub const ADMIN_ALREADY_EXISTS: &str = "admin already exists";
pub const ADMIN_CREATED: &str = "admin created";

/// GET /auth
///
/// Tells a client which screen to show: 404 before bootstrap, 401 without a
/// valid token, otherwise a renewed token for the same user.
pub async fn check(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
) -> Result<Json<String>, AppError> {
    if state.users.user_count().await? == 0 {
        warn!("users not found");
        return Err(AppError::NotFound(USERS_NOT_FOUND));
    }

    let Some(claims) = ctx.claims() else {
        debug!("no claims found");
        return Err(AppError::Unauthorized);
    };

    // Re-read the user so the renewed token carries the persisted role.
    let user = match state.users.user_by_id(claims.subject).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => {
            info!(user_id = %claims.subject, "token subject no longer exists");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    debug!(user_id = %user.id, "token renewed");

    Ok(Json(token))
}

/// POST /auth/init
///
/// Creates the first user as admin. Refused once any user exists.
pub async fn init(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<&'static str>), AppError> {
    req.validate()?;

    if state.users.user_count().await? > 0 {
        warn!("admin already exists");
        return Err(AppError::Forbidden(ADMIN_ALREADY_EXISTS));
    }

    let password_hash = password::hash(req.password).await?;

    let user = state
        .users
        .create_user(NewUser {
            email: req.email,
            password_hash,
            role: Role::ADMIN,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "admin created");

    Ok((StatusCode::CREATED, Json(ADMIN_CREATED)))
}

/// POST /auth/login
///
/// Unknown email and wrong password are indistinguishable to the client.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> Result<Json<String>, AppError> {
    req.validate()?;

    let user = match state.users.user_by_email(&req.email).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => {
            password::verify_dummy(req.password).await;
            info!(email = %req.email, "user is not found");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !password::verify(req.password, user.password_hash.clone()).await? {
        info!(user_id = %user.id, "invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(token))
}
