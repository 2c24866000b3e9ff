/*
 * Responsibility
 * - URL 構造を定義
 * - /auth 系は JSON 専用 (json_only)、/health と /metrics は対象外
 * - 認証 (access::apply) は app 側で全 route に掛ける
 */
use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::handlers::{auth, health};
use crate::middleware::json_only::json_only;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let auth = Router::new()
        .route("/auth", get(auth::check))
        .route("/auth/init", post(auth::init))
        .route("/auth/login", post(auth::login))
        .layer(middleware::from_fn(json_only));

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(auth)
}
