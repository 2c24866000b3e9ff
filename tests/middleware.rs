mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use serde_json::json;
use uuid::Uuid;

use l10n_api::{
    api::extractors::Ctx,
    middleware::{
        auth::{access, guard},
        http::{self, HttpSettings},
        metrics::HttpMetrics,
    },
    services::auth::{Role, TokenCodec},
};

use common::{SECRET, send};

fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(SECRET))
}

fn token(role: Role) -> String {
    codec()
        .issue(Uuid::new_v4(), "someone@example.com", role)
        .unwrap()
}

fn request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/protected");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn guarded(required: Role) -> Router {
    let router = Router::new().route("/protected", get(|| async { "ok" }));
    let router = guard::apply(router, required);
    access::apply(router, codec())
}

fn strict(required: Role) -> Router {
    let router = Router::new().route("/protected", get(|| async { "ok" }));
    access::apply_required(router, codec(), required)
}

#[tokio::test]
async fn guard_without_token_asks_for_login() {
    let res = send(&guarded(Role::ADMIN), request(None)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!("login required"));
}

#[tokio::test]
async fn guard_admits_matching_role() {
    let auth = format!("Bearer {}", token(Role::ADMIN));
    let res = send(&guarded(Role::ADMIN), request(Some(&auth))).await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn guard_rejects_missing_role_bit() {
    let auth = format!("Bearer {}", token(Role::MANAGER));
    let res = send(&guarded(Role::ADMIN), request(Some(&auth))).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body, json!("forbidden"));
}

#[tokio::test]
async fn guard_any_of_several_bits() {
    let auth = format!("Bearer {}", token(Role::MANAGER));
    let res = send(&guarded(Role::ADMIN | Role::MANAGER), request(Some(&auth))).await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn none_requirement_admits_any_authenticated_user() {
    let auth = format!("Bearer {}", token(Role::NONE));
    let res = send(&guarded(Role::NONE), request(Some(&auth))).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&guarded(Role::NONE), request(None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lowercase_scheme_is_accepted() {
    let auth = format!("bearer {}", token(Role::ADMIN));
    let res = send(&guarded(Role::ADMIN), request(Some(&auth))).await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_authorization_is_anonymous() {
    let t = token(Role::ADMIN);
    for auth in [
        format!("Bearer  {t}"),
        format!("Basic {t}"),
        "Bearer".to_string(),
        "Bearer not-a-token".to_string(),
    ] {
        let res = send(&guarded(Role::ADMIN), request(Some(&auth))).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{auth}");
    }
}

#[tokio::test]
async fn claims_reach_the_handler() {
    let router = Router::new().route(
        "/protected",
        get(|Ctx(ctx): Ctx| async move {
            ctx.claims()
                .map(|c| c.email.clone())
                .unwrap_or_else(|| "anonymous".to_string())
        }),
    );
    let router = access::apply(router, codec());

    let auth = format!("Bearer {}", token(Role::ADMIN));
    let res = send(&router, request(Some(&auth))).await;
    assert_eq!(res.body, json!("someone@example.com"));
}

#[tokio::test]
async fn strict_mode_forbids_anonymous() {
    let res = send(&strict(Role::ADMIN), request(None)).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body, json!("forbidden"));
}

#[tokio::test]
async fn strict_mode_checks_role() {
    let admin = format!("Bearer {}", token(Role::ADMIN));
    let manager = format!("Bearer {}", token(Role::MANAGER));

    let res = send(&strict(Role::ADMIN), request(Some(&admin))).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&strict(Role::ADMIN), request(Some(&manager))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn handler_sees_the_echoed_trace_id() {
    let router = Router::new().route(
        "/protected",
        get(|Ctx(ctx): Ctx| async move { ctx.trace_id().to_owned() }),
    );
    let router = http::apply(router, HttpMetrics::new().unwrap(), HttpSettings::default());

    let res = send(&router, request(None)).await;
    let echoed = res.headers.get("trace-id").unwrap().to_str().unwrap();
    assert!(!echoed.is_empty());
    assert_eq!(res.body, json!(echoed));

    let req = Request::builder()
        .uri("/protected")
        .header("trace-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let res = send(&router, req).await;
    assert_eq!(res.body, json!("abc-123"));
}
