//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Trace id generation + propagation (`trace-id`)
//! - Request span, access log and response metrics (`trace::instrument`)
//! - Body size limits
//! - Global timeouts

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::{self, HeaderName};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::AppError;
use crate::middleware::metrics::HttpMetrics;
use crate::middleware::trace::{self, TRACE_ID_HEADER};

#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub body_limit: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            body_limit: 1024 * 1024,
        }
    }
}

/// Apply HTTP-level middleware to the given Router.
///
/// Outermost first: trace id → instrumentation → timeout → body limit.
/// The timeout and body limit responses therefore still go through the access
/// log and metrics.
pub fn apply(router: Router, metrics: HttpMetrics, settings: HttpSettings) -> Router {
    let trace_id_header = HeaderName::from_static(TRACE_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Keep a client-supplied trace id, otherwise generate one; echo it back.
        .layer(SetRequestIdLayer::new(trace_id_header.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(trace_id_header))
        .layer(middleware::from_fn_with_state(metrics, trace::instrument))
        .layer(middleware::map_response(payload_too_large_as_json))
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                AppError::Timeout
            } else {
                AppError::internal(anyhow::anyhow!(err))
            }
        }))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(RequestBodyLimitLayer::new(settings.body_limit));

    router.layer(layers)
}

// RequestBodyLimitLayer answers a declared Content-Length over the limit
// itself, with a plain-text body.
async fn payload_too_large_as_json(res: Response) -> Response {
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));

    if res.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::PayloadTooLarge.into_response();
    }
    res
}
