//! Per-request instrumentation.
//!
//! Responsibility:
//! - Build the `request` span (trace id, method, path) and the `RequestCtx`
//! - Log "request start" / "request end"
//! - Record status + duration into `HttpMetrics`
//!
//! The trace id is taken from the `trace-id` header (set by `SetRequestIdLayer`
//! when the client did not send one), so it must run inside that layer.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::RequestId;
use tracing::{Instrument, field, info, info_span};
use uuid::Uuid;

use crate::api::extractors::RequestCtx;
use crate::middleware::metrics::HttpMetrics;

pub const TRACE_ID_HEADER: &str = "trace-id";

pub async fn instrument(
    State(metrics): State<HttpMetrics>,
    mut req: Request,
    next: Next,
) -> Response {
    let trace_id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
        user_id = field::Empty,
        role = field::Empty,
        status = field::Empty,
        error = field::Empty,
    );

    let client_ip = client_ip(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned();

    req.extensions_mut()
        .insert(RequestCtx::new(trace_id, span.clone()));

    let request_span = span.clone();
    async move {
        info!(client_ip = %client_ip, user_agent = %user_agent, "request start");
        let started = Instant::now();

        let response = next.run(req).await;

        let elapsed = started.elapsed();
        let status = response.status();
        request_span.record("status", status.as_u16());
        if status.is_client_error() || status.is_server_error() {
            request_span.record("error", true);
        }

        info!(
            status = status.as_u16(),
            response_length = response.body().size_hint().exact(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "request end"
        );
        metrics.record(status.as_u16(), elapsed);

        response
    }
    .instrument(span)
    .await
}

/// Best-effort client address: `X-Real-IP`, then the first hop of
/// `X-Forwarded-For`, then the socket peer.
pub fn client_ip(req: &Request) -> String {
    forwarded_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    if let Some(ip) = header_str("x-real-ip") {
        return Some(ip.to_owned());
    }

    header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/auth");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn real_ip_wins() {
        let req = request(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn first_forwarded_hop() {
        let req = request(&[("x-forwarded-for", "203.0.113.9, 10.0.0.2")]);
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 5555))));
        assert_eq!(client_ip(&req), "192.0.2.4");
    }

    #[test]
    fn unknown_is_empty() {
        assert_eq!(client_ip(&request(&[])), "");
    }
}
