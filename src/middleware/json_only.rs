//! Content negotiation for the JSON API.
//!
//! Body-carrying methods must declare `application/json`; every response with
//! a body is labelled `application/json`.

use axum::{
    body::HttpBody,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

pub const CONTENT_TYPE_NOT_ALLOWED: &str = "Content-Type not allowed. Use application/json";

pub async fn json_only(req: Request, next: Next) -> Response {
    let carries_body = matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH);

    if carries_body && !is_json(req.headers()) {
        tracing::warn!(
            content_type = ?req.headers().get(header::CONTENT_TYPE),
            "rejected non-json request"
        );
        return AppError::bad_request(CONTENT_TYPE_NOT_ALLOWED).into_response();
    }

    let mut res = next.run(req).await;
    // Empty bodies (405 from the router, for example) stay unlabelled.
    if res.body().size_hint().exact() != Some(0) {
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    res
}

// Media type only; parameters such as charset are ignored.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_content_type(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn accepts_json_with_parameters() {
        assert!(is_json(&with_content_type("application/json")));
        assert!(is_json(&with_content_type("application/json; charset=utf-8")));
        assert!(is_json(&with_content_type("Application/JSON")));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_json(&HeaderMap::new()));
        assert!(!is_json(&with_content_type("text/plain")));
        assert!(!is_json(&with_content_type("application/x-www-form-urlencoded")));
    }
}
