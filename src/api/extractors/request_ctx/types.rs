/*
 * Responsibility
 * - 1 リクエスト分の処理コンテキスト (trace id / span / 認証済み Claims)
 * - instrumentation middleware が生成して request extensions に格納し、
 *   認証 middleware が Claims を載せ、guard と handler が参照する
 *
 * Notes
 * - グローバルな logger / tracer は使わない。ログは `span` の中で出す
 * - Claims は「無い」か「検証済み」のどちらか。途中状態は存在しない
 */
use tracing::Span;

use crate::services::auth::Claims;

#[derive(Debug, Clone)]
pub struct RequestCtx {
    trace_id: String,
    span: Span,
    claims: Option<Claims>,
}

impl RequestCtx {
    pub fn new(trace_id: impl Into<String>, span: Span) -> Self {
        Self {
            trace_id: trace_id.into(),
            span,
            claims: None,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Attach claims returned by `TokenCodec::decode`, and tag the span with
    /// the principal (observability only).
    pub fn attach_claims(&mut self, claims: Claims) {
        self.span.record("user_id", tracing::field::display(claims.subject));
        self.span.record("role", claims.role.bits());
        self.claims = Some(claims);
    }
}
