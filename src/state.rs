/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users: UserStore, tokens: TokenCodec, metrics: HttpMetrics
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::fmt;
use std::sync::Arc;

use crate::middleware::metrics::HttpMetrics;
use crate::repos::UserStore;
use crate::services::auth::TokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenCodec>,
    pub metrics: HttpMetrics,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenCodec, metrics: HttpMetrics) -> Self {
        Self {
            users,
            tokens: Arc::new(tokens),
            metrics,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
