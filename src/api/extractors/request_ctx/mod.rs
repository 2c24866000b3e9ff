/*!
 * Request context extractor
 *
 * Responsibility:
 * - リクエスト単位のコンテキスト（RequestCtx）を middleware / handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - RequestCtx
 * - Ctx
 */

mod core;
mod types;

pub use self::core::Ctx;
pub use self::types::RequestCtx;
