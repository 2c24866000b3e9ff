//! Authentication core of the localization center API.
//!
//! Bootstrap of the first (admin) user, email/password login, stateless
//! signed bearer tokens, and the middleware that authenticates and
//! authorizes every request.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;

pub use app::build_router;
pub use state::AppState;
