pub mod auth;
pub mod http;
pub mod json_only;
pub mod metrics;
pub mod trace;
