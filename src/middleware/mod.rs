//! Middleware for the library API
//!
//! Request tracing, rate limiting, security headers, and the bearer-token
//! extractor that turns requests into callers.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use rate_limiter::{rate_limit_layer, RateLimiter};
pub use security::{security_headers, SecurityHeaders};
pub use tracing::request_tracing;
