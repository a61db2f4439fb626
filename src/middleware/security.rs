//! Security headers middleware

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Which hardening headers to attach to every response
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders {
    /// Send `Strict-Transport-Security`; only meaningful behind HTTPS
    pub hsts: bool,
}

impl SecurityHeaders {
    pub fn for_production(is_production: bool) -> Self {
        Self {
            hsts: is_production,
        }
    }

    fn apply(self, headers: &mut HeaderMap) {
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        // JSON only, nothing to load
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );

        if self.hsts {
            headers.insert(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            );
        }
    }
}

/// Middleware for adding security headers
pub async fn security_headers(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}
