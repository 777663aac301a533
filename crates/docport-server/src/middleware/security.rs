//! Security headers middleware.
//!
//! Adds security headers to all responses:
//! - Content-Security-Policy
//! - X-Content-Type-Options
//! - X-Frame-Options
//! - Referrer-Policy
//! - Strict-Transport-Security

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower_http::set_header::SetResponseHeaderLayer;

/// Content-Security-Policy header value; `{content}` is replaced with the
/// blob host allowed to serve images and frames.
const CSP_TEMPLATE: &str = "default-src 'self'; \
                            script-src 'self'; \
                            style-src 'self' 'unsafe-inline'; \
                            font-src 'self' data:; \
                            img-src 'self' data:{content}; \
                            connect-src 'self'; \
                            frame-ancestors 'none'";

/// Origin (`scheme://host[:port]`) of an absolute http(s) URL.
fn origin(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host_len = rest.find('/').unwrap_or(rest.len());
    if host_len == 0 {
        return None;
    }
    Some(&url[..url.len() - rest.len() + host_len])
}

/// Build the CSP, allowing images from the content origin when blobs live
/// on another host.
fn csp(content_base_url: &str) -> String {
    let extra = origin(content_base_url)
        .map(|o| format!(" {o}"))
        .unwrap_or_default();
    CSP_TEMPLATE.replace("{content}", &extra)
}

/// Create layer that adds Content-Security-Policy header.
pub(crate) fn csp_layer(content_base_url: &str) -> SetResponseHeaderLayer<HeaderValue> {
    let value = HeaderValue::from_str(&csp(content_base_url)).unwrap_or_else(|_| {
        tracing::warn!(content_base_url, "Content URL not valid in CSP header, ignoring");
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'")
    });
    SetResponseHeaderLayer::overriding(HeaderName::from_static("content-security-policy"), value)
}

/// Create layer that adds X-Content-Type-Options header.
pub(crate) fn content_type_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

/// Create layer that adds X-Frame-Options header.
pub(crate) fn frame_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    )
}

/// Create layer that adds Referrer-Policy header.
pub(crate) fn referrer_policy_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    )
}

/// Create layer that adds Strict-Transport-Security header.
pub(crate) fn hsts_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("strict-transport-security"),
        HeaderValue::from_static("max-age=15552000; includeSubDomains"),
    )
}
