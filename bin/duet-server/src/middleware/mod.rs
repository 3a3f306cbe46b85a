//! HTTP middleware stack: request tracing, the access gate and the
//! crawler-exclusion header.

pub mod auth;
pub mod trace;

use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const X_ROBOTS_TAG: &str = "x-robots-tag";
pub const NOINDEX: &str = "noindex, nofollow, noarchive";

/// Stamps `X-Robots-Tag` on every response, denials and errors included.
pub fn noindex_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static(X_ROBOTS_TAG),
        HeaderValue::from_static(NOINDEX),
    )
}
