//! CORS configuration for the team routes using tower-http.

use axum::http::{Method, header};
use tower_http::cors::CorsLayer;

/// Allows any origin, method and header.
///
/// **Warning**: This is intended for development only. Do not use in production.
pub fn permissive() -> CorsLayer {
    CorsLayer::permissive()
}

/// The methods and headers the team routes need, for the given origins.
///
/// Credentials are allowed and preflight responses are cached for an hour.
///
/// # Arguments
/// * `allowed_origins` - List of allowed origin URLs (e.g., `["https://app.example.com"]`)
pub fn default(allowed_origins: &[&str]) -> CorsLayer {
    custom(
        allowed_origins,
        &[Method::GET, Method::POST, Method::OPTIONS],
        true,
    )
}

/// Like [`default`] with caller-chosen methods and credential handling.
pub fn custom(allowed_origins: &[&str], methods: &[Method], allow_credentials: bool) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods.to_vec())
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(allow_credentials)
        .max_age(std::time::Duration::from_secs(3600))
}
