use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors;

pub const ADMIN_KEY_HEADER: &str = "x-admin-api-key";

#[derive(Clone)]
pub struct AdminKeyState {
    pub admin_api_key: Arc<String>,
}

/// Guard for the admin surface: requires the shared API key in
/// `x-admin-api-key`. Token-gated client routes never pass through here.
pub async fn admin_key_middleware(
    State(state): State<AdminKeyState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match extract_key(req.headers()) {
        Some(provided) if provided == state.admin_api_key.as_str() => next.run(req).await,
        _ => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-admin-api-key",
        ),
    }
}

fn extract_key(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(ADMIN_KEY_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value)
}
