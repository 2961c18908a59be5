use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use clientdesk_access::AccessError;
use clientdesk_core::DomainError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `GET /get-client-data?token=...`
pub async fn fetch_via_query(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ClientDataRequest>,
) -> axum::response::Response {
    fetch(services, params.token).await
}

/// `POST /get-client-data` with `{token}`.
pub async fn fetch_via_body(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ClientDataRequest>,
) -> axum::response::Response {
    fetch(services, body.token).await
}

async fn fetch(services: Arc<AppServices>, token: Option<String>) -> axum::response::Response {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "token required");
    };

    match services.access.validate(token.trim(), Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": dto::report_to_json(&report),
            })),
        )
            .into_response(),
        Err(AccessError::Domain(DomainError::NotFound)) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "token not found")
        }
        Err(AccessError::Domain(DomainError::Expired)) => errors::json_error(
            StatusCode::FORBIDDEN,
            "expired",
            "access link has expired (older than 24 hours)",
        ),
        Err(e) => errors::access_error_to_response(e),
    }
}
