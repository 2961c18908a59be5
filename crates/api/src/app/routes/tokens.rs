use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use clientdesk_access::AccessError;
use clientdesk_core::{ClientId, DomainError};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `POST /generate-token` — issue a 24h access token for a client and return
/// the shareable link.
pub async fn generate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::GenerateTokenRequest>,
) -> axum::response::Response {
    let Some(raw) = body.client_id else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "client_id required");
    };
    let client_id: ClientId = match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
        }
    };

    match services.access.issue(client_id, Utc::now()).await {
        Ok(token) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "token": token.token,
                "link": services.link_for(&token.token),
                "expires_at": token.expires_at.to_rfc3339(),
            })),
        )
            .into_response(),
        Err(AccessError::Domain(DomainError::NotFound)) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "client not found")
        }
        Err(e) => errors::access_error_to_response(e),
    }
}
