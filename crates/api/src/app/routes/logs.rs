use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use clientdesk_domain::{AuditAction, AuditLogEntry};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `POST /admin-log` — append a free-form admin audit entry. Unknown action
/// tags fall back to `ADMIN_LOG`.
pub async fn append(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AdminLogRequest>,
) -> axum::response::Response {
    let action = body
        .action
        .as_deref()
        .and_then(AuditAction::from_tag)
        .unwrap_or(AuditAction::AdminLog);
    let detail = body.detail.unwrap_or_default();

    let entry = AuditLogEntry::new(action, detail, Utc::now());
    match services.store.append_log(&entry).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `GET /logs` — retained audit entries, newest first.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.logs().await {
        Ok(entries) => {
            let items = entries.iter().map(dto::log_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
