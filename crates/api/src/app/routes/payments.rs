use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use clientdesk_core::{PaymentId, ProjectId};
use clientdesk_ledger::{EditPayment, RecordPayment};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", get(get_one).patch(update).delete(remove))
}

/// Record a payment. Overpayment is allowed; the response then carries a
/// `warning` alongside the updated project state.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordPaymentRequest>,
) -> axum::response::Response {
    let project_id: ProjectId = match body.project_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id")
        }
    };
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());

    match services
        .ledger
        .record_payment(RecordPayment {
            project_id,
            date,
            amount: body.amount,
            kind: body.kind,
        })
        .await
    {
        Ok(receipt) => {
            let mut response = serde_json::json!({
                "payment": dto::payment_to_json(&receipt.payment),
                "project": dto::project_to_json(&receipt.project),
            });
            if receipt.overpayment {
                response["warning"] = serde_json::json!(
                    "payment exceeds the project's open balance; balance floored at zero"
                );
            }
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.payments().await {
        Ok(payments) => {
            let items = payments.iter().map(dto::payment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id")
        }
    };
    match services.store.payment(id).await {
        Ok(Some(payment)) => (StatusCode::OK, Json(dto::payment_to_json(&payment))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "payment not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::EditPaymentRequest>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id")
        }
    };
    match services
        .ledger
        .edit_payment(EditPayment {
            payment_id,
            date: body.date,
            amount: body.amount,
            kind: body.kind,
        })
        .await
    {
        Ok(payment) => (StatusCode::OK, Json(dto::payment_to_json(&payment))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let payment_id: PaymentId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid payment id")
        }
    };
    match services.ledger.delete_payment(payment_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
