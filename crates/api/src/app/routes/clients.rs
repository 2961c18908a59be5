use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    routing::post,
    Json, Router,
};

use clientdesk_core::ClientId;
use clientdesk_ledger::{CreateClient, UpdateClient};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", get(get_one).patch(update).delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateClientRequest>,
) -> axum::response::Response {
    match services
        .ledger
        .create_client(CreateClient {
            name: body.name,
            email: body.email,
        })
        .await
    {
        Ok(client) => (StatusCode::CREATED, Json(dto::client_to_json(&client))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.clients().await {
        Ok(clients) => {
            let items = clients.iter().map(dto::client_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
        }
    };
    match services.store.client(id).await {
        Ok(Some(client)) => (StatusCode::OK, Json(dto::client_to_json(&client))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "client not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateClientRequest>,
) -> axum::response::Response {
    let client_id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
        }
    };
    match services
        .ledger
        .update_client(UpdateClient {
            client_id,
            name: body.name,
            email: body.email,
        })
        .await
    {
        Ok(client) => (StatusCode::OK, Json(dto::client_to_json(&client))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let client_id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
        }
    };
    match services.ledger.delete_client(client_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
