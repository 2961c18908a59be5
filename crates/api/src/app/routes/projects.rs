use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use clientdesk_core::{ClientId, ProjectId};
use clientdesk_ledger::{CreateProject, EditProject};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", get(get_one).patch(update).delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    let client_id: ClientId = match body.client_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id")
        }
    };
    match services
        .ledger
        .create_project(CreateProject {
            client_id,
            name: body.name,
            budget: body.budget,
        })
        .await
    {
        Ok(project) => (StatusCode::CREATED, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.projects().await {
        Ok(projects) => {
            let items = projects.iter().map(dto::project_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProjectId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id")
        }
    };
    match services.store.project(id).await {
        Ok(Some(project)) => (StatusCode::OK, Json(dto::project_to_json(&project))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "project not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::EditProjectRequest>,
) -> axum::response::Response {
    let project_id: ProjectId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id")
        }
    };
    match services
        .ledger
        .edit_project(EditProject {
            project_id,
            name: body.name,
            budget: body.budget,
        })
        .await
    {
        Ok(project) => (StatusCode::OK, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let project_id: ProjectId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id")
        }
    };
    match services.ledger.delete_project(project_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
