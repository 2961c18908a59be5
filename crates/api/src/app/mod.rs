//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: backend selection and component wiring (store, engine, token service)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(build_router(services, config.admin_api_key.clone()))
}

/// Router wiring, separated from backend selection so tests can inject a
/// pre-seeded store.
pub fn build_router(services: Arc<services::AppServices>, admin_api_key: String) -> Router {
    let admin_state = middleware::AdminKeyState {
        admin_api_key: Arc::new(admin_api_key),
    };

    // Admin surface: CRUD + audit log, behind the shared API key.
    let admin = routes::admin_router().layer(axum::middleware::from_fn_with_state(
        admin_state,
        middleware::admin_key_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(admin)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
