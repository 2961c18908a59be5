use axum::{
    routing::{get, post},
    Router,
};

pub mod client_data;
pub mod clients;
pub mod logs;
pub mod payments;
pub mod projects;
pub mod system;
pub mod tokens;

/// Public surface: token issuance and the token-gated client report. These
/// keep the documented endpoint contracts; only the admin surface requires
/// the API key.
pub fn public_router() -> Router {
    Router::new()
        .route("/generate-token", post(tokens::generate))
        .route(
            "/get-client-data",
            get(client_data::fetch_via_query).post(client_data::fetch_via_body),
        )
}

/// Admin surface (guarded by the `x-admin-api-key` middleware).
pub fn admin_router() -> Router {
    Router::new()
        .nest("/clients", clients::router())
        .nest("/projects", projects::router())
        .nest("/payments", payments::router())
        .route("/admin-log", post(logs::append))
        .route("/logs", get(logs::list))
}
