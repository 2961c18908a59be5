//! Environment-based configuration.

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// When set, the Postgres backend is used; otherwise the in-memory one.
    pub database_url: Option<String>,
    pub admin_api_key: String,
    /// Base URL embedded in generated client links.
    pub public_base_url: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let database_url = std::env::var("DATABASE_URL").ok();
        let admin_api_key = std::env::var("ADMIN_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("ADMIN_API_KEY not set; using insecure dev default");
            "dev-admin-key".to_string()
        });
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        Self {
            bind_addr,
            database_url,
            admin_api_key,
            public_base_url,
        }
    }
}
