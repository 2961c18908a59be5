use std::sync::Arc;

use clientdesk_access::TokenService;
use clientdesk_ledger::LedgerEngine;
use clientdesk_store::{InMemoryStore, PgStore, Store};

use crate::config::ApiConfig;

/// Wired application components shared across handlers.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub ledger: LedgerEngine,
    pub access: TokenService,
    public_base_url: String,
}

impl AppServices {
    pub fn with_store(store: Arc<dyn Store>, public_base_url: impl Into<String>) -> Self {
        Self {
            ledger: LedgerEngine::new(store.clone()),
            access: TokenService::new(store.clone()),
            store,
            public_base_url: public_base_url.into(),
        }
    }

    /// Full client-facing link for a freshly issued token.
    pub fn link_for(&self, token: &str) -> String {
        format!("{}?token={}", self.public_base_url, token)
    }
}

/// Select the storage backend and wire the components.
///
/// `DATABASE_URL` set → Postgres (schema applied on startup); unset → the
/// in-memory dev store. The components only ever see the `Store` trait.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url).await?;
            pg.migrate().await?;
            tracing::info!("using postgres store");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (state is not durable)");
            Arc::new(InMemoryStore::new())
        }
    };

    Ok(AppServices::with_store(store, config.public_base_url.clone()))
}
