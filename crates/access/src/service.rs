use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use clientdesk_core::{ClientId, DomainError, ProjectId};
use clientdesk_domain::{AccessToken, AuditAction, AuditLogEntry, Client, Payment, Project};
use clientdesk_store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Read-only snapshot returned to a validated token holder: the client plus
/// every project it owns and every payment belonging to those projects.
#[derive(Debug, Clone)]
pub struct ClientReport {
    pub client: Client,
    pub projects: Vec<Project>,
    pub payments: Vec<Payment>,
}

/// Issues and validates client access tokens.
///
/// Re-issue policy: replace-on-issue. Issuing a token discards any stored
/// tokens for the same client, so at most one live token exists per client.
/// Expiry is absolute (24h from issuance), never sliding.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn audit(&self, action: AuditAction, detail: String) {
        tracing::debug!(action = action.as_str(), detail = %detail, "audit");
        let entry = AuditLogEntry::new(action, detail, Utc::now());
        if let Err(e) = self.store.append_log(&entry).await {
            tracing::warn!(error = %e, "failed to append audit entry");
        }
    }

    /// Issue a fresh token for the client, replacing any previous ones.
    pub async fn issue(
        &self,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AccessError> {
        if self.store.client(client_id).await?.is_none() {
            self.audit(
                AuditAction::LinkGenerated,
                format!("rejected: client {client_id} not found"),
            )
            .await;
            return Err(DomainError::NotFound.into());
        }

        self.store.delete_tokens_for_client(client_id).await?;
        let token = AccessToken::issue(client_id, now);
        self.store.insert_token(&token).await?;

        self.audit(
            AuditAction::LinkGenerated,
            format!("token {} issued for client {client_id}", token.token),
        )
        .await;
        Ok(token)
    }

    /// Validate a token string and assemble the client's report.
    ///
    /// Every call, granted or denied, leaves an audit entry.
    pub async fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ClientReport, AccessError> {
        let Some(stored) = self.store.token(token).await? else {
            self.audit(
                AuditAction::AccessDenied,
                format!("access attempt with unknown token: {token}"),
            )
            .await;
            return Err(DomainError::NotFound.into());
        };

        if stored.is_expired(now) {
            self.audit(
                AuditAction::AccessDenied,
                format!("expired token for client {}", stored.client_id),
            )
            .await;
            return Err(DomainError::Expired.into());
        }

        let Some(client) = self.store.client(stored.client_id).await? else {
            self.audit(
                AuditAction::AccessDenied,
                format!("token {token} references a missing client"),
            )
            .await;
            return Err(DomainError::NotFound.into());
        };

        let projects = self.store.projects_for_client(client.id).await?;
        let project_ids: Vec<ProjectId> = projects.iter().map(|p| p.id).collect();
        let payments = self.store.payments_for_projects(&project_ids).await?;

        self.audit(
            AuditAction::ClientAccess,
            format!("access granted to client {} ({})", client.name, client.id),
        )
        .await;

        Ok(ClientReport {
            client,
            projects,
            payments,
        })
    }
}
