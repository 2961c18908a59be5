use async_trait::async_trait;

use clientdesk_core::{ClientId, PaymentId, ProjectId};
use clientdesk_domain::{AccessToken, AuditLogEntry, Client, Payment, Project};

use super::error::StoreError;

/// Storage interface for the dashboard's persistent state.
///
/// ## Design principles
///
/// - **No storage assumptions**: works with an in-memory implementation
///   (tests/dev) and a SQL backend (production).
/// - **Optimistic locking on projects**: every project write carries the
///   version the caller loaded; implementations reject stale writes with
///   [`StoreError::Conflict`] and persist `version = expected_version + 1`
///   on success.
/// - **Atomic ledger writes**: each payment mutation is a single call that
///   persists the payment row and the recomputed project row together — all
///   or nothing. Two concurrent payment mutations against the same project
///   must never interleave their read and write steps.
///
/// Lookups return `Ok(None)` for absent rows; "not found" is a domain
/// decision, not a storage error. Deletes are idempotent.
#[async_trait]
pub trait Store: Send + Sync {
    // --- clients ---

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError>;
    async fn update_client(&self, client: &Client) -> Result<(), StoreError>;
    async fn delete_client(&self, id: ClientId) -> Result<(), StoreError>;
    async fn client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;
    async fn clients(&self) -> Result<Vec<Client>, StoreError>;
    async fn client_has_projects(&self, id: ClientId) -> Result<bool, StoreError>;

    // --- projects ---

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError>;
    /// Persist the project's fields if the stored version still equals
    /// `expected_version`; bumps the stored version by one.
    async fn update_project(&self, project: &Project, expected_version: u64)
        -> Result<(), StoreError>;
    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError>;
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    async fn projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn projects_for_client(&self, client_id: ClientId) -> Result<Vec<Project>, StoreError>;
    async fn project_has_payments(&self, id: ProjectId) -> Result<bool, StoreError>;

    // --- payments (atomic with the owning project row) ---

    async fn insert_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError>;
    async fn update_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError>;
    async fn delete_payment(
        &self,
        payment_id: PaymentId,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError>;
    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;
    async fn payments(&self) -> Result<Vec<Payment>, StoreError>;
    async fn payments_for_project(&self, project_id: ProjectId) -> Result<Vec<Payment>, StoreError>;
    async fn payments_for_projects(
        &self,
        project_ids: &[ProjectId],
    ) -> Result<Vec<Payment>, StoreError>;

    // --- access tokens ---

    async fn insert_token(&self, token: &AccessToken) -> Result<(), StoreError>;
    async fn delete_tokens_for_client(&self, client_id: ClientId) -> Result<(), StoreError>;
    async fn token(&self, token: &str) -> Result<Option<AccessToken>, StoreError>;

    // --- audit log ---

    /// Append-only; implementations may evict the oldest entries past
    /// [`clientdesk_domain::MAX_RETAINED_ENTRIES`].
    async fn append_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError>;
    /// Newest first.
    async fn logs(&self) -> Result<Vec<AuditLogEntry>, StoreError>;
}
