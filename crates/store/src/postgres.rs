//! Postgres-backed store implementation.
//!
//! Payment mutations run inside a transaction covering the payment row and a
//! conditional project update (`WHERE id = .. AND version = ..`), so the
//! read-modify-write cycle on a project's balance commits as a single unit.
//! A zero-row conditional update rolls the transaction back and surfaces
//! [`StoreError::Conflict`] for the engine to retry.
//!
//! ## Error mapping
//!
//! | Postgres error code | StoreError | Scenario |
//! |---------------------|------------|----------|
//! | `23505` (unique violation) | `Conflict` | concurrent insert of the same key |
//! | `23503` (foreign key violation) | `Conflict` | dependents exist / parent vanished |
//! | anything else | `Backend` | driver, network, pool failures |

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use clientdesk_core::{ClientId, PaymentId, ProjectId};
use clientdesk_domain::{
    AccessToken, AuditAction, AuditLogEntry, Client, Payment, Project, ProjectStatus,
    MAX_RETAINED_ENTRIES,
};

use super::error::StoreError;
use super::r#trait::Store;

const SCHEMA: &str = include_str!("../schema.sql");

/// Postgres-backed [`Store`].
///
/// Thread-safe via the sqlx connection pool; clone-cheap.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StoreError::backend)?;
        Ok(Self { pool })
    }

    /// Apply the schema (idempotent CREATE IF NOT EXISTS statements).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        tracing::debug!("schema applied");
        Ok(())
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let Some(code) = e.as_database_error().and_then(|d| d.code()) {
        // Unique or foreign-key violations surface as conflicts the caller
        // can resolve (retry or remove dependents); the rest are backend
        // failures.
        if code == "23505" || code == "23503" {
            return StoreError::Conflict(e.to_string());
        }
    }
    StoreError::Backend(e.to_string())
}

fn status_to_int(status: ProjectStatus) -> i32 {
    match status {
        ProjectStatus::Active => 1,
        ProjectStatus::Closed => 0,
    }
}

fn int_to_status(status: i32) -> ProjectStatus {
    if status == 0 {
        ProjectStatus::Closed
    } else {
        ProjectStatus::Active
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<ClientRow> for Client {
    fn from(r: ClientRow) -> Self {
        Client {
            id: ClientId::from_uuid(r.id),
            name: r.name,
            email: r.email,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    client_id: Uuid,
    name: String,
    status: i32,
    budget: i64,
    balance: i64,
    version: i64,
}

impl From<ProjectRow> for Project {
    fn from(r: ProjectRow) -> Self {
        Project {
            id: ProjectId::from_uuid(r.id),
            client_id: ClientId::from_uuid(r.client_id),
            name: r.name,
            budget: r.budget,
            balance: r.balance,
            status: int_to_status(r.status),
            version: r.version as u64,
        }
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    project_id: Uuid,
    date: NaiveDate,
    amount: i64,
    #[sqlx(rename = "type")]
    kind: String,
}

impl From<PaymentRow> for Payment {
    fn from(r: PaymentRow) -> Self {
        Payment {
            id: PaymentId::from_uuid(r.id),
            project_id: ProjectId::from_uuid(r.project_id),
            date: r.date,
            amount: r.amount,
            kind: r.kind,
        }
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    token: String,
    client_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl From<TokenRow> for AccessToken {
    fn from(r: TokenRow) -> Self {
        AccessToken {
            token: r.token,
            client_id: ClientId::from_uuid(r.client_id),
            expires_at: r.expires_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    timestamp: DateTime<Utc>,
    action: String,
    detail: String,
}

impl From<LogRow> for AuditLogEntry {
    fn from(r: LogRow) -> Self {
        AuditLogEntry {
            timestamp: r.timestamp,
            action: AuditAction::from_tag(&r.action).unwrap_or(AuditAction::AdminLog),
            detail: r.detail,
        }
    }
}

/// Conditional project write shared by all ledger mutations. Zero rows
/// affected means the version moved underneath us.
async fn update_project_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    project: &Project,
    expected_version: u64,
) -> Result<(), StoreError> {
    let done = sqlx::query(
        "UPDATE projects
         SET name = $1, status = $2, budget = $3, balance = $4, version = version + 1
         WHERE id = $5 AND version = $6",
    )
    .bind(&project.name)
    .bind(status_to_int(project.status))
    .bind(project.budget)
    .bind(project.balance)
    .bind(project.id.as_uuid())
    .bind(expected_version as i64)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;

    if done.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "project {} changed since version {expected_version}",
            project.id
        )));
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO clients (id, name, email) VALUES ($1, $2, $3)")
            .bind(client.id.as_uuid())
            .bind(&client.name)
            .bind(&client.email)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<(), StoreError> {
        sqlx::query("UPDATE clients SET name = $1, email = $2 WHERE id = $3")
            .bind(&client.name)
            .bind(&client.email)
            .bind(client.id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_client(&self, id: ClientId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, name, email FROM clients WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Client::from))
    }

    async fn clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows = sqlx::query_as::<_, ClientRow>("SELECT id, name, email FROM clients ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn client_has_projects(&self, id: ClientId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM projects WHERE client_id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO projects (id, client_id, name, status, budget, balance, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(project.id.as_uuid())
        .bind(project.client_id.as_uuid())
        .bind(&project.name)
        .bind(status_to_int(project.status))
        .bind(project.budget)
        .bind(project.balance)
        .bind(project.version as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_project(
        &self,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        update_project_in_tx(&mut tx, project, expected_version).await?;
        tx.commit().await.map_err(map_sqlx)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, client_id, name, status, budget, balance, version
             FROM projects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Project::from))
    }

    async fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, client_id, name, status, budget, balance, version
             FROM projects ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn projects_for_client(&self, client_id: ClientId) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, client_id, name, status, budget, balance, version
             FROM projects WHERE client_id = $1 ORDER BY id",
        )
        .bind(client_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn project_has_payments(&self, id: ProjectId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM payments WHERE project_id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        sqlx::query(
            "INSERT INTO payments (id, project_id, date, amount, type)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.project_id.as_uuid())
        .bind(payment.date)
        .bind(payment.amount)
        .bind(&payment.kind)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        update_project_in_tx(&mut tx, project, expected_version).await?;
        tx.commit().await.map_err(map_sqlx)
    }

    async fn update_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let done = sqlx::query(
            "UPDATE payments SET date = $1, amount = $2, type = $3 WHERE id = $4",
        )
        .bind(payment.date)
        .bind(payment.amount)
        .bind(&payment.kind)
        .bind(payment.id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::conflict("payment row no longer exists"));
        }
        update_project_in_tx(&mut tx, project, expected_version).await?;
        tx.commit().await.map_err(map_sqlx)
    }

    async fn delete_payment(
        &self,
        payment_id: PaymentId,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let done = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(payment_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::conflict("payment row no longer exists"));
        }
        update_project_in_tx(&mut tx, project, expected_version).await?;
        tx.commit().await.map_err(map_sqlx)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, project_id, date, amount, type FROM payments WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Payment::from))
    }

    async fn payments(&self) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, project_id, date, amount, type FROM payments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn payments_for_project(&self, project_id: ProjectId) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, project_id, date, amount, type FROM payments
             WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn payments_for_projects(
        &self,
        project_ids: &[ProjectId],
    ) -> Result<Vec<Payment>, StoreError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = project_ids.iter().map(|p| *p.as_uuid()).collect();
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, project_id, date, amount, type FROM payments
             WHERE project_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn insert_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO access_tokens (token, client_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token.token)
            .bind(token.client_id.as_uuid())
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_tokens_for_client(&self, client_id: ClientId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM access_tokens WHERE client_id = $1")
            .bind(client_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT token, client_id, expires_at FROM access_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(AccessToken::from))
    }

    async fn append_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO logs (timestamp, action, detail) VALUES ($1, $2, $3)")
            .bind(entry.timestamp)
            .bind(entry.action.as_str())
            .bind(&entry.detail)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        // Bounded retention: drop everything past the newest MAX_RETAINED_ENTRIES.
        sqlx::query("DELETE FROM logs WHERE id IN (SELECT id FROM logs ORDER BY id DESC OFFSET $1)")
            .bind(MAX_RETAINED_ENTRIES as i64)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn logs(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT timestamp, action, detail FROM logs ORDER BY id DESC LIMIT $1",
        )
        .bind(MAX_RETAINED_ENTRIES as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }
}
