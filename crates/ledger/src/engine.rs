use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use clientdesk_core::{ClientId, DomainError, PaymentId, ProjectId};
use clientdesk_domain::{AuditAction, AuditLogEntry, Client, Payment, Project};
use clientdesk_store::{Store, StoreError};

use crate::commands::{
    CreateClient, CreateProject, EditPayment, EditProject, RecordPayment, UpdateClient,
};

/// How many times a mutation reloads and reapplies after losing an
/// optimistic-version race before giving up with a conflict.
const MAX_CONFLICT_RETRIES: usize = 5;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            // A conflict that escapes the retry loop is a domain-visible
            // "try again" outcome, not an infrastructure failure.
            StoreError::Conflict(msg) => LedgerError::Domain(DomainError::Conflict(msg)),
            other => LedgerError::Store(other),
        }
    }
}

/// Result of recording a payment. `overpayment` is a warning, never an
/// error: the balance floored at zero because the amount exceeded it.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub project: Project,
    pub overpayment: bool,
}

/// Applies ledger mutations atomically and keeps the audit trail.
///
/// Every operation — successful or rejected — appends an audit entry before
/// returning. Audit failures are logged and swallowed; they never mask the
/// operation's own outcome.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn Store>,
}

impl LedgerEngine {
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

    async fn audited<T>(
        &self,
        action: AuditAction,
        result: Result<T, LedgerError>,
        ok_detail: impl FnOnce(&T) -> String,
    ) -> Result<T, LedgerError> {
        match &result {
            Ok(value) => self.audit(action, ok_detail(value)).await,
            Err(e) => self.audit(action, format!("rejected: {e}")).await,
        }
        result
    }

    // --- clients ---

    pub async fn create_client(&self, cmd: CreateClient) -> Result<Client, LedgerError> {
        let result = async {
            let client = Client::new(cmd.name, cmd.email)?;
            self.store.insert_client(&client).await?;
            Ok(client)
        }
        .await;
        self.audited(AuditAction::ClientCreate, result, |c: &Client| {
            format!("client created: {} ({})", c.name, c.id)
        })
        .await
    }

    pub async fn update_client(&self, cmd: UpdateClient) -> Result<Client, LedgerError> {
        let result = async {
            let mut client = self
                .store
                .client(cmd.client_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            client.update(cmd.name, cmd.email)?;
            self.store.update_client(&client).await?;
            Ok(client)
        }
        .await;
        self.audited(AuditAction::ClientUpdate, result, |c: &Client| {
            format!("client updated: {}", c.id)
        })
        .await
    }

    /// Blocked while the client owns any project; no cascading delete.
    pub async fn delete_client(&self, id: ClientId) -> Result<(), LedgerError> {
        let result = async {
            if self.store.client(id).await?.is_none() {
                return Err(DomainError::NotFound.into());
            }
            if self.store.client_has_projects(id).await? {
                return Err(DomainError::conflict("client still owns projects").into());
            }
            self.store.delete_tokens_for_client(id).await?;
            self.store.delete_client(id).await?;
            Ok(())
        }
        .await;
        self.audited(AuditAction::ClientDelete, result, |_| {
            format!("client deleted: {id}")
        })
        .await
    }

    // --- projects ---

    pub async fn create_project(&self, cmd: CreateProject) -> Result<Project, LedgerError> {
        let result = async {
            if self.store.client(cmd.client_id).await?.is_none() {
                return Err(DomainError::NotFound.into());
            }
            let project = Project::new(cmd.client_id, cmd.name, cmd.budget)?;
            self.store.insert_project(&project).await?;
            Ok(project)
        }
        .await;
        self.audited(AuditAction::ProjectCreate, result, |p: &Project| {
            format!("project created: {} (client {})", p.name, p.client_id)
        })
        .await
    }

    /// Recomputes the balance from the payment rows against the new budget;
    /// the stored balance is never trusted and status always follows the
    /// recomputed balance.
    pub async fn edit_project(&self, cmd: EditProject) -> Result<Project, LedgerError> {
        let result = self.try_edit_project(&cmd).await;
        self.audited(AuditAction::ProjectUpdate, result, |p: &Project| {
            format!("project updated: {} (balance {})", p.id, p.balance)
        })
        .await
    }

    async fn try_edit_project(&self, cmd: &EditProject) -> Result<Project, LedgerError> {
        for _ in 0..MAX_CONFLICT_RETRIES {
            let mut project = self
                .store
                .project(cmd.project_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let expected = project.version;

            if let Some(name) = &cmd.name {
                project.rename(name.clone())?;
            }
            let paid_total: i64 = self
                .store
                .payments_for_project(cmd.project_id)
                .await?
                .iter()
                .map(|p| p.amount)
                .sum();
            project.rebuild(cmd.budget, paid_total)?;

            match self.store.update_project(&project, expected).await {
                Ok(()) => {
                    project.version = expected + 1;
                    return Ok(project);
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::conflict("concurrent ledger update, retries exhausted").into())
    }

    /// Blocked while the project owns any payment; no cascading delete.
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), LedgerError> {
        let result = async {
            if self.store.project(id).await?.is_none() {
                return Err(DomainError::NotFound.into());
            }
            if self.store.project_has_payments(id).await? {
                return Err(DomainError::conflict("project still owns payments").into());
            }
            self.store.delete_project(id).await?;
            Ok(())
        }
        .await;
        self.audited(AuditAction::ProjectDelete, result, |_| {
            format!("project deleted: {id}")
        })
        .await
    }

    // --- payments ---

    pub async fn record_payment(&self, cmd: RecordPayment) -> Result<PaymentReceipt, LedgerError> {
        let result = self.try_record_payment(&cmd).await;
        self.audited(AuditAction::PaymentCreate, result, |r: &PaymentReceipt| {
            let mut detail = format!(
                "payment of {} recorded for project {}",
                r.payment.amount, r.project.id
            );
            if r.overpayment {
                detail.push_str(" (overpayment, balance floored at zero)");
            }
            detail
        })
        .await
    }

    async fn try_record_payment(&self, cmd: &RecordPayment) -> Result<PaymentReceipt, LedgerError> {
        let payment = Payment::new(cmd.project_id, cmd.date, cmd.amount, cmd.kind.clone())?;
        for _ in 0..MAX_CONFLICT_RETRIES {
            let mut project = self
                .store
                .project(cmd.project_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let expected = project.version;
            let overpayment = project.apply_payment(cmd.amount);

            match self.store.insert_payment(&payment, &project, expected).await {
                Ok(()) => {
                    project.version = expected + 1;
                    return Ok(PaymentReceipt {
                        payment: payment.clone(),
                        project,
                        overpayment,
                    });
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::conflict("concurrent ledger update, retries exhausted").into())
    }

    /// Applies `delta = new_amount - old_amount` to the owning project's
    /// balance, atomically with the payment row.
    pub async fn edit_payment(&self, cmd: EditPayment) -> Result<Payment, LedgerError> {
        let result = self.try_edit_payment(&cmd).await;
        self.audited(AuditAction::PaymentUpdate, result, |p: &Payment| {
            format!("payment updated: {} (amount {})", p.id, p.amount)
        })
        .await
    }

    async fn try_edit_payment(&self, cmd: &EditPayment) -> Result<Payment, LedgerError> {
        for _ in 0..MAX_CONFLICT_RETRIES {
            let mut payment = self
                .store
                .payment(cmd.payment_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let mut project = self
                .store
                .project(payment.project_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let expected = project.version;

            let delta = cmd.amount - payment.amount;
            payment.edit(cmd.date, cmd.amount, cmd.kind.clone())?;
            project.apply_amount_delta(delta);

            match self.store.update_payment(&payment, &project, expected).await {
                Ok(()) => return Ok(payment),
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::conflict("concurrent ledger update, retries exhausted").into())
    }

    /// Reverses the payment's effect on the owning project's balance.
    pub async fn delete_payment(&self, id: PaymentId) -> Result<(), LedgerError> {
        let result = self.try_delete_payment(id).await;
        self.audited(AuditAction::PaymentDelete, result, |_| {
            format!("payment deleted: {id}")
        })
        .await
    }

    async fn try_delete_payment(&self, id: PaymentId) -> Result<(), LedgerError> {
        for _ in 0..MAX_CONFLICT_RETRIES {
            let payment = self
                .store
                .payment(id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let mut project = self
                .store
                .project(payment.project_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let expected = project.version;
            project.reverse_payment(payment.amount);

            match self.store.delete_payment(id, &project, expected).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::conflict("concurrent ledger update, retries exhausted").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clientdesk_domain::ProjectStatus;
    use clientdesk_store::InMemoryStore;

    fn engine() -> (LedgerEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (LedgerEngine::new(store.clone()), store)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn seed(engine: &LedgerEngine, budget: i64) -> (Client, Project) {
        let client = engine
            .create_client(CreateClient {
                name: "Innovatech Solutions".into(),
                email: "innovatech@example.com".into(),
            })
            .await
            .unwrap();
        let project = engine
            .create_project(CreateProject {
                client_id: client.id,
                name: "System Migration Phase 1".into(),
                budget,
            })
            .await
            .unwrap();
        (client, project)
    }

    async fn record(engine: &LedgerEngine, project: ProjectId, amount: i64) -> PaymentReceipt {
        engine
            .record_payment(RecordPayment {
                project_id: project,
                date: date("2025-01-15"),
                amount,
                kind: "Hito".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn partial_payments_keep_project_active() {
        let (engine, _) = engine();
        let (_, project) = seed(&engine, 15_000).await;

        record(&engine, project.id, 5_000).await;
        let receipt = record(&engine, project.id, 7_000).await;

        assert_eq!(receipt.project.balance, 3_000);
        assert_eq!(receipt.project.status, ProjectStatus::Active);
        assert!(!receipt.overpayment);
    }

    #[tokio::test]
    async fn exact_payoff_closes_project() {
        let (engine, _) = engine();
        let (_, project) = seed(&engine, 10_000).await;

        let receipt = record(&engine, project.id, 10_000).await;
        assert_eq!(receipt.project.balance, 0);
        assert_eq!(receipt.project.status, ProjectStatus::Closed);
        assert!(!receipt.overpayment);
    }

    #[tokio::test]
    async fn overpayment_floors_at_zero_with_warning() {
        let (engine, _) = engine();
        let (_, project) = seed(&engine, 15_000).await;
        record(&engine, project.id, 5_000).await;
        record(&engine, project.id, 7_000).await;

        let receipt = record(&engine, project.id, 4_000).await;
        assert!(receipt.overpayment);
        assert_eq!(receipt.project.balance, 0);
        assert_eq!(receipt.project.status, ProjectStatus::Closed);
    }

    #[tokio::test]
    async fn deleting_a_payment_restores_balance_and_status() {
        let (engine, store) = engine();
        let (_, project) = seed(&engine, 15_000).await;
        record(&engine, project.id, 5_000).await;
        let receipt = record(&engine, project.id, 7_000).await;

        engine.delete_payment(receipt.payment.id).await.unwrap();

        let stored = store.project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 10_000);
        assert_eq!(stored.status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn editing_a_payment_applies_the_delta() {
        let (engine, store) = engine();
        let (_, project) = seed(&engine, 15_000).await;
        let receipt = record(&engine, project.id, 5_000).await;

        engine
            .edit_payment(EditPayment {
                payment_id: receipt.payment.id,
                date: date("2025-02-28"),
                amount: 8_000,
                kind: "Hito 1".into(),
            })
            .await
            .unwrap();

        let stored = store.project(project.id).await.unwrap().unwrap();
        // delta +3000 on a 10000 balance
        assert_eq!(stored.balance, 7_000);
        let payment = store.payment(receipt.payment.id).await.unwrap().unwrap();
        assert_eq!(payment.amount, 8_000);
        assert_eq!(payment.kind, "Hito 1");
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected_and_audited() {
        let (engine, store) = engine();
        let (_, project) = seed(&engine, 10_000).await;

        let err = engine
            .record_payment(RecordPayment {
                project_id: project.id,
                date: date("2025-01-15"),
                amount: 0,
                kind: "Inicial".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::Validation(_))));

        let logs = store.logs().await.unwrap();
        assert!(logs
            .iter()
            .any(|l| l.action == AuditAction::PaymentCreate && l.detail.starts_with("rejected")));
    }

    #[tokio::test]
    async fn edit_project_recomputes_from_payments() {
        let (engine, _) = engine();
        let (_, project) = seed(&engine, 15_000).await;
        record(&engine, project.id, 5_000).await;
        record(&engine, project.id, 7_000).await;

        let updated = engine
            .edit_project(EditProject {
                project_id: project.id,
                name: None,
                budget: 20_000,
            })
            .await
            .unwrap();
        assert_eq!(updated.balance, 8_000);
        assert_eq!(updated.status, ProjectStatus::Active);

        // Same budget again, no new payments: same balance (idempotent).
        let again = engine
            .edit_project(EditProject {
                project_id: project.id,
                name: None,
                budget: 20_000,
            })
            .await
            .unwrap();
        assert_eq!(again.balance, 8_000);
    }

    #[tokio::test]
    async fn delete_project_is_blocked_while_it_owns_payments() {
        let (engine, store) = engine();
        let (_, project) = seed(&engine, 10_000).await;
        record(&engine, project.id, 2_000).await;

        let err = engine.delete_project(project.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::Conflict(_))));

        // No rows removed.
        assert!(store.project(project.id).await.unwrap().is_some());
        assert_eq!(store.payments_for_project(project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_client_is_blocked_while_it_owns_projects() {
        let (engine, store) = engine();
        let (client, _) = seed(&engine, 10_000).await;

        let err = engine.delete_client(client.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::Conflict(_))));
        assert!(store.client(client.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let (engine, _) = engine();
        let err = engine
            .record_payment(RecordPayment {
                project_id: ProjectId::new(),
                date: date("2025-01-15"),
                amount: 1_000,
                kind: "Inicial".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn concurrent_payments_do_not_lose_updates() {
        // budget 3000, simultaneous payments of 1000 and 2000 must leave
        // the balance at exactly 0.
        let (engine, store) = engine();
        let (_, project) = seed(&engine, 3_000).await;

        let e1 = engine.clone();
        let e2 = engine.clone();
        let id = project.id;
        let a = tokio::spawn(async move { record(&e1, id, 1_000).await });
        let b = tokio::spawn(async move { record(&e2, id, 2_000).await });
        a.await.unwrap();
        b.await.unwrap();

        let stored = store.project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 0);
        assert_eq!(stored.status, ProjectStatus::Closed);
        assert_eq!(stored.version, 2);
    }
}
