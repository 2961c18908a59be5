use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use async_trait::async_trait;

use clientdesk_core::{ClientId, PaymentId, ProjectId};
use clientdesk_domain::{AccessToken, AuditLogEntry, Client, Payment, Project, MAX_RETAINED_ENTRIES};

use super::error::StoreError;
use super::r#trait::Store;

#[derive(Debug, Default)]
struct Inner {
    clients: HashMap<ClientId, Client>,
    projects: HashMap<ProjectId, Project>,
    payments: HashMap<PaymentId, Payment>,
    tokens: HashMap<String, AccessToken>,
    logs: VecDeque<AuditLogEntry>,
}

/// In-memory store backed by a single `RwLock`.
///
/// Intended for tests/dev. Not optimized for performance. Each trait call
/// takes the lock once, so a payment mutation writes the payment and the
/// project row under one critical section.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

/// Check the stored project version and write the new state with the bumped
/// version. The caller holds the write guard, so check and write are atomic.
fn commit_project(
    inner: &mut Inner,
    project: &Project,
    expected_version: u64,
) -> Result<(), StoreError> {
    let stored = inner
        .projects
        .get_mut(&project.id)
        .ok_or_else(|| StoreError::conflict("project row no longer exists"))?;
    if stored.version != expected_version {
        return Err(StoreError::Conflict(format!(
            "expected version {expected_version}, found {}",
            stored.version
        )));
    }
    let mut next = project.clone();
    next.version = expected_version + 1;
    *stored = next;
    Ok(())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.write()?.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<(), StoreError> {
        self.write()?.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn delete_client(&self, id: ClientId) -> Result<(), StoreError> {
        self.write()?.clients.remove(&id);
        Ok(())
    }

    async fn client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.read()?.clients.get(&id).cloned())
    }

    async fn clients(&self) -> Result<Vec<Client>, StoreError> {
        let mut items: Vec<_> = self.read()?.clients.values().cloned().collect();
        items.sort_by_key(|c| *c.id.as_uuid());
        Ok(items)
    }

    async fn client_has_projects(&self, id: ClientId) -> Result<bool, StoreError> {
        Ok(self.read()?.projects.values().any(|p| p.client_id == id))
    }

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        self.write()?.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(
        &self,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        commit_project(&mut inner, project, expected_version)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        self.write()?.projects.remove(&id);
        Ok(())
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut items: Vec<_> = self.read()?.projects.values().cloned().collect();
        items.sort_by_key(|p| *p.id.as_uuid());
        Ok(items)
    }

    async fn projects_for_client(&self, client_id: ClientId) -> Result<Vec<Project>, StoreError> {
        let mut items: Vec<_> = self
            .read()?
            .projects
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        items.sort_by_key(|p| *p.id.as_uuid());
        Ok(items)
    }

    async fn project_has_payments(&self, id: ProjectId) -> Result<bool, StoreError> {
        Ok(self.read()?.payments.values().any(|p| p.project_id == id))
    }

    async fn insert_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        commit_project(&mut inner, project, expected_version)?;
        inner.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_payment(
        &self,
        payment: &Payment,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.payments.contains_key(&payment.id) {
            return Err(StoreError::conflict("payment row no longer exists"));
        }
        commit_project(&mut inner, project, expected_version)?;
        inner.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn delete_payment(
        &self,
        payment_id: PaymentId,
        project: &Project,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.payments.contains_key(&payment_id) {
            return Err(StoreError::conflict("payment row no longer exists"));
        }
        commit_project(&mut inner, project, expected_version)?;
        inner.payments.remove(&payment_id);
        Ok(())
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.read()?.payments.get(&id).cloned())
    }

    async fn payments(&self) -> Result<Vec<Payment>, StoreError> {
        let mut items: Vec<_> = self.read()?.payments.values().cloned().collect();
        items.sort_by_key(|p| *p.id.as_uuid());
        Ok(items)
    }

    async fn payments_for_project(&self, project_id: ProjectId) -> Result<Vec<Payment>, StoreError> {
        let mut items: Vec<_> = self
            .read()?
            .payments
            .values()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect();
        items.sort_by_key(|p| *p.id.as_uuid());
        Ok(items)
    }

    async fn payments_for_projects(
        &self,
        project_ids: &[ProjectId],
    ) -> Result<Vec<Payment>, StoreError> {
        let mut items: Vec<_> = self
            .read()?
            .payments
            .values()
            .filter(|p| project_ids.contains(&p.project_id))
            .cloned()
            .collect();
        items.sort_by_key(|p| *p.id.as_uuid());
        Ok(items)
    }

    async fn insert_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.write()?
            .tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn delete_tokens_for_client(&self, client_id: ClientId) -> Result<(), StoreError> {
        self.write()?.tokens.retain(|_, t| t.client_id != client_id);
        Ok(())
    }

    async fn token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.read()?.tokens.get(token).cloned())
    }

    async fn append_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.logs.push_back(entry.clone());
        while inner.logs.len() > MAX_RETAINED_ENTRIES {
            inner.logs.pop_front();
        }
        Ok(())
    }

    async fn logs(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self.read()?.logs.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clientdesk_domain::AuditAction;

    async fn seed_project(budget: i64) -> (InMemoryStore, Project) {
        let store = InMemoryStore::new();
        let client = Client::new("Innovatech Solutions", "innovatech@example.com").unwrap();
        let project = Project::new(client.id, "System Migration Phase 1", budget).unwrap();
        store.insert_client(&client).await.unwrap();
        store.insert_project(&project).await.unwrap();
        (store, project)
    }

    #[tokio::test]
    async fn stale_project_write_is_rejected() {
        let (store, project) = seed_project(10_000).await;

        let mut updated = project.clone();
        updated.balance = 5_000;
        store.update_project(&updated, 0).await.unwrap();

        // Second writer still holds version 0.
        let err = store.update_project(&updated, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.balance, 5_000);
    }

    #[tokio::test]
    async fn payment_insert_commits_project_and_payment_together() {
        let (store, mut project) = seed_project(10_000).await;
        let payment = Payment::new(
            project.id,
            "2025-01-15".parse().unwrap(),
            4_000,
            "Inicial",
        )
        .unwrap();

        project.apply_payment(4_000);
        store.insert_payment(&payment, &project, 0).await.unwrap();

        let stored = store.project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 6_000);
        assert_eq!(stored.version, 1);
        assert_eq!(
            store.payments_for_project(project.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn stale_payment_insert_leaves_no_payment_row() {
        let (store, mut project) = seed_project(10_000).await;
        project.apply_payment(1_000);
        store.update_project(&project, 0).await.unwrap();

        let payment = Payment::new(
            project.id,
            "2025-01-15".parse().unwrap(),
            4_000,
            "Inicial",
        )
        .unwrap();
        // Stale version: the conditional write must fail and the payment
        // must not be half-committed.
        let err = store.insert_payment(&payment, &project, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.payments_for_project(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_retention_evicts_oldest() {
        let store = InMemoryStore::new();
        for i in 0..(MAX_RETAINED_ENTRIES + 10) {
            let entry = AuditLogEntry::new(AuditAction::AdminLog, format!("entry {i}"), Utc::now());
            store.append_log(&entry).await.unwrap();
        }

        let logs = store.logs().await.unwrap();
        assert_eq!(logs.len(), MAX_RETAINED_ENTRIES);
        // Newest first; entry 0..10 evicted.
        assert_eq!(logs[0].detail, format!("entry {}", MAX_RETAINED_ENTRIES + 9));
        assert_eq!(logs.last().unwrap().detail, "entry 10");
    }

    #[tokio::test]
    async fn token_replacement_removes_old_strings() {
        let store = InMemoryStore::new();
        let client_id = ClientId::new();
        let old = AccessToken::issue(client_id, Utc::now());
        store.insert_token(&old).await.unwrap();

        store.delete_tokens_for_client(client_id).await.unwrap();
        let fresh = AccessToken::issue(client_id, Utc::now());
        store.insert_token(&fresh).await.unwrap();

        assert!(store.token(&old.token).await.unwrap().is_none());
        assert!(store.token(&fresh.token).await.unwrap().is_some());
    }
}
