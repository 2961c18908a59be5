use serde::{Deserialize, Serialize};

use clientdesk_core::{ClientId, DomainError, DomainResult, ProjectId};

/// Project lifecycle, derived from the balance: a project is closed exactly
/// when nothing remains to be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Closed,
}

impl ProjectStatus {
    pub fn from_balance(balance: i64) -> Self {
        if balance == 0 {
            Self::Closed
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// A client project with a budget and a derived open balance.
///
/// Invariant: `balance == max(0, budget - sum(payments.amount))` and
/// `status == Closed` exactly when `balance == 0`. Only the methods below
/// move `balance`/`status`; `version` is the optimistic-concurrency token
/// checked by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    pub name: String,
    pub budget: i64,
    pub balance: i64,
    pub status: ProjectStatus,
    pub version: u64,
}

impl Project {
    /// A fresh project starts with `balance == budget` and is Active: it has
    /// no payments yet, so no hint can make it Closed.
    pub fn new(client_id: ClientId, name: impl Into<String>, budget: i64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("project name cannot be empty"));
        }
        if budget <= 0 {
            return Err(DomainError::validation("project budget must be positive"));
        }
        Ok(Self {
            id: ProjectId::new(),
            client_id,
            name: name.trim().to_string(),
            budget,
            balance: budget,
            status: ProjectStatus::Active,
            version: 0,
        })
    }

    /// Apply a new payment to the open balance, flooring at zero.
    ///
    /// Returns `true` when the amount exceeded the open balance. Overpayment
    /// is allowed; the flag is surfaced to the caller as a warning.
    pub fn apply_payment(&mut self, amount: i64) -> bool {
        let overpaid = amount > self.balance;
        self.balance = (self.balance - amount).max(0);
        self.sync_status();
        overpaid
    }

    /// Apply an amount change of an existing payment:
    /// `balance = max(0, balance - (new - old))`.
    pub fn apply_amount_delta(&mut self, delta: i64) {
        self.balance = (self.balance - delta).max(0);
        self.sync_status();
    }

    /// Reverse a deleted payment's effect: `balance = max(0, balance + amount)`.
    pub fn reverse_payment(&mut self, amount: i64) {
        self.balance = (self.balance + amount).max(0);
        self.sync_status();
    }

    /// Recompute the balance from scratch against a (possibly new) budget and
    /// the full payment total. Does not trust the stored balance, and derives
    /// status from the result rather than from any caller-provided hint.
    pub fn rebuild(&mut self, new_budget: i64, paid_total: i64) -> DomainResult<()> {
        if new_budget <= 0 {
            return Err(DomainError::validation("project budget must be positive"));
        }
        self.budget = new_budget;
        self.balance = (new_budget - paid_total).max(0);
        self.sync_status();
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("project name cannot be empty"));
        }
        self.name = name.trim().to_string();
        Ok(())
    }

    fn sync_status(&mut self) {
        self.status = ProjectStatus::from_balance(self.balance);
    }
}
