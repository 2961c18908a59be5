//! Explicit command objects for every ledger mutation.
//!
//! The boundary layer is responsible for collecting and parsing input before
//! issuing a command; the engine validates and applies it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clientdesk_core::{ClientId, PaymentId, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClient {
    pub client_id: ClientId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub client_id: ClientId,
    pub name: String,
    /// Minor units; must be positive. The new project's balance starts equal
    /// to the budget and its status is always Active.
    pub budget: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditProject {
    pub project_id: ProjectId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// New budget; the balance is recomputed from scratch against the
    /// project's payments and the status derived from the result.
    pub budget: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub project_id: ProjectId,
    pub date: NaiveDate,
    pub amount: i64,
    /// Free-form payment label ("Inicial", "Hito 1", ...).
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPayment {
    pub payment_id: PaymentId,
    pub date: NaiveDate,
    pub amount: i64,
    pub kind: String,
}
