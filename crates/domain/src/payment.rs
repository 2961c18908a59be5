use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clientdesk_core::{DomainError, DomainResult, PaymentId, ProjectId};

/// A payment received against a project.
///
/// Amounts are in minor units (cents) and strictly positive. `kind` is a
/// free-form label ("Inicial", "Hito 1", ...), serialized as `type` on the
/// wire and in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub project_id: ProjectId,
    pub date: NaiveDate,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Payment {
    pub fn new(
        project_id: ProjectId,
        date: NaiveDate,
        amount: i64,
        kind: impl Into<String>,
    ) -> DomainResult<Self> {
        validate_amount(amount)?;
        Ok(Self {
            id: PaymentId::new(),
            project_id,
            date,
            amount,
            kind: kind.into(),
        })
    }

    /// Replace the mutable fields, keeping identity and ownership.
    pub fn edit(&mut self, date: NaiveDate, amount: i64, kind: impl Into<String>) -> DomainResult<()> {
        validate_amount(amount)?;
        self.date = date;
        self.amount = amount;
        self.kind = kind.into();
        Ok(())
    }
}

pub(crate) fn validate_amount(amount: i64) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::validation("payment amount must be positive"));
    }
    Ok(())
}
