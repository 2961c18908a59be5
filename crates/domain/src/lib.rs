//! `clientdesk-domain` — entities and invariant logic.
//!
//! Clients own projects, projects own payments. The one relationship worth
//! guarding is the ledger invariant on [`Project`]:
//! `balance == max(0, budget - sum(payments))` with `status == Closed`
//! exactly when the balance reaches zero. All balance arithmetic lives here;
//! storage and HTTP layers never touch those fields directly.

pub mod audit;
pub mod client;
pub mod payment;
pub mod project;
pub mod token;

pub use audit::{AuditAction, AuditLogEntry, MAX_RETAINED_ENTRIES};
pub use client::Client;
pub use payment::Payment;
pub use project::{Project, ProjectStatus};
pub use token::{AccessToken, TOKEN_TTL_HOURS};
