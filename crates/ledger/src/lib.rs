//! `clientdesk-ledger` — the Ledger Engine.
//!
//! The only writer of a project's `balance`/`status` fields. Mutations come
//! in as explicit command structs, are validated against the domain rules,
//! and are applied through the [`clientdesk_store::Store`] interface as
//! single atomic writes with optimistic-conflict retry.

pub mod commands;
pub mod engine;

pub use commands::{
    CreateClient, CreateProject, EditPayment, EditProject, RecordPayment, UpdateClient,
};
pub use engine::{LedgerEngine, LedgerError, PaymentReceipt};
