//! `clientdesk-access` — the Access Token Service.
//!
//! Issues and validates the bearer tokens that grant a client time-limited,
//! read-only access to its own projects and payments. Reads project/payment
//! data, never mutates it; the only writes are token rows and audit entries.

pub mod service;

pub use service::{AccessError, ClientReport, TokenService};
