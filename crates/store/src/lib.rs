//! Infrastructure layer: the injectable storage interface and its backends.
//!
//! The Ledger Engine and the Access Token Service depend only on the
//! [`Store`] trait. Two implementations exist: [`InMemoryStore`] for tests
//! and dev mode, and [`PgStore`] for Postgres. There is exactly one
//! business-logic path; the backends differ only behind the trait.

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use r#trait::Store;
