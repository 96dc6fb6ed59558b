//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. Every repository is implemented on
//! [`store::SqliteTx`], so all calls share the caller's transaction.

pub mod assignment;
pub mod certificate;
pub mod connection;
pub mod pool;
pub mod profile;
pub mod skill;
pub mod store;

pub use store::{SqliteStore, SqliteTx};
