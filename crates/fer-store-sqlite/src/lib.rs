//! SQLite backend for the FER contest store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Vote admission runs inside a single
//! SQLite transaction, which is what makes "record vote" and "increment
//! tally" one atomic step.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
