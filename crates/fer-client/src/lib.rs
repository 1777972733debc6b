//! Client-side core of the FER contest platform.
//!
//! - [`client::ApiClient`] talks to the `fer-server` JSON API.
//! - [`local::LocalStorage`] is the client-local key/value mirror (vote
//!   markers, participant flags, image overrides, fallback candidates).
//! - [`registry::CandidateRegistry`] gives one CRUD surface over a remote and
//!   a fallback candidate store.
//! - [`ledger::VoteLedger`] admits or rejects vote attempts.
//! - [`resolver::AssetResolver`] binds a logical name to an image URL.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod client;
pub mod error;
pub mod ledger;
pub mod local;
pub mod registry;
pub mod resolver;

pub use error::{ClientError, StorageError, VoteError};
