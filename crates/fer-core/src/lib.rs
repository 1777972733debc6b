//! Core types and trait definitions for the FER contest platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, API, server and client crates all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod asset;
pub mod candidate;
pub mod error;
pub mod identity;
pub mod store;
pub mod text;
pub mod vote;

pub use error::{Error, Result};
