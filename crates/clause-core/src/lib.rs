//! Core types and algorithms for the Clause policy revision tracker.
//!
//! Parsing, reconciliation and change-record construction are pure and
//! synchronous. Storage is reached only through the [`store::PolicyStore`]
//! trait, so this crate carries no HTTP or database dependencies.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures in `store`.
#![allow(async_fn_in_trait)]

pub mod change;
pub mod error;
pub mod ingest;
pub mod policy;
pub mod reconcile;
pub mod section;
pub mod source;
pub mod store;
pub mod udiff;

pub use error::{BoxError, Error, Result};
