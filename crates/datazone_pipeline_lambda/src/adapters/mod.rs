//! Seams between the handlers and AWS. Each module pairs a small synchronous
//! trait with its SDK-backed implementation; tests substitute fakes.

use std::future::Future;

pub mod callback;
pub mod catalog;
pub mod grant_api;
pub mod notifier;
pub mod object_store;
pub mod sleep;

/// Drives an SDK future to completion from synchronous handler code running
/// on the Lambda's multi-thread tokio runtime.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
