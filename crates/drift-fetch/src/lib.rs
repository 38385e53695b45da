//! drift-fetch — HTTP fetch layer for Driftboard.
//!
//! One GET per (environment, service) pair, every call independent:
//! a failed pair never blocks or fails any other pair. Health-check
//! endpoints get a bounded exponential-backoff retry; everything else
//! fails on the first error. All failures normalize to a small closed
//! set of user-facing strings.

pub mod client;
pub mod error;
pub mod retry;

pub use client::HttpTransport;
pub use error::FetchError;
pub use retry::{Fetcher, RetryPolicy};

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Boxed future used by the transport seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transport seam between the orchestrator and the network.
///
/// The production implementation is [`HttpTransport`]; tests substitute
/// scripted transports.
pub trait Transport: Send + Sync {
    /// Issue one GET and decode the body as JSON.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>>;
}
