//! Fetch strategy trait
//!
//! A strategy turns a `FetchRequest` into a `FetchResult`. The fallback
//! policy composes a direct strategy with an optional browser strategy, and
//! tests substitute scripted fakes.

use crate::fetch::{FetchMethod, FetchRequest, FetchResult};
use async_trait::async_trait;

/// Trait for page retrieval backends
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Performs one attempt; never retries internally
    async fn fetch(&self, request: &FetchRequest) -> FetchResult;

    /// The method recorded on pages this strategy produces
    fn method(&self) -> FetchMethod;

    /// Releases pooled resources (browser processes, connections)
    async fn shutdown(&self) {}
}
