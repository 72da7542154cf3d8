//! Quota backend trait for abstracting limiter implementations.

use async_trait::async_trait;

use super::category::Category;
use super::limiter::{Decision, RateLimiter};

/// Trait for quota backends.
///
/// This trait lets the HTTP layer work with the in-process `RateLimiter`
/// or with a limiter that consults a shared external store.
#[async_trait]
pub trait QuotaBackend: Send + Sync {
    /// Check and record one request for `identity` under `category`.
    async fn check(&self, category: Category, identity: &str) -> Decision;
}

#[async_trait]
impl QuotaBackend for RateLimiter {
    async fn check(&self, category: Category, identity: &str) -> Decision {
        RateLimiter::check(self, category, identity)
    }
}
