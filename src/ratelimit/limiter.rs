//! Core rate limiter implementation.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

use super::category::Category;
use super::clock::{Clock, SystemClock};
use super::identity::resolve_identity;
use super::policy::{PolicyTable, QuotaPolicy};
use super::store::{counter_key, CounterEntry, CounterStore, MemoryStore};

/// Quota state after an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Requests allowed per window
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// When the current window ends, in milliseconds since the Unix epoch
    pub reset_at_ms: u64,
}

/// Details of a request that exceeded its quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub category: Category,
    /// The policy's user-facing message
    pub message: String,
    /// Requests allowed per window
    pub limit: u64,
    /// Whole seconds until the window ends, rounded up
    pub retry_after_secs: u64,
    /// When the window ends, in milliseconds since the Unix epoch
    pub reset_at_ms: u64,
}

impl Rejection {
    /// When the window ends, as a UTC timestamp.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.reset_at_ms as i64).unwrap_or_default()
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Admit(Quota),
    Reject(Rejection),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }

    /// Convert into a `Result` so call sites can use `?`.
    pub fn into_result(self) -> Result<Quota, Rejection> {
        match self {
            Decision::Admit(quota) => Ok(quota),
            Decision::Reject(rejection) => Err(rejection),
        }
    }
}

/// Fixed-window rate limiter keyed by category and caller identity.
///
/// This struct is thread-safe and can be shared across multiple tasks.
pub struct RateLimiter {
    /// Policy per category
    policies: RwLock<Arc<PolicyTable>>,
    /// Counters indexed by `<category>:<identity>`
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a rate limiter over an explicit store and clock.
    pub fn new(policies: PolicyTable, store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            policies: RwLock::new(Arc::new(policies)),
            store,
            clock,
        }
    }

    /// Create a rate limiter with a process-local store and the system clock.
    pub fn in_memory(policies: PolicyTable) -> Self {
        Self::new(policies, Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    /// Check and record one request for `identity` under `category`.
    ///
    /// Admitted requests advance the counter. Rejected requests leave the
    /// counter and its reset time untouched, so retrying inside a blocked
    /// window never extends the penalty.
    pub fn check(&self, category: Category, identity: &str) -> Decision {
        let policy = self.policy(category);
        let key = counter_key(category, identity);
        let now = self.clock.now_ms();
        let window_ms = policy.window_ms();
        let limit = policy.max_requests;

        trace!(key = %key, "Checking rate limit");

        let mut admitted = false;
        let mut started_window = false;
        let entry = self.store.update(&key, &mut |current| match current {
            Some(entry) if !entry.is_expired(now) => {
                if entry.count >= limit {
                    None
                } else {
                    admitted = true;
                    Some(CounterEntry {
                        count: entry.count + 1,
                        ..*entry
                    })
                }
            }
            _ => {
                admitted = true;
                started_window = true;
                Some(CounterEntry::fresh(now, window_ms))
            }
        });
        let entry = entry.unwrap_or_else(|| CounterEntry::fresh(now, window_ms));

        if started_window {
            debug!(
                key = %key,
                limit = limit,
                window_ms = window_ms,
                "Starting new rate limit window"
            );
        }

        if admitted {
            return Decision::Admit(Quota {
                limit,
                remaining: limit.saturating_sub(entry.count),
                reset_at_ms: entry.reset_time_ms,
            });
        }

        let retry_after_secs = entry.reset_time_ms.saturating_sub(now).div_ceil(1000).max(1);
        debug!(
            key = %key,
            retry_after_secs = retry_after_secs,
            "Rate limit exceeded"
        );

        Decision::Reject(Rejection {
            category,
            message: policy.message.clone(),
            limit,
            retry_after_secs,
            reset_at_ms: entry.reset_time_ms,
        })
    }

    /// Resolve the caller from request headers and check its quota.
    pub fn check_request(
        &self,
        category: Category,
        headers: &HeaderMap,
        user_id: Option<&str>,
    ) -> Decision {
        let identity = resolve_identity(headers, user_id);
        self.check(category, &identity)
    }

    /// The policy currently applied to a category.
    pub fn policy(&self, category: Category) -> QuotaPolicy {
        self.policies.read().get(category).clone()
    }

    /// Swap in a new policy table. Existing counters keep their windows.
    pub fn set_policies(&self, policies: PolicyTable) {
        *self.policies.write() = Arc::new(policies);
    }

    /// The store backing this limiter.
    pub fn store(&self) -> Arc<dyn CounterStore> {
        Arc::clone(&self.store)
    }

    /// The clock driving this limiter.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Get the counter for a category and identity, if one exists.
    pub fn counter(&self, category: Category, identity: &str) -> Option<CounterEntry> {
        self.store.get(&counter_key(category, identity))
    }

    /// Clear all counters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Get the number of active counters.
    pub fn counter_count(&self) -> usize {
        self.store.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory(PolicyTable::default())
    }
}
