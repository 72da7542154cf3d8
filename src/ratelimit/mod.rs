//! Rate limiting logic and state management.

mod backend;
mod category;
mod clock;
mod identity;
mod janitor;
mod limiter;
mod policy;
mod store;

pub use backend::QuotaBackend;
pub use category::Category;
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{resolve_identity, UNKNOWN_IDENTITY};
pub use janitor::{Janitor, JanitorHandle, DEFAULT_SWEEP_INTERVAL};
pub use limiter::{Decision, Quota, RateLimiter, Rejection};
pub use policy::{PolicyFile, PolicyOverride, PolicyTable, QuotaPolicy, MAX_WINDOW};
pub use store::{counter_key, CounterEntry, CounterStore, MemoryStore};
