//! Distributed lock module, providing a lock over any `KeyValueStore` with a conditional set

pub mod config;
pub mod error;
pub mod guard;
pub mod lock;

pub use config::{AcquireOptions, LockConfig, DEFAULT_MAX_HOLD_SECS, DEFAULT_POLL_INTERVAL};
pub use error::{DistributedLockError, Result};
pub use guard::LockGuard;
pub use lock::{DistributedLock, ReleaseOutcome};
