//! Key-value store abstraction used by the distributed lock, with Redis and in-memory backends

pub mod client;
pub mod error;
pub mod memory;
pub mod operations;
pub mod scripts;
pub mod store;

pub use client::RedisClient;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::{CompareAndDelete, KeyValueStore};
