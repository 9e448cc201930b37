//! Claim store backends: in-process memory store, Redis shared store.

pub mod memory;
pub mod redis;

pub use memory::{MemoryClaimStore, MemoryStoreStats};
pub use redis::RedisClaimStore;
