//! Cache Adapters - In-process TTL Store
//!
//! Implements the cache store port with an in-process map. The
//! process owns its cache lifetime; nothing here survives a restart,
//! which matches the TTL semantics anyway.

pub mod memory;

pub use memory::MemoryCache;
