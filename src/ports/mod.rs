//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ExchangeAdapter`: one external marketplace's order API
//! - `CacheStore`: shared TTL key/value + sorted-set cache
//! - `ActivityStore`: persisted ledger records with conditional writes
//! - `ChainClient`: transaction/receipt lookups for validation

pub mod cache;
pub mod chain;
pub mod exchange;
pub mod store;
