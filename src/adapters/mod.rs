//! Adapters Layer - Concrete Implementations of the Ports
//!
//! - `http`: shared rate-limited, retrying HTTP client
//! - `exchanges`: one adapter per marketplace + metadata provider
//! - `cache`: TTL cache store implementations
//! - `persistence`: activity store implementations
//! - `chain`: RPC provider and chain client

pub mod cache;
pub mod chain;
pub mod exchanges;
pub mod http;
pub mod persistence;
