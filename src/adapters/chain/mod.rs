//! Chain Adapters - alloy-rs 0.9 RPC Access
//!
//! Connection management plus the concrete chain client behind the
//! validator's port.

pub mod client;
pub mod provider;

pub use client::RpcChainClient;
pub use provider::RpcProvider;
