//! Canonical domain types.
//!
//! The inner ring of the hexagonal architecture: orders, activities,
//! and NFT identity helpers. Nothing here knows about HTTP, caches,
//! or chain RPC.

pub mod activity;
pub mod nft;
pub mod order;
