//! NFT Order Aggregator — Library Root
//!
//! Aggregates buy/sell order data from external NFT marketplaces
//! (OpenSea, LooksRare, X2Y2, plus a metadata provider), normalizes
//! the responses into one canonical order model, caches results behind
//! per-exchange TTLs, and maintains a persisted activity ledger whose
//! status transitions are verified against on-chain receipts.
//!
//! This crate is a library consumed by resolvers and jobs; it exposes
//! no CLI or network listener of its own.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;
