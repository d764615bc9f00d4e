//! Persistence Adapters - Activity Ledger Storage
//!
//! Implements the activity store port with an in-process map guarded
//! by a single async lock, which is what makes the conditional status
//! transition atomic. No database dependency.

pub mod memory;

pub use memory::MemoryActivityStore;
