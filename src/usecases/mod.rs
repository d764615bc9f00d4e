//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces. Each use case is a
//! self-contained business operation.
//!
//! Use cases:
//! - `OrderAggregator`: Parallel marketplace fan-out, cached merge
//! - `ActivityLedger`: Persisted activity records and transitions
//! - `TransactionValidator`: On-chain proof checks for cancellations

pub mod aggregator;
pub mod ledger;
pub mod validator;

pub use aggregator::OrderAggregator;
pub use ledger::ActivityLedger;
pub use validator::TransactionValidator;
