//! Error taxonomy for the aggregation core.
//!
//! Read-path failures (marketplace fetches, cache, validation) are
//! absorbed at the adapter boundary and degrade to empty results or
//! `false`. Only write-path ownership violations surface to callers as
//! typed errors.

use thiserror::Error;

use crate::domain::activity::ActivityStatus;

/// Failure classification for one external marketplace call.
///
/// Adapters map HTTP outcomes onto this enum so the shared retry
/// policy can distinguish retryable from terminal failures.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The marketplace rejected the request (4xx). Treated as "no
    /// matching orders", never surfaced past the adapter.
    #[error("marketplace rejected the request with status {status}")]
    Api { status: u16 },

    /// 5xx, timeout, or transport failure after retries were exhausted.
    #[error("transient marketplace failure: {0}")]
    Transient(String),

    /// The response body did not match the per-exchange schema.
    #[error("document failed schema validation: {0}")]
    Schema(String),
}

impl FetchError {
    /// Whether the shared retry policy should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Typed rejections surfaced by ledger mutations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// None of the requested ids are owned, unread, and on the caller's
    /// chain.
    #[error("no activity eligible for update")]
    NoActivityToUpdate,

    /// The activity exists but belongs to a different wallet.
    #[error("activity {id} is not owned by wallet {wallet}")]
    ActivityNotOwned { id: String, wallet: String },

    /// Only terminal statuses may be assigned through `transition`.
    #[error("status {0:?} cannot be assigned directly")]
    StatusNotAllowed(ActivityStatus),

    /// The backing store failed. Wraps the store-level cause.
    #[error("ledger store failure: {0}")]
    Store(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_fetch_errors_are_retryable() {
        assert!(FetchError::Transient("timeout".into()).is_retryable());
        assert!(!FetchError::Api { status: 404 }.is_retryable());
        assert!(!FetchError::Schema("missing field".into()).is_retryable());
    }
}
