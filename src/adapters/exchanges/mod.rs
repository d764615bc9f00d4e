//! Marketplace Adapters - One Module per External API
//!
//! Each adapter owns its wire schema (strict serde decode), its
//! normalization into the canonical `Order`, and its chain support
//! matrix. Documents that fail validation are logged and skipped.

pub mod looksrare;
pub mod nftport;
pub mod opensea;
pub mod x2y2;

use serde::Deserialize;

/// JSON fields some marketplaces serve as either a string or a
/// number (timestamps, counters).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StringOrNumber {
  Text(String),
  Number(i64),
}

impl StringOrNumber {
  pub(crate) fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Text(s) => s.parse().ok(),
      Self::Number(n) => Some(*n),
    }
  }

  pub(crate) fn to_plain_string(&self) -> String {
    match self {
      Self::Text(s) => s.clone(),
      Self::Number(n) => n.to_string(),
    }
  }
}
