//! Tuneable constants, embedded from `constants.ron` at compile time via
//! `include_str!` and parsed once on first access.

use serde::Deserialize;
use std::sync::LazyLock;
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube Data API
  pub api_base: String,
  pub request_timeout_secs: u64,
  pub page_size: u32,
  pub related_max: u32,

  // Collection caps
  pub history_cap: usize,
  pub search_history_cap: usize,
  pub collection_cap: usize,

  // Search suggestions
  pub suggestion_cap: usize,
  pub trending_phrases: Vec<String>,
  pub suggestion_patterns: Vec<String>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // The file is embedded in the binary; a parse failure here means the
  // crate itself shipped broken.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON")
});

pub fn constants() -> &'static Constants {
  &CONSTANTS
}
