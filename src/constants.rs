//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_api_url: String,

  // Search form defaults
  pub default_max_results: u32,
  pub default_min_views: u64,
  pub max_results_options: Vec<u32>,

  // Results table
  pub entries_per_page_options: Vec<usize>,
  pub default_entries_per_page: usize,
  pub page_window: usize,

  // Status line
  pub error_dismiss_secs: u64,

  /// `(code, name)` pairs; the empty code means no country restriction.
  pub countries: Vec<(String, String)>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Display name for a country code, falling back to the code itself.
pub fn country_name(code: &str) -> &str {
  constants().countries.iter().find(|(c, _)| c == code).map_or(code, |(_, name)| name.as_str())
}
