//! Compact ISO-8601 video durations (`PT1H2M3S`).
//!
//! Malformed input is treated as a zero-length duration rather than an error:
//! a video with an unreadable duration still sorts and exports.

use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern must compile")
});

/// Total seconds encoded by `text`. Absent components count as zero; input
/// without a `PT` marker is zero.
pub fn parse_duration(text: &str) -> u64 {
  let Some(caps) = DURATION_RE.captures(text) else { return 0 };
  let component = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
  component(1).saturating_mul(3600).saturating_add(component(2).saturating_mul(60)).saturating_add(component(3))
}

/// Human display form: `0:00`, `M:SS` under an hour, `H:MM:SS` otherwise.
pub fn format_duration(text: &str) -> String {
  format_seconds(parse_duration(text))
}

pub fn format_seconds(total: u64) -> String {
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let seconds = total % 60;
  if hours > 0 { format!("{}:{:02}:{:02}", hours, minutes, seconds) } else { format!("{}:{:02}", minutes, seconds) }
}
