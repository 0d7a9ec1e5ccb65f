use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::constants::constants;
use crate::duration::parse_duration;

// --- Video ---

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThumbnailItem {
  pub url: String,
  pub width: u32,
  pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Thumbnails {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<ThumbnailItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub medium: Option<ThumbnailItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub high: Option<ThumbnailItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub standard: Option<ThumbnailItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maxres: Option<ThumbnailItem>,
}

/// One video returned by the search service.
///
/// Engagement counters arrive as text and are parsed on demand, so a bad
/// counter degrades to zero instead of failing the whole result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
  pub video_id: String,
  pub title: String,
  pub channel_title: String,
  #[serde(default)]
  pub channel_id: String,
  pub publish_time: DateTime<Utc>,
  #[serde(default)]
  pub view_count: String,
  #[serde(default)]
  pub like_count: String,
  #[serde(default)]
  pub comment_count: String,
  #[serde(default)]
  pub subscriber_count: String,
  #[serde(default)]
  pub duration: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub thumbnails: Thumbnails,
  #[serde(default)]
  pub video_link: String,
  #[serde(default)]
  pub channel_link: String,
  #[serde(rename = "relevancy_score", default)]
  pub relevancy_score: f64,
  /// URLs found in the description. Empty means "none found".
  #[serde(rename = "brand_links", default)]
  pub brand_links: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

impl Video {
  pub fn views(&self) -> u64 {
    parse_count(&self.view_count)
  }

  pub fn likes(&self) -> u64 {
    parse_count(&self.like_count)
  }

  pub fn subscribers(&self) -> u64 {
    parse_count(&self.subscriber_count)
  }

  pub fn duration_secs(&self) -> u64 {
    parse_duration(&self.duration)
  }

  pub fn has_brand_links(&self) -> bool {
    !self.brand_links.is_empty()
  }

  /// Link to the video, derived from the id when the service sent none.
  pub fn url(&self) -> String {
    if self.video_link.is_empty() {
      format!("https://www.youtube.com/watch?v={}", self.video_id)
    } else {
      self.video_link.clone()
    }
  }

  pub fn channel_url(&self) -> String {
    if self.channel_link.is_empty() {
      format!("https://www.youtube.com/channel/{}", self.channel_id)
    } else {
      self.channel_link.clone()
    }
  }
}

/// Parse a counter transmitted as text. Reads the leading run of digits
/// (after whitespace) and yields 0 when there is none.
pub fn parse_count(text: &str) -> u64 {
  let trimmed = text.trim_start();
  let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
  if digits_end == 0 {
    return 0;
  }
  trimmed[..digits_end].parse().unwrap_or(u64::MAX)
}

// --- Filters ---

/// Date filter selector; wire and command-line names are snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum DateFilterKind {
  #[serde(rename = "past_hour")]
  #[value(name = "past_hour")]
  PastHour,
  #[serde(rename = "past_3_hours")]
  #[value(name = "past_3_hours")]
  Past3Hours,
  #[serde(rename = "past_6_hours")]
  #[value(name = "past_6_hours")]
  Past6Hours,
  #[serde(rename = "past_12_hours")]
  #[value(name = "past_12_hours")]
  Past12Hours,
  #[serde(rename = "past_24_hours")]
  #[value(name = "past_24_hours")]
  Past24Hours,
  #[serde(rename = "past_7_days")]
  #[value(name = "past_7_days")]
  Past7Days,
  #[serde(rename = "past_30_days")]
  #[value(name = "past_30_days")]
  Past30Days,
  #[serde(rename = "past_90_days")]
  #[value(name = "past_90_days")]
  Past90Days,
  #[serde(rename = "past_180_days")]
  #[value(name = "past_180_days")]
  Past180Days,
  #[serde(rename = "custom")]
  #[value(name = "custom")]
  Custom,
  #[default]
  #[serde(rename = "all_time")]
  #[value(name = "all_time")]
  AllTime,
}

impl DateFilterKind {
  pub const ALL: [DateFilterKind; 11] = [
    DateFilterKind::PastHour,
    DateFilterKind::Past3Hours,
    DateFilterKind::Past6Hours,
    DateFilterKind::Past12Hours,
    DateFilterKind::Past24Hours,
    DateFilterKind::Past7Days,
    DateFilterKind::Past30Days,
    DateFilterKind::Past90Days,
    DateFilterKind::Past180Days,
    DateFilterKind::AllTime,
    DateFilterKind::Custom,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      DateFilterKind::PastHour => "past_hour",
      DateFilterKind::Past3Hours => "past_3_hours",
      DateFilterKind::Past6Hours => "past_6_hours",
      DateFilterKind::Past12Hours => "past_12_hours",
      DateFilterKind::Past24Hours => "past_24_hours",
      DateFilterKind::Past7Days => "past_7_days",
      DateFilterKind::Past30Days => "past_30_days",
      DateFilterKind::Past90Days => "past_90_days",
      DateFilterKind::Past180Days => "past_180_days",
      DateFilterKind::Custom => "custom",
      DateFilterKind::AllTime => "all_time",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      DateFilterKind::PastHour => "Past Hour",
      DateFilterKind::Past3Hours => "Past 3 Hours",
      DateFilterKind::Past6Hours => "Past 6 Hours",
      DateFilterKind::Past12Hours => "Past 12 Hours",
      DateFilterKind::Past24Hours => "Past 24 Hours",
      DateFilterKind::Past7Days => "Past 7 Days",
      DateFilterKind::Past30Days => "Past 30 Days",
      DateFilterKind::Past90Days => "Past 90 Days",
      DateFilterKind::Past180Days => "Past 180 Days",
      DateFilterKind::Custom => "Custom Range",
      DateFilterKind::AllTime => "All Time",
    }
  }
}

/// Publication window for a query. Custom bounds only exist inside the
/// `Custom` variant, so they cannot linger after switching to a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
  PastHour,
  Past3Hours,
  Past6Hours,
  Past12Hours,
  Past24Hours,
  Past7Days,
  Past30Days,
  Past90Days,
  Past180Days,
  #[default]
  AllTime,
  Custom {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
  },
}

impl DateFilter {
  pub fn kind(&self) -> DateFilterKind {
    match self {
      DateFilter::PastHour => DateFilterKind::PastHour,
      DateFilter::Past3Hours => DateFilterKind::Past3Hours,
      DateFilter::Past6Hours => DateFilterKind::Past6Hours,
      DateFilter::Past12Hours => DateFilterKind::Past12Hours,
      DateFilter::Past24Hours => DateFilterKind::Past24Hours,
      DateFilter::Past7Days => DateFilterKind::Past7Days,
      DateFilter::Past30Days => DateFilterKind::Past30Days,
      DateFilter::Past90Days => DateFilterKind::Past90Days,
      DateFilter::Past180Days => DateFilterKind::Past180Days,
      DateFilter::AllTime => DateFilterKind::AllTime,
      DateFilter::Custom { .. } => DateFilterKind::Custom,
    }
  }

  /// Build a filter from its selector. `Custom` starts with no bounds.
  pub fn from_kind(kind: DateFilterKind) -> Self {
    match kind {
      DateFilterKind::PastHour => DateFilter::PastHour,
      DateFilterKind::Past3Hours => DateFilter::Past3Hours,
      DateFilterKind::Past6Hours => DateFilter::Past6Hours,
      DateFilterKind::Past12Hours => DateFilter::Past12Hours,
      DateFilterKind::Past24Hours => DateFilter::Past24Hours,
      DateFilterKind::Past7Days => DateFilter::Past7Days,
      DateFilterKind::Past30Days => DateFilter::Past30Days,
      DateFilterKind::Past90Days => DateFilter::Past90Days,
      DateFilterKind::Past180Days => DateFilter::Past180Days,
      DateFilterKind::AllTime => DateFilter::AllTime,
      DateFilterKind::Custom => DateFilter::Custom { from: None, to: None },
    }
  }

  pub fn custom_range(&self) -> Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    match *self {
      DateFilter::Custom { from, to } => Some((from, to)),
      _ => None,
    }
  }
}

/// Where the brand name must appear for a video to match. Command-line
/// names are kebab-case (`title-only`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum KeywordFilter {
  #[default]
  Any,
  TitleOnly,
  DescriptionOnly,
  TitleAndDescription,
}

impl KeywordFilter {
  pub const ALL: [KeywordFilter; 4] =
    [KeywordFilter::Any, KeywordFilter::TitleOnly, KeywordFilter::DescriptionOnly, KeywordFilter::TitleAndDescription];

  pub fn label(self) -> &'static str {
    match self {
      KeywordFilter::Any => "Any Location",
      KeywordFilter::TitleOnly => "Title Only",
      KeywordFilter::DescriptionOnly => "Description Only",
      KeywordFilter::TitleAndDescription => "Both Title & Description",
    }
  }

  /// Warning shown when the filter narrows results.
  pub fn advisory(self) -> Option<&'static str> {
    match self {
      KeywordFilter::Any => None,
      KeywordFilter::TitleOnly => Some(
        "Only videos with the brand name in the title (not in description). This may significantly reduce the number of results.",
      ),
      KeywordFilter::DescriptionOnly => Some(
        "Only videos with the brand name in the description (not in title). This may significantly reduce the number of results.",
      ),
      KeywordFilter::TitleAndDescription => Some(
        "Only videos with the brand name in both title and description. This will substantially reduce the number of results.",
      ),
    }
  }
}

/// Resource warning tier for a requested result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLoad {
  Normal,
  Medium,
  High,
  Extreme,
}

impl ResultLoad {
  pub fn for_max_results(max_results: u32) -> Self {
    match max_results {
      n if n >= 500 => ResultLoad::Extreme,
      n if n >= 200 => ResultLoad::High,
      n if n > 50 => ResultLoad::Medium,
      _ => ResultLoad::Normal,
    }
  }

  pub fn message(self, max_results: u32) -> Option<String> {
    match self {
      ResultLoad::Normal => None,
      ResultLoad::Medium => Some(format!(
        "For {} results, add at least 2 variations of the brand name (comma separated) to widen coverage.",
        max_results
      )),
      ResultLoad::High => Some(format!(
        "{} results need at least 3 brand name variations (comma separated) and can take 100+ seconds.",
        max_results
      )),
      ResultLoad::Extreme => Some(format!(
        "{} results need at least 5 brand name variations (comma separated) and can take over 150 seconds.",
        max_results
      )),
    }
  }
}

// --- Search parameters ---

/// One query as submitted to the search service. Structural equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SearchParamsWire", into = "SearchParamsWire")]
pub struct SearchParams {
  pub brand_name: String,
  pub max_results: u32,
  pub min_views: u64,
  pub date_filter: DateFilter,
  /// Empty means no country restriction.
  pub country_code: String,
  pub keyword_filter: KeywordFilter,
  /// Channel names the service should drop from results.
  pub excluded_channels: Vec<String>,
}

impl Default for SearchParams {
  fn default() -> Self {
    Self {
      brand_name: String::new(),
      max_results: constants().default_max_results,
      min_views: constants().default_min_views,
      date_filter: DateFilter::AllTime,
      country_code: String::new(),
      keyword_filter: KeywordFilter::Any,
      excluded_channels: Vec::new(),
    }
  }
}

impl SearchParams {
  pub fn for_brand(brand_name: impl Into<String>) -> Self {
    Self { brand_name: brand_name.into(), ..Self::default() }
  }

  pub fn is_submittable(&self) -> bool {
    !self.brand_name.trim().is_empty()
  }

  /// Restore every filter to its default, keeping the brand name.
  pub fn reset_filters(&mut self) {
    *self = Self { brand_name: std::mem::take(&mut self.brand_name), ..Self::default() };
  }

  /// Number of filters that differ from their defaults. The brand name is not a filter.
  pub fn active_filter_count(&self) -> usize {
    let defaults = Self::default();
    [
      self.max_results != defaults.max_results,
      self.min_views != defaults.min_views,
      self.date_filter != defaults.date_filter,
      !self.country_code.is_empty(),
      self.keyword_filter != defaults.keyword_filter,
      !self.excluded_channels.is_empty(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
  }

  /// Add a channel to the exclusion set. Returns false for blanks and duplicates.
  pub fn add_excluded_channel(&mut self, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || self.excluded_channels.iter().any(|c| c == name) {
      return false;
    }
    self.excluded_channels.push(name.to_string());
    true
  }

  pub fn remove_excluded_channel(&mut self, name: &str) -> bool {
    let before = self.excluded_channels.len();
    self.excluded_channels.retain(|c| c != name);
    self.excluded_channels.len() != before
  }

  pub fn clear_excluded_channels(&mut self) {
    self.excluded_channels.clear();
  }

  pub fn set_date_filter_kind(&mut self, kind: DateFilterKind) {
    if self.date_filter.kind() != kind {
      self.date_filter = DateFilter::from_kind(kind);
    }
  }
}

/// Flat wire form of [`SearchParams`]. Custom dates are dropped unless the
/// filter is `custom`.
#[derive(Serialize, Deserialize)]
struct SearchParamsWire {
  brand_name: String,
  max_results: u32,
  min_views: u64,
  #[serde(default)]
  date_filter: DateFilterKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  custom_date_from: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  custom_date_to: Option<DateTime<Utc>>,
  #[serde(default)]
  country_code: String,
  #[serde(default)]
  keyword_filter: KeywordFilter,
  #[serde(default)]
  excluded_channels: Vec<String>,
}

impl From<SearchParamsWire> for SearchParams {
  fn from(wire: SearchParamsWire) -> Self {
    let date_filter = match wire.date_filter {
      DateFilterKind::Custom => DateFilter::Custom { from: wire.custom_date_from, to: wire.custom_date_to },
      kind => DateFilter::from_kind(kind),
    };
    Self {
      brand_name: wire.brand_name,
      max_results: wire.max_results,
      min_views: wire.min_views,
      date_filter,
      country_code: wire.country_code,
      keyword_filter: wire.keyword_filter,
      excluded_channels: wire.excluded_channels,
    }
  }
}

impl From<SearchParams> for SearchParamsWire {
  fn from(params: SearchParams) -> Self {
    let (custom_date_from, custom_date_to) = params.date_filter.custom_range().unwrap_or((None, None));
    Self {
      brand_name: params.brand_name,
      max_results: params.max_results,
      min_views: params.min_views,
      date_filter: params.date_filter.kind(),
      custom_date_from,
      custom_date_to,
      country_code: params.country_code,
      keyword_filter: params.keyword_filter,
      excluded_channels: params.excluded_channels,
    }
  }
}
