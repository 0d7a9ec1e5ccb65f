use serde::Serialize;

use crate::models::Video;

/// Derived metrics over one result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub video_count: usize,
  pub total_views: u64,
  pub total_likes: u64,
  /// Likes per hundred views, two decimals. Zero when there are no views.
  pub engagement_rate: f64,
  pub videos_with_links: usize,
  /// Share of videos with at least one brand link; `None` for an empty set.
  pub link_coverage_percent: Option<u32>,
}

pub fn summarize(videos: &[Video]) -> Summary {
  let total_views = videos.iter().fold(0u64, |acc, v| acc.saturating_add(v.views()));
  let total_likes = videos.iter().fold(0u64, |acc, v| acc.saturating_add(v.likes()));
  let engagement_rate =
    if total_views == 0 { 0.0 } else { round2(total_likes as f64 / total_views as f64 * 100.0) };
  let videos_with_links = videos.iter().filter(|v| v.has_brand_links()).count();
  let link_coverage_percent = (!videos.is_empty())
    .then(|| (videos_with_links as f64 / videos.len() as f64 * 100.0).round() as u32);
  Summary { video_count: videos.len(), total_views, total_likes, engagement_rate, videos_with_links, link_coverage_percent }
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}
