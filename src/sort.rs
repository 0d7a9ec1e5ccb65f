use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::models::Video;

/// Sortable result-table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
  Title,
  ChannelTitle,
  ViewCount,
  LikeCount,
  SubscriberCount,
  Duration,
  PublishTime,
  BrandLinks,
}

impl SortField {
  /// Column order in the results table.
  pub const ALL: [SortField; 8] = [
    SortField::Title,
    SortField::ChannelTitle,
    SortField::ViewCount,
    SortField::LikeCount,
    SortField::SubscriberCount,
    SortField::Duration,
    SortField::PublishTime,
    SortField::BrandLinks,
  ];

  pub fn label(self) -> &'static str {
    match self {
      SortField::Title => "Title",
      SortField::ChannelTitle => "Channel",
      SortField::ViewCount => "Views",
      SortField::LikeCount => "Likes",
      SortField::SubscriberCount => "Subscribers",
      SortField::Duration => "Length",
      SortField::PublishTime => "Published",
      SortField::BrandLinks => "Brand Links",
    }
  }

  /// Column for a 1-based hotkey digit.
  pub fn from_digit(digit: char) -> Option<Self> {
    let idx = digit.to_digit(10)? as usize;
    idx.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

impl SortOrder {
  pub fn toggled(self) -> Self {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }

  pub fn arrow(self) -> &'static str {
    match self {
      SortOrder::Asc => "↑",
      SortOrder::Desc => "↓",
    }
  }
}

/// Letters with accents and case stripped, so `É` files next to `e`.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
  s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase)
}

/// Collation-style order: base letters first, then accents (unaccented
/// first), then case (lowercase first).
fn text_cmp(a: &str, b: &str) -> Ordering {
  base_letters(a)
    .cmp(base_letters(b))
    .then_with(|| a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase)))
    .then_with(|| b.cmp(a))
}

/// Compare two videos on `field`. `Desc` reverses the ascending result.
pub fn compare(a: &Video, b: &Video, field: SortField, order: SortOrder) -> Ordering {
  let ascending = match field {
    SortField::Title => text_cmp(&a.title, &b.title),
    SortField::ChannelTitle => text_cmp(&a.channel_title, &b.channel_title),
    SortField::ViewCount => a.views().cmp(&b.views()),
    SortField::LikeCount => a.likes().cmp(&b.likes()),
    SortField::SubscriberCount => a.subscribers().cmp(&b.subscribers()),
    SortField::Duration => a.duration_secs().cmp(&b.duration_secs()),
    SortField::PublishTime => a.publish_time.cmp(&b.publish_time),
    SortField::BrandLinks => a.brand_links.len().cmp(&b.brand_links.len()),
  };
  match order {
    SortOrder::Asc => ascending,
    SortOrder::Desc => ascending.reverse(),
  }
}

/// New ordering of `videos`. Stable: equal keys keep their input order in
/// both directions. No field keeps the input order.
pub fn sort_videos(videos: &[Video], field: Option<SortField>, order: SortOrder) -> Vec<Video> {
  let mut sorted = videos.to_vec();
  if let Some(field) = field {
    sorted.sort_by(|a, b| compare(a, b, field, order));
  }
  sorted
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::fixtures::video;
  use chrono::{Duration, TimeZone, Utc};

  fn ids(videos: &[Video]) -> Vec<&str> {
    videos.iter().map(|v| v.video_id.as_str()).collect()
  }

  // --- text comparison ---

  #[test]
  fn text_cmp_is_case_insensitive() {
    assert_eq!(text_cmp("apple", "Banana"), Ordering::Less);
    assert_eq!(text_cmp("Zebra", "apple"), Ordering::Greater);
    assert_eq!(text_cmp("a", "A"), Ordering::Less);
    assert_eq!(text_cmp("same", "same"), Ordering::Equal);
  }

  #[test]
  fn text_cmp_files_accents_with_base_letter() {
    assert_eq!(text_cmp("Éclair", "Zebra"), Ordering::Less);
    assert_eq!(text_cmp("über", "uber"), Ordering::Greater);
    assert_eq!(text_cmp("Ñu", "nube"), Ordering::Less);
    assert_eq!(text_cmp("café", "Café"), Ordering::Less);
  }

  #[test]
  fn accented_titles_sort_alphabetically() {
    let videos = vec![video("z", "Zebra", "1"), video("e", "Éclair", "1"), video("a", "apple", "1")];
    let asc = sort_videos(&videos, Some(SortField::Title), SortOrder::Asc);
    assert_eq!(ids(&asc), vec!["a", "e", "z"]);
    let desc = sort_videos(&videos, Some(SortField::Title), SortOrder::Desc);
    assert_eq!(ids(&desc), vec!["z", "e", "a"]);
  }

  // --- compare ---

  #[test]
  fn numeric_text_compares_as_integers() {
    let a = video("a", "A", "900");
    let b = video("b", "B", "1000");
    assert_eq!(compare(&a, &b, SortField::ViewCount, SortOrder::Asc), Ordering::Less);
    assert_eq!(compare(&a, &b, SortField::ViewCount, SortOrder::Desc), Ordering::Greater);
  }

  #[test]
  fn non_numeric_counts_sort_as_zero() {
    let a = video("a", "A", "abc");
    let b = video("b", "B", "0");
    assert_eq!(compare(&a, &b, SortField::ViewCount, SortOrder::Asc), Ordering::Equal);
  }

  #[test]
  fn duration_compares_by_seconds() {
    let mut a = video("a", "A", "1");
    let mut b = video("b", "B", "1");
    a.duration = "PT1H".to_string();
    b.duration = "PT59M59S".to_string();
    assert_eq!(compare(&a, &b, SortField::Duration, SortOrder::Asc), Ordering::Greater);
  }

  #[test]
  fn publish_time_compares_as_instants() {
    let mut a = video("a", "A", "1");
    let b = video("b", "B", "1");
    a.publish_time = b.publish_time - Duration::seconds(1);
    assert_eq!(compare(&a, &b, SortField::PublishTime, SortOrder::Asc), Ordering::Less);
  }

  #[test]
  fn brand_links_compare_by_count() {
    let mut a = video("a", "A", "1");
    let b = video("b", "B", "1");
    a.brand_links = vec!["https://x.test".to_string()];
    assert_eq!(compare(&a, &b, SortField::BrandLinks, SortOrder::Asc), Ordering::Greater);
  }

  // --- sort_videos ---

  #[test]
  fn no_field_keeps_input_order() {
    let videos = vec![video("c", "C", "3"), video("a", "A", "1"), video("b", "B", "2")];
    assert_eq!(ids(&sort_videos(&videos, None, SortOrder::Desc)), vec!["c", "a", "b"]);
  }

  #[test]
  fn sort_does_not_touch_input() {
    let videos = vec![video("b", "B", "2"), video("a", "A", "1")];
    let sorted = sort_videos(&videos, Some(SortField::Title), SortOrder::Asc);
    assert_eq!(ids(&sorted), vec!["a", "b"]);
    assert_eq!(ids(&videos), vec!["b", "a"]);
  }

  #[test]
  fn equal_keys_keep_input_order_both_directions() {
    let videos = vec![video("x1", "X", "10"), video("y", "Y", "20"), video("x2", "X", "10"), video("z", "Z", "5")];
    let asc = sort_videos(&videos, Some(SortField::ViewCount), SortOrder::Asc);
    let desc = sort_videos(&videos, Some(SortField::ViewCount), SortOrder::Desc);
    assert_eq!(ids(&asc), vec!["z", "x1", "x2", "y"]);
    assert_eq!(ids(&desc), vec!["y", "x1", "x2", "z"]);
  }

  #[test]
  fn descending_reverses_distinct_keys() {
    let rows = [
      ("Mango", "Delta", "5", "9", "700", "PT3M", 4, 2),
      ("apple", "bravo", "300", "1", "20", "PT1H", 1, 0),
      ("Éclair", "Charlie", "42", "30", "5000", "PT45S", 5, 3),
      ("zebra", "alpha", "7", "12", "1", "PT10M2S", 2, 1),
      ("kiwi", "Echo", "1000", "4", "90", "PT2H5M", 3, 4),
    ];
    let videos: Vec<Video> = rows
      .iter()
      .enumerate()
      .map(|(i, (title, channel, views, likes, subs, duration, day, links))| {
        let mut v = video(&format!("v{}", i), title, views);
        v.channel_title = channel.to_string();
        v.like_count = likes.to_string();
        v.subscriber_count = subs.to_string();
        v.duration = duration.to_string();
        v.publish_time = Utc.with_ymd_and_hms(2023, 1, *day, 0, 0, 0).unwrap();
        v.brand_links = (0..*links).map(|n| format!("https://acme.test/{}", n)).collect();
        v
      })
      .collect();
    for field in SortField::ALL {
      let asc = sort_videos(&videos, Some(field), SortOrder::Asc);
      let mut desc = sort_videos(&videos, Some(field), SortOrder::Desc);
      desc.reverse();
      assert_eq!(ids(&asc), ids(&desc), "{:?}", field);
      assert_ne!(ids(&asc), ids(&videos), "{:?} left input order unchanged", field);
    }
  }

  #[test]
  fn sort_field_from_digit() {
    assert_eq!(SortField::from_digit('1'), Some(SortField::Title));
    assert_eq!(SortField::from_digit('8'), Some(SortField::BrandLinks));
    assert_eq!(SortField::from_digit('0'), None);
    assert_eq!(SortField::from_digit('9'), None);
    assert_eq!(SortField::from_digit('x'), None);
  }
}
