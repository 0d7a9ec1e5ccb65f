//! Accumulated brand comparisons.
//!
//! Each "compare" freezes the current session's results and query into a
//! [`ComparisonSnapshot`] and empties the session so the next brand can be
//! searched with the same filters. Snapshots keep insertion order and each
//! carries its own table state.

use std::sync::Arc;
use tracing::info;

use crate::analytics::{Summary, summarize};
use crate::models::{SearchParams, Video};
use crate::session::SearchSession;
use crate::table::TableView;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompareError {
  #[error("Search for a brand before comparing.")]
  MissingBrand,
  #[error("There are no results to compare yet.")]
  NoResults,
  #[error("A search is still running.")]
  SearchInFlight,
}

/// Frozen copy of one brand's results and the query that produced them.
#[derive(Debug, Clone)]
pub struct ComparisonSnapshot {
  brand_name: String,
  videos: Arc<[Video]>,
  search_params: SearchParams,
}

impl ComparisonSnapshot {
  pub fn brand_name(&self) -> &str {
    &self.brand_name
  }

  pub fn videos(&self) -> &[Video] {
    &self.videos
  }

  pub fn search_params(&self) -> &SearchParams {
    &self.search_params
  }
}

/// A snapshot plus its independent sort/page state.
#[derive(Debug, Clone)]
pub struct ComparisonEntry {
  pub snapshot: ComparisonSnapshot,
  pub table: TableView,
  pub summary: Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
  /// Only the live session is shown.
  Single,
  /// At least one snapshot exists; snapshots are shown alongside the session.
  Comparison,
}

#[derive(Debug, Default)]
pub struct Comparisons {
  entries: Vec<ComparisonEntry>,
}

impl Comparisons {
  pub fn entries(&self) -> &[ComparisonEntry] {
    &self.entries
  }

  pub fn get(&self, index: usize) -> Option<&ComparisonEntry> {
    self.entries.get(index)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut ComparisonEntry> {
    self.entries.get_mut(index)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn mode(&self) -> ViewMode {
    if self.entries.is_empty() { ViewMode::Single } else { ViewMode::Comparison }
  }

  /// Whether `session` can be captured right now.
  pub fn check(session: &SearchSession) -> Result<(), CompareError> {
    if session.is_loading() {
      return Err(CompareError::SearchInFlight);
    }
    if !session.params.is_submittable() {
      return Err(CompareError::MissingBrand);
    }
    if session.videos().is_empty() {
      return Err(CompareError::NoResults);
    }
    Ok(())
  }

  /// Append a snapshot of `session`, then clear its results and brand name.
  /// Returns the new snapshot's index.
  pub fn capture(&mut self, session: &mut SearchSession, page_size: usize) -> Result<usize, CompareError> {
    Self::check(session)?;
    let (videos, search_params) = session.take_for_snapshot();
    let snapshot = ComparisonSnapshot { brand_name: search_params.brand_name.clone(), videos, search_params };
    info!(brand = %snapshot.brand_name, videos = snapshot.videos.len(), "comparison snapshot captured");
    let summary = summarize(&snapshot.videos);
    self.entries.push(ComparisonEntry { snapshot, table: TableView::with_page_size(page_size), summary });
    Ok(self.entries.len() - 1)
  }

  /// Remove the snapshot at `index`; later snapshots shift down by one.
  pub fn remove(&mut self, index: usize) -> Option<ComparisonSnapshot> {
    if index >= self.entries.len() {
      return None;
    }
    let entry = self.entries.remove(index);
    info!(brand = %entry.snapshot.brand_name, index, remaining = self.entries.len(), "comparison snapshot removed");
    Some(entry.snapshot)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::fixtures::video;
  use crate::models::{DateFilter, KeywordFilter};
  use crate::sort::SortField;

  fn loaded_session(brand: &str, count: usize) -> SearchSession {
    let mut session = SearchSession::new(SearchParams::for_brand(brand));
    let (ticket, _) = session.submit().unwrap();
    let videos = (0..count).map(|i| video(&format!("{}{}", brand, i), brand, &i.to_string())).collect();
    session.resolve(ticket, Ok(videos));
    session
  }

  fn brands(comparisons: &Comparisons) -> Vec<&str> {
    comparisons.entries().iter().map(|e| e.snapshot.brand_name()).collect()
  }

  // --- capture ---

  #[test]
  fn capture_snapshots_and_resets_session() {
    let mut session = loaded_session("Acme", 5);
    session.params.min_views = 250;
    session.params.date_filter = DateFilter::Past7Days;
    session.params.keyword_filter = KeywordFilter::TitleOnly;
    session.params.add_excluded_channel("Spam TV");
    let filters_before = session.params.clone();

    let mut comparisons = Comparisons::default();
    assert_eq!(comparisons.mode(), ViewMode::Single);
    let index = comparisons.capture(&mut session, 10).unwrap();

    assert_eq!(index, 0);
    assert_eq!(comparisons.mode(), ViewMode::Comparison);
    let snapshot = &comparisons.get(0).unwrap().snapshot;
    assert_eq!(snapshot.brand_name(), "Acme");
    assert_eq!(snapshot.videos().len(), 5);
    assert_eq!(snapshot.search_params(), &filters_before);

    assert!(session.videos().is_empty());
    assert_eq!(session.params.brand_name, "");
    assert_eq!(SearchParams { brand_name: "Acme".to_string(), ..session.params.clone() }, filters_before);
  }

  #[test]
  fn capture_requires_results_and_brand() {
    let mut comparisons = Comparisons::default();

    let mut empty = loaded_session("Acme", 0);
    assert_eq!(comparisons.capture(&mut empty, 10), Err(CompareError::NoResults));

    let mut unnamed = loaded_session("Acme", 2);
    unnamed.params.brand_name.clear();
    assert_eq!(comparisons.capture(&mut unnamed, 10), Err(CompareError::MissingBrand));
    assert_eq!(unnamed.videos().len(), 2);

    let mut busy = loaded_session("Acme", 2);
    busy.submit();
    assert_eq!(comparisons.capture(&mut busy, 10), Err(CompareError::SearchInFlight));

    assert!(comparisons.is_empty());
  }

  #[test]
  fn snapshot_is_isolated_from_later_searches() {
    let mut session = loaded_session("Acme", 3);
    let mut comparisons = Comparisons::default();
    comparisons.capture(&mut session, 10).unwrap();

    session.params.brand_name = "Globex".to_string();
    let (ticket, _) = session.submit().unwrap();
    session.resolve(ticket, Ok(vec![video("g", "Globex", "1")]));

    let snapshot = &comparisons.get(0).unwrap().snapshot;
    assert_eq!(snapshot.videos().len(), 3);
    assert!(snapshot.videos().iter().all(|v| v.title == "Acme"));
    assert_eq!(snapshot.search_params().brand_name, "Acme");
  }

  #[test]
  fn snapshot_tables_are_independent() {
    let mut comparisons = Comparisons::default();
    comparisons.capture(&mut loaded_session("Acme", 30), 10).unwrap();
    comparisons.capture(&mut loaded_session("Globex", 30), 10).unwrap();

    let first = comparisons.get_mut(0).unwrap();
    first.table.toggle_sort(SortField::ViewCount);
    first.table.next_page(30);

    let second = comparisons.get(1).unwrap();
    assert_eq!(second.table.sort_field, None);
    assert_eq!(second.table.page(), 1);
  }

  #[test]
  fn capture_computes_summary() {
    let mut comparisons = Comparisons::default();
    comparisons.capture(&mut loaded_session("Acme", 4), 10).unwrap();
    let entry = comparisons.get(0).unwrap();
    assert_eq!(entry.summary.total_views, 6);
    assert_eq!(entry.summary.video_count, 4);
  }

  // --- remove ---

  #[test]
  fn remove_preserves_relative_order() {
    let mut comparisons = Comparisons::default();
    for brand in ["A", "B", "C"] {
      comparisons.capture(&mut loaded_session(brand, 1), 10).unwrap();
    }
    assert_eq!(comparisons.remove(1).map(|s| s.brand_name().to_string()), Some("B".to_string()));
    assert_eq!(brands(&comparisons), vec!["A", "C"]);
    comparisons.remove(0);
    assert_eq!(brands(&comparisons), vec!["C"]);
  }

  #[test]
  fn removing_everything_returns_to_single_mode() {
    let mut comparisons = Comparisons::default();
    comparisons.capture(&mut loaded_session("A", 1), 10).unwrap();
    assert!(comparisons.remove(5).is_none());
    comparisons.remove(0);
    assert!(comparisons.is_empty());
    assert_eq!(comparisons.mode(), ViewMode::Single);
  }
}
