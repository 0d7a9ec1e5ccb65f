//! The single active query/result pairing and its search lifecycle.
//!
//! `idle -> loading -> idle (results | error)`. Every submission gets a
//! ticket from a monotonic counter; only the newest ticket's response is
//! applied, so a slow earlier request can never overwrite a later one.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{SearchBackend, SearchError};
use crate::models::{SearchParams, Video};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
  Idle,
  Loading,
  Error(String),
}

/// What the results area should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsState {
  /// Nothing searched yet.
  NotSearched,
  Loading,
  Failed,
  /// The last search succeeded and matched nothing.
  Empty,
  Ready,
}

/// Proof of a submitted search, handed back with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Outcome of applying a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  Loaded(usize),
  Failed,
  /// A newer search was submitted after this one; the response was dropped.
  Stale,
}

#[derive(Debug)]
pub struct SearchSession {
  /// The query being edited; also the query of the current results.
  pub params: SearchParams,
  videos: Arc<[Video]>,
  status: SessionStatus,
  last_submitted: Option<SearchParams>,
  /// Whether a search has ever completed successfully in this session.
  searched: bool,
  generation: u64,
}

impl Default for SearchSession {
  fn default() -> Self {
    Self::new(SearchParams::default())
  }
}

impl SearchSession {
  pub fn new(params: SearchParams) -> Self {
    Self {
      params,
      videos: Arc::from(Vec::new()),
      status: SessionStatus::Idle,
      last_submitted: None,
      searched: false,
      generation: 0,
    }
  }

  pub fn videos(&self) -> &[Video] {
    &self.videos
  }

  pub fn status(&self) -> &SessionStatus {
    &self.status
  }

  pub fn is_loading(&self) -> bool {
    self.status == SessionStatus::Loading
  }

  pub fn error(&self) -> Option<&str> {
    match &self.status {
      SessionStatus::Error(msg) => Some(msg),
      _ => None,
    }
  }

  pub fn last_submitted(&self) -> Option<&SearchParams> {
    self.last_submitted.as_ref()
  }

  pub fn results_state(&self) -> ResultsState {
    match self.status {
      SessionStatus::Loading => ResultsState::Loading,
      SessionStatus::Error(_) => ResultsState::Failed,
      SessionStatus::Idle if !self.videos.is_empty() => ResultsState::Ready,
      SessionStatus::Idle if self.searched => ResultsState::Empty,
      SessionStatus::Idle => ResultsState::NotSearched,
    }
  }

  /// Start a search for the current `params`. Returns `None`, changing
  /// nothing, when the brand name is empty.
  pub fn submit(&mut self) -> Option<(SearchTicket, SearchParams)> {
    if !self.params.is_submittable() {
      debug!("search rejected: empty brand name");
      return None;
    }
    self.generation += 1;
    let params = self.params.clone();
    self.status = SessionStatus::Loading;
    self.last_submitted = Some(params.clone());
    info!(brand = %params.brand_name, ticket = self.generation, "search submitted");
    Some((SearchTicket(self.generation), params))
  }

  /// Apply the response for `ticket`. A failure clears the result list so
  /// stale rows are never shown under a failed query.
  pub fn resolve(&mut self, ticket: SearchTicket, result: Result<Vec<Video>, SearchError>) -> Resolution {
    if ticket.0 != self.generation {
      warn!(ticket = ticket.0, latest = self.generation, "discarding stale search response");
      return Resolution::Stale;
    }
    match result {
      Ok(videos) => {
        let count = videos.len();
        info!(count, "search completed");
        self.videos = Arc::from(videos);
        self.status = SessionStatus::Idle;
        self.searched = true;
        Resolution::Loaded(count)
      }
      Err(e) => {
        warn!(err = %e, quota = e.is_quota(), "search failed");
        self.videos = Arc::from(Vec::new());
        self.status = SessionStatus::Error(e.user_message());
        Resolution::Failed
      }
    }
  }

  /// Mark the in-flight search as lost (its task died without answering).
  pub fn abandon(&mut self, ticket: SearchTicket) {
    if ticket.0 == self.generation && self.is_loading() {
      self.status = SessionStatus::Error("Search task failed.".to_string());
    }
  }

  /// Hand the current results over for a comparison snapshot: returns the
  /// frozen results and query, empties the result list and clears the brand
  /// name while keeping every other filter.
  pub(crate) fn take_for_snapshot(&mut self) -> (Arc<[Video]>, SearchParams) {
    let videos = std::mem::replace(&mut self.videos, Arc::from(Vec::new()));
    let params = self.params.clone();
    self.params.brand_name.clear();
    self.searched = false;
    (videos, params)
  }

  /// Submit, call `backend` once and apply the response.
  pub async fn run<B: SearchBackend>(&mut self, backend: &B) -> Option<Resolution> {
    let (ticket, params) = self.submit()?;
    let result = backend.search(params).await;
    Some(self.resolve(ticket, result))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::stub::StubBackend;
  use crate::models::fixtures::video;

  fn session_for(brand: &str) -> SearchSession {
    SearchSession::new(SearchParams::for_brand(brand))
  }

  // --- submit ---

  #[test]
  fn empty_brand_is_rejected_without_state_change() {
    let mut session = SearchSession::default();
    assert!(session.submit().is_none());
    assert_eq!(session.status(), &SessionStatus::Idle);
    assert!(session.last_submitted().is_none());
    assert_eq!(session.results_state(), ResultsState::NotSearched);
  }

  #[test]
  fn submit_marks_loading_and_records_query() {
    let mut session = session_for("Acme");
    let (_, params) = session.submit().unwrap();
    assert!(session.is_loading());
    assert_eq!(session.results_state(), ResultsState::Loading);
    assert_eq!(session.last_submitted(), Some(&params));
  }

  // --- resolve ---

  #[test]
  fn success_replaces_results() {
    let mut session = session_for("Acme");
    let (ticket, _) = session.submit().unwrap();
    let resolution = session.resolve(ticket, Ok(vec![video("a", "A", "1"), video("b", "B", "2")]));
    assert_eq!(resolution, Resolution::Loaded(2));
    assert_eq!(session.videos().len(), 2);
    assert_eq!(session.status(), &SessionStatus::Idle);
    assert_eq!(session.results_state(), ResultsState::Ready);
  }

  #[test]
  fn zero_results_show_empty_state() {
    let mut session = session_for("Nike");
    session.params.min_views = 1000;
    session.params.max_results = 10;
    let (ticket, _) = session.submit().unwrap();
    session.resolve(ticket, Ok(Vec::new()));
    assert_eq!(session.results_state(), ResultsState::Empty);
    assert!(session.error().is_none());
  }

  #[test]
  fn failure_sets_error_and_clears_results() {
    let mut session = session_for("Acme");
    let (ticket, _) = session.submit().unwrap();
    session.resolve(ticket, Ok(vec![video("a", "A", "1")]));
    let (ticket, _) = session.submit().unwrap();
    let resolution = session.resolve(ticket, Err(SearchError::QuotaExhausted));
    assert_eq!(resolution, Resolution::Failed);
    assert!(session.videos().is_empty());
    assert!(!session.is_loading());
    assert!(session.error().is_some_and(|m| m.contains("quota")));
    assert_eq!(session.results_state(), ResultsState::Failed);
  }

  #[test]
  fn generic_failure_message() {
    let mut session = session_for("Acme");
    let (ticket, _) = session.submit().unwrap();
    session.resolve(ticket, Err(SearchError::from_response(503, None)));
    assert_eq!(session.error(), Some("Error: Failed to fetch videos. Status: 503"));
  }

  #[test]
  fn stale_response_is_discarded() {
    let mut session = session_for("Acme");
    let (first, _) = session.submit().unwrap();
    session.params.brand_name = "Globex".to_string();
    let (second, _) = session.submit().unwrap();

    session.resolve(second, Ok(vec![video("g", "Globex ad", "5")]));
    let late = session.resolve(first, Ok(vec![video("a", "Acme ad", "5")]));

    assert_eq!(late, Resolution::Stale);
    assert_eq!(session.videos()[0].video_id, "g");
    assert_eq!(session.last_submitted().map(|p| p.brand_name.as_str()), Some("Globex"));
  }

  #[test]
  fn stale_response_does_not_end_loading() {
    let mut session = session_for("Acme");
    let (first, _) = session.submit().unwrap();
    let _second = session.submit().unwrap();
    session.resolve(first, Err(SearchError::QuotaExhausted));
    assert!(session.is_loading());
  }

  #[test]
  fn abandon_only_affects_latest_ticket() {
    let mut session = session_for("Acme");
    let (first, _) = session.submit().unwrap();
    let (second, _) = session.submit().unwrap();
    session.abandon(first);
    assert!(session.is_loading());
    session.abandon(second);
    assert_eq!(session.error(), Some("Search task failed."));
    assert!(!session.is_loading());
  }

  // --- run ---

  #[tokio::test]
  async fn run_calls_backend_once() {
    let backend = StubBackend::new(vec![Ok(vec![video("a", "A", "10")])]);
    let mut session = session_for("Acme");
    let resolution = session.run(&backend).await;
    assert_eq!(resolution, Some(Resolution::Loaded(1)));
    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].brand_name, "Acme");
  }

  #[tokio::test]
  async fn run_with_empty_brand_never_calls_backend() {
    let backend = StubBackend::new(Vec::new());
    let mut session = SearchSession::default();
    assert_eq!(session.run(&backend).await, None);
    assert!(backend.calls.lock().unwrap().is_empty());
  }
}
