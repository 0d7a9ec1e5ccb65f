//! Client for the brand search service: one `POST /search` call taking
//! [`SearchParams`] and returning a list of [`Video`]s.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{SearchParams, Video};

/// Failures of a search call, classified for user messaging.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
  /// The service ran out of YouTube API quota.
  #[error("YouTube API quota limit reached. Please wait a moment and try again as we switch to another API key.")]
  QuotaExhausted,
  #[error("All YouTube API keys are currently unavailable. Please try again later.")]
  KeysUnavailable,
  #[error("{message}")]
  Api { status: u16, message: String },
  #[error("Failed to fetch videos. Please try again later.")]
  Transport(#[source] reqwest::Error),
  #[error("Failed to fetch videos. Please try again later.")]
  Decode(#[source] reqwest::Error),
}

impl SearchError {
  /// Classify a non-success response from its status and `detail` text.
  pub fn from_response(status: u16, detail: Option<String>) -> Self {
    let detail = detail.unwrap_or_default();
    if status == 500 {
      if detail.contains("quota") || detail.contains("All API keys have been exhausted") {
        return SearchError::QuotaExhausted;
      }
      if detail.contains("No YouTube API keys available") {
        return SearchError::KeysUnavailable;
      }
    }
    let message = if detail.is_empty() { format!("Failed to fetch videos. Status: {}", status) } else { detail };
    SearchError::Api { status, message }
  }

  pub fn is_quota(&self) -> bool {
    matches!(self, SearchError::QuotaExhausted | SearchError::KeysUnavailable)
  }

  /// Text for the status line.
  pub fn user_message(&self) -> String {
    match self {
      SearchError::Transport(_) | SearchError::Decode(_) => self.to_string(),
      _ => format!("Error: {}", self),
    }
  }
}

/// The external search collaborator. Implemented over HTTP by [`ApiClient`]
/// and by in-memory stubs in tests.
pub trait SearchBackend: Send + Sync + 'static {
  fn search(&self, params: SearchParams) -> impl Future<Output = Result<Vec<Video>, SearchError>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
  detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
    // Large result sets can take minutes server-side.
    let http = Client::builder().connect_timeout(Duration::from_secs(10)).build()?;
    Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_string() })
  }

  fn search_url(&self) -> String {
    format!("{}/search", self.base_url)
  }
}

impl SearchBackend for ApiClient {
  async fn search(&self, params: SearchParams) -> Result<Vec<Video>, SearchError> {
    let url = self.search_url();
    debug!(url = %url, brand = %params.brand_name, max_results = params.max_results, "search request");
    let response = self.http.post(&url).json(&params).send().await.map_err(SearchError::Transport)?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.json::<ErrorBody>().await.ok().and_then(|b| b.detail);
      warn!(status = status.as_u16(), detail = ?detail, "search service returned an error");
      return Err(SearchError::from_response(status.as_u16(), detail));
    }
    if status == StatusCode::NO_CONTENT {
      return Ok(Vec::new());
    }

    response.json::<Vec<Video>>().await.map_err(SearchError::Decode)
  }
}

#[cfg(test)]
pub(crate) mod stub {
  use super::*;
  use std::sync::Mutex;

  /// Replays canned responses in order and records every query it receives.
  #[derive(Default)]
  pub struct StubBackend {
    pub responses: Mutex<Vec<Result<Vec<Video>, SearchError>>>,
    pub calls: Mutex<Vec<SearchParams>>,
  }

  impl StubBackend {
    pub fn new(responses: Vec<Result<Vec<Video>, SearchError>>) -> Self {
      Self { responses: Mutex::new(responses), calls: Mutex::new(Vec::new()) }
    }
  }

  impl SearchBackend for StubBackend {
    async fn search(&self, params: SearchParams) -> Result<Vec<Video>, SearchError> {
      self.calls.lock().unwrap().push(params);
      let mut responses = self.responses.lock().unwrap();
      if responses.is_empty() { Ok(Vec::new()) } else { responses.remove(0) }
    }
  }
}
