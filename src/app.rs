use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api::{ApiClient, SearchBackend, SearchError};
use crate::compare::{Comparisons, ViewMode};
use crate::config::Config;
use crate::constants::constants;
use crate::export::{self, ExportFormat};
use crate::models::{DateFilter, DateFilterKind, KeywordFilter, ResultLoad, Video};
use crate::session::{Resolution, SearchSession, SearchTicket};
use crate::sort::SortField;
use crate::table::TableView;

// --- Types ---

pub type SearchResult = Result<Vec<Video>, SearchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Editing the brand name.
  Input,
  /// Editing the search filters.
  Filters,
  Results,
  Comparisons,
}

/// One row of the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  MaxResults,
  MinViews,
  DateFilter,
  CustomFrom,
  CustomTo,
  Country,
  Keyword,
  ExcludedChannels,
}

impl FilterField {
  pub const ALL: [FilterField; 8] = [
    FilterField::MaxResults,
    FilterField::MinViews,
    FilterField::DateFilter,
    FilterField::CustomFrom,
    FilterField::CustomTo,
    FilterField::Country,
    FilterField::Keyword,
    FilterField::ExcludedChannels,
  ];

  pub fn label(self) -> &'static str {
    match self {
      FilterField::MaxResults => "Max Results",
      FilterField::MinViews => "Min Views",
      FilterField::DateFilter => "Published",
      FilterField::CustomFrom => "From",
      FilterField::CustomTo => "To",
      FilterField::Country => "Country",
      FilterField::Keyword => "Brand In",
      FilterField::ExcludedChannels => "Exclude",
    }
  }

  /// Fields edited as free text; the rest cycle through fixed options.
  pub fn is_text(self) -> bool {
    matches!(self, FilterField::MinViews | FilterField::CustomFrom | FilterField::CustomTo | FilterField::ExcludedChannels)
  }
}

/// Parse `YYYY-MM-DD` as the first (or last) second of that day in UTC.
pub fn parse_day(text: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
  let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?;
  let time = if end_of_day { NaiveTime::from_hms_opt(23, 59, 59)? } else { NaiveTime::MIN };
  Some(date.and_time(time).and_utc())
}

fn step<T: Copy + PartialEq>(options: &[T], current: T, delta: isize) -> Option<T> {
  if options.is_empty() {
    return None;
  }
  let idx = options.iter().position(|o| *o == current).unwrap_or(0) as isize;
  let next = (idx + delta).rem_euclid(options.len() as isize) as usize;
  options.get(next).copied()
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<(SearchTicket, oneshot::Receiver<SearchResult>)>,
}

pub struct App<B = ApiClient> {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub session: SearchSession,
  /// Sort and page state of the live results.
  pub table: TableView,
  pub comparisons: Comparisons,
  /// Snapshot shown in comparison mode.
  pub selected_comparison: usize,
  pub filter_field: FilterField,
  /// Edit buffer for the selected text field in the filter panel.
  pub field_input: String,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  config: Config,
  backend: Arc<B>,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl<B> App<B> {
  pub fn new(config: Config, backend: B) -> Self {
    let table = TableView::with_page_size(config.entries_per_page());
    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      session: SearchSession::default(),
      table,
      comparisons: Comparisons::default(),
      selected_comparison: 0,
      filter_field: FilterField::MaxResults,
      field_input: String::new(),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      config,
      backend: Arc::new(backend),
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn view_mode(&self) -> ViewMode {
    self.comparisons.mode()
  }

  pub fn export_dir(&self) -> PathBuf {
    self.config.export_dir()
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the dismiss delay.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Search ---

  pub fn check_pending(&mut self) {
    if let Some((ticket, mut rx)) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match self.session.resolve(ticket, result) {
            Resolution::Loaded(count) => {
              self.table.first_page(count);
              if count > 0 {
                self.mode = AppMode::Results;
              }
            }
            Resolution::Failed => {
              let msg = self.session.error().unwrap_or("Search failed.").to_string();
              self.set_error(msg);
            }
            Resolution::Stale => {}
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some((ticket, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.session.abandon(ticket);
          self.set_error("Search task failed.".to_string());
        }
      }
    }
  }

  // --- Comparisons ---

  /// Freeze the current results as a comparison and start a new brand.
  pub fn capture_comparison(&mut self) {
    match self.comparisons.capture(&mut self.session, self.table.page_size()) {
      Ok(index) => {
        let brand = self.comparisons.get(index).map(|e| e.snapshot.brand_name().to_string()).unwrap_or_default();
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
        self.table.first_page(0);
        self.selected_comparison = index;
        self.clear_error();
        self.info_message =
          Some(format!("Saved '{}' for comparison ({} total). Search the next brand.", brand, self.comparisons.len()));
        self.mode = AppMode::Input;
      }
      Err(e) => self.set_error(e.to_string()),
    }
  }

  pub fn remove_selected_comparison(&mut self) {
    if self.comparisons.remove(self.selected_comparison).is_none() {
      return;
    }
    if self.comparisons.is_empty() {
      self.selected_comparison = 0;
      self.mode = if self.session.videos().is_empty() { AppMode::Input } else { AppMode::Results };
    } else {
      self.selected_comparison = self.selected_comparison.min(self.comparisons.len() - 1);
    }
  }

  pub fn cycle_comparison(&mut self, delta: isize) {
    let len = self.comparisons.len();
    if len > 0 {
      self.selected_comparison = (self.selected_comparison as isize + delta).rem_euclid(len as isize) as usize;
    }
  }

  // --- Active table ---

  /// The table under the cursor: the selected snapshot in comparison mode,
  /// otherwise the live results.
  fn active_table(&mut self) -> Option<(&mut TableView, &[Video])> {
    match self.mode {
      AppMode::Comparisons => {
        let entry = self.comparisons.get_mut(self.selected_comparison)?;
        Some((&mut entry.table, entry.snapshot.videos()))
      }
      _ => Some((&mut self.table, self.session.videos())),
    }
  }

  pub fn sort_by(&mut self, field: SortField) {
    if let Some((table, _)) = self.active_table() {
      table.toggle_sort(field);
      table.selected = 0;
    }
  }

  pub fn move_selection(&mut self, delta: isize) {
    if let Some((table, videos)) = self.active_table() {
      let visible = table.page_of(videos).items.len();
      table.move_selection(delta, visible);
    }
  }

  pub fn next_page(&mut self) {
    if let Some((table, videos)) = self.active_table() {
      table.next_page(videos.len());
    }
  }

  pub fn prev_page(&mut self) {
    if let Some((table, videos)) = self.active_table() {
      table.prev_page(videos.len());
    }
  }

  pub fn first_page(&mut self) {
    if let Some((table, videos)) = self.active_table() {
      table.first_page(videos.len());
    }
  }

  pub fn last_page(&mut self) {
    if let Some((table, videos)) = self.active_table() {
      table.last_page(videos.len());
    }
  }

  pub fn cycle_page_size(&mut self) {
    let Some((table, _)) = self.active_table() else { return };
    table.cycle_page_size();
    let page_size = table.page_size();
    if self.mode != AppMode::Comparisons {
      self.config.entries_per_page = Some(page_size);
      self.config.save();
    }
  }

  pub fn selected_video(&mut self) -> Option<Video> {
    let (table, videos) = self.active_table()?;
    let sorted = table.sorted(videos);
    table.selected_video(&sorted).cloned()
  }

  /// Encode the active table in its current order and write it to the export dir.
  pub fn export_active(&mut self, format: ExportFormat) {
    let (videos, params) = match self.mode {
      AppMode::Comparisons => {
        let Some(entry) = self.comparisons.get(self.selected_comparison) else { return };
        (entry.table.sorted(entry.snapshot.videos()), entry.snapshot.search_params().clone())
      }
      _ => {
        let params = self.session.last_submitted().unwrap_or(&self.session.params).clone();
        (self.table.sorted(self.session.videos()), params)
      }
    };
    if videos.is_empty() {
      self.set_error("No results to export.".to_string());
      return;
    }
    let dir = self.export_dir();
    match export::export(&videos, &params, format, Utc::now()).and_then(|e| e.save(&dir)) {
      Ok(path) => {
        info!(brand = %params.brand_name, count = videos.len(), format = format.label(), path = %path.display(), "export written");
        self.info_message = Some(format!("Exported {} results to {}", videos.len(), path.display()));
      }
      Err(e) => {
        warn!(err = %e, "export failed");
        self.set_error(format!("Export failed: {:#}", e));
      }
    }
  }

  // --- Filter panel ---

  /// Rows shown in the filter panel; custom bounds only with a custom range.
  pub fn visible_filter_fields(&self) -> Vec<FilterField> {
    let custom = self.session.params.date_filter.kind() == DateFilterKind::Custom;
    FilterField::ALL
      .into_iter()
      .filter(|f| custom || !matches!(f, FilterField::CustomFrom | FilterField::CustomTo))
      .collect()
  }

  pub fn enter_filters(&mut self) {
    self.mode = AppMode::Filters;
    self.load_field_input();
  }

  pub fn leave_filters(&mut self) {
    self.commit_filter_field();
    self.mode = AppMode::Input;
  }

  /// Commit the current field and move the selection by `delta`, wrapping.
  pub fn select_filter_field(&mut self, delta: isize) {
    self.commit_filter_field();
    let fields = self.visible_filter_fields();
    if let Some(next) = step(&fields, self.filter_field, delta) {
      self.filter_field = next;
    }
    self.load_field_input();
  }

  fn load_field_input(&mut self) {
    let params = &self.session.params;
    let range = params.date_filter.custom_range().unwrap_or((None, None));
    let day = |d: Option<DateTime<Utc>>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    self.field_input = match self.filter_field {
      FilterField::MinViews => params.min_views.to_string(),
      FilterField::CustomFrom => day(range.0),
      FilterField::CustomTo => day(range.1),
      _ => String::new(),
    };
  }

  /// Step an option field through its choices.
  pub fn cycle_filter_option(&mut self, delta: isize) {
    let params = &mut self.session.params;
    match self.filter_field {
      FilterField::MaxResults => {
        if let Some(n) = step(&constants().max_results_options, params.max_results, delta) {
          params.max_results = n;
        }
      }
      FilterField::DateFilter => {
        if let Some(kind) = step(&DateFilterKind::ALL, params.date_filter.kind(), delta) {
          params.set_date_filter_kind(kind);
        }
      }
      FilterField::Country => {
        let codes: Vec<&str> = constants().countries.iter().map(|(code, _)| code.as_str()).collect();
        let current = params.country_code.clone();
        if let Some(code) = step(&codes, current.as_str(), delta) {
          params.country_code = code.to_string();
        }
      }
      FilterField::Keyword => {
        if let Some(k) = step(&KeywordFilter::ALL, params.keyword_filter, delta) {
          params.keyword_filter = k;
        }
      }
      _ => {}
    }
  }

  /// Apply the edit buffer to the selected text field. Invalid input is
  /// reported and the field keeps its previous value.
  pub fn commit_filter_field(&mut self) {
    let text = self.field_input.trim().to_string();
    let params = &mut self.session.params;
    match self.filter_field {
      FilterField::MinViews => match text.parse::<u64>() {
        Ok(n) => params.min_views = n,
        Err(_) if text.is_empty() => params.min_views = 0,
        Err(_) => {
          self.set_error(format!("Min views must be a whole number, got '{}'.", text));
          self.load_field_input();
        }
      },
      FilterField::CustomFrom | FilterField::CustomTo => {
        let end_of_day = self.filter_field == FilterField::CustomTo;
        let parsed = if text.is_empty() { Some(None) } else { parse_day(&text, end_of_day).map(Some) };
        let Some(value) = parsed else {
          self.set_error(format!("Dates use YYYY-MM-DD, got '{}'.", text));
          self.load_field_input();
          return;
        };
        if let DateFilter::Custom { from, to } = &mut params.date_filter {
          if end_of_day {
            *to = value;
          } else {
            *from = value;
          }
        }
      }
      FilterField::ExcludedChannels => {
        if params.add_excluded_channel(&text) {
          self.field_input.clear();
        }
      }
      _ => {}
    }
  }

  /// Backspace on an empty exclusion buffer drops the last excluded channel.
  pub fn pop_excluded_channel(&mut self) -> bool {
    let params = &mut self.session.params;
    match params.excluded_channels.last().cloned() {
      Some(last) => params.remove_excluded_channel(&last),
      None => false,
    }
  }

  pub fn reset_filters(&mut self) {
    self.session.params.reset_filters();
    if !self.visible_filter_fields().contains(&self.filter_field) {
      self.filter_field = FilterField::DateFilter;
    }
    self.load_field_input();
    self.info_message = Some("Filters reset.".to_string());
  }

  /// Display text for a filter row.
  pub fn filter_value(&self, field: FilterField) -> String {
    let params = &self.session.params;
    let range = params.date_filter.custom_range().unwrap_or((None, None));
    let day = |d: Option<DateTime<Utc>>| d.map_or("any".to_string(), |d| d.format("%Y-%m-%d").to_string());
    match field {
      FilterField::MaxResults => params.max_results.to_string(),
      FilterField::MinViews => params.min_views.to_string(),
      FilterField::DateFilter => params.date_filter.kind().label().to_string(),
      FilterField::CustomFrom => day(range.0),
      FilterField::CustomTo => day(range.1),
      FilterField::Country => crate::constants::country_name(&params.country_code).to_string(),
      FilterField::Keyword => params.keyword_filter.label().to_string(),
      FilterField::ExcludedChannels if params.excluded_channels.is_empty() => "none".to_string(),
      FilterField::ExcludedChannels => params.excluded_channels.join(", "),
    }
  }
}

impl<B: SearchBackend> App<B> {
  pub fn trigger_search(&mut self) {
    self.session.params.brand_name = self.input.trim().to_string();
    let Some((ticket, params)) = self.session.submit() else { return };
    self.clear_error();
    self.info_message = ResultLoad::for_max_results(params.max_results).message(params.max_results);
    self.status_message = Some(format!("Searching '{}'…", params.brand_name));

    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(backend.search(params).await);
    });
    // Dropping an older receiver abandons its response.
    self.tasks.search_rx = Some((ticket, rx));
  }
}
