use crate::constants::constants;
use crate::models::Video;
use crate::paginate::{self, Page};
use crate::sort::{SortField, SortOrder, sort_videos};

/// Sort and page state for one results table.
///
/// The live session and every comparison snapshot own one each, so sorting
/// or paging one table never moves another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
  pub sort_field: Option<SortField>,
  pub sort_order: SortOrder,
  page: usize,
  page_size: usize,
  /// Row highlighted within the visible page.
  pub selected: usize,
}

impl Default for TableView {
  fn default() -> Self {
    Self::with_page_size(constants().default_entries_per_page)
  }
}

impl TableView {
  pub fn with_page_size(page_size: usize) -> Self {
    Self { sort_field: None, sort_order: SortOrder::Asc, page: 1, page_size: page_size.max(1), selected: 0 }
  }

  pub fn page(&self) -> usize {
    self.page
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Clicking a column: the active column flips direction, a new column starts ascending.
  pub fn toggle_sort(&mut self, field: SortField) {
    if self.sort_field == Some(field) {
      self.sort_order = self.sort_order.toggled();
    } else {
      self.sort_field = Some(field);
      self.sort_order = SortOrder::Asc;
    }
  }

  /// Changing the page size invalidates offsets, so the view returns to page 1.
  pub fn set_page_size(&mut self, page_size: usize) {
    self.page_size = page_size.max(1);
    self.page = 1;
    self.selected = 0;
  }

  /// Step to the next entry in the entries-per-page options, wrapping around.
  pub fn cycle_page_size(&mut self) {
    let options = &constants().entries_per_page_options;
    let next = options.iter().position(|&n| n == self.page_size).map_or(0, |i| (i + 1) % options.len());
    self.set_page_size(options.get(next).copied().unwrap_or(self.page_size));
  }

  /// Jump to `page`, clamped to `[1, total_pages]` for `len` rows.
  pub fn go_to(&mut self, page: usize, len: usize) {
    let total = paginate::total_pages(len, self.page_size);
    self.page = page.clamp(1, total);
    self.selected = 0;
  }

  pub fn first_page(&mut self, len: usize) {
    self.go_to(1, len);
  }

  pub fn prev_page(&mut self, len: usize) {
    self.go_to(self.page.saturating_sub(1), len);
  }

  pub fn next_page(&mut self, len: usize) {
    self.go_to(self.page + 1, len);
  }

  pub fn last_page(&mut self, len: usize) {
    self.go_to(paginate::total_pages(len, self.page_size), len);
  }

  /// Move the row highlight by `delta`, wrapping within the visible page.
  pub fn move_selection(&mut self, delta: isize, visible_rows: usize) {
    if visible_rows == 0 {
      self.selected = 0;
      return;
    }
    let current = self.selected.min(visible_rows - 1) as isize;
    self.selected = (current + delta).rem_euclid(visible_rows as isize) as usize;
  }

  /// `videos` in this table's sort order.
  pub fn sorted(&self, videos: &[Video]) -> Vec<Video> {
    sort_videos(videos, self.sort_field, self.sort_order)
  }

  /// The visible page of an already sorted list.
  pub fn page_of<'a>(&self, sorted: &'a [Video]) -> Page<'a, Video> {
    paginate::paginate(sorted, self.page_size, self.page)
  }

  pub fn page_window(&self, len: usize) -> Vec<usize> {
    paginate::page_window(self.page, paginate::total_pages(len, self.page_size))
  }

  /// The highlighted video on the visible page, if any.
  pub fn selected_video<'a>(&self, sorted: &'a [Video]) -> Option<&'a Video> {
    self.page_of(sorted).items.get(self.selected)
  }
}
