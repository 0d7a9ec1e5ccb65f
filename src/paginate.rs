//! Fixed-size page slicing over an already ordered list.
//!
//! Page numbers are 1-based. The paginator never clamps: a page past the end
//! is an empty page, not an error. Keeping the page number in range is the
//! caller's job (see `table::TableView`).

use crate::constants::constants;

/// One page of `items` plus the metadata pagination controls need.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
  pub items: &'a [T],
  pub total_pages: usize,
  /// Offset of the first slot of this page (may be past the end).
  pub start_index: usize,
  /// One past the last slot of this page, before clipping to the list length.
  pub end_index: usize,
  pub total_items: usize,
}

impl<T> Page<'_, T> {
  /// 1-based inclusive range for "Showing X to Y of Z"; `None` when the page is empty.
  pub fn showing(&self) -> Option<(usize, usize)> {
    if self.items.is_empty() { None } else { Some((self.start_index + 1, self.start_index + self.items.len())) }
  }
}

/// Number of pages for `len` items; at least 1 so an empty list still has a page.
pub fn total_pages(len: usize, page_size: usize) -> usize {
  if page_size == 0 { 1 } else { len.div_ceil(page_size).max(1) }
}

/// Slice page `page_number` of size `page_size` out of `items`.
pub fn paginate<T>(items: &[T], page_size: usize, page_number: usize) -> Page<'_, T> {
  let start_index = page_number.saturating_sub(1).saturating_mul(page_size);
  let end_index = start_index.saturating_add(page_size);
  let page_items = if page_number == 0 || start_index >= items.len() {
    &items[..0]
  } else {
    &items[start_index..end_index.min(items.len())]
  };
  Page { items: page_items, total_pages: total_pages(items.len(), page_size), start_index, end_index, total_items: items.len() }
}

/// Up to `page_window` consecutive page numbers starting two before `current`,
/// clipped to `[1, total_pages]`.
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
  let start = current.saturating_sub(2).max(1);
  let end = total_pages.min(start + constants().page_window - 1);
  (start..=end).collect()
}
