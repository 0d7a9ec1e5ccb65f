use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::api::SearchBackend;
use crate::app::{App, AppMode, FilterField};
use crate::export::ExportFormat;
use crate::sort::SortField;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Open `url` with the platform's default handler.
fn open_url(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

fn open_selected<B: SearchBackend>(app: &mut App<B>) {
  let Some(video) = app.selected_video() else { return };
  if let Err(e) = open_url(&video.url()) {
    app.set_error(format!("Failed to open browser: {}", e));
  }
}

// --- Event Handling ---

pub fn handle_key_event<B: SearchBackend>(app: &mut App<B>, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
    open_selected(app);
    return Ok(());
  }

  // Ctrl+R resets filters from any mode.
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
    app.reset_filters();
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Filters => handle_filters_key(app, key),
    AppMode::Results | AppMode::Comparisons => handle_table_key(app, key),
  }
  Ok(())
}

fn handle_input_key<B: SearchBackend>(app: &mut App<B>, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Tab => {
      app.enter_filters();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.session.videos().is_empty() {
        app.mode = AppMode::Results;
      } else if !app.comparisons.is_empty() {
        app.mode = AppMode::Comparisons;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.session.videos().is_empty() {
        app.mode = AppMode::Results;
      } else if !app.comparisons.is_empty() {
        app.mode = AppMode::Comparisons;
      }
    }
    _ => {}
  }
}

fn handle_filters_key<B: SearchBackend>(app: &mut App<B>, key: event::KeyEvent) {
  app.clear_error();
  let text_field = app.filter_field.is_text();
  match key.code {
    KeyCode::Esc | KeyCode::Tab => {
      app.leave_filters();
    }
    KeyCode::Up => app.select_filter_field(-1),
    KeyCode::Down => app.select_filter_field(1),
    KeyCode::Left if !text_field => app.cycle_filter_option(-1),
    KeyCode::Right if !text_field => app.cycle_filter_option(1),
    KeyCode::Enter => {
      if text_field {
        app.commit_filter_field();
      } else {
        app.leave_filters();
        app.trigger_search();
      }
    }
    KeyCode::Char(c) if text_field => {
      app.field_input.push(c);
    }
    KeyCode::Backspace if text_field => {
      if app.field_input.pop().is_none() && app.filter_field == FilterField::ExcludedChannels {
        app.pop_excluded_channel();
      }
    }
    _ => {}
  }
}

fn handle_table_key<B: SearchBackend>(app: &mut App<B>, key: event::KeyEvent) {
  let comparing = app.mode == AppMode::Comparisons;
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
    KeyCode::Right | KeyCode::Char('n') => app.next_page(),
    KeyCode::Left | KeyCode::Char('p') => app.prev_page(),
    KeyCode::Char('g') => app.first_page(),
    KeyCode::Char('G') => app.last_page(),
    KeyCode::Char('+') => app.cycle_page_size(),
    KeyCode::Char(d @ '1'..='8') => {
      if let Some(field) = SortField::from_digit(d) {
        app.sort_by(field);
      }
    }
    KeyCode::Enter | KeyCode::Char('o') => open_selected(app),
    KeyCode::Char('e') => app.export_active(ExportFormat::Json),
    KeyCode::Char('v') => app.export_active(ExportFormat::Csv),
    KeyCode::Char('x') => app.export_active(ExportFormat::Spreadsheet),
    KeyCode::Char('c') if !comparing => app.capture_comparison(),
    KeyCode::Char('d') if comparing => app.remove_selected_comparison(),
    KeyCode::Char(']') if comparing => app.cycle_comparison(1),
    KeyCode::Char('[') if comparing => app.cycle_comparison(-1),
    KeyCode::Tab => {
      if comparing {
        app.mode = AppMode::Results;
      } else if !app.comparisons.is_empty() {
        app.mode = AppMode::Comparisons;
      }
    }
    KeyCode::Esc | KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}
