use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Cell, Padding, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::analytics::{Summary, summarize};
use crate::app::{App, AppMode, FilterField};
use crate::compare::ViewMode;
use crate::duration::format_duration;
use crate::models::{ResultLoad, Video};
use crate::paginate::Page;
use crate::session::ResultsState;
use crate::sort::SortField;
use crate::table::TableView;

// --- Palette ---

struct Palette {
  fg: Color,
  muted: Color,
  accent: Color,
  border: Color,
  highlight_fg: Color,
  highlight_bg: Color,
  status: Color,
  error: Color,
  info: Color,
  key_fg: Color,
  key_bg: Color,
}

const PALETTE: Palette = Palette {
  fg: Color::Rgb(220, 220, 220),
  muted: Color::Rgb(130, 130, 140),
  accent: Color::Rgb(255, 92, 92),
  border: Color::Rgb(80, 80, 90),
  highlight_fg: Color::Rgb(20, 20, 20),
  highlight_bg: Color::Rgb(255, 160, 160),
  status: Color::Rgb(240, 200, 100),
  error: Color::Rgb(255, 110, 110),
  info: Color::Rgb(120, 190, 255),
  key_fg: Color::Rgb(20, 20, 20),
  key_bg: Color::Rgb(160, 160, 170),
};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `1234567` -> `1,234,567`.
pub fn group_digits(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

fn rounded_block(title: Line<'_>, focused: bool) -> Block<'_> {
  let border = if focused { PALETTE.accent } else { PALETTE.border };
  Block::bordered()
    .title(title)
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border))
}

// --- UI Rendering ---

pub fn ui<B>(frame: &mut Frame, app: &mut App<B>) {
  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(5),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let mut spans =
    vec![Span::styled(" ◆ brandscan ", Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD))];
  if app.view_mode() == ViewMode::Comparison {
    spans.push(Span::styled(
      format!("comparing {} brand{}", app.comparisons.len(), if app.comparisons.len() == 1 { "" } else { "s" }),
      Style::default().fg(PALETTE.muted),
    ));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(PALETTE.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main<B>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
  let area = if app.mode == AppMode::Filters {
    let [filters_area, rest] = Layout::horizontal([Constraint::Length(46), Constraint::Min(20)]).areas(area);
    render_filters(frame, app, filters_area);
    rest
  } else {
    area
  };

  if app.view_mode() == ViewMode::Single {
    render_session(frame, app, area);
    return;
  }

  let [tabs_area, body] = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);
  render_tabs(frame, app, tabs_area);
  if app.mode == AppMode::Comparisons {
    render_snapshot(frame, app, body);
  } else {
    render_session(frame, app, body);
  }
}

fn render_tabs<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let mut titles = vec![Line::from(" Current ")];
  titles.extend(
    app.comparisons.entries().iter().map(|e| Line::from(format!(" {} ", truncate_str(e.snapshot.brand_name(), 18)))),
  );
  let selected = if app.mode == AppMode::Comparisons { app.selected_comparison + 1 } else { 0 };
  let tabs = Tabs::new(titles)
    .select(selected)
    .style(Style::default().fg(PALETTE.muted))
    .highlight_style(Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD))
    .divider("│");
  frame.render_widget(tabs, area);
}

fn render_session<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let focused = app.mode == AppMode::Results;
  match app.session.results_state() {
    ResultsState::NotSearched => render_welcome(frame, app, area),
    ResultsState::Loading => {
      let brand = app.session.last_submitted().map(|p| p.brand_name.as_str()).unwrap_or_default();
      render_message(frame, area, " Results ", &format!("Searching YouTube for '{}'…", brand), PALETTE.status);
    }
    ResultsState::Failed => {
      let msg = app.session.error().unwrap_or("Search failed.");
      render_message(frame, area, " Results ", msg, PALETTE.error);
    }
    ResultsState::Empty => render_message(
      frame,
      area,
      " Results ",
      "No videos found matching your criteria. Try adjusting your filters.",
      PALETTE.muted,
    ),
    ResultsState::Ready => {
      let videos = app.session.videos();
      let brand = app.session.last_submitted().map(|p| p.brand_name.as_str()).unwrap_or_default();
      let title = format!(" {} ", brand);
      render_table(frame, area, &title, &app.table, videos, &summarize(videos), focused);
    }
  }
}

fn render_snapshot<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let Some(entry) = app.comparisons.get(app.selected_comparison) else { return };
  let params = entry.snapshot.search_params();
  let title = format!(
    " {} · {} · min {} views ",
    entry.snapshot.brand_name(),
    params.date_filter.kind().label(),
    group_digits(params.min_views)
  );
  render_table(frame, area, &title, &entry.table, entry.snapshot.videos(), &entry.summary, true);
}

fn render_welcome<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let mut text = vec![
    Line::from(""),
    Line::from(Span::styled(
      "◆  YouTube brand search",
      Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD),
    )),
    Line::from(""),
    Line::from(Span::styled("Find videos that mention a brand, then compare brands side by side.", Style::default().fg(PALETTE.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a brand name below and press Enter. Tab edits filters.", Style::default().fg(PALETTE.muted))),
  ];
  let active = app.session.params.active_filter_count();
  if active > 0 {
    text.push(Line::from(Span::styled(
      format!("{} filter{} active", active, if active == 1 { "" } else { "s" }),
      Style::default().fg(PALETTE.info),
    )));
  }
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(PALETTE.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, msg: &str, color: Color) {
  let paragraph = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(msg, Style::default().fg(color)))])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(rounded_block(Line::from(title), false).padding(Padding::horizontal(1)));
  frame.render_widget(paragraph, area);
}

fn header_cell(field: SortField, digit: usize, table: &TableView) -> Cell<'static> {
  let arrow = if table.sort_field == Some(field) { table.sort_order.arrow() } else { "" };
  let style = if table.sort_field == Some(field) {
    Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(PALETTE.muted)
  };
  Cell::from(format!("{}{} {}", digit, arrow, field.label())).style(style)
}

fn video_row(index: usize, video: &Video) -> Row<'static> {
  let links = if video.has_brand_links() { video.brand_links.len().to_string() } else { "-".to_string() };
  Row::new(vec![
    Cell::from(index.to_string()).style(Style::default().fg(PALETTE.muted)),
    Cell::from(video.title.clone()),
    Cell::from(video.channel_title.clone()),
    Cell::from(group_digits(video.views())),
    Cell::from(group_digits(video.likes())),
    Cell::from(group_digits(video.subscribers())),
    Cell::from(format_duration(&video.duration)),
    Cell::from(video.publish_time.format("%Y-%m-%d").to_string()),
    Cell::from(links),
  ])
  .style(Style::default().fg(PALETTE.fg))
}

fn summary_line(summary: &Summary) -> Line<'static> {
  let coverage = summary.link_coverage_percent.map_or("n/a".to_string(), |p| format!("{}%", p));
  let label = Style::default().fg(PALETTE.muted);
  let value = Style::default().fg(PALETTE.fg).add_modifier(Modifier::BOLD);
  Line::from(vec![
    Span::styled(" Videos ", label),
    Span::styled(summary.video_count.to_string(), value),
    Span::styled("  Views ", label),
    Span::styled(group_digits(summary.total_views), value),
    Span::styled("  Likes ", label),
    Span::styled(group_digits(summary.total_likes), value),
    Span::styled("  Engagement ", label),
    Span::styled(format!("{:.2}%", summary.engagement_rate), value),
    Span::styled("  With links ", label),
    Span::styled(format!("{} ({})", summary.videos_with_links, coverage), value),
  ])
}

fn pagination_line(table: &TableView, page: &Page<'_, Video>) -> Line<'static> {
  let total = page.total_items;
  let showing = match page.showing() {
    Some((from, to)) => format!(" Showing {} to {} of {} entries ", from, to, total),
    None => format!(" Showing 0 of {} entries ", total),
  };
  let mut spans = vec![Span::styled(showing, Style::default().fg(PALETTE.muted))];
  spans.push(Span::styled(" ‹ ", Style::default().fg(PALETTE.muted)));
  for page in table.page_window(total) {
    let style = if page == table.page() {
      Style::default().fg(PALETTE.highlight_fg).bg(PALETTE.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(PALETTE.fg)
    };
    spans.push(Span::styled(format!(" {} ", page), style));
  }
  spans.push(Span::styled(" › ", Style::default().fg(PALETTE.muted)));
  spans.push(Span::styled(
    format!(" page {}/{} · {} per page", table.page(), page.total_pages, table.page_size()),
    Style::default().fg(PALETTE.muted),
  ));
  Line::from(spans)
}

fn render_table(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  table: &TableView,
  videos: &[Video],
  summary: &Summary,
  focused: bool,
) {
  let block = rounded_block(
    Line::from(Span::styled(title.to_string(), Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD))),
    focused,
  );
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [summary_area, table_area, pages_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)]).areas(inner);
  frame.render_widget(summary_line(summary), summary_area);

  let sorted = table.sorted(videos);
  let page = table.page_of(&sorted);
  let rows: Vec<Row> = page.items.iter().enumerate().map(|(i, v)| video_row(page.start_index + i + 1, v)).collect();
  let mut header = vec![Cell::from("#").style(Style::default().fg(PALETTE.muted))];
  header.extend(SortField::ALL.iter().enumerate().map(|(i, f)| header_cell(*f, i + 1, table)));

  let widths = [
    Constraint::Length(4),
    Constraint::Fill(3),
    Constraint::Fill(2),
    Constraint::Length(12),
    Constraint::Length(10),
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(13),
    Constraint::Length(14),
  ];
  let widget = Table::new(rows, widths)
    .header(Row::new(header))
    .column_spacing(1)
    .highlight_symbol("▶ ")
    .row_highlight_style(
      Style::default().fg(PALETTE.highlight_fg).bg(PALETTE.highlight_bg).add_modifier(Modifier::BOLD),
    );
  let mut state = TableState::default();
  if focused && !page.items.is_empty() {
    state.select(Some(table.selected.min(page.items.len() - 1)));
  }
  frame.render_stateful_widget(widget, table_area, &mut state);
  frame.render_widget(pagination_line(table, &page), pages_area);
}

fn render_filters<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let params = &app.session.params;
  let active = params.active_filter_count();
  let title = if active == 0 { " Filters ".to_string() } else { format!(" Filters · {} active ", active) };
  let block = rounded_block(Line::from(title), true).padding(Padding::horizontal(1));

  let mut lines = Vec::new();
  for field in app.visible_filter_fields() {
    let selected = field == app.filter_field;
    let label_style = if selected {
      Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(PALETTE.muted)
    };
    let value = if selected && field.is_text() {
      format!("{}▏", app.field_input)
    } else if selected {
      format!("‹ {} ›", app.filter_value(field))
    } else {
      app.filter_value(field)
    };
    lines.push(Line::from(vec![
      Span::styled(format!("{:<12}", field.label()), label_style),
      Span::styled(truncate_str(&value, area.width.saturating_sub(16) as usize), Style::default().fg(PALETTE.fg)),
    ]));
    if selected && field == FilterField::ExcludedChannels && !params.excluded_channels.is_empty() {
      lines.push(Line::from(Span::styled(
        format!("{:<12}{}", "", params.excluded_channels.join(", ")),
        Style::default().fg(PALETTE.muted),
      )));
    }
  }

  lines.push(Line::from(""));
  if let Some(advisory) = params.keyword_filter.advisory() {
    lines.push(Line::from(Span::styled(advisory, Style::default().fg(PALETTE.info))));
  }
  if let Some(msg) = ResultLoad::for_max_results(params.max_results).message(params.max_results) {
    lines.push(Line::from(Span::styled(msg, Style::default().fg(PALETTE.status))));
  }

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn render_status<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(PALETTE.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(PALETTE.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(PALETTE.info))
  } else {
    (" Ready".to_string(), Style::default().fg(PALETTE.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input<B>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
  let focused = app.mode == AppMode::Input;
  let border_color = if focused { PALETTE.accent } else { PALETTE.border };
  let active = app.session.params.active_filter_count();
  let title = if active == 0 { " Brand Name ".to_string() } else { format!(" Brand Name · {} filters ", active) };
  let input_block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(PALETTE.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
  let has_results = !app.session.videos().is_empty();
  let comparing = app.view_mode() == ViewMode::Comparison;
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("Tab", "Filters")];
      if has_results || comparing {
        k.push(("↓", "Results"));
      }
      k.push(("Esc", if has_results || comparing { "Results" } else { "Quit" }));
      k
    }
    AppMode::Filters => {
      vec![("↑/↓", "Field"), ("←/→", "Change"), ("Enter", "Apply"), ("^r", "Reset"), ("Tab", "Done")]
    }
    AppMode::Results => {
      let mut k = vec![("j/k", "Row"), ("n/p", "Page"), ("1-8", "Sort"), ("+", "Per page"), ("o", "Open")];
      k.push(("c", "Compare"));
      k.push(("e/v/x", "JSON/CSV/XLS"));
      if comparing {
        k.push(("Tab", "Compared"));
      }
      k.push(("Esc", "Search"));
      k
    }
    AppMode::Comparisons => vec![
      ("[/]", "Brand"),
      ("j/k", "Row"),
      ("n/p", "Page"),
      ("1-8", "Sort"),
      ("d", "Remove"),
      ("e/v/x", "Export"),
      ("Tab", "Current"),
      ("Esc", "Search"),
    ],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(PALETTE.key_fg).bg(PALETTE.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(PALETTE.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);
}
