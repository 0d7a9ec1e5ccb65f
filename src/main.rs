mod analytics;
mod api;
mod app;
mod compare;
mod config;
mod constants;
mod duration;
mod export;
mod input;
mod logging;
mod models;
mod paginate;
mod session;
mod sort;
mod table;
mod ui;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use api::ApiClient;
use app::App;
use config::{API_URL_ENV, Config};
use export::ExportFormat;
use models::{DateFilter, DateFilterKind, KeywordFilter, SearchParams};
use session::{Resolution, SearchSession};
use sort::{SortField, SortOrder};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Search YouTube for brand mentions and compare brands", long_about = None)]
struct Args {
  /// Base URL of the brand search service
  #[arg(long, global = true)]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run one search without the TUI and export the results
  Search(SearchArgs),
  /// Print the summary of a JSON export
  Inspect {
    /// Path to a `.json` export
    path: PathBuf,
  },
  /// Print shell completions
  Completions {
    shell: Shell,
  },
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
  /// Brand name; separate variations with commas
  brand: String,

  #[arg(long, default_value_t = constants::constants().default_max_results)]
  max_results: u32,

  #[arg(long, default_value_t = constants::constants().default_min_views)]
  min_views: u64,

  /// Publication window
  #[arg(long, value_enum, default_value = "all_time")]
  date_filter: DateFilterKind,

  /// Custom range start (YYYY-MM-DD), implies --date-filter custom
  #[arg(long)]
  from: Option<String>,

  /// Custom range end (YYYY-MM-DD), implies --date-filter custom
  #[arg(long)]
  to: Option<String>,

  /// Two-letter country code
  #[arg(long, default_value = "")]
  country: String,

  /// Where the brand must appear
  #[arg(long, value_enum, default_value = "any")]
  keyword_filter: KeywordFilter,

  /// Channel to exclude (repeatable)
  #[arg(long = "exclude")]
  excluded_channels: Vec<String>,

  /// Sort column, 1-8 (Title, Channel, Views, Likes, Subscribers, Length, Published, Brand Links)
  #[arg(long)]
  sort: Option<char>,

  /// Sort descending
  #[arg(long)]
  desc: bool,

  #[arg(long, value_enum, default_value = "json")]
  format: ExportFormat,

  /// Directory for the export file (defaults to prefs, then Downloads)
  #[arg(long)]
  out: Option<PathBuf>,
}

impl SearchArgs {
  fn to_params(&self) -> Result<SearchParams> {
    let custom = self.from.is_some() || self.to.is_some() || self.date_filter == DateFilterKind::Custom;
    let date_filter = if custom {
      let day = |text: &Option<String>, end_of_day: bool| -> Result<_> {
        text
          .as_deref()
          .map(|t| app::parse_day(t, end_of_day).with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", t)))
          .transpose()
      };
      DateFilter::Custom { from: day(&self.from, false)?, to: day(&self.to, true)? }
    } else {
      DateFilter::from_kind(self.date_filter)
    };
    let mut params = SearchParams {
      brand_name: self.brand.trim().to_string(),
      max_results: self.max_results,
      min_views: self.min_views,
      date_filter,
      country_code: self.country.trim().to_uppercase(),
      keyword_filter: self.keyword_filter,
      excluded_channels: Vec::new(),
    };
    for channel in &self.excluded_channels {
      params.add_excluded_channel(channel);
    }
    Ok(params)
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let config = Config::load();
  let env_url = std::env::var(API_URL_ENV).ok();
  let api_url = config.resolve_api_url(args.api_url.as_deref(), env_url.as_deref());

  match args.command {
    Some(Command::Search(search)) => {
      logging::init_stderr()?;
      run_search(search, &config, &api_url).await
    }
    Some(Command::Inspect { path }) => inspect(&path),
    Some(Command::Completions { shell }) => {
      clap_complete::generate(shell, &mut Args::command(), "brandscan", &mut std::io::stdout());
      Ok(())
    }
    None => {
      let _guard = logging::init_file()?;
      info!(api_url = %api_url, "starting TUI");
      let client = ApiClient::new(api_url).context("Failed to build HTTP client")?;

      let default_hook = std::panic::take_hook();
      std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        default_hook(info);
      }));

      let mut terminal = ratatui::init();
      let result = run(&mut terminal, App::new(config, client)).await;
      ratatui::restore();
      result
    }
  }
}

async fn run_search(args: SearchArgs, config: &Config, api_url: &str) -> Result<()> {
  let params = args.to_params()?;
  if !params.is_submittable() {
    bail!("Brand name must not be empty");
  }
  if let Some(msg) = models::ResultLoad::for_max_results(params.max_results).message(params.max_results) {
    eprintln!("note: {}", msg);
  }

  let client = ApiClient::new(api_url).context("Failed to build HTTP client")?;
  let mut session = SearchSession::new(params);
  match session.run(&client).await {
    Some(Resolution::Loaded(_)) => {}
    _ => bail!("{}", session.error().unwrap_or("Search failed")),
  }

  let field = match args.sort {
    Some(d) => Some(SortField::from_digit(d).with_context(|| format!("--sort expects a digit 1-8, got '{}'", d))?),
    None => None,
  };
  let order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };
  let videos = sort::sort_videos(session.videos(), field, order);

  let summary = analytics::summarize(&videos);
  println!("{}", serde_json::to_string_pretty(&summary).context("Failed to encode summary")?);
  if videos.is_empty() {
    eprintln!("No videos found matching your criteria.");
    return Ok(());
  }

  let params = session.last_submitted().unwrap_or(&session.params);
  let exported = export::export(&videos, params, args.format, Utc::now())?;
  let dir = args.out.unwrap_or_else(|| config.export_dir());
  let path = exported.save(&dir)?;
  info!(brand = %params.brand_name, count = videos.len(), path = %path.display(), "export written");
  eprintln!("Exported {} results to {}", videos.len(), path.display());
  Ok(())
}

fn inspect(path: &std::path::Path) -> Result<()> {
  let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let doc = export::decode_json(&bytes)?;
  println!("Brand:     {}", doc.search_parameters.brand_name);
  println!("Exported:  {}", doc.export_date.to_rfc3339());
  println!("Published: {}", doc.search_parameters.date_filter.kind().label());
  println!("Results:   {}", doc.total_results);
  println!("{}", serde_json::to_string_pretty(&analytics::summarize(&doc.results)).context("Failed to encode summary")?);
  Ok(())
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key)?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  info!("exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn search_args(extra: &[&str]) -> SearchArgs {
    let mut argv = vec!["brandscan", "search", "Acme"];
    argv.extend_from_slice(extra);
    match Args::try_parse_from(argv).unwrap().command {
      Some(Command::Search(args)) => args,
      other => panic!("expected search, got {:?}", other),
    }
  }

  #[test]
  fn search_defaults_match_form_defaults() {
    let params = search_args(&[]).to_params().unwrap();
    assert_eq!(params, SearchParams::for_brand("Acme"));
  }

  #[test]
  fn search_flags_build_params() {
    let params = search_args(&[
      "--date-filter",
      "past_7_days",
      "--keyword-filter",
      "title-only",
      "--country",
      "de",
      "--exclude",
      "Spam TV",
      "--exclude",
      "Spam TV",
    ])
    .to_params()
    .unwrap();
    assert_eq!(params.date_filter, DateFilter::Past7Days);
    assert_eq!(params.keyword_filter, KeywordFilter::TitleOnly);
    assert_eq!(params.country_code, "DE");
    assert_eq!(params.excluded_channels, vec!["Spam TV".to_string()]);
  }

  #[test]
  fn custom_dates_imply_custom_filter() {
    let params = search_args(&["--from", "2024-01-01"]).to_params().unwrap();
    assert_eq!(params.date_filter.kind(), DateFilterKind::Custom);
    assert!(search_args(&["--to", "01/02/2024"]).to_params().is_err());
  }

  #[test]
  fn unknown_filter_names_are_rejected() {
    assert!(Args::try_parse_from(["brandscan", "search", "Acme", "--date-filter", "yesterday"]).is_err());
    assert!(Args::try_parse_from(["brandscan", "search", "Acme", "--keyword-filter", "title_only"]).is_err());
  }

  #[test]
  fn every_filter_name_parses() {
    for kind in DateFilterKind::ALL {
      let args = search_args(&["--date-filter", kind.as_str()]);
      assert_eq!(args.date_filter, kind);
    }
    for (name, filter) in [
      ("any", KeywordFilter::Any),
      ("title-only", KeywordFilter::TitleOnly),
      ("description-only", KeywordFilter::DescriptionOnly),
      ("title-and-description", KeywordFilter::TitleAndDescription),
    ] {
      assert_eq!(search_args(&["--keyword-filter", name]).keyword_filter, filter);
    }
  }

  #[test]
  fn cli_definition_is_valid() {
    Args::command().debug_assert();
  }
}
