//! Result-set export to JSON, CSV and a spreadsheet-friendly CSV (`.xls`).
//!
//! Every encoder is a pure function of `(videos, params, now)`; writing the
//! bytes to disk is a separate step.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::duration::format_duration;
use crate::models::{SearchParams, Video};

const COLUMNS: [&str; 10] = [
  "Title",
  "Channel",
  "Views",
  "Likes",
  "Subscribers",
  "Duration",
  "Published Date",
  "Video Link",
  "Channel Link",
  "Brand Links",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
  Json,
  Csv,
  /// CSV laid out for spreadsheet apps, saved with an `.xls` extension.
  #[value(name = "xls")]
  Spreadsheet,
}

impl ExportFormat {
  pub fn extension(self) -> &'static str {
    match self {
      ExportFormat::Json => "json",
      ExportFormat::Csv => "csv",
      ExportFormat::Spreadsheet => "xls",
    }
  }

  pub fn mime(self) -> &'static str {
    match self {
      ExportFormat::Json => "application/json",
      ExportFormat::Csv => "text/csv",
      ExportFormat::Spreadsheet => "application/vnd.ms-excel",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ExportFormat::Json => "JSON",
      ExportFormat::Csv => "CSV",
      ExportFormat::Spreadsheet => "Excel",
    }
  }
}

/// Encoded export plus the suggested file name.
#[derive(Debug, Clone)]
pub struct Export {
  pub filename: String,
  pub mime: &'static str,
  pub bytes: Vec<u8>,
}

impl Export {
  /// Write into `dir` under the suggested name, adding `-2`, `-3`, ... when
  /// a file with that name already exists.
  pub fn save(&self, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = unique_path(dir, &self.filename);
    std::fs::write(&path, &self.bytes).with_context(|| format!("Failed to write export {}", path.display()))?;
    Ok(path)
  }
}

fn unique_path(dir: &Path, filename: &str) -> PathBuf {
  let candidate = dir.join(filename);
  if !candidate.exists() {
    return candidate;
  }
  let (stem, ext) = filename.rsplit_once('.').unwrap_or((filename, ""));
  (2..)
    .map(|n| if ext.is_empty() { dir.join(format!("{}-{}", stem, n)) } else { dir.join(format!("{}-{}.{}", stem, n, ext)) })
    .find(|p| !p.exists())
    .unwrap_or(candidate)
}

/// Decoded form of a JSON export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
  pub search_parameters: SearchParams,
  pub results: Vec<Video>,
  pub total_results: usize,
  pub export_date: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
  search_parameters: &'a SearchParams,
  results: &'a [Video],
  total_results: usize,
  export_date: DateTime<Utc>,
}

/// Encode `videos` (in the order given) together with the query that produced them.
pub fn export(videos: &[Video], params: &SearchParams, format: ExportFormat, now: DateTime<Utc>) -> Result<Export> {
  let bytes = match format {
    ExportFormat::Json => to_json(videos, params, now)?,
    ExportFormat::Csv => to_table(videos, params, now, false)?,
    ExportFormat::Spreadsheet => to_table(videos, params, now, true)?,
  };
  Ok(Export { filename: export_filename(format, now), mime: format.mime(), bytes })
}

pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
  format!("youtube-search-{}.{}", now.format("%Y-%m-%d"), format.extension())
}

pub fn decode_json(bytes: &[u8]) -> Result<ExportDocument> {
  serde_json::from_slice(bytes).context("Export is not a valid JSON search export")
}

fn to_json(videos: &[Video], params: &SearchParams, now: DateTime<Utc>) -> Result<Vec<u8>> {
  let doc = JsonExport { search_parameters: params, results: videos, total_results: videos.len(), export_date: now };
  serde_json::to_vec_pretty(&doc).context("Failed to encode JSON export")
}

fn to_table(videos: &[Video], params: &SearchParams, now: DateTime<Utc>, spreadsheet: bool) -> Result<Vec<u8>> {
  let metadata = [
    "YouTube Search Results".to_string(),
    format!("Search query: {}", params.brand_name),
    format!("Min views: {}", params.min_views),
    format!("Date filter: {}", params.date_filter.kind().as_str()),
    format!("Export date: {}", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
  ];
  let link_separator = if spreadsheet { ", " } else { "\n" };

  let mut out = Vec::new();
  if !spreadsheet {
    for line in &metadata {
      writeln!(out, "# {}", single_line(line))?;
    }
    writeln!(out, "# ")?;
  }

  {
    let mut writer = csv::WriterBuilder::new()
      .flexible(true)
      .quote_style(csv::QuoteStyle::NonNumeric)
      .terminator(csv::Terminator::Any(b'\n'))
      .from_writer(&mut out);

    if spreadsheet {
      // Metadata rows padded to the column count so spreadsheet apps keep the grid.
      let padding = vec![""; COLUMNS.len() - 1];
      for line in &metadata {
        writer.write_record(std::iter::once(line.as_str()).chain(padding.iter().copied()))?;
      }
      writer.write_record(std::iter::once("").chain(padding.iter().copied()))?;
    }

    writer.write_record(COLUMNS)?;
    for video in videos {
      writer.write_record([
        video.title.clone(),
        video.channel_title.clone(),
        video.view_count.clone(),
        video.like_count.clone(),
        video.subscriber_count.clone(),
        format_duration(&video.duration),
        video.publish_time.format("%Y-%m-%d").to_string(),
        video.url(),
        video.channel_url(),
        video.brand_links.join(link_separator),
      ])?;
    }
    writer.flush().context("Failed to flush CSV export")?;
  }
  Ok(out)
}

/// Comment lines cannot span rows.
fn single_line(s: &str) -> String {
  s.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::fixtures::video;
  use crate::models::{DateFilter, KeywordFilter};
  use chrono::TimeZone;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
  }

  fn sample() -> (Vec<Video>, SearchParams) {
    let mut tricky = video("q1", "He said \"hi\", then left\nok", "1500");
    tricky.channel_title = "Comma, Inc".to_string();
    tricky.like_count = "20".to_string();
    tricky.duration = "PT1H2M3S".to_string();
    tricky.brand_links = vec!["https://acme.test/a".to_string(), "https://acme.test/b".to_string()];
    let plain = video("p2", "Plain", "abc");
    let mut params = SearchParams::for_brand("Acme");
    params.min_views = 500;
    params.date_filter = DateFilter::Past30Days;
    params.keyword_filter = KeywordFilter::TitleOnly;
    (vec![tricky, plain], params)
  }

  // --- JSON ---

  #[test]
  fn json_round_trip_preserves_params_and_order() {
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Json, now()).unwrap();
    assert_eq!(export.filename, "youtube-search-2024-06-15.json");
    assert_eq!(export.mime, "application/json");
    let doc = decode_json(&export.bytes).unwrap();
    assert_eq!(doc.search_parameters, params);
    assert_eq!(doc.results, videos);
    assert_eq!(doc.total_results, 2);
    assert_eq!(doc.export_date, now());
  }

  #[test]
  fn json_round_trip_keeps_relevancy_bits() {
    let params = SearchParams::for_brand("Acme");
    for score in [0.9856906946328695, 0.21291890726713458, 0.9259338926496359, 0.44166130716816643, 1e-300, 0.1 + 0.2] {
      let mut v = video("r", "Relevant", "10");
      v.relevancy_score = score;
      let export = export(std::slice::from_ref(&v), &params, ExportFormat::Json, now()).unwrap();
      let doc = decode_json(&export.bytes).unwrap();
      assert_eq!(doc.results[0].relevancy_score.to_bits(), score.to_bits(), "score {}", score);
      assert_eq!(doc.results, vec![v]);
    }
  }

  #[test]
  fn json_is_pretty_printed() {
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Json, now()).unwrap();
    let text = String::from_utf8(export.bytes).unwrap();
    assert!(text.starts_with("{\n  \"searchParameters\""));
    assert!(text.contains("\"totalResults\": 2"));
  }

  #[test]
  fn decode_rejects_garbage() {
    assert!(decode_json(b"not json").is_err());
  }

  // --- CSV ---

  #[test]
  fn csv_has_commented_preamble() {
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Csv, now()).unwrap();
    assert_eq!(export.filename, "youtube-search-2024-06-15.csv");
    let text = String::from_utf8(export.bytes).unwrap();
    let lines: Vec<&str> = text.lines().take(7).collect();
    assert_eq!(lines[0], "# YouTube Search Results");
    assert_eq!(lines[1], "# Search query: Acme");
    assert_eq!(lines[2], "# Min views: 500");
    assert_eq!(lines[3], "# Date filter: past_30_days");
    assert_eq!(lines[4], "# Export date: 2024-06-15T09:30:00Z");
    assert_eq!(lines[5], "# ");
    assert!(lines[6].starts_with("\"Title\",\"Channel\",\"Views\""));
  }

  #[test]
  fn csv_rows_parse_back_with_escaping_intact() {
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Csv, now()).unwrap();
    let mut reader = csv::ReaderBuilder::new().comment(Some(b'#')).from_reader(export.bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS.to_vec());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "He said \"hi\", then left\nok");
    assert_eq!(&rows[0][1], "Comma, Inc");
    assert_eq!(&rows[0][2], "1500");
    assert_eq!(&rows[0][5], "1:02:03");
    assert_eq!(&rows[0][6], "2024-03-01");
    assert_eq!(&rows[0][7], "https://www.youtube.com/watch?v=q1");
    assert_eq!(&rows[0][9], "https://acme.test/a\nhttps://acme.test/b");
    assert_eq!(&rows[1][2], "abc");
    assert_eq!(&rows[1][9], "");
  }

  #[test]
  fn csv_quotes_text_but_not_counts() {
    let (videos, params) = sample();
    let export = export(&videos[1..], &params, ExportFormat::Csv, now()).unwrap();
    let text = String::from_utf8(export.bytes).unwrap();
    let row = text.lines().last().unwrap();
    assert!(row.starts_with("\"Plain\",\"Plain channel\",\"abc\",0,0,\"1:00\",\"2024-03-01\""));
  }

  // --- Spreadsheet ---

  #[test]
  fn spreadsheet_pads_metadata_and_joins_links_with_commas() {
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Spreadsheet, now()).unwrap();
    assert_eq!(export.filename, "youtube-search-2024-06-15.xls");
    assert_eq!(export.mime, "application/vnd.ms-excel");
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(export.bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(&rows[0][0], "YouTube Search Results");
    assert!(rows.iter().take(6).all(|r| r.len() == COLUMNS.len()));
    assert_eq!(&rows[1][0], "Search query: Acme");
    assert_eq!(&rows[6][0], "Title");
    assert_eq!(&rows[7][9], "https://acme.test/a, https://acme.test/b");
  }

  #[test]
  fn empty_result_set_still_has_header() {
    let params = SearchParams::for_brand("Nobody");
    let export = export(&[], &params, ExportFormat::Csv, now()).unwrap();
    let text = String::from_utf8(export.bytes).unwrap();
    assert!(text.lines().last().unwrap().starts_with("\"Title\""));
  }

  // --- save ---

  #[test]
  fn save_does_not_overwrite() {
    let dir = std::env::temp_dir().join(format!("brandscan-export-test-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let (videos, params) = sample();
    let export = export(&videos, &params, ExportFormat::Csv, now()).unwrap();
    let first = export.save(&dir).unwrap();
    let second = export.save(&dir).unwrap();
    assert_eq!(first.file_name().unwrap(), "youtube-search-2024-06-15.csv");
    assert_eq!(second.file_name().unwrap(), "youtube-search-2024-06-15-2.csv");
    assert_eq!(std::fs::read(&second).unwrap(), export.bytes);
    let _ = std::fs::remove_dir_all(&dir);
  }
}
