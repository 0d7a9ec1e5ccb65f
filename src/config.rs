use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::constants;

pub const API_URL_ENV: &str = "BRANDSCAN_API_URL";

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "brandscan")
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub api_url: Option<String>,
  pub entries_per_page: Option<usize>,
  pub export_dir: Option<PathBuf>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Search service base URL: `--api-url` flag, then the environment, then
  /// prefs, then the built-in default.
  pub fn resolve_api_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
    [flag, env, self.api_url.as_deref()]
      .into_iter()
      .flatten()
      .map(str::trim)
      .find(|url| !url.is_empty())
      .unwrap_or(constants().default_api_url.as_str())
      .to_string()
  }

  /// Saved page size, ignored unless it is one of the offered options.
  pub fn entries_per_page(&self) -> usize {
    self
      .entries_per_page
      .filter(|n| constants().entries_per_page_options.contains(n))
      .unwrap_or(constants().default_entries_per_page)
  }

  /// Where exports are written: prefs, then the user's download dir, then the working directory.
  pub fn export_dir(&self) -> PathBuf {
    self
      .export_dir
      .clone()
      .or_else(|| directories::UserDirs::new().and_then(|d| d.download_dir().map(|p| p.to_path_buf())))
      .unwrap_or_else(|| PathBuf::from("."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- resolve_api_url ---

  #[test]
  fn flag_wins_over_everything() {
    let config = Config { api_url: Some("http://prefs:1".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_url(Some("http://flag:1"), Some("http://env:1")), "http://flag:1");
  }

  #[test]
  fn env_then_prefs_then_default() {
    let config = Config { api_url: Some("http://prefs:1".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_url(None, Some("http://env:1")), "http://env:1");
    assert_eq!(config.resolve_api_url(None, None), "http://prefs:1");
    assert_eq!(Config::default().resolve_api_url(None, None), constants().default_api_url);
  }

  #[test]
  fn blank_sources_are_skipped() {
    let config = Config { api_url: Some("  ".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_url(Some(""), None), constants().default_api_url);
  }

  // --- entries_per_page ---

  #[test]
  fn entries_per_page_must_be_an_option() {
    assert_eq!(Config { entries_per_page: Some(25), ..Config::default() }.entries_per_page(), 25);
    assert_eq!(
      Config { entries_per_page: Some(7), ..Config::default() }.entries_per_page(),
      constants().default_entries_per_page
    );
  }

  #[test]
  fn prefs_toml_shape() {
    let config: Config = toml::from_str("api_url = \"http://x\"\nentries_per_page = 50\n").unwrap();
    assert_eq!(config.api_url.as_deref(), Some("http://x"));
    assert_eq!(config.entries_per_page, Some(50));
    assert!(config.export_dir.is_none());
  }
}
