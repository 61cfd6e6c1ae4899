use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration from `prefs.toml` in the platform config dir.
/// The `YOUTUBE_API_KEY` environment variable overrides the file.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
  pub api_key: Option<String>,
  /// Region code for the home trending chart (defaults to "US").
  pub region: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    let mut config = Self::from_file().unwrap_or_default();
    if let Ok(key) = std::env::var("YOUTUBE_API_KEY")
      && !key.trim().is_empty()
    {
      config.api_key = Some(key.trim().to_string());
    }
    config
  }

  fn from_file() -> Option<Self> {
    let content = std::fs::read_to_string(Self::config_file()?).ok()?;
    toml::from_str(&content).ok()
  }

  /// Path of the config file, for display in the settings view.
  pub fn config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tubeview").map(|p| p.config_dir().join("prefs.toml"))
  }

  pub fn region(&self) -> &str {
    self.region.as_deref().unwrap_or("US")
  }
}
