use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::aggregate::DEFAULT_LIMIT;

/// Dataset read when neither `--data` nor the config names one.
pub const DEFAULT_DATA_PATH: &str = "spotify_cleaned.csv";

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset path (overridden by `--data`).
    pub data_path: Option<PathBuf>,
    /// Rows kept in each summary table.
    pub top_n: usize,
    /// Where `dashboard` writes its files.
    pub output_dir: PathBuf,
    /// Dark chart background; `false` leaves charts transparent.
    pub dark_background: bool,
    /// Treat unparseable stream counts as missing instead of failing.
    pub lenient_streams: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            top_n: DEFAULT_LIMIT,
            output_dir: PathBuf::from("dashboard"),
            dark_background: true,
            lenient_streams: false,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/streamdash/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the dataset path: CLI > config > fixed default.
    pub fn resolve_data_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.data_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }

    /// Resolve the summary row limit: CLI > config; 0 falls back to the default.
    pub fn resolve_top_n(&self, cli: Option<usize>) -> usize {
        match cli.unwrap_or(self.top_n) {
            0 => DEFAULT_LIMIT,
            n => n,
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.top_n, 10);
        assert!(config.dark_background);
        assert!(!config.lenient_streams);
        assert_eq!(config.resolve_data_path(None), PathBuf::from("spotify_cleaned.csv"));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = AppConfig::parse("top_n = 5\ndark_background = false\n").unwrap();
        assert_eq!(config.top_n, 5);
        assert!(!config.dark_background);
        assert_eq!(config.output_dir, PathBuf::from("dashboard"));
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(AppConfig::parse("top_n = \"ten\"").is_err());
    }

    #[test]
    fn test_resolution_precedence() {
        let config = AppConfig::parse("data_path = \"/data/songs.csv\"\ntop_n = 20").unwrap();
        assert_eq!(config.resolve_data_path(None), PathBuf::from("/data/songs.csv"));
        assert_eq!(
            config.resolve_data_path(Some(PathBuf::from("cli.csv"))),
            PathBuf::from("cli.csv")
        );
        assert_eq!(config.resolve_top_n(None), 20);
        assert_eq!(config.resolve_top_n(Some(3)), 3);
        assert_eq!(config.resolve_top_n(Some(0)), 10);
    }
}
