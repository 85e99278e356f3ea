use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period of the search box in milliseconds; 0 disables auto-submit
    pub debounce_ms: u64,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Directory exported spreadsheets are written to
    pub export_dir: String,
    /// One of off, error, warn, info, debug, trace
    pub log_level: String,
    /// Artificial delay added to every query
    pub simulated_latency_ms: u64,
    /// CSV file of accounts; the built-in sample is used when unset
    pub dataset_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
            export_dir: ".".to_string(),
            log_level: "info".to_string(),
            simulated_latency_ms: 0,
            dataset_path: None,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".datagrid-tui"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Load from the default location; a missing file yields the defaults
    pub fn load() -> Result<Config> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Write the config as pretty JSON, creating the directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Keep the page size usable whatever the file says
    fn normalized(mut self) -> Self {
        self.page_size_options.retain(|&size| size > 0);
        if self.page_size_options.is_empty() {
            self.page_size_options = Config::default().page_size_options;
        }
        if self.page_size == 0 {
            self.page_size = self.page_size_options[0];
        }
        if !self.page_size_options.contains(&self.page_size) {
            self.page_size_options.push(self.page_size);
            self.page_size_options.sort_unstable();
        }
        self
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("datagrid-tui.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "debounce_ms": 0, "page_size": 30 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.debounce_ms, 0);
        assert_eq!(config.page_size, 30);
        assert_eq!(config.page_size_options, vec![10, 25, 30, 50, 100]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            export_dir: "/tmp/exports".to_string(),
            dataset_path: Some("accounts.csv".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }
}
