//! File logging
//!
//! The terminal owns stdout, so log records go to a file next to the config.

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, File};
use std::path::Path;

/// Parse a level name from the config; unknown names fall back to `Info`
pub fn level_from_name(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Install a file logger at `path`
pub fn init(path: &Path, level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level_from_name(level), config, file)
        .context("A logger is already installed")?;
    log::info!("logging to {}", path.display());
    Ok(())
}
