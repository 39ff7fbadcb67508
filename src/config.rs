//! Configuration file parsing and management

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Global configuration loaded from .tally.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of groups under the root
    #[serde(default = "default_groups")]
    pub groups: usize,

    /// Leaves per group
    #[serde(default = "default_leaves_per_group")]
    pub leaves_per_group: usize,

    /// Upper bound on the step count a producer picks for its leaf
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Fastest per-step delay in milliseconds
    #[serde(default = "default_min_step_delay")]
    pub min_step_delay_ms: u64,

    /// Slowest per-step delay in milliseconds
    #[serde(default = "default_max_step_delay")]
    pub max_step_delay_ms: u64,

    /// Progress bar width in characters
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            leaves_per_group: default_leaves_per_group(),
            max_steps: default_max_steps(),
            min_step_delay_ms: default_min_step_delay(),
            max_step_delay_ms: default_max_step_delay(),
            bar_width: default_bar_width(),
        }
    }
}

/// Runtime configuration for one drive
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub groups: usize,
    pub leaves_per_group: usize,
    pub max_steps: u32,
    pub min_step_delay: Duration,
    pub max_step_delay: Duration,
    pub bar_width: usize,
}

impl From<Config> for DriveConfig {
    fn from(config: Config) -> Self {
        Self {
            groups: config.groups,
            leaves_per_group: config.leaves_per_group,
            max_steps: config.max_steps,
            min_step_delay: Duration::from_millis(config.min_step_delay_ms),
            max_step_delay: Duration::from_millis(config.max_step_delay_ms),
            bar_width: config.bar_width,
        }
    }
}

/// Load configuration from .tally.toml in the given directory
pub fn load_config(dir: &Path) -> Result<Config> {
    let config_path = dir.join(".tally.toml");

    if !config_path.exists() {
        tracing::debug!("No .tally.toml found, using defaults");
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse .tally.toml: {}", e))?;

    tracing::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

// Default values
fn default_groups() -> usize { 4 }
fn default_leaves_per_group() -> usize { 2 }
fn default_max_steps() -> u32 { 50 }
fn default_min_step_delay() -> u64 { 10 }
fn default_max_step_delay() -> u64 { 100 }
fn default_bar_width() -> usize { 50 }
