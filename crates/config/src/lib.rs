//! User configuration for drill.
//!
//! Read from `<config dir>/drill/config.toml`. Every field is optional and
//! falls back to its default, so an empty or missing file is valid.
use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::Deserialize;

const APP_NAME: &str = "drill";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of highlighted files kept in memory
    pub cache_capacity: usize,
    /// Name of a syntect theme used for syntax highlighting
    pub highlight_theme: String,
    /// Capacity of the debuggee output queue
    pub output_queue_depth: usize,
    pub log_file: Option<PathBuf>,
    /// Explicit path to the `dlv` binary
    pub dlv_path: Option<PathBuf>,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 5,
            highlight_theme: "base16-ocean.dark".to_string(),
            output_queue_depth: 256,
            log_file: None,
            dlv_path: None,
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Share of the terminal width given to the sidebar, before clamping
    pub sidebar_fraction_percent: u16,
    pub sidebar_min_width: u16,
    pub sidebar_max_width: u16,
    /// Share of the main column height given to the source view
    pub source_percent: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sidebar_fraction_percent: 50,
            sidebar_min_width: 20,
            sidebar_max_width: 50,
            source_percent: 70,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load from an explicit path, or from the default location when `path` is `None`.
    ///
    /// A missing file at the default location yields the default configuration;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    tracing::debug!("no configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> eyre::Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(self.cache_capacity > 0, "cache_capacity must be at least 1");
        eyre::ensure!(
            self.output_queue_depth > 0,
            "output_queue_depth must be at least 1"
        );
        let layout = &self.layout;
        eyre::ensure!(
            layout.sidebar_min_width <= layout.sidebar_max_width,
            "layout.sidebar_min_width ({}) is larger than layout.sidebar_max_width ({})",
            layout.sidebar_min_width,
            layout.sidebar_max_width
        );
        eyre::ensure!(
            layout.sidebar_fraction_percent <= 100 && layout.source_percent <= 100,
            "layout percentages must be between 0 and 100"
        );
        Ok(())
    }

    /// Directory for log files and other disposable state
    pub fn cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join(APP_NAME))
    }
}
