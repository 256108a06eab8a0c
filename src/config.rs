//! Configuration for gts
//!
//! Handles `{config_dir}/gts/config.toml`. Every section is optional and
//! falls back to defaults, so a missing file behaves like an empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.spiderman-preview";
pub const DEFAULT_USER_AGENT: &str = concat!("github-traffic-stats/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_DB_PATH: &str = "traffic.db";

// =============================================================================
// Config Types
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSection {
    /// Base URL of the REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Accept header sent with traffic requests
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout; the HTTP client default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_accept() -> String {
    DEFAULT_ACCEPT.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            accept: default_accept(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory CSV files are written to (`~` is expanded)
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Print tables to stdout
    #[serde(default = "default_print")]
    pub print: bool,
}

fn default_output_dir() -> String {
    ".".to_string()
}
fn default_print() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            print: default_print(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite database file (`~` is expanded)
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Default config location: `{config_dir}/gts/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gts").join("config.toml"))
}

/// Load config from an explicit path, or from the default location.
///
/// An explicit path must exist. The default location is optional and yields
/// defaults when absent.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_file(path),
        None => match default_path() {
            Some(path) if path.exists() => load_file(&path),
            _ => Ok(Config::default()),
        },
    }
}

/// Parse a config file.
pub fn load_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

// =============================================================================
// Effective Settings
// =============================================================================

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub no_print: bool,
}

/// Settings for one run after merging flags, config file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github: GithubSection,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    pub print: bool,
}

impl Settings {
    /// Merge with precedence: flag > config file > built-in default.
    ///
    /// Defaults are already folded into `config` by serde, so a flag only has
    /// to win over whatever the config holds. `--no-print` can only turn
    /// printing off.
    pub fn resolve(config: Config, overrides: &Overrides) -> Result<Self> {
        let mut github = config.github;
        if let Some(url) = &overrides.api_url {
            github.api_url = url.clone();
        }

        let output_dir = match &overrides.output_dir {
            Some(dir) => dir.clone(),
            None => expand_path(&config.output.dir)?,
        };
        let db_path = match &overrides.db {
            Some(path) => path.clone(),
            None => expand_path(&config.database.path)?,
        };

        Ok(Self {
            github,
            output_dir,
            db_path,
            print: config.output.print && !overrides.no_print,
        })
    }
}
