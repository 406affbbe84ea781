use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::mapping::cache::DEFAULT_TTL;
use crate::mapping::service::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formpilot",
    version,
    about = "Detect, map and fill web application forms from a founder profile"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Mapping service base URL
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Path to config file (default: formpilot.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect fillable fields in a page snapshot and print them as JSON
    Detect {
        /// Page snapshot JSON file
        #[arg(long)]
        page: PathBuf,
    },

    /// Detect, resolve, fill and validate a page snapshot
    Fill {
        /// Page snapshot JSON file
        #[arg(long)]
        page: PathBuf,

        /// Where to write the filled snapshot
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Clear fields that failed validation
        #[arg(long)]
        clear_wrong: bool,

        /// Skip the mapping service and use local heuristics only
        #[arg(long)]
        offline: bool,
    },

    /// Ask the mapping service for a single field's value
    Suggest {
        /// Page snapshot JSON file
        #[arg(long)]
        page: PathBuf,

        /// Field index as printed by `detect`
        #[arg(long)]
        field: usize,
    },

    /// Show or edit the stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show or edit the stored company context
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Print the page tool declarations with their input schemas
    Tools,

    /// Check that the mapping service is reachable
    Health,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    Show,
    Set { key: String, value: String },
    /// Import profile and context from a public page via the mapping service
    Import {
        #[arg(long)]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContextAction {
    Show,
    Set { text: String },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `formpilot.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL pipeline trace; disabled when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Report fill counts to the usage endpoint.
    #[serde(default)]
    pub consent: bool,
}

// Serde default helpers
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT.as_secs() }
fn default_ttl_secs() -> u64 { DEFAULT_TTL.as_secs() }
fn default_store_path() -> PathBuf { PathBuf::from("formpilot-store.json") }

impl AppConfig {
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("formpilot.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "malformed config; using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Base URL precedence: CLI flag, config file, stored value, built-in default.
pub fn resolve_base_url(
    cli_flag: Option<&str>,
    config: &AppConfig,
    stored: Option<&str>,
) -> String {
    [cli_flag, config.service.base_url.as_deref(), stored]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
