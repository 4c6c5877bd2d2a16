//! Agent configuration, persisted as TOML.
//!
//! Every field has a default, so an absent file or a partial one is fine.
//! A file that exists but does not parse is an error the front end reports.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading the config file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(agent::config::read),
        help("Ensure the config file is readable, or remove it to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(agent::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Where the memory file lives. Defaults to the XDG data directory.
    #[serde(default)]
    pub memory_path: Option<PathBuf>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Settings for the `search` handler's collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    /// Upper bound on the whole request, in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    /// Longest answer returned, in characters (0 = unlimited).
    #[serde(default = "default_search_max_chars")]
    pub max_chars: usize,
}

fn default_search_enabled() -> bool {
    true
}
fn default_search_endpoint() -> String {
    "https://api.duckduckgo.com/".into()
}
fn default_search_timeout_secs() -> u64 {
    10
}
fn default_search_max_chars() -> usize {
    1000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_search_enabled(),
            endpoint: default_search_endpoint(),
            timeout_secs: default_search_timeout_secs(),
            max_chars: default_search_max_chars(),
        }
    }
}

/// Settings for the built-in pre/postprocessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Strip leading and trailing whitespace from input before matching.
    #[serde(default = "default_trim_input")]
    pub trim_input: bool,
    /// Truncate responses longer than this many characters (0 = never).
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
}

fn default_trim_input() -> bool {
    true
}
fn default_max_response_chars() -> usize {
    2000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trim_input: default_trim_input(),
            max_response_chars: default_max_response_chars(),
        }
    }
}

impl AgentConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::parse(&data).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse a TOML document.
    pub fn parse(data: &str) -> Result<Self, String> {
        toml::from_str(data).map_err(|e| e.to_string())
    }
}
