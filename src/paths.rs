//! XDG-compliant path resolution.
//!
//! The config file lives under `$XDG_CONFIG_HOME/message-agent/`, the memory
//! file under `$XDG_DATA_HOME/message-agent/`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

const APP_DIR: &str = "message-agent";

/// Memory file used when no home directory can be resolved.
pub const FALLBACK_MEMORY_FILE: &str = ".agent_memory.json";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(agent::paths::no_home),
        help("Set the HOME environment variable, or pass --memory and --config explicitly.")
    )]
    NoHome,
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global directories for the agent.
#[derive(Debug, Clone)]
pub struct AgentPaths {
    /// `$XDG_CONFIG_HOME/message-agent/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/message-agent/`
    pub data_dir: PathBuf,
}

impl AgentPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = || {
            std::env::var("HOME")
                .map(PathBuf::from)
                .map_err(|_| PathError::NoHome)
        };

        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => home()?.join(".config"),
        }
        .join(APP_DIR);

        let data_dir = match std::env::var("XDG_DATA_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => home()?.join(".local/share"),
        }
        .join(APP_DIR);

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// `config.toml` inside the config directory.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// `memory.json` inside the data directory.
    pub fn memory_file(&self) -> PathBuf {
        self.data_dir.join("memory.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_hang_off_their_directories() {
        let paths = AgentPaths {
            config_dir: PathBuf::from("/cfg/message-agent"),
            data_dir: PathBuf::from("/data/message-agent"),
        };
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/message-agent/config.toml"));
        assert_eq!(paths.memory_file(), PathBuf::from("/data/message-agent/memory.json"));
    }
}
