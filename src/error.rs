//! Diagnostic error types for the message agent.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives.
//! Setup-time failures (config, paths, storage) bubble up to the binary through
//! [`AgentError`]; per-turn failures never leave the engine (see [`HandlerError`]).

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::calc::EvalError;
use crate::search::SearchError;

/// Top-level error type for the agent's setup surface.
#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] crate::paths::PathError),
}

/// Result alias for setup operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Durable read/write failure for the memory file.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(
        code(agent::store::io),
        help(
            "A filesystem operation failed. Check that the memory directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize memory state: {message}")]
    #[diagnostic(
        code(agent::store::serialize),
        help("The in-memory state could not be encoded as JSON. This is a bug; please report it.")
    )]
    Serialize { message: String },

    #[error("failed to replace {}: {source}", .path.display())]
    #[diagnostic(
        code(agent::store::persist),
        help(
            "The new memory file was written but could not be moved into place. \
             Check that the target is not a directory and that you own it."
        )
    )]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Handler errors
// ---------------------------------------------------------------------------

/// Failure raised by a handler during a turn.
///
/// The engine absorbs every variant: the first three become plain conversational
/// text, a [`Fault`](Self::Fault) becomes a generic apology.
#[derive(Debug, Error, Diagnostic)]
pub enum HandlerError {
    #[error("{message}")]
    #[diagnostic(
        code(agent::handler::user_input),
        help("The input was recognised but its arguments were not usable.")
    )]
    UserInput { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidExpression(#[from] EvalError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    SearchUnavailable(#[from] SearchError),

    #[error("handler '{intent}' failed: {message}")]
    #[diagnostic(
        code(agent::handler::fault),
        help("An unexpected failure inside a handler. The turn was answered with an apology.")
    )]
    Fault { intent: String, message: String },
}

impl HandlerError {
    /// Shorthand for a [`UserInput`](Self::UserInput) error.
    pub fn user(message: impl Into<String>) -> Self {
        Self::UserInput {
            message: message.into(),
        }
    }

    /// Whether this error is meant to be shown to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Fault { .. })
    }
}

/// Result alias for handler invocations.
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
