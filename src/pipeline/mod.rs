//! Pre- and postprocessing stages around dispatch.
//!
//! Preprocessors rewrite the input text before matching; postprocessors
//! rewrite the response after the handler ran. Each stage is fallible in
//! isolation: the engine logs a failing stage and carries on with the value
//! it had before that stage.

use miette::Diagnostic;
use thiserror::Error;

use crate::response::AgentResponse;

/// A pre- or postprocessor failed.
#[derive(Debug, Error, Diagnostic)]
#[error("stage '{stage}' failed: {message}")]
#[diagnostic(
    code(agent::pipeline::stage),
    help("The stage was skipped for this turn and its input passed through unchanged.")
)]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

impl StageError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Result type for stage execution.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Rewrites input text before matching.
pub trait Preprocessor {
    /// Name for logs and the `degraded` metadata.
    fn name(&self) -> &str;

    fn process(&self, text: &str) -> StageResult<String>;
}

/// Rewrites a response after the handler ran.
pub trait Postprocessor {
    /// Name for logs and the `degraded` metadata.
    fn name(&self) -> &str;

    fn process(&self, response: AgentResponse) -> StageResult<AgentResponse>;
}

/// A named closure acting as a [`Preprocessor`].
pub struct FnPreprocessor<F> {
    name: String,
    func: F,
}

/// A named closure acting as a [`Postprocessor`].
pub struct FnPostprocessor<F> {
    name: String,
    func: F,
}

/// Wrap a closure as a [`Preprocessor`].
pub fn preprocessor<F>(name: impl Into<String>, func: F) -> FnPreprocessor<F>
where
    F: Fn(&str) -> StageResult<String>,
{
    FnPreprocessor {
        name: name.into(),
        func,
    }
}

/// Wrap a closure as a [`Postprocessor`].
pub fn postprocessor<F>(name: impl Into<String>, func: F) -> FnPostprocessor<F>
where
    F: Fn(AgentResponse) -> StageResult<AgentResponse>,
{
    FnPostprocessor {
        name: name.into(),
        func,
    }
}

impl<F> Preprocessor for FnPreprocessor<F>
where
    F: Fn(&str) -> StageResult<String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, text: &str) -> StageResult<String> {
        (self.func)(text)
    }
}

impl<F> Postprocessor for FnPostprocessor<F>
where
    F: Fn(AgentResponse) -> StageResult<AgentResponse>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, response: AgentResponse) -> StageResult<AgentResponse> {
        (self.func)(response)
    }
}

// ---------------------------------------------------------------------------
// Built-in stages
// ---------------------------------------------------------------------------

/// Strip leading and trailing whitespace. Interior spacing is payload and
/// stays as typed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimInput;

impl Preprocessor for TrimInput {
    fn name(&self) -> &str {
        "trim-input"
    }

    fn process(&self, text: &str) -> StageResult<String> {
        Ok(text.trim().to_string())
    }
}

/// Cut responses down to a maximum number of characters.
#[derive(Debug, Clone, Copy)]
pub struct TruncateResponse {
    pub max_chars: usize,
}

impl Postprocessor for TruncateResponse {
    fn name(&self) -> &str {
        "truncate-response"
    }

    fn process(&self, response: AgentResponse) -> StageResult<AgentResponse> {
        if response.text().chars().count() <= self.max_chars {
            return Ok(response);
        }
        let text = truncate_chars(response.text(), self.max_chars);
        Ok(response.with_text(text).with_metadata("truncated", true))
    }
}

/// Shorten `text` to at most `max_chars` characters, ending with `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str(&"..."[..max_chars.min(3)]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_input_keeps_interior_spacing() {
        assert_eq!(
            TrimInput.process("  /echo   a\tb \n").unwrap(),
            "/echo   a\tb"
        );
        assert_eq!(TrimInput.process("   ").unwrap(), "");
    }

    #[test]
    fn truncate_chars_respects_limit() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_chars("abcdef", 2), "..");
        assert_eq!(truncate_chars("héllo wörld", 7), "héll...");
    }

    #[test]
    fn truncate_response_marks_metadata() {
        let stage = TruncateResponse { max_chars: 5 };
        let short = stage.process(AgentResponse::new("hi", "greeting", 1.0)).unwrap();
        assert!(short.meta("truncated").is_none());

        let long = stage
            .process(AgentResponse::new("a long answer", "search", 0.5))
            .unwrap();
        assert_eq!(long.text(), "a...");
        assert_eq!(long.meta("truncated"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(long.intent(), "search");
    }

    #[test]
    fn closures_become_stages() {
        let upper = preprocessor("upper", |text: &str| Ok(text.to_uppercase()));
        assert_eq!(upper.name(), "upper");
        assert_eq!(upper.process("hi").unwrap(), "HI");

        let failing = postprocessor("broken", |_: AgentResponse| -> StageResult<AgentResponse> {
            Err(StageError::new("broken", "boom"))
        });
        assert!(failing.process(AgentResponse::new("x", "y", 0.0)).is_err());
    }
}
