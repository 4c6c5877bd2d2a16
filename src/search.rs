//! Web search collaborator.
//!
//! The `search` handler only sees the [`SearchProvider`] trait. The default
//! implementation queries the DuckDuckGo Instant Answer API through `ureq`
//! with a hard timeout, so a slow network can never stall a turn.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::pipeline::truncate_chars;

/// Maximum number of related topics listed when there is no direct answer.
const MAX_RELATED_TOPICS: usize = 3;

/// The external search could not produce a result.
#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("search timed out after {secs}s")]
    #[diagnostic(
        code(agent::search::timeout),
        help(
            "The search service did not answer in time. \
             Try again later or raise `search.timeout_secs`."
        )
    )]
    Timeout { secs: u64 },

    #[error("search request failed: {message}")]
    #[diagnostic(
        code(agent::search::transport),
        help("Check your network connection and the configured `search.endpoint`.")
    )]
    Transport { message: String },

    #[error("search service returned HTTP {code}")]
    #[diagnostic(code(agent::search::status))]
    Status { code: u16 },

    #[error("search service returned an unreadable answer: {message}")]
    #[diagnostic(code(agent::search::malformed))]
    Malformed { message: String },

    #[error("search is disabled")]
    #[diagnostic(
        code(agent::search::disabled),
        help("Set `search.enabled = true` in the config file to turn it on.")
    )]
    Disabled,
}

/// Result type for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Something that can answer a free-text query.
pub trait SearchProvider {
    /// Run `query` and return a human-readable summary.
    fn search(&self, query: &str) -> SearchResult<String>;
}

/// Placeholder provider used when search is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

impl SearchProvider for DisabledSearch {
    fn search(&self, _query: &str) -> SearchResult<String> {
        Err(SearchError::Disabled)
    }
}

/// DuckDuckGo Instant Answer search over HTTP.
pub struct DuckDuckGoSearch {
    agent: ureq::Agent,
    endpoint: String,
    timeout: Duration,
    max_chars: usize,
}

impl std::fmt::Debug for DuckDuckGoSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDuckGoSearch")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_chars", &self.max_chars)
            .finish()
    }
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: config.endpoint.clone(),
            timeout,
            max_chars: config.max_chars,
        }
    }

    fn timeout_error(&self) -> SearchError {
        SearchError::Timeout {
            secs: self.timeout.as_secs(),
        }
    }
}

impl SearchProvider for DuckDuckGoSearch {
    fn search(&self, query: &str) -> SearchResult<String> {
        tracing::debug!(query, endpoint = %self.endpoint, "running web search");

        let response = self
            .agent
            .get(&self.endpoint)
            .query("q", query)
            .query("format", "json")
            .query("no_html", "1")
            .query("skip_disambig", "1")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => SearchError::Status { code },
                ureq::Error::Transport(transport) if is_timeout(&transport) => self.timeout_error(),
                ureq::Error::Transport(transport) => SearchError::Transport {
                    message: transport.to_string(),
                },
            })?;

        let body: serde_json::Value = response.into_json().map_err(|e| {
            if is_timeout_io(&e) {
                self.timeout_error()
            } else {
                SearchError::Malformed {
                    message: e.to_string(),
                }
            }
        })?;

        Ok(summarize(query, &body, self.max_chars))
    }
}

fn is_timeout_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(is_timeout_io)
}

/// Turn an Instant Answer document into a short readable answer.
///
/// Preference order: abstract, direct answer, definition, related topics.
pub fn summarize(query: &str, body: &serde_json::Value, max_chars: usize) -> String {
    let field = |name: &str| {
        body.get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let text = if let Some(abstract_text) = field("AbstractText") {
        let mut text = match field("Heading") {
            Some(heading) => format!("{heading}: {abstract_text}"),
            None => abstract_text.to_string(),
        };
        if let Some(url) = field("AbstractURL") {
            text.push_str(&format!(" ({url})"));
        }
        text
    } else if let Some(answer) = field("Answer") {
        answer.to_string()
    } else if let Some(definition) = field("Definition") {
        definition.to_string()
    } else {
        let topics = related_topics(body);
        if topics.is_empty() {
            return format!("No results found for '{query}'.");
        }
        let mut text = format!("Results for '{query}':");
        for topic in topics {
            text.push_str("\n- ");
            text.push_str(&topic);
        }
        text
    };

    if max_chars == 0 {
        text
    } else {
        truncate_chars(&text, max_chars)
    }
}

/// Collect topic texts, descending one level into grouped topics.
fn related_topics(body: &serde_json::Value) -> Vec<String> {
    let mut out = Vec::new();
    let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) else {
        return out;
    };
    for topic in topics {
        let nested = topic.get("Topics").and_then(|v| v.as_array());
        let candidates: Vec<&serde_json::Value> = match nested {
            Some(group) => group.iter().collect(),
            None => vec![topic],
        };
        for candidate in candidates {
            if out.len() >= MAX_RELATED_TOPICS {
                return out;
            }
            if let Some(text) = candidate.get("Text").and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    out.push(text.trim().to_string());
                }
            }
        }
    }
    out
}
