//! `search <query>` through the configured [`SearchProvider`](crate::search::SearchProvider).

use super::strip_keyword;
use crate::dispatch::TurnContext;
use crate::error::{HandlerError, HandlerResult};
use crate::memory::MemoryState;
use crate::response::AgentResponse;

pub(super) fn is_search(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "search").is_some()
}

pub(super) fn search(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let query = strip_keyword(text, "search").unwrap_or_default();
    if query.is_empty() {
        return Err(HandlerError::user("Usage: search <query>"));
    }

    let answer = ctx.search().search(query)?;
    Ok(AgentResponse::new(answer, "search", 0.7).with_metadata("query", query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::search::{DisabledSearch, SearchError, SearchProvider, SearchResult};

    struct Canned;

    impl SearchProvider for Canned {
        fn search(&self, query: &str) -> SearchResult<String> {
            Ok(format!("answer for {query}"))
        }
    }

    struct TimesOut;

    impl SearchProvider for TimesOut {
        fn search(&self, _query: &str) -> SearchResult<String> {
            Err(SearchError::Timeout { secs: 10 })
        }
    }

    fn run(provider: &dyn SearchProvider, text: &str) -> HandlerResult<AgentResponse> {
        let mut state = MemoryState::default();
        let mut ctx = TurnContext::new(&mut state, &SystemClock, provider);
        search(text, &mut ctx)
    }

    #[test]
    fn delegates_query() {
        let response = run(&Canned, "search rust borrow checker").unwrap();
        assert_eq!(response.text(), "answer for rust borrow checker");
        assert_eq!(response.intent(), "search");
        assert_eq!(response.meta("query"), Some(&serde_json::json!("rust borrow checker")));
    }

    #[test]
    fn provider_failures_become_search_unavailable() {
        assert!(matches!(
            run(&TimesOut, "search anything"),
            Err(HandlerError::SearchUnavailable(SearchError::Timeout { secs: 10 }))
        ));
        assert!(matches!(
            run(&DisabledSearch, "search anything"),
            Err(HandlerError::SearchUnavailable(SearchError::Disabled))
        ));
    }

    #[test]
    fn empty_query_is_usage_error() {
        assert!(matches!(run(&Canned, "search"), Err(HandlerError::UserInput { .. })));
    }
}
