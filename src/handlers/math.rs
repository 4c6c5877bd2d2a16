//! `calc <expr>` through the safe evaluator.

use super::strip_keyword;
use crate::calc::{self, Number};
use crate::dispatch::TurnContext;
use crate::error::{HandlerError, HandlerResult};
use crate::memory::MemoryState;
use crate::response::AgentResponse;

pub(super) fn is_calc(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "calc").is_some()
}

pub(super) fn calc(text: &str, _ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let expression = strip_keyword(text, "calc").unwrap_or_default();
    if expression.is_empty() {
        return Err(HandlerError::user("Usage: calc <expression>, e.g. calc 2*(3+5)"));
    }

    let value = calc::evaluate(expression)?;
    let result = match value {
        Number::Int(n) => serde_json::Value::from(n),
        Number::Float(x) => serde_json::Value::from(x),
    };
    Ok(AgentResponse::new(format!("{expression} = {value}"), "calculation", 1.0)
        .with_metadata("result", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::search::DisabledSearch;

    fn run(text: &str) -> HandlerResult<AgentResponse> {
        let mut state = MemoryState::default();
        let mut ctx = TurnContext::new(&mut state, &SystemClock, &DisabledSearch);
        calc(text, &mut ctx)
    }

    #[test]
    fn evaluates_expression() {
        let response = run("calc 2*(3+5)").unwrap();
        assert_eq!(response.text(), "2*(3+5) = 16");
        assert_eq!(response.meta("result"), Some(&serde_json::json!(16)));

        assert_eq!(run("calc 7/2").unwrap().text(), "7/2 = 3.5");
    }

    #[test]
    fn rejects_code() {
        assert!(matches!(
            run("calc __import__('os').system('rm -rf /')"),
            Err(HandlerError::InvalidExpression(_))
        ));
    }

    #[test]
    fn division_by_zero_is_user_visible() {
        let err = run("calc 1/0").unwrap_err();
        assert!(err.is_user_facing());
    }

    #[test]
    fn missing_expression_is_usage_error() {
        assert!(matches!(run("calc"), Err(HandlerError::UserInput { .. })));
    }
}
