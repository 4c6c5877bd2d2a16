//! `/whoami` and `/reset`.

use super::{is_word, strip_keyword};
use crate::dispatch::TurnContext;
use crate::error::HandlerResult;
use crate::memory::MemoryState;
use crate::response::AgentResponse;

pub(super) fn is_whoami(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "/whoami").is_some()
}

pub(super) fn whoami(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let name = strip_keyword(text, "/whoami").unwrap_or_default();
    if name.is_empty() {
        let text = match &ctx.state().profile.name {
            Some(name) => format!("You are {name}."),
            None => "I don't know your name yet. Tell me with /whoami <name>.".to_string(),
        };
        return Ok(AgentResponse::new(text, "whoami", 1.0));
    }

    ctx.state_mut().profile.name = Some(name.to_string());
    Ok(AgentResponse::new(format!("Nice to meet you, {name}!"), "whoami", 1.0))
}

pub(super) fn is_reset(text: &str, _state: &MemoryState) -> bool {
    is_word(text, "/reset")
}

pub(super) fn reset(_text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    *ctx.state_mut() = MemoryState::default();
    tracing::info!("memory reset");
    Ok(AgentResponse::new("Memory cleared.", "reset", 1.0))
}
