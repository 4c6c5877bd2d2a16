//! Small talk: greeting, help, farewell, echo, fallback.

use super::{first_word, is_word, strip_keyword};
use crate::dispatch::TurnContext;
use crate::error::{HandlerError, HandlerResult};
use crate::memory::MemoryState;
use crate::response::AgentResponse;

const GREETINGS: &[&str] = &["hi", "hello", "hey"];
const FAREWELLS: &[&str] = &["bye", "goodbye"];

const HELP_TEXT: &str = "\
Here is what I can do:
  hi / hello / hey              say hello
  /echo <text>                  repeat <text>
  calc <expr>                   arithmetic, e.g. calc 2*(3+5)
  age <YYYY-MM-DD>              your age from a birth date
  leap <year>                   is <year> a leap year?
  remind me to <task> in <N> <unit>
                                schedule a reminder (seconds .. weeks)
  reminders                     list reminders
  note <text> / notes           add a note / list notes
  task <text> / tasks           add a task / list tasks
  done <N>                      mark task N as done
  search <query>                search the web
  /whoami <name>                tell me your name
  /reset                        forget everything
  /quit                         leave";

pub(super) fn is_greeting(text: &str, _state: &MemoryState) -> bool {
    GREETINGS.contains(&first_word(text).as_str())
}

pub(super) fn greet(_text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let text = match &ctx.state().profile.name {
        Some(name) => format!("Hello, {name}! How can I help you today?"),
        None => "Hello! How can I help you today? Type /help to see what I can do.".to_string(),
    };
    Ok(AgentResponse::new(text, "greeting", 0.9))
}

pub(super) fn is_help(text: &str, _state: &MemoryState) -> bool {
    is_word(text, "/help") || is_word(text, "help")
}

pub(super) fn help(_text: &str, _ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    Ok(AgentResponse::new(HELP_TEXT, "help", 1.0))
}

pub(super) fn is_farewell(text: &str, _state: &MemoryState) -> bool {
    FAREWELLS.contains(&first_word(text).as_str())
}

pub(super) fn farewell(_text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let text = match &ctx.state().profile.name {
        Some(name) => format!("Goodbye, {name}!"),
        None => "Goodbye!".to_string(),
    };
    Ok(AgentResponse::new(text, "farewell", 0.9))
}

pub(super) fn is_echo(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "/echo").is_some()
}

pub(super) fn echo(text: &str, _ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    match strip_keyword(text, "/echo") {
        Some(rest) if !rest.is_empty() => Ok(AgentResponse::new(rest, "echo", 1.0)),
        _ => Err(HandlerError::user("Usage: /echo <text>")),
    }
}

pub(super) fn fallback(_text: &str, _ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    Ok(AgentResponse::new(
        "I'm not sure how to respond to that. Type /help to see what I can do.",
        "fallback",
        0.1,
    ))
}
