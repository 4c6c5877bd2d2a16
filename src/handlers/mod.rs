//! Built-in intents.
//!
//! Registration order is part of the contract: an earlier entry shadows a
//! later one on overlapping text.
//!
//! | # | intent | surface form |
//! |---|---|---|
//! | 1 | `greeting` | `hi` / `hello` / `hey` ... |
//! | 2 | `help` | `/help` |
//! | 3 | `farewell` | `bye` / `goodbye` |
//! | 4 | `echo` | `/echo <text>` |
//! | 5 | `calculation` | `calc <expr>` |
//! | 6 | `age` | `age <YYYY-MM-DD>` |
//! | 7 | `leap_year` | `leap <year>` |
//! | 8 | `reminder` | `remind me to <task> in <N> <unit>`, `reminders` |
//! | 9 | `note` | `note <text>`, `notes` |
//! | 10 | `task` | `task <text>`, `tasks`, `done <N>` |
//! | 11 | `search` | `search <query>` |
//! | 12 | `whoami` | `/whoami [name]` |
//! | 13 | `reset` | `/reset` |
//!
//! The `fallback` entry is not part of the registry; the engine runs it when
//! nothing else matched.

mod calendar;
mod conversation;
mod lookup;
mod math;
mod organizer;
mod profile;

use crate::dispatch::{HandlerEntry, HandlerRegistry};

/// Register every built-in intent in its documented order.
pub fn register_builtins(registry: &mut HandlerRegistry) {
    registry.register("greeting", conversation::is_greeting, conversation::greet);
    registry.register("help", conversation::is_help, conversation::help);
    registry.register("farewell", conversation::is_farewell, conversation::farewell);
    registry.register("echo", conversation::is_echo, conversation::echo);
    registry.register("calculation", math::is_calc, math::calc);
    registry.register("age", calendar::is_age, calendar::age);
    registry.register("leap_year", calendar::is_leap, calendar::leap);
    registry.register("reminder", organizer::is_reminder, organizer::reminder);
    registry.register("note", organizer::is_note, organizer::note);
    registry.register("task", organizer::is_task, organizer::task);
    registry.register("search", lookup::is_search, lookup::search);
    registry.register("whoami", profile::is_whoami, profile::whoami);
    registry.register("reset", profile::is_reset, profile::reset);
}

/// The always-matching, lowest-priority handler.
pub fn fallback_entry() -> HandlerEntry {
    HandlerEntry::new("fallback", |_, _| true, conversation::fallback)
}

/// If `text` starts with `keyword` (ASCII case-insensitive) as a whole word,
/// return the remainder with the separating whitespace and trailing
/// whitespace removed. Interior spacing of the remainder is kept.
pub(crate) fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &text[keyword.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Whether `text` is exactly `word`, ignoring ASCII case and surrounding space.
pub(crate) fn is_word(text: &str, word: &str) -> bool {
    text.trim().eq_ignore_ascii_case(word)
}

/// First word, lowercased, with trailing punctuation removed.
pub(crate) fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}
