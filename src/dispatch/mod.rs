//! Ordered predicate → handler dispatch.
//!
//! # Architecture
//!
//! - [`HandlerEntry`]: an intent name, a cheap pure predicate over
//!   `(text, state)`, and the handler that produces the response
//! - [`HandlerRegistry`]: entries in registration order; the first predicate
//!   that matches wins, later entries only see text nobody earlier claimed
//! - [`TurnContext`]: what a handler may touch during a turn (memory state,
//!   clock, search). Mutable access to the state is tracked so the engine
//!   knows whether to persist.

use std::fmt;

use crate::clock::Clock;
use crate::error::HandlerResult;
use crate::memory::MemoryState;
use crate::response::AgentResponse;
use crate::search::SearchProvider;

// ---------------------------------------------------------------------------
// Turn context
// ---------------------------------------------------------------------------

/// Collaborators and state available to a handler for one turn.
pub struct TurnContext<'a> {
    state: &'a mut MemoryState,
    clock: &'a dyn Clock,
    search: &'a dyn SearchProvider,
    mutated: bool,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        state: &'a mut MemoryState,
        clock: &'a dyn Clock,
        search: &'a dyn SearchProvider,
    ) -> Self {
        Self {
            state,
            clock,
            search,
            mutated: false,
        }
    }

    /// Read-only view of the memory state.
    pub fn state(&self) -> &MemoryState {
        self.state
    }

    /// Mutable access to the memory state. Calling this declares a mutation:
    /// the engine will save after the turn.
    pub fn state_mut(&mut self) -> &mut MemoryState {
        self.mutated = true;
        self.state
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock
    }

    pub fn search(&self) -> &dyn SearchProvider {
        self.search
    }

    /// Whether [`state_mut`](Self::state_mut) was called this turn.
    pub fn is_mutated(&self) -> bool {
        self.mutated
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Pure classifier over the input text and current state.
pub type Predicate = Box<dyn Fn(&str, &MemoryState) -> bool>;

/// Produces the response for a matched input.
pub type HandlerFn = Box<dyn Fn(&str, &mut TurnContext<'_>) -> HandlerResult<AgentResponse>>;

/// One registered intent.
pub struct HandlerEntry {
    intent: String,
    predicate: Predicate,
    handler: HandlerFn,
}

impl HandlerEntry {
    pub fn new<P, H>(intent: impl Into<String>, predicate: P, handler: H) -> Self
    where
        P: Fn(&str, &MemoryState) -> bool + 'static,
        H: Fn(&str, &mut TurnContext<'_>) -> HandlerResult<AgentResponse> + 'static,
    {
        Self {
            intent: intent.into(),
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    /// Intent identifier reported in responses.
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Evaluate the predicate.
    pub fn matches(&self, text: &str, state: &MemoryState) -> bool {
        (self.predicate)(text, state)
    }

    /// Run the handler.
    pub fn invoke(&self, text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
        (self.handler)(text, ctx)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerEntry({})", self.intent)
    }
}

/// Outcome of a successful match.
#[derive(Debug)]
pub struct Dispatched {
    /// Intent of the entry that matched.
    pub intent: String,
    /// Zero-based registry position of that entry.
    pub position: usize,
    /// What the handler returned.
    pub result: HandlerResult<AgentResponse>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered collection of handlers; first match wins.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<HandlerEntry>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("intents", &self.intents())
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Overlapping or duplicate predicates are fine: the
    /// earlier registration shadows the later one.
    pub fn register<P, H>(&mut self, intent: impl Into<String>, predicate: P, handler: H)
    where
        P: Fn(&str, &MemoryState) -> bool + 'static,
        H: Fn(&str, &mut TurnContext<'_>) -> HandlerResult<AgentResponse> + 'static,
    {
        self.register_entry(HandlerEntry::new(intent, predicate, handler));
    }

    /// Append a prebuilt entry.
    pub fn register_entry(&mut self, entry: HandlerEntry) {
        self.entries.push(entry);
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Intents in registration order.
    pub fn intents(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.intent()).collect()
    }

    /// The first entry whose predicate accepts `text`, with its position.
    pub fn find_match(&self, text: &str, state: &MemoryState) -> Option<(usize, &HandlerEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.matches(text, state))
    }

    /// Run the first matching handler. `None` means no predicate matched.
    pub fn dispatch(&self, text: &str, ctx: &mut TurnContext<'_>) -> Option<Dispatched> {
        let (position, entry) = self.find_match(text, ctx.state())?;
        tracing::debug!(intent = entry.intent(), position, "handler matched");
        let result = entry.invoke(text, ctx);
        Some(Dispatched {
            intent: entry.intent().to_string(),
            position,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::search::DisabledSearch;

    fn reply(
        intent: &'static str,
    ) -> impl Fn(&str, &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
        move |_text, _ctx| Ok(AgentResponse::new(intent, intent, 1.0))
    }

    fn run(registry: &HandlerRegistry, text: &str, state: &mut MemoryState) -> Option<Dispatched> {
        let mut ctx = TurnContext::new(state, &SystemClock, &DisabledSearch);
        registry.dispatch(text, &mut ctx)
    }

    #[test]
    fn first_registered_match_wins_in_any_order() {
        let names = ["alpha", "beta", "gamma"];
        for first in 0..names.len() {
            let mut registry = HandlerRegistry::new();
            for offset in 0..names.len() {
                let name = names[(first + offset) % names.len()];
                registry.register(name, |text, _| text.starts_with("go"), reply(name));
            }
            let mut state = MemoryState::default();
            let dispatched = run(&registry, "go now", &mut state).unwrap();
            assert_eq!(dispatched.intent, names[first]);
            assert_eq!(dispatched.position, 0);
            assert_eq!(dispatched.result.unwrap().text(), names[first]);
        }
    }

    #[test]
    fn later_entries_see_unclaimed_text() {
        let mut registry = HandlerRegistry::new();
        registry.register("hello", |text, _| text == "hello", reply("hello"));
        registry.register("other", |_, _| true, reply("other"));

        let mut state = MemoryState::default();
        let dispatched = run(&registry, "something", &mut state).unwrap();
        assert_eq!(dispatched.intent, "other");
        assert_eq!(dispatched.position, 1);
    }

    #[test]
    fn no_match_is_none() {
        let mut registry = HandlerRegistry::new();
        registry.register("never", |_, _| false, reply("never"));
        let mut state = MemoryState::default();
        assert!(run(&registry, "anything", &mut state).is_none());
        assert!(run(&HandlerRegistry::new(), "anything", &mut state).is_none());
    }

    #[test]
    fn predicates_see_state() {
        let mut registry = HandlerRegistry::new();
        registry.register(
            "named",
            |_, state: &MemoryState| state.profile.name.is_some(),
            reply("named"),
        );

        let mut state = MemoryState::default();
        assert!(run(&registry, "x", &mut state).is_none());
        state.profile.name = Some("Ada".into());
        assert!(run(&registry, "x", &mut state).is_some());
    }

    #[test]
    fn mutation_is_tracked() {
        let mut registry = HandlerRegistry::new();
        registry.register("reader", |text, _| text == "read", |_, ctx: &mut TurnContext<'_>| {
            Ok(AgentResponse::new(ctx.state().notes.len().to_string(), "reader", 1.0))
        });
        registry.register("writer", |text, _| text == "write", |_, ctx: &mut TurnContext<'_>| {
            ctx.state_mut().notes.push("n".into());
            Ok(AgentResponse::new("ok", "writer", 1.0))
        });

        let mut state = MemoryState::default();
        {
            let mut ctx = TurnContext::new(&mut state, &SystemClock, &DisabledSearch);
            registry.dispatch("read", &mut ctx).unwrap();
            assert!(!ctx.is_mutated());
            registry.dispatch("write", &mut ctx).unwrap();
            assert!(ctx.is_mutated());
        }
        assert_eq!(state.notes.len(), 1);
    }

    #[test]
    fn intents_are_listed_in_order() {
        let mut registry = HandlerRegistry::new();
        registry.register("a", |_, _| false, reply("a"));
        registry.register("b", |_, _| false, reply("b"));
        assert_eq!(registry.intents(), vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
    }
}
