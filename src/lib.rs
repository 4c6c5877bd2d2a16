// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # message-agent
//!
//! A single-process conversational command agent. One line of text goes in,
//! gets matched against an ordered set of intent predicates, and the winning
//! handler produces an [`AgentResponse`](response::AgentResponse). Notes,
//! tasks, reminders and the user's name persist in a JSON file between runs.
//!
//! ## Architecture
//!
//! - **Dispatch** (`dispatch`): ordered predicate → handler registry, first match wins
//! - **Engine** (`engine`): preprocess → match → handle → postprocess → persist,
//!   with every stage isolated from the others' failures
//! - **Memory** (`memory`): typed state and its atomically-saved JSON store
//! - **Evaluator** (`calc`): restricted arithmetic grammar, never executes code
//! - **Handlers** (`handlers`): the built-in intents
//!
//! ## Library usage
//!
//! ```no_run
//! use message_agent::engine::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::new("memory.json"));
//! let reply = engine.process_turn("calc 2 * (3 + 4)");
//! assert_eq!(reply.text(), "2 * (3 + 4) = 14");
//! ```

pub mod calc;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod paths;
pub mod pipeline;
pub mod response;
pub mod search;
