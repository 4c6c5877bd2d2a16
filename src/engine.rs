//! The turn engine: preprocess → match → handle → postprocess → persist.
//!
//! Every stage is isolated. A failing or panicking preprocessor leaves the
//! text as it was, a failing handler turns into a conversational reply or an
//! apology, a failing postprocessor leaves the response as it was, and a
//! failing save is reported in the response metadata. Nothing that goes
//! wrong inside a turn escapes [`Engine::process_turn`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;

use crate::clock::{Clock, SystemClock};
use crate::config::{AgentConfig, PipelineConfig, SearchConfig};
use crate::dispatch::{Dispatched, HandlerEntry, HandlerRegistry, TurnContext};
use crate::error::{HandlerError, StoreResult};
use crate::handlers;
use crate::memory::{MemoryState, MemoryStore};
use crate::pipeline::{
    Postprocessor, Preprocessor, StageError, StageResult, TrimInput, TruncateResponse,
};
use crate::response::AgentResponse;
use crate::search::{DisabledSearch, DuckDuckGoSearch, SearchProvider};

/// Intent reported when a handler faulted.
pub const ERROR_INTENT: &str = "error";

const APOLOGY: &str = "Sorry, something went wrong while handling that. Please try again.";

/// Resolved configuration for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backing file of the memory store.
    pub memory_path: PathBuf,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
}

impl EngineConfig {
    /// Defaults for everything except the memory file.
    pub fn new(memory_path: impl Into<PathBuf>) -> Self {
        Self {
            memory_path: memory_path.into(),
            search: SearchConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    /// Combine a loaded config file with the resolved memory path.
    pub fn from_agent_config(config: AgentConfig, memory_path: PathBuf) -> Self {
        Self {
            memory_path,
            search: config.search,
            pipeline: config.pipeline,
        }
    }
}

/// The conversational engine. Owns the memory state for the whole session.
pub struct Engine {
    store: MemoryStore,
    state: MemoryState,
    registry: HandlerRegistry,
    fallback: HandlerEntry,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    postprocessors: Vec<Box<dyn Postprocessor>>,
    clock: Box<dyn Clock>,
    search: Box<dyn SearchProvider>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field(
                "preprocessors",
                &self.preprocessors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field(
                "postprocessors",
                &self.postprocessors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with the system clock and the configured web search.
    pub fn new(config: EngineConfig) -> Self {
        let search: Box<dyn SearchProvider> = if config.search.enabled {
            Box::new(DuckDuckGoSearch::new(&config.search))
        } else {
            Box::new(DisabledSearch)
        };
        Self::with_collaborators(config, Box::new(SystemClock), search)
    }

    /// Create an engine with explicit clock and search collaborators.
    ///
    /// Loads the memory state (falling back to empty), registers the built-in
    /// handlers and the configured built-in stages.
    pub fn with_collaborators(
        config: EngineConfig,
        clock: Box<dyn Clock>,
        search: Box<dyn SearchProvider>,
    ) -> Self {
        let store = MemoryStore::new(config.memory_path);
        let state = store.load();

        let mut registry = HandlerRegistry::new();
        handlers::register_builtins(&mut registry);

        let mut preprocessors: Vec<Box<dyn Preprocessor>> = Vec::new();
        if config.pipeline.trim_input {
            preprocessors.push(Box::new(TrimInput));
        }
        let mut postprocessors: Vec<Box<dyn Postprocessor>> = Vec::new();
        if config.pipeline.max_response_chars > 0 {
            postprocessors.push(Box::new(TruncateResponse {
                max_chars: config.pipeline.max_response_chars,
            }));
        }

        tracing::debug!(
            path = %store.path().display(),
            handlers = registry.len(),
            "engine ready"
        );

        Self {
            store,
            state,
            registry,
            fallback: handlers::fallback_entry(),
            preprocessors,
            postprocessors,
            clock,
            search,
        }
    }

    /// Current memory state (possibly ahead of disk after a failed save).
    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Register extra handlers. They are consulted after the built-ins.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Append a preprocessor after the configured ones.
    pub fn add_preprocessor(&mut self, stage: impl Preprocessor + 'static) {
        self.preprocessors.push(Box::new(stage));
    }

    /// Append a postprocessor after the configured ones.
    pub fn add_postprocessor(&mut self, stage: impl Postprocessor + 'static) {
        self.postprocessors.push(Box::new(stage));
    }

    /// Clear all memory and persist the empty state immediately.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.state = self.store.reset()?;
        Ok(())
    }

    /// Run one full turn. Always returns a non-empty response.
    pub fn process_turn(&mut self, raw_text: &str) -> AgentResponse {
        let mut degraded: Vec<String> = Vec::new();

        let text = self.preprocess(raw_text, &mut degraded);
        let (response, mutated) = self.handle(&text);
        let mut response = self.postprocess(response, &mut degraded);

        if !degraded.is_empty() {
            response = response.with_metadata("degraded", degraded);
        }

        if mutated {
            if let Err(e) = self.store.save(&self.state) {
                tracing::warn!(error = %e, "failed to persist memory; state is ahead of disk");
                response = response.with_metadata("storage_error", e.to_string());
            } else {
                tracing::info!(intent = response.intent(), "memory persisted");
            }
        }

        if response.text().trim().is_empty() {
            response = response.with_text("(no response)");
        }
        response
    }

    fn preprocess(&self, raw_text: &str, degraded: &mut Vec<String>) -> String {
        let mut text = raw_text.to_string();
        for stage in &self.preprocessors {
            match isolate(stage.name(), || stage.process(&text)) {
                Ok(next) => text = next,
                Err(e) => {
                    tracing::warn!(
                        stage = stage.name(),
                        error = %e,
                        "preprocessor failed, passing text through"
                    );
                    degraded.push(stage.name().to_string());
                }
            }
        }
        text
    }

    /// Match and run a handler. Returns the response and whether the state
    /// should be persisted. On any handler error the state is rolled back.
    fn handle(&mut self, text: &str) -> (AgentResponse, bool) {
        let snapshot = self.state.clone();
        let registry = &self.registry;
        let fallback = &self.fallback;
        let mut ctx = TurnContext::new(&mut self.state, self.clock.as_ref(), self.search.as_ref());

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            registry.dispatch(text, &mut ctx).unwrap_or_else(|| Dispatched {
                intent: fallback.intent().to_string(),
                position: registry.len(),
                result: fallback.invoke(text, &mut ctx),
            })
        }));
        let mutated = ctx.is_mutated();

        match outcome {
            Ok(Dispatched {
                result: Ok(response),
                ..
            }) => (response, mutated),
            Ok(Dispatched {
                intent,
                result: Err(e),
                ..
            }) => {
                self.state = snapshot;
                (handler_error_response(&intent, &e), false)
            }
            Err(payload) => {
                self.state = snapshot;
                let message = panic_message(payload.as_ref());
                tracing::warn!(error = %message, "handler panicked");
                let response = AgentResponse::new(APOLOGY, ERROR_INTENT, 0.0)
                    .with_metadata("error", message);
                (response, false)
            }
        }
    }

    fn postprocess(
        &self,
        mut response: AgentResponse,
        degraded: &mut Vec<String>,
    ) -> AgentResponse {
        for stage in &self.postprocessors {
            let before = response.clone();
            match isolate(stage.name(), || stage.process(before)) {
                Ok(next) => response = next,
                Err(e) => {
                    tracing::warn!(
                        stage = stage.name(),
                        error = %e,
                        "postprocessor failed, keeping response"
                    );
                    degraded.push(stage.name().to_string());
                }
            }
        }
        response
    }
}

/// Convert a handler error into the reply the user sees.
fn handler_error_response(intent: &str, error: &HandlerError) -> AgentResponse {
    match error {
        HandlerError::UserInput { message } => {
            tracing::debug!(intent, %message, "rejected user input");
            AgentResponse::new(message.clone(), intent, 0.0)
        }
        HandlerError::InvalidExpression(e) => {
            tracing::debug!(intent, error = %e, "invalid expression");
            AgentResponse::new(format!("Sorry, I couldn't evaluate that: {e}."), intent, 0.0)
                .with_metadata("expression", e.expression())
        }
        HandlerError::SearchUnavailable(e) => {
            tracing::warn!(intent, error = %e, "search unavailable");
            AgentResponse::new(format!("Search is unavailable right now ({e})."), intent, 0.0)
        }
        HandlerError::Fault { .. } => {
            tracing::warn!(intent, error = %error, "handler fault");
            AgentResponse::new(APOLOGY, ERROR_INTENT, 0.0)
                .with_metadata("error", error.to_string())
                .with_metadata("failed_intent", intent)
        }
    }
}

/// Run a stage, converting a panic into a [`StageError`].
fn isolate<T>(stage: &str, f: impl FnOnce() -> StageResult<T>) -> StageResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(StageError::new(stage, panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
