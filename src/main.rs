//! magent CLI: conversational command agent.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, Result};

use message_agent::config::AgentConfig;
use message_agent::engine::{Engine, EngineConfig};
use message_agent::error::{AgentError, AgentResult};
use message_agent::paths::{AgentPaths, FALLBACK_MEMORY_FILE};
use message_agent::response::AgentResponse;

#[derive(Parser)]
#[command(name = "magent", version, about = "Conversational command agent")]
struct Cli {
    /// Memory file (overrides the config file and the XDG default).
    #[arg(long)]
    memory: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/message-agent/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each response as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Clear all memory before doing anything else.
    #[arg(long)]
    reset: bool,

    /// Message for a single turn. Without one, an interactive session starts.
    message: Vec<String>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    // Logs go to stderr so stdout stays clean for responses and --json.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = engine_config(&cli)?;
    tracing::debug!(memory = %config.memory_path.display(), "starting");

    let mut engine = Engine::new(config);
    if cli.reset {
        engine.reset().map_err(AgentError::from)?;
    }

    if cli.message.is_empty() {
        repl(&mut engine, cli.json)
    } else {
        let response = engine.process_turn(&cli.message.join(" "));
        print_response(&response, cli.json)
    }
}

/// Resolve config file and memory path from flags, the config file and XDG.
fn engine_config(cli: &Cli) -> AgentResult<EngineConfig> {
    let paths = match AgentPaths::resolve() {
        Ok(paths) => Some(paths),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to the working directory");
            None
        }
    };

    let config_file = cli
        .config
        .clone()
        .or_else(|| paths.as_ref().map(AgentPaths::config_file));
    let config = match config_file {
        Some(path) => AgentConfig::load(&path)?,
        None => AgentConfig::default(),
    };

    let memory_path = cli
        .memory
        .clone()
        .or_else(|| config.memory_path.clone())
        .or_else(|| paths.as_ref().map(AgentPaths::memory_file))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_MEMORY_FILE));

    Ok(EngineConfig::from_agent_config(config, memory_path))
}

fn repl(engine: &mut Engine, json: bool) -> Result<()> {
    println!("Type /help to see what I can do, /quit to leave.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().into_diagnostic()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).into_diagnostic()? == 0 {
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "/quit" | "/exit") {
            break;
        }

        let response = engine.process_turn(input);
        print_response(&response, json)?;
    }
    Ok(())
}

fn print_response(response: &AgentResponse, json: bool) -> Result<()> {
    if let Some(error) = response.meta("storage_error") {
        eprintln!("warning: memory was not saved: {}", error.as_str().unwrap_or_default());
    }
    if json {
        println!("{}", serde_json::to_string(response).into_diagnostic()?);
    } else {
        println!("{}", response.text());
    }
    Ok(())
}
