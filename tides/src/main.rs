//! Tides of Remembrance console adventure.
//!
//! Reads actions from stdin and prints Gemini's narration. Set
//! `GEMINI_API_KEY` (or put it in a `.env` file) before running:
//!
//! ```bash
//! cargo run -p tides
//! cargo run -p tides -- --model gemini-2.5-flash
//! ```

use std::io::{self, Write};
use tides_core::prompts::{divider, GAME_DESCRIPTION};
use tides_core::{GameSession, GeminiNarrator, NarratorConfig, SessionError};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding the model.
const MODEL_VAR: &str = "GEMINI_MODEL";

const EXIT_ERROR: i32 = 1;
/// Shell convention for a process ended by SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliOptions {
    help: bool,
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();
    init_logging();

    let code = run().await;
    io::stdout().flush().ok();

    // Exit directly: a pending stdin read would otherwise hold up runtime
    // shutdown after an interrupt.
    std::process::exit(code);
}

async fn run() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args);

    if options.help {
        print_help();
        return 0;
    }

    let model = options.model.or_else(|| {
        std::env::var(MODEL_VAR)
            .ok()
            .filter(|model| !model.trim().is_empty())
    });

    let mut config = NarratorConfig::default();
    if let Some(model) = model {
        config = config.with_model(model);
    }
    tracing::debug!(model = ?config.model, "starting session");

    let mut session = GameSession::new(GeminiNarrator::from_env().with_config(config));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();

    match session.run(stdin, &mut stdout, interrupted()).await {
        Ok(()) => 0,
        Err(SessionError::Interrupted) => {
            tracing::debug!("interrupted during narration");
            println!();
            EXIT_INTERRUPTED
        }
        Err(e) => {
            tracing::debug!(error = %e, "session aborted");
            println!("\n{}\n", divider());
            println!("Something went wrong while running the game:");
            println!("{e}");
            println!("\nCheck your API key, network connection, and model name.");
            EXIT_ERROR
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Anything unrecognised is ignored, so stray arguments never stop the game.
fn parse_args(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => options.help = true,
            "--model" => match args.get(i + 1).filter(|m| !m.starts_with('-')) {
                Some(model) => {
                    options.model = Some(model.clone());
                    i += 1;
                }
                None => tracing::debug!("--model given without a model name, ignoring"),
            },
            other => tracing::debug!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    options
}

fn print_help() {
    println!("Tides of Remembrance - Text Adventure");
    println!();
    println!("{GAME_DESCRIPTION}");
    println!();
    println!("USAGE:");
    println!("  tides [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --model <MODEL>     Gemini model to use (default: gemini-2.0-flash)");
    println!();
    println!("IN GAME:");
    println!("  /quit, quit, exit                       Leave the game");
    println!("  /restart, new loop, new run, new game   Begin a new loop");
    println!("  anything else                           Your action");
    println!();
    println!("ENVIRONMENT:");
    println!("  GEMINI_API_KEY    API key (also read from .env)");
    println!("  GEMINI_MODEL      Model override (--model takes precedence)");
    println!("  GEMINI_API_BASE   API base URL override");
    println!("  RUST_LOG          Log filter for stderr (default: warn)");
}
