//! Lesson Viewer CLI
//!
//! Serves the lesson API and offers a few terminal helpers for trying the
//! activity without a front end.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lesson_core::{create_router, roster, ActivityEngine, AppState, Config, LessonRegistry};
use lesson_suggest::SuggestionPipeline;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Lesson Viewer - interactive curriculum progression
#[derive(Parser, Debug)]
#[command(name = "lesson")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: lesson.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the lesson API and event stream
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Lesson to load on start (overrides defaultLesson)
        #[arg(short, long)]
        lesson: Option<String>,

        /// Text-generation endpoint (overrides suggestionEndpoint)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// List the available lessons
    Lessons,

    /// Ask for example answers to a training question
    Suggest {
        /// Character name or identifier
        #[arg(long)]
        character: String,

        /// Question identifier, e.g. "greeting"
        #[arg(long)]
        question: String,

        /// Your current answer, used to steer the suggestions
        #[arg(long)]
        attempt: Option<String>,

        /// Text-generation endpoint (overrides suggestionEndpoint)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Chat with a character's canned replies, one line per message
    Chat {
        /// Character name or identifier
        #[arg(long)]
        character: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    tracing::debug!(config = ?args.config, "Config file");

    match args.command {
        Command::Serve {
            port,
            lesson,
            endpoint,
        } => {
            if let Some(lesson) = lesson {
                config.default_lesson = lesson;
            }
            if let Some(endpoint) = endpoint {
                config.suggestion_endpoint = endpoint;
            }
            config.validate()?;
            serve(config, port).await
        }
        Command::Lessons => {
            list_lessons();
            Ok(())
        }
        Command::Suggest {
            character,
            question,
            attempt,
            endpoint,
        } => {
            if let Some(endpoint) = endpoint {
                config.suggestion_endpoint = endpoint;
            }
            config.validate()?;
            suggest(&config, &character, &question, attempt.as_deref()).await
        }
        Command::Chat { character } => chat(&character).await,
    }
}

fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    print_config(&config);

    let router = create_router(AppState::new(config)?);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port")
    })?;

    println!();
    println!("Lesson API running on http://{addr}/api");
    println!("Event stream on ws://{addr}/ws");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Could not listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!("Server stopped");
    Ok(())
}

fn list_lessons() {
    for lesson in LessonRegistry::builtin().list() {
        println!("{:<20} {}", lesson.id, lesson.title);
        println!("{:<20} {}", "", lesson.summary);
    }
}

async fn suggest(
    config: &Config,
    character: &str,
    question: &str,
    attempt: Option<&str>,
) -> anyhow::Result<()> {
    let mut engine = ActivityEngine::new();
    let selected = engine.select_character(character)?;
    if let Some(attempt) = attempt {
        engine.record_response(question, attempt);
    }
    let Some(context) = engine.suggestion_context(question) else {
        anyhow::bail!(
            "Unknown question: '{question}'\n\nSuggestion: Use one of greeting, favorite-thing, problem-solving, hard-day, advice, secret"
        );
    };

    println!("{}", context.question);
    let pipeline = SuggestionPipeline::from_endpoint(
        config.suggestion_endpoint.clone(),
        config.pipeline_config(),
    );
    let outcome = pipeline.get_suggestions(&context).await;

    if let Some(notice) = outcome.notice() {
        eprintln!("{notice}");
    }
    for (index, suggestion) in outcome.suggestions.iter().enumerate() {
        println!("  {}. {suggestion}", index + 1);
    }
    tracing::debug!(character = selected.id, source = ?outcome.source, "Suggestions printed");
    Ok(())
}

async fn chat(character: &str) -> anyhow::Result<()> {
    let mut engine = ActivityEngine::new();
    let selected = engine.select_character(character).map_err(|e| {
        let names: Vec<&str> = roster().iter().map(|c| c.name).collect();
        anyhow::anyhow!("{e}\n\nAvailable characters: {}", names.join(", "))
    })?;

    println!("{}: {}", selected.name, selected.greeting);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if let Some(reply) = engine.chat(message) {
            println!("{}: {reply}", selected.name);
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Default lesson: {}", config.default_lesson);
    println!("  Suggestion endpoint: {}", config.suggestion_endpoint);
    println!("  Suggestion timeout: {}s", config.suggestion_timeout_secs);
    println!("  Max suggestions: {}", config.max_suggestions);
    println!("  Notice lifetime: {}s", config.notice_ttl_secs);
}
