use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bookmark_agent::{
    config::{Config, LogFormat},
    fetcher::HttpFetcher,
    llm::OpenAiClient,
    orchestrator::ChatMessage,
    repository::BookmarkRepository,
    server::{AppState, ChatServer},
    storage::{embedder_from_config, SqliteVectorStore},
};

/// Conversational bookmarking assistant
#[derive(Parser, Debug)]
#[command(name = "bookmark-agent", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Serve JSON-RPC on stdin/stdout (default)
    Serve,
    /// Chat interactively in the terminal
    Chat,
    /// Print stored bookmarks as JSON
    Bookmarks {
        /// Only bookmarks whose category starts with this prefix
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the category tree as JSON
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Bookmark agent starting...");

    let state = Arc::new(build_state(&config).await?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = ChatServer::new(state);
            info!("Server ready, waiting for requests on stdin...");
            if let Err(e) = server.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Server shutdown complete");
        }
        Command::Chat => run_chat(&state).await?,
        Command::Bookmarks { category } => {
            let bookmarks = match category {
                Some(prefix) => state.repository.find_by_category_prefix(&prefix).await?,
                None => state.repository.all().await?,
            };
            println!("{}", serde_json::to_string_pretty(&bookmarks)?);
        }
        Command::Categories => {
            let tree = state.repository.category_tree().await?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }

    Ok(())
}

/// Wire storage, completion client and fetcher into application state
async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let embedder = embedder_from_config(&config.embedding, &config.openai, &config.request)?;

    let store = match SqliteVectorStore::new(&config.database, embedder).await {
        Ok(s) => {
            info!(
                path = %config.database.path.display(),
                collection = %config.database.collection,
                "Database initialized"
            );
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let client = match OpenAiClient::new(&config.openai, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.openai.base_url, model = %config.openai.model, "Completion client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize completion client");
            return Err(e.into());
        }
    };

    let fetcher = HttpFetcher::new(&config.fetch)?;

    Ok(AppState::new(
        BookmarkRepository::new(Arc::new(store)),
        Arc::new(client),
        Arc::new(fetcher),
        config.chat.history_limit,
    )
    .with_max_conversations(config.chat.max_conversations))
}

/// Interactive terminal chat; an empty line or EOF ends the session
async fn run_chat(state: &AppState) -> anyhow::Result<()> {
    let mut orchestrator = state.new_orchestrator();
    let mut history: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        let reply = orchestrator.respond(message, &history).await;
        stdout.write_all(format!("{}\n\n", reply).as_bytes()).await?;

        history.push(ChatMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });
        history.push(ChatMessage {
            role: "assistant".to_string(),
            content: reply,
        });
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
