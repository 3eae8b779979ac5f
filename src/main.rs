use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use supportdesk::agent::{activity, HttpBackend};
use supportdesk::chat::Conversation;
use supportdesk::cli::{self, ChatRepl};
use supportdesk::data::{AppStateStore, MemoryStateStore, StateStore, StatusFilter, TicketStore};
use supportdesk::runtime::Runtime;
use supportdesk::session::Session;
use supportdesk::{util, Config};

#[derive(Parser)]
#[command(name = "supportdesk", version, about = "Support chat with ticket escalation")]
struct Cli {
    /// Data directory (default: ~/.supportdesk)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the agent endpoint from the config file
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the support agent (default)
    Chat,
    /// List stored tickets
    Tickets {
        /// all, open or closed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Case-insensitive text to match in subject, question or ticket id
        #[arg(long, default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (~/.supportdesk/logs/supportdesk.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let mut config = Config::load();
    if let Some(url) = cli.backend_url {
        config = config.with_backend_url(url);
    }

    let storage = open_storage();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Tickets { status, query } => {
            let tickets = TicketStore::load(storage);
            cli::print_tickets(&tickets.filter(status, &query));
            Ok(())
        }
        Command::Chat => run_chat(config, storage).await,
    }
}

/// SQLite-backed state, or in-memory state if the database cannot be opened.
fn open_storage() -> Arc<dyn StateStore> {
    match AppStateStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, state will not be saved");
            Arc::new(MemoryStateStore::new())
        }
    }
}

async fn run_chat(config: Config, storage: Arc<dyn StateStore>) -> Result<()> {
    let client = reqwest::Client::new();
    let backend = HttpBackend::with_client(config.backend_url.clone(), client.clone());
    let session = Session::start(storage.clone());
    let session_id = session.context().session_id.clone();

    let conversation = Conversation::new(session, storage, config.chat_settings());
    let (runtime, events) = Runtime::new(Arc::new(backend), config.request_timeout);

    if let Some(url) = &config.activity_url {
        match activity::subscribe(&client, url, &session_id) {
            Ok(feed) => runtime.forward_activity(feed),
            Err(e) => tracing::warn!(error = %e, "Activity stream unavailable"),
        }
    }

    ChatRepl::new(conversation, runtime, events).run().await
}
