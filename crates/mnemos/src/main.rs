//! Command-line interface for Mnemos session memory.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};
use mnemos::config::MnemosConfig;
use mnemos::memory::Message;
use mnemos::{Mnemos, init_logging};
use std::path::PathBuf;

/// Command-line options for the Mnemos CLI.
#[derive(Parser)]
#[command(name = "mnemos", version, about = "Session memory with progressive summarization")]
struct Cli {
    /// Optional path to a mnemos.json5 config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a message and run extractors on it
    Append {
        session: String,
        #[arg(long, default_value = "user")]
        role: String,
        #[arg(long)]
        content: String,
    },
    /// Print a session's memory as JSON
    Memory {
        session: String,
        /// Return the last N messages instead of the uncovered ones
        #[arg(long, default_value_t = 0)]
        last_n: usize,
    },
    /// Summarize a session now and wait for the result
    Summarize { session: String },
    /// Search a session's messages
    Search {
        session: String,
        text: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete a session's messages and summary
    Delete { session: String },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<MnemosConfig> {
    if let Some(path) = path {
        info!("loading config from path: {}", path.display());
        return MnemosConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    info!("searching for config from cwd: {}", cwd.display());
    let loaded = MnemosConfig::load_layered(&cwd).context("failed to load config")?;
    for file in &loaded.files {
        debug!("using config file (origin={}, path={})", file.origin, file.path.display());
    }
    Ok(loaded.config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let mnemos = Mnemos::from_config(config).context("failed to initialize mnemos")?;

    let result = run(&mnemos, cli.command).await;
    mnemos.shutdown().await;
    result
}

async fn run(mnemos: &Mnemos, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Append {
            session,
            role,
            content,
        } => {
            mnemos
                .append(&session, vec![Message::new(role, content)])
                .await
                .context("failed to append message")?;
        }
        Command::Memory { session, last_n } => {
            let memory = mnemos
                .memory(&session, last_n)
                .await
                .context("failed to read memory")?;
            println!("{}", serde_json::to_string_pretty(&memory)?);
        }
        Command::Summarize { session } => {
            mnemos
                .summarize(&session)
                .await
                .context("summarization failed")?;
            let memory = mnemos.memory(&session, 0).await?;
            println!("{}", serde_json::to_string_pretty(&memory.summary)?);
        }
        Command::Search {
            session,
            text,
            limit,
        } => {
            let results = mnemos
                .search(&session, &text, limit)
                .await
                .context("search failed")?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Delete { session } => {
            mnemos.delete(&session).await.context("failed to delete session")?;
            info!("session deleted (session_id={})", session);
        }
    }
    Ok(())
}
