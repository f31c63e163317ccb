//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `adoptly_core` linkage and config files without the Flutter shell.
//! - Inspect the local chat cache.
//! - Keep output deterministic for quick local sanity checks.

use adoptly_core::service::chat_service::ChatService;
use adoptly_core::{open_db, CoreConfig, SqliteChatRepository};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "adoptly-cli", version, about = "Adoptly core diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints core health and version.
    Ping,
    /// Loads and validates a core config file (with `ADOPTLY_*` overrides).
    CheckConfig {
        path: PathBuf,
    },
    /// Lists cached chats, most recent first.
    Chats {
        #[arg(long)]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Ping => {
            println!("adoptly_core ping={}", adoptly_core::ping());
            println!("adoptly_core version={}", adoptly_core::core_version());
        }
        Command::CheckConfig { path } => {
            let config = CoreConfig::load(&path)
                .with_context(|| format!("config check failed for {}", path.display()))?;
            println!("config ok: {}", path.display());
            println!("firebase.project_id={}", config.firebase.project_id);
            println!("paging.page_size={}", config.paging.page_size);
            println!(
                "storage.chat_db_path={}",
                config.storage.resolved_chat_db_path().display()
            );
        }
        Command::Chats { db } => {
            let conn = open_db(&db)
                .with_context(|| format!("failed to open chat cache {}", db.display()))?;
            let repo = SqliteChatRepository::try_new(&conn)?;
            let chats = ChatService::new(repo).list_chats()?;
            if chats.is_empty() {
                println!("no chats");
            }
            for chat in chats {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    chat.id,
                    chat.peer_id,
                    chat.peer_name,
                    chat.updated_at,
                    chat.last_message.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}
