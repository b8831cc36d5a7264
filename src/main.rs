//! Vita CLI - terminal client for the Vita medical-assistant chat
//!
//! Compose questions with media attachments and voice recordings from the
//! terminal; assistant responses are built-in samples.

mod assistant;
mod compose;
mod config;
mod media;
mod models;
mod speech;
mod tui;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::assistant::Assistant;
use crate::compose::MessageComposer;
use crate::config::Config;
use crate::media::store::{AttachmentStore, FileCandidate};
use crate::media::validator::FileValidator;

#[derive(Parser)]
#[command(name = "vita-cli")]
#[command(about = "Terminal client for the Vita medical-assistant chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the chat interface (default)
    Tui,

    /// Send a one-shot message and print the assistant's reply
    Send {
        /// Message text (may be omitted when attaching files)
        message: Option<String>,

        /// File(s) to attach; repeatable
        #[arg(long)]
        attach: Vec<PathBuf>,
    },

    /// Test microphone capture: record 3 seconds and save a WAV
    #[cfg(feature = "audio")]
    MicTest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            tui::run(config).await?;
        }
        Commands::Send { message, attach } => {
            send_once(config, message.unwrap_or_default(), attach).await?;
        }
        #[cfg(feature = "audio")]
        Commands::MicTest => {
            media::capture::mic_test()?;
        }
    }

    Ok(())
}

/// One-shot send: validate and attach files, compose, print the reply.
async fn send_once(config: Config, message: String, attach: Vec<PathBuf>) -> Result<()> {
    let store = AttachmentStore::new(FileValidator::new(config.media));
    let mut rejected = 0usize;

    for path in &attach {
        let candidate = FileCandidate::read(path)?;
        match store.add(candidate).await {
            Ok(category) => {
                tracing::info!("Attached {} ({})", path.display(), category.as_str());
            }
            Err(e) => {
                // Not admitted, but not fatal either; report and move on.
                tracing::warn!("{}", e);
                rejected += 1;
            }
        }
    }

    let mut assistant = Assistant::new();
    let mut composer = MessageComposer::new(store);
    let Some(outgoing) = composer.try_send(&message, &mut assistant) else {
        if rejected > 0 {
            bail!("Nothing to send: every attachment was rejected");
        }
        bail!("Nothing to send: message is empty and no attachments were given");
    };

    let reply = assistant.respond(&outgoing);
    println!("You: {}", outgoing.text);
    for att in &outgoing.attachments {
        println!(
            "  [{} {} ({})]",
            att.category.as_str(),
            att.file_name,
            media::progress::format_size(att.size)
        );
    }
    println!("\nVita: {}", reply.text);

    Ok(())
}
