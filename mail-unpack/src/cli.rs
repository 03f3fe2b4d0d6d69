///
/// This module implements the CLI interface for mail-unpack: command parsing,
/// wiring of the store and parser, and the mapping of the pipeline's boolean
/// result onto the process exit status.
///
/// All pipeline logic lives in the [`mail-unpack-core`] crate.
///
/// ## Features
/// - `unpack`: unpack one email given its bucket and escaped key.
/// - `event`: unpack every email announced by a storage event notification file.
/// - Async entrypoint ([`run`]) for programmatic invocation and integration testing.
///
/// [`mail-unpack-core`]: ../../mail-unpack-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mail_unpack_core::event::{handle_event, parse_event};
use mail_unpack_core::mime::MailParser;
use mail_unpack_core::pipeline::Pipeline;
use mail_unpack_core::store::FilesystemStore;
use std::path::PathBuf;

/// CLI for mail-unpack: split raw emails into text, HTML and attachments.
#[derive(Parser)]
#[clap(
    name = "mail-unpack",
    version,
    about = "Unpack raw MIME emails in an object store into text, HTML and attachment objects"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Unpack a single email object
    Unpack {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Bucket holding the raw email
        #[clap(long)]
        bucket: String,
        /// Escaped object key, as delivered by storage events (spaces as '+')
        #[clap(long)]
        key: String,
    },
    /// Unpack every email listed in a storage event notification
    Event {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the event notification JSON
        #[clap(long)]
        file: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let parser = MailParser::new();

    let succeeded = match cli.command {
        Commands::Unpack {
            config,
            bucket,
            key,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "unpack", bucket = %bucket, key = %key, "Starting unpack");
            let store = FilesystemStore::from_config(&config.store);
            Pipeline::new(&store, &parser).run(&bucket, &key).await
        }
        Commands::Event { config, file } => {
            let config = load_config(config)?;
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read event file {file:?}"))?;
            let triggers = parse_event(&json)
                .with_context(|| format!("Failed to parse event file {file:?}"))?;
            tracing::info!(command = "event", records = triggers.len(), "Starting unpack");
            let store = FilesystemStore::from_config(&config.store);
            handle_event(&Pipeline::new(&store, &parser), &triggers).await
        }
    };

    if succeeded {
        println!("Unpack complete.");
        Ok(())
    } else {
        eprintln!("[ERROR] Unpack failed");
        Err(anyhow::anyhow!("unpack pipeline reported failure"))
    }
}
