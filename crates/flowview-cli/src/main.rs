use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "flowview")]
#[command(author, version, about = "Scroll through a plain-text book headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sections of a book file
    Sections {
        /// Book file; sections are separated by `===` lines
        file: PathBuf,
    },
    /// Open a section and page through it, printing every relocation
    Read(commands::read::ReadArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so relocation output stays machine readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sections { file } => commands::sections::run(&file).await,
        Commands::Read(args) => commands::read::run(args).await,
    }
}
