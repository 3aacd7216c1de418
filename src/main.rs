//! jstrs: pan-genomic polymorphic sequence tree search engine.

pub mod common;
pub mod coverage;
pub mod err;
pub mod haplotype;
pub mod index;
pub mod matcher;
pub mod orchestrator;
pub mod prefilter;
pub mod rcms;
pub mod search;
pub mod traversal;
pub mod tree;
pub mod variant;

use std::process::Termination;

use clap::{Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Pan-genomic polymorphic sequence tree search engine",
    long_about = "Builds and queries a referentially-compressed multi-sequence store through \
        an interleaved Bloom filter pre-filter and an exact/approximate matcher run over the \
        polymorphic sequence tree."
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Build an IBF pre-filter from a persisted RCMS store.
    Index(index::Args),
    /// Search queries against a persisted RCMS/IBF pair.
    Search(search::Args),
}

fn run() -> Result<(), err::AppError> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || match &cli.command {
        Commands::Index(args) => index::run(&cli.common, args),
        Commands::Search(args) => search::run(&cli.common, args),
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}

fn main() -> std::process::ExitCode {
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            e.report()
        }
    }
}
