//! Scribble CLI - multi-language playground in the terminal.

mod colors;
mod playground;
mod repl;
mod run;
mod terminal;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scribble_core::Language;
use scribble_core::execute::capability_for;

use crate::playground::PlaygroundArgs;

#[derive(Parser)]
#[command(name = "scribble")]
#[command(about = "Run Python, JavaScript and React snippets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct SessionFlags {
    /// Run the interpreter worker inside this process
    #[arg(long)]
    in_process: bool,

    /// Configuration file (default: <config dir>/scribble/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Python interpreter for the worker
    #[arg(long)]
    python: Option<PathBuf>,
}

impl From<SessionFlags> for PlaygroundArgs {
    fn from(flags: SessionFlags) -> Self {
        Self {
            in_process: flags.in_process,
            config: flags.config,
            python: flags.python,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file
    Run {
        /// Path to the file (.py, .js, .mjs, .jsx, .tsx)
        file: PathBuf,

        /// Language tag, overriding the file extension
        #[arg(short, long)]
        language: Option<String>,

        #[command(flatten)]
        session: SessionFlags,
    },

    /// Start an interactive session
    Repl {
        /// Initial language
        #[arg(short, long, default_value = "javascript")]
        language: String,

        #[command(flatten)]
        session: SessionFlags,
    },

    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format scribble-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<scribble_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Run {
            file,
            language,
            session,
        } => {
            let succeeded = run::execute(&file, language.as_deref(), &session.into())
                .await
                .map_err(format_error)?;
            if !succeeded {
                std::process::exit(1);
            }
        }

        Commands::Repl { language, session } => {
            repl::execute(&language, &session.into())
                .await
                .map_err(format_error)?;
        }

        Commands::Languages => {
            for language in Language::ALL {
                println!("{:<12}{}", language.tag(), capability_for(language).describe());
            }
        }
    }

    Ok(())
}
