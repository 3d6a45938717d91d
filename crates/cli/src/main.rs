//! contentsplit CLI: the main entry point.
//!
//! Commands:
//! - `split`   Split a file or stdin into length-bounded fragments
//! - `config`  Show, locate or initialize the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use contentsplit_core::LongWordPolicy;

mod commands;

#[derive(Parser)]
#[command(
    name = "contentsplit",
    about = "contentsplit: split HTML or plain text into length-bounded fragments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split content into fragments
    Split {
        /// Input file; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Maximum fragment length in codepoints
        #[arg(short, long, env = "CONTENTSPLIT_MAX_LENGTH")]
        max_len: Option<usize>,

        /// What to do with a word longer than the maximum
        #[arg(long, value_enum)]
        long_words: Option<LongWords>,

        /// Directory fragment files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print fragments without writing files
        #[arg(long)]
        no_write: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file if none exists
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum LongWords {
    /// Emit the word whole as its own oversized fragment
    Keep,
    /// Cut the word at grapheme cluster boundaries
    Split,
}

impl From<LongWords> for LongWordPolicy {
    fn from(value: LongWords) -> Self {
        match value {
            LongWords::Keep => LongWordPolicy::Keep,
            LongWords::Split => LongWordPolicy::Split,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so fragment output on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            file,
            max_len,
            long_words,
            output_dir,
            no_write,
            json,
        } => commands::split::run(commands::split::SplitArgs {
            file,
            max_len,
            long_words: long_words.map(Into::into),
            output_dir,
            no_write,
            json,
        })?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path()?,
            ConfigAction::Init => commands::config_cmd::init()?,
        },
    }

    Ok(())
}
