//! CLI parse: clap types for choicepoint. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// choicepoint CLI - train and query per-site choice models
#[derive(Parser, Debug)]
#[command(name = "choicepoint")]
#[command(about = "Train, inspect and query per-site choice models from generator traces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over user and project config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one model per choice site from JSON-lines traces and save the archive
    Train {
        /// Training traces (one GeneratorTrace per line)
        #[arg(long)]
        traces: PathBuf,
        /// Validation traces
        #[arg(long)]
        validation: Option<PathBuf>,
        /// Number of training epochs (default: trainer.num_epochs)
        #[arg(long)]
        epochs: Option<usize>,
        /// Model kind (default: trainer.model_kind)
        #[arg(long)]
        kind: Option<String>,
        /// Archive directory to write
        #[arg(long)]
        out: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the sites stored in an archive
    Inspect {
        /// Archive directory
        archive: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Rank a domain with one site's model
    Rank {
        /// Archive directory
        archive: PathBuf,
        /// Site id
        #[arg(long)]
        sid: String,
        /// Candidates as a JSON array
        #[arg(long)]
        domain: String,
        /// Context payload as JSON
        #[arg(long)]
        context: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
