//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name recorded on command lifecycle events (e.g. "train", "inspect").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Train { .. } => "train",
        Commands::Inspect { .. } => "inspect",
        Commands::Rank { .. } => "rank",
        Commands::Config => "config",
    }
}
