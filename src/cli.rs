//! CLI domain: parse, route, help, output, and presentation only.
//! No engine logic; a single route table dispatches to the trainer and archive.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_manifest_json, format_manifest_text, format_ranking_json, format_ranking_text,
    format_train_result_json, format_train_result_text,
};
pub use route::RunContext;
