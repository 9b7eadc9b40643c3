//! CLI output: error mapping from domain errors to stable CLI surface.

/// Render an error and its causes on one line for CLI output.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}
