//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("search.max_depth", 4096)?
        .set_default("search.max_sample_retries", 1024)?
        .set_default("trainer.num_epochs", 10)?
        .set_default("trainer.model_kind", "frequency")?
        .set_default("archive.verify_checksums", true)?
        .set_default("logging.level", "info")
}
