//! Config loading facade: builds the layered source stack and validates the result.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::EngineConfig;
use crate::error::ConfigError;
use config::{Environment, File};
use std::path::Path;
use tracing::debug;

/// Loads [`EngineConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory.
    ///
    /// Layers, lowest to highest precedence: defaults, user config file,
    /// project `choicepoint.toml`, `config_path` (required when given),
    /// `CHOICEPOINT__SECTION__KEY` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let project_root = std::env::current_dir().map_err(|e| {
            ConfigError::Invalid(format!("Failed to resolve current directory: {}", e))
        })?;
        Self::load_in(&project_root, config_path)
    }

    /// Like [`ConfigLoader::load`] with an explicit project root.
    pub fn load_in(project_root: &Path, config_path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        builder = workspace_file::add_to_builder(builder, project_root)?;
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("CHOICEPOINT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        validated(config)
    }

    /// Load defaults overlaid with a single file, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        validated(config)
    }
}

fn validated(config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    config.validate().map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ConfigError::Validation(error_msgs.join("\n"))
    })?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}
