//! Configuration System
//!
//! Layered engine configuration: built-in defaults, the user config file, the
//! project config file (or an explicit file) and `CHOICEPOINT__*` environment
//! variables, later layers overriding earlier ones.

use crate::archive::ArchiveConfig;
use crate::error::ConfigError;
use crate::generator::search::SearchConfig;
use crate::logging::LoggingConfig;
use crate::model::{ModelRegistry, TrainerConfig};
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::PROJECT_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub trainer: TrainerConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Search(String),
    Trainer(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Search(msg) => write!(f, "Search: {}", msg),
            ValidationError::Trainer(msg) => write!(f, "Trainer: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl EngineConfig {
    /// Render the configuration as TOML, in the layout the loader reads.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize configuration: {}", e)))
    }

    /// Validate the entire configuration against the built-in model kinds
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        self.validate_with(&ModelRegistry::with_builtin())
    }

    pub fn validate_with(&self, registry: &ModelRegistry) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.search.validate() {
            errors.push(ValidationError::Search(e));
        }
        if let Err(e) = self.trainer.validate(registry) {
            errors.push(ValidationError::Trainer(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
