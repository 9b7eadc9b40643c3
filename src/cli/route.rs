//! CLI route: single route table and run context. Dispatches to the trainer,
//! the archive and presentation.

use crate::archive::{read_manifest, restore_model_with, save_model};
use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_manifest_json, format_manifest_text, format_ranking_json, format_ranking_text,
    format_train_result_json, format_train_result_text,
};
use crate::config::{ConfigLoader, EngineConfig};
use crate::model::{ModelRegistry, Trainer};
use crate::op::runtime::enumeration_order;
use crate::op::trace::read_traces_jsonl;
use crate::op::{Sid, Value};
use anyhow::{anyhow, bail, Context};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: loaded configuration and model registry.
pub struct RunContext {
    config: EngineConfig,
    registry: ModelRegistry,
}

impl RunContext {
    /// Create run context from an optional config path. Uses ConfigLoader only.
    pub fn new(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = ConfigLoader::load(config_path.as_deref())
            .context("Failed to load configuration")?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ModelRegistry::with_builtin(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Train {
                traces,
                validation,
                epochs,
                kind,
                out,
                format,
            } => self.handle_train(
                traces,
                validation.as_deref(),
                *epochs,
                kind.as_deref(),
                out,
                format,
            ),
            Commands::Inspect { archive, format } => {
                let manifest = read_manifest(archive)
                    .with_context(|| format!("Failed to read archive {}", archive.display()))?;
                Ok(match format.as_str() {
                    "json" => format_manifest_json(&manifest),
                    _ => format_manifest_text(&manifest),
                })
            }
            Commands::Rank {
                archive,
                sid,
                domain,
                context,
                format,
            } => self.handle_rank(archive, sid, domain, context.as_deref(), format),
            Commands::Config => Ok(self.config.to_toml_string()?),
        }
    }

    fn handle_train(
        &self,
        traces: &Path,
        validation: Option<&Path>,
        epochs: Option<usize>,
        kind: Option<&str>,
        out: &Path,
        format: &str,
    ) -> anyhow::Result<String> {
        let training = read_traces_jsonl(traces)
            .with_context(|| format!("Failed to read traces from {}", traces.display()))?;
        let validation = match validation {
            Some(path) => read_traces_jsonl(path)
                .with_context(|| format!("Failed to read validation traces from {}", path.display()))?,
            None => Vec::new(),
        };

        let kind = kind.unwrap_or(&self.config.trainer.model_kind);
        let num_epochs = epochs.unwrap_or(self.config.trainer.num_epochs);
        let trainer = Trainer::with_registry(kind, self.registry.clone())?;
        let (bundle, reports) = trainer.train_with_report(&training, &validation, num_epochs)?;
        save_model(&bundle, out)
            .with_context(|| format!("Failed to save archive to {}", out.display()))?;

        Ok(match format {
            "json" => format_train_result_json(&reports, out),
            _ => format_train_result_text(&reports, out),
        })
    }

    fn handle_rank(
        &self,
        archive: &Path,
        sid: &str,
        domain: &str,
        context: Option<&str>,
        format: &str,
    ) -> anyhow::Result<String> {
        let domain: Vec<Value> =
            serde_json::from_str(domain).context("--domain must be a JSON array")?;
        if domain.is_empty() {
            bail!("--domain must contain at least one candidate");
        }
        let context: Option<Value> = context
            .map(serde_json::from_str)
            .transpose()
            .context("--context must be valid JSON")?;

        let bundle = restore_model_with(archive, &self.registry, &self.config.archive)
            .with_context(|| format!("Failed to restore archive {}", archive.display()))?;
        let sid = Sid::from(sid);
        if bundle.get(&sid).is_none() {
            return Err(anyhow!("No model for site {} in {}", sid, archive.display()));
        }

        let order = enumeration_order(Some(&bundle), &sid, &domain, context.as_ref(), domain.len());
        let ranked: Vec<Value> = order.into_iter().map(|i| domain[i].clone()).collect();
        Ok(match format {
            "json" => format_ranking_json(sid.as_str(), &ranked),
            _ => format_ranking_text(sid.as_str(), &ranked),
        })
    }
}
