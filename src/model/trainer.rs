//! Independent-operator trainer
//!
//! Flattens the op traces of every generator trace, groups them by site id and
//! fits one fresh model per site from that site's examples only. No parameters
//! are shared across sites and site models do not depend on each other, so
//! adding or removing another site's traces never changes a site's model.

use crate::error::ModelError;
use crate::model::registry::ModelRegistry;
use crate::model::{ModelBundle, OpExample, OpModel, TrainReport};
use crate::op::{GeneratorTrace, OpInfo, Sid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

fn default_num_epochs() -> usize {
    10
}

fn default_model_kind() -> String {
    "frequency".to_string()
}

/// Trainer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainerConfig {
    #[serde(default = "default_num_epochs")]
    pub num_epochs: usize,

    /// Model family fitted at every site
    #[serde(default = "default_model_kind")]
    pub model_kind: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_epochs: default_num_epochs(),
            model_kind: default_model_kind(),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self, registry: &ModelRegistry) -> Result<(), String> {
        if !registry.contains(&self.model_kind) {
            return Err(format!(
                "Unknown model kind '{}' (known: {})",
                self.model_kind,
                registry.kinds().join(", ")
            ));
        }
        Ok(())
    }
}

/// Examples recorded at one site
#[derive(Debug, Clone)]
pub struct SiteExamples {
    pub info: OpInfo,
    pub examples: Vec<OpExample>,
}

/// Group every op trace by site id, preserving recording order within a site.
pub fn group_by_site(traces: &[GeneratorTrace]) -> BTreeMap<Sid, SiteExamples> {
    let mut groups: BTreeMap<Sid, SiteExamples> = BTreeMap::new();
    for op_trace in traces.iter().flat_map(|t| t.op_traces.iter()) {
        groups
            .entry(op_trace.op_info.sid())
            .or_insert_with(|| SiteExamples {
                info: op_trace.op_info.clone(),
                examples: Vec::new(),
            })
            .examples
            .push(OpExample::from(op_trace));
    }
    groups
}

/// Training outcome for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    pub sid: Sid,
    pub kind: String,
    pub validation_examples: usize,
    pub report: TrainReport,
}

type ModelFactory = dyn Fn(&OpInfo) -> Result<Box<dyn OpModel>, ModelError> + Send + Sync;

/// Fits one model per site
pub struct Trainer {
    factory: Box<ModelFactory>,
}

impl Trainer {
    /// Trainer fitting a built-in model family at every site
    pub fn new(kind: &str) -> Result<Self, ModelError> {
        Self::with_registry(kind, ModelRegistry::with_builtin())
    }

    /// Trainer fitting `kind` from a custom registry
    pub fn with_registry(kind: &str, registry: ModelRegistry) -> Result<Self, ModelError> {
        // fail early on unknown kinds rather than at the first site
        registry.create(kind)?;
        let kind = kind.to_string();
        Ok(Self::with_factory(move |_| registry.create(&kind)))
    }

    /// Trainer with a caller-supplied model factory, e.g. to pick a family per site
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&OpInfo) -> Result<Box<dyn OpModel>, ModelError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }

    pub fn from_config(config: &TrainerConfig) -> Result<Self, ModelError> {
        Self::new(&config.model_kind)
    }

    pub fn train(
        &self,
        training: &[GeneratorTrace],
        validation: &[GeneratorTrace],
        num_epochs: usize,
    ) -> Result<ModelBundle, ModelError> {
        self.train_with_report(training, validation, num_epochs)
            .map(|(bundle, _)| bundle)
    }

    pub fn train_with_report(
        &self,
        training: &[GeneratorTrace],
        validation: &[GeneratorTrace],
        num_epochs: usize,
    ) -> Result<(ModelBundle, Vec<SiteReport>), ModelError> {
        let training_groups = group_by_site(training);
        let mut validation_groups = group_by_site(validation);

        info!(
            traces = training.len(),
            sites = training_groups.len(),
            num_epochs,
            "Training per-site models"
        );

        let mut bundle = ModelBundle::new();
        let mut reports = Vec::with_capacity(training_groups.len());
        for (sid, group) in training_groups {
            let validation_examples = validation_groups
                .remove(&sid)
                .map(|g| g.examples)
                .unwrap_or_default();

            let mut model = (self.factory)(&group.info)?;
            let report = model
                .train(&group.examples, &validation_examples, num_epochs)
                .map_err(|e| ModelError::TrainingFailed {
                    sid: sid.to_string(),
                    message: e.to_string(),
                })?;

            info!(
                sid = %sid,
                kind = model.kind(),
                examples = report.examples,
                epochs = report.epochs_run,
                train_accuracy = report.train_accuracy,
                validation_accuracy = report.validation_accuracy,
                "Site model trained"
            );

            reports.push(SiteReport {
                sid: sid.clone(),
                kind: model.kind().to_string(),
                validation_examples: validation_examples.len(),
                report,
            });
            bundle.insert(group.info, model);
        }

        for sid in validation_groups.keys() {
            warn!(sid = %sid, "Validation traces reference a site with no training data");
        }

        Ok((bundle, reports))
    }
}
