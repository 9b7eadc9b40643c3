//! Per-site models
//!
//! A model ranks the domain offered at one choice site. Models are trained
//! independently, one per site id, from that site's recorded choices only.

pub mod frequency;
pub mod perceptron;
pub mod registry;
pub mod trainer;

pub use frequency::FrequencyModel;
pub use perceptron::PerceptronModel;
pub use registry::ModelRegistry;
pub use trainer::{SiteReport, Trainer, TrainerConfig};

use crate::error::ModelError;
use crate::op::value::{value_key, Value};
use crate::op::{OpInfo, OpTrace, Sid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One supervised example: the domain offered, optional context, and the choice made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpExample {
    pub domain: Vec<Value>,
    pub choice: Value,
    pub context: Option<Value>,
}

impl OpExample {
    /// Position of the choice in the domain, if it is a member.
    pub fn choice_index(&self) -> Option<usize> {
        self.domain.iter().position(|v| *v == self.choice)
    }
}

impl From<&OpTrace> for OpExample {
    fn from(trace: &OpTrace) -> Self {
        Self {
            domain: trace.domain.clone(),
            choice: trace.choice.clone(),
            context: trace.context.clone(),
        }
    }
}

/// Outcome of fitting one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub examples: usize,
    pub epochs_run: usize,
    pub train_accuracy: Option<f64>,
    pub validation_accuracy: Option<f64>,
}

/// Capability every per-site model provides.
///
/// `infer` returns indices into `domain` in descending predicted likelihood.
/// A model may leave candidates out but can never name a value outside the
/// domain it was given. Inference must be a deterministic function of its
/// inputs.
pub trait OpModel: Send + Sync {
    /// Stable kind name used to restore the model from an archive
    fn kind(&self) -> &str;

    fn infer(&self, domain: &[Value], context: Option<&Value>) -> Vec<usize>;

    fn train(
        &mut self,
        examples: &[OpExample],
        validation: &[OpExample],
        num_epochs: usize,
    ) -> Result<TrainReport, ModelError>;

    /// Serialized weights; paired with the registry's decoder for `kind`
    fn encode(&self) -> Result<Vec<u8>, ModelError>;
}

/// Fraction of examples whose choice the model ranks first.
pub fn top1_accuracy(model: &dyn OpModel, examples: &[OpExample]) -> Option<f64> {
    if examples.is_empty() {
        return None;
    }
    let hits = examples
        .iter()
        .filter(|ex| {
            model
                .infer(&ex.domain, ex.context.as_ref())
                .first()
                .and_then(|&i| ex.domain.get(i))
                == Some(&ex.choice)
        })
        .count();
    Some(hits as f64 / examples.len() as f64)
}

/// Feature strings describing a context payload.
///
/// Strings yield themselves, arrays one feature per element, objects one
/// `key=value` feature per entry; other values their canonical key.
pub(crate) fn context_features(context: Option<&Value>) -> Vec<String> {
    match context {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().map(value_key).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, value_key(v)))
            .collect(),
        Some(other) => vec![value_key(other)],
    }
}

/// A trained model together with the identity of the site it serves
pub struct SiteModel {
    pub info: OpInfo,
    pub model: Box<dyn OpModel>,
}

/// Models keyed by site id
#[derive(Default)]
pub struct ModelBundle {
    sites: BTreeMap<Sid, SiteModel>,
}

impl ModelBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a model to the site described by `info`, replacing any previous one.
    pub fn insert(&mut self, info: OpInfo, model: Box<dyn OpModel>) -> Option<SiteModel> {
        self.sites.insert(info.sid(), SiteModel { info, model })
    }

    pub fn get(&self, sid: &Sid) -> Option<&dyn OpModel> {
        self.sites.get(sid).map(|site| site.model.as_ref())
    }

    pub fn site(&self, sid: &Sid) -> Option<&SiteModel> {
        self.sites.get(sid)
    }

    pub fn remove(&mut self, sid: &Sid) -> Option<SiteModel> {
        self.sites.remove(sid)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sids(&self) -> impl Iterator<Item = &Sid> {
        self.sites.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sid, &SiteModel)> {
        self.sites.iter()
    }

    /// Rank `domain` with the model for `sid`; `None` when the site has no model.
    pub fn infer(&self, sid: &Sid, domain: &[Value], context: Option<&Value>) -> Option<Vec<usize>> {
        self.get(sid).map(|model| model.infer(domain, context))
    }
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.sites.iter().map(|(sid, site)| (sid, site.model.kind())))
            .finish()
    }
}
