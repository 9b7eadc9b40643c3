//! Execution environment
//!
//! An `Env` is the immutable configuration of one invocation: whether choices
//! are traced, which values to replay, which model bundle ranks domains,
//! which search mode applies and the seed for randomized sampling. New environments are derived with
//! [`Env::reconfigure`]; nothing here is ever mutated in place.

use crate::error::OpError;
use crate::model::ModelBundle;
use crate::op::value::{to_value, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// How operators pick values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Replay when a replay map is present, model-guided when a non-empty
    /// bundle is attached, exhaustive otherwise.
    #[default]
    Auto,
    Exhaustive,
    Replay,
    ModelGuided,
    /// Sample one path per pull, picking uniformly at every site from a
    /// generator seeded with the environment's seed. Never chosen by `Auto`.
    Randomized,
}

/// Per-site replay values keyed by site key (uid or `{op_type}@{call_index}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplayMap(BTreeMap<String, Vec<Value>>);

impl ReplayMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form: register the values for a site, serializing each one.
    pub fn with<T, I>(mut self, site_key: impl Into<String>, values: I) -> Result<Self, OpError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let values = values
            .into_iter()
            .map(|v| to_value(&v))
            .collect::<Result<Vec<_>, _>>()?;
        self.0.insert(site_key.into(), values);
        Ok(self)
    }

    /// Append one value to a site's list.
    pub fn push_value(&mut self, site_key: impl Into<String>, value: Value) {
        self.0.entry(site_key.into()).or_default().push(value);
    }

    pub fn get(&self, site_key: &str) -> Option<&[Value]> {
        self.0.get(site_key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Value>)> {
        self.0.iter()
    }
}

/// FIFO consumption state of a replay map within one run
#[derive(Debug)]
pub(crate) struct ReplayCursor {
    queues: HashMap<String, VecDeque<Value>>,
}

impl ReplayCursor {
    pub fn new(map: &ReplayMap) -> Self {
        Self {
            queues: map
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                .collect(),
        }
    }

    pub fn pop(&mut self, site_key: &str) -> Option<Value> {
        self.queues.get_mut(site_key).and_then(VecDeque::pop_front)
    }
}

/// Run configuration
#[derive(Debug, Clone, Default)]
pub struct Env {
    tracing: bool,
    replay: ReplayMap,
    model: Option<Arc<ModelBundle>>,
    search_mode: SearchMode,
    seed: u64,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracing(&self) -> bool {
        self.tracing
    }

    pub fn replay(&self) -> &ReplayMap {
        &self.replay
    }

    /// Per-run model override; `None` defers to the generator's default bundle.
    pub fn model(&self) -> Option<&Arc<ModelBundle>> {
        self.model.as_ref()
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive a new environment with the given overrides applied.
    pub fn reconfigure(&self, overrides: &EnvOverrides) -> Env {
        Env {
            tracing: overrides.tracing.unwrap_or(self.tracing),
            replay: overrides
                .replay
                .clone()
                .unwrap_or_else(|| self.replay.clone()),
            model: overrides.model.clone().or_else(|| self.model.clone()),
            search_mode: overrides.search_mode.unwrap_or(self.search_mode),
            seed: overrides.seed.unwrap_or(self.seed),
        }
    }

    /// Fix the strategy for one invocation, snapshotting the default bundle.
    pub(crate) fn resolve(&self, default_model: Arc<ModelBundle>) -> Strategy {
        let bundle = self.model.clone().unwrap_or(default_model);
        match self.search_mode {
            SearchMode::Exhaustive => Strategy::Exhaustive,
            SearchMode::Replay => Strategy::Replay(self.replay.clone()),
            SearchMode::ModelGuided => Strategy::ModelGuided(bundle),
            SearchMode::Randomized => Strategy::Randomized(self.seed),
            SearchMode::Auto if !self.replay.is_empty() => Strategy::Replay(self.replay.clone()),
            SearchMode::Auto if !bundle.is_empty() => Strategy::ModelGuided(bundle),
            SearchMode::Auto => Strategy::Exhaustive,
        }
    }
}

/// Overrides applied by `with_env`; unset fields keep the base value
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    tracing: Option<bool>,
    replay: Option<ReplayMap>,
    model: Option<Arc<ModelBundle>>,
    search_mode: Option<SearchMode>,
    seed: Option<u64>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracing(mut self, tracing: bool) -> Self {
        self.tracing = Some(tracing);
        self
    }

    pub fn replay(mut self, replay: ReplayMap) -> Self {
        self.replay = Some(replay);
        self
    }

    pub fn model(mut self, bundle: impl Into<Arc<ModelBundle>>) -> Self {
        self.model = Some(bundle.into());
        self
    }

    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = Some(mode);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Strategy resolved for one invocation
#[derive(Debug)]
pub(crate) enum Strategy {
    Exhaustive,
    Replay(ReplayMap),
    ModelGuided(Arc<ModelBundle>),
    /// Seed of the sampling generator
    Randomized(u64),
}

impl Strategy {
    pub fn is_replay(&self) -> bool {
        matches!(self, Strategy::Replay(_))
    }

    pub fn is_randomized(&self) -> bool {
        matches!(self, Strategy::Randomized(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Exhaustive => "exhaustive",
            Strategy::Replay(_) => "replay",
            Strategy::ModelGuided(_) => "model_guided",
            Strategy::Randomized(_) => "randomized",
        }
    }
}
