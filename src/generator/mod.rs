//! Generator engine
//!
//! A [`Generator`] wraps a body that makes choices through [`Ops`]. Running it
//! yields a lazy, depth-first sequence of outputs: one per successful path
//! through the choice points, in enumeration order. Nothing is executed until
//! the consumer pulls the next item. In randomized mode every pull instead
//! samples one path with uniform picks from a seeded generator.

pub mod group;
pub mod search;

use crate::env::{Env, EnvOverrides, Strategy};
use crate::error::OpError;
use crate::model::ModelBundle;
use crate::op::info::SiteResolver;
use crate::op::runtime::Ops;
use crate::op::trace::GeneratorTrace;
use crate::op::value::{to_value, Value};
use group::{new_model_cell, GeneratorGroup, ModelCell};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use search::{ChoiceStack, SearchConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Body<A, O> = dyn Fn(&mut Ops<'_>, &A) -> Result<O, OpError> + Send + Sync;

/// A nondeterministic function with named choice points
pub struct Generator<A, O> {
    name: String,
    group: Option<String>,
    metadata: BTreeMap<String, String>,
    body: Box<Body<A, O>>,
    env: Env,
    default_model: ModelCell,
    search: SearchConfig,
}

impl<A, O> Generator<A, O> {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Ops<'_>, &A) -> Result<O, OpError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            group: None,
            metadata: BTreeMap::new(),
            body: Box::new(body),
            env: Env::new(),
            default_model: new_model_cell(),
            search: SearchConfig::default(),
        }
    }

    /// Group recorded on every site that does not declare its own
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Join `group`: take its name as the default site group and share its
    /// default model with every other member.
    pub fn join(mut self, group: &GeneratorGroup) -> Self {
        self.group = Some(group.name().to_string());
        self.default_model = group.model_cell();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Replace the default bundle wholesale. Searches already running keep
    /// the bundle they started with. For a group member this replaces the
    /// bundle of the whole group.
    pub fn set_default_model(&self, bundle: impl Into<Arc<ModelBundle>>) {
        *self.default_model.write() = bundle.into();
    }

    pub fn default_model(&self) -> Arc<ModelBundle> {
        self.default_model.read().clone()
    }

    /// A view running under this generator's environment with `overrides` applied.
    pub fn with_env(&self, overrides: EnvOverrides) -> GeneratorView<'_, A, O> {
        GeneratorView {
            generator: self,
            env: self.env.reconfigure(&overrides),
        }
    }

    fn search_with(&self, env: &Env, args: A) -> Search<'_, A, O> {
        let strategy = env.resolve(self.default_model());
        let sampler = match &strategy {
            Strategy::Randomized(seed) => Some(ChaCha8Rng::seed_from_u64(*seed)),
            _ => None,
        };
        debug!(
            generator = %self.name,
            strategy = strategy.name(),
            tracing = env.tracing(),
            "Starting search"
        );
        Search {
            generator: self,
            args,
            inputs: None,
            tracing: env.tracing(),
            strategy,
            sampler,
            resolver: SiteResolver::new(self.name.clone()).with_default_group(self.group.clone()),
            stack: ChoiceStack::new(),
            state: SearchState::Running,
            runs: 0,
            outputs: 0,
            pruned_in_row: 0,
        }
    }
}

impl<A: Serialize, O> Generator<A, O> {
    /// Lazily enumerate every successful path for `args`.
    pub fn generate(&self, args: A) -> Search<'_, A, O> {
        self.search_with(&self.env, args)
    }

    /// Output and trace of the first successful path.
    pub fn call(&self, args: A) -> Result<(O, GeneratorTrace), OpError> {
        call_with(self, &self.env, args)
    }
}

impl<A, O> fmt::Debug for Generator<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("metadata", &self.metadata)
            .field("env", &self.env)
            .field("search", &self.search)
            .finish()
    }
}

fn call_with<A: Serialize, O>(
    generator: &Generator<A, O>,
    env: &Env,
    args: A,
) -> Result<(O, GeneratorTrace), OpError> {
    let env = env.reconfigure(&EnvOverrides::new().tracing(true));
    match generator.search_with(&env, args).next() {
        Some(Ok(Generated {
            output,
            trace: Some(trace),
        })) => Ok((output, trace)),
        Some(Err(err)) => Err(err),
        _ => Err(OpError::NoSuccessfulPath(generator.name.clone())),
    }
}

/// A generator bound to a derived environment
pub struct GeneratorView<'g, A, O> {
    generator: &'g Generator<A, O>,
    env: Env,
}

impl<'g, A, O> GeneratorView<'g, A, O> {
    /// Further overrides on top of this view's environment.
    pub fn with_env(&self, overrides: EnvOverrides) -> GeneratorView<'g, A, O> {
        GeneratorView {
            generator: self.generator,
            env: self.env.reconfigure(&overrides),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl<'g, A: Serialize, O> GeneratorView<'g, A, O> {
    pub fn generate(&self, args: A) -> Search<'g, A, O> {
        self.generator.search_with(&self.env, args)
    }

    pub fn call(&self, args: A) -> Result<(O, GeneratorTrace), OpError> {
        call_with(self.generator, &self.env, args)
    }
}

/// One successful path
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<O> {
    pub output: O,
    /// Present when the run was traced
    pub trace: Option<GeneratorTrace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    Running,
    Exhausted,
    Aborted,
}

/// Lazy depth-first search over a generator's paths.
///
/// Yields `Ok` for every successful path. Path-local failures are skipped; a
/// fatal failure is yielded once as `Err`, after which the search is fused.
pub struct Search<'g, A, O> {
    generator: &'g Generator<A, O>,
    args: A,
    inputs: Option<Value>,
    tracing: bool,
    strategy: Strategy,
    sampler: Option<ChaCha8Rng>,
    resolver: SiteResolver,
    stack: ChoiceStack,
    state: SearchState,
    runs: usize,
    outputs: usize,
    pruned_in_row: usize,
}

impl<'g, A: Serialize, O> Search<'g, A, O> {
    /// Outputs only, dropping traces.
    pub fn outputs(self) -> impl Iterator<Item = Result<O, OpError>> + 'g
    where
        A: 'g,
        O: 'g,
    {
        self.map(|item| item.map(|generated| generated.output))
    }

    /// Number of body executions so far, including pruned ones.
    pub fn runs(&self) -> usize {
        self.runs
    }

    fn run_once(&mut self) -> Result<Generated<O>, OpError> {
        self.runs += 1;
        let mut ops = Ops::new(
            &mut self.resolver,
            &mut self.stack,
            &self.strategy,
            self.sampler.as_mut(),
            self.tracing,
            self.generator.search.max_depth,
        );
        let result = (self.generator.body)(&mut ops, &self.args);
        let (depth, recorder) = ops.finish();
        self.stack.truncate(depth);
        let output = result?;

        let trace = match recorder {
            Some(recorder) => Some(recorder.finish(self.inputs()?)),
            None => None,
        };
        Ok(Generated { output, trace })
    }

    fn inputs(&mut self) -> Result<Value, OpError> {
        if let Some(inputs) = &self.inputs {
            return Ok(inputs.clone());
        }
        let inputs = to_value(&self.args)?;
        self.inputs = Some(inputs.clone());
        Ok(inputs)
    }
}

impl<'g, A: Serialize, O> Iterator for Search<'g, A, O> {
    type Item = Result<Generated<O>, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == SearchState::Running {
            let outcome = self.run_once();

            if let Err(err) = &outcome {
                if err.is_fatal() {
                    debug!(generator = %self.generator.name, error = %err, "Search aborted");
                    self.state = SearchState::Aborted;
                    return Some(outcome);
                }
            }

            let exhausted = if self.strategy.is_randomized() {
                self.pruned_in_row = if outcome.is_ok() { 0 } else { self.pruned_in_row + 1 };
                self.pruned_in_row >= self.generator.search.max_sample_retries
            } else {
                // replay follows a single fixed path
                self.strategy.is_replay() || !self.stack.advance()
            };
            if exhausted {
                self.state = SearchState::Exhausted;
                debug!(
                    generator = %self.generator.name,
                    runs = self.runs,
                    outputs = self.outputs + usize::from(outcome.is_ok()),
                    "Search exhausted"
                );
            }

            match outcome {
                Ok(generated) => {
                    self.outputs += 1;
                    return Some(Ok(generated));
                }
                Err(err) => {
                    debug!(generator = %self.generator.name, reason = %err, "Path pruned");
                }
            }
        }
        None
    }
}

impl<'g, A: Serialize, O> std::iter::FusedIterator for Search<'g, A, O> {}
