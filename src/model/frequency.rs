//! Frequency model: ranks candidates by how often they were chosen,
//! first under the current context features, then overall.

use crate::error::ModelError;
use crate::model::{context_features, top1_accuracy, OpExample, OpModel, TrainReport};
use crate::op::value::{value_key, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FREQUENCY_KIND: &str = "frequency";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyModel {
    totals: BTreeMap<String, u64>,
    by_context: BTreeMap<String, BTreeMap<String, u64>>,
}

impl FrequencyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ModelError> {
        bincode::deserialize(bytes).map_err(|e| ModelError::Decode(e.to_string()))
    }

    fn score(&self, candidate: &str, features: &[String]) -> (u64, u64) {
        let contextual = features
            .iter()
            .filter_map(|f| self.by_context.get(f))
            .filter_map(|counts| counts.get(candidate))
            .sum();
        let total = self.totals.get(candidate).copied().unwrap_or(0);
        (contextual, total)
    }
}

impl OpModel for FrequencyModel {
    fn kind(&self) -> &str {
        FREQUENCY_KIND
    }

    fn infer(&self, domain: &[Value], context: Option<&Value>) -> Vec<usize> {
        let features = context_features(context);
        let mut scored: Vec<(usize, (u64, u64))> = domain
            .iter()
            .enumerate()
            .map(|(i, v)| (i, self.score(&value_key(v), &features)))
            .collect();
        // Stable: equal scores keep domain order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(i, _)| i).collect()
    }

    /// Counting needs a single pass; `num_epochs` only gates whether training happens.
    fn train(
        &mut self,
        examples: &[OpExample],
        validation: &[OpExample],
        num_epochs: usize,
    ) -> Result<TrainReport, ModelError> {
        if num_epochs > 0 {
            for example in examples {
                let key = value_key(&example.choice);
                *self.totals.entry(key.clone()).or_insert(0) += 1;
                for feature in context_features(example.context.as_ref()) {
                    *self
                        .by_context
                        .entry(feature)
                        .or_default()
                        .entry(key.clone())
                        .or_insert(0) += 1;
                }
            }
        }

        Ok(TrainReport {
            examples: examples.len(),
            epochs_run: num_epochs.min(1),
            train_accuracy: top1_accuracy(&*self, examples),
            validation_accuracy: top1_accuracy(&*self, validation),
        })
    }

    fn encode(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serialize(self).map_err(|e| ModelError::Encode(e.to_string()))
    }
}
