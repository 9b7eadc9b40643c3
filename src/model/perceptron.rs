//! Perceptron model
//!
//! Multiclass perceptron over sparse string features of each candidate: the
//! candidate itself and the candidate crossed with every context feature.
//! Scores never depend on where a candidate sits in the domain, since recorded
//! domains may already be reordered by an earlier model. Weights are integers,
//! so a decoded model scores bit-identically to the one that was encoded.

use crate::error::ModelError;
use crate::model::{context_features, top1_accuracy, OpExample, OpModel, TrainReport};
use crate::op::value::{value_key, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PERCEPTRON_KIND: &str = "perceptron";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptronModel {
    weights: BTreeMap<String, i64>,
}

fn candidate_features(candidate: &str, context: &[String]) -> Vec<String> {
    let mut features = Vec::with_capacity(context.len() + 1);
    features.push(format!("c:{}", candidate));
    for ctx in context {
        features.push(format!("c:{}|x:{}", candidate, ctx));
    }
    features
}

impl PerceptronModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ModelError> {
        bincode::deserialize(bytes).map_err(|e| ModelError::Decode(e.to_string()))
    }

    fn scores(&self, domain: &[Value], context: &[String]) -> Vec<i64> {
        domain
            .iter()
            .map(|v| {
                candidate_features(&value_key(v), context)
                    .iter()
                    .filter_map(|f| self.weights.get(f))
                    .sum()
            })
            .collect()
    }

    fn update(&mut self, domain: &[Value], context: &[String], index: usize, delta: i64) {
        let candidate = value_key(&domain[index]);
        for feature in candidate_features(&candidate, context) {
            *self.weights.entry(feature).or_insert(0) += delta;
        }
        // sparse: zero weights are dropped
        self.weights.retain(|_, w| *w != 0);
    }
}

impl OpModel for PerceptronModel {
    fn kind(&self) -> &str {
        PERCEPTRON_KIND
    }

    fn infer(&self, domain: &[Value], context: Option<&Value>) -> Vec<usize> {
        let features = context_features(context);
        let scores = self.scores(domain, &features);
        let mut order: Vec<usize> = (0..domain.len()).collect();
        order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
        order
    }

    fn train(
        &mut self,
        examples: &[OpExample],
        validation: &[OpExample],
        num_epochs: usize,
    ) -> Result<TrainReport, ModelError> {
        let labelled: Vec<(&OpExample, usize, Vec<String>)> = examples
            .iter()
            .filter_map(|ex| {
                ex.choice_index()
                    .map(|gold| (ex, gold, context_features(ex.context.as_ref())))
            })
            .collect();

        let mut epochs_run = 0;
        for _ in 0..num_epochs {
            epochs_run += 1;
            let mut mistakes = 0usize;
            for (example, gold, context) in &labelled {
                let predicted = self
                    .infer(&example.domain, example.context.as_ref())
                    .first()
                    .copied();
                match predicted {
                    Some(predicted) if predicted != *gold => {
                        mistakes += 1;
                        self.update(&example.domain, context, *gold, 1);
                        self.update(&example.domain, context, predicted, -1);
                    }
                    _ => {}
                }
            }
            if mistakes == 0 {
                break;
            }
        }

        Ok(TrainReport {
            examples: examples.len(),
            epochs_run,
            train_accuracy: top1_accuracy(&*self, examples),
            validation_accuracy: top1_accuracy(&*self, validation),
        })
    }

    fn encode(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serialize(self).map_err(|e| ModelError::Encode(e.to_string()))
    }
}
