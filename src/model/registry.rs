//! Model registry: kind name -> constructor and decoder.

use crate::error::ModelError;
use crate::model::frequency::{FrequencyModel, FREQUENCY_KIND};
use crate::model::perceptron::{PerceptronModel, PERCEPTRON_KIND};
use crate::model::OpModel;
use std::collections::HashMap;

pub type CreateFn = fn() -> Box<dyn OpModel>;
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn OpModel>, ModelError>;

#[derive(Clone, Copy)]
struct ModelEntry {
    create: CreateFn,
    decode: DecodeFn,
}

/// Registry of model families known to the trainer and the archive
#[derive(Clone)]
pub struct ModelRegistry {
    kinds: HashMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Registry with the built-in frequency and perceptron models
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            FREQUENCY_KIND,
            || Box::new(FrequencyModel::new()),
            |bytes| Ok(Box::new(FrequencyModel::decode(bytes)?)),
        );
        registry.register(
            PERCEPTRON_KIND,
            || Box::new(PerceptronModel::new()),
            |bytes| Ok(Box::new(PerceptronModel::decode(bytes)?)),
        );
        registry
    }

    /// Register a model family, replacing any previous entry for `kind`
    pub fn register(&mut self, kind: impl Into<String>, create: CreateFn, decode: DecodeFn) {
        self.kinds.insert(kind.into(), ModelEntry { create, decode });
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Create a fresh, untrained model of `kind`
    pub fn create(&self, kind: &str) -> Result<Box<dyn OpModel>, ModelError> {
        self.kinds
            .get(kind)
            .map(|entry| (entry.create)())
            .ok_or_else(|| ModelError::UnknownKind(kind.to_string()))
    }

    /// Decode a model of `kind` from its encoded bytes
    pub fn decode(&self, kind: &str, bytes: &[u8]) -> Result<Box<dyn OpModel>, ModelError> {
        let entry = self
            .kinds
            .get(kind)
            .ok_or_else(|| ModelError::UnknownKind(kind.to_string()))?;
        (entry.decode)(bytes)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
