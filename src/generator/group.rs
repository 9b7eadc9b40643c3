//! Generator groups
//!
//! Generators that join the same [`GeneratorGroup`] share one default model
//! cell: installing a bundle through the group or through any member is seen
//! by every member on its next search. Each member keeps its own name, so a
//! single bundle can carry models for the sites of all members.

use crate::model::ModelBundle;
use parking_lot::RwLock;
use std::sync::Arc;

pub(crate) type ModelCell = Arc<RwLock<Arc<ModelBundle>>>;

pub(crate) fn new_model_cell() -> ModelCell {
    Arc::new(RwLock::new(Arc::new(ModelBundle::new())))
}

/// Named set of generators sharing a default model bundle
#[derive(Debug, Clone)]
pub struct GeneratorGroup {
    name: String,
    default_model: ModelCell,
}

impl GeneratorGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_model: new_model_cell(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the bundle for every member.
    pub fn set_default_model(&self, bundle: impl Into<Arc<ModelBundle>>) {
        *self.default_model.write() = bundle.into();
    }

    pub fn default_model(&self) -> Arc<ModelBundle> {
        self.default_model.read().clone()
    }

    pub(crate) fn model_cell(&self) -> ModelCell {
        Arc::clone(&self.default_model)
    }
}
