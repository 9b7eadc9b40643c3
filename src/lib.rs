//! choicepoint: generator execution and search with learned choice points
//!
//! A generator body declares choice points through [`op::Ops`]. The engine
//! runs it exhaustively, samples it with a seed, replays recorded choices, or
//! lets per-site models rank each domain; traced runs train one independent
//! model per site, and trained bundles persist as archives.

pub mod archive;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod op;

pub use archive::{restore_model, restore_model_with, save_model, ArchiveConfig};
pub use env::{Env, EnvOverrides, ReplayMap, SearchMode};
pub use error::{ArchiveError, ConfigError, ModelError, OpError};
pub use generator::search::SearchConfig;
pub use generator::group::GeneratorGroup;
pub use generator::{Generated, Generator, GeneratorView, Search};
pub use model::{ModelBundle, ModelRegistry, OpExample, OpModel, TrainReport, Trainer, TrainerConfig};
pub use op::{GeneratorTrace, OpInfo, OpTrace, Ops, SelectOptions, Sid, Value};
