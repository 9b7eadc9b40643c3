//! Error types for the choicepoint generator engine.

use crate::op::Sid;
use thiserror::Error;

/// Errors raised while driving a generator body.
///
/// Variants split into two classes (see [`OpError::is_fatal`]): path-local
/// failures prune the current execution path and let the search backtrack,
/// fatal failures end the whole `generate`/`call` invocation.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("Identity conflict: uid '{uid}' declared at {first} and at {second}")]
    IdentityConflict {
        uid: String,
        first: String,
        second: String,
    },

    #[error("Empty domain at site {0}")]
    EmptyDomain(Sid),

    #[error("Replay underflow: no value left for site '{0}'")]
    ReplayUnderflow(String),

    #[error("Replay mismatch at site '{site_key}': {value} is not in the offered domain")]
    ReplayMismatch { site_key: String, value: String },

    #[error("Search diverged at depth {depth}: expected site {expected}, reached {found}")]
    Divergence {
        depth: usize,
        expected: Sid,
        found: Sid,
    },

    #[error("Domain at site {sid} changed size on re-execution: {expected} before, {found} now")]
    DomainChanged {
        sid: Sid,
        expected: usize,
        found: usize,
    },

    #[error("Choice depth limit {0} exceeded")]
    DepthLimit(usize),

    #[error("Value serialization failed: {0}")]
    Value(String),

    #[error("Path rejected: {0}")]
    Rejected(String),

    #[error("Generator '{0}' produced no successful path")]
    NoSuccessfulPath(String),

    #[error("Generator body failed: {0}")]
    Body(Box<dyn std::error::Error + Send + Sync>),
}

impl OpError {
    /// Wrap an arbitrary error raised inside a generator body.
    pub fn body<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        OpError::Body(err.into())
    }

    /// Whether this error ends the whole invocation instead of one path.
    pub fn is_fatal(&self) -> bool {
        match self {
            OpError::EmptyDomain(_)
            | OpError::Rejected(_)
            | OpError::DepthLimit(_)
            | OpError::Body(_) => false,
            OpError::IdentityConflict { .. }
            | OpError::ReplayUnderflow(_)
            | OpError::ReplayMismatch { .. }
            | OpError::Divergence { .. }
            | OpError::DomainChanged { .. }
            | OpError::Value(_)
            | OpError::NoSuccessfulPath(_) => true,
        }
    }
}

impl From<serde_json::Error> for OpError {
    fn from(err: serde_json::Error) -> Self {
        OpError::Value(err.to_string())
    }
}

/// Errors raised by per-site models and the trainer
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Training failed for site {sid}: {message}")]
    TrainingFailed { sid: String, message: String },

    #[error("Model encoding failed: {0}")]
    Encode(String),

    #[error("Model decoding failed: {0}")]
    Decode(String),

    #[error("Unknown model kind: {0}")]
    UnknownKind(String),
}

/// Model archive errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Incompatible archive: format version {found}, runtime supports {expected}")]
    IncompatibleArchive { found: u32, expected: u32 },

    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Unknown model kind '{kind}' for site {sid}")]
    UnknownModelKind { sid: String, kind: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Archive I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Configuration validation failed:\n{0}")]
    Validation(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
