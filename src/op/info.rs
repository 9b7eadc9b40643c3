//! Site identity for choice points
//!
//! A site id (`Sid`) is derived from the generator name, the operator type and
//! either the caller-supplied uid or the 1-based call index of the operator.
//! It never depends on run-time values, so the same structural position maps to
//! the same id across runs with different inputs.

use crate::error::OpError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;

/// Stable structural identity of a choice point
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sid(String);

impl Sid {
    /// Derive the id for a site.
    ///
    /// Format: `{generator}::{op_type}::{uid}` when a uid is declared,
    /// `{generator}::{op_type}::#{call_index}` otherwise.
    pub fn derive(generator_name: &str, op_type: &str, uid: Option<&str>, call_index: usize) -> Self {
        match uid {
            Some(uid) => Sid(format!("{}::{}::{}", generator_name, op_type, uid)),
            None => Sid(format!("{}::{}::#{}", generator_name, op_type, call_index)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sid {
    fn from(value: &str) -> Self {
        Sid(value.to_string())
    }
}

impl From<String> for Sid {
    fn from(value: String) -> Self {
        Sid(value)
    }
}

/// Identity of one choice-point occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpInfo {
    pub generator_name: String,
    pub op_type: String,
    /// 1-based ordinal, counted per uid when present, else per op type
    pub call_index: usize,
    pub group: Option<String>,
    pub uid: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OpInfo {
    pub fn sid(&self) -> Sid {
        Sid::derive(
            &self.generator_name,
            &self.op_type,
            self.uid.as_deref(),
            self.call_index,
        )
    }

    /// Key used to address this site in a replay map.
    ///
    /// The uid when declared, otherwise `{op_type}@{call_index}` (e.g. `Select@2`).
    pub fn site_key(&self) -> String {
        match &self.uid {
            Some(uid) => uid.clone(),
            None => format!("{}@{}", self.op_type, self.call_index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CounterKey {
    Uid(String),
    OpType(String),
}

#[derive(Debug, Clone)]
struct DeclaredSite {
    op_type: String,
    location: String,
}

/// Resolves `OpInfo` for every operator call of one generator.
///
/// Call counters reset at the start of each run; uid declarations persist for
/// the lifetime of the resolver so that conflicting declarations are caught
/// even when they are reached on different search paths.
#[derive(Debug)]
pub(crate) struct SiteResolver {
    generator_name: String,
    default_group: Option<String>,
    counters: HashMap<CounterKey, usize>,
    declared: HashMap<String, DeclaredSite>,
}

impl SiteResolver {
    pub fn new(generator_name: impl Into<String>) -> Self {
        Self {
            generator_name: generator_name.into(),
            default_group: None,
            counters: HashMap::new(),
            declared: HashMap::new(),
        }
    }

    /// Group recorded for sites that do not name their own.
    pub fn with_default_group(mut self, group: Option<String>) -> Self {
        self.default_group = group;
        self
    }

    pub fn begin_run(&mut self) {
        self.counters.clear();
    }

    pub fn resolve(
        &mut self,
        op_type: &str,
        uid: Option<&str>,
        group: Option<String>,
        tags: Vec<String>,
        location: &'static Location<'static>,
    ) -> Result<OpInfo, OpError> {
        if let Some(uid) = uid {
            self.check_declaration(uid, op_type, location)?;
        }

        let key = match uid {
            Some(uid) => CounterKey::Uid(uid.to_string()),
            None => CounterKey::OpType(op_type.to_string()),
        };
        let counter = self.counters.entry(key).or_insert(0);
        *counter += 1;

        Ok(OpInfo {
            generator_name: self.generator_name.clone(),
            op_type: op_type.to_string(),
            call_index: *counter,
            group: group.or_else(|| self.default_group.clone()),
            uid: uid.map(str::to_string),
            tags,
        })
    }

    fn check_declaration(
        &mut self,
        uid: &str,
        op_type: &str,
        location: &'static Location<'static>,
    ) -> Result<(), OpError> {
        let location = location.to_string();
        match self.declared.get(uid) {
            Some(site) if site.location != location || site.op_type != op_type => {
                Err(OpError::IdentityConflict {
                    uid: uid.to_string(),
                    first: format!("{} ({})", site.location, site.op_type),
                    second: format!("{} ({})", location, op_type),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.declared.insert(
                    uid.to_string(),
                    DeclaredSite {
                        op_type: op_type.to_string(),
                        location,
                    },
                );
                Ok(())
            }
        }
    }
}
