//! Operator runtime
//!
//! `Ops` is the handle a generator body receives for one run. Every choice
//! point goes through [`Ops::select`] / [`Ops::select_with`], which consult the
//! resolved strategy (exhaustive, replay, model-guided, randomized) and the
//! backtracking stack, and record an `OpTrace` when tracing is on.

use crate::env::{ReplayCursor, Strategy};
use crate::error::OpError;
use crate::generator::search::ChoiceStack;
use crate::model::ModelBundle;
use crate::op::info::{SiteResolver, Sid};
use crate::op::trace::{OpTrace, TraceRecorder};
use crate::op::value::{to_value, value_key, Value};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::panic::Location;
use tracing::warn;

/// Operator type of [`Ops::select`]
pub const SELECT: &str = "Select";

/// Per-call options for [`Ops::select_with`]
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub uid: Option<String>,
    pub group: Option<String>,
    pub tags: Vec<String>,
    /// Opaque payload stored in the trace and passed to the site model
    pub context: Option<Value>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn context(mut self, context: impl Into<Value>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Choice-point handle for one run of a generator body
pub struct Ops<'s> {
    resolver: &'s mut SiteResolver,
    stack: &'s mut ChoiceStack,
    strategy: &'s Strategy,
    sampler: Option<&'s mut ChaCha8Rng>,
    replay: Option<ReplayCursor>,
    recorder: Option<TraceRecorder>,
    depth: usize,
    max_depth: usize,
}

impl<'s> Ops<'s> {
    pub(crate) fn new(
        resolver: &'s mut SiteResolver,
        stack: &'s mut ChoiceStack,
        strategy: &'s Strategy,
        sampler: Option<&'s mut ChaCha8Rng>,
        tracing: bool,
        max_depth: usize,
    ) -> Self {
        resolver.begin_run();
        let replay = match strategy {
            Strategy::Replay(map) => Some(ReplayCursor::new(map)),
            _ => None,
        };
        Self {
            resolver,
            stack,
            strategy,
            sampler,
            replay,
            recorder: tracing.then(TraceRecorder::new),
            depth: 0,
            max_depth,
        }
    }

    /// Choose one element of `domain`.
    ///
    /// `uid` gives the site a stable, caller-chosen identity (and replay key);
    /// without it the site is identified by its call index.
    #[track_caller]
    pub fn select<T, I>(&mut self, domain: I, uid: Option<&str>) -> Result<T, OpError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let mut options = SelectOptions::new();
        options.uid = uid.map(str::to_string);
        self.select_with(domain, options)
    }

    #[track_caller]
    pub fn select_with<T, I>(&mut self, domain: I, options: SelectOptions) -> Result<T, OpError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let location = Location::caller();
        let mut domain: Vec<T> = domain.into_iter().collect();
        let SelectOptions {
            uid,
            group,
            tags,
            context,
        } = options;

        let info = self
            .resolver
            .resolve(SELECT, uid.as_deref(), group, tags, location)?;
        let sid = info.sid();

        if domain.is_empty() {
            return Err(OpError::EmptyDomain(sid));
        }
        if self.depth >= self.max_depth {
            return Err(OpError::DepthLimit(self.max_depth));
        }

        // Erased values are only needed when something inspects them.
        let needs_values = self.recorder.is_some()
            || matches!(self.strategy, Strategy::Replay(_) | Strategy::ModelGuided(_));
        let values = if needs_values {
            domain.iter().map(to_value).collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let (index, offered) = if let Some(cursor) = self.replay.as_mut() {
            let key = info.site_key();
            let wanted = cursor
                .pop(&key)
                .ok_or_else(|| OpError::ReplayUnderflow(key.clone()))?;
            let index = values.iter().position(|v| *v == wanted).ok_or_else(|| {
                OpError::ReplayMismatch {
                    site_key: key,
                    value: value_key(&wanted),
                }
            })?;
            (index, None)
        } else if let Some(rng) = self.sampler.as_deref_mut() {
            (rng.gen_range(0..domain.len()), None)
        } else {
            let bundle = match self.strategy {
                Strategy::ModelGuided(bundle) => Some(bundle.as_ref()),
                _ => None,
            };
            let domain_len = domain.len();
            let frame = self.stack.visit(self.depth, &sid, domain_len, || {
                enumeration_order(bundle, &sid, &values, context.as_ref(), domain_len)
            })?;
            (frame.current(), Some(frame.order().to_vec()))
        };
        self.depth += 1;

        if let Some(recorder) = self.recorder.as_mut() {
            let offered_domain = match offered {
                Some(order) => order.iter().map(|&i| values[i].clone()).collect(),
                None => values.clone(),
            };
            recorder.record(OpTrace {
                op_info: info,
                domain: offered_domain,
                choice: values[index].clone(),
                context,
            });
        }

        Ok(domain.swap_remove(index))
    }

    /// Prune the current path unless `condition` holds.
    pub fn require(&self, condition: bool, reason: impl Into<String>) -> Result<(), OpError> {
        if condition {
            Ok(())
        } else {
            Err(OpError::Rejected(reason.into()))
        }
    }

    /// Number of choices made so far on this run.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn finish(self) -> (usize, Option<TraceRecorder>) {
        (self.depth, self.recorder)
    }
}

/// Enumeration order for a freshly visited site.
///
/// Without a model for `sid` this is domain order. With one, the model's
/// ranking comes first and any domain members it left out follow in domain
/// order, so ranking never shrinks the enumerated set.
pub(crate) fn enumeration_order(
    bundle: Option<&ModelBundle>,
    sid: &Sid,
    values: &[Value],
    context: Option<&Value>,
    domain_len: usize,
) -> Vec<usize> {
    let Some(model) = bundle.and_then(|b| b.get(sid)) else {
        return (0..domain_len).collect();
    };

    let mut seen = vec![false; domain_len];
    let mut order = Vec::with_capacity(domain_len);
    let mut ignored = 0usize;
    for index in model.infer(values, context) {
        if index < domain_len && !seen[index] {
            seen[index] = true;
            order.push(index);
        } else {
            ignored += 1;
        }
    }
    if ignored > 0 {
        warn!(
            sid = %sid,
            kind = model.kind(),
            ignored,
            "Model returned out-of-range or duplicate indices"
        );
    }
    order.extend((0..domain_len).filter(|&i| !seen[i]));
    order
}
