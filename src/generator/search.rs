//! Depth-first backtracking state
//!
//! A search is an explicit stack of choice frames. Each run re-executes the
//! generator body from the start: frames already on the stack replay their
//! current element, the first visit of a deeper site pushes a new frame. After
//! every run the deepest frame advances to its next untried element and
//! exhausted frames are popped, so the stack never grows beyond the number of
//! choice points on the current path.

use crate::error::OpError;
use crate::op::Sid;
use serde::{Deserialize, Serialize};

fn default_max_depth() -> usize {
    4096
}

fn default_max_sample_retries() -> usize {
    1024
}

/// Search limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of choice points on one path; deeper paths are pruned
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Randomized mode ends after this many pruned samples in a row
    #[serde(default = "default_max_sample_retries")]
    pub max_sample_retries: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_sample_retries: default_max_sample_retries(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".to_string());
        }
        if self.max_sample_retries == 0 {
            return Err("max_sample_retries must be at least 1".to_string());
        }
        Ok(())
    }
}

/// One suspended choice point
#[derive(Debug, Clone)]
pub(crate) struct ChoiceFrame {
    sid: Sid,
    domain_len: usize,
    /// Domain indices in enumeration order
    order: Vec<usize>,
    next: usize,
}

impl ChoiceFrame {
    /// Domain index of the element this frame currently selects.
    pub fn current(&self) -> usize {
        self.order[self.next]
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChoiceStack {
    frames: Vec<ChoiceFrame>,
}

impl ChoiceStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Visit the choice point at `depth`.
    ///
    /// Reuses the existing frame when the path prefix already reached this
    /// depth, otherwise pushes a frame whose enumeration order is produced by
    /// `order`. `order` must return a permutation of `0..domain_len`.
    ///
    /// A reused frame must see the same site with a domain of the same size.
    pub fn visit<F>(
        &mut self,
        depth: usize,
        sid: &Sid,
        domain_len: usize,
        order: F,
    ) -> Result<&ChoiceFrame, OpError>
    where
        F: FnOnce() -> Vec<usize>,
    {
        if depth < self.frames.len() {
            let frame = &self.frames[depth];
            if &frame.sid != sid {
                return Err(OpError::Divergence {
                    depth,
                    expected: frame.sid.clone(),
                    found: sid.clone(),
                });
            }
            if frame.domain_len != domain_len {
                return Err(OpError::DomainChanged {
                    sid: sid.clone(),
                    expected: frame.domain_len,
                    found: domain_len,
                });
            }
        } else {
            self.frames.truncate(depth);
            self.frames.push(ChoiceFrame {
                sid: sid.clone(),
                domain_len,
                order: order(),
                next: 0,
            });
        }
        Ok(&self.frames[depth])
    }

    /// Drop frames the last run did not reach.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Move to the next untried path. Returns `false` once the space is exhausted.
    pub fn advance(&mut self) -> bool {
        while let Some(top) = self.frames.last_mut() {
            top.next += 1;
            if top.next < top.order.len() {
                return true;
            }
            self.frames.pop();
        }
        false
    }
}
