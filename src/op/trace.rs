//! Trace recording
//!
//! Every choice made on a completed run is captured as an `OpTrace`; the run's
//! traces are aggregated into a `GeneratorTrace` once the body returns.

use crate::env::ReplayMap;
use crate::op::info::OpInfo;
use crate::op::value::Value;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// One recorded choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpTrace {
    pub op_info: OpInfo,
    /// Candidates in the order they were offered (post-ranking under model guidance)
    pub domain: Vec<Value>,
    pub choice: Value,
    #[serde(default)]
    pub context: Option<Value>,
}

/// All choices of one completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorTrace {
    /// Serialized generator arguments
    pub inputs: Value,
    pub op_traces: Vec<OpTrace>,
}

impl GeneratorTrace {
    /// Chosen values in call order.
    pub fn choices(&self) -> impl Iterator<Item = &Value> {
        self.op_traces.iter().map(|t| &t.choice)
    }

    /// Replay map that forces a run down exactly this trace's path.
    pub fn replay_map(&self) -> ReplayMap {
        let mut map = ReplayMap::new();
        for op_trace in &self.op_traces {
            map.push_value(op_trace.op_info.site_key(), op_trace.choice.clone());
        }
        map
    }
}

/// Per-run recorder, owned by the operator runtime for one execution
#[derive(Debug, Default)]
pub(crate) struct TraceRecorder {
    op_traces: Vec<OpTrace>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op_trace: OpTrace) {
        self.op_traces.push(op_trace);
    }

    pub fn finish(self, inputs: Value) -> GeneratorTrace {
        GeneratorTrace {
            inputs,
            op_traces: self.op_traces,
        }
    }
}

/// Write traces as JSON lines, one `GeneratorTrace` per line.
pub fn write_traces_jsonl<P: AsRef<Path>>(path: P, traces: &[GeneratorTrace]) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    for trace in traces {
        let line = serde_json::to_string(trace).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize trace: {}", e),
            )
        })?;
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Read traces written by [`write_traces_jsonl`]. Blank lines are skipped.
pub fn read_traces_jsonl<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<GeneratorTrace>> {
    let path = path.as_ref();
    let reader = BufReader::new(fs::File::open(path)?);
    let mut traces = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let trace: GeneratorTrace = serde_json::from_str(&line).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid trace at {:?}:{}: {}", path, line_no + 1, e),
            )
        })?;
        traces.push(trace);
    }
    Ok(traces)
}
