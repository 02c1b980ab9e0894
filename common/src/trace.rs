//! Download defaults derived from a Jaeger trace document.
//!
//! Accepts both the query API envelope (`{"data": [trace, ...]}`) and a bare
//! trace object. Span timestamps in the document are microseconds.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    caps,
    types::{
        ValidationError,
        project::{DeploymentId, ProjectId},
        time::{Millis, TimeRange},
    },
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(rename = "traceID", default)]
    pub trace_id: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Kept in document order, which decides the project and deployment order.
    #[serde(default)]
    pub processes: IndexMap<String, Process>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_time: u64,
    #[serde(default)]
    pub duration: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Tag {
    fn non_empty_str(&self) -> Option<&str> {
        self.value.as_str().filter(|v| !v.trim().is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceDocument {
    Envelope { data: Vec<Trace> },
    Single(Trace),
}

/// Parses a trace document and picks one trace out of it.
///
/// With `trace_id` set the matching trace is returned, otherwise the first.
pub fn parse_trace(json: &[u8], trace_id: Option<&str>) -> Result<Trace, ValidationError> {
    let document: TraceDocument = serde_json::from_slice(json)
        .map_err(|e| ValidationError(format!("Invalid trace document: {e}")))?;
    let traces = match document {
        TraceDocument::Envelope { data } => data,
        TraceDocument::Single(trace) => vec![trace],
    };

    match trace_id {
        Some(id) => traces
            .into_iter()
            .find(|trace| trace.trace_id.eq_ignore_ascii_case(id))
            .ok_or_else(|| ValidationError(format!("Trace '{id}' not found in document"))),
        None => traces
            .into_iter()
            .next()
            .ok_or_else(|| "Trace document contains no traces".into()),
    }
}

/// Everything a trace tells us about which logs to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLogContext {
    pub project_id: Option<ProjectId>,
    pub deployment_ids: Vec<DeploymentId>,
    pub range: Option<TimeRange>,
}

impl From<&Trace> for TraceLogContext {
    fn from(trace: &Trace) -> Self {
        let mut project_id = None;
        let mut deployment_ids: Vec<DeploymentId> = Vec::new();

        for tag in trace.processes.values().flat_map(|p| p.tags.iter()) {
            let Some(value) = tag.non_empty_str() else {
                continue;
            };
            match tag.key.as_str() {
                caps::PROJECT_ID_TAG => {
                    if let Ok(id) = value.parse() {
                        project_id = Some(id);
                    }
                }
                caps::DEPLOYMENT_ID_TAG => {
                    if let Ok(id) = value.parse::<DeploymentId>()
                        && !deployment_ids.contains(&id)
                    {
                        deployment_ids.push(id);
                    }
                }
                _ => {}
            }
        }

        Self {
            project_id,
            deployment_ids,
            range: trace_range(trace),
        }
    }
}

fn trace_range(trace: &Trace) -> Option<TimeRange> {
    let start_micros = trace.spans.iter().map(|s| s.start_time).min()?;
    let end_micros = trace
        .spans
        .iter()
        .map(|s| s.start_time.saturating_add(s.duration))
        .max()?;

    let start: Millis = start_micros / 1000;
    let end: Millis = end_micros.div_ceil(1000).max(start + 1);
    TimeRange::new(start, end).ok()
}
