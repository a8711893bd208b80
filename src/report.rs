// src/report.rs - wire-shape response for the visualization client
//
// The JSON boundary contract: a success flag, a per-canal mapping keyed by
// canal name to {variables, segments}, optional human-readable messages,
// and an optional error string on failure. Point objects use x/y/z keys.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::canal::CanalError;
use crate::path::{CanalResult, ToolPathSegment};

#[derive(Debug, Serialize)]
pub struct PlotResponse {
    pub success: bool,
    pub canals: BTreeMap<String, CanalPlot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CanalPlot {
    pub variables: BTreeMap<String, f64>,
    pub segments: Vec<ToolPathSegment>,
    /// Total machining time in seconds.
    pub duration: f64,
}

impl PlotResponse {
    pub fn from_results(results: Vec<Result<CanalResult, CanalError>>) -> Self {
        let mut canals = BTreeMap::new();
        let mut messages = Vec::new();
        let mut error = None;
        for result in results {
            match result {
                Ok(canal) => {
                    for diag in &canal.diagnostics {
                        messages.push(format!("{}: {diag}", canal.name));
                    }
                    canals.insert(
                        canal.name,
                        CanalPlot {
                            variables: canal.variables,
                            segments: canal.segments,
                            duration: canal.duration,
                        },
                    );
                }
                Err(err) => {
                    if error.is_none() {
                        error = Some(err.to_string());
                    } else {
                        messages.push(err.to_string());
                    }
                }
            }
        }
        PlotResponse { success: error.is_none(), canals, messages, error }
    }
}
