// src/path.rs - tool-path geometry produced by the interpreter
use std::collections::BTreeMap;

use serde::Serialize;

use crate::diag::Diagnostic;
use crate::state::{Axis, AxisMap};

/// A sampled 3D point. Serializes with the wire keys `x`/`y`/`z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_axes(axes: &AxisMap) -> Self {
        Self {
            x: axes.get(Axis::X),
            y: axes.get(Axis::Y),
            z: axes.get(Axis::Z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

/// One move of the tool path. Rapid and linear moves carry exactly two
/// points (start, end); arcs carry the sampled curve from start to end
/// inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolPathSegment {
    pub kind: MoveKind,
    pub line: u32,
    pub tool: u32,
    pub points: Vec<Point>,
}

/// Everything one canal produced over a full program run.
#[derive(Debug, Clone)]
pub struct CanalResult {
    pub name: String,
    pub segments: Vec<ToolPathSegment>,
    /// Total machining time in seconds.
    pub duration: f64,
    pub variables: BTreeMap<String, f64>,
    pub diagnostics: Vec<Diagnostic>,
}
