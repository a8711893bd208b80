// src/handlers/mod.rs - command dispatch: ordered handler chain
pub mod motion;
pub mod setup;

pub use motion::MotionHandler;
pub use setup::SetupHandler;

use crate::canal::CanalError;
use crate::diag::Diagnostics;
use crate::node::CommandNode;
use crate::path::ToolPathSegment;
use crate::state::{Axis, MachineState, Modal};

/// What one handler invocation produced. Valid shapes: a segment with its
/// duration (motion), a duration alone (dwell), or neither (state-only and
/// no-op commands). A segment without a duration is a contract violation
/// and is rejected by the canal runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecOutput {
    pub segment: Option<ToolPathSegment>,
    pub duration: Option<f64>,
}

impl ExecOutput {
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn dwell(seconds: f64) -> Self {
        Self { segment: None, duration: Some(seconds) }
    }

    pub fn motion(segment: ToolPathSegment, seconds: f64) -> Self {
        Self { segment: Some(segment), duration: Some(seconds) }
    }

    pub fn is_quiet(&self) -> bool {
        self.segment.is_none() && self.duration.is_none()
    }
}

/// One link of the dispatch chain: a predicate naming the command groups it
/// owns, plus the mutation/geometry logic for them. Handlers are stateless;
/// everything persistent lives in [`MachineState`].
pub trait CommandHandler: Send {
    fn matches(&self, node: &CommandNode) -> bool;

    fn handle(
        &self,
        node: &mut CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> Result<ExecOutput, CanalError>;
}

/// Ordered dispatch over the configured handlers. The first link whose
/// predicate matches handles the node; an unmatched node falls through to
/// the quiet terminal result, so commands outside the interpreted subset
/// are absorbed rather than rejected.
pub struct HandlerChain {
    links: Vec<Box<dyn CommandHandler>>,
}

impl HandlerChain {
    pub fn new(links: Vec<Box<dyn CommandHandler>>) -> Self {
        Self { links }
    }

    pub fn dispatch(
        &self,
        node: &mut CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> Result<ExecOutput, CanalError> {
        for link in &self.links {
            if link.matches(node) {
                return link.handle(node, state, diags);
            }
        }
        tracing::debug!(line = node.line, "absorbed unmatched command: {node}");
        Ok(ExecOutput::quiet())
    }
}

/// Apply the modal G words and the standalone F/S/T words a node carries.
/// Both handler families call this first so `G90 G01 X10 F600` behaves as
/// one instruction.
pub(crate) fn apply_modal_words(
    node: &CommandNode,
    state: &mut MachineState,
    diags: &mut Diagnostics,
) {
    for code in &node.codes {
        if let Some(modal) = Modal::from_code(code) {
            state.set_modal(modal);
        }
    }
    if let Some(feed) = numeric_param(node, 'F', diags) {
        state.feed_rate = Some(feed);
    }
    if let Some(speed) = numeric_param(node, 'S', diags) {
        state.spindle_speed = Some(speed);
    }
    if let Some(tool) = numeric_param(node, 'T', diags) {
        if tool < 0.0 || tool.fract() != 0.0 || tool > f64::from(u32::MAX) {
            diags.warn(
                node.line,
                format!("tool word 'T{tool}' is not a non-negative integer and was ignored"),
            );
        } else {
            state.tool = tool as u32;
        }
    }
}

/// Numeric parameter lookup under the report-and-continue policy: a
/// malformed token records a warning and reads as absent.
pub(crate) fn numeric_param(
    node: &CommandNode,
    letter: char,
    diags: &mut Diagnostics,
) -> Option<f64> {
    match node.params.numeric(letter) {
        Ok(value) => value,
        Err(err) => {
            diags.warn(node.line, err.to_string());
            None
        }
    }
}

pub(crate) fn has_motion_code(node: &CommandNode) -> bool {
    node.codes
        .iter()
        .any(|code| matches!(Modal::from_code(code), Some(Modal::Motion(_))))
}

/// Collect the node's axis words (auxiliary letters included) as resolved
/// (axis, value) pairs, skipping malformed tokens with a warning.
pub(crate) fn axis_words(node: &CommandNode, diags: &mut Diagnostics) -> Vec<(Axis, f64)> {
    let mut words = Vec::new();
    for (letter, _) in node.params.iter() {
        let Some(axis) = Axis::from_letter(letter).or_else(|| Axis::from_aux(letter)) else {
            continue;
        };
        if let Some(value) = numeric_param(node, letter, diags) {
            words.push((axis, value));
        }
    }
    words
}
