// src/handlers/setup.rs - non-motion command group: offsets, reference
// return, dwell, and standalone modal/feed/tool words
use crate::canal::CanalError;
use crate::diag::Diagnostics;
use crate::node::CommandNode;
use crate::path::{MoveKind, Point, ToolPathSegment};
use crate::state::{Axis, AxisMap, MachineState};

use super::{apply_modal_words, axis_words, has_motion_code, numeric_param, CommandHandler, ExecOutput};

const AUX_PRIMARY: [(char, char); 3] = [('U', 'X'), ('V', 'Y'), ('W', 'Z')];

/// Handles G50 (work-offset registration), G28 (reference-point return),
/// G04 (dwell), and lines that only carry modal or F/S/T words. Motion
/// lines are left to the motion handler even when they also carry modal
/// words.
pub struct SetupHandler {
    reference: AxisMap,
    rapid_rate: f64,
}

impl SetupHandler {
    pub fn new(reference: AxisMap, rapid_rate: f64) -> Self {
        Self { reference, rapid_rate }
    }

    fn dwell(&self, node: &CommandNode, state: &mut MachineState, diags: &mut Diagnostics) -> ExecOutput {
        // P preferred, X accepted; both in seconds.
        let seconds = numeric_param(node, 'P', diags).or_else(|| numeric_param(node, 'X', diags));
        match seconds {
            Some(seconds) if seconds >= 0.0 => {
                state.elapsed += seconds;
                ExecOutput::dwell(seconds)
            }
            Some(seconds) => {
                diags.warn(node.line, format!("negative dwell time {seconds} ignored"));
                ExecOutput::quiet()
            }
            None => {
                diags.warn(node.line, "dwell without a P/X time");
                ExecOutput::quiet()
            }
        }
    }

    fn set_offsets(&self, node: &CommandNode, state: &mut MachineState, diags: &mut Diagnostics) {
        for (axis, value) in axis_words(node, diags) {
            state.offsets.set(axis, value);
        }
        tracing::debug!(line = node.line, "work offsets updated");
    }

    /// G28: remap auxiliary letters onto their primary axes, move through
    /// the optional intermediate point, then rapid to the machine reference
    /// position with the active offsets applied. Snapshot/restore keeps the
    /// whole thing atomic.
    fn reference_return(
        &self,
        snapshot: &MachineState,
        node: &mut CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> ExecOutput {
        for (aux, primary) in AUX_PRIMARY {
            if node.params.contains(aux) && node.params.contains(primary) {
                diags.error(
                    node.line,
                    format!("reference return names both {aux} and {primary} for the same axis"),
                );
                state.restore(snapshot.clone());
                return ExecOutput::quiet();
            }
        }
        // The one permitted node mutation: downstream resolution sees the
        // corrected letters.
        for (aux, primary) in AUX_PRIMARY {
            if let Some(token) = node.params.remove(aux) {
                node.params.insert(primary, token);
            }
        }

        let words = axis_words(node, diags);
        let start = state.axes;
        let via = state.resolve_target(&words, state.distance_mode());

        let mut target = self.reference;
        for (axis, offset) in state.offsets.iter() {
            target.set(axis, target.get(axis) + offset);
        }

        // Travel time covers the pass through the intermediate point; the
        // emitted rapid is the start-to-reference move itself.
        let speed = self.rapid_rate / 60.0;
        let travel = start.distance_xyz(&via) + via.distance_xyz(&target);
        let duration = if speed > 0.0 { travel / speed } else { 0.0 };

        let points = vec![Point::from_axes(&start), Point::from_axes(&target)];

        state.update_axes(target);
        state.elapsed += duration;
        ExecOutput::motion(
            ToolPathSegment { kind: MoveKind::Rapid, line: node.line, tool: state.tool, points },
            duration,
        )
    }
}

impl CommandHandler for SetupHandler {
    fn matches(&self, node: &CommandNode) -> bool {
        if node.has_code("G50") || node.has_code("G28") || node.has_code("G4") {
            return true;
        }
        if has_motion_code(node) {
            return false;
        }
        // Axis words without a motion code continue the active motion mode,
        // which is the motion handler's business.
        let has_axis_word = node
            .params
            .iter()
            .any(|(letter, _)| Axis::from_letter(letter).is_some() || Axis::from_aux(letter).is_some());
        if has_axis_word {
            return false;
        }
        node.codes.iter().any(|code| crate::state::Modal::from_code(code).is_some())
            || node.params.contains('F')
            || node.params.contains('S')
            || node.params.contains('T')
    }

    fn handle(
        &self,
        node: &mut CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> Result<ExecOutput, CanalError> {
        let snapshot = state.snapshot();
        apply_modal_words(node, state, diags);
        if node.has_code("G28") {
            return Ok(self.reference_return(&snapshot, node, state, diags));
        }
        if node.has_code("G4") {
            return Ok(self.dwell(node, state, diags));
        }
        if node.has_code("G50") {
            self.set_offsets(node, state, diags);
        }
        Ok(ExecOutput::quiet())
    }
}
