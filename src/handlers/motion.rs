// src/handlers/motion.rs - G0/G1/G2/G3 interpolation
use std::f64::consts::TAU;

use crate::canal::CanalError;
use crate::diag::Diagnostics;
use crate::node::CommandNode;
use crate::path::{MoveKind, Point, ToolPathSegment};
use crate::state::{Axis, AxisMap, MachineState, MotionMode, Plane};

use super::{apply_modal_words, axis_words, has_motion_code, numeric_param, CommandHandler, ExecOutput};

/// Interpolates rapid, linear and circular moves against the modal state.
///
/// Target coordinates always go through `MachineState::resolve_target`, so
/// absolute/incremental resolution is identical for every move family.
/// Durations come from the programmed feed (units/minute divided by 60);
/// rapids use the machine's rapid rate instead.
pub struct MotionHandler {
    /// Maximum chord length of one sampled arc step, in machine units.
    max_segment: f64,
    /// Substituted when a cutting move runs before any F word; always
    /// reported as a warning.
    default_feed: f64,
    rapid_rate: f64,
}

impl MotionHandler {
    pub fn new(max_segment: f64, default_feed: f64, rapid_rate: f64) -> Self {
        Self { max_segment, default_feed, rapid_rate }
    }

    fn cutting_feed(&self, state: &MachineState, diags: &mut Diagnostics, line: u32) -> f64 {
        match state.feed_rate {
            Some(feed) => feed,
            None => {
                diags.warn(
                    line,
                    format!(
                        "no feed rate programmed before a cutting move, assuming {} units/min",
                        self.default_feed
                    ),
                );
                self.default_feed
            }
        }
    }

    fn line_move(
        &self,
        kind: MoveKind,
        rate: f64,
        start: AxisMap,
        target: AxisMap,
        line: u32,
        state: &mut MachineState,
    ) -> ExecOutput {
        let distance = start.distance_xyz(&target);
        let speed = rate / 60.0;
        let duration = if speed > 0.0 { distance / speed } else { 0.0 };
        state.update_axes(target);
        state.elapsed += duration;
        ExecOutput::motion(
            ToolPathSegment {
                kind,
                line,
                tool: state.tool,
                points: vec![Point::from_axes(&start), Point::from_axes(&target)],
            },
            duration,
        )
    }

    /// Circular interpolation in the XY plane. Returns `None` on any
    /// recoverable failure after recording a diagnostic; the caller
    /// restores the pre-node snapshot so the move leaves no trace.
    fn arc_move(
        &self,
        cw: bool,
        start: AxisMap,
        target: AxisMap,
        node: &CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> Option<ExecOutput> {
        if state.plane() != Plane::Xy {
            diags.error(
                node.line,
                format!(
                    "circular interpolation is only supported in the XY plane; active plane is {}",
                    state.plane()
                ),
            );
            return None;
        }

        let (sx, sy) = (start.get(Axis::X), start.get(Axis::Y));
        let (ex, ey) = (target.get(Axis::X), target.get(Axis::Y));

        let (cx, cy) = if node.params.contains('I') || node.params.contains('J') {
            let i = numeric_param(node, 'I', diags).unwrap_or(0.0);
            let j = numeric_param(node, 'J', diags).unwrap_or(0.0);
            (sx + i, sy + j)
        } else if let Some(radius) = numeric_param(node, 'R', diags).filter(|r| *r != 0.0) {
            let (dx, dy) = (ex - sx, ey - sy);
            let chord2 = dx * dx + dy * dy;
            if chord2 == 0.0 {
                diags.error(node.line, "radius-mode arc has a zero-length chord");
                return None;
            }
            let half2 = chord2 / 4.0;
            if radius * radius < half2 {
                diags.error(
                    node.line,
                    format!("arc radius {radius} is too small for the commanded chord"),
                );
                return None;
            }
            let chord = chord2.sqrt();
            let apothem = (radius * radius - half2).sqrt();
            // Unit left-normal of the chord. Of the two geometrically valid
            // centers, a positive radius selects the minor arc: center left
            // of the chord for counterclockwise motion, right for
            // clockwise. A negative radius selects the major arc.
            let (nx, ny) = (-dy / chord, dx / chord);
            let mut side = if cw { -1.0 } else { 1.0 };
            if radius < 0.0 {
                side = -side;
            }
            ((sx + ex) / 2.0 + side * apothem * nx, (sy + ey) / 2.0 + side * apothem * ny)
        } else {
            diags.error(node.line, "arc requires I/J center offsets or a non-zero R radius");
            return None;
        };

        let radius = (sx - cx).hypot(sy - cy);
        let end_radius = (ex - cx).hypot(ey - cy);
        if (end_radius - radius).abs() > 1e-4 * radius.max(1.0) {
            diags.warn(
                node.line,
                format!(
                    "arc end point is off the commanded circle (start radius {radius:.6}, end radius {end_radius:.6})"
                ),
            );
        }

        let start_angle = (sy - cy).atan2(sx - cx);
        let end_angle = (ey - cy).atan2(ex - cx);
        let mut sweep = end_angle - start_angle;
        if cw && sweep > 0.0 {
            sweep -= TAU;
        }
        if !cw && sweep < 0.0 {
            sweep += TAU;
        }

        let arc_length = sweep.abs() * radius;
        let feed = self.cutting_feed(state, diags, node.line);
        let speed = feed / 60.0;
        let duration = if speed > 0.0 { arc_length / speed } else { 0.0 };

        let steps = ((arc_length / self.max_segment).ceil() as usize).max(2);
        let (sz, tz) = (start.get(Axis::Z), target.get(Axis::Z));
        let mut points = Vec::with_capacity(steps + 1);
        points.push(Point::from_axes(&start));
        for i in 1..=steps {
            if i == steps {
                // Land exactly on the resolved target.
                points.push(Point::new(ex, ey, tz));
                break;
            }
            let t = i as f64 / steps as f64;
            let theta = start_angle + sweep * t;
            points.push(Point::new(
                cx + radius * theta.cos(),
                cy + radius * theta.sin(),
                sz + (tz - sz) * t,
            ));
        }

        state.update_axes(target);
        state.elapsed += duration;
        let kind = if cw { MoveKind::ArcCw } else { MoveKind::ArcCcw };
        Some(ExecOutput::motion(
            ToolPathSegment { kind, line: node.line, tool: state.tool, points },
            duration,
        ))
    }
}

impl CommandHandler for MotionHandler {
    fn matches(&self, node: &CommandNode) -> bool {
        has_motion_code(node)
            || node
                .params
                .iter()
                .any(|(letter, _)| Axis::from_letter(letter).is_some() || Axis::from_aux(letter).is_some())
    }

    fn handle(
        &self,
        node: &mut CommandNode,
        state: &mut MachineState,
        diags: &mut Diagnostics,
    ) -> Result<ExecOutput, CanalError> {
        let snapshot = state.snapshot();
        apply_modal_words(node, state, diags);

        let words = axis_words(node, diags);
        let start = state.axes;
        let target = state.resolve_target(&words, state.distance_mode());

        let output = match state.motion_mode() {
            MotionMode::Rapid => {
                Some(self.line_move(MoveKind::Rapid, self.rapid_rate, start, target, node.line, state))
            }
            MotionMode::Linear => {
                let feed = self.cutting_feed(state, diags, node.line);
                Some(self.line_move(MoveKind::Linear, feed, start, target, node.line, state))
            }
            MotionMode::ArcCw => self.arc_move(true, start, target, node, state, diags),
            MotionMode::ArcCcw => self.arc_move(false, start, target, node, state, diags),
        };

        match output {
            Some(output) => Ok(output),
            None => {
                // Failed move: the node must leave no partial mutation
                // behind, not even its modal or feed words.
                state.restore(snapshot);
                Ok(ExecOutput::quiet())
            }
        }
    }
}
