// src/state.rs - per-canal machine state: axes, modal groups, offsets, feed
use std::collections::BTreeMap;
use std::fmt;

/// Axes tracked by every canal. Auxiliary letters U/V/W are not axes of
/// their own; they address X/Y/Z (see [`Axis::from_aux`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
}

impl Axis {
    pub const ALL: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B, Axis::C];

    pub fn from_letter(letter: char) -> Option<Axis> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'A' => Some(Axis::A),
            'B' => Some(Axis::B),
            'C' => Some(Axis::C),
            _ => None,
        }
    }

    /// Primary axis addressed by an auxiliary letter (U -> X, V -> Y, W -> Z).
    pub fn from_aux(letter: char) -> Option<Axis> {
        match letter.to_ascii_uppercase() {
            'U' => Some(Axis::X),
            'V' => Some(Axis::Y),
            'W' => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
            Axis::C => 'C',
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::A => 3,
            Axis::B => 4,
            Axis::C => 5,
        }
    }
}

/// A value for every tracked axis. Never partially initialized: positions
/// default to zero, so lookups cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisMap([f64; 6]);

impl AxisMap {
    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        self.0[axis.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL.into_iter().map(|axis| (axis, self.get(axis)))
    }

    /// Euclidean distance over the linear axes only.
    pub fn distance_xyz(&self, other: &AxisMap) -> f64 {
        let dx = other.get(Axis::X) - self.get(Axis::X);
        let dy = other.get(Axis::Y) - self.get(Axis::Y);
        let dz = other.get(Axis::Z) - self.get(Axis::Z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMode {
    Absolute,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Zx,
    Yz,
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::Xy => write!(f, "G17 (XY)"),
            Plane::Zx => write!(f, "G18 (ZX)"),
            Plane::Yz => write!(f, "G19 (YZ)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Millimeters,
    Inches,
}

/// One modal slot assignment. Setting a slot never touches the other
/// groups; each group persists independently until an explicit command in
/// its family changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Motion(MotionMode),
    Distance(DistanceMode),
    Plane(Plane),
    Units(Units),
}

impl Modal {
    /// Map a G word to the modal slot it sets, if any. Leading zeros are
    /// insignificant: "G01" and "G1" select the same mode.
    pub fn from_code(code: &str) -> Option<Modal> {
        let (letter, number) = crate::node::split_code(code)?;
        if letter != 'G' {
            return None;
        }
        match number {
            0 => Some(Modal::Motion(MotionMode::Rapid)),
            1 => Some(Modal::Motion(MotionMode::Linear)),
            2 => Some(Modal::Motion(MotionMode::ArcCw)),
            3 => Some(Modal::Motion(MotionMode::ArcCcw)),
            17 => Some(Modal::Plane(Plane::Xy)),
            18 => Some(Modal::Plane(Plane::Zx)),
            19 => Some(Modal::Plane(Plane::Yz)),
            20 => Some(Modal::Units(Units::Inches)),
            21 => Some(Modal::Units(Units::Millimeters)),
            90 => Some(Modal::Distance(DistanceMode::Absolute)),
            91 => Some(Modal::Distance(DistanceMode::Incremental)),
            _ => None,
        }
    }
}

/// Full modal and positional state of one canal.
///
/// Every field has a well-defined value after construction; "not yet set by
/// the program" exists only for the feed rate and spindle speed. The struct
/// is a plain value: `clone()` yields an independent snapshot and
/// [`MachineState::restore`] swaps one back in wholesale, which is how
/// handlers get transactional behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    pub axes: AxisMap,
    motion: MotionMode,
    distance: DistanceMode,
    plane: Plane,
    units: Units,
    pub feed_rate: Option<f64>,
    pub spindle_speed: Option<f64>,
    pub tool: u32,
    /// Active work offset per axis, applied when returning to the reference
    /// point.
    pub offsets: AxisMap,
    /// Seconds of machining time accumulated so far.
    pub elapsed: f64,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            axes: AxisMap::default(),
            motion: MotionMode::Rapid,
            distance: DistanceMode::Absolute,
            plane: Plane::Xy,
            units: Units::Millimeters,
            feed_rate: None,
            spindle_speed: None,
            tool: 0,
            offsets: AxisMap::default(),
            elapsed: 0.0,
        }
    }
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_mode(&self) -> MotionMode {
        self.motion
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Write exactly one modal slot.
    pub fn set_modal(&mut self, modal: Modal) {
        match modal {
            Modal::Motion(mode) => self.motion = mode,
            Modal::Distance(mode) => self.distance = mode,
            Modal::Plane(plane) => self.plane = plane,
            Modal::Units(units) => self.units = units,
        }
    }

    /// Resolve a partial axis-word set against the current position.
    ///
    /// Absolute mode: axes named in `words` take the requested value, the
    /// rest keep their current position. Incremental mode: named axes add
    /// their delta, absent axes contribute zero. This is the single rule
    /// both linear and circular interpolation go through.
    pub fn resolve_target(&self, words: &[(Axis, f64)], mode: DistanceMode) -> AxisMap {
        let mut resolved = self.axes;
        for &(axis, value) in words {
            match mode {
                DistanceMode::Absolute => resolved.set(axis, value),
                DistanceMode::Incremental => resolved.set(axis, self.axes.get(axis) + value),
            }
        }
        resolved
    }

    /// Commit a resolved position as the new current position.
    pub fn update_axes(&mut self, resolved: AxisMap) {
        self.axes = resolved;
    }

    pub fn snapshot(&self) -> MachineState {
        self.clone()
    }

    /// Replace the whole state with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: MachineState) {
        *self = snapshot;
    }

    /// Variables exposed to the visualization consumer: final axis
    /// positions, non-zero offsets, feed/spindle if the program set them,
    /// and the active tool.
    pub fn variables(&self) -> BTreeMap<String, f64> {
        let mut vars = BTreeMap::new();
        for (axis, value) in self.axes.iter() {
            vars.insert(axis.letter().to_string(), value);
        }
        for (axis, value) in self.offsets.iter() {
            if value != 0.0 {
                vars.insert(format!("offset.{}", axis.letter()), value);
            }
        }
        if let Some(feed) = self.feed_rate {
            vars.insert("feed".to_string(), feed);
        }
        if let Some(speed) = self.spindle_speed {
            vars.insert("spindle".to_string(), speed);
        }
        vars.insert("tool".to_string(), f64::from(self.tool));
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_slots_are_independent() {
        let mut state = MachineState::new();
        state.set_modal(Modal::Distance(DistanceMode::Incremental));
        state.set_modal(Modal::Plane(Plane::Zx));
        assert_eq!(state.motion_mode(), MotionMode::Rapid);
        assert_eq!(state.units(), Units::Millimeters);
        state.set_modal(Modal::Motion(MotionMode::ArcCcw));
        assert_eq!(state.distance_mode(), DistanceMode::Incremental);
        assert_eq!(state.plane(), Plane::Zx);
    }

    #[test]
    fn modal_codes_accept_leading_zeros() {
        assert_eq!(Modal::from_code("G01"), Some(Modal::Motion(MotionMode::Linear)));
        assert_eq!(Modal::from_code("G1"), Some(Modal::Motion(MotionMode::Linear)));
        assert_eq!(Modal::from_code("G50"), None);
        assert_eq!(Modal::from_code("M3"), None);
    }

    #[test]
    fn aux_letters_map_to_primary_axes() {
        assert_eq!(Axis::from_aux('U'), Some(Axis::X));
        assert_eq!(Axis::from_aux('w'), Some(Axis::Z));
        assert_eq!(Axis::from_aux('X'), None);
    }
}
