//! Turtle state and the L-System executor that stamps rule strings into the grid.
//!
//! The turtle walks the XZ plane at a constant height. Rules are read one
//! symbol at a time and there is no branching (`[`/`]` have no meaning here).

use crate::grid::{GroupId, VoxelGrid};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};
use tracing::trace;

/// Configuration for L-System interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LSystemConfig {
    /// Rotation applied by a single turn symbol, in radians.
    pub turn_angle: f32,
}

impl Default for LSystemConfig {
    fn default() -> Self {
        Self {
            turn_angle: FRAC_PI_2,
        }
    }
}

/// The state of the voxel turtle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current grid cell of the cursor.
    pub position: IVec3,

    /// Heading in radians around the Y axis. `0` faces +X.
    pub heading: f32,
}

impl TurtleState {
    pub fn new(position: IVec3) -> Self {
        Self {
            position,
            heading: 0.0,
        }
    }

    /// One cell forward along the current heading, snapped to the grid.
    pub fn forward(&self) -> IVec3 {
        IVec3::new(
            self.heading.cos().round() as i32,
            0,
            self.heading.sin().round() as i32,
        )
    }

    /// Steps one cell forward. The position saturates at the `i32` range.
    pub fn advance(&mut self) {
        self.position = self.position.saturating_add(self.forward());
    }

    /// Turns around Y by `angle` radians, keeping the heading in `[0, 2π)`.
    pub fn rotate(&mut self, angle: f32) {
        self.heading = (self.heading + angle).rem_euclid(TAU);
    }
}

/// Operations that can be performed by the turtle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Stamp a voxel at the cursor, then move forward (`F`).
    Draw,
    /// Move forward without stamping (`f`).
    Move,
    /// Turn by the configured angle times the sign (`+`/`-`).
    Turn(f32),
    /// No-op: symbol has no registered meaning.
    Ignore,
}

/// Interprets rule strings as turtle movement.
#[derive(Clone, Debug)]
pub struct TurtleInterpreter {
    op_map: HashMap<char, TurtleOp>,
    config: LSystemConfig,
}

impl TurtleInterpreter {
    /// Creates an interpreter with an empty symbol map.
    ///
    /// Register operations with [`set_op`](Self::set_op) or
    /// [`populate_standard_symbols`](Self::populate_standard_symbols) before
    /// calling [`trace`](Self::trace).
    pub fn new(config: LSystemConfig) -> Self {
        Self {
            op_map: HashMap::new(),
            config,
        }
    }

    /// Assigns a [`TurtleOp`] to a symbol, replacing any previous mapping.
    pub fn set_op(&mut self, symbol: char, op: TurtleOp) {
        self.op_map.insert(symbol, op);
    }

    /// Registers `F`, `f`, `+` and `-`.
    pub fn populate_standard_symbols(&mut self) {
        let mappings = [
            ('F', TurtleOp::Draw),
            ('f', TurtleOp::Move),
            ('+', TurtleOp::Turn(1.0)),
            ('-', TurtleOp::Turn(-1.0)),
        ];
        for (symbol, op) in mappings {
            self.set_op(symbol, op);
        }
    }

    /// Walks `rule` from `start`, stamping `group` into `grid` on every draw.
    ///
    /// The turtle starts facing +X. Stamps that leave the grid are dropped by
    /// the grid itself. Returns the number of draw symbols executed.
    pub fn trace(&self, rule: &str, start: IVec3, grid: &mut VoxelGrid, group: GroupId) -> usize {
        let mut turtle = TurtleState::new(start);
        let mut stamps = 0;

        for symbol in rule.chars() {
            match self.op_map.get(&symbol).unwrap_or(&TurtleOp::Ignore) {
                TurtleOp::Draw => {
                    grid.set(turtle.position, group);
                    turtle.advance();
                    stamps += 1;
                }
                TurtleOp::Move => turtle.advance(),
                TurtleOp::Turn(sign) => turtle.rotate(self.config.turn_angle * sign),
                TurtleOp::Ignore => trace!(%symbol, "ignoring unmapped L-System symbol"),
            }
        }

        stamps
    }
}

impl Default for TurtleInterpreter {
    fn default() -> Self {
        let mut interpreter = Self::new(LSystemConfig::default());
        interpreter.populate_standard_symbols();
        interpreter
    }
}
