// src/motion/mod.rs - Machine state tracking and machine-to-robot frame conversion
use crate::gcode::{Axis, Params};

/// Cumulative, absolute machine state. Axes not mentioned by a command keep
/// their previous value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachineState {
    /// X, Y, Z in machine units (millimetres).
    pub position: [f64; 3],
    /// Cumulative extruder position.
    pub extrusion: f64,
    pub feedrate: f64,
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every axis present in `params`; leave the rest untouched.
    pub fn apply(&mut self, params: &Params) {
        for (axis, value) in params.iter() {
            match axis {
                Axis::X => self.position[0] = value,
                Axis::Y => self.position[1] = value,
                Axis::Z => self.position[2] = value,
                Axis::E => self.extrusion = value,
                Axis::F => self.feedrate = value,
            }
        }
    }
}

/// A move expressed in the robot frame, ready for an actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RobotCommand {
    Rapid { target: [f64; 3] },
    Extrude { target: [f64; 3], extrusion: f64, feedrate: f64 },
}

impl RobotCommand {
    pub fn target(&self) -> [f64; 3] {
        match self {
            RobotCommand::Rapid { target } | RobotCommand::Extrude { target, .. } => *target,
        }
    }
}

/// Fixed conversion from machine coordinates to robot coordinates:
/// `robot = machine / units_per_meter + origin_offset` per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// Robot-frame position of the machine origin, metres.
    pub origin_offset: [f64; 3],
    pub units_per_meter: f64,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            origin_offset: [0.3, 0.3, 0.1],
            units_per_meter: 1000.0,
        }
    }
}

impl FrameTransform {
    pub fn new(origin_offset: [f64; 3]) -> Self {
        Self {
            origin_offset,
            ..Self::default()
        }
    }

    pub fn with_units_per_meter(mut self, units_per_meter: f64) -> Self {
        self.units_per_meter = units_per_meter;
        self
    }

    pub fn position(&self, state: &MachineState) -> [f64; 3] {
        let mut target = [0.0; 3];
        for (i, out) in target.iter_mut().enumerate() {
            *out = state.position[i] / self.units_per_meter + self.origin_offset[i];
        }
        target
    }

    /// G0 target; extrusion and feedrate are not carried.
    pub fn rapid(&self, state: &MachineState) -> RobotCommand {
        RobotCommand::Rapid {
            target: self.position(state),
        }
    }

    /// G1 target with scaled extrusion and feedrate.
    pub fn extrude(&self, state: &MachineState) -> RobotCommand {
        RobotCommand::Extrude {
            target: self.position(state),
            extrusion: state.extrusion / self.units_per_meter,
            feedrate: state.feedrate / self.units_per_meter,
        }
    }
}
