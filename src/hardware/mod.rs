// src/hardware/mod.rs - Actuator interfaces the interpreter dispatches to
//
// The interpreter only ever talks to these two traits. Concrete drivers are
// chosen by the caller and injected at construction.

pub mod inert;
pub mod wire;

use thiserror::Error;

pub use inert::{InertCommander, InertTracer};
pub use wire::{WireCommander, WireLink, WireTracer};

/// Failure reported by an actuator. The interpreter never retries these.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Actuator rejected command: {0}")]
    Rejected(String),
}

/// Sink for robot-frame motion requests.
///
/// Targets are absolute robot-frame positions in metres.
pub trait MotionSink {
    /// Move to `target` without extruding.
    fn move_rapid(&mut self, target: [f64; 3]) -> Result<(), ActuatorError>;

    /// Move to `target` while extruding; `extrusion` and `feedrate` are
    /// already converted to robot units.
    fn move_extrude(&mut self, target: [f64; 3], extrusion: f64, feedrate: f64) -> Result<(), ActuatorError>;
}

/// Sink controlling the extrusion signal.
///
/// `is_extruding` must be cheap and side-effect free; it is queried before
/// every move to decide whether a transition is needed.
pub trait ExtrusionSink {
    fn enable(&mut self) -> Result<(), ActuatorError>;
    fn disable(&mut self) -> Result<(), ActuatorError>;
    fn is_extruding(&self) -> bool;
}

impl<T: MotionSink + ?Sized> MotionSink for &mut T {
    fn move_rapid(&mut self, target: [f64; 3]) -> Result<(), ActuatorError> {
        (**self).move_rapid(target)
    }

    fn move_extrude(&mut self, target: [f64; 3], extrusion: f64, feedrate: f64) -> Result<(), ActuatorError> {
        (**self).move_extrude(target, extrusion, feedrate)
    }
}

impl<T: MotionSink + ?Sized> MotionSink for Box<T> {
    fn move_rapid(&mut self, target: [f64; 3]) -> Result<(), ActuatorError> {
        (**self).move_rapid(target)
    }

    fn move_extrude(&mut self, target: [f64; 3], extrusion: f64, feedrate: f64) -> Result<(), ActuatorError> {
        (**self).move_extrude(target, extrusion, feedrate)
    }
}

impl<T: ExtrusionSink + ?Sized> ExtrusionSink for &mut T {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        (**self).enable()
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        (**self).disable()
    }

    fn is_extruding(&self) -> bool {
        (**self).is_extruding()
    }
}

impl<T: ExtrusionSink + ?Sized> ExtrusionSink for Box<T> {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        (**self).enable()
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        (**self).disable()
    }

    fn is_extruding(&self) -> bool {
        (**self).is_extruding()
    }
}
