//! Reference actuators that move nothing and log every call.
//!
//! Useful for dry runs and for checking what a program would send to a robot.

use super::{ActuatorError, ExtrusionSink, MotionSink};

/// Motion sink that logs each move.
#[derive(Debug, Clone, Default)]
pub struct InertCommander {
    moves: u64,
    last_target: Option<[f64; 3]>,
}

impl InertCommander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of moves accepted so far.
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn last_target(&self) -> Option<[f64; 3]> {
        self.last_target
    }
}

impl MotionSink for InertCommander {
    fn move_rapid(&mut self, target: [f64; 3]) -> Result<(), ActuatorError> {
        let [x, y, z] = target;
        tracing::info!("G0 command sent to robot: x={} y={} z={}", x, y, z);
        self.moves += 1;
        self.last_target = Some(target);
        Ok(())
    }

    fn move_extrude(&mut self, target: [f64; 3], extrusion: f64, feedrate: f64) -> Result<(), ActuatorError> {
        let [x, y, z] = target;
        tracing::info!("G1 command sent to robot: x={} y={} z={} e={} f={}", x, y, z, extrusion, feedrate);
        self.moves += 1;
        self.last_target = Some(target);
        Ok(())
    }
}

/// Extrusion sink backed by an in-memory flag.
#[derive(Debug, Clone, Default)]
pub struct InertTracer {
    extruding: bool,
    transitions: u64,
}

impl InertTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of enable/disable calls received.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl ExtrusionSink for InertTracer {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        tracing::info!("Emitting extrusion");
        self.extruding = true;
        self.transitions += 1;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        tracing::info!("Emitting stop extrusion");
        self.extruding = false;
        self.transitions += 1;
        Ok(())
    }

    fn is_extruding(&self) -> bool {
        self.extruding
    }
}
