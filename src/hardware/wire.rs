//! JSON-lines driver for an external motion bridge.
//!
//! Every actuator call becomes one JSON object followed by `\n`, written to
//! any [`Write`] (serial device, pipe, file, stdout) and flushed immediately
//! so frames leave in source order. The bridge on the other end owns
//! Cartesian planning and execution:
//!
//! ```text
//! {"cmd":"move_rapid","pose":{"position":[0.8,0.3,0.2],"orientation":[1.0,0.0,0.0,0.0]},"eef_step":0.05}
//! {"cmd":"extrusion","enabled":true}
//! {"cmd":"move_extrude","pose":{...},"eef_step":0.05,"e":0.01,"f":1.5}
//! ```

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use glam::{DQuat, EulerRot};
use serde::Serialize;

use super::{ActuatorError, ExtrusionSink, MotionSink};
use crate::config::RobotConfig;

/// Tool pose sent with each move. Orientation is `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Frame {
    MoveRapid { pose: Pose, eef_step: f64 },
    MoveExtrude { pose: Pose, eef_step: f64, e: f64, f: f64 },
    Extrusion { enabled: bool },
}

/// Link statistics
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub bytes_sent: u64,
}

/// Output channel shared by a [`WireCommander`] and a [`WireTracer`].
pub struct WireLink<W: Write> {
    writer: W,
    stats: LinkStats,
}

impl<W: Write> WireLink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stats: LinkStats::default(),
        }
    }

    /// Wrap the link for sharing between both sinks of one run.
    pub fn shared(writer: W) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(writer)))
    }

    pub fn send(&mut self, frame: &Frame) -> Result<(), ActuatorError> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.stats.frames_sent += 1;
        self.stats.bytes_sent += line.len() as u64;
        tracing::debug!("Sent frame #{}: {:?}", self.stats.frames_sent, frame);
        Ok(())
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }
}

/// Quaternion `[x, y, z, w]` for fixed-axis roll, pitch, yaw (radians),
/// applied about X, then Y, then Z.
pub fn quaternion_from_rpy(roll: f64, pitch: f64, yaw: f64) -> [f64; 4] {
    let q = DQuat::from_euler(EulerRot::ZYX, yaw, pitch, roll);
    [q.x, q.y, q.z, q.w]
}

/// Motion sink that streams move frames over a [`WireLink`].
pub struct WireCommander<W: Write> {
    link: Rc<RefCell<WireLink<W>>>,
    orientation: [f64; 4],
    eef_step: f64,
}

impl<W: Write> WireCommander<W> {
    pub fn new(link: Rc<RefCell<WireLink<W>>>, robot: &RobotConfig) -> Self {
        let [roll, pitch, yaw] = robot.orientation_rpy;
        Self {
            link,
            orientation: quaternion_from_rpy(roll, pitch, yaw),
            eef_step: robot.eef_step,
        }
    }

    fn pose(&self, position: [f64; 3]) -> Pose {
        Pose {
            position,
            orientation: self.orientation,
        }
    }
}

impl<W: Write> MotionSink for WireCommander<W> {
    fn move_rapid(&mut self, target: [f64; 3]) -> Result<(), ActuatorError> {
        let frame = Frame::MoveRapid {
            pose: self.pose(target),
            eef_step: self.eef_step,
        };
        self.link.borrow_mut().send(&frame)
    }

    fn move_extrude(&mut self, target: [f64; 3], extrusion: f64, feedrate: f64) -> Result<(), ActuatorError> {
        let frame = Frame::MoveExtrude {
            pose: self.pose(target),
            eef_step: self.eef_step,
            e: extrusion,
            f: feedrate,
        };
        self.link.borrow_mut().send(&frame)
    }
}

/// Extrusion sink that mirrors the last state successfully sent to the bridge.
pub struct WireTracer<W: Write> {
    link: Rc<RefCell<WireLink<W>>>,
    extruding: bool,
}

impl<W: Write> WireTracer<W> {
    pub fn new(link: Rc<RefCell<WireLink<W>>>) -> Self {
        Self { link, extruding: false }
    }

    fn set(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        self.link.borrow_mut().send(&Frame::Extrusion { enabled })?;
        self.extruding = enabled;
        Ok(())
    }
}

impl<W: Write> ExtrusionSink for WireTracer<W> {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        self.set(true)
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        self.set(false)
    }

    fn is_extruding(&self) -> bool {
        self.extruding
    }
}

/// Build both sinks over one shared link.
pub fn wire_pair<W: Write>(writer: W, robot: &RobotConfig) -> (WireCommander<W>, WireTracer<W>, Rc<RefCell<WireLink<W>>>) {
    let link = WireLink::shared(writer);
    (WireCommander::new(link.clone(), robot), WireTracer::new(link.clone()), link)
}
