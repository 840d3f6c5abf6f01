//! armprint-rs: interprets G0/G1 motion programs and drives a robotic arm
//! along the toolpath, switching extrusion on and off at the right moves.
//!
//! Pipeline: [`gcode::load_program`] → [`interpreter::Interpreter`] →
//! [`hardware::MotionSink`] / [`hardware::ExtrusionSink`].

pub mod config;
pub mod gcode;
pub mod hardware;
pub mod interpreter;
pub mod motion;
pub mod printer;

pub use config::{load_config, Config, ConfigError};
pub use gcode::{load_program, parse_program, Axis, CommandKind, LoadError, Params, ParsedCommand, Program};
pub use hardware::{ActuatorError, ExtrusionSink, InertCommander, InertTracer, MotionSink};
pub use interpreter::{InterpretError, Interpreter, InterpreterStats};
pub use motion::{FrameTransform, MachineState, RobotCommand};
pub use printer::{Printer, PrinterError};
