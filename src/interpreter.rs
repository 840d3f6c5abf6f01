//! G-code interpreter: tracks cumulative machine state and dispatches each
//! motion command to the injected actuators.
//!
//! For every command the interpreter merges the supplied axes into
//! [`MachineState`], converts the merged state to the robot frame, and then:
//!
//! - `G0`: disables extrusion if it is on, then issues a rapid move.
//! - `G1`: enables extrusion if it is off, then issues an extruding move.
//!
//! Extrusion calls are edge-triggered: the extrusion sink is queried first
//! and only a state change produces a call. Calls leave in source order.
//!
//! The check-then-act on the extrusion sink assumes nothing else mutates
//! extrusion state during a run.

use std::borrow::Borrow;

use thiserror::Error;

use crate::gcode::{CommandKind, ParsedCommand};
use crate::hardware::{ActuatorError, ExtrusionSink, MotionSink};
use crate::motion::{FrameTransform, MachineState, RobotCommand};

#[derive(Debug, Error)]
pub enum InterpretError {
    /// A command other than G0/G1 reached the interpreter. The loader never
    /// yields these, so this is a bug in whatever produced the stream.
    #[error("protocol violation at line {line}: {kind} reached the interpreter")]
    ProtocolViolation { line: usize, kind: CommandKind },
    #[error("actuator failure: {0}")]
    Actuator(#[from] ActuatorError),
}

/// Counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterStats {
    pub rapid_moves: u64,
    pub extrude_moves: u64,
    pub extrusion_enables: u64,
    pub extrusion_disables: u64,
}

impl InterpreterStats {
    pub fn commands(&self) -> u64 {
        self.rapid_moves + self.extrude_moves
    }
}

pub struct Interpreter<M, E> {
    motion: M,
    extrusion: E,
    transform: FrameTransform,
    state: MachineState,
    stats: InterpreterStats,
}

impl<M: MotionSink, E: ExtrusionSink> Interpreter<M, E> {
    /// Creates an interpreter with a fresh machine state.
    pub fn new(motion: M, extrusion: E, transform: FrameTransform) -> Self {
        Self {
            motion,
            extrusion,
            transform,
            state: MachineState::new(),
            stats: InterpreterStats::default(),
        }
    }

    /// Consume `commands` to completion.
    ///
    /// Stops at the first error; the machine state is left as it was after
    /// the last successfully merged command and a new run must start over.
    pub fn run<I>(&mut self, commands: I) -> Result<(), InterpretError>
    where
        I: IntoIterator,
        I::Item: Borrow<ParsedCommand>,
    {
        for command in commands {
            self.step(command.borrow())?;
        }
        tracing::info!(
            "Run complete: {} rapid moves, {} extrude moves, extrusion enabled {} / disabled {} times",
            self.stats.rapid_moves,
            self.stats.extrude_moves,
            self.stats.extrusion_enables,
            self.stats.extrusion_disables
        );
        Ok(())
    }

    /// Dispatch a single command and return the robot command it produced.
    pub fn step(&mut self, command: &ParsedCommand) -> Result<RobotCommand, InterpretError> {
        let robot = match command.kind {
            CommandKind::G0 => {
                self.state.apply(&command.params);
                self.transform.rapid(&self.state)
            }
            CommandKind::G1 => {
                self.state.apply(&command.params);
                self.transform.extrude(&self.state)
            }
            kind @ CommandKind::Other => {
                tracing::error!("Line {}: {} reached the interpreter", command.line, kind);
                return Err(InterpretError::ProtocolViolation { line: command.line, kind });
            }
        };
        tracing::debug!("Line {}: {} -> {:?}", command.line, command, robot);

        match robot {
            RobotCommand::Rapid { target } => {
                if self.extrusion.is_extruding() {
                    self.extrusion.disable()?;
                    self.stats.extrusion_disables += 1;
                }
                self.motion.move_rapid(target)?;
                self.stats.rapid_moves += 1;
            }
            RobotCommand::Extrude { target, extrusion, feedrate } => {
                if !self.extrusion.is_extruding() {
                    self.extrusion.enable()?;
                    self.stats.extrusion_enables += 1;
                }
                self.motion.move_extrude(target, extrusion, feedrate)?;
                self.stats.extrude_moves += 1;
            }
        }
        Ok(robot)
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn stats(&self) -> InterpreterStats {
        self.stats
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn extrusion(&self) -> &E {
        &self.extrusion
    }

    pub fn into_sinks(self) -> (M, E) {
        (self.motion, self.extrusion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::{Axis, Params};
    use crate::hardware::{InertCommander, InertTracer};

    struct FailingCommander;

    impl MotionSink for FailingCommander {
        fn move_rapid(&mut self, _target: [f64; 3]) -> Result<(), ActuatorError> {
            Err(ActuatorError::Rejected("out of reach".to_string()))
        }

        fn move_extrude(&mut self, _target: [f64; 3], _e: f64, _f: f64) -> Result<(), ActuatorError> {
            Err(ActuatorError::Rejected("out of reach".to_string()))
        }
    }

    fn g(kind: CommandKind, params: &[(Axis, f64)]) -> ParsedCommand {
        ParsedCommand::new(kind, params.iter().copied().collect())
    }

    #[test]
    fn test_step_returns_robot_command() {
        let mut interp = Interpreter::new(InertCommander::new(), InertTracer::new(), FrameTransform::new([0.0; 3]));
        let robot = interp.step(&g(CommandKind::G0, &[(Axis::X, 1000.0)])).unwrap();
        assert_eq!(robot, RobotCommand::Rapid { target: [1.0, 0.0, 0.0] });
        assert_eq!(interp.motion().moves(), 1);
    }

    #[test]
    fn test_other_kind_is_protocol_violation_without_state_change() {
        let mut interp = Interpreter::new(InertCommander::new(), InertTracer::new(), FrameTransform::default());
        let cmd = g(CommandKind::Other, &[(Axis::X, 5.0)]).at_line(7);
        let err = interp.step(&cmd).unwrap_err();
        assert!(matches!(err, InterpretError::ProtocolViolation { line: 7, kind: CommandKind::Other }));
        assert_eq!(interp.state(), &MachineState::default());
        assert_eq!(interp.motion().moves(), 0);
    }

    #[test]
    fn test_actuator_failure_stops_run() {
        let mut interp = Interpreter::new(FailingCommander, InertTracer::new(), FrameTransform::default());
        let cmds = vec![g(CommandKind::G1, &[(Axis::X, 1.0)]), g(CommandKind::G1, &[(Axis::X, 2.0)])];
        let err = interp.run(&cmds).unwrap_err();
        assert!(matches!(err, InterpretError::Actuator(ActuatorError::Rejected(_))));
        // Enable went out before the failing move; the second command never ran.
        assert!(interp.extrusion().is_extruding());
        assert_eq!(interp.state().position[0], 1.0);
        assert_eq!(interp.stats().extrude_moves, 0);
    }

    #[test]
    fn test_stats() {
        let mut interp = Interpreter::new(InertCommander::new(), InertTracer::new(), FrameTransform::default());
        let cmds = vec![
            g(CommandKind::G1, &[(Axis::X, 1.0)]),
            g(CommandKind::G1, &[(Axis::X, 2.0)]),
            g(CommandKind::G0, &[(Axis::X, 3.0)]),
            g(CommandKind::G0, &[(Axis::X, 4.0)]),
            g(CommandKind::G1, &[(Axis::X, 5.0)]),
        ];
        interp.run(cmds).unwrap();
        assert_eq!(
            interp.stats(),
            InterpreterStats { rapid_moves: 2, extrude_moves: 3, extrusion_enables: 2, extrusion_disables: 1 }
        );
        assert_eq!(interp.stats().commands(), 5);
        let (_, tracer) = interp.into_sinks();
        assert_eq!(tracer.transitions(), 3);
    }

    #[test]
    fn test_empty_params_reuse_state() {
        let mut interp = Interpreter::new(InertCommander::new(), InertTracer::new(), FrameTransform::default());
        let first = interp.step(&g(CommandKind::G0, &[(Axis::X, 10.0), (Axis::Y, 20.0)])).unwrap();
        let second = interp.step(&ParsedCommand::new(CommandKind::G0, Params::new())).unwrap();
        assert_eq!(first, second);
    }
}
