// src/printer.rs - Wires config, loader, interpreter and driver into one job
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::config::{Config, ConfigError, DriverKind};
use crate::gcode::{load_program, LoadError, Program};
use crate::hardware::wire::wire_pair;
use crate::hardware::{ExtrusionSink, InertCommander, InertTracer, MotionSink};
use crate::interpreter::{InterpretError, Interpreter, InterpreterStats};

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Interpreter error: {0}")]
    Interpret(#[from] InterpretError),
    #[error("Cannot open driver output '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// One print job: a configuration plus the driver it selects.
pub struct Printer {
    config: Config,
}

impl Printer {
    pub fn new(config: Config) -> Result<Self, PrinterError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load `path` and trace it with the configured driver.
    pub async fn print_file(&self, path: impl AsRef<Path>) -> Result<InterpreterStats, PrinterError> {
        let program = load_program(path).await?;
        self.print(&program)
    }

    /// Trace an already loaded program with the configured driver.
    pub fn print(&self, program: &Program) -> Result<InterpreterStats, PrinterError> {
        match self.config.driver.kind {
            DriverKind::Log => {
                tracing::info!("Using logging driver");
                Ok(self.run_with(program, InertCommander::new(), InertTracer::new())?)
            }
            DriverKind::Wire => {
                let output = &self.config.driver.output;
                tracing::info!("Using wire driver, output: {}", output);
                let writer = open_output(output)?;
                let (commander, tracer, link) = wire_pair(writer, &self.config.robot);
                let stats = self.run_with(program, commander, tracer)?;
                tracing::info!("Wire link sent {} frames", link.borrow().stats().frames_sent);
                Ok(stats)
            }
        }
    }

    /// Trace a program through caller-supplied sinks.
    pub fn run_with<M: MotionSink, E: ExtrusionSink>(
        &self,
        program: &Program,
        motion: M,
        extrusion: E,
    ) -> Result<InterpreterStats, InterpretError> {
        let mut interpreter = Interpreter::new(motion, extrusion, self.config.frame_transform());
        let result = interpreter.run(program);
        if result.is_err() {
            tracing::error!("Run aborted at machine state {:?}", interpreter.state());
        }
        result.map(|_| interpreter.stats())
    }
}

fn open_output(path: &str) -> Result<Box<dyn Write>, PrinterError> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map(|file| Box::new(file) as Box<dyn Write>)
        .map_err(|source| PrinterError::Output {
            path: path.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::parse_program;
    use tempfile::tempdir;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.transform.units_per_meter = -1.0;
        assert!(matches!(Printer::new(config), Err(PrinterError::Config(_))));
    }

    #[test]
    fn test_log_driver_stats() {
        let printer = Printer::new(Config::default()).unwrap();
        let program = parse_program("G0 X1\nG1 X2 E1\nG1 X3 E2\nG0 X0").unwrap();
        let stats = printer.print(&program).unwrap();
        assert_eq!(stats.rapid_moves, 2);
        assert_eq!(stats.extrude_moves, 2);
        assert_eq!(stats.extrusion_enables, 1);
        assert_eq!(stats.extrusion_disables, 1);
    }

    #[test]
    fn test_wire_driver_writes_frames() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("frames.jsonl");
        let mut config = Config::default();
        config.driver.kind = DriverKind::Wire;
        config.driver.output = out.to_str().unwrap().to_string();
        let printer = Printer::new(config).unwrap();
        let program = parse_program("G1 X500 Y0 Z100 E10 F1500\nG0 Z200").unwrap();
        printer.print(&program).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        let cmds: Vec<String> = written
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["cmd"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(cmds, vec!["extrusion", "move_extrude", "extrusion", "move_rapid"]);
    }

    #[test]
    fn test_unopenable_output() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.driver.kind = DriverKind::Wire;
        config.driver.output = dir.path().join("missing").join("frames.jsonl").to_str().unwrap().to_string();
        let printer = Printer::new(config).unwrap();
        let program = parse_program("G0 X1").unwrap();
        assert!(matches!(printer.print(&program), Err(PrinterError::Output { .. })));
    }
}
