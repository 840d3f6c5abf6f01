//! # Run Configuration
//!
//! Frame transform, output driver and robot pose settings, loaded from TOML.
//! Every field has a default, so an empty file (or no file) reproduces the
//! stock setup: origin offset `{0.3, 0.3, 0.1}` m and millimetre input.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [transform]
//! origin_offset = { x = 0.3, y = 0.3, z = 0.1 }
//! units_per_meter = 1000.0
//!
//! [driver]
//! kind = "wire"
//! output = "/dev/ttyUSB0"
//!
//! [robot]
//! eef_step = 0.05
//! orientation_rpy = [3.141592653589793, 0.0, 0.0]
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::motion::FrameTransform;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

/// Machine-frame to robot-frame conversion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub origin_offset: OriginOffset,
    /// Machine units per robot metre (1000 for millimetre G-code).
    #[serde(default = "default_units_per_meter")]
    pub units_per_meter: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            origin_offset: OriginOffset::default(),
            units_per_meter: default_units_per_meter(),
        }
    }
}

/// Robot-frame position of the machine origin, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OriginOffset {
    #[serde(default = "default_offset_xy")]
    pub x: f64,
    #[serde(default = "default_offset_xy")]
    pub y: f64,
    #[serde(default = "default_offset_z")]
    pub z: f64,
}

impl Default for OriginOffset {
    fn default() -> Self {
        Self {
            x: default_offset_xy(),
            y: default_offset_xy(),
            z: default_offset_z(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Log every actuator call, move nothing.
    #[default]
    Log,
    /// Stream JSON-lines frames to a motion bridge.
    Wire,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub kind: DriverKind,
    /// Wire driver target; `-` means stdout.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::default(),
            output: default_output(),
        }
    }
}

/// Pose settings forwarded to the motion bridge with every move.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Cartesian interpolation step, metres.
    #[serde(default = "default_eef_step")]
    pub eef_step: f64,
    /// Fixed tool orientation as roll, pitch, yaw in radians (vertical wrist by default).
    #[serde(default = "default_orientation_rpy")]
    pub orientation_rpy: [f64; 3],
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            eef_step: default_eef_step(),
            orientation_rpy: default_orientation_rpy(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.transform;
        if !(t.units_per_meter.is_finite() && t.units_per_meter > 0.0) {
            return Err(ConfigError::Invalid("transform.units_per_meter must be > 0".to_string()));
        }
        let o = t.origin_offset;
        if ![o.x, o.y, o.z].iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid("transform.origin_offset must be finite".to_string()));
        }
        if !(self.robot.eef_step.is_finite() && self.robot.eef_step > 0.0) {
            return Err(ConfigError::Invalid("robot.eef_step must be > 0".to_string()));
        }
        if !self.robot.orientation_rpy.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid("robot.orientation_rpy must be finite".to_string()));
        }
        if self.driver.kind == DriverKind::Wire && self.driver.output.trim().is_empty() {
            return Err(ConfigError::Invalid("driver.output is required for the wire driver".to_string()));
        }
        Ok(())
    }

    pub fn frame_transform(&self) -> FrameTransform {
        let o = self.transform.origin_offset;
        FrameTransform::new([o.x, o.y, o.z]).with_units_per_meter(self.transform.units_per_meter)
    }
}

// Default value functions
fn default_units_per_meter() -> f64 { 1000.0 }
fn default_offset_xy() -> f64 { 0.3 }
fn default_offset_z() -> f64 { 0.1 }
fn default_output() -> String { "-".to_string() }
fn default_eef_step() -> f64 { 0.05 }
fn default_orientation_rpy() -> [f64; 3] { [std::f64::consts::PI, 0.0, 0.0] }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}
