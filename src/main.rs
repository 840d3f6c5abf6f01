// src/main.rs - Command-line entry point
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use armprint_rs::config::{self, Config, DriverKind};
use armprint_rs::{InterpreterStats, Printer, PrinterError};

/// Trace a G-code toolpath with a robotic arm
#[derive(Parser, Debug)]
#[command(name = "armprint", version, about = "Interpret G0/G1 moves and drive a robot arm along the toolpath.")]
struct Cli {
    /// Path to the G-code file
    gcode_file: PathBuf,

    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Actuator driver (overrides the config file)
    #[arg(long, value_enum)]
    driver: Option<DriverKind>,

    /// Wire driver output: device, file, or `-` for stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Build the printer from `cli` and trace the G-code file.
async fn run(cli: Cli) -> Result<InterpreterStats, PrinterError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(&path.to_string_lossy())?
        }
        None => Config::default(),
    };
    if let Some(driver) = cli.driver {
        config.driver.kind = driver;
    }
    if let Some(output) = cli.output {
        config.driver.output = output;
    }

    let printer = Printer::new(config)?;
    let offset = printer.config().transform.origin_offset;
    tracing::info!("Origin offset: x={} y={} z={} m", offset.x, offset.y, offset.z);

    let stats = printer.print_file(&cli.gcode_file).await?;
    tracing::info!("Traced {} moves from {}", stats.commands(), cli.gcode_file.display());
    Ok(stats)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // Frames may go to stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armprint_rs::{ConfigError, LoadError};
    use std::fs;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("armprint").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_missing_gcode_file_is_reported() {
        let err = run(cli(&["/no/such/part.gcode"])).await.unwrap_err();
        assert!(matches!(err, PrinterError::Load(LoadError::Io { .. })));
        assert!(err.to_string().contains("/no/such/part.gcode"));
    }

    #[tokio::test]
    async fn test_malformed_gcode_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.gcode");
        fs::write(&path, "G0 X1\nG1 X$2\n").unwrap();
        let err = run(cli(&[path.to_str().unwrap()])).await.unwrap_err();
        assert!(matches!(err, PrinterError::Load(LoadError::Parse { line: 2, .. })));
    }

    #[tokio::test]
    async fn test_missing_config_file_is_reported() {
        let err = run(cli(&["part.gcode", "-c", "/no/such/arm.toml"])).await.unwrap_err();
        assert!(matches!(err, PrinterError::Config(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_driver_flags_override_config() {
        let dir = tempdir().unwrap();
        let gcode = dir.path().join("part.gcode");
        let frames = dir.path().join("frames.jsonl");
        fs::write(&gcode, "G1 X10 E1\nG0 Z5\n").unwrap();
        let stats = run(cli(&[
            gcode.to_str().unwrap(),
            "--driver",
            "wire",
            "-o",
            frames.to_str().unwrap(),
        ]))
        .await
        .unwrap();
        assert_eq!(stats.commands(), 2);
        assert_eq!(fs::read_to_string(&frames).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_verbosity_counts() {
        assert_eq!(cli(&["part.gcode", "-vv"]).verbose, 2);
    }
}
