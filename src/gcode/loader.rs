//! Program loader: reads a G-code file, parses every line, and keeps only
//! the G0/G1 motion commands in file order.
//!
//! The whole source is read and parsed before anything is yielded, so a
//! malformed line fails the load as a whole. The resulting [`Program`] owns
//! its commands and can be iterated as often as needed.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::gcode::parser::{GCodeParser, GCodeParserConfig, GCodeToken};
use crate::gcode::{Axis, CommandKind, Params, ParsedCommand};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read G-code file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("line {line}: checksum mismatch (expected {expected}, computed {actual})")]
    Checksum { line: usize, expected: u8, actual: u8 },
}

/// Fully parsed motion program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    commands: Vec<ParsedCommand>,
    source: Option<PathBuf>,
    skipped: usize,
}

impl Program {
    /// Restartable iterator over the motion commands in source order.
    pub fn commands(&self) -> std::slice::Iter<'_, ParsedCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Path the program was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of parsed commands dropped because they were not G0/G1.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl IntoIterator for Program {
    type Item = ParsedCommand;
    type IntoIter = std::vec::IntoIter<ParsedCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a ParsedCommand;
    type IntoIter = std::slice::Iter<'a, ParsedCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// A command word and the parameters that followed it on the same line.
struct RawCommand {
    letter: char,
    number: f64,
    line: usize,
    words: Vec<(char, f64)>,
}

/// Load and parse a G-code file with the default parser settings.
pub async fn load_program(path: impl AsRef<Path>) -> Result<Program, LoadError> {
    load_program_with(path, GCodeParserConfig::default()).await
}

pub async fn load_program_with(
    path: impl AsRef<Path>,
    config: GCodeParserConfig,
) -> Result<Program, LoadError> {
    let path = path.as_ref();
    tracing::info!("Opening gcode file: {}", path.display());
    let content = fs::read_to_string(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut program = parse_program_with(&content, config)?;
    program.source = Some(path.to_path_buf());
    Ok(program)
}

/// Parse in-memory G-code text with the default parser settings.
pub fn parse_program(source: &str) -> Result<Program, LoadError> {
    parse_program_with(source, GCodeParserConfig::default())
}

pub fn parse_program_with(source: &str, config: GCodeParserConfig) -> Result<Program, LoadError> {
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    let mut raw = Vec::new();
    for (index, text) in source.lines().enumerate() {
        parse_line(index + 1, text, &config, &mut raw)?;
    }

    let mut program = Program::default();
    for command in raw {
        match into_motion_command(command) {
            Some(parsed) => program.commands.push(parsed),
            None => program.skipped += 1,
        }
    }
    tracing::info!(
        "Parsed {} motion commands ({} other commands skipped)",
        program.commands.len(),
        program.skipped
    );
    Ok(program)
}

fn parse_line(
    line: usize,
    text: &str,
    config: &GCodeParserConfig,
    out: &mut Vec<RawCommand>,
) -> Result<(), LoadError> {
    let mut current: Option<RawCommand> = None;
    let mut orphans = 0usize;

    for token in GCodeParser::new(text, config.clone()) {
        let token = token.map_err(|e| LoadError::Parse {
            line,
            column: e.span.column(),
            message: e.message,
        })?;
        match token {
            GCodeToken::Word { letter: letter @ ('G' | 'M' | 'T'), value, .. } => {
                out.extend(current.take());
                current = Some(RawCommand { letter, number: value, line, words: Vec::new() });
            }
            // Line numbers carry no motion information.
            GCodeToken::Word { letter: 'N', .. } => {}
            GCodeToken::Word { letter, value, .. } => match current.as_mut() {
                Some(command) => command.words.push((letter, value)),
                None => orphans += 1,
            },
            GCodeToken::Flag { letter, span } => match current.as_ref() {
                Some(command) => {
                    let kind = CommandKind::from_word(command.letter, command.number);
                    if kind != CommandKind::Other && Axis::from_letter(letter).is_some() {
                        return Err(LoadError::Parse {
                            line,
                            column: span.column(),
                            message: format!("Missing value for word '{}' on {}", letter, kind),
                        });
                    }
                    tracing::debug!("Line {}: ignoring flag {} on {}{}", line, letter, command.letter, command.number);
                }
                None => orphans += 1,
            },
            GCodeToken::Comment(..) | GCodeToken::Text(..) => {}
            GCodeToken::Checksum { expected, computed, .. } => {
                if expected != computed {
                    return Err(LoadError::Checksum { line, expected, actual: computed });
                }
            }
        }
    }

    if orphans > 0 && current.is_none() {
        tracing::warn!("Line {}: parameters without a command word, skipping: {}", line, text.trim());
    }
    out.extend(current);
    Ok(())
}

fn into_motion_command(command: RawCommand) -> Option<ParsedCommand> {
    let kind = CommandKind::from_word(command.letter, command.number);
    if kind == CommandKind::Other {
        tracing::debug!("Line {}: skipping {}{}", command.line, command.letter, command.number);
        return None;
    }

    let mut params = Params::new();
    for (letter, value) in command.words {
        match Axis::from_letter(letter) {
            Some(axis) => params.set(axis, value),
            None => tracing::debug!("Line {}: ignoring parameter {}{} on {}", command.line, letter, value, kind),
        }
    }
    Some(ParsedCommand { kind, params, line: command.line })
}
