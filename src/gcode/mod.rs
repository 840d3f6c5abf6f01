// src/gcode/mod.rs - Parsed motion commands and the program loader
use std::collections::BTreeMap;
use std::fmt;

pub mod loader;
pub mod parser;

pub use loader::{load_program, parse_program, LoadError, Program};

/// Parameter letters the interpreter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
    F,
}

impl Axis {
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::E, Axis::F];

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'E' => Some(Axis::E),
            'F' => Some(Axis::F),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
            Axis::F => 'F',
        }
    }
}

/// Motion command kind. Only `G0` and `G1` are ever yielded by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Rapid positioning, no extrusion.
    G0,
    /// Linear move with extrusion and feedrate.
    G1,
    Other,
}

impl CommandKind {
    /// Classifies a command word such as `G1` or `G1.0`.
    pub fn from_word(letter: char, number: f64) -> Self {
        if !letter.eq_ignore_ascii_case(&'G') {
            return CommandKind::Other;
        }
        if number == 0.0 {
            CommandKind::G0
        } else if number == 1.0 {
            CommandKind::G1
        } else {
            CommandKind::Other
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::G0 => write!(f, "G0"),
            CommandKind::G1 => write!(f, "G1"),
            CommandKind::Other => write!(f, "non-motion command"),
        }
    }
}

/// Axis values supplied on one line. Absent axes mean "keep previous".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<Axis, f64>);

impl Params {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert, handy for constructing commands by hand.
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        self.set(axis, value);
        self
    }

    /// Sets an axis value; a repeated letter on one line overwrites the earlier one.
    pub fn set(&mut self, axis: Axis, value: f64) {
        self.0.insert(axis, value);
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        self.0.get(&axis).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        self.0.iter().map(|(axis, value)| (*axis, *value))
    }
}

impl FromIterator<(Axis, f64)> for Params {
    fn from_iter<T: IntoIterator<Item = (Axis, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One motion command as read from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    pub params: Params,
    /// One-based source line, 0 when built by hand.
    pub line: usize,
}

impl ParsedCommand {
    pub fn new(kind: CommandKind, params: Params) -> Self {
        Self { kind, params, line: 0 }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (axis, value) in self.params.iter() {
            write!(f, " {}{}", axis.letter(), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_classification() {
        assert_eq!(CommandKind::from_word('G', 0.0), CommandKind::G0);
        assert_eq!(CommandKind::from_word('g', 1.0), CommandKind::G1);
        assert_eq!(CommandKind::from_word('G', 92.0), CommandKind::Other);
        assert_eq!(CommandKind::from_word('G', 1.5), CommandKind::Other);
        assert_eq!(CommandKind::from_word('M', 1.0), CommandKind::Other);
    }

    #[test]
    fn test_params_last_write_wins() {
        let mut params = Params::new().with(Axis::X, 1.0);
        params.set(Axis::X, 2.0);
        assert_eq!(params.get(Axis::X), Some(2.0));
        assert_eq!(params.get(Axis::Y), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_axis_letters_round_trip_case_insensitively() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_letter(axis.letter().to_ascii_lowercase()), Some(axis));
        }
        assert_eq!(Axis::from_letter('S'), None);
    }

    #[test]
    fn test_display() {
        let cmd = ParsedCommand::new(CommandKind::G1, Params::new().with(Axis::Y, 5.0).with(Axis::X, 10.0));
        assert_eq!(cmd.to_string(), "G1 X10 Y5");
    }
}
