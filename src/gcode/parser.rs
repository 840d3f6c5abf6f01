//! Line-level G-code tokenizer with span tracking.
//!
//! A [`GCodeParser`] walks a single source line and yields words
//! (`G1`, `X10.5`), valueless flags (`G28 X Y`), comments (`; ...` and
//! `( ... )`), free text (`M117 Printing...`, `"MK3S"`) and checksums
//! (`*71`). Grouping words into commands is the loader's job.

use std::ops::Range;

/// Span of a token within its source line (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeSpan {
    pub range: Range<usize>,
}

impl GCodeSpan {
    /// One-based column of the first byte, for diagnostics.
    pub fn column(&self) -> usize {
        self.range.start + 1
    }
}

/// A single token of a G-code line.
#[derive(Debug, Clone, PartialEq)]
pub enum GCodeToken<'a> {
    /// Letter plus numeric literal, e.g. `X-1.5`. The letter is uppercased.
    Word { letter: char, value: f64, raw: &'a str, span: GCodeSpan },
    /// Letter with no value, e.g. the axes of `G28 X Y`.
    Flag { letter: char, span: GCodeSpan },
    /// Comment text without its delimiters.
    Comment(&'a str, GCodeSpan),
    /// Opaque argument: a quoted string or the message of `M117`/`M118`.
    Text(&'a str, GCodeSpan),
    /// `*NN` checksum together with the XOR of every byte that precedes it.
    Checksum { expected: u8, computed: u8, span: GCodeSpan },
}

/// Tokenizer error with span info.
#[derive(Debug, Clone, PartialEq)]
pub struct GCodeError {
    pub message: String,
    pub span: GCodeSpan,
}

impl std::fmt::Display for GCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (column {})", self.message, self.span.column())
    }
}

impl std::error::Error for GCodeError {}

#[derive(Debug, Clone, PartialEq)]
pub struct GCodeParserConfig {
    pub enable_comments: bool,
    pub enable_checksums: bool,
}

impl Default for GCodeParserConfig {
    fn default() -> Self {
        Self {
            enable_comments: true,
            enable_checksums: true,
        }
    }
}

/// M-codes whose argument is free text rather than words.
const TEXT_COMMANDS: [f64; 5] = [23.0, 28.0, 30.0, 117.0, 118.0];

pub struct GCodeParser<'a> {
    input: &'a str,
    config: GCodeParserConfig,
    pos: usize,
    expect_text: bool,
}

impl<'a> GCodeParser<'a> {
    pub fn new(input: &'a str, config: GCodeParserConfig) -> Self {
        Self { input, config, pos: 0, expect_text: false }
    }

    fn error(&mut self, start: usize, message: String) -> Option<Result<GCodeToken<'a>, GCodeError>> {
        // Nothing after an error on the same line is trustworthy.
        let end = (start + 1).min(self.input.len());
        self.pos = self.input.len();
        Some(Err(GCodeError {
            message,
            span: GCodeSpan { range: start..end },
        }))
    }

    fn parse_word(&mut self, letter: char) -> Option<Result<GCodeToken<'a>, GCodeError>> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        self.pos += 1;
        let value_start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_digit() || matches!(bytes[self.pos], b'.' | b'-' | b'+'))
        {
            self.pos += 1;
        }
        let raw = &self.input[value_start..self.pos];
        let letter = letter.to_ascii_uppercase();
        if raw.is_empty() {
            let bare = match bytes.get(self.pos) {
                None => true,
                Some(b) => b.is_ascii_whitespace() || b.is_ascii_alphabetic() || matches!(b, b';' | b'(' | b'*' | b'"'),
            };
            if bare {
                return Some(Ok(GCodeToken::Flag { letter, span: GCodeSpan { range: start..self.pos } }));
            }
            return self.error(start, format!("Missing value for word '{}'", letter));
        }
        match raw.parse::<f64>() {
            Ok(value) => {
                self.expect_text = letter == 'M' && TEXT_COMMANDS.contains(&value);
                Some(Ok(GCodeToken::Word {
                    letter,
                    value,
                    raw,
                    span: GCodeSpan { range: start..self.pos },
                }))
            }
            Err(_) => self.error(start, format!("Invalid number '{}' for word '{}'", raw, letter)),
        }
    }

    /// Rest of the line up to a comment or trailing checksum, if non-empty.
    fn parse_text(&mut self) -> Option<GCodeToken<'a>> {
        let input = self.input;
        let start = self.pos;
        let rest = &input[start..];
        let mut end = match rest.find(';') {
            Some(offset) if self.config.enable_comments => offset,
            _ => rest.len(),
        };
        if self.config.enable_checksums {
            if let Some(star) = rest[..end].rfind('*') {
                let digits = rest[star + 1..end].trim_end();
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    end = star;
                }
            }
        }
        let text = rest[..end].trim_end();
        if text.is_empty() {
            return None;
        }
        self.pos = start + end;
        Some(GCodeToken::Text(text, GCodeSpan { range: start..start + text.len() }))
    }

    fn parse_checksum(&mut self) -> Option<Result<GCodeToken<'a>, GCodeError>> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let computed = bytes[..start].iter().fold(0u8, |acc, b| acc ^ b);
        self.pos += 1;
        let digits_start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        match self.input[digits_start..self.pos].parse::<u8>() {
            Ok(expected) => Some(Ok(GCodeToken::Checksum {
                expected,
                computed,
                span: GCodeSpan { range: start..self.pos },
            })),
            Err(_) => self.error(start, "Malformed checksum".to_string()),
        }
    }

    /// Parses the next token, or `None` at end of line.
    pub fn next_token(&mut self) -> Option<Result<GCodeToken<'a>, GCodeError>> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        if std::mem::take(&mut self.expect_text) {
            if let Some(text) = self.parse_text() {
                return Some(Ok(text));
            }
        }

        let start = self.pos;
        let c = bytes[self.pos] as char;
        match c {
            ';' if self.config.enable_comments => {
                self.pos = bytes.len();
                let text = self.input[start + 1..].trim();
                Some(Ok(GCodeToken::Comment(text, GCodeSpan { range: start..self.pos })))
            }
            '(' if self.config.enable_comments => match self.input[start..].find(')') {
                Some(offset) => {
                    self.pos = start + offset + 1;
                    let text = self.input[start + 1..start + offset].trim();
                    Some(Ok(GCodeToken::Comment(text, GCodeSpan { range: start..self.pos })))
                }
                None => self.error(start, "Unclosed comment".to_string()),
            },
            // Program delimiter used by many post-processors.
            '%' if bytes[..start].iter().all(u8::is_ascii_whitespace) => {
                self.pos = bytes.len();
                Some(Ok(GCodeToken::Comment(self.input[start + 1..].trim(), GCodeSpan { range: start..self.pos })))
            }
            '"' => match self.input[start + 1..].find('"') {
                Some(offset) => {
                    self.pos = start + offset + 2;
                    Some(Ok(GCodeToken::Text(&self.input[start + 1..start + 1 + offset], GCodeSpan { range: start..self.pos })))
                }
                None => self.error(start, "Unclosed string".to_string()),
            },
            '*' if self.config.enable_checksums => self.parse_checksum(),
            _ if c.is_ascii_alphabetic() => self.parse_word(c),
            _ => self.error(start, format!("Unexpected character: {}", c)),
        }
    }
}

impl<'a> Iterator for GCodeParser<'a> {
    type Item = Result<GCodeToken<'a>, GCodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
