//! Lenient JSON scanner that records where every value starts
//!
//! The scanner does not build values; it walks the raw text once, renders each value's
//! location with the same syntax the resolver uses, and remembers the line and column of
//! the property name (object members) or of the first character (array elements, root).

use crate::error::{Error, Result};
use crate::location::SourceLocation;
use crate::path::{append_index, append_property};
use std::collections::HashMap;

/// Nesting limit, matching serde_json's default recursion limit
const MAX_DEPTH: usize = 128;

pub(crate) struct LocationScanner {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    depth: usize,
    locations: HashMap<String, SourceLocation>,
}

impl LocationScanner {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            depth: 0,
            locations: HashMap::new(),
        }
    }

    /// Scan the whole text. On malformed input the locations gathered before the error
    /// are returned alongside it.
    pub(crate) fn scan(mut self) -> (HashMap<String, SourceLocation>, Option<Error>) {
        let outcome = self.scan_document();
        (self.locations, outcome.err())
    }

    fn scan_document(&mut self) -> Result<()> {
        // Byte order mark
        if self.current() == Some('\u{feff}') {
            self.advance();
        }
        self.skip_trivia()?;
        if self.current().is_none() {
            return Ok(());
        }
        self.record(String::new(), self.location());
        self.scan_value("")?;
        self.skip_trivia()?;
        match self.current() {
            None => Ok(()),
            Some(_) => Err(self.error("unexpected content after document")),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn error(&self, message: &'static str) -> Error {
        Error::Scan {
            line: self.line,
            column: self.column,
            message,
        }
    }

    fn record(&mut self, path: String, location: SourceLocation) {
        self.locations.insert(path, location);
    }

    fn expect(&mut self, expected: char, message: &'static str) -> Result<()> {
        if self.current() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Skip whitespace and comments (`//` and `/* */`)
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.current(), self.peek()) {
                (Some(c), _) if c.is_whitespace() => self.advance(),
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.current() {
                        self.advance();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    loop {
                        match (self.current(), self.peek()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => self.advance(),
                            (None, _) => return Err(self.error("unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_value(&mut self, path: &str) -> Result<()> {
        match self.current() {
            Some('{') => self.nested(|s| s.scan_object(path)),
            Some('[') => self.nested(|s| s.scan_array(path)),
            Some('"') => self.read_string().map(|_| ()),
            Some(c) if c == '-' || c.is_ascii_alphanumeric() => {
                self.skip_literal();
                Ok(())
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of text")),
        }
    }

    fn nested(&mut self, scan: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let outcome = scan(self);
        self.depth -= 1;
        outcome
    }

    fn scan_object(&mut self, path: &str) -> Result<()> {
        self.advance(); // '{'
        self.skip_trivia()?;
        if self.current() == Some('}') {
            self.advance();
            return Ok(());
        }

        loop {
            self.skip_trivia()?;
            if self.current() != Some('"') {
                return Err(self.error("expected property name"));
            }
            let location = self.location();
            let name = self.read_string()?;
            self.skip_trivia()?;
            self.expect(':', "expected ':'")?;
            self.skip_trivia()?;

            let member = append_property(path, &name);
            self.record(member.clone(), location);
            self.scan_value(&member)?;

            self.skip_trivia()?;
            match self.current() {
                Some(',') => {
                    self.advance();
                    self.skip_trivia()?;
                    // Trailing comma
                    if self.current() == Some('}') {
                        self.advance();
                        return Ok(());
                    }
                }
                Some('}') => {
                    self.advance();
                    return Ok(());
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn scan_array(&mut self, path: &str) -> Result<()> {
        self.advance(); // '['
        self.skip_trivia()?;
        if self.current() == Some(']') {
            self.advance();
            return Ok(());
        }

        let mut index = 0;
        loop {
            self.skip_trivia()?;
            let element = append_index(path, index);
            self.record(element.clone(), self.location());
            self.scan_value(&element)?;
            index += 1;

            self.skip_trivia()?;
            match self.current() {
                Some(',') => {
                    self.advance();
                    self.skip_trivia()?;
                    if self.current() == Some(']') {
                        self.advance();
                        return Ok(());
                    }
                }
                Some(']') => {
                    self.advance();
                    return Ok(());
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    /// Numbers, `true`, `false`, `null`
    fn skip_literal(&mut self) {
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.') {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.current() {
                Some('"') => {
                    self.advance();
                    return Ok(value);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self
                        .current()
                        .ok_or_else(|| self.error("unterminated escape"))?;
                    self.advance();
                    match escaped {
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        '/' => value.push('/'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'u' => value.push(self.read_unicode_escape()?),
                        _ => return Err(self.error("invalid escape")),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .current()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let high = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&high)
            && self.current() == Some('\\')
            && self.peek() == Some('u')
        {
            self.advance();
            self.advance();
            let low = self.read_hex4()?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}
