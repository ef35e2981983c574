//! Path grammar for navigating template documents
//!
//! A path is a sequence of segments separated by `.`:
//!
//! ```text
//! properties.securityRules[*].properties.access
//! resources[0]['odd.name'].*
//! ```
//!
//! - `name` selects an object property (exact match first, then ASCII case-insensitive)
//! - `*` selects every child of an object or array
//! - `[n]` selects one array element
//! - `[*]` selects every array element
//! - `['name']` selects a property whose name is not a plain identifier
//!
//! Resolved locations are rendered back into the same syntax by [`append_property`] and
//! [`append_index`], which the resolver and the source line mapper share.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// One step of a parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object property by name
    Property(String),
    /// Every child of an object or array (`*`)
    Wildcard,
    /// Array element by position (`[n]`)
    Index(usize),
    /// Every array element (`[*]`)
    AnyIndex,
}

/// A parsed, immutable path relative to some scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: SmallVec<[Segment; 6]>,
}

impl JsonPath {
    /// Parse a path. The empty string parses to a path with no segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments = PathParser::new(raw).parse()?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when resolving this path can yield more than one scope.
    pub fn fans_out(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Wildcard | Segment::AnyIndex))
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

struct PathParser<'a> {
    raw: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> PathParser<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            chars: raw.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::invalid_path(self.raw, message)
    }

    fn parse(mut self) -> Result<SmallVec<[Segment; 6]>> {
        let mut segments = SmallVec::new();
        // A name (or `*`) is required at the start and after every `.`
        let mut expect_name = true;

        while let Some(c) = self.current() {
            match c {
                '.' => {
                    if expect_name {
                        return Err(self.error(format!("empty segment at offset {}", self.position)));
                    }
                    self.advance();
                    expect_name = true;
                }
                '[' => {
                    if expect_name && !segments.is_empty() {
                        return Err(self.error("'[' cannot follow '.'"));
                    }
                    segments.push(self.read_bracket()?);
                    expect_name = false;
                }
                _ => {
                    if !expect_name {
                        return Err(self.error(format!(
                            "unexpected '{}' at offset {}",
                            c, self.position
                        )));
                    }
                    let name = self.read_name();
                    if name == "*" {
                        segments.push(Segment::Wildcard);
                    } else {
                        segments.push(Segment::Property(name));
                    }
                    expect_name = false;
                }
            }
        }

        if expect_name && !segments.is_empty() {
            return Err(self.error("path ends with '.'"));
        }

        Ok(segments)
    }

    fn read_name(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.current() {
            if c == '.' || c == '[' {
                break;
            }
            self.advance();
        }
        self.chars[start..self.position].iter().collect()
    }

    fn read_bracket(&mut self) -> Result<Segment> {
        self.advance(); // '['

        let segment = match self.current() {
            Some('*') => {
                self.advance();
                Segment::AnyIndex
            }
            Some(quote @ ('\'' | '"')) => Segment::Property(self.read_quoted(quote)?),
            Some(c) if c.is_ascii_digit() => {
                let start = self.position;
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
                let digits: String = self.chars[start..self.position].iter().collect();
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| self.error(format!("index '{}' out of range", digits)))?;
                Segment::Index(index)
            }
            Some(c) => return Err(self.error(format!("unexpected '{}' inside brackets", c))),
            None => return Err(self.error("unterminated '['")),
        };

        match self.current() {
            Some(']') => {
                self.advance();
                Ok(segment)
            }
            _ => Err(self.error("expected ']'")),
        }
    }

    fn read_quoted(&mut self, quote: char) -> Result<String> {
        self.advance(); // opening quote
        let mut name = String::new();
        loop {
            match self.current() {
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        Some(c) => name.push(c),
                        None => return Err(self.error("unterminated escape")),
                    }
                    self.advance();
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(name);
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(self.error("unterminated quoted name")),
            }
        }
    }
}

// ============================================================================
// Rendering resolved locations
// ============================================================================

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "*"
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '@'))
}

/// Render the location of property `name` under `base`.
pub fn append_property(base: &str, name: &str) -> String {
    if is_plain_name(name) {
        if base.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", base, name)
        }
    } else {
        let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
        format!("{}['{}']", base, escaped)
    }
}

/// Render the location of element `index` under `base`.
pub fn append_index(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}

/// Join a scope's location with a relative path as written, for paths that did not resolve.
pub fn join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        base.to_string()
    } else if relative.starts_with('[') {
        format!("{}{}", base, relative)
    } else {
        format!("{}.{}", base, relative)
    }
}

/// The location one segment above `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }

    let mut boundary = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '.' | '[' => boundary = i,
            '\'' | '"' => quote = Some(c),
            _ => {}
        }
    }

    Some(&path[..boundary])
}
