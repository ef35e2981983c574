//! Mapping resolved paths back to lines of the original source text

use crate::path;
use crate::scanner::LocationScanner;
use serde::Serialize;
use std::collections::HashMap;

/// Position in the source text. Line and column are 1-based; `0` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line_number: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line_number: usize, column: usize) -> Self {
        Self {
            line_number,
            column,
        }
    }

    /// Location with only a known line
    pub fn line(line_number: usize) -> Self {
        Self::new(line_number, 0)
    }

    pub fn is_known(&self) -> bool {
        self.line_number != 0
    }
}

/// Lookup capability the evaluation engine depends on.
pub trait SourceLocationResolver {
    /// Location of `path` in the source text, or [`SourceLocation::default`] when unknown.
    fn resolve_source_location(&self, path: &str) -> SourceLocation;
}

/// [`SourceLocationResolver`] built once from the raw JSON text of a document
#[derive(Debug, Clone, Default)]
pub struct JsonSourceLocationResolver {
    locations: HashMap<String, SourceLocation>,
    folded: HashMap<String, SourceLocation>,
    nearest_ancestor: bool,
}

impl JsonSourceLocationResolver {
    /// Scan `text` and index the location of every value in it.
    ///
    /// Malformed text is tolerated: everything before the point where the text breaks stays
    /// mapped, the rest resolves to the unknown location.
    pub fn new(text: &str) -> Self {
        let (locations, error) = LocationScanner::new(text).scan();
        if let Some(error) = error {
            tracing::warn!(%error, mapped = locations.len(), "source text only partially mapped");
        }

        let mut folded = HashMap::with_capacity(locations.len());
        for (path, location) in &locations {
            // Names differing only in case keep the earliest location
            folded
                .entry(path.to_ascii_lowercase())
                .and_modify(|existing: &mut SourceLocation| *existing = (*existing).min(*location))
                .or_insert(*location);
        }

        Self {
            locations,
            folded,
            nearest_ancestor: false,
        }
    }

    /// Fall back to the closest mapped ancestor when a path has no mapping of its own.
    pub fn with_nearest_ancestor(mut self, enabled: bool) -> Self {
        self.nearest_ancestor = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn lookup(&self, path: &str) -> Option<SourceLocation> {
        self.locations
            .get(path)
            .or_else(|| self.folded.get(&path.to_ascii_lowercase()))
            .copied()
    }
}

impl SourceLocationResolver for JsonSourceLocationResolver {
    fn resolve_source_location(&self, path: &str) -> SourceLocation {
        if let Some(location) = self.lookup(path) {
            return location;
        }

        if self.nearest_ancestor {
            let mut current = path::parent(path);
            while let Some(ancestor) = current {
                if let Some(location) = self.lookup(ancestor) {
                    return location;
                }
                current = path::parent(ancestor);
            }
        }

        SourceLocation::default()
    }
}
