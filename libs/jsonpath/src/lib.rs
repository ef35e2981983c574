//! Read-only navigation over template documents
//!
//! This crate provides the two collaborators the rule engine evaluates through:
//!
//! - [`PathResolver`]: a scoped view of a document that resolves relative paths
//!   (with wildcard fan-out) and narrows to resources of a given type
//! - [`SourceLocationResolver`]: maps a resolved path back to a line in the original text
//!
//! ```text
//! template JSON ──► JsonPathResolver ──resolve("properties.rules[*].access")──► [scopes]
//! raw text      ──► JsonSourceLocationResolver ──("resources[0].properties")──► line 12
//! ```

pub mod error;
pub mod location;
pub mod path;
pub mod resolver;
mod scanner;

pub use error::{Error, Result};
pub use location::{JsonSourceLocationResolver, SourceLocation, SourceLocationResolver};
pub use path::{JsonPath, Segment};
pub use resolver::{JsonPathResolver, PathResolver};
