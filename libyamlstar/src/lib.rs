//! YAMLStar: a YAML loader producing a language-neutral data tree.
//!
//! YAML text is loaded into a node graph per document, with anchors and
//! aliases resolved into shared nodes and untagged scalars resolved to the
//! core schema (null, bool, int, float, timestamp, string). Documents can be
//! navigated directly, projected to JSON, or deserialized into any serde
//! type.
//!
//! # Loading Pipeline
//!
//! Loading operates in three phases:
//!
//! 1. **Scanner**: Converts source text into tokens, tracking indentation
//!    and flow nesting and inserting implicit key markers.
//!
//! 2. **Parser**: Converts the token stream into structural events with an
//!    explicit state stack, tracking document boundaries and tag handles.
//!
//! 3. **Composer**: Builds each document's node arena from the events,
//!    resolving scalars and aliases.
//!
//! # Example
//!
//! ```
//! use libyamlstar::load_one;
//!
//! let doc = load_one("database:\n  host: localhost\n  port: 5432").unwrap();
//! let port = doc.root().get("database").and_then(|db| db.get("port"));
//! assert_eq!(port.and_then(|p| p.as_i64()), Some(5432));
//! ```

mod boundary;
mod composer;
mod config;
mod error;
mod json;
mod node;
mod parser;
mod resolver;
mod scanner;
mod stream;

use serde::de::DeserializeOwned;

pub use boundary::{ErrorPayload, Response, YamlStar};
pub use composer::compose_document;
pub use config::{Config, DEBUG_ENV};
pub use error::{
    ComposeErrorKind, LexErrorKind, LoadError, ParseErrorKind, Position, ProjectionErrorKind,
    Result,
};
pub use json::{documents_to_json, MAX_JSON_DEPTH};
pub use node::{Document, Node, NodeId, NodeRef, Scalar, ScalarTag, ScalarValue};
pub use parser::{Event, EventKind, Parser, CORE_TAG_PREFIX};
pub use resolver::resolve;
pub use scanner::{Directive, ScalarStyle, Scanner, Token, TokenKind};
pub use stream::{documents, load_all, load_one, Documents};

/// The library version, reported by [`YamlStar::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deserialize the single document of a YAML stream.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// let map: BTreeMap<String, i64> = libyamlstar::from_str("a: 1\nb: 2").unwrap();
/// assert_eq!(map["b"], 2);
/// ```
pub fn from_str<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    let value = load_one(yaml)?.to_json()?;
    Ok(serde_json::from_value(value)?)
}

/// Deserialize every document of a YAML stream.
pub fn from_str_all<T: DeserializeOwned>(yaml: &str) -> Result<Vec<T>> {
    load_all(yaml)?
        .iter()
        .map(|doc| Ok(serde_json::from_value(doc.to_json()?)?))
        .collect()
}
