//! Document stream loading.

use std::iter::FusedIterator;

use crate::composer::compose_document;
use crate::error::{LoadError, Position, Result};
use crate::node::Document;
use crate::parser::Parser;

/// Lazy, single-pass sequence of the documents in a YAML stream.
///
/// Each document is fully composed before it is yielded. The first error
/// ends the sequence. Once exhausted, [`Documents::next_document`] fails
/// with [`LoadError::StreamExhausted`] while the iterator stays fused.
pub struct Documents {
    parser: Parser,
    finished: bool,
}

impl Documents {
    fn new(text: &str) -> Self {
        Self {
            parser: Parser::new(text),
            finished: false,
        }
    }

    /// Compose the next document, `Ok(None)` at the end of the stream.
    pub fn next_document(&mut self) -> Result<Option<Document>> {
        if self.finished {
            return Err(LoadError::StreamExhausted);
        }
        match compose_document(&mut self.parser) {
            Ok(Some(doc)) => Ok(Some(doc)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// The current read position in the source.
    pub fn position(&self) -> Position {
        self.parser.position()
    }
}

impl Iterator for Documents {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.next_document().transpose()
    }
}

impl FusedIterator for Documents {}

/// Iterate over the documents of a stream.
pub fn documents(text: &str) -> Documents {
    Documents::new(text)
}

/// Load every document of a stream; the first failure aborts.
pub fn load_all(text: &str) -> Result<Vec<Document>> {
    documents(text).collect()
}

/// Load a stream that must contain exactly one document.
pub fn load_one(text: &str) -> Result<Document> {
    let mut docs = documents(text);
    let Some(first) = docs.next_document()? else {
        return Err(LoadError::EmptyOrMultipleDocuments {
            found: 0,
            position: docs.position(),
        });
    };
    let Some(second) = docs.next_document()? else {
        return Ok(first);
    };
    let mut found = 2;
    while docs.next_document()?.is_some() {
        found += 1;
    }
    Err(LoadError::EmptyOrMultipleDocuments {
        found,
        position: second.start(),
    })
}
