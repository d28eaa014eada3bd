//! Projection of composed documents onto JSON values.

use std::slice;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::error::{LoadError, ProjectionErrorKind, Result};
use crate::node::{Document, Node, NodeId, Scalar, ScalarValue};

impl Document {
    /// Convert the document to a JSON value.
    ///
    /// Shared nodes are copied at each use. Mapping keys become strings:
    /// scalars use their canonical text, collections their compact JSON.
    /// Cycles cannot be represented and fail with a projection error, as
    /// does nesting deeper than [`MAX_JSON_DEPTH`].
    pub fn to_json(&self) -> Result<Value> {
        let mut projector = Projector {
            doc: self,
            on_path: vec![false; self.node_count()],
            stack: Vec::new(),
        };
        projector.project(self.root_id())
    }
}

/// Deepest collection nesting the projection will produce.
pub const MAX_JSON_DEPTH: usize = 512;

/// Project every document of a stream into a JSON array.
pub fn documents_to_json(documents: &[Document]) -> Result<Value> {
    documents
        .iter()
        .map(Document::to_json)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// A collection being projected.
struct Frame<'a> {
    id: NodeId,
    kind: FrameKind<'a>,
}

enum FrameKind<'a> {
    Sequence {
        items: slice::Iter<'a, NodeId>,
        out: Vec<Value>,
    },
    Mapping {
        entries: slice::Iter<'a, (NodeId, NodeId)>,
        map: Map<String, Value>,
        /// Text of the key whose value is being projected.
        key: Option<String>,
        /// Value waiting for its collection key to finish.
        value: Option<NodeId>,
    },
}

impl Frame<'_> {
    /// The next child node to project, or `None` when the frame is done.
    fn next_child(&mut self, doc: &Document) -> Option<NodeId> {
        match &mut self.kind {
            FrameKind::Sequence { items, .. } => items.next().copied(),
            FrameKind::Mapping {
                entries,
                key,
                value,
                ..
            } => {
                if let Some(pending) = value.take() {
                    return Some(pending);
                }
                let &(k, v) = entries.next()?;
                match doc.node(k) {
                    Node::Scalar(scalar) => {
                        *key = Some(scalar.value().canonical_text());
                        Some(v)
                    }
                    _ => {
                        *value = Some(v);
                        Some(k)
                    }
                }
            }
        }
    }

    /// Take a finished child. In a mapping, a finished child with no key
    /// text yet is a collection key and becomes its compact JSON.
    fn accept(&mut self, child: Value) -> Result<()> {
        match &mut self.kind {
            FrameKind::Sequence { out, .. } => out.push(child),
            FrameKind::Mapping { map, key, .. } => match key.take() {
                Some(text) => {
                    map.insert(text, child);
                }
                None => *key = Some(serde_json::to_string(&child)?),
            },
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self.kind {
            FrameKind::Sequence { out, .. } => Value::Array(out),
            FrameKind::Mapping { map, .. } => Value::Object(map),
        }
    }
}

struct Projector<'a> {
    doc: &'a Document,
    on_path: Vec<bool>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Projector<'a> {
    fn project(&mut self, root: NodeId) -> Result<Value> {
        let doc = self.doc;
        let mut finished = self.open(root)?;
        loop {
            let value = match finished.take() {
                Some(value) => value,
                None => {
                    let Some(top) = self.stack.last_mut() else {
                        return Ok(Value::Null);
                    };
                    if let Some(child) = top.next_child(doc) {
                        finished = self.open(child)?;
                        continue;
                    }
                    let Some(frame) = self.stack.pop() else {
                        return Ok(Value::Null);
                    };
                    self.on_path[frame.id.index()] = false;
                    frame.finish()
                }
            };
            match self.stack.last_mut() {
                Some(parent) => parent.accept(value)?,
                None => return Ok(value),
            }
        }
    }

    /// Start projecting `id`. Scalars finish at once; collections push a
    /// frame and return `None`.
    fn open(&mut self, id: NodeId) -> Result<Option<Value>> {
        let doc = self.doc;
        let kind = match doc.node(id) {
            Node::Scalar(scalar) => return Ok(Some(scalar_to_json(scalar))),
            Node::Sequence(items) => FrameKind::Sequence {
                items: items.iter(),
                out: Vec::with_capacity(items.len()),
            },
            Node::Mapping(entries) => FrameKind::Mapping {
                entries: entries.iter(),
                map: Map::new(),
                key: None,
                value: None,
            },
        };
        if self.on_path[id.index()] {
            return Err(self.error(
                id,
                ProjectionErrorKind::CyclicReference,
                "document contains a cyclic reference".to_string(),
            ));
        }
        if self.stack.len() >= MAX_JSON_DEPTH {
            return Err(self.error(
                id,
                ProjectionErrorKind::NestingTooDeep,
                format!("document nests deeper than {} levels", MAX_JSON_DEPTH),
            ));
        }
        self.on_path[id.index()] = true;
        self.stack.push(Frame { id, kind });
        Ok(None)
    }

    fn error(&self, id: NodeId, kind: ProjectionErrorKind, message: String) -> LoadError {
        LoadError::Projection {
            kind,
            message,
            position: self.doc.position_of(id),
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar.value() {
        ScalarValue::Null => Value::Null,
        ScalarValue::Bool(b) => Value::Bool(b),
        ScalarValue::Int(n) => int_to_json(&n),
        ScalarValue::Float(f) => float_to_json(f),
        ScalarValue::Timestamp(text) | ScalarValue::Str(text) => Value::String(text.to_string()),
    }
}

/// Exact when the integer fits 64 bits, nearest float otherwise.
fn int_to_json(n: &BigInt) -> Value {
    if let Some(i) = n.to_i64() {
        Value::from(i)
    } else if let Some(u) = n.to_u64() {
        Value::from(u)
    } else {
        n.to_f64().map(float_to_json).unwrap_or(Value::Null)
    }
}

/// Non-finite floats have no JSON form and become null.
fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::load_one;
    use serde_json::json;

    fn project(source: &str) -> Value {
        load_one(source).unwrap().to_json().unwrap()
    }

    #[test]
    fn test_project_mapping_in_order() {
        let value = project("zeta: 1\nalpha: two\nmid: [true, ~]\n");
        assert_eq!(value, json!({"zeta": 1, "alpha": "two", "mid": [true, null]}));
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_project_numbers() {
        assert_eq!(project("42"), json!(42));
        assert_eq!(project("-7"), json!(-7));
        assert_eq!(project("3.14"), json!(3.14));
        assert_eq!(project("18446744073709551615"), json!(18446744073709551615u64));
        assert_eq!(project("0x10"), json!(16));
        let big = project("123456789012345678901234567890").as_f64().unwrap();
        assert!((big / 1.2345678901234568e29 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        assert_eq!(project("[.inf, -.inf, .nan]"), json!([null, null, null]));
    }

    #[test]
    fn test_non_string_keys() {
        assert_eq!(
            project("1: a\ntrue: b\n~: c\n2.50: d\n"),
            json!({"1": "a", "true": "b", "null": "c", "2.5": "d"})
        );
        assert_eq!(
            project("? [a, 1]\n: x\n"),
            json!({"[\"a\",1]": "x"})
        );
    }

    #[test]
    fn test_aliases_are_copied() {
        assert_eq!(
            project("base: &b {x: 1}\nother: *b\n"),
            json!({"base": {"x": 1}, "other": {"x": 1}})
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let doc = load_one("&a [1, *a]").unwrap();
        let err = doc.to_json().unwrap_err();
        assert!(matches!(
            err,
            LoadError::Projection {
                kind: ProjectionErrorKind::CyclicReference,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_collection_keys() {
        assert_eq!(
            project("? [a, [b, {c: 1}]]\n: x\n? {c: [1]}\n: z\n"),
            json!({"[\"a\",[\"b\",{\"c\":1}]]": "x", "{\"c\":[1]}": "z"})
        );
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn test_deep_nesting_up_to_limit() {
        let value = project(&nested(MAX_JSON_DEPTH));
        let mut depth = 0;
        let mut current = &value;
        while let Value::Array(items) = current {
            depth += 1;
            match items.first() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        assert_eq!(depth, MAX_JSON_DEPTH);
    }

    #[test]
    fn test_nesting_past_limit_is_rejected() {
        let doc = load_one(&nested(MAX_JSON_DEPTH + 1)).unwrap();
        match doc.to_json().unwrap_err() {
            LoadError::Projection { kind, position, .. } => {
                assert_eq!(kind, ProjectionErrorKind::NestingTooDeep);
                assert_eq!(position.line, 1);
                assert_eq!(position.column, MAX_JSON_DEPTH + 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_very_deep_document_fails_cleanly() {
        let doc = load_one(&nested(100_000)).unwrap();
        assert_eq!(doc.node_count(), 100_000);
        assert!(matches!(
            doc.to_json(),
            Err(LoadError::Projection {
                kind: ProjectionErrorKind::NestingTooDeep,
                ..
            })
        ));
    }

    #[test]
    fn test_timestamp_stays_text() {
        assert_eq!(project("d: 2001-12-14"), json!({"d": "2001-12-14"}));
    }
}
