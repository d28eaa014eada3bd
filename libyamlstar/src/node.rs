//! Node graph types.
//!
//! A [`Document`] owns an arena of nodes addressed by [`NodeId`]. Aliases
//! resolve to the id of their anchored node, so shared and cyclic structure
//! is represented without reference counting.

use std::collections::{HashMap, HashSet};
use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::Position;
use crate::resolver::{canonical_float, parse_bool, parse_float, parse_int};
use crate::scanner::ScalarStyle;

/// Index of a node in its document's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Resolved core-schema type of a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    Null,
    Bool,
    Int,
    Float,
    Timestamp,
    Str,
}

impl fmt::Display for ScalarTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarTag::Null => "null",
            ScalarTag::Bool => "bool",
            ScalarTag::Int => "int",
            ScalarTag::Float => "float",
            ScalarTag::Timestamp => "timestamp",
            ScalarTag::Str => "str",
        };
        f.write_str(name)
    }
}

/// A scalar node: its decoded text plus the resolved tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scalar {
    pub text: String,
    pub tag: ScalarTag,
    pub style: ScalarStyle,
}

/// The typed value of a scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue<'a> {
    Null,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    /// Timestamps keep their source text.
    Timestamp(&'a str),
    Str(&'a str),
}

impl Scalar {
    /// Interpret the text according to the tag.
    pub fn value(&self) -> ScalarValue<'_> {
        let text = self.text.as_str();
        match self.tag {
            ScalarTag::Null => ScalarValue::Null,
            ScalarTag::Bool => ScalarValue::Bool(parse_bool(text).unwrap_or(false)),
            ScalarTag::Int => match parse_int(text) {
                Some(n) => ScalarValue::Int(n),
                None => ScalarValue::Str(text),
            },
            ScalarTag::Float => {
                let value = parse_float(text).or_else(|| parse_int(text).and_then(|n| n.to_f64()));
                match value {
                    Some(f) => ScalarValue::Float(f),
                    None => ScalarValue::Str(text),
                }
            }
            ScalarTag::Timestamp => ScalarValue::Timestamp(text),
            ScalarTag::Str => ScalarValue::Str(text),
        }
    }
}

impl ScalarValue<'_> {
    /// Canonical text: the same text for every spelling of the same value.
    pub fn canonical_text(&self) -> String {
        match self {
            ScalarValue::Null => "null".to_string(),
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Int(n) => n.to_string(),
            ScalarValue::Float(f) => canonical_float(*f),
            ScalarValue::Timestamp(s) | ScalarValue::Str(s) => s.to_string(),
        }
    }

    pub fn tag(&self) -> ScalarTag {
        match self {
            ScalarValue::Null => ScalarTag::Null,
            ScalarValue::Bool(_) => ScalarTag::Bool,
            ScalarValue::Int(_) => ScalarTag::Int,
            ScalarValue::Float(_) => ScalarTag::Float,
            ScalarValue::Timestamp(_) => ScalarTag::Timestamp,
            ScalarValue::Str(_) => ScalarTag::Str,
        }
    }
}

/// A node in the document graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<NodeId>),
    /// Entries in first-insertion order with unique keys.
    Mapping(Vec<(NodeId, NodeId)>),
}

impl Node {
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

/// Identity of a scalar mapping key: equal for equal values, whatever the
/// spelling (`1` and `0x1`, `~` and `null`).
pub(crate) fn scalar_key(scalar: &Scalar) -> (ScalarTag, String) {
    let value = scalar.value();
    (value.tag(), value.canonical_text())
}

/// Structural equality of two nodes, safe on cyclic and deeply nested
/// graphs.
///
/// Pairs already under comparison are assumed equal, so a cycle compares
/// equal to a cycle of the same shape. Mapping entries with scalar keys are
/// matched by key identity; entries with collection keys are matched in
/// order.
pub(crate) fn structurally_equal(nodes: &[Node], a: NodeId, b: NodeId) -> bool {
    let mut assumed = HashSet::new();
    let mut pending = vec![(a, b)];

    while let Some((a, b)) = pending.pop() {
        if a == b || !assumed.insert((a, b)) {
            continue;
        }
        match (&nodes[a.0], &nodes[b.0]) {
            (Node::Scalar(x), Node::Scalar(y)) => {
                if scalar_key(x) != scalar_key(y) {
                    return false;
                }
            }
            (Node::Sequence(xs), Node::Sequence(ys)) => {
                if xs.len() != ys.len() {
                    return false;
                }
                pending.extend(xs.iter().copied().zip(ys.iter().copied()));
            }
            (Node::Mapping(xs), Node::Mapping(ys)) => {
                if xs.len() != ys.len() || !pair_entries(nodes, xs, ys, &mut pending) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// Queue the value pairs of two mappings of equal length, or return false
/// when their keys cannot line up.
fn pair_entries(
    nodes: &[Node],
    xs: &[(NodeId, NodeId)],
    ys: &[(NodeId, NodeId)],
    pending: &mut Vec<(NodeId, NodeId)>,
) -> bool {
    let mut by_key = HashMap::new();
    let mut complex = Vec::new();
    for &(key, value) in ys {
        match &nodes[key.0] {
            Node::Scalar(scalar) => {
                by_key.insert(scalar_key(scalar), value);
            }
            _ => complex.push((key, value)),
        }
    }

    let mut complex = complex.into_iter();
    for &(key, value) in xs {
        match &nodes[key.0] {
            Node::Scalar(scalar) => match by_key.get(&scalar_key(scalar)) {
                Some(&other) => pending.push((value, other)),
                None => return false,
            },
            _ => match complex.next() {
                Some((other_key, other)) => {
                    pending.push((key, other_key));
                    pending.push((value, other));
                }
                None => return false,
            },
        }
    }
    complex.next().is_none()
}

/// One composed YAML document.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    positions: Vec<Position>,
    root: NodeId,
    start: Position,
    end: Position,
}

impl Document {
    pub(crate) fn new(
        nodes: Vec<Node>,
        positions: Vec<Position>,
        root: NodeId,
        start: Position,
        end: Position,
    ) -> Self {
        Self {
            nodes,
            positions,
            root,
            start,
            end,
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.get(self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Where the node starts in the source.
    pub fn position_of(&self, id: NodeId) -> Position {
        self.positions[id.0]
    }

    /// Position of the document start (its `---`, or its first content).
    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    /// Number of distinct nodes; aliases do not add nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A borrowed view of one node, for navigating a document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        self.doc.node(self.id)
    }

    pub fn position(&self) -> Position {
        self.doc.position_of(self.id)
    }

    pub fn as_scalar(&self) -> Option<&'a Scalar> {
        match self.node() {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<ScalarTag> {
        self.as_scalar().map(|s| s.tag)
    }

    pub fn is_null(&self) -> bool {
        self.tag() == Some(ScalarTag::Null)
    }

    /// Text of a string or timestamp scalar.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.as_scalar()? {
            s if matches!(s.tag, ScalarTag::Str | ScalarTag::Timestamp) => Some(&s.text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()?.value() {
            ScalarValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()?.value() {
            ScalarValue::Int(n) => n.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_scalar()?.value() {
            ScalarValue::Float(f) => Some(f),
            ScalarValue::Int(n) => n.to_f64(),
            _ => None,
        }
    }

    /// Items of a sequence.
    pub fn items(&self) -> Option<impl Iterator<Item = NodeRef<'a>> + 'a> {
        let doc = self.doc;
        match self.node() {
            Node::Sequence(items) => Some(items.iter().map(move |id| doc.get(*id))),
            _ => None,
        }
    }

    /// Key/value pairs of a mapping, in document order.
    pub fn entries(&self) -> Option<impl Iterator<Item = (NodeRef<'a>, NodeRef<'a>)> + 'a> {
        let doc = self.doc;
        match self.node() {
            Node::Mapping(entries) => Some(
                entries
                    .iter()
                    .map(move |(k, v)| (doc.get(*k), doc.get(*v))),
            ),
            _ => None,
        }
    }

    /// Number of items or entries; `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self.node() {
            Node::Scalar(_) => None,
            Node::Sequence(items) => Some(items.len()),
            Node::Mapping(entries) => Some(entries.len()),
        }
    }

    /// Look up a mapping value by the canonical text of a scalar key.
    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        self.entries()?
            .find(|(k, _)| {
                k.as_scalar()
                    .map(|s| s.value().canonical_text() == key)
                    .unwrap_or(false)
            })
            .map(|(_, v)| v)
    }

    /// Sequence item by index.
    pub fn index(&self, index: usize) -> Option<NodeRef<'a>> {
        match self.node() {
            Node::Sequence(items) => items.get(index).map(|id| self.doc.get(*id)),
            _ => None,
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.node().type_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(text: &str, tag: ScalarTag) -> Node {
        Node::Scalar(Scalar {
            text: text.to_string(),
            tag,
            style: ScalarStyle::Plain,
        })
    }

    #[test]
    fn test_scalar_values() {
        let int = Scalar {
            text: "0x1F".to_string(),
            tag: ScalarTag::Int,
            style: ScalarStyle::Plain,
        };
        assert_eq!(int.value(), ScalarValue::Int(BigInt::from(31)));
        assert_eq!(int.value().canonical_text(), "31");

        let float = Scalar {
            text: "1".to_string(),
            tag: ScalarTag::Float,
            style: ScalarStyle::DoubleQuoted,
        };
        assert_eq!(float.value(), ScalarValue::Float(1.0));
        assert_eq!(float.value().canonical_text(), "1.0");
    }

    #[test]
    fn test_scalar_key_identity() {
        let a = Scalar {
            text: "~".to_string(),
            tag: ScalarTag::Null,
            style: ScalarStyle::Plain,
        };
        let b = Scalar {
            text: "null".to_string(),
            tag: ScalarTag::Null,
            style: ScalarStyle::Plain,
        };
        let c = Scalar {
            text: "null".to_string(),
            tag: ScalarTag::Str,
            style: ScalarStyle::SingleQuoted,
        };
        assert_eq!(scalar_key(&a), scalar_key(&b));
        assert_ne!(scalar_key(&b), scalar_key(&c));
    }

    #[test]
    fn test_structural_equality() {
        let nodes = vec![
            scalar("1", ScalarTag::Int),
            scalar("0x1", ScalarTag::Int),
            Node::Sequence(vec![NodeId(0)]),
            Node::Sequence(vec![NodeId(1)]),
            Node::Sequence(vec![NodeId(0), NodeId(1)]),
        ];
        assert!(structurally_equal(&nodes, NodeId(2), NodeId(3)));
        assert!(!structurally_equal(&nodes, NodeId(2), NodeId(4)));
        assert!(!structurally_equal(&nodes, NodeId(0), NodeId(2)));
    }

    #[test]
    fn test_structural_equality_terminates_on_cycles() {
        let nodes = vec![
            Node::Sequence(vec![NodeId(0)]),
            Node::Sequence(vec![NodeId(1)]),
        ];
        assert!(structurally_equal(&nodes, NodeId(0), NodeId(1)));
    }

    #[test]
    fn test_structural_equality_of_mappings_ignores_order() {
        let nodes = vec![
            scalar("a", ScalarTag::Str),
            scalar("1", ScalarTag::Int),
            scalar("b", ScalarTag::Str),
            scalar("0x1", ScalarTag::Int),
            Node::Mapping(vec![(NodeId(0), NodeId(1)), (NodeId(2), NodeId(1))]),
            Node::Mapping(vec![(NodeId(2), NodeId(3)), (NodeId(0), NodeId(3))]),
            Node::Mapping(vec![(NodeId(0), NodeId(1)), (NodeId(1), NodeId(1))]),
        ];
        assert!(structurally_equal(&nodes, NodeId(4), NodeId(5)));
        assert!(!structurally_equal(&nodes, NodeId(4), NodeId(6)));
    }

    #[test]
    fn test_structural_equality_of_deep_chains() {
        let depth = 100_000;
        // Two chains of nested sequences, each ending in a scalar.
        let mut nodes = vec![scalar("1", ScalarTag::Int), scalar("0x1", ScalarTag::Int)];
        for i in 0..depth {
            let inner = if i == 0 { 0 } else { nodes.len() - 2 };
            nodes.push(Node::Sequence(vec![NodeId(inner)]));
            let inner = if i == 0 { 1 } else { nodes.len() - 2 };
            nodes.push(Node::Sequence(vec![NodeId(inner)]));
        }
        let (a, b) = (NodeId(nodes.len() - 2), NodeId(nodes.len() - 1));
        assert!(structurally_equal(&nodes, a, b));

        nodes[1] = scalar("2", ScalarTag::Int);
        assert!(!structurally_equal(&nodes, a, b));
    }

    #[test]
    fn test_node_ref_navigation() {
        let nodes = vec![
            scalar("name", ScalarTag::Str),
            scalar("yamlstar", ScalarTag::Str),
            scalar("ports", ScalarTag::Str),
            scalar("80", ScalarTag::Int),
            Node::Sequence(vec![NodeId(3)]),
            Node::Mapping(vec![(NodeId(0), NodeId(1)), (NodeId(2), NodeId(4))]),
        ];
        let positions = vec![Position::start(); nodes.len()];
        let doc = Document::new(
            nodes,
            positions,
            NodeId(5),
            Position::start(),
            Position::start(),
        );

        let root = doc.root();
        assert_eq!(root.len(), Some(2));
        assert_eq!(root.get("name").and_then(|n| n.as_str()), Some("yamlstar"));
        let ports = root.get("ports").expect("ports");
        assert_eq!(ports.index(0).and_then(|n| n.as_i64()), Some(80));
        assert_eq!(ports.index(0).and_then(|n| n.as_f64()), Some(80.0));
        assert!(root.get("missing").is_none());
        assert!(root.as_str().is_none());
    }
}
