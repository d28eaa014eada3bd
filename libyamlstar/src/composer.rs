//! Phase 3: Composer
//!
//! The composer consumes parser events and builds one [`Document`] at a
//! time. Collections are built with an explicit frame stack, and an anchor
//! is registered as soon as its node's arena slot exists, so an alias inside
//! its own anchored collection produces a cycle instead of an error.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{ComposeErrorKind, LoadError, ParseErrorKind, Position, Result};
use crate::node::{scalar_key, structurally_equal, Document, Node, NodeId, Scalar, ScalarTag};
use crate::parser::{EventKind, Parser, CORE_TAG_PREFIX};
use crate::resolver::resolve;
use crate::scanner::ScalarStyle;

/// A collection under construction.
struct Frame {
    id: NodeId,
    pending_key: Option<NodeId>,
    /// Entry index of each scalar key seen so far, by value identity.
    scalar_keys: HashMap<(ScalarTag, String), usize>,
    /// Entry indices of collection keys, compared structurally.
    complex_keys: Vec<usize>,
}

impl Frame {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            pending_key: None,
            scalar_keys: HashMap::new(),
            complex_keys: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    positions: Vec<Position>,
    anchors: HashMap<String, NodeId>,
    stack: Vec<Frame>,
    root: Option<NodeId>,
}

impl Builder {
    fn push(&mut self, node: Node, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.positions.push(position);
        id
    }

    /// Later anchors with the same name shadow earlier ones.
    fn register(&mut self, anchor: Option<String>, id: NodeId) {
        if let Some(name) = anchor {
            self.anchors.insert(name, id);
        }
    }

    /// Attach a finished node to the innermost open collection, or make it
    /// the root.
    fn attach(&mut self, id: NodeId) {
        let Some(frame) = self.stack.last_mut() else {
            self.root = Some(id);
            return;
        };
        let parent = frame.id;

        if let Node::Sequence(items) = &mut self.nodes[parent.0] {
            items.push(id);
            return;
        }

        let Some(key) = frame.pending_key.take() else {
            frame.pending_key = Some(id);
            return;
        };

        let next_index = match &self.nodes[parent.0] {
            Node::Mapping(entries) => entries.len(),
            _ => return,
        };

        // Last write wins; the entry keeps its first position.
        let (existing, complex) = match &self.nodes[key.0] {
            Node::Scalar(scalar) => match frame.scalar_keys.entry(scalar_key(scalar)) {
                Entry::Occupied(slot) => (Some(*slot.get()), false),
                Entry::Vacant(slot) => {
                    slot.insert(next_index);
                    (None, false)
                }
            },
            _ => {
                let found = match &self.nodes[parent.0] {
                    Node::Mapping(entries) => frame
                        .complex_keys
                        .iter()
                        .copied()
                        .find(|&i| structurally_equal(&self.nodes, entries[i].0, key)),
                    _ => None,
                };
                (found, true)
            }
        };

        if let Node::Mapping(entries) = &mut self.nodes[parent.0] {
            match existing {
                Some(index) => entries[index].1 = id,
                None => {
                    if complex {
                        frame.complex_keys.push(next_index);
                    }
                    entries.push((key, id));
                }
            }
        }
    }
}

/// Explicit core tags that constrain a scalar.
fn core_scalar_tag(tag: &str) -> Option<ScalarTag> {
    match tag.strip_prefix(CORE_TAG_PREFIX)? {
        "null" => Some(ScalarTag::Null),
        "bool" => Some(ScalarTag::Bool),
        "int" => Some(ScalarTag::Int),
        "float" => Some(ScalarTag::Float),
        "timestamp" => Some(ScalarTag::Timestamp),
        "str" => Some(ScalarTag::Str),
        _ => None,
    }
}

/// Decide a scalar's tag: implicit resolution for untagged plain scalars,
/// validation against an explicit core tag, and string for everything else.
fn build_scalar(
    text: String,
    style: ScalarStyle,
    tag: Option<&str>,
    position: Position,
) -> Result<Scalar> {
    let tag = match tag {
        None if style == ScalarStyle::Plain => resolve(&text),
        None => ScalarTag::Str,
        Some(explicit) => match core_scalar_tag(explicit) {
            Some(ScalarTag::Str) | None => ScalarTag::Str,
            Some(wanted) => {
                let found = resolve(&text);
                let fits = found == wanted || (wanted == ScalarTag::Float && found == ScalarTag::Int);
                if !fits {
                    return Err(LoadError::compose(
                        ComposeErrorKind::InvalidTaggedScalar,
                        format!("'{}' is not a valid !!{} value", text, wanted),
                        position,
                    ));
                }
                wanted
            }
        },
    };
    Ok(Scalar { text, tag, style })
}

fn unexpected_event(what: &str, position: Position) -> LoadError {
    LoadError::parse(
        ParseErrorKind::UnexpectedToken,
        format!("unexpected {} in document body", what),
        position,
    )
}

/// Compose the next document of the stream, or `None` once the stream ends.
pub fn compose_document(parser: &mut Parser) -> Result<Option<Document>> {
    loop {
        let Some(event) = parser.next_event()? else {
            return Ok(None);
        };
        match event.kind {
            EventKind::StreamStart => continue,
            EventKind::StreamEnd => return Ok(None),
            EventKind::DocumentStart { .. } => {
                return compose_body(parser, event.position).map(Some);
            }
            _ => return Err(unexpected_event("node", event.position)),
        }
    }
}

fn compose_body(parser: &mut Parser, start: Position) -> Result<Document> {
    let mut builder = Builder::default();
    loop {
        let Some(event) = parser.next_event()? else {
            return Err(unexpected_event("end of stream", parser.position()));
        };
        let position = event.position;
        match event.kind {
            EventKind::Scalar {
                text,
                style,
                anchor,
                tag,
            } => {
                let scalar = build_scalar(text, style, tag.as_deref(), position)?;
                let id = builder.push(Node::Scalar(scalar), position);
                builder.register(anchor, id);
                builder.attach(id);
            }
            EventKind::Alias(name) => {
                let id = *builder.anchors.get(&name).ok_or_else(|| {
                    LoadError::compose(
                        ComposeErrorKind::UndefinedAlias,
                        format!("alias '*{}' does not refer to a defined anchor", name),
                        position,
                    )
                })?;
                builder.attach(id);
            }
            EventKind::SequenceStart { anchor, .. } => {
                let id = builder.push(Node::Sequence(Vec::new()), position);
                builder.register(anchor, id);
                builder.stack.push(Frame::new(id));
            }
            EventKind::MappingStart { anchor, .. } => {
                let id = builder.push(Node::Mapping(Vec::new()), position);
                builder.register(anchor, id);
                builder.stack.push(Frame::new(id));
            }
            EventKind::SequenceEnd | EventKind::MappingEnd => {
                let frame = builder
                    .stack
                    .pop()
                    .ok_or_else(|| unexpected_event("collection end", position))?;
                builder.attach(frame.id);
            }
            EventKind::DocumentEnd { .. } => {
                let root = builder
                    .root
                    .ok_or_else(|| unexpected_event("document end", position))?;
                return Ok(Document::new(
                    builder.nodes,
                    builder.positions,
                    root,
                    start,
                    position,
                ));
            }
            EventKind::StreamStart | EventKind::StreamEnd | EventKind::DocumentStart { .. } => {
                return Err(unexpected_event("stream event", position));
            }
        }
    }
}
