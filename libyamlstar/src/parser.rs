//! Phase 2: Parser
//!
//! The parser turns tokens into a flat stream of structural events using an
//! explicit state stack, so nesting depth never grows the call stack. It
//! tracks document boundaries, resolves tag handles against `%TAG`
//! directives, and classifies structural errors.

use std::collections::HashMap;

use crate::error::{LoadError, ParseErrorKind, Position, Result};
use crate::scanner::{Directive, ScalarStyle, Scanner, Token, TokenKind};

/// Prefix of the standard `!!` tag handle.
pub const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Event type in the parser output.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart {
        explicit: bool,
    },
    DocumentEnd {
        explicit: bool,
    },
    Alias(String),
    Scalar {
        text: String,
        style: ScalarStyle,
        anchor: Option<String>,
        tag: Option<String>,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        flow: bool,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        flow: bool,
    },
    MappingEnd,
}

/// A single parser event.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub position: Position,
}

impl Event {
    fn new(kind: EventKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// An empty plain scalar, used for omitted keys and values.
    fn empty_scalar(position: Position, anchor: Option<String>, tag: Option<String>) -> Self {
        Self::new(
            EventKind::Scalar {
                text: String::new(),
                style: ScalarStyle::Plain,
                anchor,
                tag,
            },
            position,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    BlockNode,
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    End,
}

/// Pull-based event producer over a [`Scanner`].
pub struct Parser {
    scanner: Scanner,
    current: Option<Token>,
    state: State,
    states: Vec<State>,
    tag_handles: HashMap<String, String>,
    /// Opening positions of the flow collections we are inside.
    flow_marks: Vec<Position>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            scanner: Scanner::new(source),
            current: None,
            state: State::StreamStart,
            states: Vec::new(),
            tag_handles: HashMap::new(),
            flow_marks: Vec::new(),
        }
    }

    /// The scanner's current read position.
    pub fn position(&self) -> Position {
        self.scanner.position()
    }

    /// Return the next event, or `None` after `StreamEnd`.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        if self.state == State::End {
            return Ok(None);
        }
        self.state_machine().map(Some)
    }

    fn state_machine(&mut self) -> Result<Event> {
        match self.state {
            State::StreamStart => self.stream_start(),
            State::ImplicitDocumentStart => self.document_start(true),
            State::DocumentStart => self.document_start(false),
            State::DocumentContent => self.document_content(),
            State::DocumentEnd => self.document_end(),
            State::BlockNode => self.parse_node(true, false),
            State::BlockSequenceFirstEntry => self.block_sequence_entry(true),
            State::BlockSequenceEntry => self.block_sequence_entry(false),
            State::IndentlessSequenceEntry => self.indentless_sequence_entry(),
            State::BlockMappingFirstKey => self.block_mapping_key(true),
            State::BlockMappingKey => self.block_mapping_key(false),
            State::BlockMappingValue => self.block_mapping_value(),
            State::FlowSequenceFirstEntry => self.flow_sequence_entry(true),
            State::FlowSequenceEntry => self.flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => self.flow_sequence_entry_mapping_value(),
            State::FlowSequenceEntryMappingEnd => self.flow_sequence_entry_mapping_end(),
            State::FlowMappingFirstKey => self.flow_mapping_key(true),
            State::FlowMappingKey => self.flow_mapping_key(false),
            State::FlowMappingValue => self.flow_mapping_value(),
            State::End => Err(LoadError::parse(
                ParseErrorKind::UnexpectedToken,
                "no more events",
                self.scanner.position(),
            )),
        }
    }

    // ========================================================================
    // Token access
    // ========================================================================

    fn peek(&mut self) -> Result<Token> {
        if self.current.is_none() {
            self.current = self.scanner.next_token()?;
        }
        match &self.current {
            Some(token) => Ok(token.clone()),
            None => Err(LoadError::parse(
                ParseErrorKind::UnexpectedToken,
                "unexpected end of token stream",
                self.scanner.position(),
            )),
        }
    }

    fn skip(&mut self) {
        self.current = None;
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn unexpected(message: &str, token: &Token) -> LoadError {
        LoadError::parse(ParseErrorKind::UnexpectedToken, message, token.position)
    }

    /// Error for a stream or document boundary found inside a flow collection.
    fn unclosed(&self, token: &Token) -> LoadError {
        let message = match self.flow_marks.last() {
            Some(open) => format!("flow collection opened at {} is never closed", open),
            None => "flow collection is never closed".to_string(),
        };
        LoadError::parse(ParseErrorKind::UnclosedCollection, message, token.position)
    }

    fn is_boundary(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::StreamEnd | TokenKind::DocumentStart | TokenKind::DocumentEnd
        )
    }

    // ========================================================================
    // Stream and documents
    // ========================================================================

    fn stream_start(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::StreamStart {
            return Err(Self::unexpected("did not find expected <stream-start>", &token));
        }
        self.skip();
        self.state = State::ImplicitDocumentStart;
        Ok(Event::new(EventKind::StreamStart, token.position))
    }

    fn document_start(&mut self, mut implicit: bool) -> Result<Event> {
        // Stray `...` markers close nothing and may repeat.
        while self.peek()?.kind == TokenKind::DocumentEnd {
            self.skip();
            implicit = true;
        }

        let token = self.peek()?;
        match token.kind {
            TokenKind::StreamEnd => {
                self.skip();
                self.state = State::End;
                Ok(Event::new(EventKind::StreamEnd, token.position))
            }
            TokenKind::Directive(_) | TokenKind::DocumentStart => self.explicit_document_start(),
            _ if implicit => {
                self.tag_handles.clear();
                self.states.push(State::DocumentEnd);
                self.state = State::BlockNode;
                Ok(Event::new(
                    EventKind::DocumentStart { explicit: false },
                    token.position,
                ))
            }
            _ => Err(Self::unexpected("did not find expected '---'", &token)),
        }
    }

    fn explicit_document_start(&mut self) -> Result<Event> {
        self.tag_handles.clear();
        let mut seen_version = false;
        let mut token = self.peek()?;
        while let TokenKind::Directive(directive) = &token.kind {
            match directive {
                Directive::Version(version) => {
                    if seen_version {
                        return Err(Self::unexpected("duplicate %YAML directive", &token));
                    }
                    if !version.starts_with("1.") {
                        return Err(Self::unexpected(
                            &format!("unsupported YAML version {}", version),
                            &token,
                        ));
                    }
                    seen_version = true;
                }
                Directive::Tag { handle, prefix } => {
                    self.tag_handles.insert(handle.clone(), prefix.clone());
                }
                Directive::Reserved(_) => {}
            }
            self.skip();
            token = self.peek()?;
        }

        if token.kind != TokenKind::DocumentStart {
            return Err(Self::unexpected(
                "did not find expected '---' after directives",
                &token,
            ));
        }
        self.skip();
        self.states.push(State::DocumentEnd);
        self.state = State::DocumentContent;
        Ok(Event::new(
            EventKind::DocumentStart { explicit: true },
            token.position,
        ))
    }

    fn document_content(&mut self) -> Result<Event> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Directive(_)
            | TokenKind::DocumentStart
            | TokenKind::DocumentEnd
            | TokenKind::StreamEnd => {
                self.pop_state();
                Ok(Event::empty_scalar(token.position, None, None))
            }
            _ => self.parse_node(true, false),
        }
    }

    fn document_end(&mut self) -> Result<Event> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::DocumentEnd => {
                self.skip();
                self.state = State::ImplicitDocumentStart;
                Ok(Event::new(
                    EventKind::DocumentEnd { explicit: true },
                    token.position,
                ))
            }
            TokenKind::DocumentStart | TokenKind::StreamEnd => {
                self.state = State::DocumentStart;
                Ok(Event::new(
                    EventKind::DocumentEnd { explicit: false },
                    token.position,
                ))
            }
            TokenKind::Directive(_) => Err(Self::unexpected(
                "directives must follow an explicit '...' document end",
                &token,
            )),
            _ => Err(Self::unexpected(
                "expected the end of the document but found more content",
                &token,
            )),
        }
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    fn resolve_tag(&self, handle: &str, suffix: &str, token: &Token) -> Result<String> {
        if handle.is_empty() {
            return Ok(suffix.to_string());
        }
        if let Some(prefix) = self.tag_handles.get(handle) {
            return Ok(format!("{}{}", prefix, suffix));
        }
        match handle {
            "!!" => Ok(format!("{}{}", CORE_TAG_PREFIX, suffix)),
            "!" => Ok(format!("!{}", suffix)),
            _ => Err(LoadError::parse(
                ParseErrorKind::UndefinedTagHandle,
                format!("tag handle '{}' was not declared with %TAG", handle),
                token.position,
            )),
        }
    }

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event> {
        let mut token = self.peek()?;
        let start = token.position;

        if let TokenKind::Alias(name) = &token.kind {
            let name = name.clone();
            self.skip();
            self.pop_state();
            return Ok(Event::new(EventKind::Alias(name), start));
        }

        let mut anchor = None;
        let mut tag = None;
        loop {
            match &token.kind {
                TokenKind::Anchor(name) if anchor.is_none() => anchor = Some(name.clone()),
                TokenKind::Tag { handle, suffix } if tag.is_none() => {
                    tag = Some(self.resolve_tag(handle, suffix, &token)?)
                }
                _ => break,
            }
            self.skip();
            token = self.peek()?;
        }

        match token.kind {
            TokenKind::BlockEntry if indentless_sequence => {
                self.state = State::IndentlessSequenceEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        flow: false,
                    },
                    start,
                ))
            }
            TokenKind::Scalar { style, text } => {
                self.skip();
                self.pop_state();
                Ok(Event::new(
                    EventKind::Scalar {
                        text,
                        style,
                        anchor,
                        tag,
                    },
                    start,
                ))
            }
            TokenKind::FlowSequenceStart => {
                self.state = State::FlowSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        flow: true,
                    },
                    start,
                ))
            }
            TokenKind::FlowMappingStart => {
                self.state = State::FlowMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        flow: true,
                    },
                    start,
                ))
            }
            TokenKind::BlockSequenceStart if block => {
                self.state = State::BlockSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        flow: false,
                    },
                    start,
                ))
            }
            TokenKind::BlockMappingStart if block => {
                self.state = State::BlockMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        flow: false,
                    },
                    start,
                ))
            }
            TokenKind::Alias(_) => Err(Self::unexpected(
                "an alias node cannot carry an anchor or a tag",
                &token,
            )),
            TokenKind::Anchor(_) | TokenKind::Tag { .. } => Err(Self::unexpected(
                "a node may carry at most one anchor and one tag",
                &token,
            )),
            _ if anchor.is_some() || tag.is_some() => {
                self.pop_state();
                Ok(Event::empty_scalar(start, anchor, tag))
            }
            ref kind if !self.flow_marks.is_empty() && Self::is_boundary(kind) => {
                Err(self.unclosed(&token))
            }
            _ => Err(Self::unexpected("did not find expected node content", &token)),
        }
    }

    // ========================================================================
    // Block collections
    // ========================================================================

    fn block_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            self.skip();
        }
        let token = self.peek()?;
        match token.kind {
            TokenKind::BlockEntry => {
                self.skip();
                let next = self.peek()?;
                if matches!(next.kind, TokenKind::BlockEntry | TokenKind::BlockEnd) {
                    self.state = State::BlockSequenceEntry;
                    Ok(Event::empty_scalar(next.position, None, None))
                } else {
                    self.states.push(State::BlockSequenceEntry);
                    self.parse_node(true, false)
                }
            }
            TokenKind::BlockEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::SequenceEnd, token.position))
            }
            TokenKind::Key | TokenKind::Value => Err(LoadError::parse(
                ParseErrorKind::MixedIndicators,
                "mapping entry found where a sequence entry was expected",
                token.position,
            )),
            _ => Err(Self::unexpected("did not find expected '-' indicator", &token)),
        }
    }

    fn indentless_sequence_entry(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::BlockEntry {
            self.pop_state();
            return Ok(Event::new(EventKind::SequenceEnd, token.position));
        }
        self.skip();
        let next = self.peek()?;
        if matches!(
            next.kind,
            TokenKind::BlockEntry | TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
        ) {
            self.state = State::IndentlessSequenceEntry;
            Ok(Event::empty_scalar(next.position, None, None))
        } else {
            self.states.push(State::IndentlessSequenceEntry);
            self.parse_node(true, false)
        }
    }

    fn block_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            self.skip();
        }
        let token = self.peek()?;
        match token.kind {
            TokenKind::Key => {
                self.skip();
                let next = self.peek()?;
                if matches!(
                    next.kind,
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
                ) {
                    self.state = State::BlockMappingValue;
                    Ok(Event::empty_scalar(next.position, None, None))
                } else {
                    self.states.push(State::BlockMappingValue);
                    self.parse_node(true, true)
                }
            }
            TokenKind::Value => {
                self.state = State::BlockMappingValue;
                Ok(Event::empty_scalar(token.position, None, None))
            }
            TokenKind::BlockEnd => {
                self.skip();
                self.pop_state();
                Ok(Event::new(EventKind::MappingEnd, token.position))
            }
            TokenKind::BlockEntry => Err(LoadError::parse(
                ParseErrorKind::MixedIndicators,
                "sequence entry found where a mapping key was expected",
                token.position,
            )),
            _ => Err(Self::unexpected("did not find expected key", &token)),
        }
    }

    fn block_mapping_value(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::Value {
            self.state = State::BlockMappingKey;
            return Ok(Event::empty_scalar(token.position, None, None));
        }
        self.skip();
        let next = self.peek()?;
        if matches!(
            next.kind,
            TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
        ) {
            self.state = State::BlockMappingKey;
            Ok(Event::empty_scalar(next.position, None, None))
        } else {
            self.states.push(State::BlockMappingKey);
            self.parse_node(true, true)
        }
    }

    // ========================================================================
    // Flow collections
    // ========================================================================

    fn flow_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            let open = self.peek()?;
            self.flow_marks.push(open.position);
            self.skip();
        }

        let mut token = self.peek()?;
        if token.kind != TokenKind::FlowSequenceEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.skip();
                    token = self.peek()?;
                } else if Self::is_boundary(&token.kind) {
                    return Err(self.unclosed(&token));
                } else {
                    return Err(Self::unexpected("did not find expected ',' or ']'", &token));
                }
            }

            match token.kind {
                TokenKind::FlowSequenceEnd => {}
                TokenKind::Key => {
                    self.skip();
                    self.state = State::FlowSequenceEntryMappingKey;
                    return Ok(Event::new(
                        EventKind::MappingStart {
                            anchor: None,
                            tag: None,
                            flow: true,
                        },
                        token.position,
                    ));
                }
                ref kind if Self::is_boundary(kind) => return Err(self.unclosed(&token)),
                _ => {
                    self.states.push(State::FlowSequenceEntry);
                    return self.parse_node(false, false);
                }
            }
        }

        self.skip();
        self.flow_marks.pop();
        self.pop_state();
        Ok(Event::new(EventKind::SequenceEnd, token.position))
    }

    /// Key of a single-pair mapping inside a flow sequence: `[a: b]`.
    fn flow_sequence_entry_mapping_key(&mut self) -> Result<Event> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowSequenceEnd => {
                self.state = State::FlowSequenceEntryMappingValue;
                Ok(Event::empty_scalar(token.position, None, None))
            }
            _ => {
                self.states.push(State::FlowSequenceEntryMappingValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_value(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::Value {
            self.state = State::FlowSequenceEntryMappingEnd;
            return Ok(Event::empty_scalar(token.position, None, None));
        }
        self.skip();
        let next = self.peek()?;
        if matches!(
            next.kind,
            TokenKind::FlowEntry | TokenKind::FlowSequenceEnd
        ) {
            self.state = State::FlowSequenceEntryMappingEnd;
            Ok(Event::empty_scalar(next.position, None, None))
        } else {
            self.states.push(State::FlowSequenceEntryMappingEnd);
            self.parse_node(false, false)
        }
    }

    fn flow_sequence_entry_mapping_end(&mut self) -> Result<Event> {
        let token = self.peek()?;
        self.state = State::FlowSequenceEntry;
        Ok(Event::new(EventKind::MappingEnd, token.position))
    }

    fn flow_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            let open = self.peek()?;
            self.flow_marks.push(open.position);
            self.skip();
        }

        let mut token = self.peek()?;
        if token.kind != TokenKind::FlowMappingEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.skip();
                    token = self.peek()?;
                } else if Self::is_boundary(&token.kind) {
                    return Err(self.unclosed(&token));
                } else {
                    return Err(Self::unexpected("did not find expected ',' or '}'", &token));
                }
            }

            match token.kind {
                TokenKind::FlowMappingEnd => {}
                TokenKind::Key => {
                    self.skip();
                    let next = self.peek()?;
                    match next.kind {
                        TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowMappingEnd => {
                            self.state = State::FlowMappingValue;
                            return Ok(Event::empty_scalar(next.position, None, None));
                        }
                        ref kind if Self::is_boundary(kind) => return Err(self.unclosed(&next)),
                        _ => {
                            self.states.push(State::FlowMappingValue);
                            return self.parse_node(false, false);
                        }
                    }
                }
                TokenKind::Value => {
                    self.state = State::FlowMappingValue;
                    return Ok(Event::empty_scalar(token.position, None, None));
                }
                ref kind if Self::is_boundary(kind) => return Err(self.unclosed(&token)),
                _ => {
                    return Err(Self::unexpected(
                        "flow mapping entries must be 'key: value' pairs",
                        &token,
                    ))
                }
            }
        }

        self.skip();
        self.flow_marks.pop();
        self.pop_state();
        Ok(Event::new(EventKind::MappingEnd, token.position))
    }

    fn flow_mapping_value(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::Value {
            self.state = State::FlowMappingKey;
            return Ok(Event::empty_scalar(token.position, None, None));
        }
        self.skip();
        let next = self.peek()?;
        match next.kind {
            TokenKind::FlowEntry | TokenKind::FlowMappingEnd => {
                self.state = State::FlowMappingKey;
                Ok(Event::empty_scalar(next.position, None, None))
            }
            ref kind if Self::is_boundary(kind) => Err(self.unclosed(&next)),
            _ => {
                self.states.push(State::FlowMappingKey);
                self.parse_node(false, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    fn events(source: &str) -> Vec<EventKind> {
        let mut parser = Parser::new(source);
        let mut out = Vec::new();
        while let Some(event) = parser.next_event().unwrap() {
            out.push(event.kind);
        }
        out
    }

    fn parse_error(source: &str) -> LoadError {
        let mut parser = Parser::new(source);
        loop {
            match parser.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error for {:?}", source),
                Err(e) => return e,
            }
        }
    }

    fn scalar(text: &str) -> EventKind {
        EventKind::Scalar {
            text: text.to_string(),
            style: ScalarStyle::Plain,
            anchor: None,
            tag: None,
        }
    }

    fn block_map() -> EventKind {
        EventKind::MappingStart {
            anchor: None,
            tag: None,
            flow: false,
        }
    }

    fn block_seq() -> EventKind {
        EventKind::SequenceStart {
            anchor: None,
            tag: None,
            flow: false,
        }
    }

    #[test]
    fn test_events_simple_mapping() {
        use EventKind::*;
        assert_eq!(
            events("a: 1\nb: 2"),
            vec![
                StreamStart,
                DocumentStart { explicit: false },
                block_map(),
                scalar("a"),
                scalar("1"),
                scalar("b"),
                scalar("2"),
                MappingEnd,
                DocumentEnd { explicit: false },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_events_empty_stream() {
        use EventKind::*;
        assert_eq!(events(""), vec![StreamStart, StreamEnd]);
        assert_eq!(events("# only a comment\n"), vec![StreamStart, StreamEnd]);
    }

    #[test]
    fn test_events_indentless_sequence() {
        use EventKind::*;
        assert_eq!(
            events("a:\n- x\n- y\nb: z"),
            vec![
                StreamStart,
                DocumentStart { explicit: false },
                block_map(),
                scalar("a"),
                block_seq(),
                scalar("x"),
                scalar("y"),
                SequenceEnd,
                scalar("b"),
                scalar("z"),
                MappingEnd,
                DocumentEnd { explicit: false },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_events_missing_value_is_empty_scalar() {
        use EventKind::*;
        assert_eq!(
            events("a:\nb: 1"),
            vec![
                StreamStart,
                DocumentStart { explicit: false },
                block_map(),
                scalar("a"),
                scalar(""),
                scalar("b"),
                scalar("1"),
                MappingEnd,
                DocumentEnd { explicit: false },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_events_multiple_documents() {
        use EventKind::*;
        assert_eq!(
            events("--- a\n--- b\n...\n"),
            vec![
                StreamStart,
                DocumentStart { explicit: true },
                scalar("a"),
                DocumentEnd { explicit: false },
                DocumentStart { explicit: true },
                scalar("b"),
                DocumentEnd { explicit: true },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_events_flow_pair_in_sequence() {
        use EventKind::*;
        assert_eq!(
            events("[a: 1, b]"),
            vec![
                StreamStart,
                DocumentStart { explicit: false },
                SequenceStart {
                    anchor: None,
                    tag: None,
                    flow: true
                },
                MappingStart {
                    anchor: None,
                    tag: None,
                    flow: true
                },
                scalar("a"),
                scalar("1"),
                MappingEnd,
                scalar("b"),
                SequenceEnd,
                DocumentEnd { explicit: false },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_events_anchor_and_tag() {
        use EventKind::*;
        assert_eq!(
            events("- &a !!int 1\n- *a"),
            vec![
                StreamStart,
                DocumentStart { explicit: false },
                block_seq(),
                Scalar {
                    text: "1".to_string(),
                    style: ScalarStyle::Plain,
                    anchor: Some("a".to_string()),
                    tag: Some("tag:yaml.org,2002:int".to_string()),
                },
                Alias("a".to_string()),
                SequenceEnd,
                DocumentEnd { explicit: false },
                StreamEnd
            ]
        );
    }

    #[test]
    fn test_tag_directive_expands_handle() {
        let all = events("%TAG !e! tag:example.com,2000:\n--- !e!thing x\n");
        assert!(all.contains(&EventKind::Scalar {
            text: "x".to_string(),
            style: ScalarStyle::Plain,
            anchor: None,
            tag: Some("tag:example.com,2000:thing".to_string()),
        }));
    }

    #[test]
    fn test_undefined_tag_handle() {
        let err = parse_error("!e!thing x");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::UndefinedTagHandle,
                ..
            }
        ));
    }

    #[test]
    fn test_tag_handles_reset_per_document() {
        let err = parse_error("%TAG !e! tag:e,2000:\n--- !e!a x\n--- !e!b y\n");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::UndefinedTagHandle,
                position: Position { line: 3, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unclosed_flow_sequence() {
        let err = parse_error("a: [1, 2");
        match err {
            LoadError::Parse { kind, message, .. } => {
                assert_eq!(kind, ParseErrorKind::UnclosedCollection);
                assert!(message.contains("line 1, column 4"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_flow_mapping() {
        let err = parse_error("{a: 1\n");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::UnclosedCollection,
                ..
            }
        ));
    }

    #[test]
    fn test_sequence_entry_in_mapping() {
        let err = parse_error("a: 1\n- b\n");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::MixedIndicators,
                position: Position { line: 2, column: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_mapping_key_in_sequence() {
        let err = parse_error("- a\nb: c\n");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::MixedIndicators,
                ..
            }
        ));
    }

    #[test]
    fn test_bare_flow_mapping_key_rejected() {
        let err = parse_error("{a: 1, b}");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::UnexpectedToken,
                position: Position { column: 8, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_content_after_document() {
        let err = parse_error("'a'\n'b'\n");
        assert!(matches!(
            err,
            LoadError::Parse {
                kind: ParseErrorKind::UnexpectedToken,
                position: Position { line: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let source = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let count = events(&source).len();
        assert_eq!(count, 2 * depth + 4);
    }
}
