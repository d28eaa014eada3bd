//! Phase 1: Scanner
//!
//! The scanner converts raw source text into a flat token stream. It performs:
//! - Code point validation (printable characters only, optional leading BOM)
//! - Comment stripping
//! - Indentation tracking, emitting explicit block start/end tokens
//! - Simple key detection (`key: value` on one line), inserting `Key` tokens
//!   retroactively once the `:` is seen
//! - Scalar decoding for plain, quoted and block styles

use std::collections::VecDeque;

use crate::error::{LexErrorKind, LoadError, ParseErrorKind, Position, Result};

/// How a scalar was written in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A `%` directive line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// `%YAML 1.2`
    Version(String),
    /// `%TAG !e! tag:example.com,2000:`
    Tag { handle: String, prefix: String },
    /// Any other directive; its parameters are ignored.
    Reserved(String),
}

/// Token type in the scanner output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    StreamStart,
    StreamEnd,
    Directive(Directive),
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    /// Dedent: closes the innermost block collection.
    BlockEnd,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    /// `-` in block context.
    BlockEntry,
    /// `,` in flow context.
    FlowEntry,
    /// `?`, or inserted before an implicit key.
    Key,
    /// `:`
    Value,
    Alias(String),
    Anchor(String),
    Tag { handle: String, suffix: String },
    Scalar { style: ScalarStyle, text: String },
}

/// A single token in the token stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// Internal cursor: character index plus the public position fields.
/// `col` is zero-based so it can be compared with indentation levels.
#[derive(Clone, Copy, Debug)]
struct Mark {
    index: usize,
    offset: usize,
    line: usize,
    col: usize,
}

impl Mark {
    fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.col + 1,
        }
    }
}

/// A candidate implicit key, waiting for its `:`.
#[derive(Clone, Copy, Debug)]
struct SimpleKey {
    possible: bool,
    required: bool,
    token_number: usize,
    mark: Mark,
}

impl SimpleKey {
    fn new(mark: Mark) -> Self {
        Self {
            possible: false,
            required: false,
            token_number: 0,
            mark,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chomping {
    Strip,
    Clip,
    Keep,
}

/// Converts YAML text into tokens on demand.
pub struct Scanner {
    chars: Vec<char>,
    mark: Mark,
    tokens: VecDeque<Token>,
    tokens_parsed: usize,
    token_available: bool,
    stream_start_produced: bool,
    stream_end_produced: bool,
    /// One candidate key slot per flow level, plus one for block context.
    simple_keys: Vec<SimpleKey>,
    /// Levels whose candidate key is still possible, oldest first. Marks and
    /// token numbers increase front to back.
    live_keys: VecDeque<usize>,
    simple_key_allowed: bool,
    /// Only blanks have been consumed on the current line.
    line_indent: bool,
    /// Column of the innermost block collection, -1 at top level.
    indent: isize,
    indents: Vec<isize>,
    flow_level: usize,
    /// Character index right after a quoted scalar or flow collection end,
    /// where a `:` without a following space still counts as a value
    /// indicator inside flow collections (`{"a":1}`).
    adjacent_value_at: Option<usize>,
}

fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_breakz(c: char) -> bool {
    is_break(c) || c == '\0'
}

fn is_blankz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Check whether a code point may appear in a YAML stream.
fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{7E}'
        | '\u{85}'
        | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

impl Scanner {
    /// Create a scanner over the given source text.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            mark: Mark {
                index: 0,
                offset: 0,
                line: 1,
                col: 0,
            },
            tokens: VecDeque::new(),
            tokens_parsed: 0,
            token_available: false,
            stream_start_produced: false,
            stream_end_produced: false,
            simple_keys: Vec::new(),
            live_keys: VecDeque::new(),
            simple_key_allowed: false,
            line_indent: true,
            indent: -1,
            indents: Vec::new(),
            flow_level: 0,
            adjacent_value_at: None,
        }
    }

    /// The current read position.
    pub fn position(&self) -> Position {
        self.mark.position()
    }

    /// Return the next token, or `None` once `StreamEnd` has been returned.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if self.stream_end_produced {
            return Ok(None);
        }
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        let Some(token) = self.tokens.pop_front() else {
            return Ok(None);
        };
        self.token_available = false;
        self.tokens_parsed += 1;
        if token.kind == TokenKind::StreamEnd {
            self.stream_end_produced = true;
        }
        Ok(Some(token))
    }

    // ========================================================================
    // Character access
    // ========================================================================

    fn look(&self, n: usize) -> char {
        self.chars.get(self.mark.index + n).copied().unwrap_or('\0')
    }

    fn ch(&self) -> char {
        self.look(0)
    }

    fn at_end(&self) -> bool {
        self.mark.index >= self.chars.len()
    }

    fn advance(&mut self) {
        if let Some(&c) = self.chars.get(self.mark.index) {
            self.mark.index += 1;
            self.mark.offset += c.len_utf8();
        }
    }

    fn skip(&mut self) {
        if !self.at_end() {
            if !is_blank(self.ch()) {
                self.line_indent = false;
            }
            self.advance();
            self.mark.col += 1;
        }
    }

    /// Consume one line break (`\n`, `\r` or `\r\n`).
    fn skip_line(&mut self) {
        if self.ch() == '\r' && self.look(1) == '\n' {
            self.advance();
            self.advance();
        } else if is_break(self.ch()) {
            self.advance();
        } else {
            return;
        }
        self.mark.line += 1;
        self.mark.col = 0;
        self.line_indent = true;
    }

    fn at_document_indicator(&self, indicator: char) -> bool {
        self.mark.col == 0
            && self.ch() == indicator
            && self.look(1) == indicator
            && self.look(2) == indicator
            && is_blankz(self.look(3))
    }

    /// Whether only blanks and an optional comment remain on this line.
    fn rest_of_line_is_blank(&self) -> bool {
        let mut n = 0;
        while is_blank(self.look(n)) {
            n += 1;
        }
        is_breakz(self.look(n)) || self.look(n) == '#'
    }

    fn push_token(&mut self, kind: TokenKind, mark: Mark) {
        self.tokens.push_back(Token::new(kind, mark.position()));
    }

    // ========================================================================
    // Token queue management
    // ========================================================================

    fn fetch_more_tokens(&mut self) -> Result<()> {
        loop {
            let mut need_more = self.tokens.is_empty();
            if !need_more {
                self.stale_simple_keys()?;
                // The oldest live key holds the lowest token number.
                let parsed = self.tokens_parsed;
                need_more = self
                    .live_keys
                    .front()
                    .is_some_and(|&level| self.simple_keys[level].token_number == parsed);
            }
            if !need_more {
                break;
            }
            self.fetch_next_token()?;
        }
        self.token_available = true;
        Ok(())
    }

    fn fetch_next_token(&mut self) -> Result<()> {
        if !self.stream_start_produced {
            return self.fetch_stream_start();
        }

        self.skip_to_next_token();
        self.stale_simple_keys()?;

        if self.at_end() {
            return self.fetch_stream_end();
        }

        let c = self.ch();
        let col = self.mark.col;

        if col == 0 {
            if c == '%' {
                return self.fetch_directive();
            }
            if self.at_document_indicator('-') {
                return self.fetch_document_indicator(TokenKind::DocumentStart);
            }
            if self.at_document_indicator('.') {
                return self.fetch_document_indicator(TokenKind::DocumentEnd);
            }
        }

        // A dedent must land exactly on an enclosing indentation level.
        if self.unroll_indent(col as isize) && self.indent < col as isize {
            return Err(LoadError::lex(
                LexErrorKind::BadIndentation,
                "dedent does not match any enclosing indentation level",
                self.mark.position(),
            ));
        }

        let next = self.look(1);
        match c {
            '[' => self.fetch_flow_collection_start(TokenKind::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenKind::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenKind::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if is_blankz(next) => self.fetch_block_entry(),
            '?' if is_blankz(next) => self.fetch_key(),
            ':' if is_blankz(next)
                || (self.flow_level > 0
                    && (is_flow_indicator(next)
                        || self.adjacent_value_at == Some(self.mark.index))) =>
            {
                self.fetch_value()
            }
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(true),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(false),
            '\'' => self.fetch_flow_scalar(true),
            '"' => self.fetch_flow_scalar(false),
            '\t' => Err(LoadError::lex(
                LexErrorKind::BadIndentation,
                "tab characters must not be used for indentation",
                self.mark.position(),
            )),
            '%' | '@' | '`' | '|' | '>' => Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                format!("found character '{}' that cannot start any token", c),
                self.mark.position(),
            )),
            _ => self.fetch_plain_scalar(),
        }
    }

    /// Skip whitespace, line breaks and comments up to the next token.
    fn skip_to_next_token(&mut self) {
        loop {
            match self.ch() {
                ' ' => self.skip(),
                '\t' if self.flow_level > 0
                    || !self.line_indent
                    || self.rest_of_line_is_blank() =>
                {
                    self.skip()
                }
                '\n' | '\r' => {
                    self.skip_line();
                    if self.flow_level == 0 {
                        self.simple_key_allowed = true;
                    }
                }
                '#' => {
                    while !is_breakz(self.ch()) {
                        self.skip();
                    }
                }
                _ => break,
            }
        }
    }

    // ========================================================================
    // Simple keys and indentation
    // ========================================================================

    /// Drop candidate keys that can no longer be followed by their `:`.
    ///
    /// Stale keys are always a prefix of `live_keys`, so this stops at the
    /// first key that is still reachable.
    fn stale_simple_keys(&mut self) -> Result<()> {
        let mark = self.mark;
        while let Some(&level) = self.live_keys.front() {
            let sk = self.simple_keys[level];
            if sk.mark.line == mark.line && sk.mark.index + 1024 >= mark.index {
                break;
            }
            if sk.required {
                return Err(missing_value_indicator(sk.mark));
            }
            self.simple_keys[level].possible = false;
            self.live_keys.pop_front();
        }
        Ok(())
    }

    fn save_simple_key(&mut self) -> Result<()> {
        if self.simple_key_allowed {
            let sk = SimpleKey {
                possible: true,
                required: self.flow_level == 0 && self.indent == self.mark.col as isize,
                token_number: self.tokens_parsed + self.tokens.len(),
                mark: self.mark,
            };
            self.remove_simple_key()?;
            if let Some(last) = self.simple_keys.last_mut() {
                *last = sk;
                self.live_keys.push_back(self.simple_keys.len() - 1);
            }
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<()> {
        if let Some(last) = self.simple_keys.last() {
            if last.possible && last.required {
                return Err(missing_value_indicator(last.mark));
            }
        }
        self.forget_last_key();
        Ok(())
    }

    /// Mark the innermost candidate key as used or impossible. A live
    /// innermost key is always the newest entry of `live_keys`.
    fn forget_last_key(&mut self) {
        let level = self.simple_keys.len().wrapping_sub(1);
        if let Some(last) = self.simple_keys.last_mut() {
            if last.possible {
                last.possible = false;
                if self.live_keys.back() == Some(&level) {
                    self.live_keys.pop_back();
                }
            }
        }
    }

    /// Open a block collection at `col` if it is deeper than the current one.
    /// With `number`, the start token is inserted before an already queued
    /// token (the retroactive simple key case).
    fn roll_indent(&mut self, col: usize, number: Option<usize>, kind: TokenKind, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }
        if self.indent < col as isize {
            self.indents.push(self.indent);
            self.indent = col as isize;
            let token = Token::new(kind, mark.position());
            match number {
                Some(n) => self.tokens.insert(n - self.tokens_parsed, token),
                None => self.tokens.push_back(token),
            }
        }
    }

    /// Close every block collection deeper than `col`.
    /// Returns whether any collection was closed.
    fn unroll_indent(&mut self, col: isize) -> bool {
        if self.flow_level > 0 {
            return false;
        }
        let mut closed = false;
        while self.indent > col {
            self.push_token(TokenKind::BlockEnd, self.mark);
            self.indent = self.indents.pop().unwrap_or(-1);
            closed = true;
        }
        closed
    }

    // ========================================================================
    // Indicators
    // ========================================================================

    fn fetch_stream_start(&mut self) -> Result<()> {
        self.validate_code_points()?;
        if self.ch() == '\u{FEFF}' {
            self.advance();
        }
        self.indent = -1;
        self.stream_start_produced = true;
        self.simple_key_allowed = true;
        self.push_token(TokenKind::StreamStart, self.mark);
        self.simple_keys.push(SimpleKey::new(self.mark));
        Ok(())
    }

    /// Reject control characters up front so no scanning loop has to.
    fn validate_code_points(&self) -> Result<()> {
        let mut position = Position::start();
        for (i, &c) in self.chars.iter().enumerate() {
            let bom = i == 0 && c == '\u{FEFF}';
            if !is_printable(c) && !bom {
                return Err(LoadError::lex(
                    LexErrorKind::UnexpectedCharacter,
                    format!("found non-printable character U+{:04X}", c as u32),
                    position,
                ));
            }
            position.offset += c.len_utf8();
            if c == '\n' {
                position.line += 1;
                position.column = 1;
            } else if !bom {
                position.column += 1;
            }
        }
        Ok(())
    }

    fn fetch_stream_end(&mut self) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        self.push_token(TokenKind::StreamEnd, self.mark);
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;

        let start = self.mark;
        self.skip();
        let name = self.scan_word();
        if name.is_empty() {
            return Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                "did not find expected directive name",
                start.position(),
            ));
        }
        self.skip_blanks();

        let directive = match name.as_str() {
            "YAML" => {
                let version = self.scan_word();
                if !is_version(&version) {
                    return Err(LoadError::lex(
                        LexErrorKind::UnexpectedCharacter,
                        "did not find expected version number in %YAML directive",
                        self.mark.position(),
                    ));
                }
                Directive::Version(version)
            }
            "TAG" => {
                let handle = self.scan_word();
                self.skip_blanks();
                let prefix = self.scan_word();
                if !handle.starts_with('!') || !handle.ends_with('!') || prefix.is_empty() {
                    return Err(LoadError::lex(
                        LexErrorKind::UnexpectedCharacter,
                        "did not find expected handle and prefix in %TAG directive",
                        start.position(),
                    ));
                }
                Directive::Tag { handle, prefix }
            }
            _ => {
                while !is_breakz(self.ch()) {
                    self.skip();
                }
                Directive::Reserved(name)
            }
        };

        self.skip_line_remainder()?;
        self.push_token(TokenKind::Directive(directive), start);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.mark;
        self.skip();
        self.skip();
        self.skip();
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<()> {
        self.save_simple_key()?;
        self.flow_level += 1;
        self.simple_keys.push(SimpleKey::new(self.mark));
        self.simple_key_allowed = true;
        let start = self.mark;
        self.skip();
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<()> {
        self.remove_simple_key()?;
        if self.flow_level > 0 {
            self.flow_level -= 1;
            self.simple_keys.pop();
        }
        self.simple_key_allowed = false;
        let start = self.mark;
        self.skip();
        self.adjacent_value_at = Some(self.mark.index);
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.mark;
        self.skip();
        self.push_token(TokenKind::FlowEntry, start);
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<()> {
        if self.flow_level > 0 {
            return Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                "block sequence entries are not allowed inside a flow collection",
                self.mark.position(),
            ));
        }
        if !self.simple_key_allowed {
            return Err(LoadError::parse(
                ParseErrorKind::MixedIndicators,
                "block sequence entries are not allowed in this context",
                self.mark.position(),
            ));
        }
        self.roll_indent(
            self.mark.col,
            None,
            TokenKind::BlockSequenceStart,
            self.mark,
        );
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.mark;
        self.skip();
        self.push_token(TokenKind::BlockEntry, start);
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<()> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(LoadError::parse(
                    ParseErrorKind::MixedIndicators,
                    "mapping keys are not allowed in this context",
                    self.mark.position(),
                ));
            }
            self.roll_indent(self.mark.col, None, TokenKind::BlockMappingStart, self.mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        let start = self.mark;
        self.skip();
        self.push_token(TokenKind::Key, start);
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<()> {
        let start = self.mark;
        let sk = self
            .simple_keys
            .last()
            .copied()
            .unwrap_or_else(|| SimpleKey::new(start));

        if sk.possible {
            self.tokens.insert(
                sk.token_number - self.tokens_parsed,
                Token::new(TokenKind::Key, sk.mark.position()),
            );
            self.roll_indent(
                sk.mark.col,
                Some(sk.token_number),
                TokenKind::BlockMappingStart,
                sk.mark,
            );
            self.forget_last_key();
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return Err(LoadError::parse(
                        ParseErrorKind::UnexpectedToken,
                        "mapping values are not allowed in this context",
                        start.position(),
                    ));
                }
                self.roll_indent(start.col, None, TokenKind::BlockMappingStart, start);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }

        self.skip();
        self.push_token(TokenKind::Value, start);
        Ok(())
    }

    fn fetch_anchor(&mut self, alias: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let start = self.mark;
        self.skip();
        let mut name = String::new();
        loop {
            let c = self.ch();
            if is_blankz(c) || is_flow_indicator(c) || (c == ':' && is_blankz(self.look(1))) {
                break;
            }
            name.push(c);
            self.skip();
        }
        if name.is_empty() {
            return Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                if alias {
                    "did not find expected alias name"
                } else {
                    "did not find expected anchor name"
                },
                start.position(),
            ));
        }
        let kind = if alias {
            TokenKind::Alias(name)
        } else {
            TokenKind::Anchor(name)
        };
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;

        let start = self.mark;
        let (handle, suffix) = if self.look(1) == '<' {
            // Verbatim: !<tag:yaml.org,2002:str>
            self.skip();
            self.skip();
            let mut uri = String::new();
            while self.ch() != '>' && !is_blankz(self.ch()) {
                uri.push(self.ch());
                self.skip();
            }
            if self.ch() != '>' || uri.is_empty() {
                return Err(LoadError::lex(
                    LexErrorKind::UnexpectedCharacter,
                    "did not find the expected '>' closing a verbatim tag",
                    start.position(),
                ));
            }
            self.skip();
            (String::new(), uri)
        } else {
            self.skip();
            let mut first = String::new();
            while self.is_tag_char(self.ch()) && self.ch() != '!' {
                first.push(self.ch());
                self.skip();
            }
            if self.ch() == '!' {
                self.skip();
                let mut suffix = String::new();
                while self.is_tag_char(self.ch()) {
                    suffix.push(self.ch());
                    self.skip();
                }
                (format!("!{}!", first), suffix)
            } else {
                ("!".to_string(), first)
            }
        };

        let c = self.ch();
        if !(is_blankz(c) || (self.flow_level > 0 && is_flow_indicator(c))) {
            return Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                "did not find expected whitespace after tag",
                self.mark.position(),
            ));
        }
        self.push_token(TokenKind::Tag { handle, suffix }, start);
        Ok(())
    }

    fn is_tag_char(&self, c: char) -> bool {
        !is_blankz(c) && !(self.flow_level > 0 && is_flow_indicator(c))
    }

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.mark;
        let text = self.scan_block_scalar(literal)?;
        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        self.push_token(TokenKind::Scalar { style, text }, start);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.mark;
        let text = self.scan_flow_scalar(single)?;
        self.adjacent_value_at = Some(self.mark.index);
        let style = if single {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };
        self.push_token(TokenKind::Scalar { style, text }, start);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.mark;
        let text = self.scan_plain_scalar()?;
        self.push_token(
            TokenKind::Scalar {
                style: ScalarStyle::Plain,
                text,
            },
            start,
        );
        Ok(())
    }

    // ========================================================================
    // Small scanning helpers
    // ========================================================================

    fn scan_word(&mut self) -> String {
        let mut word = String::new();
        while !is_blankz(self.ch()) {
            word.push(self.ch());
            self.skip();
        }
        word
    }

    fn skip_blanks(&mut self) {
        while is_blank(self.ch()) {
            self.skip();
        }
    }

    /// Allow trailing blanks and a comment, then require the line to end.
    fn skip_line_remainder(&mut self) -> Result<()> {
        self.skip_blanks();
        if self.ch() == '#' {
            while !is_breakz(self.ch()) {
                self.skip();
            }
        }
        if !is_breakz(self.ch()) {
            return Err(LoadError::lex(
                LexErrorKind::UnexpectedCharacter,
                "did not find expected comment or line break",
                self.mark.position(),
            ));
        }
        self.skip_line();
        Ok(())
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    fn scan_plain_scalar(&mut self) -> Result<String> {
        let indent = self.indent + 1;
        let mut text = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks = false;

        loop {
            if self.at_document_indicator('-') || self.at_document_indicator('.') {
                break;
            }
            if self.ch() == '#' {
                break;
            }

            while !is_blankz(self.ch()) {
                let c = self.ch();
                let next = self.look(1);
                if c == ':' && (is_blankz(next) || (self.flow_level > 0 && is_flow_indicator(next)))
                {
                    break;
                }
                if self.flow_level > 0 && is_flow_indicator(c) {
                    break;
                }

                if leading_blanks || !whitespaces.is_empty() {
                    if leading_blanks {
                        // Fold: one break becomes a space, blank lines stay.
                        if trailing_breaks.is_empty() {
                            text.push(' ');
                        } else {
                            text.push_str(&trailing_breaks);
                            trailing_breaks.clear();
                        }
                        leading_break.clear();
                        leading_blanks = false;
                    } else {
                        text.push_str(&whitespaces);
                        whitespaces.clear();
                    }
                }

                text.push(c);
                self.skip();
            }

            if !(is_blank(self.ch()) || is_break(self.ch())) {
                break;
            }

            while is_blank(self.ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if leading_blanks && (self.mark.col as isize) < indent && self.ch() == '\t' {
                        return Err(LoadError::lex(
                            LexErrorKind::BadIndentation,
                            "found a tab character that violates indentation",
                            self.mark.position(),
                        ));
                    }
                    if !leading_blanks {
                        whitespaces.push(self.ch());
                    }
                    self.skip();
                } else {
                    if leading_blanks {
                        trailing_breaks.push('\n');
                    } else {
                        whitespaces.clear();
                        leading_break.push('\n');
                        leading_blanks = true;
                    }
                    self.skip_line();
                }
            }

            if self.flow_level == 0 && (self.mark.col as isize) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        Ok(text)
    }

    fn scan_flow_scalar(&mut self, single: bool) -> Result<String> {
        let start = self.mark;
        let quote = if single { '\'' } else { '"' };
        let unterminated = || {
            LoadError::lex(
                LexErrorKind::UnterminatedQuote,
                if single {
                    "unterminated single-quoted scalar"
                } else {
                    "unterminated double-quoted scalar"
                },
                start.position(),
            )
        };

        self.skip();
        let mut text = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();

        loop {
            if self.at_document_indicator('-') || self.at_document_indicator('.') || self.at_end()
            {
                return Err(unterminated());
            }

            let mut leading_blanks = false;
            while !is_blankz(self.ch()) {
                let c = self.ch();
                if single && c == '\'' && self.look(1) == '\'' {
                    text.push('\'');
                    self.skip();
                    self.skip();
                } else if c == quote {
                    break;
                } else if !single && c == '\\' && is_break(self.look(1)) {
                    // Escaped line break: join without a space.
                    self.skip();
                    self.skip_line();
                    leading_blanks = true;
                    break;
                } else if !single && c == '\\' {
                    self.scan_escape(&mut text)?;
                } else {
                    text.push(c);
                    self.skip();
                }
            }

            if self.at_end() {
                return Err(unterminated());
            }
            if self.ch() == quote {
                break;
            }

            while is_blank(self.ch()) || is_break(self.ch()) {
                if is_blank(self.ch()) {
                    if !leading_blanks {
                        whitespaces.push(self.ch());
                    }
                    self.skip();
                } else {
                    if leading_blanks {
                        trailing_breaks.push('\n');
                    } else {
                        whitespaces.clear();
                        leading_break.push('\n');
                        leading_blanks = true;
                    }
                    self.skip_line();
                }
            }

            if leading_blanks {
                if leading_break.is_empty() {
                    text.push_str(&trailing_breaks);
                    trailing_breaks.clear();
                } else {
                    if trailing_breaks.is_empty() {
                        text.push(' ');
                    } else {
                        text.push_str(&trailing_breaks);
                        trailing_breaks.clear();
                    }
                    leading_break.clear();
                }
            } else {
                text.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.skip();
        Ok(text)
    }

    /// Decode one backslash escape in a double-quoted scalar.
    fn scan_escape(&mut self, text: &mut String) -> Result<()> {
        let start = self.mark;
        self.skip();
        let c = self.ch();
        let simple = match c {
            '0' => Some('\0'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            't' | '\t' => Some('\t'),
            'n' => Some('\n'),
            'v' => Some('\u{0B}'),
            'f' => Some('\u{0C}'),
            'r' => Some('\r'),
            'e' => Some('\u{1B}'),
            ' ' => Some(' '),
            '"' => Some('"'),
            '/' => Some('/'),
            '\\' => Some('\\'),
            'N' => Some('\u{85}'),
            '_' => Some('\u{A0}'),
            'L' => Some('\u{2028}'),
            'P' => Some('\u{2029}'),
            _ => None,
        };
        if let Some(decoded) = simple {
            text.push(decoded);
            self.skip();
            return Ok(());
        }

        let width = match c {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => {
                return Err(LoadError::lex(
                    LexErrorKind::BadEscape,
                    format!("unknown escape sequence '\\{}'", c),
                    start.position(),
                ))
            }
        };
        self.skip();

        let mut code: u32 = 0;
        for _ in 0..width {
            let digit = self.ch().to_digit(16).ok_or_else(|| {
                LoadError::lex(
                    LexErrorKind::BadEscape,
                    format!("expected {} hexadecimal digits after '\\{}'", width, c),
                    start.position(),
                )
            })?;
            code = code * 16 + digit;
            self.skip();
        }
        let decoded = char::from_u32(code).ok_or_else(|| {
            LoadError::lex(
                LexErrorKind::BadEscape,
                format!("escape '\\{}' encodes invalid code point U+{:X}", c, code),
                start.position(),
            )
        })?;
        text.push(decoded);
        Ok(())
    }

    fn scan_block_scalar(&mut self, literal: bool) -> Result<String> {
        self.skip();

        let mut chomping = Chomping::Clip;
        let mut increment = 0usize;
        let header_error = |position: Position| {
            LoadError::lex(
                LexErrorKind::BadIndentation,
                "block scalar indentation indicator must be between 1 and 9",
                position,
            )
        };

        if self.ch() == '+' || self.ch() == '-' {
            chomping = if self.ch() == '+' {
                Chomping::Keep
            } else {
                Chomping::Strip
            };
            self.skip();
            if let Some(d) = self.ch().to_digit(10) {
                if d == 0 {
                    return Err(header_error(self.mark.position()));
                }
                increment = d as usize;
                self.skip();
            }
        } else if let Some(d) = self.ch().to_digit(10) {
            if d == 0 {
                return Err(header_error(self.mark.position()));
            }
            increment = d as usize;
            self.skip();
            if self.ch() == '+' || self.ch() == '-' {
                chomping = if self.ch() == '+' {
                    Chomping::Keep
                } else {
                    Chomping::Strip
                };
                self.skip();
            }
        }

        self.skip_line_remainder()?;

        let mut indent = if increment > 0 {
            if self.indent >= 0 {
                self.indent as usize + increment
            } else {
                increment
            }
        } else {
            0
        };

        let mut text = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();

        self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;

        let mut leading_blank = false;
        while self.mark.col == indent && !self.at_end() {
            let trailing_blank = is_blank(self.ch());
            if !literal && !leading_break.is_empty() && !leading_blank && !trailing_blank {
                if trailing_breaks.is_empty() {
                    text.push(' ');
                }
                leading_break.clear();
            } else {
                text.push_str(&leading_break);
                leading_break.clear();
            }
            text.push_str(&trailing_breaks);
            trailing_breaks.clear();

            leading_blank = is_blank(self.ch());
            while !is_breakz(self.ch()) {
                text.push(self.ch());
                self.skip();
            }
            if self.at_end() {
                break;
            }
            leading_break.push('\n');
            self.skip_line();
            self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;
        }

        if chomping != Chomping::Strip {
            text.push_str(&leading_break);
        }
        if chomping == Chomping::Keep {
            text.push_str(&trailing_breaks);
        }
        Ok(text)
    }

    /// Consume indentation and empty lines inside a block scalar,
    /// detecting the content indentation when it is not yet known.
    fn block_scalar_breaks(&mut self, indent: &mut usize, breaks: &mut String) -> Result<()> {
        let mut max_indent = 0;
        loop {
            while (*indent == 0 || self.mark.col < *indent) && self.ch() == ' ' {
                self.skip();
            }
            if self.mark.col > max_indent {
                max_indent = self.mark.col;
            }
            if (*indent == 0 || self.mark.col < *indent) && self.ch() == '\t' {
                return Err(LoadError::lex(
                    LexErrorKind::BadIndentation,
                    "found a tab character where an indentation space is expected",
                    self.mark.position(),
                ));
            }
            if !is_break(self.ch()) {
                break;
            }
            breaks.push('\n');
            self.skip_line();
        }
        if *indent == 0 {
            let minimum = (self.indent + 1).max(1) as usize;
            *indent = max_indent.max(minimum);
        }
        Ok(())
    }
}

fn missing_value_indicator(mark: Mark) -> LoadError {
    LoadError::parse(
        ParseErrorKind::UnexpectedToken,
        "could not find expected ':'",
        mark.position(),
    )
}

fn is_version(s: &str) -> bool {
    match s.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
