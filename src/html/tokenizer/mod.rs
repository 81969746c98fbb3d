// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tokenizer: an 80-odd state machine (spec §4.2) turning a
//! code-point stream into [`Token`]s for a [`TokenSink`].

mod char_ref;
pub mod states;
mod token;

pub use states::{AttrValueKind, DoctypeIdKind, RawKind, ScriptEscapeKind, State};
pub use token::{Doctype, Tag, TagKind, Token, TokenSink, TokenSinkResult};

use log::trace;
use tendril::StrTendril;

use crate::html::input_stream::InputStream;
use crate::html::interface::{Attribute, AttrName, LocalName, NamespaceOrd};

/// Tokenizer options, mirroring the `*Opts` convention used across this
/// crate's ambient configuration surface.
#[derive(Debug, Clone)]
pub struct TokenizerOpts {
    /// Discard a leading `U+FEFF BYTE ORDER MARK`. Default: true.
    pub discard_bom: bool,
    /// Initial state override, for conformance-test harnesses that need
    /// to start the tokenizer inside RAWTEXT/RCDATA/etc.
    pub initial_state: Option<State>,
    /// The "last start tag" context used to decide whether a RAWTEXT/
    /// RCDATA end tag is an "appropriate end tag token".
    pub last_start_tag_name: Option<String>,
}

impl Default for TokenizerOpts {
    fn default() -> Self {
        TokenizerOpts {
            discard_bom: true,
            initial_state: None,
            last_start_tag_name: None,
        }
    }
}

fn is_ascii_upper(c: char) -> bool {
    c.is_ascii_uppercase()
}

fn lower(c: char) -> char {
    c.to_ascii_lowercase()
}

/// The HTML tokenizer. Owns its [`TokenSink`] (typically a tree
/// constructor), matching the pipeline shape of spec §4.
pub struct Tokenizer<Sink> {
    pub sink: Sink,
    opts: TokenizerOpts,
    input: InputStream,
    state: State,
    return_state: State,
    at_eof: bool,
    seen_bom_check: bool,

    current_tag_kind: TagKind,
    current_tag_name: String,
    current_tag_self_closing: bool,
    current_tag_attrs: Vec<Attribute>,
    current_attr_name: String,
    current_attr_value: String,

    current_comment: String,
    current_doctype: Doctype,
    last_start_tag_name: Option<String>,
    temp_buf: String,
    char_ref_code: u32,

    line_number: u64,
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub fn new(sink: Sink, opts: TokenizerOpts) -> Self {
        let state = opts.initial_state.unwrap_or(State::Data);
        let last_start_tag_name = opts.last_start_tag_name.clone();
        Tokenizer {
            sink,
            opts,
            input: InputStream::new(),
            state,
            return_state: State::Data,
            at_eof: false,
            seen_bom_check: false,
            current_tag_kind: TagKind::StartTag,
            current_tag_name: String::new(),
            current_tag_self_closing: false,
            current_tag_attrs: Vec::new(),
            current_attr_name: String::new(),
            current_attr_value: String::new(),
            current_comment: String::new(),
            current_doctype: Doctype::default(),
            last_start_tag_name,
            temp_buf: String::new(),
            char_ref_code: 0,
            line_number: 1,
        }
    }

    /// Feed more input and run the tokenizer as far as it can go without
    /// blocking on more bytes.
    pub fn feed(&mut self, chunk: &str) {
        self.input.push(chunk);
        self.run();
    }

    /// Signal end of input and drain the tokenizer completely.
    pub fn end(&mut self) {
        self.input.mark_eof();
        self.at_eof = true;
        self.run();
        self.sink.process_token(Token::EofToken, self.line_number);
        self.sink.end();
    }

    fn emit(&mut self, token: Token) -> TokenSinkResult {
        self.sink.process_token(token, self.line_number)
    }

    fn emit_char(&mut self, c: char) {
        if c == '\n' {
            self.line_number += 1;
        }
        if c == '\0' {
            self.emit(Token::NullCharacterToken);
        } else {
            self.emit(Token::CharacterTokens(StrTendril::from_char(c)));
        }
    }

    fn emit_str(&mut self, s: &str) {
        self.line_number += s.matches('\n').count() as u64;
        self.emit(Token::CharacterTokens(StrTendril::from_slice(s)));
    }

    fn parse_error(&mut self, msg: &'static str) {
        self.emit(Token::ParseError(msg.into()));
    }

    fn is_appropriate_end_tag(&self) -> bool {
        self.last_start_tag_name.as_deref() == Some(self.current_tag_name.as_str())
    }

    fn start_new_tag(&mut self, kind: TagKind) {
        self.current_tag_kind = kind;
        self.current_tag_name.clear();
        self.current_tag_self_closing = false;
        self.current_tag_attrs.clear();
    }

    fn finish_attribute(&mut self) {
        if self.current_attr_name.is_empty() {
            return;
        }
        if self
            .current_tag_attrs
            .iter()
            .any(|a| a.name.local == self.current_attr_name)
        {
            self.parse_error("duplicate-attribute");
        } else {
            self.current_tag_attrs.push(Attribute {
                name: AttrName {
                    prefix: None,
                    ns: NamespaceOrd::from(crate::html::interface::Namespace::None),
                    local: std::mem::take(&mut self.current_attr_name),
                },
                value: std::mem::take(&mut self.current_attr_value),
            });
        }
        self.current_attr_name.clear();
        self.current_attr_value.clear();
    }

    /// Emit the in-progress tag and act on the sink's verdict: a sink may
    /// ask to switch into RAWTEXT/RCDATA/script-data for the element's
    /// content model (spec's "using the rules for" transitions that
    /// start tags like `<script>`/`<title>` trigger).
    fn emit_tag(&mut self) -> TokenSinkResult {
        self.finish_attribute();
        if self.current_tag_kind == TagKind::StartTag {
            self.last_start_tag_name = Some(self.current_tag_name.clone());
        }
        let tag = Tag {
            kind: self.current_tag_kind,
            name: LocalName::from(self.current_tag_name.as_str()),
            self_closing: self.current_tag_self_closing,
            attrs: std::mem::take(&mut self.current_tag_attrs),
        };
        let result = self.emit(Token::TagToken(tag));
        if let TokenSinkResult::RawData(kind) = result {
            self.state = State::RawData(kind);
        }
        result
    }

    fn emit_comment(&mut self) {
        let text = std::mem::take(&mut self.current_comment);
        self.emit(Token::CommentToken(StrTendril::from_slice(&text)));
    }

    fn emit_doctype(&mut self) {
        let doctype = std::mem::take(&mut self.current_doctype);
        self.emit(Token::DoctypeToken(doctype));
    }

    /// Main driver loop: run the state machine until input is exhausted
    /// (and we're not at EOF, so we just wait for more) or EOF has been
    /// fully processed.
    fn run(&mut self) {
        loop {
            if !self.step() {
                return;
            }
        }
    }

    /// Consume the input stream's BOM exactly once, if configured to.
    fn maybe_discard_bom(&mut self) {
        if self.seen_bom_check {
            return;
        }
        self.seen_bom_check = true;
        if !self.opts.discard_bom {
            return;
        }
        if let Some(c) = self.input.next() {
            if c != '\u{FEFF}' {
                self.input.reconsume(c);
            }
        }
    }

    /// Execute one state transition. Returns `false` when the tokenizer
    /// needs more input (or is fully drained at EOF) and should stop.
    fn step(&mut self) -> bool {
        self.maybe_discard_bom();
        trace!("tokenizer state {:?}", self.state);

        macro_rules! next_or_wait {
            () => {
                match self.input.next() {
                    Some(c) => c,
                    None => {
                        if self.at_eof {
                            return self.on_eof();
                        }
                        return false;
                    }
                }
            };
        }

        match self.state {
            State::Data => {
                let c = next_or_wait!();
                match c {
                    '&' => {
                        self.return_state = State::Data;
                        self.state = State::CharacterReference;
                    }
                    '<' => self.state = State::TagOpen,
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.emit_char('\0');
                    }
                    c => self.emit_char(c),
                }
            }

            State::Plaintext => {
                let c = next_or_wait!();
                if c == '\0' {
                    self.parse_error("unexpected-null-character");
                    self.emit_char('\u{FFFD}');
                } else {
                    self.emit_char(c);
                }
            }

            State::TagOpen => {
                let c = next_or_wait!();
                match c {
                    '!' => self.state = State::MarkupDeclarationOpen,
                    '/' => self.state = State::EndTagOpen,
                    c if c.is_ascii_alphabetic() => {
                        self.start_new_tag(TagKind::StartTag);
                        self.input.reconsume(c);
                        self.state = State::TagName;
                    }
                    '?' => {
                        self.parse_error("unexpected-question-mark-instead-of-tag-name");
                        self.current_comment.clear();
                        self.input.reconsume(c);
                        self.state = State::BogusComment;
                    }
                    c => {
                        self.parse_error("invalid-first-character-of-tag-name");
                        self.emit_char('<');
                        self.input.reconsume(c);
                        self.state = State::Data;
                    }
                }
            }

            State::EndTagOpen => {
                let c = next_or_wait!();
                match c {
                    c if c.is_ascii_alphabetic() => {
                        self.start_new_tag(TagKind::EndTag);
                        self.input.reconsume(c);
                        self.state = State::TagName;
                    }
                    '>' => {
                        self.parse_error("missing-end-tag-name");
                        self.state = State::Data;
                    }
                    c => {
                        self.parse_error("invalid-first-character-of-tag-name");
                        self.current_comment.clear();
                        self.input.reconsume(c);
                        self.state = State::BogusComment;
                    }
                }
            }

            State::TagName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => self.state = State::BeforeAttributeName,
                    '/' => self.state = State::SelfClosingStartTag,
                    '>' => {
                        self.state = State::Data;
                        self.emit_tag();
                    }
                    c if is_ascii_upper(c) => self.current_tag_name.push(lower(c)),
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.current_tag_name.push('\u{FFFD}');
                    }
                    c => self.current_tag_name.push(c),
                }
            }

            State::RawData(kind) => self.step_raw_data(kind, next_or_wait!()),
            State::RawLessThanSign(kind) => self.step_raw_lt(kind, next_or_wait!()),
            State::RawEndTagOpen(kind) => self.step_raw_end_tag_open(kind, next_or_wait!()),
            State::RawEndTagName(kind) => self.step_raw_end_tag_name(kind, next_or_wait!()),

            State::ScriptDataEscapeStart(kind) => {
                let c = next_or_wait!();
                if c == '-' {
                    self.temp_buf.push(c);
                    self.state = State::ScriptDataEscapeStartDash;
                } else {
                    self.input.reconsume(c);
                    self.state = State::RawData(RawKind::ScriptData);
                }
                let _ = kind;
            }
            State::ScriptDataEscapeStartDash => {
                let c = next_or_wait!();
                if c == '-' {
                    self.state =
                        State::ScriptDataEscapedDashDash(ScriptEscapeKind::Escaped);
                } else {
                    self.input.reconsume(c);
                    self.state = State::RawData(RawKind::ScriptData);
                }
            }
            State::ScriptDataEscapedDash(kind) => {
                let c = next_or_wait!();
                match c {
                    '-' => self.state = State::ScriptDataEscapedDashDash(kind),
                    '<' => self.state = State::RawLessThanSign(RawKind::ScriptDataEscaped(kind)),
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.emit_char('\u{FFFD}');
                        self.state = State::RawData(RawKind::ScriptDataEscaped(kind));
                    }
                    c => {
                        self.emit_char(c);
                        self.state = State::RawData(RawKind::ScriptDataEscaped(kind));
                    }
                }
            }
            State::ScriptDataEscapedDashDash(kind) => {
                let c = next_or_wait!();
                match c {
                    '-' => self.emit_char('-'),
                    '<' => self.state = State::RawLessThanSign(RawKind::ScriptDataEscaped(kind)),
                    '>' => {
                        self.emit_char('>');
                        self.state = State::RawData(RawKind::ScriptData);
                    }
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.emit_char('\u{FFFD}');
                        self.state = State::RawData(RawKind::ScriptDataEscaped(kind));
                    }
                    c => {
                        self.emit_char(c);
                        self.state = State::RawData(RawKind::ScriptDataEscaped(kind));
                    }
                }
            }
            State::ScriptDataDoubleEscapeEnd => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' | '/' | '>' => {
                        let kind = if self.temp_buf == "script" {
                            ScriptEscapeKind::Escaped
                        } else {
                            ScriptEscapeKind::DoubleEscaped
                        };
                        self.emit_char(c);
                        self.state = State::RawData(RawKind::ScriptDataEscaped(kind));
                    }
                    c if c.is_ascii_alphabetic() => {
                        self.temp_buf.push(lower(c));
                        self.emit_char(c);
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::RawData(RawKind::ScriptDataEscaped(
                            ScriptEscapeKind::DoubleEscaped,
                        ));
                    }
                }
            }

            State::BeforeAttributeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '/' | '>' => {
                        self.input.reconsume(c);
                        self.state = State::AfterAttributeName;
                    }
                    '=' => {
                        self.parse_error("unexpected-equals-sign-before-attribute-name");
                        self.finish_attribute();
                        self.current_attr_name.push(c);
                        self.state = State::AttributeName;
                    }
                    c => {
                        self.finish_attribute();
                        self.input.reconsume(c);
                        self.state = State::AttributeName;
                    }
                }
            }

            State::AttributeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' | '/' | '>' => {
                        self.input.reconsume(c);
                        self.state = State::AfterAttributeName;
                    }
                    '=' => self.state = State::BeforeAttributeValue,
                    c if is_ascii_upper(c) => self.current_attr_name.push(lower(c)),
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.current_attr_name.push('\u{FFFD}');
                    }
                    '"' | '\'' | '<' => {
                        self.parse_error("unexpected-character-in-attribute-name");
                        self.current_attr_name.push(c);
                    }
                    c => self.current_attr_name.push(c),
                }
            }

            State::AfterAttributeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '/' => self.state = State::SelfClosingStartTag,
                    '=' => self.state = State::BeforeAttributeValue,
                    '>' => {
                        self.state = State::Data;
                        self.emit_tag();
                    }
                    c => {
                        self.finish_attribute();
                        self.input.reconsume(c);
                        self.state = State::AttributeName;
                    }
                }
            }

            State::BeforeAttributeValue => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '"' => self.state = State::AttributeValue(AttrValueKind::DoubleQuoted),
                    '\'' => self.state = State::AttributeValue(AttrValueKind::SingleQuoted),
                    '>' => {
                        self.parse_error("missing-attribute-value");
                        self.state = State::Data;
                        self.emit_tag();
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::AttributeValue(AttrValueKind::Unquoted);
                    }
                }
            }

            State::AttributeValue(kind) => self.step_attribute_value(kind, next_or_wait!()),

            State::AfterAttributeValueQuoted => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => self.state = State::BeforeAttributeName,
                    '/' => self.state = State::SelfClosingStartTag,
                    '>' => {
                        self.state = State::Data;
                        self.emit_tag();
                    }
                    c => {
                        self.parse_error("missing-whitespace-between-attributes");
                        self.input.reconsume(c);
                        self.state = State::BeforeAttributeName;
                    }
                }
            }

            State::SelfClosingStartTag => {
                let c = next_or_wait!();
                match c {
                    '>' => {
                        self.current_tag_self_closing = true;
                        self.state = State::Data;
                        self.emit_tag();
                    }
                    c => {
                        self.parse_error("unexpected-solidus-in-tag");
                        self.input.reconsume(c);
                        self.state = State::BeforeAttributeName;
                    }
                }
            }

            State::BogusComment => {
                let c = next_or_wait!();
                match c {
                    '>' => {
                        self.state = State::Data;
                        self.emit_comment();
                    }
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.current_comment.push('\u{FFFD}');
                    }
                    c => self.current_comment.push(c),
                }
            }

            State::MarkupDeclarationOpen => self.step_markup_declaration_open(),

            State::CommentStart => {
                let c = next_or_wait!();
                match c {
                    '-' => self.state = State::CommentStartDash,
                    '>' => {
                        self.parse_error("abrupt-closing-of-empty-comment");
                        self.state = State::Data;
                        self.emit_comment();
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::Comment;
                    }
                }
            }
            State::CommentStartDash => {
                let c = next_or_wait!();
                match c {
                    '-' => self.state = State::CommentEnd,
                    '>' => {
                        self.parse_error("abrupt-closing-of-empty-comment");
                        self.state = State::Data;
                        self.emit_comment();
                    }
                    c => {
                        self.current_comment.push('-');
                        self.input.reconsume(c);
                        self.state = State::Comment;
                    }
                }
            }
            State::Comment => {
                let c = next_or_wait!();
                match c {
                    '<' => {
                        self.current_comment.push(c);
                        self.state = State::CommentLessThanSign;
                    }
                    '-' => self.state = State::CommentEndDash,
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.current_comment.push('\u{FFFD}');
                    }
                    c => self.current_comment.push(c),
                }
            }
            State::CommentLessThanSign => {
                let c = next_or_wait!();
                match c {
                    '!' => {
                        self.current_comment.push(c);
                        self.state = State::CommentLessThanSignBang;
                    }
                    '<' => self.current_comment.push(c),
                    c => {
                        self.input.reconsume(c);
                        self.state = State::Comment;
                    }
                }
            }
            State::CommentLessThanSignBang => {
                let c = next_or_wait!();
                if c == '-' {
                    self.state = State::CommentLessThanSignBangDash;
                } else {
                    self.input.reconsume(c);
                    self.state = State::Comment;
                }
            }
            State::CommentLessThanSignBangDash => {
                let c = next_or_wait!();
                if c == '-' {
                    self.state = State::CommentLessThanSignBangDashDash;
                } else {
                    self.input.reconsume(c);
                    self.state = State::CommentEndDash;
                }
            }
            State::CommentLessThanSignBangDashDash => {
                let c = next_or_wait!();
                self.input.reconsume(c);
                self.state = State::CommentEnd;
            }
            State::CommentEndDash => {
                let c = next_or_wait!();
                if c == '-' {
                    self.state = State::CommentEnd;
                } else {
                    self.current_comment.push('-');
                    self.input.reconsume(c);
                    self.state = State::Comment;
                }
            }
            State::CommentEnd => {
                let c = next_or_wait!();
                match c {
                    '>' => {
                        self.state = State::Data;
                        self.emit_comment();
                    }
                    '!' => self.state = State::CommentEndBang,
                    '-' => self.current_comment.push('-'),
                    c => {
                        self.current_comment.push('-');
                        self.current_comment.push('-');
                        self.input.reconsume(c);
                        self.state = State::Comment;
                    }
                }
            }
            State::CommentEndBang => {
                let c = next_or_wait!();
                match c {
                    '-' => {
                        self.current_comment.push_str("--!");
                        self.state = State::CommentEndDash;
                    }
                    '>' => {
                        self.parse_error("incorrectly-closed-comment");
                        self.state = State::Data;
                        self.emit_comment();
                    }
                    c => {
                        self.current_comment.push_str("--!");
                        self.input.reconsume(c);
                        self.state = State::Comment;
                    }
                }
            }

            State::Doctype => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => self.state = State::BeforeDoctypeName,
                    '>' => {
                        self.input.reconsume(c);
                        self.state = State::BeforeDoctypeName;
                    }
                    c => {
                        self.parse_error("missing-whitespace-before-doctype-name");
                        self.input.reconsume(c);
                        self.state = State::BeforeDoctypeName;
                    }
                }
            }
            State::BeforeDoctypeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    c if is_ascii_upper(c) => {
                        self.current_doctype = Doctype {
                            name: Some(StrTendril::from_char(lower(c))),
                            ..Default::default()
                        };
                        self.state = State::DoctypeName;
                    }
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        self.current_doctype = Doctype {
                            name: Some(StrTendril::from_char('\u{FFFD}')),
                            ..Default::default()
                        };
                        self.state = State::DoctypeName;
                    }
                    '>' => {
                        self.parse_error("missing-doctype-name");
                        self.current_doctype = Doctype {
                            force_quirks: true,
                            ..Default::default()
                        };
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    c => {
                        self.current_doctype = Doctype {
                            name: Some(StrTendril::from_char(c)),
                            ..Default::default()
                        };
                        self.state = State::DoctypeName;
                    }
                }
            }
            State::DoctypeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => self.state = State::AfterDoctypeName,
                    '>' => {
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    c if is_ascii_upper(c) => {
                        if let Some(n) = &mut self.current_doctype.name {
                            n.push_char(lower(c));
                        }
                    }
                    '\0' => {
                        self.parse_error("unexpected-null-character");
                        if let Some(n) = &mut self.current_doctype.name {
                            n.push_char('\u{FFFD}');
                        }
                    }
                    c => {
                        if let Some(n) = &mut self.current_doctype.name {
                            n.push_char(c);
                        }
                    }
                }
            }
            State::AfterDoctypeName => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '>' => {
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::BogusDoctype;
                    }
                }
            }
            State::AfterDoctypeKeyword(_kind) => {
                let c = next_or_wait!();
                self.input.reconsume(c);
                self.state = State::BogusDoctype;
            }
            State::BeforeDoctypeIdentifier(kind) => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '"' => {
                        self.set_doctype_id(kind, Some(StrTendril::new()));
                        self.state = State::DoctypeIdentifierDoubleQuoted(kind);
                    }
                    '\'' => {
                        self.set_doctype_id(kind, Some(StrTendril::new()));
                        self.state = State::DoctypeIdentifierSingleQuoted(kind);
                    }
                    '>' => {
                        self.current_doctype.force_quirks = true;
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::BogusDoctype;
                    }
                }
            }
            State::DoctypeIdentifierDoubleQuoted(kind) => {
                let c = next_or_wait!();
                self.step_doctype_id_quoted(kind, '"', c);
            }
            State::DoctypeIdentifierSingleQuoted(kind) => {
                let c = next_or_wait!();
                self.step_doctype_id_quoted(kind, '\'', c);
            }
            State::AfterDoctypeIdentifier(kind) => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {
                        self.state = if kind == DoctypeIdKind::Public {
                            State::BetweenDoctypePublicAndSystemIdentifiers
                        } else {
                            State::BogusDoctype
                        }
                    }
                    '>' => {
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::BogusDoctype;
                    }
                }
            }
            State::BetweenDoctypePublicAndSystemIdentifiers => {
                let c = next_or_wait!();
                match c {
                    '\t' | '\n' | '\x0C' | ' ' => {}
                    '>' => {
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    '"' => {
                        self.set_doctype_id(DoctypeIdKind::System, Some(StrTendril::new()));
                        self.state =
                            State::DoctypeIdentifierDoubleQuoted(DoctypeIdKind::System);
                    }
                    '\'' => {
                        self.set_doctype_id(DoctypeIdKind::System, Some(StrTendril::new()));
                        self.state =
                            State::DoctypeIdentifierSingleQuoted(DoctypeIdKind::System);
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::BogusDoctype;
                    }
                }
            }
            State::BogusDoctype => {
                let c = next_or_wait!();
                match c {
                    '>' => {
                        self.state = State::Data;
                        self.emit_doctype();
                    }
                    '\0' => self.parse_error("unexpected-null-character"),
                    _ => {}
                }
            }

            State::CdataSection => {
                let c = next_or_wait!();
                match c {
                    ']' => self.state = State::CdataSectionBracket,
                    c => self.emit_char(c),
                }
            }
            State::CdataSectionBracket => {
                let c = next_or_wait!();
                if c == ']' {
                    self.state = State::CdataSectionEnd;
                } else {
                    self.emit_char(']');
                    self.input.reconsume(c);
                    self.state = State::CdataSection;
                }
            }
            State::CdataSectionEnd => {
                let c = next_or_wait!();
                match c {
                    ']' => self.emit_char(']'),
                    '>' => self.state = State::Data,
                    c => {
                        self.emit_str("]]");
                        self.input.reconsume(c);
                        self.state = State::CdataSection;
                    }
                }
            }

            State::CharacterReference => self.step_character_reference(),
            State::NamedCharacterReference => self.step_named_character_reference(),
            State::AmbiguousAmpersand => {
                let c = next_or_wait!();
                match c {
                    c if c.is_ascii_alphanumeric() => {
                        if self.consuming_attribute_value() {
                            self.current_attr_value.push(c);
                        } else {
                            self.emit_char(c);
                        }
                    }
                    ';' => {
                        self.parse_error("unknown-named-character-reference");
                        self.input.reconsume(c);
                        self.state = self.return_state;
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = self.return_state;
                    }
                }
            }
            State::NumericCharacterReference => {
                self.char_ref_code = 0;
                let c = next_or_wait!();
                match c {
                    'x' | 'X' => {
                        self.temp_buf.push(c);
                        self.state = State::HexadecimalCharacterReferenceStart;
                    }
                    c => {
                        self.input.reconsume(c);
                        self.state = State::DecimalCharacterReferenceStart;
                    }
                }
            }
            State::HexadecimalCharacterReferenceStart => {
                let c = next_or_wait!();
                if c.is_ascii_hexdigit() {
                    self.input.reconsume(c);
                    self.state = State::HexadecimalCharacterReference;
                } else {
                    self.parse_error("absence-of-digits-in-numeric-character-reference");
                    self.flush_temp_buf_as_characters();
                    self.input.reconsume(c);
                    self.state = self.return_state;
                }
            }
            State::DecimalCharacterReferenceStart => {
                let c = next_or_wait!();
                if c.is_ascii_digit() {
                    self.input.reconsume(c);
                    self.state = State::DecimalCharacterReference;
                } else {
                    self.parse_error("absence-of-digits-in-numeric-character-reference");
                    self.flush_temp_buf_as_characters();
                    self.input.reconsume(c);
                    self.state = self.return_state;
                }
            }
            State::HexadecimalCharacterReference => {
                let c = next_or_wait!();
                match c.to_digit(16) {
                    Some(d) => self.char_ref_code = self.char_ref_code.wrapping_mul(16) + d,
                    None if c == ';' => self.state = State::NumericCharacterReferenceEnd,
                    None => {
                        self.parse_error("missing-semicolon-after-character-reference");
                        self.input.reconsume(c);
                        self.state = State::NumericCharacterReferenceEnd;
                    }
                }
            }
            State::DecimalCharacterReference => {
                let c = next_or_wait!();
                match c.to_digit(10) {
                    Some(d) => self.char_ref_code = self.char_ref_code.wrapping_mul(10) + d,
                    None if c == ';' => self.state = State::NumericCharacterReferenceEnd,
                    None => {
                        self.parse_error("missing-semicolon-after-character-reference");
                        self.input.reconsume(c);
                        self.state = State::NumericCharacterReferenceEnd;
                    }
                }
            }
            State::NumericCharacterReferenceEnd => self.finish_numeric_character_reference(),
        }
        true
    }

    fn consuming_attribute_value(&self) -> bool {
        matches!(
            self.return_state,
            State::AttributeValue(_) | State::AfterAttributeValueQuoted
        )
    }

    fn set_doctype_id(&mut self, kind: DoctypeIdKind, value: Option<StrTendril>) {
        match kind {
            DoctypeIdKind::Public => self.current_doctype.public_id = value,
            DoctypeIdKind::System => self.current_doctype.system_id = value,
        }
    }

    fn step_doctype_id_quoted(&mut self, kind: DoctypeIdKind, quote: char, c: char) {
        match c {
            c if c == quote => self.state = State::AfterDoctypeIdentifier(kind),
            '\0' => {
                self.parse_error("unexpected-null-character");
                self.push_doctype_id(kind, '\u{FFFD}');
            }
            '>' => {
                self.parse_error("abrupt-doctype-public-identifier");
                self.current_doctype.force_quirks = true;
                self.state = State::Data;
                self.emit_doctype();
            }
            c => self.push_doctype_id(kind, c),
        }
    }

    fn push_doctype_id(&mut self, kind: DoctypeIdKind, c: char) {
        let field = match kind {
            DoctypeIdKind::Public => &mut self.current_doctype.public_id,
            DoctypeIdKind::System => &mut self.current_doctype.system_id,
        };
        if let Some(s) = field {
            s.push_char(c);
        }
    }

    fn step_raw_data(&mut self, kind: RawKind, c: char) {
        match c {
            '&' if matches!(kind, RawKind::Rcdata) => {
                self.return_state = State::RawData(kind);
                self.state = State::CharacterReference;
            }
            '<' => {
                self.temp_buf.clear();
                self.state = State::RawLessThanSign(kind);
            }
            '\0' => {
                self.parse_error("unexpected-null-character");
                self.emit_char('\u{FFFD}');
            }
            c => self.emit_char(c),
        }
    }

    fn step_raw_lt(&mut self, kind: RawKind, c: char) {
        match c {
            '/' => {
                self.temp_buf.clear();
                self.state = State::RawEndTagOpen(kind);
            }
            '!' if matches!(kind, RawKind::ScriptData) => {
                self.emit_str("<!");
                self.state = State::ScriptDataEscapeStart(ScriptEscapeKind::Escaped);
            }
            c => {
                self.emit_char('<');
                self.input.reconsume(c);
                self.state = State::RawData(kind);
            }
        }
    }

    fn step_raw_end_tag_open(&mut self, kind: RawKind, c: char) {
        if c.is_ascii_alphabetic() {
            self.start_new_tag(TagKind::EndTag);
            self.input.reconsume(c);
            self.state = State::RawEndTagName(kind);
        } else {
            self.emit_str("</");
            self.input.reconsume(c);
            self.state = State::RawData(kind);
        }
    }

    fn step_raw_end_tag_name(&mut self, kind: RawKind, c: char) {
        let boundary = matches!(c, '\t' | '\n' | '\x0C' | ' ' | '/' | '>');
        if boundary && self.is_appropriate_end_tag() {
            match c {
                '\t' | '\n' | '\x0C' | ' ' => {
                    self.state = State::BeforeAttributeName;
                    return;
                }
                '/' => {
                    self.state = State::SelfClosingStartTag;
                    return;
                }
                '>' => {
                    self.state = State::Data;
                    self.emit_tag();
                    return;
                }
                _ => unreachable!(),
            }
        }
        if c.is_ascii_alphabetic() {
            self.current_tag_name.push(lower(c));
            self.temp_buf.push(c);
        } else {
            self.emit_str("</");
            let buf = std::mem::take(&mut self.temp_buf);
            self.emit_str(&buf);
            self.input.reconsume(c);
            self.state = State::RawData(kind);
        }
    }

    fn step_attribute_value(&mut self, kind: AttrValueKind, c: char) {
        match (kind, c) {
            (AttrValueKind::DoubleQuoted, '"') | (AttrValueKind::SingleQuoted, '\'') => {
                self.state = State::AfterAttributeValueQuoted;
            }
            (AttrValueKind::Unquoted, '\t' | '\n' | '\x0C' | ' ') => {
                self.state = State::BeforeAttributeName;
            }
            (AttrValueKind::Unquoted, '>') => {
                self.state = State::Data;
                self.emit_tag();
            }
            (_, '&') => {
                self.return_state = State::AttributeValue(kind);
                self.state = State::CharacterReference;
            }
            (_, '\0') => {
                self.parse_error("unexpected-null-character");
                self.current_attr_value.push('\u{FFFD}');
            }
            (AttrValueKind::Unquoted, '"' | '\'' | '<' | '=' | '`') => {
                self.parse_error("unexpected-character-in-unquoted-attribute-value");
                self.current_attr_value.push(c);
            }
            (_, c) => self.current_attr_value.push(c),
        }
    }

    fn step_markup_declaration_open(&mut self) {
        let mut peeked = String::new();
        for _ in 0..7 {
            match self.input.next() {
                Some(c) => peeked.push(c),
                None => break,
            }
        }
        if let Some(rest) = peeked.strip_prefix("--") {
            for c in rest.chars().rev() {
                self.input.reconsume(c);
            }
            self.current_comment.clear();
            self.state = State::CommentStart;
            return;
        }
        if peeked.eq_ignore_ascii_case("doctype") {
            self.state = State::Doctype;
            return;
        }
        if peeked == "[CDATA[" {
            if self.sink.adjusted_current_node_present_but_not_in_html_namespace() {
                self.state = State::CdataSection;
                return;
            }
            self.parse_error("cdata-in-html-content");
            self.current_comment = "[CDATA[".to_string();
            self.state = State::BogusComment;
            return;
        }
        for c in peeked.chars().rev() {
            self.input.reconsume(c);
        }
        self.current_comment.clear();
        self.state = State::BogusComment;
    }

    fn step_character_reference(&mut self) {
        self.temp_buf.clear();
        self.temp_buf.push('&');
        match self.input.next() {
            Some(c) if c.is_ascii_alphanumeric() => {
                self.input.reconsume(c);
                self.state = State::NamedCharacterReference;
            }
            Some('#') => {
                self.temp_buf.push('#');
                self.state = State::NumericCharacterReference;
            }
            Some(c) => {
                self.input.reconsume(c);
                self.flush_temp_buf_as_characters();
                self.state = self.return_state;
            }
            None => {
                if self.at_eof {
                    self.flush_temp_buf_as_characters();
                    self.state = self.return_state;
                }
            }
        }
    }

    fn step_named_character_reference(&mut self) {
        // Greedily buffer candidate characters, then resolve against the
        // named-reference trie (spec's longest-match requirement).
        let mut lookahead = String::new();
        loop {
            match self.input.next() {
                Some(c) if c.is_ascii_alphanumeric() || c == ';' => {
                    lookahead.push(c);
                    if c == ';' {
                        break;
                    }
                    if lookahead.len() >= 32 {
                        break;
                    }
                }
                Some(c) => {
                    self.input.reconsume(c);
                    break;
                }
                None => break,
            }
        }
        match char_ref::longest_match(&lookahead) {
            Some((len, (c1, c2))) => {
                for c in lookahead[len..].chars().rev() {
                    self.input.reconsume(c);
                }
                if self.consuming_attribute_value() {
                    self.current_attr_value.push(c1);
                    if let Some(c2) = c2 {
                        self.current_attr_value.push(c2);
                    }
                } else {
                    self.emit_char(c1);
                    if let Some(c2) = c2 {
                        self.emit_char(c2);
                    }
                }
                self.state = self.return_state;
            }
            None => {
                for c in lookahead.chars().rev() {
                    self.input.reconsume(c);
                }
                self.flush_temp_buf_as_characters();
                self.state = State::AmbiguousAmpersand;
            }
        }
    }

    fn flush_temp_buf_as_characters(&mut self) {
        if self.consuming_attribute_value() {
            let buf = std::mem::take(&mut self.temp_buf);
            self.current_attr_value.push_str(&buf);
        } else {
            let buf = std::mem::take(&mut self.temp_buf);
            self.emit_str(&buf);
        }
    }

    fn finish_numeric_character_reference(&mut self) {
        let mut code = self.char_ref_code;
        if code == 0 {
            self.parse_error("null-character-reference");
            code = 0xFFFD;
        } else if code > 0x10FFFF {
            self.parse_error("character-reference-outside-unicode-range");
            code = 0xFFFD;
        } else if (0xD800..=0xDFFF).contains(&code) {
            self.parse_error("surrogate-character-reference");
            code = 0xFFFD;
        }
        let c = char::from_u32(code).unwrap_or('\u{FFFD}');
        if self.consuming_attribute_value() {
            self.current_attr_value.push(c);
        } else {
            self.emit_char(c);
        }
        self.state = self.return_state;
    }

    fn on_eof(&mut self) -> bool {
        match self.state {
            State::Data
            | State::Plaintext
            | State::RawData(_)
            | State::CdataSection
            | State::CdataSectionBracket => false,
            State::TagOpen => {
                self.parse_error("eof-before-tag-name");
                self.emit_char('<');
                false
            }
            _ => false,
        }
    }
}
