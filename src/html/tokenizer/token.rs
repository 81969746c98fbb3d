// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::borrow::Cow;
use tendril::StrTendril;

use super::states;
use crate::html::interface::{Attribute, LocalName};

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Doctype {
    pub name: Option<StrTendril>,
    pub public_id: Option<StrTendril>,
    pub system_id: Option<StrTendril>,
    pub force_quirks: bool,
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum TagKind {
    StartTag,
    EndTag,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Tag {
    pub kind: TagKind,
    pub name: LocalName,
    pub self_closing: bool,
    pub attrs: Vec<Attribute>,
}

impl Tag {
    /// Are the tags equivalent ignoring attribute order and the
    /// self-closing flag? Used to recognize an "appropriate end tag".
    pub fn equiv_modulo_attr_order(&self, other: &Tag) -> bool {
        if self.kind != other.kind || self.name != other.name {
            return false;
        }
        let mut a = self.attrs.clone();
        let mut b = other.attrs.clone();
        a.sort();
        b.sort();
        a == b
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum Token {
    DoctypeToken(Doctype),
    TagToken(Tag),
    CommentToken(StrTendril),
    CharacterTokens(StrTendril),
    NullCharacterToken,
    EofToken,
    ParseError(Cow<'static, str>),
}

/// What the tree builder wants the tokenizer to do after a token, beyond
/// plain continuation (spec §4.2's "switch the insertion mode"-adjacent
/// side channel back into the tokenizer: RAWTEXT/RCDATA state switches
/// triggered by `<script>`/`<title>` etc.).
#[derive(Debug, PartialEq)]
#[must_use]
pub enum TokenSinkResult {
    Continue,
    /// Switch the tokenizer into one of the raw-text states (used after
    /// seeing a start tag whose content model demands it, e.g. `<style>`).
    RawData(states::RawKind),
    Plaintext,
    /// The document specified a character encoding; out of scope to act
    /// on (spec's Encoding codec is external) but carried through so a
    /// sink can observe it.
    EncodingIndicator(StrTendril),
}

/// Types which can receive tokens from the tokenizer.
pub trait TokenSink {
    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult;

    fn end(&mut self) {}

    /// Used in the markup declaration open state to decide whether an
    /// unrecognized `<!...>` becomes a bogus comment or a CDATA section.
    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        false
    }
}
