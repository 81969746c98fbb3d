// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tree-construction dispatcher (spec §4.4): 23 insertion modes
//! driving a [`TreeSink`] from the tokens the tokenizer emits.

mod afe;
mod foreign;
mod stack;
mod types;

use log::debug;
use tendril::StrTendril;

use crate::html::interface::{
    Attribute, ElementFlags, Namespace, NodeOrText, QualName, QuirksMode, TreeSink,
};
use crate::html::tokenizer::{Doctype, RawKind, Tag, TagKind, Token as TokToken, TokenSink, TokenSinkResult};

use afe::ActiveFormattingElements;
use stack::{OpenElements, ScopeKind};
use types::{FormatEntry, InsertionMode, ProcessResult, SplitStatus, Token};

static VOID_ELEMENTS: phf::Set<&'static str> = phf::phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
};

static FORMATTING_ELEMENTS: phf::Set<&'static str> = phf::phf_set! {
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
};

static SPECIAL_BLOCK_ELEMENTS: phf::Set<&'static str> = phf::phf_set! {
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav", "section",
    "summary",
};

/// HTML-namespace elements in the spec's "special" category (§13.2.4.1),
/// used by the adoption agency algorithm to find the "furthest block" -
/// the first such element above the misnested formatting element on the
/// stack of open elements.
static SPECIAL_CATEGORY_ELEMENTS: phf::Set<&'static str> = phf::phf_set! {
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound",
    "blockquote", "body", "br", "button", "caption", "center", "col", "colgroup", "dd",
    "details", "dir", "div", "dl", "dt", "embed", "fieldset", "figcaption", "figure",
    "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hgroup", "hr", "html", "iframe", "img", "input", "keygen", "li", "link",
    "listing", "main", "marquee", "menu", "meta", "nav", "noembed", "noframes", "noscript",
    "object", "ol", "p", "param", "plaintext", "pre", "script", "section", "select",
    "source", "style", "summary", "table", "tbody", "td", "template", "textarea", "tfoot",
    "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
};

/// Start tags that force a foreign-content subtree closed and get
/// reprocessed by the current HTML insertion mode instead (spec §4.4's
/// foreign-content "breaks out" list).
static FOREIGN_BREAKOUT_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "dir", "div", "dl", "dt",
    "em", "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li",
    "listing", "menu", "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span",
    "strong", "strike", "sub", "sup", "table", "tt", "u", "ul", "var",
};

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(name)
}

fn is_whitespace(s: &str) -> bool {
    s.chars()
        .all(|c| matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
}

/// Tree-builder options, mirroring the ambient `*Opts` convention.
#[derive(Debug, Clone)]
pub struct TreeBuilderOpts {
    /// Treat the input as a full document (spec default) rather than a
    /// fragment parse. Fragment parsing is out of scope for this crate.
    pub scripting_enabled: bool,
    /// Stack-of-open-elements depth above which a `depth-limit-exceeded`
    /// parse error is reported and the stack is popped back to a safe
    /// depth (spec §5). Zero disables the cap.
    pub max_open_elements_depth: usize,
    /// Report the stack depth alongside each parse error instead of the
    /// bare message.
    pub exact_errors: bool,
}

impl Default for TreeBuilderOpts {
    fn default() -> Self {
        TreeBuilderOpts {
            scripting_enabled: false,
            max_open_elements_depth: 512,
            exact_errors: false,
        }
    }
}

pub struct TreeBuilder<Sink: TreeSink> {
    sink: Sink,
    opts: TreeBuilderOpts,
    mode: InsertionMode,
    orig_mode: InsertionMode,
    open_elems: OpenElements<Sink::Handle>,
    afe: ActiveFormattingElements<Sink::Handle>,
    head_elem: Option<Sink::Handle>,
    form_elem: Option<Sink::Handle>,
    frameset_ok: bool,
    quirks_mode: QuirksMode,
    doc_handle: Sink::Handle,
    ignore_lf: bool,
    pending_table_text: Vec<(SplitStatus, StrTendril)>,
    /// Spec §4.4's one-shot foster-parenting flag: set only around the
    /// two places the table insertion modes fall back to "in body"
    /// handling for content that doesn't belong in a table.
    foster_parenting: bool,
}

impl<Sink: TreeSink> TreeBuilder<Sink> {
    pub fn new(mut sink: Sink, opts: TreeBuilderOpts) -> Self {
        let doc_handle = sink.get_document();
        TreeBuilder {
            sink,
            opts,
            mode: InsertionMode::Initial,
            orig_mode: InsertionMode::Initial,
            open_elems: OpenElements::new(),
            afe: ActiveFormattingElements::new(),
            head_elem: None,
            form_elem: None,
            frameset_ok: true,
            quirks_mode: QuirksMode::NoQuirks,
            doc_handle,
            ignore_lf: false,
            pending_table_text: Vec::new(),
            foster_parenting: false,
        }
    }

    pub fn finish(self) -> Sink {
        self.sink
    }

    fn current_node(&self) -> Option<&Sink::Handle> {
        self.open_elems.top()
    }

    fn current_node_named(&self, local: &str) -> bool {
        match self.current_node() {
            Some(h) => {
                let name = self.sink.elem_name(h);
                name.ns == Namespace::Html && name.local == local
            }
            None => false,
        }
    }

    fn insert_at_current(&mut self, child: NodeOrText<Sink::Handle>) {
        let parent = self
            .current_node()
            .cloned()
            .unwrap_or_else(|| self.doc_handle.clone());
        self.insert_at_appropriate_place(&parent, child);
    }

    /// Spec §4.4's "appropriate place for inserting a node", given an
    /// explicit override target rather than the current node (used by
    /// the adoption agency algorithm, which inserts relative to the
    /// common ancestor it computes rather than whatever is topmost on
    /// the stack of open elements at the time).
    fn insert_at_appropriate_place(
        &mut self,
        override_target: &Sink::Handle,
        child: NodeOrText<Sink::Handle>,
    ) {
        if self.foster_parenting {
            let name = self.sink.elem_name(override_target);
            if name.ns == Namespace::Html
                && matches!(name.local.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr")
            {
                self.foster_parent(child);
                return;
            }
        }
        self.sink.append(override_target, child);
    }

    /// Spec §4.4's foster-parenting redirect: insert immediately before
    /// the last `<table>` on the stack of open elements, in that
    /// table's own parent, rather than inside the table structure
    /// element that's nominally the current node. Falls back to
    /// appending to the bottommost open element if no table is open, or
    /// to the element just below the table on the stack if the table
    /// itself has no parent yet.
    fn foster_parent(&mut self, child: NodeOrText<Sink::Handle>) {
        let last_table = self
            .open_elems
            .as_slice()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, h)| {
                let name = self.sink.elem_name(h);
                name.ns == Namespace::Html && name.local == "table"
            })
            .map(|(i, h)| (i, h.clone()));

        let Some((idx, table)) = last_table else {
            let root = self
                .open_elems
                .as_slice()
                .first()
                .cloned()
                .unwrap_or_else(|| self.doc_handle.clone());
            self.sink.append(&root, child);
            return;
        };

        if self.sink.parent_node(&table).is_some() {
            self.sink.append_before_sibling(&table, child);
        } else {
            let above = self.open_elems.as_slice()[idx.saturating_sub(1)].clone();
            self.sink.append(&above, child);
        }
    }

    fn create_element(&mut self, tag: &Tag, flags: ElementFlags) -> Sink::Handle {
        let name = QualName::new(None, Namespace::Html, tag.name.clone());
        let attrs: Vec<Attribute> = tag.attrs.clone();
        self.sink.create_element(name, attrs, flags)
    }

    /// Creates and pushes a foreign element (spec §4.4's "insert a
    /// foreign element"), applying the SVG/MathML tag-name and
    /// attribute case-restoration tables and the generic XLink/XML/XMLNS
    /// attribute adjustment before handing the token to the sink.
    fn insert_foreign_element(&mut self, tag: &Tag, ns: Namespace) -> Sink::Handle {
        let mut attrs = tag.attrs.clone();
        let local = match ns {
            Namespace::Svg => {
                foreign::adjust_svg_attributes(&mut attrs);
                foreign::adjust_svg_tag_name(&tag.name)
            }
            Namespace::MathMl => {
                foreign::adjust_mathml_attributes(&mut attrs);
                tag.name.clone()
            }
            _ => tag.name.clone(),
        };
        foreign::adjust_foreign_attributes(&mut attrs);

        let mut flags = ElementFlags::default();
        if ns == Namespace::MathMl && local == "annotation-xml" {
            flags.mathml_annotation_xml = attrs.iter().any(|a| {
                a.name.local == "encoding"
                    && (a.value.eq_ignore_ascii_case("text/html")
                        || a.value.eq_ignore_ascii_case("application/xhtml+xml"))
            });
        }

        let name = QualName::new(None, ns, local);
        let elem = self.sink.create_element(name, attrs, flags);
        self.insert_at_current(NodeOrText::AppendNode(elem.clone()));
        self.open_elems.push(elem.clone());
        self.enforce_depth_limit();
        elem
    }

    fn insert_element(&mut self, tag: &Tag) -> Sink::Handle {
        let elem = self.create_element(tag, ElementFlags::default());
        self.insert_at_current(NodeOrText::AppendNode(elem.clone()));
        self.open_elems.push(elem.clone());
        self.enforce_depth_limit();
        elem
    }

    /// Spec §5's depth cap: once the stack of open elements grows past
    /// `max_open_elements_depth`, report a parse error and pop back to a
    /// safe depth rather than growing unbounded on pathological input.
    fn enforce_depth_limit(&mut self) {
        let limit = self.opts.max_open_elements_depth;
        if limit == 0 || self.open_elems.len() <= limit {
            return;
        }
        self.report_error("depth-limit-exceeded");
        while self.open_elems.len() > limit {
            self.pop();
        }
    }

    fn insert_formatting_element(&mut self, tag: &Tag) -> Sink::Handle {
        let elem = self.insert_element(tag);
        self.afe.push_element(elem.clone(), tag.clone());
        elem
    }

    fn insert_text(&mut self, text: &str) {
        self.insert_at_current(NodeOrText::AppendText(StrTendril::from_slice(text)));
    }

    fn insert_comment(&mut self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        self.insert_at_current(NodeOrText::AppendNode(comment));
    }

    fn pop(&mut self) -> Option<Sink::Handle> {
        self.open_elems.pop()
    }

    fn pop_until_named(&mut self, local: &str) {
        loop {
            let done = self.current_node_named(local);
            let popped = self.pop();
            if done || popped.is_none() {
                break;
            }
        }
    }

    /// Reconstruct the active formatting elements (spec §4.4.1): re-open
    /// every entry since the last marker (or the start of the list) that
    /// is no longer on the stack of open elements.
    fn reconstruct_active_formatting_elements(&mut self) {
        if self.afe.is_empty() {
            return;
        }
        let last = self.afe.len() - 1;
        if let FormatEntry::Marker = self.afe.get(last) {
            return;
        }
        if let FormatEntry::Element(h, _) = self.afe.get(last) {
            if self.open_elems.position(&self.sink, h).is_some() {
                return;
            }
        }

        let mut i = last;
        loop {
            if i == 0 {
                break;
            }
            i -= 1;
            let on_stack = match self.afe.get(i) {
                FormatEntry::Marker => true,
                FormatEntry::Element(h, _) => self.open_elems.position(&self.sink, h).is_some(),
            };
            if on_stack {
                i += 1;
                break;
            }
        }

        for j in i..=last {
            if let FormatEntry::Element(_, tag) = self.afe.get(j) {
                let tag = tag.clone();
                let new_elem = self.insert_element(&tag);
                self.afe.replace(j, new_elem, tag);
            }
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags_except("p");
        if !self.current_node_named("p") {
            self.report_error("unexpected-end-tag");
        }
        self.pop_until_named("p");
    }

    fn generate_implied_end_tags_except(&mut self, except: &str) {
        const IMPLIED: &[&str] = &[
            "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
        ];
        loop {
            match self.current_node() {
                Some(h) => {
                    let name = self.sink.elem_name(h);
                    if name.ns == Namespace::Html
                        && name.local != except
                        && IMPLIED.contains(&name.local.as_str())
                    {
                        self.pop();
                        continue;
                    }
                    break;
                }
                None => break,
            }
        }
    }

    fn report_error(&mut self, msg: &'static str) {
        if self.opts.exact_errors {
            debug!("parse error: {} (open elements depth {})", msg, self.open_elems.len());
        } else {
            debug!("parse error: {}", msg);
        }
    }

    fn is_special_category(&self, handle: &Sink::Handle) -> bool {
        let name = self.sink.elem_name(handle);
        match name.ns {
            Namespace::Html => SPECIAL_CATEGORY_ELEMENTS.contains(name.local.as_str()),
            Namespace::MathMl => {
                matches!(name.local.as_str(), "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml")
            }
            Namespace::Svg => matches!(name.local.as_str(), "foreignObject" | "desc" | "title"),
            _ => false,
        }
    }

    /// The first (nearest to `stack_index`) element in the special
    /// category sitting above the formatting element on the stack of
    /// open elements, if any (spec §4.4.1's "furthest block").
    fn find_furthest_block(&self, stack_index: usize) -> Option<usize> {
        let slice = self.open_elems.as_slice();
        for i in (stack_index + 1)..slice.len() {
            if self.is_special_category(&slice[i]) {
                return Some(i);
            }
        }
        None
    }

    /// The adoption agency algorithm (spec §4.4.1): reopens a formatting
    /// element that got misnested relative to a "special" block element
    /// closing around it, cloning the formatting element and splitting
    /// the affected subtree across both sides of the reopened clone.
    /// Bounded to 8 outer-loop iterations per the spec text, each
    /// cloning and reparenting at most the nodes between the furthest
    /// block and the formatting element.
    fn adoption_agency(&mut self, tag: &Tag) {
        for _ in 0..8 {
            let Some((afe_index, formatting_elem, format_tag)) =
                self.afe.last_matching(&self.sink, &tag.name)
            else {
                return self.any_other_end_tag(tag);
            };
            let Some(stack_index) = self.open_elems.position(&self.sink, &formatting_elem) else {
                self.report_error("adoption-agency-not-on-stack");
                self.afe.remove_at(afe_index);
                return;
            };
            if !self.open_elems.has_element_in_scope_at(&self.sink, stack_index) {
                self.report_error("adoption-agency-not-in-scope");
                return;
            }
            if stack_index != self.open_elems.len() - 1 {
                self.report_error("adoption-agency-misnested");
            }

            let Some(furthest_block_index) = self.find_furthest_block(stack_index) else {
                self.open_elems.truncate_to(stack_index);
                self.afe.remove_at(afe_index);
                return;
            };

            let common_ancestor = self.open_elems.as_slice()[stack_index - 1].clone();
            let furthest_block = self.open_elems.as_slice()[furthest_block_index].clone();
            // Tracks formattingElement's slot in the active formatting
            // elements list as the inner loop below removes and
            // reinserts entries around it.
            let mut bookmark = afe_index;
            let mut last_node = furthest_block.clone();
            let mut node_index = furthest_block_index;
            let mut inner_loop_counter = 0;

            loop {
                if node_index == stack_index + 1 {
                    break;
                }
                node_index -= 1;
                inner_loop_counter += 1;
                let node = self.open_elems.as_slice()[node_index].clone();

                if inner_loop_counter > 3 {
                    if let Some(p) = self.afe.position(&self.sink, &node) {
                        self.afe.remove_at(p);
                        if p < bookmark {
                            bookmark -= 1;
                        }
                    }
                }

                let Some(node_afe_index) = self.afe.position(&self.sink, &node) else {
                    self.open_elems.remove_at(node_index);
                    continue;
                };

                let node_tag = match self.afe.get(node_afe_index) {
                    FormatEntry::Element(_, t) => t.clone(),
                    FormatEntry::Marker => unreachable!("position() never returns a marker"),
                };
                let clone = self.create_element(&node_tag, ElementFlags::default());
                self.afe.replace(node_afe_index, clone.clone(), node_tag);
                self.open_elems.replace_at(node_index, clone.clone());

                if self.sink.same_node(&last_node, &furthest_block) {
                    bookmark = node_afe_index + 1;
                }

                self.sink.remove_from_parent(&last_node);
                self.sink.append(&clone, NodeOrText::AppendNode(last_node));
                last_node = clone;
            }

            self.sink.remove_from_parent(&last_node);
            self.insert_at_appropriate_place(&common_ancestor, NodeOrText::AppendNode(last_node));

            let new_formatting = self.create_element(&format_tag, ElementFlags::default());
            self.sink.reparent_children(&furthest_block, &new_formatting);
            self.sink.append(&furthest_block, NodeOrText::AppendNode(new_formatting.clone()));

            let formatting_afe_index = self
                .afe
                .position(&self.sink, &formatting_elem)
                .expect("formattingElement's entry is never touched by the inner loop above");
            self.afe.remove_at(formatting_afe_index);
            if formatting_afe_index < bookmark {
                bookmark -= 1;
            }
            self.afe
                .insert_at(bookmark.min(self.afe.len()), new_formatting.clone(), format_tag);

            if let Some(old_index) = self.open_elems.position(&self.sink, &formatting_elem) {
                self.open_elems.remove_at(old_index);
            }
            // The clone goes immediately below furthestBlock on the
            // stack, not above it: furthestBlock (not the clone) stays
            // the current node, since content following the original
            // end tag belongs under furthestBlock directly, not under
            // the reopened formatting element.
            if let Some(fb_index) = self.open_elems.position(&self.sink, &furthest_block) {
                self.open_elems.insert_at(fb_index, new_formatting);
            }
        }
    }

    fn any_other_end_tag(&mut self, tag: &Tag) {
        for i in (0..self.open_elems.len()).rev() {
            let h = self.open_elems.as_slice()[i].clone();
            let name = self.sink.elem_name(&h);
            if name.ns == Namespace::Html && name.local == tag.name {
                self.generate_implied_end_tags_except(&tag.name);
                self.open_elems.truncate_to(i);
                return;
            }
            if SPECIAL_BLOCK_ELEMENTS.contains(name.local.as_str()) {
                self.report_error("unexpected-end-tag");
                return;
            }
        }
    }

    /// Spec §4.4's tree construction dispatcher: most tokens are
    /// processed by the current insertion mode, but a token is instead
    /// processed by the foreign-content rules when the adjusted current
    /// node is not an HTML element (and isn't one of the narrow
    /// integration-point exceptions back to HTML rules).
    fn use_foreign_content_rules(&self, token: &Token) -> bool {
        if matches!(token, Token::Eof) {
            return false;
        }
        let Some(node) = self.current_node() else {
            return false;
        };
        let name = self.sink.elem_name(node);
        if name.ns == Namespace::Html {
            return false;
        }
        if self.sink.is_mathml_text_integration_point(node) {
            let passthrough = match token {
                Token::Tag(t) if t.kind == TagKind::StartTag => {
                    !matches!(t.name.as_str(), "mglyph" | "malignmark")
                }
                Token::Characters(..) | Token::NullCharacter => true,
                _ => false,
            };
            if passthrough {
                return false;
            }
        }
        if name.ns == Namespace::MathMl && name.local == "annotation-xml" {
            if let Token::Tag(t) = token {
                if t.kind == TagKind::StartTag && t.name == "svg" {
                    return false;
                }
            }
        }
        if self.sink.is_html_integration_point(node) {
            match token {
                Token::Tag(t) if t.kind == TagKind::StartTag => return false,
                Token::Characters(..) | Token::NullCharacter => return false,
                _ => {}
            }
        }
        true
    }

    /// Pop elements until the current node is back in the HTML
    /// namespace or sits at an integration point (spec's "breaks out of
    /// foreign content" handling).
    fn pop_out_of_foreign_content(&mut self) {
        loop {
            let Some(h) = self.current_node().cloned() else {
                break;
            };
            let name = self.sink.elem_name(&h);
            if name.ns == Namespace::Html
                || self.sink.is_mathml_text_integration_point(&h)
                || self.sink.is_html_integration_point(&h)
            {
                break;
            }
            self.pop();
        }
    }

    fn is_foreign_breakout(&self, tag: &Tag) -> bool {
        FOREIGN_BREAKOUT_TAGS.contains(tag.name.as_str())
            || (tag.name == "font"
                && tag
                    .attrs
                    .iter()
                    .any(|a| matches!(a.name.local.as_str(), "color" | "face" | "size")))
    }

    fn step_in_foreign_content(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::NullCharacter => {
                self.report_error("unexpected-null-character");
                self.insert_text("\u{FFFD}");
                ProcessResult::Done
            }
            Token::Characters(_, ref t) => {
                if !is_whitespace(t) {
                    self.frameset_ok = false;
                }
                self.insert_text(t);
                ProcessResult::Done
            }
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Doctype(_) => {
                self.report_error("unexpected-doctype");
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag && self.is_foreign_breakout(tag) => {
                self.report_error("unexpected-start-tag-breaks-out-of-foreign-content");
                self.pop_out_of_foreign_content();
                ProcessResult::Reprocess(self.mode, token)
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag => {
                let ns = self
                    .current_node()
                    .map(|h| self.sink.elem_name(h).ns)
                    .unwrap_or(Namespace::Html);
                self.insert_foreign_element(tag, ns);
                if tag.self_closing {
                    self.pop();
                    ProcessResult::DoneAckSelfClosing
                } else {
                    ProcessResult::Done
                }
            }
            Token::Tag(ref tag) if tag.kind == TagKind::EndTag => {
                self.foreign_end_tag(tag);
                ProcessResult::Done
            }
            Token::Eof => ProcessResult::Done,
        }
    }

    /// Spec §4.4's "any other end tag" steps for foreign content: walk
    /// up the stack looking for a case-insensitive name match, falling
    /// back to the current HTML insertion mode if an HTML-namespace
    /// element is reached first.
    fn foreign_end_tag(&mut self, tag: &Tag) {
        let mut i = self.open_elems.len();
        while i > 0 {
            i -= 1;
            let h = self.open_elems.as_slice()[i].clone();
            let name = self.sink.elem_name(&h);
            if name.local.eq_ignore_ascii_case(&tag.name) {
                self.open_elems.truncate_to(i);
                return;
            }
            if name.ns == Namespace::Html {
                self.process(Token::Tag(tag.clone()));
                return;
            }
        }
    }

    fn reset_insertion_mode_appropriately(&mut self) {
        for (i, h) in self.open_elems.as_slice().iter().enumerate().rev() {
            let last = i == 0;
            let name = self.sink.elem_name(h);
            if name.ns != Namespace::Html {
                continue;
            }
            self.mode = match name.local.as_str() {
                "select" => InsertionMode::InSelect,
                "td" | "th" if !last => InsertionMode::InCell,
                "tr" => InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => InsertionMode::InTableBody,
                "caption" => InsertionMode::InCaption,
                "colgroup" => InsertionMode::InColumnGroup,
                "table" => InsertionMode::InTable,
                "template" => InsertionMode::InTemplate,
                "head" if !last => InsertionMode::InHead,
                "body" => InsertionMode::InBody,
                "frameset" => InsertionMode::InFrameset,
                "html" => {
                    if self.head_elem.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    }
                }
                _ => {
                    if last {
                        InsertionMode::InBody
                    } else {
                        continue;
                    }
                }
            };
            return;
        }
        self.mode = InsertionMode::InBody;
    }

    fn process(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        if self.use_foreign_content_rules(&token) {
            return self.step_in_foreign_content(token);
        }
        match self.mode {
            InsertionMode::Initial => self.step_initial(token),
            InsertionMode::BeforeHtml => self.step_before_html(token),
            InsertionMode::BeforeHead => self.step_before_head(token),
            InsertionMode::InHead => self.step_in_head(token),
            InsertionMode::InHeadNoscript => self.step_in_head_noscript(token),
            InsertionMode::AfterHead => self.step_after_head(token),
            InsertionMode::InBody => self.step_in_body(token),
            InsertionMode::Text => self.step_text(token),
            InsertionMode::InTable => self.step_in_table(token),
            InsertionMode::InTableText => self.step_in_table_text(token),
            InsertionMode::InCaption => self.step_in_caption(token),
            InsertionMode::InColumnGroup => self.step_in_column_group(token),
            InsertionMode::InTableBody => self.step_in_table_body(token),
            InsertionMode::InRow => self.step_in_row(token),
            InsertionMode::InCell => self.step_in_cell(token),
            InsertionMode::InSelect => self.step_in_select(token),
            InsertionMode::InSelectInTable => self.step_in_select_in_table(token),
            InsertionMode::InTemplate => self.step_in_body(token),
            InsertionMode::AfterBody => self.step_after_body(token),
            InsertionMode::InFrameset => self.step_in_frameset(token),
            InsertionMode::AfterFrameset => self.step_after_frameset(token),
            InsertionMode::AfterAfterBody => self.step_after_after_body(token),
            InsertionMode::AfterAfterFrameset => ProcessResult::Done,
        }
    }

    fn step_initial(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) if is_whitespace(&t) => ProcessResult::Done,
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Doctype(d) => {
                let quirks = d.force_quirks
                    || d.name.as_deref() != Some("html")
                    || d.public_id.is_some()
                    || d.system_id.is_some();
                self.quirks_mode = if quirks {
                    QuirksMode::Quirks
                } else {
                    QuirksMode::NoQuirks
                };
                self.sink.set_quirks_mode(self.quirks_mode);
                self.sink.append_doctype_to_document(
                    d.name.unwrap_or_default(),
                    d.public_id.unwrap_or_default(),
                    d.system_id.unwrap_or_default(),
                );
                self.mode = InsertionMode::BeforeHtml;
                ProcessResult::Done
            }
            token => ProcessResult::Reprocess(InsertionMode::BeforeHtml, token),
        }
    }

    fn step_before_html(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) if is_whitespace(&t) => ProcessResult::Done,
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag && tag.name == "html" => {
                let elem = self.create_element(tag, ElementFlags::default());
                self.sink.append(&self.doc_handle.clone(), NodeOrText::AppendNode(elem.clone()));
                self.open_elems.push(elem);
                self.mode = InsertionMode::BeforeHead;
                ProcessResult::Done
            }
            token @ Token::Tag(Tag { kind: TagKind::EndTag, .. })
                if !matches!(&token, Token::Tag(t) if matches!(t.name.as_str(), "head" | "body" | "html" | "br")) =>
            {
                ProcessResult::Done
            }
            token => {
                let html_tag = Tag { kind: TagKind::StartTag, name: "html".into(), self_closing: false, attrs: vec![] };
                let elem = self.create_element(&html_tag, ElementFlags::default());
                self.sink.append(&self.doc_handle.clone(), NodeOrText::AppendNode(elem.clone()));
                self.open_elems.push(elem);
                ProcessResult::Reprocess(InsertionMode::BeforeHead, token)
            }
        }
    }

    fn step_before_head(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) if is_whitespace(&t) => ProcessResult::Done,
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag && tag.name == "head" => {
                let elem = self.insert_element(tag);
                self.head_elem = Some(elem);
                self.mode = InsertionMode::InHead;
                ProcessResult::Done
            }
            token @ Token::Tag(Tag { kind: TagKind::EndTag, .. })
                if !matches!(&token, Token::Tag(t) if matches!(t.name.as_str(), "head" | "body" | "html" | "br")) =>
            {
                ProcessResult::Done
            }
            token => {
                let head_tag = Tag { kind: TagKind::StartTag, name: "head".into(), self_closing: false, attrs: vec![] };
                let elem = self.insert_element(&head_tag);
                self.head_elem = Some(elem);
                ProcessResult::Reprocess(InsertionMode::InHead, token)
            }
        }
    }

    fn step_in_head(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) if is_whitespace(&t) => {
                self.insert_text(&t);
                ProcessResult::Done
            }
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag => match tag.name.as_str() {
                "meta" | "base" | "basefont" | "bgsound" | "link" => {
                    self.insert_element(tag);
                    self.pop();
                    ProcessResult::DoneAckSelfClosing
                }
                "title" => {
                    self.insert_element(tag);
                    self.orig_mode = self.mode;
                    self.mode = InsertionMode::Text;
                    ProcessResult::ToText(RawKind::Rcdata)
                }
                "noscript" if self.opts.scripting_enabled => {
                    self.insert_element(tag);
                    self.mode = InsertionMode::InHeadNoscript;
                    ProcessResult::Done
                }
                "noframes" | "style" => {
                    self.insert_element(tag);
                    self.orig_mode = self.mode;
                    self.mode = InsertionMode::Text;
                    ProcessResult::ToText(RawKind::Rawtext)
                }
                "script" => {
                    self.insert_element(tag);
                    self.orig_mode = self.mode;
                    self.mode = InsertionMode::Text;
                    ProcessResult::ToText(RawKind::ScriptData)
                }
                "head" => {
                    self.report_error("unexpected-start-tag");
                    ProcessResult::Done
                }
                "template" => {
                    self.insert_element(tag);
                    self.afe.push_marker();
                    self.frameset_ok = false;
                    self.mode = InsertionMode::InTemplate;
                    ProcessResult::Done
                }
                _ => {
                    self.pop();
                    self.mode = InsertionMode::AfterHead;
                    ProcessResult::Reprocess(InsertionMode::AfterHead, token)
                }
            },
            Token::Tag(ref tag) if tag.kind == TagKind::EndTag && tag.name == "head" => {
                self.pop();
                self.mode = InsertionMode::AfterHead;
                ProcessResult::Done
            }
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "body" | "html" | "br") =>
            {
                self.report_error("unexpected-end-tag");
                ProcessResult::Done
            }
            token => {
                self.pop();
                ProcessResult::Reprocess(InsertionMode::AfterHead, token)
            }
        }
    }

    fn step_in_head_noscript(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Tag(ref tag) if tag.kind == TagKind::EndTag && tag.name == "noscript" => {
                self.pop();
                self.mode = InsertionMode::InHead;
                ProcessResult::Done
            }
            Token::Characters(_, t) if is_whitespace(&t) => self.step_in_head(token),
            Token::Comment(_) => self.step_in_head(token),
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style") =>
            {
                self.step_in_head(token)
            }
            token => {
                self.pop();
                self.mode = InsertionMode::InHead;
                ProcessResult::Reprocess(InsertionMode::InHead, token)
            }
        }
    }

    fn step_after_head(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) if is_whitespace(&t) => {
                self.insert_text(&t);
                ProcessResult::Done
            }
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag && tag.name == "body" => {
                self.insert_element(tag);
                self.frameset_ok = false;
                self.mode = InsertionMode::InBody;
                ProcessResult::Done
            }
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag && tag.name == "frameset" => {
                self.insert_element(tag);
                self.mode = InsertionMode::InFrameset;
                ProcessResult::Done
            }
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(
                    name.as_str(),
                    "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                        | "style" | "template" | "title"
                ) =>
            {
                if let Some(head) = self.head_elem.clone() {
                    self.open_elems.push(head);
                    let r = self.step_in_head(token);
                    if let Some(i) = self.head_elem.as_ref().and_then(|h| self.open_elems.position(&self.sink, h)) {
                        self.open_elems.remove_at(i);
                    }
                    r
                } else {
                    ProcessResult::Done
                }
            }
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name == "template" => {
                self.step_in_head(token)
            }
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "body" | "html" | "br") =>
            {
                self.report_error("unexpected-end-tag");
                ProcessResult::Done
            }
            token => {
                let body_tag = Tag { kind: TagKind::StartTag, name: "body".into(), self_closing: false, attrs: vec![] };
                self.insert_element(&body_tag);
                self.mode = InsertionMode::InBody;
                ProcessResult::Reprocess(InsertionMode::InBody, token)
            }
        }
    }

    fn step_in_body(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::NullCharacter => {
                self.report_error("unexpected-null-character");
                ProcessResult::Done
            }
            Token::Characters(_, t) => {
                self.reconstruct_active_formatting_elements();
                if !is_whitespace(&t) {
                    self.frameset_ok = false;
                }
                self.insert_text(&t);
                ProcessResult::Done
            }
            Token::Comment(t) => {
                self.insert_comment(t);
                ProcessResult::Done
            }
            Token::Eof => ProcessResult::Done,
            Token::Tag(ref tag) if tag.kind == TagKind::StartTag => {
                self.start_tag_in_body(tag.clone())
            }
            Token::Tag(ref tag) if tag.kind == TagKind::EndTag => self.end_tag_in_body(tag.clone()),
            _ => ProcessResult::Done,
        }
    }

    fn start_tag_in_body(&mut self, tag: Tag) -> ProcessResult<Sink::Handle> {
        match tag.name.as_str() {
            "html" => {
                self.report_error("unexpected-start-tag");
                ProcessResult::Done
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.current_node_named("p") {
                    self.close_p_element();
                }
                if self.open_elems.has_numbered_header_in_scope(&self.sink) {
                    self.report_error("unexpected-start-tag");
                    self.pop();
                }
                self.insert_element(&tag);
                ProcessResult::Done
            }
            "a" => {
                if let Some((i, h, _)) = self.afe.last_matching(&self.sink, "a") {
                    self.report_error("unexpected-start-tag-implies-end-tag");
                    let end = Tag { kind: TagKind::EndTag, name: "a".into(), self_closing: false, attrs: vec![] };
                    self.adoption_agency(&end);
                    self.afe.remove_element(&self.sink, &h);
                    if let Some(j) = self.open_elems.position(&self.sink, &h) {
                        self.open_elems.remove_at(j);
                    }
                    let _ = i;
                }
                self.reconstruct_active_formatting_elements();
                self.insert_formatting_element(&tag);
                ProcessResult::Done
            }
            name if FORMATTING_ELEMENTS.contains(name) => {
                self.reconstruct_active_formatting_elements();
                self.insert_formatting_element(&tag);
                ProcessResult::Done
            }
            name if SPECIAL_BLOCK_ELEMENTS.contains(name) || matches!(name, "p" | "ul" | "ol" | "dl" | "center") => {
                if self.current_node_named("p") {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                ProcessResult::Done
            }
            "li" => {
                self.frameset_ok = false;
                if self.current_node_named("p") {
                    self.close_p_element();
                }
                self.generate_implied_end_tags_except("li");
                if !self.current_node_named("li") {
                    self.report_error("unexpected-start-tag");
                }
                self.pop_until_named("li");
                self.insert_element(&tag);
                ProcessResult::Done
            }
            "dd" | "dt" => {
                self.frameset_ok = false;
                if self.current_node_named("p") {
                    self.close_p_element();
                }
                self.generate_implied_end_tags_except(&tag.name);
                self.pop_until_named(&tag.name);
                self.insert_element(&tag);
                ProcessResult::Done
            }
            "button" => {
                if self.open_elems.has_in_scope(&self.sink, ScopeKind::Default, "button") {
                    self.report_error("unexpected-start-tag");
                    self.any_other_end_tag(&Tag { kind: TagKind::EndTag, name: "button".into(), self_closing: false, attrs: vec![] });
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(&tag);
                self.frameset_ok = false;
                ProcessResult::Done
            }
            "table" => {
                if !matches!(self.quirks_mode, QuirksMode::Quirks) && self.current_node_named("p") {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
                ProcessResult::Done
            }
            name if is_void(name) => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&tag);
                self.pop();
                self.frameset_ok = false;
                ProcessResult::DoneAckSelfClosing
            }
            "input" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&tag);
                self.pop();
                let is_hidden = tag.attrs.iter().any(|a| {
                    a.name.local == "type" && a.value.eq_ignore_ascii_case("hidden")
                });
                if !is_hidden {
                    self.frameset_ok = false;
                }
                ProcessResult::DoneAckSelfClosing
            }
            "textarea" => {
                self.insert_element(&tag);
                self.ignore_lf = true;
                self.frameset_ok = false;
                self.orig_mode = self.mode;
                self.mode = InsertionMode::Text;
                ProcessResult::ToText(RawKind::Rcdata)
            }
            "select" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&tag);
                self.frameset_ok = false;
                self.mode = match self.mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                ProcessResult::Done
            }
            "script" | "style" | "noframes" | "title" => self.step_in_head(Token::Tag(tag)),
            "math" => {
                self.reconstruct_active_formatting_elements();
                let self_closing = tag.self_closing;
                self.insert_foreign_element(&tag, Namespace::MathMl);
                if self_closing {
                    self.pop();
                    ProcessResult::DoneAckSelfClosing
                } else {
                    ProcessResult::Done
                }
            }
            "svg" => {
                self.reconstruct_active_formatting_elements();
                let self_closing = tag.self_closing;
                self.insert_foreign_element(&tag, Namespace::Svg);
                if self_closing {
                    self.pop();
                    ProcessResult::DoneAckSelfClosing
                } else {
                    ProcessResult::Done
                }
            }
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&tag);
                ProcessResult::Done
            }
        }
    }

    fn end_tag_in_body(&mut self, tag: Tag) -> ProcessResult<Sink::Handle> {
        match tag.name.as_str() {
            "body" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Default, "body") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.mode = InsertionMode::AfterBody;
                ProcessResult::Done
            }
            "html" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Default, "body") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.mode = InsertionMode::AfterBody;
                ProcessResult::Reprocess(InsertionMode::AfterBody, Token::Tag(tag))
            }
            "p" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Button, "p") {
                    self.report_error("unexpected-end-tag");
                    let start = Tag { kind: TagKind::StartTag, name: "p".into(), self_closing: false, attrs: vec![] };
                    self.insert_element(&start);
                }
                self.close_p_element();
                ProcessResult::Done
            }
            "li" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::ListItem, "li") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags_except("li");
                self.pop_until_named("li");
                ProcessResult::Done
            }
            "dd" | "dt" => {
                self.generate_implied_end_tags_except(&tag.name);
                self.pop_until_named(&tag.name);
                ProcessResult::Done
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if !self.open_elems.has_numbered_header_in_scope(&self.sink) {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags_except("");
                loop {
                    let is_header = self.current_node().map_or(false, |h| {
                        let n = self.sink.elem_name(h);
                        matches!(n.local.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                    });
                    let popped = self.pop();
                    if is_header || popped.is_none() {
                        break;
                    }
                }
                ProcessResult::Done
            }
            name if FORMATTING_ELEMENTS.contains(name) => {
                self.adoption_agency(&tag);
                ProcessResult::Done
            }
            name if SPECIAL_BLOCK_ELEMENTS.contains(name) || matches!(name, "ul" | "ol" | "dl" | "center" | "button") => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Default, name) {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags_except("");
                self.pop_until_named(name);
                ProcessResult::Done
            }
            _ => {
                self.any_other_end_tag(&tag);
                ProcessResult::Done
            }
        }
    }

    fn step_text(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(_, t) => {
                self.insert_text(&t);
                ProcessResult::Done
            }
            Token::NullCharacter => ProcessResult::Done,
            Token::Eof => {
                self.pop();
                self.mode = self.orig_mode;
                ProcessResult::Reprocess(self.orig_mode, Token::Eof)
            }
            Token::Tag(Tag { kind: TagKind::EndTag, .. }) => {
                if self.current_node_named("script") {
                    if let Some(h) = self.current_node().cloned() {
                        self.sink.mark_script_already_started(&h);
                    }
                }
                self.pop();
                self.mode = self.orig_mode;
                ProcessResult::Done
            }
            _ => ProcessResult::Done,
        }
    }

    /// Table-family modes are foster-parenting heavy special cases; this
    /// crate implements the common single-row/single-cell shape and
    /// falls back to `in_body`'s handling for anything it doesn't
    /// recognize, rather than the full per-mode table algorithm.
    fn step_in_table(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "caption" => {
                self.afe.push_marker();
                self.insert_element(tag);
                self.mode = InsertionMode::InCaption;
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "colgroup" => {
                self.insert_element(tag);
                self.mode = InsertionMode::InColumnGroup;
                ProcessResult::Done
            }
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag
                    && matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                self.insert_element(tag);
                self.mode = InsertionMode::InTableBody;
                ProcessResult::Done
            }
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag && matches!(tag.name.as_str(), "tr" | "td" | "th") =>
            {
                let tbody = Tag { kind: TagKind::StartTag, name: "tbody".into(), self_closing: false, attrs: vec![] };
                self.insert_element(&tbody);
                self.mode = InsertionMode::InTableBody;
                ProcessResult::Reprocess(InsertionMode::InTableBody, token.clone())
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "table" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Table, "table") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.pop_until_named("table");
                self.reset_insertion_mode_appropriately();
                ProcessResult::Done
            }
            Token::Characters(_, _) => {
                self.mode = InsertionMode::InTableText;
                self.pending_table_text.clear();
                ProcessResult::Reprocess(InsertionMode::InTableText, token.clone())
            }
            _ => {
                self.report_error("unexpected-token-in-table");
                self.foster_parenting = true;
                let result = self.step_in_body(token);
                self.foster_parenting = false;
                result
            }
        }
    }

    fn step_in_table_text(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::Characters(status, t) => {
                self.pending_table_text.push((status, t));
                ProcessResult::Done
            }
            token => {
                let any_non_ws = self
                    .pending_table_text
                    .iter()
                    .any(|(s, _)| *s == SplitStatus::NotWhitespace);
                let buffered = std::mem::take(&mut self.pending_table_text);
                if any_non_ws {
                    // Spec §4.4's "in table text" flush: non-whitespace
                    // characters are foster-parented as if processed by
                    // the "in body" insertion mode, rather than
                    // inserted into the table directly.
                    self.report_error("unexpected-character-in-table");
                    self.frameset_ok = false;
                    self.foster_parenting = true;
                    for (status, t) in buffered {
                        self.step_in_body(Token::Characters(status, t));
                    }
                    self.foster_parenting = false;
                } else {
                    for (_, t) in buffered {
                        self.insert_text(&t);
                    }
                }
                self.mode = InsertionMode::InTable;
                ProcessResult::Reprocess(InsertionMode::InTable, token)
            }
        }
    }

    fn step_in_caption(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "caption" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Table, "caption") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags_except("");
                self.pop_until_named("caption");
                self.afe.clear_to_last_marker();
                self.mode = InsertionMode::InTable;
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "table" => {
                self.pop_until_named("caption");
                self.afe.clear_to_last_marker();
                self.mode = InsertionMode::InTable;
                ProcessResult::Reprocess(InsertionMode::InTable, token.clone())
            }
            _ => self.step_in_body(token),
        }
    }

    fn step_in_column_group(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Characters(_, t) if is_whitespace(t) => {
                self.insert_text(t);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "col" => {
                self.insert_element(tag);
                self.pop();
                ProcessResult::DoneAckSelfClosing
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "colgroup" => {
                if !self.current_node_named("colgroup") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.pop();
                self.mode = InsertionMode::InTable;
                ProcessResult::Done
            }
            _ => {
                if !self.current_node_named("colgroup") {
                    self.report_error("unexpected-token");
                    return ProcessResult::Done;
                }
                self.pop();
                self.mode = InsertionMode::InTable;
                ProcessResult::Reprocess(InsertionMode::InTable, token.clone())
            }
        }
    }

    fn step_in_table_body(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "tr" => {
                self.insert_element(tag);
                self.mode = InsertionMode::InRow;
                ProcessResult::Done
            }
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag && matches!(tag.name.as_str(), "td" | "th") =>
            {
                let tr = Tag { kind: TagKind::StartTag, name: "tr".into(), self_closing: false, attrs: vec![] };
                self.insert_element(&tr);
                self.mode = InsertionMode::InRow;
                ProcessResult::Reprocess(InsertionMode::InRow, token.clone())
            }
            Token::Tag(tag)
                if tag.kind == TagKind::EndTag
                    && matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Table, &tag.name) {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.pop_until_named(&tag.name);
                self.mode = InsertionMode::InTable;
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "table" => {
                self.mode = InsertionMode::InTable;
                ProcessResult::Reprocess(InsertionMode::InTable, token.clone())
            }
            _ => self.step_in_table(token),
        }
    }

    fn step_in_row(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag && matches!(tag.name.as_str(), "td" | "th") =>
            {
                self.insert_element(tag);
                self.mode = InsertionMode::InCell;
                self.afe.push_marker();
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "tr" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Table, "tr") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.pop_until_named("tr");
                self.mode = InsertionMode::InTableBody;
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "table" => {
                self.mode = InsertionMode::InTableBody;
                ProcessResult::Reprocess(InsertionMode::InTableBody, token.clone())
            }
            _ => self.step_in_table(token),
        }
    }

    fn step_in_cell(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag)
                if tag.kind == TagKind::EndTag && matches!(tag.name.as_str(), "td" | "th") =>
            {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Table, &tag.name) {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags_except("");
                self.pop_until_named(&tag.name);
                self.afe.clear_to_last_marker();
                self.mode = InsertionMode::InRow;
                ProcessResult::Done
            }
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag
                    && matches!(tag.name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr") =>
            {
                self.mode = InsertionMode::InRow;
                ProcessResult::Reprocess(InsertionMode::InRow, token.clone())
            }
            _ => self.step_in_body(token),
        }
    }

    fn step_in_select(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::NullCharacter => ProcessResult::Done,
            Token::Characters(_, t) => {
                self.insert_text(t);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "option" => {
                if self.current_node_named("option") {
                    self.pop();
                }
                self.insert_element(tag);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "optgroup" => {
                if self.current_node_named("option") {
                    self.pop();
                }
                if self.current_node_named("optgroup") {
                    self.pop();
                }
                self.insert_element(tag);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "optgroup" => {
                if self.current_node_named("option") {
                    self.pop();
                }
                if self.current_node_named("optgroup") {
                    self.pop();
                }
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "option" => {
                if self.current_node_named("option") {
                    self.pop();
                }
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "select" => {
                if !self.open_elems.has_in_scope(&self.sink, ScopeKind::Select, "select") {
                    self.report_error("unexpected-end-tag");
                    return ProcessResult::Done;
                }
                self.pop_until_named("select");
                self.reset_insertion_mode_appropriately();
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "select" => {
                self.report_error("unexpected-start-tag");
                self.pop_until_named("select");
                self.reset_insertion_mode_appropriately();
                ProcessResult::Done
            }
            _ => ProcessResult::Done,
        }
    }

    fn step_in_select_in_table(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Tag(tag)
                if tag.kind == TagKind::StartTag
                    && matches!(tag.name.as_str(), "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th") =>
            {
                self.pop_until_named("select");
                self.reset_insertion_mode_appropriately();
                ProcessResult::Reprocess(self.mode, token.clone())
            }
            _ => self.step_in_select(token),
        }
    }

    fn step_after_body(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Characters(_, t) if is_whitespace(t) => self.step_in_body(token),
            Token::Comment(t) => {
                let target = self.open_elems.as_slice().first().cloned();
                if let Some(html) = target {
                    self.sink.append(&html, NodeOrText::AppendNode({
                        let c = self.sink.create_comment(t.clone());
                        c
                    }));
                }
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "html" => {
                self.mode = InsertionMode::AfterAfterBody;
                ProcessResult::Done
            }
            Token::Eof => ProcessResult::Done,
            token => ProcessResult::Reprocess(InsertionMode::InBody, token.clone()),
        }
    }

    fn step_in_frameset(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Characters(_, t) if is_whitespace(t) => {
                self.insert_text(t);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "frameset" => {
                self.insert_element(tag);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "frameset" => {
                self.pop();
                if !self.current_node_named("frameset") && self.open_elems.len() > 1 {
                    self.mode = InsertionMode::AfterFrameset;
                }
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::StartTag && tag.name == "frame" => {
                self.insert_element(tag);
                self.pop();
                ProcessResult::DoneAckSelfClosing
            }
            Token::Eof => ProcessResult::Done,
            _ => ProcessResult::Done,
        }
    }

    fn step_after_frameset(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Characters(_, t) if is_whitespace(t) => {
                self.insert_text(t);
                ProcessResult::Done
            }
            Token::Tag(tag) if tag.kind == TagKind::EndTag && tag.name == "html" => {
                self.mode = InsertionMode::AfterAfterFrameset;
                ProcessResult::Done
            }
            _ => ProcessResult::Done,
        }
    }

    fn step_after_after_body(&mut self, token: Token) -> ProcessResult<Sink::Handle> {
        match &token {
            Token::Comment(t) => {
                self.sink.append(&self.doc_handle.clone(), NodeOrText::AppendNode({
                    let c = self.sink.create_comment(t.clone());
                    c
                }));
                ProcessResult::Done
            }
            Token::Characters(_, t) if is_whitespace(t) => self.step_in_body(token),
            Token::Eof => ProcessResult::Done,
            token => ProcessResult::Reprocess(InsertionMode::InBody, token.clone()),
        }
    }
}

impl<Sink: TreeSink> TokenSink for TreeBuilder<Sink> {
    fn process_token(&mut self, token: TokToken, _line: u64) -> TokenSinkResult {
        use crate::html::tokenizer::Token as Tk;
        let token = match token {
            Tk::TagToken(tag) => Token::Tag(tag),
            Tk::CommentToken(t) => Token::Comment(t),
            Tk::DoctypeToken(d) => Token::Doctype(d),
            Tk::CharacterTokens(t) => {
                let status = if is_whitespace(&t) {
                    SplitStatus::Whitespace
                } else {
                    SplitStatus::NotWhitespace
                };
                Token::Characters(status, t)
            }
            Tk::NullCharacterToken => Token::NullCharacter,
            Tk::EofToken => Token::Eof,
            Tk::ParseError(_) => return TokenSinkResult::Continue,
        };

        let mut current = token;
        loop {
            match self.process(current) {
                ProcessResult::Done => return TokenSinkResult::Continue,
                ProcessResult::DoneAckSelfClosing => return TokenSinkResult::Continue,
                ProcessResult::Script(_) => return TokenSinkResult::Continue,
                ProcessResult::ToText(kind) => return TokenSinkResult::RawData(kind),
                ProcessResult::SplitWhitespace(_) => return TokenSinkResult::Continue,
                ProcessResult::Reprocess(mode, next) => {
                    self.mode = mode;
                    current = next;
                }
            }
        }
    }

    fn end(&mut self) {}

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        self.open_elems
            .top()
            .map(|h| self.sink.elem_name(h).ns != Namespace::Html)
            .unwrap_or(false)
    }
}
