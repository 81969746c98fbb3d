// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack of open elements (spec §4.4.1) and its five named scope
//! kinds.

use crate::html::interface::{ExpandedName, Namespace, TreeSink};

pub(crate) struct OpenElements<Handle> {
    elems: Vec<Handle>,
}

/// Which boundary set halts an "in scope" walk (spec's five named
/// scopes: default, list-item, button, table, select).
#[derive(Clone, Copy)]
pub(crate) enum ScopeKind {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

/// MathML/SVG text-integration-point element names: part of the
/// default scope boundary (spec §4.4.1, "has an element in scope").
static FOREIGN_SCOPE_BOUNDARY: phf::Set<&'static str> = phf::phf_set! {
    "mi", "mo", "mn", "ms", "mtext", "annotation-xml", "foreignObject", "desc", "title",
};

/// The HTML-namespace default scope boundary (spec §4.4.1).
static DEFAULT_SCOPE_BOUNDARY: phf::Set<&'static str> = phf::phf_set! {
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
};

fn in_default_scope_boundary(name: ExpandedName<'_>) -> bool {
    if name.ns != Namespace::Html {
        return matches!(name.ns, Namespace::MathMl | Namespace::Svg)
            && FOREIGN_SCOPE_BOUNDARY.contains(name.local);
    }
    DEFAULT_SCOPE_BOUNDARY.contains(name.local)
}

fn scope_boundary(kind: ScopeKind, name: ExpandedName<'_>) -> bool {
    if in_default_scope_boundary(name) {
        return true;
    }
    if name.ns != Namespace::Html {
        return false;
    }
    match kind {
        ScopeKind::Default => false,
        ScopeKind::ListItem => matches!(name.local, "ol" | "ul"),
        ScopeKind::Button => name.local == "button",
        ScopeKind::Table => matches!(name.local, "html" | "table" | "template"),
        ScopeKind::Select => !matches!(name.local, "optgroup" | "option"),
    }
}

impl<Handle: Clone> OpenElements<Handle> {
    pub(crate) fn new() -> Self {
        OpenElements { elems: Vec::new() }
    }

    pub(crate) fn push(&mut self, elem: Handle) {
        self.elems.push(elem);
    }

    pub(crate) fn pop(&mut self) -> Option<Handle> {
        self.elems.pop()
    }

    pub(crate) fn top(&self) -> Option<&Handle> {
        self.elems.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.elems.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &Handle> {
        self.elems.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Handle] {
        &self.elems
    }

    pub(crate) fn truncate_to(&mut self, len: usize) {
        self.elems.truncate(len);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Handle {
        self.elems.remove(index)
    }

    pub(crate) fn insert_at(&mut self, index: usize, elem: Handle) {
        self.elems.insert(index, elem);
    }

    pub(crate) fn replace_at(&mut self, index: usize, elem: Handle) {
        self.elems[index] = elem;
    }

    pub(crate) fn position<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        needle: &Handle,
    ) -> Option<usize> {
        self.elems
            .iter()
            .position(|h| sink.same_node(h, needle))
    }

    /// Is a html-namespaced element named `local` present anywhere on the
    /// stack, scanning from the top, without regard to scope?
    pub(crate) fn contains_html_named<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        local: &str,
    ) -> bool {
        self.elems.iter().any(|h| {
            let name = sink.elem_name(h);
            name.ns == Namespace::Html && name.local == local
        })
    }

    /// Index (from the top) of the topmost html-namespaced element named
    /// `local` that is in `kind`-scope, or `None` if the boundary is hit
    /// first.
    pub(crate) fn topmost_in_scope<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        kind: ScopeKind,
        local: &str,
    ) -> Option<usize> {
        for (i, h) in self.elems.iter().enumerate().rev() {
            let name = sink.elem_name(h);
            if name.ns == Namespace::Html && name.local == local {
                return Some(i);
            }
            if scope_boundary(kind, name.expanded()) {
                return None;
            }
        }
        None
    }

    pub(crate) fn has_in_scope<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        kind: ScopeKind,
        local: &str,
    ) -> bool {
        self.topmost_in_scope(sink, kind, local).is_some()
    }

    /// Is the element at `index` in default scope, walking up from the
    /// top of the stack? Used by the adoption agency algorithm to check
    /// a specific stack slot rather than searching by name.
    pub(crate) fn has_element_in_scope_at<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        index: usize,
    ) -> bool {
        for i in (index..self.elems.len()).rev() {
            if i == index {
                return true;
            }
            let name = sink.elem_name(&self.elems[i]);
            if scope_boundary(ScopeKind::Default, name.expanded()) {
                return false;
            }
        }
        false
    }

    pub(crate) fn has_numbered_header_in_scope<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
    ) -> bool {
        for h in self.elems.iter().rev() {
            let name = sink.elem_name(h);
            if name.ns == Namespace::Html
                && matches!(name.local.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
            {
                return true;
            }
            if scope_boundary(ScopeKind::Default, name.expanded()) {
                return false;
            }
        }
        false
    }
}
