// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The list of active formatting elements (spec §4.4.1): markers, the
//! Noah's Ark clause (at most three equivalent entries), and
//! reconstruction.

use crate::html::interface::TreeSink;
use crate::html::tokenizer::Tag;

use super::types::FormatEntry;

const NOAHS_ARK_LIMIT: usize = 3;

pub(crate) struct ActiveFormattingElements<Handle> {
    entries: Vec<FormatEntry<Handle>>,
}

impl<Handle: Clone> ActiveFormattingElements<Handle> {
    pub(crate) fn new() -> Self {
        ActiveFormattingElements {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push_marker(&mut self) {
        self.entries.push(FormatEntry::Marker);
    }

    pub(crate) fn clear_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FormatEntry::Marker) {
                break;
            }
        }
    }

    /// Push `(elem, tag)`, first applying the Noah's Ark clause: if three
    /// or more equivalent entries already sit between here and the last
    /// marker, the earliest of them is dropped.
    pub(crate) fn push_element(&mut self, elem: Handle, tag: Tag) {
        let mut matches = Vec::new();
        for (i, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => break,
                FormatEntry::Element(_, t) if t.equiv_modulo_attr_order(&tag) => matches.push(i),
                FormatEntry::Element(_, _) => {}
            }
        }
        if matches.len() >= NOAHS_ARK_LIMIT {
            let earliest = *matches.last().unwrap();
            self.entries.remove(earliest);
        }
        self.entries.push(FormatEntry::Element(elem, tag));
    }

    pub(crate) fn remove_element<Sink: TreeSink<Handle = Handle>>(
        &mut self,
        sink: &Sink,
        elem: &Handle,
    ) {
        if let Some(i) = self.position(sink, elem) {
            self.entries.remove(i);
        }
    }

    pub(crate) fn position<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        elem: &Handle,
    ) -> Option<usize> {
        self.entries.iter().position(|e| match e {
            FormatEntry::Element(h, _) => sink.same_node(h, elem),
            FormatEntry::Marker => false,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, i: usize) -> &FormatEntry<Handle> {
        &self.entries[i]
    }

    pub(crate) fn replace(&mut self, i: usize, elem: Handle, tag: Tag) {
        self.entries[i] = FormatEntry::Element(elem, tag);
    }

    pub(crate) fn insert_at(&mut self, i: usize, elem: Handle, tag: Tag) {
        self.entries.insert(i, FormatEntry::Element(elem, tag));
    }

    pub(crate) fn remove_at(&mut self, i: usize) {
        self.entries.remove(i);
    }

    /// Topmost formatting entry matching `local`, searching back to the
    /// last marker (inclusive boundary, exclusive of markers themselves).
    pub(crate) fn last_matching<Sink: TreeSink<Handle = Handle>>(
        &self,
        sink: &Sink,
        local: &str,
    ) -> Option<(usize, Handle, Tag)> {
        for (i, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => return None,
                FormatEntry::Element(h, t) => {
                    let _ = sink;
                    if t.name.as_str() == local {
                        return Some((i, h.clone(), t.clone()));
                    }
                }
            }
        }
        None
    }
}
