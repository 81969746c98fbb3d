// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The associative-map facade over the node heap: multi-byte key
//! decomposition, the value store, and serialization.

use super::discipline::{Compact, DisciplineState, Stable};
use super::heap::{Heap, Node, NULL_LABEL};
use super::iter::{HeapIter, TreeIter};

/// Which mutation discipline to build a [`TrieMap`] with. See spec §3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Index-preserving: relocation never hands a node's old index to an
    /// unrelated insert until the key is explicitly erased.
    Stable,
    /// Density-preferring: relocation debris is reclaimed immediately.
    Compact,
}

/// A compact, mutation-safe, index-addressable map from byte-label keys
/// to `u32`-sized values.
///
/// `width` is the byte size of one logical key element (the C++ source's
/// `coefficient`): 1 for plain byte strings, 2 for UTF-16 keys, 4 for
/// UTF-32 keys. It only affects [`TrieMap::lookup`]'s atomic-rewind
/// behavior; `insert`/`erase`/`find` operate on already MSB-first-encoded
/// byte keys regardless of width.
#[derive(Debug, Clone)]
pub struct TrieMap<V> {
    heap: Heap,
    values: Vec<Option<V>>,
    discipline: DisciplineState,
    width: usize,
}

impl<V> TrieMap<V> {
    pub fn new(discipline: Discipline) -> Self {
        let heap = Heap::new();
        let values = vec![None; heap.len()];
        TrieMap {
            heap,
            values,
            discipline: match discipline {
                Discipline::Stable => DisciplineState::Stable(Stable::default()),
                Discipline::Compact => DisciplineState::Compact(Compact::default()),
            },
            width: 1,
        }
    }

    /// As [`TrieMap::new`], but keys passed to `lookup` are atomic groups
    /// of `width` bytes (2 for UTF-16, 4 for UTF-32).
    pub fn with_width(discipline: Discipline, width: usize) -> Self {
        assert!(width == 1 || width == 2 || width == 4, "unsupported width");
        let mut t = Self::new(discipline);
        t.width = width;
        t
    }

    pub fn len_nodes(&self) -> usize {
        self.heap.len()
    }

    fn grow_values(&mut self) {
        if self.values.len() < self.heap.len() {
            self.values.resize(self.heap.len(), None);
        }
    }

    fn children_labels(&self, parent: i32) -> Vec<u16> {
        let base = self.heap.base(parent);
        if base < 1 {
            return Vec::new();
        }
        (0u16..=255)
            .filter(|&l| {
                let idx = base + l as i32;
                (idx as usize) < self.heap.len() && self.heap.check(idx) == parent
            })
            .collect()
    }

    /// Find (creating if necessary) the child of `parent` on `label`.
    fn ensure_child(&mut self, parent: i32, label: u16) -> i32 {
        let base = self.heap.base(parent);
        if base < 1 {
            // Parent has no children yet: pick a fresh base for it.
            let new_base = self.heap.allocate(&[label]);
            self.heap.set_base(parent, new_base);
            let child = new_base + label as i32;
            self.heap.claim(child, parent);
            self.grow_values();
            return child;
        }

        let candidate = base + label as i32;
        if (candidate as usize) < self.heap.len() && self.heap.check(candidate) == parent {
            return candidate;
        }
        let candidate_free =
            (candidate as usize) >= self.heap.len() || !self.heap.node(candidate).in_use();
        if candidate >= 1 && candidate_free {
            self.heap.claim(candidate, parent);
            self.grow_values();
            return candidate;
        }

        // Collision: the slot this label wants is occupied by some other
        // parent's child. Relocate our whole child block (existing labels
        // plus the new one) to a base where all of them fit, then retry.
        let mut labels = self.children_labels(parent);
        labels.push(label);
        let new_base = self.heap.allocate(&labels);
        self.discipline.relocate(&mut self.heap, parent, new_base);
        self.grow_values();
        let child = new_base + label as i32;
        self.heap.claim(child, parent);
        self.grow_values();
        child
    }

    /// Descend as far as possible from the root along `key`. Returns the
    /// deepest matched node and how many bytes of `key` were consumed.
    fn descend(&self, key: &[u8]) -> (i32, usize) {
        let mut node = 1i32;
        for (i, &b) in key.iter().enumerate() {
            match self.heap.transition(node, b as u16) {
                Some(next) => node = next,
                None => return (node, i),
            }
        }
        (node, key.len())
    }

    /// Insert `key` (MSB-first bytes) with `value`, returning the
    /// previous value if the key already existed.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let mut node = 1i32;
        for &b in key {
            node = self.ensure_child(node, b as u16);
        }
        let term = self.ensure_child(node, NULL_LABEL);
        self.grow_values();
        self.values[term as usize].replace(value)
    }

    /// Remove `key`, returning its value if present. Frees the
    /// terminator and then walks back freeing ancestors left with no
    /// remaining children and no value of their own.
    pub fn erase(&mut self, key: &[u8]) -> Option<V> {
        let (node, consumed) = self.descend(key);
        if consumed != key.len() {
            return None;
        }
        let term = self.heap.transition(node, NULL_LABEL)?;
        let removed = self.values[term as usize].take();
        self.heap.free(term);

        let mut cur = node;
        loop {
            let has_value = self
                .heap
                .transition(cur, NULL_LABEL)
                .map(|v| self.values[v as usize].is_some())
                .unwrap_or(false);
            let has_children = self.children_labels(cur).iter().any(|&l| l != NULL_LABEL)
                || has_value;
            if has_children || cur == 1 {
                break;
            }
            let parent = self.heap.check(cur);
            self.heap.free(cur);
            cur = parent;
        }
        self.discipline.on_erase(&mut self.heap);
        removed
    }

    /// Longest-prefix match: descend as far as possible, returning the
    /// deepest matched node and the number of bytes consumed. If `width`
    /// is greater than 1 and the final partial group didn't complete,
    /// rewind the consumed count to the start of that group (spec
    /// invariant: logical elements are matched atomically).
    pub fn lookup(&self, key: &[u8]) -> (HeapIter, usize) {
        let (node, mut consumed) = self.descend(key);
        if self.width > 1 {
            let rem = consumed % self.width;
            if rem != 0 {
                consumed -= rem;
            }
        }
        (HeapIter::at(node), consumed)
    }

    /// An iterator to the node reached after consuming all of `key`, iff
    /// that is an exact, terminated key (lookup consumed everything and
    /// landed on a null-edge).
    pub fn find(&self, key: &[u8]) -> Option<HeapIter> {
        let (node, consumed) = self.descend(key);
        if consumed != key.len() {
            return None;
        }
        self.heap.transition(node, NULL_LABEL)?;
        Some(HeapIter::at(node))
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let node = self.find(key)?;
        let term = self.heap.transition(node.index(), NULL_LABEL)?;
        self.values[term as usize].as_ref()
    }

    /// Value stored at the null-edge child of `node`, if `node` denotes a
    /// complete key (e.g. the node returned from [`TrieMap::lookup`]).
    pub fn value_at(&self, node: HeapIter) -> Option<&V> {
        let term = self.heap.transition(node.index(), NULL_LABEL)?;
        self.values[term as usize].as_ref()
    }

    pub fn begin(&self) -> HeapIter {
        HeapIter::root()
    }

    pub fn end(&self) -> HeapIter {
        HeapIter::end()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Lazy pre-order walk over every node in the heap, in lexicographic
    /// byte order.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(&self.heap)
    }

    /// Rebuild a `TrieMap` from a raw node array (e.g. after
    /// deserialization) plus the values recovered alongside it.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        values: Vec<Option<V>>,
        discipline: Discipline,
        width: usize,
    ) -> Self {
        let heap = Heap::from_nodes(nodes);
        TrieMap {
            heap,
            values,
            discipline: match discipline {
                Discipline::Stable => DisciplineState::Stable(Stable::default()),
                Discipline::Compact => DisciplineState::Compact(Compact::default()),
            },
            width,
        }
    }
}

impl<V> FromIterator<(Vec<u8>, V)> for TrieMap<V> {
    fn from_iter<T: IntoIterator<Item = (Vec<u8>, V)>>(iter: T) -> Self {
        let mut t = TrieMap::new(Discipline::Compact);
        for (k, v) in iter {
            t.insert(&k, v);
        }
        t
    }
}

impl<V> Extend<(Vec<u8>, V)> for TrieMap<V> {
    fn extend<T: IntoIterator<Item = (Vec<u8>, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(&k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrieMap<u32> {
        let mut t = TrieMap::new(Discipline::Compact);
        for (i, k) in ["a", "ac", "b", "cab", "cd"].iter().enumerate() {
            t.insert(k.as_bytes(), i as u32);
        }
        t
    }

    #[test]
    fn insert_find_contains() {
        let t = sample();
        assert!(t.contains(b"cab"));
        assert!(!t.contains(b"ca"));
        assert!(!t.contains(b""));
        assert_eq!(*t.get(b"a").unwrap(), 0);
        assert_eq!(*t.get(b"ac").unwrap(), 1);
    }

    #[test]
    fn erase_keeps_unrelated_keys() {
        let mut t = sample();
        t.erase(b"ac");
        assert!(t.contains(b"a"));
        assert!(!t.contains(b"ac"));
        assert!(t.contains(b"cab"));
    }

    #[test]
    fn lookup_longest_prefix() {
        let t = sample();
        let (node, consumed) = t.lookup(b"cb");
        assert_eq!(consumed, 1);
        assert_eq!(node.label(t.heap()), Some(b'c' as u16));
    }

    #[test]
    fn stable_discipline_preserves_index_across_unrelated_insert() {
        let mut t: TrieMap<u32> = TrieMap::new(Discipline::Stable);
        t.insert(b"x", 1);
        let before = t.find(b"x").unwrap();
        t.insert(b"y", 2);
        t.insert(b"z", 3);
        let after = t.find(b"x").unwrap();
        assert_eq!(before, after);
    }
}
