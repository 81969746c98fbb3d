// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A reference `Rc`/`RefCell` arena implementing
//! [`crate::html::interface::TreeSink`], in the shape of html5ever's
//! companion `rcdom` crate. Not a spec deliverable in its own right —
//! it exists so this crate's own integration tests (and
//! [`crate::selectors`]) have a concrete tree to drive, without forcing
//! every embedder to use this representation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tendril::StrTendril;

use crate::html::interface::{
    Attribute, ElementFlags, Namespace, NodeOrText, QualName, QuirksMode, TreeSink,
};
use crate::selectors::matching::NodeTraits;
use crate::selectors::CaseSensitivity;

#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },
    Text {
        contents: RefCell<StrTendril>,
    },
    Comment {
        contents: StrTendril,
    },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        mathml_annotation_xml: bool,
    },
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: RefCell<Option<Weak<Node>>>,
    pub children: RefCell<Vec<Handle>>,
}

pub type Handle = Rc<Node>;

impl Node {
    fn new(data: NodeData) -> Handle {
        Rc::new(Node {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }
}

fn append_handle(parent: &Handle, child: Handle) {
    child.parent.replace(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn detach(target: &Handle) {
    let Some(parent) = target.parent.borrow_mut().take().and_then(|p| p.upgrade()) else {
        return;
    };
    parent
        .children
        .borrow_mut()
        .retain(|c| !Rc::ptr_eq(c, target));
}

/// An in-memory document tree built by tree construction, per
/// spec.md §6's "seam a host tree implements" — here, the reference
/// implementation of that seam.
pub struct Dom {
    pub document: Handle,
    pub errors: Vec<String>,
    pub quirks_mode: QuirksMode,
}

impl Default for Dom {
    fn default() -> Self {
        Dom {
            document: Node::new(NodeData::Document),
            errors: Vec::new(),
            quirks_mode: QuirksMode::NoQuirks,
        }
    }
}

impl Dom {
    pub fn new() -> Self {
        Dom::default()
    }
}

impl TreeSink for Dom {
    type Handle = Handle;

    fn get_document(&mut self) -> Handle {
        self.document.clone()
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Handle {
        Node::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            mathml_annotation_xml: flags.mathml_annotation_xml,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> Handle {
        Node::new(NodeData::Comment { contents: text })
    }

    fn append(&mut self, parent: &Handle, child: NodeOrText<Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_handle(parent, node),
            NodeOrText::AppendText(text) => {
                let children = parent.children.borrow();
                if let Some(NodeData::Text { contents }) = children.last().map(|c| &c.data) {
                    contents.borrow_mut().push_tendril(&text);
                    return;
                }
                drop(children);
                append_handle(parent, Node::new(NodeData::Text { contents: RefCell::new(text) }));
            }
        }
    }

    fn append_before_sibling(&mut self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let Some(parent) = sibling.parent.borrow().as_ref().and_then(|p| p.upgrade()) else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Node::new(NodeData::Text {
                contents: RefCell::new(text),
            }),
        };
        node.parent.replace(Some(Rc::downgrade(&parent)));
        let mut children = parent.children.borrow_mut();
        let idx = children
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(children.len());
        children.insert(idx, node);
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        });
        append_handle(&self.document.clone(), doctype);
    }

    fn parent_node(&self, node: &Handle) -> Option<Handle> {
        node.parent.borrow().as_ref().and_then(|p| p.upgrade())
    }

    fn add_attrs_if_missing(&mut self, target: &Handle, attrs: Vec<Attribute>) {
        let NodeData::Element { attrs: existing, .. } = &target.data else {
            return;
        };
        let mut existing = existing.borrow_mut();
        for attr in attrs {
            if !existing.iter().any(|a| a.name == attr.name) {
                existing.push(attr);
            }
        }
    }

    fn remove_from_parent(&mut self, target: &Handle) {
        detach(target);
    }

    fn reparent_children(&mut self, node: &Handle, new_parent: &Handle) {
        let children: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
        for child in children {
            append_handle(new_parent, child);
        }
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn elem_name(&self, target: &Handle) -> QualName {
        match &target.data {
            NodeData::Element { name, .. } => name.clone(),
            _ => QualName::html(""),
        }
    }

    fn is_html_integration_point(&self, handle: &Handle) -> bool {
        match &handle.data {
            NodeData::Element { name, mathml_annotation_xml, .. } => {
                (name.ns == Namespace::Svg
                    && matches!(name.local.as_str(), "foreignObject" | "desc" | "title"))
                    || (name.ns == Namespace::MathMl
                        && name.local == "annotation-xml"
                        && *mathml_annotation_xml)
            }
            _ => false,
        }
    }

    fn is_mathml_text_integration_point(&self, handle: &Handle) -> bool {
        match &handle.data {
            NodeData::Element { name, .. } => {
                name.ns == Namespace::MathMl
                    && matches!(name.local.as_str(), "mi" | "mo" | "mn" | "ms" | "mtext")
            }
            _ => false,
        }
    }
}

fn element_name(node: &Handle) -> Option<&QualName> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name),
        _ => None,
    }
}

fn nth_element_sibling(node: &Handle, step: isize) -> Option<Handle> {
    let parent = node.parent.borrow().as_ref().and_then(|p| p.upgrade())?;
    let siblings = parent.children.borrow();
    let idx = siblings.iter().position(|c| Rc::ptr_eq(c, node))? as isize;
    let mut i = idx + step;
    while i >= 0 && (i as usize) < siblings.len() {
        let candidate = &siblings[i as usize];
        if element_name(candidate).is_some() {
            return Some(candidate.clone());
        }
        i += step;
    }
    None
}

/// Drives [`crate::selectors::matching`] directly over the tree this
/// `TreeSink` builds, so parsing and selector matching compose without
/// an intermediate conversion step.
impl NodeTraits for Handle {
    fn parent_element(&self) -> Option<Self> {
        let mut cur = self.parent.borrow().as_ref().and_then(|p| p.upgrade());
        while let Some(node) = cur {
            if element_name(&node).is_some() {
                return Some(node);
            }
            cur = node.parent.borrow().as_ref().and_then(|p| p.upgrade());
        }
        None
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        nth_element_sibling(self, -1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        nth_element_sibling(self, 1)
    }

    fn local_name(&self) -> &str {
        element_name(self).map(|n| n.local.as_str()).unwrap_or("")
    }

    fn namespace(&self) -> Namespace {
        element_name(self).map(|n| n.ns).unwrap_or(Namespace::None)
    }

    fn id(&self) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| a.name.local == "id" && a.name.ns == Namespace::None.into())
            .map(|a| a.value.clone())
    }

    fn has_class(&self, name: &str, case: CaseSensitivity) -> bool {
        let NodeData::Element { attrs, .. } = &self.data else {
            return false;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| a.name.local == "class" && a.name.ns == Namespace::None.into())
            .is_some_and(|a| a.value.split_ascii_whitespace().any(|c| case.eq(c, name)))
    }

    fn attribute(&self, namespace: Namespace, local_name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| a.name.local == local_name && a.name.ns == namespace.into())
            .map(|a| a.value.clone())
    }

    fn attribute_any_namespace(&self, local_name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| a.name.local == local_name)
            .map(|a| a.value.clone())
    }

    fn is_root(&self) -> bool {
        self.parent_element().is_none()
    }

    fn is_empty(&self) -> bool {
        self.children.borrow().iter().all(|c| match &c.data {
            NodeData::Element { .. } => false,
            NodeData::Text { contents } => contents.borrow().trim().is_empty(),
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{parse_document, ParseOpts};
    use crate::selectors::matching::{matches_selector_list, NodeTraits};
    use crate::selectors::parser::parse_selector_list;
    use crate::selectors::MatchContext;

    fn find_by_local_name(node: &Handle, name: &str) -> Option<Handle> {
        if element_name(node).is_some_and(|n| n.local == name) {
            return Some(node.clone());
        }
        for child in node.children.borrow().iter() {
            if let Some(found) = find_by_local_name(child, name) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn parses_into_a_walkable_tree() {
        let dom = parse_document(
            Dom::new(),
            ParseOpts::default(),
            "<!doctype html><html><body><p id=\"a\" class=\"x y\">hi</p></body></html>",
        );
        let p = find_by_local_name(&dom.document, "p").expect("p element present");
        assert_eq!(p.id().as_deref(), Some("a"));
        assert!(p.has_class("x", CaseSensitivity::CaseSensitive));
        assert!(p.has_class("y", CaseSensitivity::CaseSensitive));
    }

    #[test]
    fn selectors_match_against_the_parsed_tree() {
        let dom = parse_document(
            Dom::new(),
            ParseOpts::default(),
            "<!doctype html><html><body><div class=\"wrap\"><span>x</span></div></body></html>",
        );
        let span = find_by_local_name(&dom.document, "span").expect("span present");
        let list = parse_selector_list("div.wrap span").unwrap();
        assert!(matches_selector_list(&list, &span, &MatchContext::default()));
    }
}
