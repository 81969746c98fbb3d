// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The selector matcher (spec.md §4.6): right-to-left evaluation of a
//! `<complex-selector>` against a host tree, addressed only through
//! [`NodeTraits`] — an abstract element vtable modeled on
//! `selectors::Element` (see `examples/other_examples/*rsvg-src-css*`)
//! so this crate never depends on a concrete DOM.

use crate::html::interface::Namespace;

use super::ast::{
    AttrMatcher, AttrModifier, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    NsPrefix, PseudoClassSelector, SelectorList, SimpleSelector, TypeSelector, TypeSelectorLocal,
};
use super::{CaseSensitivity, MatchContext};

/// The seam a host tree implements so the matcher can walk it without
/// knowing its concrete node type. Mirrors the shape of
/// `selectors::Element` (parent/sibling axes, name/namespace/attribute
/// probes, a handful of host-computed pseudo-class predicates).
pub trait NodeTraits: Sized {
    fn parent_element(&self) -> Option<Self>;
    fn prev_sibling_element(&self) -> Option<Self>;
    fn next_sibling_element(&self) -> Option<Self>;

    fn local_name(&self) -> &str;
    fn namespace(&self) -> Namespace;

    /// Owned rather than borrowed: a host tree typically keeps
    /// attributes behind a lock/`RefCell` that can't outlive a single
    /// lookup (see `crate::dom`'s impl).
    fn id(&self) -> Option<String>;
    fn has_class(&self, name: &str, case: CaseSensitivity) -> bool;

    /// Looks up an attribute by exact namespace. `Namespace::None` means
    /// "no namespace", the meaning of an un-prefixed attribute selector.
    fn attribute(&self, namespace: Namespace, local_name: &str) -> Option<String>;
    /// Looks up an attribute by local name regardless of namespace, for
    /// the `*|name` wildcard-prefixed attribute selector.
    fn attribute_any_namespace(&self, local_name: &str) -> Option<String>;

    fn is_root(&self) -> bool;
    fn is_empty(&self) -> bool;
}

/// `true` if any selector in `list` matches `element`.
pub fn matches_selector_list<E: NodeTraits>(
    list: &SelectorList,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    list.selectors
        .iter()
        .any(|s| matches_complex_selector(s, element, ctx))
}

/// `true` if `selector` matches `element`, read right-to-left per
/// spec.md §4.6.
pub fn matches_complex_selector<E: NodeTraits>(
    selector: &ComplexSelector,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    if selector.compounds.is_empty() {
        return false;
    }
    match_from(selector, selector.compounds.len() - 1, element, ctx)
}

fn match_from<E: NodeTraits>(
    selector: &ComplexSelector,
    idx: usize,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    if !matches_compound(&selector.compounds[idx], element, ctx) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match selector.combinators[idx - 1] {
        Combinator::Descendant => {
            let mut cur = element.parent_element();
            while let Some(e) = cur {
                if match_from(selector, idx - 1, &e, ctx) {
                    return true;
                }
                cur = e.parent_element();
            }
            false
        }
        Combinator::Child => element
            .parent_element()
            .is_some_and(|p| match_from(selector, idx - 1, &p, ctx)),
        Combinator::NextSibling => element
            .prev_sibling_element()
            .is_some_and(|p| match_from(selector, idx - 1, &p, ctx)),
        Combinator::SubsequentSibling => {
            let mut cur = element.prev_sibling_element();
            while let Some(e) = cur {
                if match_from(selector, idx - 1, &e, ctx) {
                    return true;
                }
                cur = e.prev_sibling_element();
            }
            false
        }
        // The column combinator addresses table-grid cells, which this
        // crate's abstract NodeTraits has no notion of; never matches.
        Combinator::Column => false,
    }
}

fn matches_compound<E: NodeTraits>(
    compound: &CompoundSelector,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    if let Some(ts) = &compound.type_selector {
        if !matches_type_selector(ts, element, ctx) {
            return false;
        }
    }
    if !compound
        .subclasses
        .iter()
        .all(|s| matches_simple_selector(s, element, ctx))
    {
        return false;
    }
    // Pseudo-elements address generated boxes, not the element itself;
    // a compound naming one never matches a real element.
    compound.pseudo_elements.is_empty()
}

fn resolve_ns_prefix(prefix: &Option<NsPrefix>, ctx: &MatchContext) -> Result<Option<Namespace>, ()> {
    match prefix {
        None => Ok(None),
        Some(NsPrefix::Wildcard) => Ok(None),
        Some(NsPrefix::Empty) => Ok(Some(Namespace::None)),
        Some(NsPrefix::Named(name)) => {
            if !ctx.namespaces_enabled {
                return Err(());
            }
            ctx.namespaces.resolve(name).map(Some).ok_or(())
        }
    }
}

fn matches_type_selector<E: NodeTraits>(ts: &TypeSelector, element: &E, ctx: &MatchContext) -> bool {
    let required_ns = match resolve_ns_prefix(&ts.prefix, ctx) {
        Ok(ns) => ns,
        Err(()) => return false,
    };
    if let Some(ns) = required_ns {
        if element.namespace() != ns {
            return false;
        }
    } else if matches!(ts.prefix, None) {
        if let Some(default_ns) = ctx.namespaces.default_namespace {
            if element.namespace() != default_ns {
                return false;
            }
        }
    }
    match &ts.local {
        TypeSelectorLocal::Wildcard => true,
        TypeSelectorLocal::Named(name) => {
            ctx.case_sensitivity_for_names(element.namespace())
                .eq(element.local_name(), name)
        }
    }
}

fn matches_simple_selector<E: NodeTraits>(
    s: &SimpleSelector,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    match s {
        SimpleSelector::Id(id) => {
            let case = ctx.case_sensitivity_for_values();
            element.id().is_some_and(|eid| case.eq(&eid, id))
        }
        SimpleSelector::Class(name) => element.has_class(name, ctx.case_sensitivity_for_values()),
        SimpleSelector::Attribute(attr) => matches_attribute_selector(attr, element, ctx),
        SimpleSelector::PseudoClass(pc) => matches_pseudo_class(pc, element),
    }
}

fn matches_attribute_selector<E: NodeTraits>(
    attr: &AttributeSelector,
    element: &E,
    ctx: &MatchContext,
) -> bool {
    let value = match &attr.name.prefix {
        None => element.attribute(Namespace::None, &attr.name.local),
        Some(NsPrefix::Wildcard) => element.attribute_any_namespace(&attr.name.local),
        Some(NsPrefix::Empty) => element.attribute(Namespace::None, &attr.name.local),
        Some(NsPrefix::Named(name)) => {
            if !ctx.namespaces_enabled {
                return false;
            }
            match ctx.namespaces.resolve(name) {
                Some(ns) => element.attribute(ns, &attr.name.local),
                None => return false,
            }
        }
    };
    let Some(value) = value else {
        return false;
    };
    match &attr.matcher {
        None => true,
        Some((matcher, expected)) => {
            let case = match attr.modifier {
                Some(AttrModifier::CaseInsensitive) => CaseSensitivity::AsciiCaseInsensitive,
                Some(AttrModifier::CaseSensitive) => CaseSensitivity::CaseSensitive,
                None => CaseSensitivity::CaseSensitive,
            };
            match_attr_value(*matcher, &value, expected, case)
        }
    }
}

fn match_attr_value(matcher: AttrMatcher, value: &str, expected: &str, case: CaseSensitivity) -> bool {
    if expected.is_empty() && !matches!(matcher, AttrMatcher::Equals) {
        return false;
    }
    match matcher {
        AttrMatcher::Equals => case.eq(value, expected),
        AttrMatcher::Includes => value
            .split_ascii_whitespace()
            .any(|tok| case.eq(tok, expected)),
        AttrMatcher::DashMatch => {
            case.eq(value, expected)
                || (starts_with(value, expected, case)
                    && value.as_bytes().get(expected.chars().count()) == Some(&b'-'))
        }
        AttrMatcher::PrefixMatch => starts_with(value, expected, case),
        AttrMatcher::SuffixMatch => ends_with(value, expected, case),
        AttrMatcher::SubstringMatch => contains(value, expected, case),
    }
}

fn starts_with(value: &str, needle: &str, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::CaseSensitive => value.starts_with(needle),
        CaseSensitivity::AsciiCaseInsensitive => value
            .to_ascii_lowercase()
            .starts_with(&needle.to_ascii_lowercase()),
    }
}

fn ends_with(value: &str, needle: &str, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::CaseSensitive => value.ends_with(needle),
        CaseSensitivity::AsciiCaseInsensitive => value
            .to_ascii_lowercase()
            .ends_with(&needle.to_ascii_lowercase()),
    }
}

fn contains(value: &str, needle: &str, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::CaseSensitive => value.contains(needle),
        CaseSensitivity::AsciiCaseInsensitive => value
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase()),
    }
}

/// Only `:root` and `:empty` are real predicates; every other
/// pseudo-class (including all functional ones such as `:is()`) is
/// accepted by the parser but never matches, per spec.md §4.6's
/// pseudo-class stub.
fn matches_pseudo_class<E: NodeTraits>(pc: &PseudoClassSelector, element: &E) -> bool {
    match pc.name.as_str() {
        "root" if pc.arguments.is_none() => element.is_root(),
        "empty" if pc.arguments.is_none() => element.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::parser::parse_selector_list;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct NodeData {
        local_name: String,
        id: Option<String>,
        classes: Vec<String>,
        attrs: HashMap<String, String>,
        parent: RefCell<Option<Rc<NodeData>>>,
        children: RefCell<Vec<Rc<NodeData>>>,
    }

    #[derive(Clone)]
    struct Node(Rc<NodeData>);

    impl Node {
        fn new(local_name: &str) -> Self {
            Node(Rc::new(NodeData {
                local_name: local_name.into(),
                ..Default::default()
            }))
        }

        fn append(&self, child: &Node) {
            *child.0.parent.borrow_mut() = Some(self.0.clone());
            self.0.children.borrow_mut().push(child.0.clone());
        }

        fn with_id(self, id: &str) -> Self {
            let mut data = Rc::try_unwrap(self.0).ok().expect("node not yet shared");
            data.id = Some(id.into());
            Node(Rc::new(data))
        }

        fn with_class(self, class: &str) -> Self {
            let mut data = Rc::try_unwrap(self.0).ok().expect("node not yet shared");
            data.classes.push(class.into());
            Node(Rc::new(data))
        }

        fn with_attr(self, name: &str, value: &str) -> Self {
            let mut data = Rc::try_unwrap(self.0).ok().expect("node not yet shared");
            data.attrs.insert(name.into(), value.into());
            Node(Rc::new(data))
        }

        fn index_in_parent(&self) -> Option<usize> {
            let parent = self.0.parent.borrow().clone()?;
            parent
                .children
                .borrow()
                .iter()
                .position(|c| Rc::ptr_eq(c, &self.0))
        }
    }

    impl NodeTraits for Node {
        fn parent_element(&self) -> Option<Self> {
            self.0.parent.borrow().clone().map(Node)
        }

        fn prev_sibling_element(&self) -> Option<Self> {
            let parent = self.0.parent.borrow().clone()?;
            let idx = self.index_in_parent()?;
            if idx == 0 {
                None
            } else {
                Some(Node(parent.children.borrow()[idx - 1].clone()))
            }
        }

        fn next_sibling_element(&self) -> Option<Self> {
            let parent = self.0.parent.borrow().clone()?;
            let idx = self.index_in_parent()?;
            parent.children.borrow().get(idx + 1).cloned().map(Node)
        }

        fn local_name(&self) -> &str {
            &self.0.local_name
        }

        fn namespace(&self) -> Namespace {
            Namespace::Html
        }

        fn id(&self) -> Option<String> {
            self.0.id.clone()
        }

        fn has_class(&self, name: &str, case: CaseSensitivity) -> bool {
            self.0.classes.iter().any(|c| case.eq(c, name))
        }

        fn attribute(&self, namespace: Namespace, local_name: &str) -> Option<String> {
            if namespace != Namespace::None {
                return None;
            }
            self.0.attrs.get(local_name).cloned()
        }

        fn attribute_any_namespace(&self, local_name: &str) -> Option<String> {
            self.attribute(Namespace::None, local_name)
        }

        fn is_root(&self) -> bool {
            self.0.parent.borrow().is_none()
        }

        fn is_empty(&self) -> bool {
            self.0.children.borrow().is_empty()
        }
    }

    fn ctx() -> MatchContext {
        MatchContext::default()
    }

    #[test]
    fn descendant_combinator_matches_any_ancestor() {
        let root = Node::new("html");
        let body = Node::new("body");
        let div = Node::new("div").with_class("wrap");
        let span = Node::new("span");
        root.append(&body);
        body.append(&div);
        div.append(&span);

        let list = parse_selector_list("html span").unwrap();
        assert!(matches_selector_list(&list, &span, &ctx()));
        let list = parse_selector_list("div.wrap span").unwrap();
        assert!(matches_selector_list(&list, &span, &ctx()));
        let list = parse_selector_list(".nope span").unwrap();
        assert!(!matches_selector_list(&list, &span, &ctx()));
    }

    #[test]
    fn child_combinator_requires_direct_parent() {
        let ul = Node::new("ul");
        let li = Node::new("li");
        let a = Node::new("a");
        ul.append(&li);
        li.append(&a);

        assert!(matches_complex_selector(
            &parse_selector_list("ul > li").unwrap().selectors[0],
            &li,
            &ctx()
        ));
        assert!(!matches_complex_selector(
            &parse_selector_list("ul > a").unwrap().selectors[0],
            &a,
            &ctx()
        ));
    }

    #[test]
    fn sibling_combinators() {
        let parent = Node::new("div");
        let a = Node::new("p").with_id("a");
        let b = Node::new("p").with_id("b");
        let c = Node::new("p").with_id("c");
        parent.append(&a);
        parent.append(&b);
        parent.append(&c);

        assert!(matches_complex_selector(
            &parse_selector_list("#a + #b").unwrap().selectors[0],
            &b,
            &ctx()
        ));
        assert!(matches_complex_selector(
            &parse_selector_list("#a ~ #c").unwrap().selectors[0],
            &c,
            &ctx()
        ));
        assert!(!matches_complex_selector(
            &parse_selector_list("#a + #c").unwrap().selectors[0],
            &c,
            &ctx()
        ));
    }

    #[test]
    fn attribute_matchers() {
        let a = Node::new("a").with_attr("href", "https://example.com/path");
        assert!(matches_complex_selector(
            &parse_selector_list("a[href^=\"https\"]").unwrap().selectors[0],
            &a,
            &ctx()
        ));
        assert!(matches_complex_selector(
            &parse_selector_list("a[href$=\"path\"]").unwrap().selectors[0],
            &a,
            &ctx()
        ));
        assert!(matches_complex_selector(
            &parse_selector_list("a[href*=\"example\"]").unwrap().selectors[0],
            &a,
            &ctx()
        ));
        assert!(!matches_complex_selector(
            &parse_selector_list("a[href^=\"HTTPS\"]").unwrap().selectors[0],
            &a,
            &ctx()
        ));
        assert!(matches_complex_selector(
            &parse_selector_list("a[href^=\"HTTPS\" i]").unwrap().selectors[0],
            &a,
            &ctx()
        ));
    }

    #[test]
    fn root_and_unresolved_prefix() {
        let root = Node::new("html");
        assert!(matches_complex_selector(
            &parse_selector_list(":root").unwrap().selectors[0],
            &root,
            &ctx()
        ));
        assert!(!matches_complex_selector(
            &parse_selector_list("ns|div").unwrap().selectors[0],
            &root,
            &ctx()
        ));
    }
}
