// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parses real markup with the HTML pipeline, then matches Selectors
//! Level 4 selectors against the resulting tree, covering combinators,
//! attribute matchers and the selector-list/pretty-print round trip.

use wordmark5::dom::{Dom, Handle, NodeData};
use wordmark5::html::{parse_document, ParseOpts};
use wordmark5::selectors::matching::{matches_complex_selector, matches_selector_list};
use wordmark5::selectors::parser::parse_selector_list;
use wordmark5::selectors::MatchContext;

fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_str()),
        _ => None,
    }
}

fn find_all(node: &Handle, name: &str, out: &mut Vec<Handle>) {
    if element_name(node) == Some(name) {
        out.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        find_all(child, name, out);
    }
}

fn all(dom: &Handle, name: &str) -> Vec<Handle> {
    let mut out = Vec::new();
    find_all(dom, name, &mut out);
    out
}

const DOCUMENT: &str = r#"
<!doctype html>
<html>
<body>
  <div id="main" class="wrap outer">
    <ul class="list">
      <li class="item" data-kind="first">one</li>
      <li class="item" data-kind="second">two</li>
      <li class="item disabled">three</li>
    </ul>
    <p>trailer</p>
  </div>
</body>
</html>
"#;

#[test]
fn id_and_descendant_combinator_select_the_right_elements() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), DOCUMENT);
    let list = parse_selector_list("#main li.item").unwrap();
    let items = all(&dom.document, "li");
    assert_eq!(items.len(), 3);
    assert!(items
        .iter()
        .all(|li| matches_selector_list(&list, li, &MatchContext::default())));
}

#[test]
fn child_combinator_rejects_non_direct_descendants() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), DOCUMENT);
    let direct = parse_selector_list("div.wrap > p").unwrap();
    let indirect = parse_selector_list("div.wrap > li").unwrap();
    let p = all(&dom.document, "p").remove(0);
    let li = all(&dom.document, "li").remove(0);
    assert!(matches_selector_list(&direct, &p, &MatchContext::default()));
    assert!(!matches_selector_list(&indirect, &li, &MatchContext::default()));
}

#[test]
fn attribute_and_class_matchers_narrow_the_selection() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), DOCUMENT);
    let list = parse_selector_list("li[data-kind]").unwrap();
    let matches: Vec<_> = all(&dom.document, "li")
        .into_iter()
        .filter(|li| matches_selector_list(&list, li, &MatchContext::default()))
        .collect();
    assert_eq!(matches.len(), 2);

    let disabled = parse_selector_list("li.disabled").unwrap();
    let matches: Vec<_> = all(&dom.document, "li")
        .into_iter()
        .filter(|li| matches_selector_list(&disabled, li, &MatchContext::default()))
        .collect();
    assert_eq!(matches.len(), 1);
}

#[test]
fn sibling_combinator_matches_a_following_element() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), DOCUMENT);
    let list = parse_selector_list("ul.list ~ p").unwrap();
    let p = all(&dom.document, "p").remove(0);
    assert!(matches_selector_list(&list, &p, &MatchContext::default()));
}

#[test]
fn selector_list_pretty_print_then_reparse_matches_the_same_elements() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), DOCUMENT);
    let list = parse_selector_list("#main li.item[data-kind]").unwrap();
    let printed = list.to_string();
    let reparsed = parse_selector_list(&printed).expect("pretty-printed selector reparses");

    for li in all(&dom.document, "li") {
        let ctx = MatchContext::default();
        assert_eq!(
            matches_complex_selector(&list.selectors[0], &li, &ctx),
            matches_complex_selector(&reparsed.selectors[0], &li, &ctx)
        );
    }
}

#[test]
fn invalid_selector_syntax_is_rejected_at_parse_time() {
    assert!(parse_selector_list("div[class").is_none());
    assert!(parse_selector_list("> p").is_none());
}
