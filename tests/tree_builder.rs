// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Exercises the full parse pipeline (tokenizer + tree construction)
//! through the public `parse_document` entry point and the reference
//! `dom::Dom` sink, including the misnesting recovery cases the tree
//! builder exists for.

use std::rc::Rc;

use wordmark5::dom::{Dom, Handle, NodeData};
use wordmark5::html::serialize::{serialize_document, SerializeOpts};
use wordmark5::html::{parse_document, ParseOpts};

fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_str()),
        _ => None,
    }
}

fn find(node: &Handle, name: &str) -> Option<Handle> {
    if element_name(node) == Some(name) {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find(child, name) {
            return Some(found);
        }
    }
    None
}

fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        out.push_str(&text_content(child));
    }
    out
}

#[test]
fn a_bare_body_fragment_gets_an_implied_html_head_and_body() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), "<p>hi</p>");
    let html = find(&dom.document, "html").expect("implied <html>");
    assert!(find(&html, "head").is_some());
    assert!(find(&html, "body").is_some());
    assert!(find(&html, "p").is_some());
}

#[test]
fn misnested_formatting_elements_are_reopened_by_the_adoption_agency() {
    // The canonical adoption-agency case: <p> is a "special" element,
    // so the </b> end tag while a <p> opened inside <b> is still open
    // triggers the furthest-block path, splitting "1" and "2" across
    // two <b> clones and leaving "3" as <p>'s own child rather than
    // nested inside the reopened <b>.
    let dom = parse_document(Dom::new(), ParseOpts::default(), "<b>1<p>2</b>3</p>");
    let body = find(&dom.document, "body").expect("body element");
    let body_children: Vec<Handle> = body.children.borrow().clone();

    let first_b = body_children
        .iter()
        .find(|c| element_name(c) == Some("b"))
        .expect("first <b> is a direct child of body")
        .clone();
    assert_eq!(text_content(&first_b), "1");

    let p = body_children
        .iter()
        .find(|c| element_name(c) == Some("p"))
        .expect("<p> is a direct child of body")
        .clone();
    let p_children: Vec<Handle> = p.children.borrow().clone();

    let second_b = p_children
        .iter()
        .find(|c| element_name(c) == Some("b"))
        .expect("the reopened <b> is a child of <p>")
        .clone();
    assert!(!Rc::ptr_eq(&first_b, &second_b), "the reopened <b> is a clone, not the same node");
    assert_eq!(text_content(&second_b), "2");

    // "3" belongs to <p> directly: it followed the original </b> in the
    // source, so it must not end up inside the reopened <b>.
    let p_own_text: String = p_children
        .iter()
        .filter_map(|c| match &c.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(p_own_text, "3");
    assert!(!text_content(&second_b).contains('3'));
}

#[test]
fn a_stray_end_tag_in_body_is_ignored_not_fatal() {
    let dom = parse_document(Dom::new(), ParseOpts::default(), "<body></div><p>ok</p></body>");
    assert!(find(&dom.document, "p").is_some());
}

#[test]
fn table_text_is_buffered_and_flushed_once_a_real_child_starts() {
    // Character tokens seen directly inside <table> are buffered
    // (in-table-text mode) and flushed as soon as a non-character token
    // arrives, rather than being dropped or interleaved mid-token.
    let dom = parse_document(
        Dom::new(),
        ParseOpts::default(),
        "<table>stray<tr><td>cell</td></tr></table>",
    );
    assert!(find(&dom.document, "td").is_some());
    let td = find(&dom.document, "td").unwrap();
    let text_in_td = td
        .children
        .borrow()
        .iter()
        .any(|c| matches!(&c.data, NodeData::Text { contents } if contents.borrow().contains("cell")));
    assert!(text_in_td);
}

#[test]
fn non_whitespace_table_text_is_foster_parented_before_the_table() {
    // Non-whitespace characters that land directly inside <table> don't
    // belong there: they're foster-parented out, as a sibling before
    // the table in the table's own parent, not inside any table cell.
    let dom = parse_document(
        Dom::new(),
        ParseOpts::default(),
        "<table>stray<tr><td>cell</td></tr></table>",
    );
    let body = find(&dom.document, "body").expect("body element");
    let table = find(&dom.document, "table").expect("table element");
    let body_children: Vec<Handle> = body.children.borrow().clone();
    let table_pos = body_children
        .iter()
        .position(|c| Rc::ptr_eq(c, &table))
        .expect("table is a direct child of body");
    let stray_pos = body_children
        .iter()
        .position(|c| matches!(&c.data, NodeData::Text { contents } if contents.borrow().contains("stray")))
        .expect("foster-parented text is a direct child of body");
    assert!(stray_pos < table_pos, "foster-parented text must precede the table it escaped");
    assert!(!text_content(&table).contains("stray"));
}

#[test]
fn svg_start_tag_switches_to_the_svg_namespace() {
    use wordmark5::html::interface::Namespace;

    let dom = parse_document(
        Dom::new(),
        ParseOpts::default(),
        "<body><svg><circle r=\"4\"></circle></svg></body>",
    );
    let svg = find(&dom.document, "svg").expect("svg element");
    match &svg.data {
        NodeData::Element { name, .. } => assert_eq!(name.ns, Namespace::Svg),
        _ => panic!("svg is an element"),
    }
    let circle = find(&svg, "circle").expect("circle nested inside svg");
    match &circle.data {
        NodeData::Element { name, .. } => assert_eq!(name.ns, Namespace::Svg),
        _ => panic!("circle is an element"),
    }
}

#[test]
fn svg_foreign_object_integration_point_parses_its_contents_as_html() {
    // foreignObject is an HTML integration point: its children are
    // parsed with the ordinary HTML insertion modes, not the foreign-
    // content rules, so a <p> inside it is a real HTML paragraph.
    let dom = parse_document(
        Dom::new(),
        ParseOpts::default(),
        "<body><svg><foreignObject><p>hi</p></foreignObject></svg></body>",
    );
    let p = find(&dom.document, "p").expect("p inside foreignObject");
    match &p.data {
        NodeData::Element { name, .. } => assert_eq!(name.ns, wordmark5::html::interface::Namespace::Html),
        _ => panic!("p is an element"),
    }
}

#[test]
fn svg_tag_and_attribute_casing_is_restored() {
    let dom = parse_document(
        Dom::new(),
        ParseOpts::default(),
        "<body><svg><lineargradient></lineargradient></svg></body>",
    );
    let svg = find(&dom.document, "svg").expect("svg element");
    let has_camel_case_child = svg
        .children
        .borrow()
        .iter()
        .any(|c| element_name(c) == Some("linearGradient"));
    assert!(has_camel_case_child, "lowercased SVG tag name must be restored to mixed case");
}

#[test]
fn parse_then_serialize_round_trips_void_and_formatting_elements() {
    let input = "<!doctype html><html><head></head><body><p>a<br>b</p></body></html>";
    let dom = parse_document(Dom::new(), ParseOpts::default(), input);
    let out = serialize_document(&dom.document, SerializeOpts::default());
    assert_eq!(out, input);
}
