// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal HTML serializer over [`crate::dom`], mirroring the shape
//! of the teacher's `Serialize`/`Serializer` traits closely enough to
//! make golden-string round-trip tests expressible. Not a spec
//! deliverable in its own right — parsing is what this crate is for —
//! but every sample outcome is most naturally checked as a string.

use crate::dom::{Handle, NodeData};
use crate::html::tree_builder::is_void;

/// Mirrors the teacher's `SerializeOpts`: the one knob that changes
/// what gets escaped (`<noscript>` contents are markup when scripting
/// is disabled, opaque text otherwise).
#[derive(Debug, Clone, Copy)]
pub struct SerializeOpts {
    pub scripting_enabled: bool,
}

impl Default for SerializeOpts {
    fn default() -> Self {
        SerializeOpts {
            scripting_enabled: true,
        }
    }
}

/// Serializes the subtree rooted at `handle` (a `Document` node
/// serializes its children; anything else serializes itself).
pub fn serialize_document(handle: &Handle, opts: SerializeOpts) -> String {
    let mut out = String::new();
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                serialize_node(child, None, opts, &mut out);
            }
        }
        _ => serialize_node(handle, None, opts, &mut out),
    }
    out
}

fn escape(text: &str, out: &mut String, attr_mode: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Elements whose text-node children are written verbatim rather than
/// escaped (spec-unrelated HTML serialization convention the teacher
/// follows for raw-text/escapable-raw-text elements).
fn is_raw_text_container(local_name: &str, opts: SerializeOpts) -> bool {
    match local_name {
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext" => true,
        "noscript" => !opts.scripting_enabled,
        _ => false,
    }
}

fn serialize_node(node: &Handle, parent_local: Option<&str>, opts: SerializeOpts, out: &mut String) {
    match &node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                serialize_node(child, None, opts, out);
            }
        }
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment { contents } => {
            out.push_str("<!--");
            out.push_str(contents);
            out.push_str("-->");
        }
        NodeData::Text { contents } => {
            let text = contents.borrow();
            if parent_local.is_some_and(|n| is_raw_text_container(n, opts)) {
                out.push_str(&text);
            } else {
                escape(&text, out, false);
            }
        }
        NodeData::Element { name, attrs } => {
            let local = name.local.as_str();
            out.push('<');
            out.push_str(local);
            for attr in attrs.borrow().iter() {
                out.push(' ');
                out.push_str(attr.name.local.as_str());
                out.push_str("=\"");
                escape(&attr.value, out, true);
                out.push('"');
            }
            out.push('>');
            if is_void(local) {
                return;
            }
            for child in node.children.borrow().iter() {
                serialize_node(child, Some(local), opts, out);
            }
            out.push_str("</");
            out.push_str(local);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;
    use crate::html::{parse_document, ParseOpts};

    #[test]
    fn round_trips_a_simple_document() {
        let input = "<!doctype html><html><head></head><body><p id=\"a\">hi &amp; bye<br></p></body></html>";
        let dom = parse_document(Dom::new(), ParseOpts::default(), input);
        let out = serialize_document(&dom.document, SerializeOpts::default());
        assert_eq!(
            out,
            "<!DOCTYPE html><html><head></head><body><p id=\"a\">hi &amp; bye<br></p></body></html>"
        );
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let input = "<div title=\"a &quot;quote&quot;\">&lt;tag&gt;</div>";
        let dom = parse_document(Dom::new(), ParseOpts::default(), input);
        let out = serialize_document(&dom.document, SerializeOpts::default());
        assert!(out.contains("title=\"a &quot;quote&quot;\""));
        assert!(out.contains("&lt;tag&gt;"));
    }

    #[test]
    fn script_contents_are_not_escaped() {
        let input = "<script>if (a < b) {}</script>";
        let dom = parse_document(Dom::new(), ParseOpts::default(), input);
        let out = serialize_document(&dom.document, SerializeOpts::default());
        assert!(out.contains("if (a < b) {}"));
    }
}
