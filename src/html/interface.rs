// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Names, namespaces, and the `TreeSink` contract the tree-construction
//! dispatcher drives (spec §6, "Tree constructor callbacks to host").
//! The DOM container itself is out of scope (spec §1) — this is only the
//! seam a host tree implements.

use std::fmt;
use tendril::StrTendril;

/// The closed set of namespaces HTML parsing cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
    /// No namespace (plain attributes, or a document-mode-dependent
    /// default in Selectors matching).
    None,
}

impl Namespace {
    pub const fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
            Namespace::None => "",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

pub type LocalName = String;
pub type Prefix = String;

/// <https://www.w3.org/TR/REC-xml-names/#dt-expname>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpandedName<'a> {
    pub ns: Namespace,
    pub local: &'a str,
}

/// A fully qualified name: optional source prefix, namespace, local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    pub prefix: Option<Prefix>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    pub fn new(prefix: Option<Prefix>, ns: Namespace, local: LocalName) -> Self {
        QualName { prefix, ns, local }
    }

    pub fn html(local: impl Into<LocalName>) -> Self {
        QualName::new(None, Namespace::Html, local.into())
    }

    pub fn expanded(&self) -> ExpandedName<'_> {
        ExpandedName {
            ns: self.ns,
            local: &self.local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attribute {
    pub name: AttrName,
    pub value: String,
}

/// Attribute names are ordered/compared without the prefix (spec §3.2:
/// "name/value/prefix/namespace quadruples").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttrName {
    pub prefix: Option<Prefix>,
    pub ns: NamespaceOrd,
    pub local: LocalName,
}

/// `Namespace` isn't `Ord`; this newtype gives attributes a total order
/// for Noah's-Ark-style dedup and for `Tag::equiv_modulo_attr_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceOrd(pub u8);

impl From<Namespace> for NamespaceOrd {
    fn from(ns: Namespace) -> Self {
        NamespaceOrd(match ns {
            Namespace::Html => 0,
            Namespace::MathMl => 1,
            Namespace::Svg => 2,
            Namespace::XLink => 3,
            Namespace::Xml => 4,
            Namespace::XmlNs => 5,
            Namespace::None => 6,
        })
    }
}

impl From<NamespaceOrd> for Namespace {
    fn from(n: NamespaceOrd) -> Self {
        match n.0 {
            0 => Namespace::Html,
            1 => Namespace::MathMl,
            2 => Namespace::Svg,
            3 => Namespace::XLink,
            4 => Namespace::Xml,
            5 => Namespace::XmlNs,
            _ => Namespace::None,
        }
    }
}

/// Whether to insert a node or coalesce onto existing adjacent text.
pub enum NodeOrText<Handle> {
    AppendNode(Handle),
    AppendText(StrTendril),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ElementFlags {
    pub template: bool,
    pub mathml_annotation_xml: bool,
}

/// The seam the tree-construction dispatcher drives. Implement this for
/// your own tree data type (see [`crate::dom`] for a reference arena
/// implementation used by this crate's own tests).
pub trait TreeSink {
    type Handle: Clone;

    fn get_document(&mut self) -> Self::Handle;
    fn set_quirks_mode(&mut self, mode: QuirksMode);

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle;
    fn create_comment(&mut self, text: StrTendril) -> Self::Handle;

    fn append(&mut self, parent: &Self::Handle, child: NodeOrText<Self::Handle>);
    fn append_before_sibling(
        &mut self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    );
    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    );

    /// Foster-parenting target per spec §4.4
    /// `appropriate_place_for_inserting_node`.
    fn parent_node(&self, node: &Self::Handle) -> Option<Self::Handle>;

    fn add_attrs_if_missing(&mut self, target: &Self::Handle, attrs: Vec<Attribute>);
    fn remove_from_parent(&mut self, target: &Self::Handle);
    fn reparent_children(&mut self, node: &Self::Handle, new_parent: &Self::Handle);

    fn mark_script_already_started(&mut self, _node: &Self::Handle) {}
    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool;
    fn elem_name(&self, target: &Self::Handle) -> QualName;

    /// Used by foreign-content handling (`adjusted_current_node_present_but_not_in_html_namespace`).
    fn is_html_integration_point(&self, _handle: &Self::Handle) -> bool {
        false
    }
    fn is_mathml_text_integration_point(&self, _handle: &Self::Handle) -> bool {
        false
    }
}
