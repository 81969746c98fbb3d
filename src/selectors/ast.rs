// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Selectors Level 4 grammar (spec §17): one AST variant per
//! production, each carrying the `[first, last)` slice of syntax
//! primitives it consumed.

use std::fmt;

/// `[first, last)` index range into the token stream a production
/// consumed, kept for diagnostics (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub first: usize,
    pub last: usize,
}

/// `<ns-prefix> = [<ident-token> | '*']? '|'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsPrefix {
    Named(String),
    Wildcard,
    /// `|name` — the empty prefix, matching only elements in no namespace.
    Empty,
}

impl fmt::Display for NsPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NsPrefix::Named(s) => write!(f, "{s}|"),
            NsPrefix::Wildcard => write!(f, "*|"),
            NsPrefix::Empty => write!(f, "|"),
        }
    }
}

/// `<wq-name> = <ns-prefix>? <ident-token>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WqName {
    pub prefix: Option<NsPrefix>,
    pub local: String,
    pub span: Span,
}

impl fmt::Display for WqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.prefix {
            write!(f, "{p}")?;
        }
        write!(f, "{}", self.local)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
    /// `||` — the column combinator.
    Column,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::NextSibling => " + ",
            Combinator::SubsequentSibling => " ~ ",
            Combinator::Column => " || ",
        })
    }
}

/// `<attr-matcher> = ['~' | '|' | '^' | '$' | '*']? '='`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMatcher {
    Equals,
    Includes,
    DashMatch,
    PrefixMatch,
    SuffixMatch,
    SubstringMatch,
}

impl fmt::Display for AttrMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrMatcher::Equals => "=",
            AttrMatcher::Includes => "~=",
            AttrMatcher::DashMatch => "|=",
            AttrMatcher::PrefixMatch => "^=",
            AttrMatcher::SuffixMatch => "$=",
            AttrMatcher::SubstringMatch => "*=",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrModifier {
    CaseInsensitive,
    CaseSensitive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: WqName,
    pub matcher: Option<(AttrMatcher, String)>,
    pub modifier: Option<AttrModifier>,
    pub span: Span,
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.name)?;
        if let Some((m, v)) = &self.matcher {
            write!(f, "{m}\"{v}\"")?;
        }
        match self.modifier {
            Some(AttrModifier::CaseInsensitive) => write!(f, " i")?,
            Some(AttrModifier::CaseSensitive) => write!(f, " s")?,
            None => {}
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSelectorLocal {
    Named(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSelector {
    pub prefix: Option<NsPrefix>,
    pub local: TypeSelectorLocal,
    pub span: Span,
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.prefix {
            write!(f, "{p}")?;
        }
        match &self.local {
            TypeSelectorLocal::Named(n) => write!(f, "{n}"),
            TypeSelectorLocal::Wildcard => write!(f, "*"),
        }
    }
}

/// A functional pseudo-class's argument is kept as the raw token text
/// it was spelled with; matching.rs never inspects it (spec.md §4.6's
/// "stub for functional pseudo-classes").
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoClassSelector {
    pub name: String,
    pub arguments: Option<String>,
    pub span: Span,
}

impl fmt::Display for PseudoClassSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)?;
        if let Some(args) = &self.arguments {
            write!(f, "({args})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PseudoElementSelector {
    pub name: String,
    pub span: Span,
}

impl fmt::Display for PseudoElementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "::{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClassSelector),
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Id(s) => write!(f, "#{s}"),
            SimpleSelector::Class(s) => write!(f, ".{s}"),
            SimpleSelector::Attribute(a) => write!(f, "{a}"),
            SimpleSelector::PseudoClass(p) => write!(f, "{p}"),
        }
    }
}

/// `<compound-selector>`: a type selector and/or subclass selectors
/// and/or pseudo-elements, at least one of which must be present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub type_selector: Option<TypeSelector>,
    pub subclasses: Vec<SimpleSelector>,
    pub pseudo_elements: Vec<PseudoElementSelector>,
    pub span: Span,
}

impl CompoundSelector {
    pub fn is_empty(&self) -> bool {
        self.type_selector.is_none() && self.subclasses.is_empty() && self.pseudo_elements.is_empty()
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(t) = &self.type_selector {
            write!(f, "{t}")?;
        }
        for s in &self.subclasses {
            write!(f, "{s}")?;
        }
        for p in &self.pseudo_elements {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// `<complex-selector>`: compounds alternating with combinators;
/// `combinators.len() == compounds.len() - 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
    pub span: Span,
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.combinators[i - 1])?;
            }
            write!(f, "{compound}")?;
        }
        Ok(())
    }
}

/// `<relative-selector> = <combinator>? <complex-selector>`
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeSelector {
    pub combinator: Option<Combinator>,
    pub selector: ComplexSelector,
}

/// `<selector-list> = <complex-selector-list>`: zero or more complex
/// selectors, comma-separated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// The grammar also names `<complex-selector-list>` directly (e.g. as
/// the argument of `:is()`/`:where()`); per spec it coincides with
/// `<selector-list>`.
pub type ComplexSelectorList = SelectorList;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleSelectorList {
    pub selectors: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelectorList {
    pub selectors: Vec<CompoundSelector>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativeSelectorList {
    pub selectors: Vec<RelativeSelector>,
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}
