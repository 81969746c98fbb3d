// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `consume(primitive_stream) -> AST node` for each grammar production
//! (spec.md §4.5): each either succeeds, returning a node carrying the
//! slice it consumed, or fails without consuming input.

use crate::css::tokenizer::Token;

use super::ast::{
    AttrMatcher, AttrModifier, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    NsPrefix, PseudoClassSelector, PseudoElementSelector, SelectorList, SimpleSelector, Span,
    TypeSelector, TypeSelectorLocal, WqName,
};

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Cursor { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(Token::Whitespace)) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Eof))
    }
}

/// Splits a token stream on top-level (bracket-depth 0) commas, the
/// shape `<selector-list>` needs to separate its comma-joined
/// `<complex-selector>`s.
fn split_top_level_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t {
            Token::OpenParen | Token::OpenSquare | Token::OpenCurly => depth += 1,
            Token::CloseParen | Token::CloseSquare | Token::CloseCurly => depth -= 1,
            Token::Comma if depth == 0 => {
                out.push(&tokens[start..i]);
                start = i + 1;
            }
            Token::Eof => {
                out.push(&tokens[start..i]);
                return out;
            }
            _ => {}
        }
    }
    out.push(&tokens[start..]);
    out
}

fn trim_whitespace(tokens: &[Token]) -> &[Token] {
    let mut s = 0;
    let mut e = tokens.len();
    while s < e && matches!(tokens[s], Token::Whitespace) {
        s += 1;
    }
    while e > s && matches!(tokens[e - 1], Token::Whitespace) {
        e -= 1;
    }
    &tokens[s..e]
}

/// Parses a full `<selector-list>` from raw CSS text.
pub fn parse_selector_list(input: &str) -> Option<SelectorList> {
    let tokens = crate::css::tokenize(input);
    let parts = split_top_level_commas(&tokens);
    let mut selectors = Vec::with_capacity(parts.len());
    for part in parts {
        let trimmed = trim_whitespace(part);
        if trimmed.is_empty() {
            return None;
        }
        selectors.push(parse_complex_selector(trimmed)?);
    }
    Some(SelectorList { selectors })
}

/// `<complex-selector> = <compound-selector> [ <combinator>? <compound-selector> ]*`
pub fn parse_complex_selector(tokens: &[Token]) -> Option<ComplexSelector> {
    let mut c = Cursor::new(tokens);
    let first = parse_compound_selector(&mut c)?;
    let mut compounds = vec![first];
    let mut combinators = Vec::new();

    loop {
        let before_ws = c.pos;
        let had_ws = c.skip_whitespace();
        if c.at_end() {
            break;
        }
        let explicit = match c.peek() {
            Some(Token::Delim('>')) => Some(Combinator::Child),
            Some(Token::Delim('+')) => Some(Combinator::NextSibling),
            Some(Token::Delim('~')) => Some(Combinator::SubsequentSibling),
            Some(Token::Delim('|')) if c.peek_at(1) == Some(&Token::Delim('|')) => {
                Some(Combinator::Column)
            }
            _ => None,
        };
        let combinator = match explicit {
            Some(Combinator::Column) => {
                c.bump();
                c.bump();
                Combinator::Column
            }
            Some(other) => {
                c.bump();
                other
            }
            None if had_ws => Combinator::Descendant,
            None => {
                c.pos = before_ws;
                break;
            }
        };
        c.skip_whitespace();
        let next = parse_compound_selector(&mut c)?;
        combinators.push(combinator);
        compounds.push(next);
    }

    Some(ComplexSelector {
        compounds,
        combinators,
        span: Span {
            first: 0,
            last: c.pos,
        },
    })
}

fn parse_ns_prefix(c: &mut Cursor) -> Option<NsPrefix> {
    let start = c.pos;
    let named = match c.peek() {
        Some(Token::Ident(name)) => Some(Some(name.clone())),
        Some(Token::Delim('*')) => Some(None),
        _ => None,
    };
    if named.is_some() {
        c.bump();
    }
    if c.peek() == Some(&Token::Delim('|')) && c.peek_at(1) != Some(&Token::Delim('|')) {
        c.bump();
        Some(match named {
            Some(Some(name)) => NsPrefix::Named(name),
            Some(None) => NsPrefix::Wildcard,
            None => NsPrefix::Empty,
        })
    } else {
        c.pos = start;
        None
    }
}

fn parse_type_selector(c: &mut Cursor) -> Option<TypeSelector> {
    let start = c.pos;
    let prefix = parse_ns_prefix(c);
    let local = match c.peek() {
        Some(Token::Ident(name)) => {
            let name = name.clone();
            c.bump();
            TypeSelectorLocal::Named(name)
        }
        Some(Token::Delim('*')) => {
            c.bump();
            TypeSelectorLocal::Wildcard
        }
        _ => {
            c.pos = start;
            return None;
        }
    };
    Some(TypeSelector {
        prefix,
        local,
        span: Span {
            first: start,
            last: c.pos,
        },
    })
}

fn parse_wq_name(c: &mut Cursor) -> Option<WqName> {
    let start = c.pos;
    let prefix = parse_ns_prefix(c);
    match c.peek() {
        Some(Token::Ident(name)) => {
            let name = name.clone();
            c.bump();
            Some(WqName {
                prefix,
                local: name,
                span: Span {
                    first: start,
                    last: c.pos,
                },
            })
        }
        _ => {
            c.pos = start;
            None
        }
    }
}

fn parse_attr_matcher(c: &mut Cursor) -> Option<AttrMatcher> {
    let start = c.pos;
    let prefix = match c.peek() {
        Some(Token::Delim('~')) => Some(AttrMatcher::Includes),
        Some(Token::Delim('|')) => Some(AttrMatcher::DashMatch),
        Some(Token::Delim('^')) => Some(AttrMatcher::PrefixMatch),
        Some(Token::Delim('$')) => Some(AttrMatcher::SuffixMatch),
        Some(Token::Delim('*')) => Some(AttrMatcher::SubstringMatch),
        _ => None,
    };
    if prefix.is_some() {
        c.bump();
    }
    match c.peek() {
        Some(Token::Delim('=')) => {
            c.bump();
            Some(prefix.unwrap_or(AttrMatcher::Equals))
        }
        _ => {
            c.pos = start;
            None
        }
    }
}

fn parse_attr_value(c: &mut Cursor) -> Option<String> {
    match c.peek() {
        Some(Token::String(s)) => {
            let s = s.clone();
            c.bump();
            Some(s)
        }
        Some(Token::Ident(s)) => {
            let s = s.clone();
            c.bump();
            Some(s)
        }
        _ => None,
    }
}

/// `<attribute-selector> = '[' <wq-name> ']' | '[' <wq-name> <attr-matcher> [<string>|<ident>] <attr-modifier>? ']'`
fn parse_attribute_selector(c: &mut Cursor) -> Option<AttributeSelector> {
    let start = c.pos;
    if c.peek() != Some(&Token::OpenSquare) {
        return None;
    }
    c.bump();
    c.skip_whitespace();
    let Some(name) = parse_wq_name(c) else {
        c.pos = start;
        return None;
    };
    c.skip_whitespace();
    let matcher = if let Some(m) = parse_attr_matcher(c) {
        c.skip_whitespace();
        let Some(value) = parse_attr_value(c) else {
            c.pos = start;
            return None;
        };
        Some((m, value))
    } else {
        None
    };
    c.skip_whitespace();
    let modifier = match c.peek() {
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("i") => {
            c.bump();
            Some(AttrModifier::CaseInsensitive)
        }
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("s") => {
            c.bump();
            Some(AttrModifier::CaseSensitive)
        }
        _ => None,
    };
    c.skip_whitespace();
    if c.peek() != Some(&Token::CloseSquare) {
        c.pos = start;
        return None;
    }
    c.bump();
    Some(AttributeSelector {
        name,
        matcher,
        modifier,
        span: Span {
            first: start,
            last: c.pos,
        },
    })
}

/// A functional pseudo-class's argument list, rendered back out as a
/// best-effort flat token sequence — matching.rs never inspects the
/// contents (spec.md §4.6's pseudo-class stub).
fn render_argument_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for t in tokens {
        match t {
            Token::Ident(s) | Token::Function(s) => out.push_str(s),
            Token::String(s) => {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
            Token::Comma => out.push(','),
            Token::Whitespace => out.push(' '),
            Token::Delim(c) => out.push(*c),
            _ => {}
        }
    }
    out
}

fn parse_pseudo_class_selector(c: &mut Cursor) -> Option<PseudoClassSelector> {
    let start = c.pos;
    if c.peek() != Some(&Token::Colon) || c.peek_at(1) == Some(&Token::Colon) {
        return None;
    }
    c.bump();
    match c.peek() {
        Some(Token::Ident(name)) => {
            let name = name.clone();
            c.bump();
            Some(PseudoClassSelector {
                name,
                arguments: None,
                span: Span {
                    first: start,
                    last: c.pos,
                },
            })
        }
        Some(Token::Function(name)) => {
            let name = name.clone();
            c.bump();
            let arg_start = c.pos;
            let mut depth = 1i32;
            while !c.at_end() {
                match c.peek() {
                    Some(Token::OpenParen) => depth += 1,
                    Some(Token::CloseParen) => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                c.bump();
            }
            let args = render_argument_tokens(&c.tokens[arg_start..c.pos]);
            c.bump(); // the closing ')'
            Some(PseudoClassSelector {
                name,
                arguments: Some(args),
                span: Span {
                    first: start,
                    last: c.pos,
                },
            })
        }
        _ => {
            c.pos = start;
            None
        }
    }
}

fn parse_pseudo_element_selector(c: &mut Cursor) -> Option<PseudoElementSelector> {
    let start = c.pos;
    if c.peek() == Some(&Token::Colon) && c.peek_at(1) == Some(&Token::Colon) {
        c.bump();
        c.bump();
        if let Some(Token::Ident(name)) = c.peek() {
            let name = name.clone();
            c.bump();
            return Some(PseudoElementSelector {
                name,
                span: Span {
                    first: start,
                    last: c.pos,
                },
            });
        }
    }
    c.pos = start;
    None
}

fn parse_subclass_selector(c: &mut Cursor) -> Option<SimpleSelector> {
    match c.peek() {
        Some(Token::Hash { is_id: true, .. }) => {
            let Token::Hash { value, .. } = c.bump().unwrap().clone() else {
                unreachable!()
            };
            Some(SimpleSelector::Id(value))
        }
        Some(Token::Delim('.')) => {
            if let Some(Token::Ident(name)) = c.peek_at(1) {
                let name = name.clone();
                c.bump();
                c.bump();
                Some(SimpleSelector::Class(name))
            } else {
                None
            }
        }
        Some(Token::OpenSquare) => parse_attribute_selector(c).map(SimpleSelector::Attribute),
        Some(Token::Colon) if c.peek_at(1) != Some(&Token::Colon) => {
            parse_pseudo_class_selector(c).map(SimpleSelector::PseudoClass)
        }
        _ => None,
    }
}

/// `<compound-selector> = [<type-selector>]? <subclass-selector>* [<pseudo-element-selector> <pseudo-class-selector>*]*`
fn parse_compound_selector(c: &mut Cursor) -> Option<CompoundSelector> {
    let start = c.pos;
    let type_selector = parse_type_selector(c);
    let mut subclasses = Vec::new();
    while let Some(s) = parse_subclass_selector(c) {
        subclasses.push(s);
    }
    let mut pseudo_elements = Vec::new();
    while let Some(pe) = parse_pseudo_element_selector(c) {
        pseudo_elements.push(pe);
        while parse_pseudo_class_selector(c).is_some() {
            // pseudo-classes after a pseudo-element (e.g. `::before:hover`)
            // are accepted syntactically but not separately represented.
        }
    }

    let compound = CompoundSelector {
        type_selector,
        subclasses,
        pseudo_elements,
        span: Span {
            first: start,
            last: c.pos,
        },
    };
    if compound.is_empty() {
        c.pos = start;
        None
    } else {
        Some(compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_class_and_id() {
        let list = parse_selector_list("div.foo#bar").unwrap();
        assert_eq!(list.selectors.len(), 1);
        let c = &list.selectors[0].compounds[0];
        assert!(matches!(
            c.type_selector.as_ref().unwrap().local,
            TypeSelectorLocal::Named(ref n) if n == "div"
        ));
        assert_eq!(c.subclasses.len(), 2);
    }

    #[test]
    fn descendant_and_child_combinators() {
        let sel = parse_complex_selector(&crate::css::tokenize("ul > li a"))
            .expect("parses");
        assert_eq!(sel.compounds.len(), 3);
        assert_eq!(sel.combinators, vec![Combinator::Child, Combinator::Descendant]);
    }

    #[test]
    fn attribute_selector_with_matcher_and_modifier() {
        let list = parse_selector_list("a[href^=\"http\" i]").unwrap();
        let c = &list.selectors[0].compounds[0];
        let SimpleSelector::Attribute(attr) = &c.subclasses[0] else {
            panic!("expected attribute selector");
        };
        assert_eq!(attr.matcher.as_ref().unwrap().0, AttrMatcher::PrefixMatch);
        assert_eq!(attr.modifier, Some(AttrModifier::CaseInsensitive));
    }

    #[test]
    fn selector_list_splits_on_commas() {
        let list = parse_selector_list("h1, h2, .title").unwrap();
        assert_eq!(list.selectors.len(), 3);
    }

    #[test]
    fn pseudo_class_and_element() {
        let list = parse_selector_list("a:hover::before").unwrap();
        let c = &list.selectors[0].compounds[0];
        assert_eq!(c.subclasses.len(), 1);
        assert_eq!(c.pseudo_elements.len(), 1);
        assert_eq!(c.pseudo_elements[0].name, "before");
    }

    #[test]
    fn invalid_selector_rejected() {
        assert!(parse_selector_list(">>>").is_none());
    }
}
