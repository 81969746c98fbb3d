// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Drives the HTML tokenizer directly against a collecting sink,
//! without a tree builder in the loop, and separately exercises the
//! CSS syntax tokenizer.

use wordmark5::css;
use wordmark5::html::tokenizer::states::RawKind;
use wordmark5::html::tokenizer::{Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts};

#[derive(Default)]
struct Collector {
    tags: Vec<Tag>,
    text: String,
    comments: Vec<String>,
}

impl TokenSink for Collector {
    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult {
        match token {
            Token::TagToken(tag) => {
                let raw = match (tag.kind, tag.name.as_str()) {
                    (TagKind::StartTag, "script") => Some(RawKind::ScriptData),
                    (TagKind::StartTag, "style") => Some(RawKind::Rawtext),
                    _ => None,
                };
                self.tags.push(tag);
                if let Some(kind) = raw {
                    return TokenSinkResult::RawData(kind);
                }
            }
            Token::CharacterTokens(t) => self.text.push_str(&t),
            Token::NullCharacterToken => self.text.push('\u{FFFD}'),
            Token::CommentToken(t) => self.comments.push(t.to_string()),
            Token::DoctypeToken(_) | Token::EofToken | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

fn tokenize_all(input: &str) -> Collector {
    let mut tok = Tokenizer::new(Collector::default(), TokenizerOpts::default());
    tok.feed(input);
    tok.end();
    tok.sink
}

#[test]
fn tags_attributes_and_text_are_emitted_in_order() {
    let out = tokenize_all("<p class=\"a b\">hello <b>world</b></p>");
    let names: Vec<&str> = out.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["p", "b", "b", "p"]);
    assert_eq!(out.tags[0].attrs[0].value, "a b");
    assert!(out.text.contains("hello "));
    assert!(out.text.contains("world"));
}

#[test]
fn script_contents_are_not_tokenized_as_markup() {
    let out = tokenize_all("<script>if (a < b) { x(); }</script>after");
    assert!(out.text.contains("if (a < b) { x(); }"));
    assert!(out.text.contains("after"));
    let names: Vec<&str> = out.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["script", "script"]);
}

#[test]
fn comments_are_collected() {
    let out = tokenize_all("a<!-- note -->b");
    assert_eq!(out.comments, vec![" note ".to_string()]);
}

#[test]
fn css_tokenizer_splits_a_compound_selector_into_syntax_primitives() {
    let tokens = css::tokenize("div.item[data-x=\"y\"]:hover");
    assert!(tokens.iter().any(|t| matches!(t, css::Token::Ident(s) if s == "div")));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::Delim('.'))));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::Ident(s) if s == "item")));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::OpenSquare)));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::String(s) if s == "y")));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::Colon)));
    assert!(tokens.iter().any(|t| matches!(t, css::Token::Ident(s) if s == "hover")));
    assert!(matches!(tokens.last(), Some(css::Token::Eof)));
}
