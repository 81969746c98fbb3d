// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The WHATWG HTML5 parsing pipeline: a code-point input stream, an
//! 80-state tokenizer, and a tree-construction dispatcher driving a
//! [`interface::TreeSink`].

pub mod input_stream;
pub mod interface;
pub mod serialize;
pub mod tokenizer;
pub mod tree_builder;

pub use interface::{
    Attribute, AttrName, ElementFlags, ExpandedName, LocalName, Namespace, NamespaceOrd,
    NodeOrText, Prefix, QualName, QuirksMode, TreeSink,
};

/// Parses `input` with a fresh tokenizer and tree builder, driving `sink`.
/// A thin convenience wrapper; `Tokenizer`/`TreeBuilder` can be driven
/// directly for incremental/streaming use.
pub fn parse_document<Sink: TreeSink>(
    sink: Sink,
    opts: ParseOpts,
    input: &str,
) -> Sink {
    let tb = tree_builder::TreeBuilder::new(sink, opts.tree_builder);
    let mut tok = tokenizer::Tokenizer::new(tb, opts.tokenizer);
    tok.feed(input);
    tok.end();
    tok.sink.finish()
}

/// Grouped configuration for a full parse, mirroring the ambient `*Opts`
/// convention used throughout this crate (spec-expansion §2).
#[derive(Debug, Clone, Default)]
pub struct ParseOpts {
    pub tokenizer: tokenizer::TokenizerOpts,
    pub tree_builder: tree_builder::TreeBuilderOpts,
}
