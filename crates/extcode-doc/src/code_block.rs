//! Code block processor trait for extensible code block handling.
//!
//! Processors are registered with the [`Application`](crate::Application) and
//! offered every fenced code block that carries a language tag, in
//! registration order. The first processor returning
//! [`ProcessResult::Replace`] wins; if every processor passes, the block is
//! rendered by [`literal_block`].
//!
//! # Example
//!
//! ```
//! use extcode_doc::{
//!     CodeBlock, CodeBlockProcessor, DirectiveError, Node, NodeKind, ProcessContext,
//!     ProcessResult,
//! };
//!
//! struct Shout;
//!
//! impl CodeBlockProcessor for Shout {
//!     fn process(
//!         &mut self,
//!         block: &CodeBlock,
//!         _ctx: &ProcessContext<'_>,
//!     ) -> Result<ProcessResult, DirectiveError> {
//!         if block.language.as_deref() != Some("shout") {
//!             return Ok(ProcessResult::PassThrough);
//!         }
//!         let text = Node::text(block.content.to_uppercase());
//!         Ok(ProcessResult::Replace(vec![
//!             Node::new(NodeKind::Paragraph).with_children(vec![text]),
//!         ]))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::builder::Builder;
use crate::env::BuildEnvironment;
use crate::node::{Node, NodeKind, SourceInfo};

/// A fenced code block as seen by processors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the fence info string.
    pub language: Option<String>,
    /// Attributes from the fence info string. Bare flags map to an empty string.
    pub attrs: HashMap<String, String>,
    /// Block content without the final newline.
    pub content: String,
    /// Line of the opening fence (1-indexed).
    pub line: usize,
    pub source_path: Option<PathBuf>,
}

impl CodeBlock {
    #[must_use]
    pub fn new(language: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            language: language.map(str::to_owned),
            content: content.into(),
            line: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Get an attribute value by key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Source position of the opening fence.
    #[must_use]
    pub fn source_info(&self) -> SourceInfo {
        SourceInfo::new(self.source_path.clone(), self.line)
    }
}

/// What a processor sees of the build while handling a block.
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    pub env: &'a dyn BuildEnvironment,
    pub builder: &'a Builder,
    /// Name of the document being parsed.
    pub docname: &'a str,
}

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with these nodes.
    Replace(Vec<Node>),
    /// Leave the block to the next processor or to base code-block handling.
    PassThrough,
}

/// Error reported by a processor for a single block.
///
/// The parser replaces the block with an error system message and keeps going.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DirectiveError(pub String);

/// Trait for processing fenced code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError`] when the block's options are invalid.
    fn process(
        &mut self,
        block: &CodeBlock,
        ctx: &ProcessContext<'_>,
    ) -> Result<ProcessResult, DirectiveError>;

    /// Drain warnings generated since the last call.
    ///
    /// Default implementation returns no warnings.
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Base code-block handling: build a literal block for `content`.
///
/// Honours the `linenos` flag, `name` (becomes the node id), `class` (space
/// separated extra classes) and `caption` (wraps the block in a captioned
/// container) attributes of `block`.
#[must_use]
pub fn literal_block(block: &CodeBlock, content: &str) -> Node {
    let mut node = Node::new(NodeKind::LiteralBlock {
        language: block.language.clone(),
        linenos: block.has_attr("linenos"),
    })
    .with_source(block.source_info())
    .with_children(vec![Node::text(content)]);

    if let Some(classes) = block.attr("class") {
        for class in classes.split_whitespace() {
            node.add_class(class);
        }
    }

    let id = block.attr("name").filter(|name| !name.is_empty());

    match block.attr("caption") {
        Some(caption) => {
            let mut wrapper = Node::new(NodeKind::Container)
                .with_class("literal-block-wrapper")
                .with_source(block.source_info())
                .with_children(vec![
                    Node::new(NodeKind::Caption).with_children(vec![Node::text(caption)]),
                    node,
                ]);
            wrapper.id = id.map(str::to_owned);
            wrapper
        }
        None => {
            node.id = id.map(str::to_owned);
            node
        }
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value | key="quoted value" | flag ...]`. A first
/// token containing `=` is an attribute, leaving the block without a language.
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (Option<String>, HashMap<String, String>) {
    let mut language = None;
    let mut attrs = HashMap::new();

    for (index, token) in tokenize(info).into_iter().enumerate() {
        if let Some((key, value)) = token.split_once('=') {
            if !key.is_empty() {
                attrs.insert(key.to_owned(), value.to_owned());
            }
        } else if index == 0 {
            language = Some(token);
        } else {
            attrs.insert(token, String::new());
        }
    }

    (language, attrs)
}

/// Split on whitespace, keeping quoted runs together and dropping the quotes.
fn tokenize(info: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in info.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
