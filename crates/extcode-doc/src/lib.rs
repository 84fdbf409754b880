//! Markdown document engine used by extcode.
//!
//! This crate turns markdown sources into a [`Node`] tree, lets registered
//! [`CodeBlockProcessor`]s replace fenced code blocks with arbitrary sub-trees,
//! resolves cross-references against a shared [`Environment`], and writes the
//! result with one of the format-specific writers.
//!
//! # Architecture
//!
//! A build runs in three phases, driven by [`Application`]:
//!
//! 1. **Read**: every document is parsed; code blocks are offered to the
//!    registered processors; domains record labels in the [`SymbolTable`].
//! 2. **Resolve**: pending cross-references are turned into links and the
//!    doctree-resolved hooks run.
//! 3. **Write**: the tree is rendered by the writer for the active
//!    [`Builder`]'s [`OutputFormat`].
//!
//! Custom nodes are rendered through a [`NodeRegistry`] keyed by node name and
//! output format.
//!
//! # Example
//!
//! ```
//! use extcode_doc::{Application, Builder, SourceDocument};
//!
//! let mut app = Application::new(Builder::html());
//! let html = app
//!     .render_document(&SourceDocument::new("index", "# Hello\n\n**Bold** text"))
//!     .unwrap();
//! assert!(html.contains("<strong>Bold</strong>"));
//! ```

mod app;
mod builder;
mod code_block;
mod env;
mod error;
mod fence;
mod node;
mod parser;
mod util;
pub mod writer;

pub use app::{
    Application, BuildReport, DoctreeResolvedHook, Extension, SourceDocument, StaticAsset,
};
pub use builder::{Builder, OutputFormat};
pub use code_block::{
    CodeBlock, CodeBlockProcessor, DirectiveError, ProcessContext, ProcessResult, literal_block,
};
pub use env::{BuildEnvironment, Domain, Environment, StdDomain, SymbolScope, SymbolTable, Target};
pub use error::{BuildError, DomainError, ParseError, WriteError};
pub use node::{MessageLevel, Node, NodeKind, SourceInfo};
pub use parser::{ParseOptions, ParsedDocument, parse_document, parse_inline, parse_with_processors};
pub use util::{escape_html, relative_path, slugify};
pub use writer::{NodeHandlers, NodeRegistry};
