//! Markdown to document tree conversion.
//!
//! Walks pulldown-cmark events and builds a [`Node`] tree. Fenced code blocks
//! are offered to registered [`CodeBlockProcessor`]s before falling back to
//! [`literal_block`].

use std::collections::HashMap;
use std::path::PathBuf;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::code_block::{
    CodeBlock, CodeBlockProcessor, ProcessContext, ProcessResult, literal_block, parse_fence_info,
};
use crate::error::ParseError;
use crate::fence::unterminated_fence;
use crate::node::{MessageLevel, Node, NodeKind, SourceInfo};
use crate::util::{heading_level_to_num, slugify};

/// Options controlling a single parse.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Path reported in diagnostics.
    pub source_path: Option<PathBuf>,
    /// Line number of the first source line (1-indexed).
    pub first_line: usize,
    /// Treat recoverable markup problems (an unterminated fence) as errors.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_path: None,
            first_line: 1,
            strict: false,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, path: Option<PathBuf>, first_line: usize) -> Self {
        self.source_path = path;
        self.first_line = first_line;
        self
    }
}

/// Parsed document with parse-time warnings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDocument {
    pub root: Node,
    pub warnings: Vec<String>,
}

/// Parse Markdown into a document tree without code block processors.
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedFence`] in strict mode when a code fence
/// is never closed.
pub fn parse_document(source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    let parsed = TreeBuilder::new(source, options, &mut [], None).build()?;
    Ok(parsed.root)
}

/// Parse Markdown into a document tree, offering code blocks to `processors`.
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedFence`] in strict mode when a code fence
/// is never closed.
pub fn parse_with_processors(
    source: &str,
    options: &ParseOptions,
    processors: &mut [Box<dyn CodeBlockProcessor>],
    ctx: &ProcessContext<'_>,
) -> Result<ParsedDocument, ParseError> {
    TreeBuilder::new(source, options, processors, Some(ctx)).build()
}

/// Parse a short inline Markdown fragment.
///
/// A fragment that forms a single paragraph is unwrapped to its inline
/// children.
#[must_use]
pub fn parse_inline(text: &str) -> Vec<Node> {
    let Ok(mut root) = parse_document(text, &ParseOptions::default()) else {
        return vec![Node::text(text)];
    };
    if root.children.len() == 1 && root.children[0].kind == NodeKind::Paragraph {
        return root.children.swap_remove(0).children;
    }
    root.children
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Fenced code block being collected.
struct PendingCode {
    language: Option<String>,
    attrs: HashMap<String, String>,
    content: String,
    line: usize,
}

struct TreeBuilder<'s, 'p, 'c> {
    source: &'s str,
    source_path: Option<PathBuf>,
    first_line: usize,
    strict: bool,
    line_starts: Vec<usize>,
    stack: Vec<Node>,
    table_cols: Vec<usize>,
    code: Option<PendingCode>,
    id_counts: HashMap<String, usize>,
    processors: &'p mut [Box<dyn CodeBlockProcessor>],
    ctx: Option<&'c ProcessContext<'c>>,
    warnings: Vec<String>,
}

impl<'s, 'p, 'c> TreeBuilder<'s, 'p, 'c> {
    fn new(
        source: &'s str,
        options: &ParseOptions,
        processors: &'p mut [Box<dyn CodeBlockProcessor>],
        ctx: Option<&'c ProcessContext<'c>>,
    ) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            source_path: options.source_path.clone(),
            first_line: options.first_line,
            strict: options.strict,
            line_starts,
            stack: vec![Node::new(NodeKind::Document)],
            table_cols: Vec::new(),
            code: None,
            id_counts: HashMap::new(),
            processors,
            ctx,
            warnings: Vec::new(),
        }
    }

    fn build(mut self) -> Result<ParsedDocument, ParseError> {
        if let Some(index) = unterminated_fence(self.source) {
            let location = self.source_info_at_line(index);
            if self.strict {
                return Err(ParseError::UnterminatedFence { location });
            }
            tracing::warn!(location = %location, "Unterminated code fence");
            self.warnings
                .push(format!("{location}: unterminated code fence"));
        }

        let source = self.source;
        for (event, range) in Parser::new_ext(source, parser_options()).into_offset_iter() {
            let info = self.source_info(range.start);
            self.process_event(event, info);
        }

        // Fold unclosed nodes into their parents.
        while self.stack.len() > 1 {
            self.pop_node();
        }

        let mut root = self.stack.pop().unwrap_or_else(|| Node::new(NodeKind::Document));
        root.source = Some(SourceInfo::new(self.source_path.clone(), self.first_line));

        Ok(ParsedDocument {
            root,
            warnings: self.warnings,
        })
    }

    fn source_info(&self, offset: usize) -> SourceInfo {
        let index = self.line_starts.partition_point(|&start| start <= offset);
        self.source_info_at_line(index.saturating_sub(1))
    }

    fn source_info_at_line(&self, index: usize) -> SourceInfo {
        SourceInfo::new(self.source_path.clone(), self.first_line + index)
    }

    fn process_event(&mut self, event: Event<'_>, info: SourceInfo) {
        match event {
            Event::Start(tag) => self.start_tag(tag, info),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if let Some(code) = &mut self.code {
                    code.content.push_str(&text);
                } else {
                    self.push_child(Node::text(&*text));
                }
            }
            Event::Code(code) => self.push_child(Node::new(NodeKind::Literal(code.to_string()))),
            Event::Html(html) | Event::InlineHtml(html) => self.push_child(Node::new(NodeKind::Raw {
                format: "html".to_owned(),
                content: html.to_string(),
            })),
            Event::SoftBreak => self.push_child(Node::new(NodeKind::SoftBreak)),
            Event::HardBreak => self.push_child(Node::new(NodeKind::HardBreak)),
            Event::Rule => self.push_child(Node::new(NodeKind::Rule).with_source(info)),
            Event::TaskListMarker(checked) => {
                self.push_child(Node::text(if checked { "[x] " } else { "[ ] " }));
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, info: SourceInfo) {
        let node = match tag {
            Tag::Paragraph => Node::new(NodeKind::Paragraph),
            Tag::Heading {
                level, id, classes, ..
            } => {
                let mut node = Node::new(NodeKind::Heading {
                    level: heading_level_to_num(level),
                    explicit_id: id.is_some(),
                });
                node.id = id.map(|id| id.to_string());
                for class in classes {
                    node.add_class(&*class);
                }
                node
            }
            Tag::BlockQuote(_) => Node::new(NodeKind::BlockQuote),
            Tag::CodeBlock(kind) => {
                let (language, attrs) = match kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(&info),
                    CodeBlockKind::Indented => (None, HashMap::new()),
                };
                self.code = Some(PendingCode {
                    language,
                    attrs,
                    content: String::new(),
                    line: info.line,
                });
                return;
            }
            Tag::HtmlBlock => return,
            Tag::List(start) => Node::new(NodeKind::List { start }),
            Tag::Item => Node::new(NodeKind::ListItem),
            Tag::Table(alignments) => {
                self.table_cols.push(alignments.len());
                Node::new(NodeKind::Table)
            }
            Tag::TableHead => Node::new(NodeKind::THead),
            Tag::TableRow => Node::new(NodeKind::Row),
            Tag::TableCell => Node::new(NodeKind::Entry),
            Tag::Emphasis => Node::new(NodeKind::Emphasis),
            Tag::Strong => Node::new(NodeKind::Strong),
            Tag::Strikethrough => Node::new(NodeKind::Strikethrough),
            Tag::Link { dest_url, .. } => {
                let url = dest_url.to_string();
                if url.starts_with('#') || url.starts_with("ref:") {
                    Node::new(NodeKind::PendingXref { target: url })
                } else {
                    Node::new(NodeKind::Link { url })
                }
            }
            Tag::Image { dest_url, .. } => Node::new(NodeKind::Image {
                uri: dest_url.to_string(),
                alt: String::new(),
            }),
            Tag::Superscript | Tag::Subscript => Node::new(NodeKind::Inline),
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_) => Node::new(NodeKind::Container),
        };
        self.stack.push(node.with_source(info));
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::HtmlBlock => {}
            _ => self.pop_node(),
        }
    }

    fn pop_node(&mut self) {
        let Some(mut node) = self.stack.pop() else {
            return;
        };
        match node.kind {
            NodeKind::Heading { .. } => self.assign_heading_id(&mut node),
            NodeKind::Image { .. } => {
                let text: String = node.children.drain(..).map(|c| c.astext()).collect();
                if let NodeKind::Image { alt, .. } = &mut node.kind {
                    *alt = text;
                }
            }
            NodeKind::Table => {
                let cols = self.table_cols.pop().unwrap_or_default();
                restructure_table(&mut node, cols);
            }
            _ => {}
        }
        self.push_child(node);
    }

    fn assign_heading_id(&mut self, node: &mut Node) {
        let id = match node.id.take() {
            Some(explicit) => {
                *self.id_counts.entry(explicit.clone()).or_default() += 1;
                explicit
            }
            None => {
                let base_id = slugify(&node.astext());
                let count = self.id_counts.entry(base_id.clone()).or_default();
                let id = match *count {
                    0 => base_id,
                    n => format!("{base_id}-{n}"),
                };
                *count += 1;
                id
            }
        };
        node.id = Some(id);
    }

    /// Append a child to the innermost open node, merging adjacent text.
    fn push_child(&mut self, node: Node) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        if let (Some(last), NodeKind::Text(text)) = (parent.children.last_mut(), &node.kind)
            && let NodeKind::Text(existing) = &mut last.kind
        {
            existing.push_str(text);
            return;
        }
        parent.children.push(node);
    }

    fn finish_code_block(&mut self) {
        let Some(pending) = self.code.take() else {
            return;
        };
        let mut content = pending.content;
        if content.ends_with('\n') {
            content.pop();
        }
        let block = CodeBlock {
            language: pending.language,
            attrs: pending.attrs,
            content,
            line: pending.line,
            source_path: self.source_path.clone(),
        };

        for node in self.process_code_block(&block) {
            self.push_child(node);
        }
    }

    fn process_code_block(&mut self, block: &CodeBlock) -> Vec<Node> {
        if let (Some(ctx), Some(_)) = (self.ctx, &block.language) {
            for processor in self.processors.iter_mut() {
                match processor.process(block, ctx) {
                    Ok(ProcessResult::Replace(nodes)) => return nodes,
                    Ok(ProcessResult::PassThrough) => {}
                    Err(e) => {
                        let location = block.source_info();
                        tracing::warn!(
                            location = %location,
                            error = %e,
                            "Code block directive failed"
                        );
                        self.warnings.push(format!("{location}: {e}"));
                        return vec![error_message(&e.to_string(), location)];
                    }
                }
            }
        }
        vec![literal_block(block, &block.content)]
    }
}

/// Error system message shown in place of a failed block.
fn error_message(message: &str, location: SourceInfo) -> Node {
    Node::new(NodeKind::SystemMessage {
        level: MessageLevel::Error,
    })
    .with_class("system-message")
    .with_children(vec![
        Node::new(NodeKind::Paragraph).with_children(vec![Node::text(format!(
            "{location}: {message}"
        ))]),
    ])
    .with_source(location)
}

/// Turn pulldown-cmark's flat table shape into `table > tgroup > colspec* > thead? > tbody`.
fn restructure_table(table: &mut Node, cols: usize) {
    let mut tgroup = Node::new(NodeKind::TGroup { cols });
    for _ in 0..cols {
        tgroup.push(Node::new(NodeKind::ColSpec {
            width: 1,
            stub: false,
        }));
    }

    let mut tbody = Node::new(NodeKind::TBody);
    for child in std::mem::take(&mut table.children) {
        if child.kind == NodeKind::THead {
            let already_rows = child
                .children
                .first()
                .is_some_and(|c| c.kind == NodeKind::Row);
            let head = if already_rows {
                child
            } else {
                let row = Node::new(NodeKind::Row).with_children(child.children);
                Node::new(NodeKind::THead).with_children(vec![row])
            };
            tgroup.push(head);
        } else {
            tbody.push(child);
        }
    }
    if !tbody.children.is_empty() {
        tgroup.push(tbody);
    }

    table.children = vec![tgroup];
}
