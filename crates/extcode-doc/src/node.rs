//! Document tree nodes.
//!
//! Every parsed document, directive output and sandboxed fragment is a tree of
//! [`Node`]s. Nodes carry a [`NodeKind`], an optional id, style classes and the
//! source position they came from.

use std::fmt;
use std::path::PathBuf;

/// Source position of a node, used in diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceInfo {
    /// Path of the source file (if known).
    pub path: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
}

impl SourceInfo {
    /// Create a source position.
    #[must_use]
    pub fn new(path: Option<PathBuf>, line: usize) -> Self {
        Self { path, line }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}", path.display(), self.line),
            None => write!(f, "<string>:{}", self.line),
        }
    }
}

/// Severity of a [`NodeKind::SystemMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Warning,
    Error,
}

impl MessageLevel {
    /// Lowercase name used in class names and plain-text output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Kind of a document tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading {
        level: u8,
        /// Whether the id was written in the source (`{#id}`) rather than generated.
        explicit_id: bool,
    },
    Text(String),
    Emphasis,
    Strong,
    Strikethrough,
    /// Inline code.
    Literal(String),
    Link {
        url: String,
    },
    /// Cross-reference waiting for resolution (`#id` or `ref:id`).
    PendingXref {
        target: String,
    },
    Image {
        uri: String,
        alt: String,
    },
    BlockQuote,
    List {
        start: Option<u64>,
    },
    ListItem,
    /// Code block; the code is held by a single [`NodeKind::Text`] child.
    LiteralBlock {
        language: Option<String>,
        linenos: bool,
    },
    /// Pre-rendered output, emitted only by the writer for `format`.
    Raw {
        format: String,
        content: String,
    },
    Rule,
    SoftBreak,
    HardBreak,
    Table,
    TGroup {
        cols: usize,
    },
    ColSpec {
        width: u32,
        stub: bool,
    },
    THead,
    TBody,
    Row,
    Entry,
    Container,
    Caption,
    Inline,
    LineBlock,
    Line,
    Abbreviation {
        explanation: String,
    },
    FieldList,
    Field,
    FieldName,
    FieldBody,
    /// Children are written only when the builder's hypertext capability matches.
    Only {
        hypertext: bool,
    },
    SystemMessage {
        level: MessageLevel,
    },
    /// Extension node rendered through the [`NodeRegistry`](crate::NodeRegistry).
    Custom(&'static str),
}

impl NodeKind {
    /// Element name used by the pseudo-XML writer and in diagnostics.
    #[must_use]
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Paragraph => "paragraph",
            Self::Heading { .. } => "title",
            Self::Text(_) => "#text",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Strikethrough => "strikethrough",
            Self::Literal(_) => "literal",
            Self::Link { .. } => "reference",
            Self::PendingXref { .. } => "pending_xref",
            Self::Image { .. } => "image",
            Self::BlockQuote => "block_quote",
            Self::List { start: Some(_) } => "enumerated_list",
            Self::List { start: None } => "bullet_list",
            Self::ListItem => "list_item",
            Self::LiteralBlock { .. } => "literal_block",
            Self::Raw { .. } => "raw",
            Self::Rule => "transition",
            Self::SoftBreak => "soft_break",
            Self::HardBreak => "hard_break",
            Self::Table => "table",
            Self::TGroup { .. } => "tgroup",
            Self::ColSpec { .. } => "colspec",
            Self::THead => "thead",
            Self::TBody => "tbody",
            Self::Row => "row",
            Self::Entry => "entry",
            Self::Container => "container",
            Self::Caption => "caption",
            Self::Inline => "inline",
            Self::LineBlock => "line_block",
            Self::Line => "line",
            Self::Abbreviation { .. } => "abbreviation",
            Self::FieldList => "field_list",
            Self::Field => "field",
            Self::FieldName => "field_name",
            Self::FieldBody => "field_body",
            Self::Only { .. } => "only",
            Self::SystemMessage { .. } => "system_message",
            Self::Custom(name) => *name,
        }
    }
}

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub source: Option<SourceInfo>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node of the given kind.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            source: None,
            children: Vec::new(),
        }
    }

    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    /// Create an inline node wrapping a single text node.
    #[must_use]
    pub fn inline_text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Inline).with_children(vec![Self::text(text)])
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Append a child node.
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Add a class unless it is already present.
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Plain text content of this node and all descendants.
    #[must_use]
    pub fn astext(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(text) | NodeKind::Literal(text) => out.push_str(text),
            NodeKind::SoftBreak => out.push(' '),
            NodeKind::HardBreak => out.push('\n'),
            NodeKind::Image { alt, .. } => out.push_str(alt),
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Visit this node and all descendants in document order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Mutable pre-order traversal.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// All nodes (including this one) matching the predicate, in document order.
    pub fn find_all(&self, pred: impl Fn(&Node) -> bool) -> Vec<&Node> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if pred(node) {
                found.push(node);
            }
        });
        found
    }

    /// Remove every descendant matching the predicate, returning how many were removed.
    ///
    /// The node itself is never removed; matched nodes are dropped with their subtrees.
    pub fn remove_matching(&mut self, pred: &dyn Fn(&Node) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|child| !pred(child));
        let mut removed = before - self.children.len();
        for child in &mut self.children {
            removed += child.remove_matching(pred);
        }
        removed
    }
}
