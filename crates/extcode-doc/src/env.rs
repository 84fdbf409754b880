//! Build environment: documents, labels and reference resolution.
//!
//! Labels registered while processing a document go into a [`SymbolScope`]
//! first. The scope reads through to the shared [`SymbolTable`] but never
//! writes to it; the owner decides whether to commit the scope's targets.
//! That is what lets a nested render run against the shared environment
//! without leaving anything behind.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::builder::Builder;
use crate::error::{BuildError, DomainError};
use crate::node::{Node, NodeKind};
use crate::writer::{NodeRegistry, render};

/// A cross-reference target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub docname: String,
    pub id: String,
    pub title: String,
    /// Whether the label was written in the source rather than generated.
    pub explicit: bool,
}

/// Labels of every committed document.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    labels: BTreeMap<String, HashMap<String, Target>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a label within one document.
    #[must_use]
    pub fn get(&self, docname: &str, id: &str) -> Option<&Target> {
        self.labels.get(docname)?.get(id)
    }

    /// Look up a label in any document, in document name order.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Target> {
        self.labels.values().find_map(|targets| targets.get(id))
    }

    /// Add targets, replacing existing entries with the same document and id.
    pub fn commit(&mut self, targets: impl IntoIterator<Item = Target>) {
        for target in targets {
            self.labels
                .entry(target.docname.clone())
                .or_default()
                .insert(target.id.clone(), target);
        }
    }

    /// Forget every label of a document.
    pub fn clear_document(&mut self, docname: &str) {
        self.labels.remove(docname);
    }

    /// Total number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Label scope for one document, layered over a read-only [`SymbolTable`].
#[derive(Debug)]
pub struct SymbolScope<'a> {
    base: &'a SymbolTable,
    docname: String,
    local: HashMap<String, Target>,
}

impl<'a> SymbolScope<'a> {
    #[must_use]
    pub fn new(base: &'a SymbolTable, docname: impl Into<String>) -> Self {
        Self {
            base,
            docname: docname.into(),
            local: HashMap::new(),
        }
    }

    #[must_use]
    pub fn docname(&self) -> &str {
        &self.docname
    }

    /// Register a label in this scope.
    ///
    /// A second explicit label with the same id is an error; a generated one
    /// is silently skipped.
    pub fn register(&mut self, target: Target) -> Result<(), DomainError> {
        if self.local.contains_key(&target.id) {
            if target.explicit {
                return Err(DomainError::DuplicateLabel {
                    label: target.id,
                    docname: self.docname.clone(),
                });
            }
            return Ok(());
        }
        self.local.insert(target.id.clone(), target);
        Ok(())
    }

    /// Look up a label of this document.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&Target> {
        self.local
            .get(id)
            .or_else(|| self.base.get(&self.docname, id))
    }

    /// Look up a label in this scope, then in any committed document.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Target> {
        self.local.get(id).or_else(|| self.base.find(id))
    }

    /// Labels registered in this scope, for committing.
    #[must_use]
    pub fn into_targets(self) -> Vec<Target> {
        self.local.into_values().collect()
    }
}

/// Post-parse processing that registers labels.
pub trait Domain {
    fn name(&self) -> &'static str;

    /// Register the document's labels in `scope`.
    fn process_doc(&self, scope: &mut SymbolScope<'_>, tree: &Node) -> Result<(), DomainError>;
}

/// The standard domain: headings and nodes with an explicit id become labels.
#[derive(Debug, Default)]
pub struct StdDomain;

impl Domain for StdDomain {
    fn name(&self) -> &'static str {
        "std"
    }

    fn process_doc(&self, scope: &mut SymbolScope<'_>, tree: &Node) -> Result<(), DomainError> {
        let mut targets = Vec::new();
        tree.walk(&mut |node| {
            let Some(id) = &node.id else {
                return;
            };
            let (title, explicit) = match &node.kind {
                NodeKind::Heading { explicit_id, .. } => (node.astext(), *explicit_id),
                NodeKind::Container => {
                    let caption = node
                        .children
                        .iter()
                        .find(|c| c.kind == NodeKind::Caption)
                        .map(Node::astext)
                        .unwrap_or_default();
                    (caption, true)
                }
                _ => (String::new(), true),
            };
            targets.push(Target {
                docname: scope.docname().to_owned(),
                id: id.clone(),
                title,
                explicit,
            });
        });

        for target in targets {
            scope.register(target)?;
        }
        Ok(())
    }
}

/// Environment capabilities used by directives that render nested content.
///
/// Call order for a fragment is fixed: [`process_doc`](Self::process_doc),
/// then [`resolve_references`](Self::resolve_references), then
/// [`render_fragment`](Self::render_fragment).
pub trait BuildEnvironment {
    /// Committed labels of every document.
    fn symbols(&self) -> &SymbolTable;

    /// Run every domain over `tree`, registering labels into `scope`.
    fn process_doc(&self, scope: &mut SymbolScope<'_>, tree: &Node) -> Result<(), BuildError>;

    /// Replace pending cross-references in `tree` with links.
    ///
    /// Returns warnings for references that could not be resolved.
    fn resolve_references(
        &self,
        scope: &SymbolScope<'_>,
        tree: &mut Node,
        builder: &Builder,
    ) -> Result<Vec<String>, BuildError>;

    /// Render `tree` with the builder's writer, body only.
    fn render_fragment(&self, tree: &Node, builder: &Builder) -> Result<String, BuildError>;
}

/// The build environment.
pub struct Environment {
    documents: BTreeSet<String>,
    symbols: SymbolTable,
    domains: Vec<Box<dyn Domain>>,
    registry: NodeRegistry,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment with the standard domain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: BTreeSet::new(),
            symbols: SymbolTable::new(),
            domains: vec![Box::new(StdDomain)],
            registry: NodeRegistry::new(),
        }
    }

    /// Register a document name.
    pub fn add_document(&mut self, docname: impl Into<String>) {
        self.documents.insert(docname.into());
    }

    #[must_use]
    pub fn has_document(&self, docname: &str) -> bool {
        self.documents.contains(docname)
    }

    #[must_use]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    /// Replace a document's labels with the targets of a finished scope.
    pub fn commit(&mut self, docname: &str, targets: Vec<Target>) {
        self.symbols.clear_document(docname);
        self.symbols.commit(targets);
    }

    fn resolve_node(
        &self,
        scope: &SymbolScope<'_>,
        node: &mut Node,
        builder: &Builder,
        warnings: &mut Vec<String>,
    ) {
        if let NodeKind::PendingXref { target } = &node.kind {
            let target = target.clone();
            match self.resolve_target(scope, &target, builder) {
                Some(url) => {
                    node.kind = NodeKind::Link { url };
                    node.add_class("xref");
                }
                None => {
                    let location = node
                        .source
                        .as_ref()
                        .map_or_else(|| scope.docname().to_owned(), ToString::to_string);
                    tracing::warn!(
                        document = scope.docname(),
                        target = %target,
                        "Unresolved reference"
                    );
                    warnings.push(format!("{location}: unresolved reference '{target}'"));
                    node.kind = NodeKind::Inline;
                    node.add_class("xref-unresolved");
                }
            }
        }

        for child in &mut node.children {
            self.resolve_node(scope, child, builder, warnings);
        }
    }

    /// URL for a pending reference, `None` when the label is unknown.
    ///
    /// Forms: `#id` (this document), `ref:id` (any document), `ref:doc#id`
    /// and `ref:doc` (a named document).
    fn resolve_target(
        &self,
        scope: &SymbolScope<'_>,
        target: &str,
        builder: &Builder,
    ) -> Option<String> {
        let here = scope.docname();

        if let Some(id) = target.strip_prefix('#') {
            return scope.lookup(id).map(|t| format!("#{}", t.id));
        }

        let reference = target.strip_prefix("ref:")?;

        if let Some((docname, id)) = reference.split_once('#') {
            let found = if docname == here {
                scope.lookup(id)
            } else {
                self.symbols.get(docname, id)
            };
            return found.map(|t| self.link_to(here, t, builder));
        }

        if let Some(found) = scope.find(reference) {
            return Some(self.link_to(here, found, builder));
        }
        if self.has_document(reference) {
            return Some(builder.relative_uri(here, reference));
        }
        None
    }

    fn link_to(&self, from: &str, target: &Target, builder: &Builder) -> String {
        if target.docname == from {
            format!("#{}", target.id)
        } else {
            format!("{}#{}", builder.relative_uri(from, &target.docname), target.id)
        }
    }
}

impl BuildEnvironment for Environment {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn process_doc(&self, scope: &mut SymbolScope<'_>, tree: &Node) -> Result<(), BuildError> {
        if !self.has_document(scope.docname()) {
            return Err(BuildError::UnknownDocument(scope.docname().to_owned()));
        }
        for domain in &self.domains {
            tracing::debug!(domain = domain.name(), document = scope.docname(), "Processing");
            domain.process_doc(scope, tree)?;
        }
        Ok(())
    }

    fn resolve_references(
        &self,
        scope: &SymbolScope<'_>,
        tree: &mut Node,
        builder: &Builder,
    ) -> Result<Vec<String>, BuildError> {
        let mut warnings = Vec::new();
        self.resolve_node(scope, tree, builder, &mut warnings);
        Ok(warnings)
    }

    fn render_fragment(&self, tree: &Node, builder: &Builder) -> Result<String, BuildError> {
        Ok(render(tree, builder, &self.registry)?)
    }
}
