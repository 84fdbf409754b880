//! Output writers.
//!
//! Each writer walks the document tree with a [`Translator`]. Built-in node
//! kinds are handled by the translator itself; [`NodeKind::Custom`] nodes are
//! dispatched through the [`NodeRegistry`] by node name and output format.

mod html;
mod text;
mod xml;

use std::collections::HashMap;

use crate::builder::{Builder, OutputFormat};
use crate::error::WriteError;
use crate::node::{Node, NodeKind};
use crate::util::escape_html;

/// Visit function for one side of a custom node.
pub type VisitFn = fn(&Node, &mut String);

/// Enter/exit pair for a custom node in one output format.
#[derive(Clone, Copy, Debug)]
pub struct NodeHandlers {
    pub enter: VisitFn,
    pub exit: VisitFn,
}

fn noop(_node: &Node, _out: &mut String) {}

impl NodeHandlers {
    /// Handlers that write nothing; children still render.
    pub const NOOP: Self = Self {
        enter: noop,
        exit: noop,
    };

    #[must_use]
    pub fn new(enter: VisitFn, exit: VisitFn) -> Self {
        Self { enter, exit }
    }
}

/// Custom node handlers keyed by node name and output format.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    handlers: HashMap<(&'static str, OutputFormat), NodeHandlers>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handlers, replacing any previous entry for the same key.
    pub fn register(&mut self, name: &'static str, format: OutputFormat, handlers: NodeHandlers) {
        self.handlers.insert((name, format), handlers);
    }

    #[must_use]
    pub fn get(&self, name: &'static str, format: OutputFormat) -> Option<NodeHandlers> {
        self.handlers.get(&(name, format)).copied()
    }
}

/// Per-format tree visitor.
pub(crate) trait Translator {
    fn format(&self) -> OutputFormat;

    fn out(&mut self) -> &mut String;

    /// Write the opening of `node`. Returns `false` when the translator has
    /// already written the node's content and children must be skipped.
    fn enter(&mut self, node: &Node) -> bool;

    fn exit(&mut self, node: &Node);
}

fn translate<T: Translator>(
    translator: &mut T,
    node: &Node,
    builder: &Builder,
    registry: &NodeRegistry,
) -> Result<(), WriteError> {
    match &node.kind {
        NodeKind::Only { hypertext } => {
            if *hypertext == builder.is_hypertext() {
                translate_children(translator, node, builder, registry)?;
            }
        }
        NodeKind::Custom(name) => {
            let name = *name;
            let format = translator.format();
            let handlers = registry
                .get(name, format)
                .ok_or(WriteError::UnknownNode { name, format })?;
            (handlers.enter)(node, translator.out());
            translate_children(translator, node, builder, registry)?;
            (handlers.exit)(node, translator.out());
        }
        _ => {
            if translator.enter(node) {
                translate_children(translator, node, builder, registry)?;
            }
            translator.exit(node);
        }
    }
    Ok(())
}

fn translate_children<T: Translator>(
    translator: &mut T,
    node: &Node,
    builder: &Builder,
    registry: &NodeRegistry,
) -> Result<(), WriteError> {
    for child in &node.children {
        translate(translator, child, builder, registry)?;
    }
    Ok(())
}

/// Render a tree with the writer for the builder's output format.
///
/// Rendering a [`NodeKind::Document`] yields the body only, with no page
/// wrapper.
///
/// # Errors
///
/// Returns [`WriteError::UnknownNode`] when a custom node has no handlers for
/// the output format.
pub fn render(
    node: &Node,
    builder: &Builder,
    registry: &NodeRegistry,
) -> Result<String, WriteError> {
    match builder.format() {
        OutputFormat::Html => {
            let mut translator = html::HtmlTranslator::default();
            translate(&mut translator, node, builder, registry)?;
            Ok(translator.finish())
        }
        OutputFormat::Text => {
            let mut translator = text::TextTranslator::default();
            translate(&mut translator, node, builder, registry)?;
            Ok(translator.finish())
        }
        OutputFormat::Xml => {
            let mut translator = xml::XmlTranslator::default();
            translate(&mut translator, node, builder, registry)?;
            Ok(translator.finish())
        }
    }
}

/// Opening HTML tag for `node` carrying its id and classes.
#[must_use]
pub fn starttag(node: &Node, tag: &str) -> String {
    starttag_with(node, tag, &[], &[])
}

/// Opening HTML tag with extra attributes and classes.
///
/// Extra classes go before the node's own, duplicates are skipped.
pub(crate) fn starttag_with(
    node: &Node,
    tag: &str,
    attrs: &[(&str, &str)],
    extra_classes: &[&str],
) -> String {
    let mut result = format!("<{tag}");
    for (name, value) in attrs {
        result.push_str(&format!(r#" {name}="{}""#, escape_html(value)));
    }
    if let Some(id) = &node.id {
        result.push_str(&format!(r#" id="{}""#, escape_html(id)));
    }

    let mut classes: Vec<&str> = extra_classes.to_vec();
    for class in &node.classes {
        if !classes.contains(&class.as_str()) {
            classes.push(class);
        }
    }
    if !classes.is_empty() {
        result.push_str(&format!(r#" class="{}""#, escape_html(&classes.join(" "))));
    }
    result.push('>');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_box(node: &Node, out: &mut String) {
        out.push_str(&starttag(node, "section"));
    }

    fn close_box(_node: &Node, out: &mut String) {
        out.push_str("</section>");
    }

    fn boxed() -> Node {
        Node::new(NodeKind::Custom("box"))
            .with_class("outer")
            .with_children(vec![Node::text("inside")])
    }

    #[test]
    fn test_starttag() {
        let node = Node::new(NodeKind::Container)
            .with_id("x")
            .with_class("a")
            .with_class("b");
        assert_eq!(starttag(&node, "div"), r#"<div id="x" class="a b">"#);
        assert_eq!(starttag(&Node::new(NodeKind::Container), "div"), "<div>");
    }

    #[test]
    fn test_custom_node_dispatch() {
        let mut registry = NodeRegistry::new();
        registry.register("box", OutputFormat::Html, NodeHandlers::new(open_box, close_box));
        let html = render(&boxed(), &Builder::html(), &registry).unwrap();
        assert_eq!(html, r#"<section class="outer">inside</section>"#);
    }

    #[test]
    fn test_custom_node_noop_handlers() {
        let mut registry = NodeRegistry::new();
        registry.register("box", OutputFormat::Text, NodeHandlers::NOOP);
        let text = render(&boxed(), &Builder::text(), &registry).unwrap();
        assert_eq!(text, "inside");
    }

    #[test]
    fn test_custom_node_missing_handler() {
        let registry = NodeRegistry::new();
        let err = render(&boxed(), &Builder::html(), &registry).unwrap_err();
        assert!(matches!(
            err,
            WriteError::UnknownNode {
                name: "box",
                format: OutputFormat::Html
            }
        ));
    }

    #[test]
    fn test_only_follows_hypertext_capability() {
        let tree = Node::new(NodeKind::Document).with_children(vec![
            Node::new(NodeKind::Only { hypertext: true }).with_children(vec![Node::text("web")]),
            Node::new(NodeKind::Only { hypertext: false }).with_children(vec![Node::text("print")]),
        ]);
        let registry = NodeRegistry::new();
        assert_eq!(render(&tree, &Builder::html(), &registry).unwrap(), "web");
        assert_eq!(render(&tree, &Builder::text(), &registry).unwrap(), "print");
    }
}
