//! Pseudo-XML writer.
//!
//! Writes one element per line, children indented by four spaces and no
//! closing tags. Useful for inspecting tree structure.

use std::fmt::Write;

use super::Translator;
use crate::builder::OutputFormat;
use crate::node::{Node, NodeKind};
use crate::util::escape_html;

const INDENT: &str = "    ";

#[derive(Default)]
pub(super) struct XmlTranslator {
    output: String,
    depth: usize,
}

impl XmlTranslator {
    pub(super) fn finish(self) -> String {
        self.output
    }

    fn write_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.output.push_str(&INDENT.repeat(self.depth));
            self.output.push_str(line);
            self.output.push('\n');
        }
    }
}

/// Element attributes beyond ids and classes.
fn attributes(kind: &NodeKind) -> Vec<(&'static str, String)> {
    match kind {
        NodeKind::Heading { level, .. } => vec![("level", level.to_string())],
        NodeKind::Link { url } => vec![("refuri", url.clone())],
        NodeKind::PendingXref { target } => vec![("reftarget", target.clone())],
        NodeKind::Image { uri, alt } => vec![("uri", uri.clone()), ("alt", alt.clone())],
        NodeKind::List { start: Some(start) } => vec![("start", start.to_string())],
        NodeKind::LiteralBlock { language, linenos } => {
            let mut attrs = Vec::new();
            if let Some(language) = language {
                attrs.push(("language", language.clone()));
            }
            if *linenos {
                attrs.push(("linenos", "True".to_owned()));
            }
            attrs
        }
        NodeKind::Raw { format, .. } => vec![("format", format.clone())],
        NodeKind::TGroup { cols } => vec![("cols", cols.to_string())],
        NodeKind::ColSpec { width, stub } => {
            let mut attrs = vec![("colwidth", width.to_string())];
            if *stub {
                attrs.push(("stub", "1".to_owned()));
            }
            attrs
        }
        NodeKind::Abbreviation { explanation } => vec![("explanation", explanation.clone())],
        NodeKind::Only { hypertext } => vec![("hypertext", hypertext.to_string())],
        NodeKind::SystemMessage { level } => vec![("type", level.as_str().to_uppercase())],
        _ => Vec::new(),
    }
}

impl Translator for XmlTranslator {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xml
    }

    fn out(&mut self) -> &mut String {
        &mut self.output
    }

    fn enter(&mut self, node: &Node) -> bool {
        if let NodeKind::Text(text) = &node.kind {
            self.write_lines(text);
            return false;
        }

        self.output.push_str(&INDENT.repeat(self.depth));
        write!(self.output, "<{}", node.kind.tag_name()).ok();
        if let Some(id) = &node.id {
            write!(self.output, r#" ids="{}""#, escape_html(id)).ok();
        }
        if !node.classes.is_empty() {
            write!(self.output, r#" classes="{}""#, escape_html(&node.classes.join(" "))).ok();
        }
        for (name, value) in attributes(&node.kind) {
            write!(self.output, r#" {name}="{}""#, escape_html(&value)).ok();
        }
        self.output.push_str(">\n");
        self.depth += 1;

        match &node.kind {
            NodeKind::Literal(code) => {
                self.write_lines(code);
                false
            }
            NodeKind::Raw { content, .. } => {
                self.write_lines(content);
                false
            }
            _ => true,
        }
    }

    fn exit(&mut self, node: &Node) {
        if !matches!(node.kind, NodeKind::Text(_)) {
            self.depth = self.depth.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builder::Builder;
    use crate::parser::{ParseOptions, parse_document};
    use crate::writer::{NodeRegistry, render};

    #[test]
    fn test_pseudo_xml() {
        let tree = parse_document("# Hi\n\nSee `x`.\n", &ParseOptions::default()).unwrap();
        let builder = Builder::from_name("pseudoxml").unwrap();
        let out = render(&tree, &builder, &NodeRegistry::new()).unwrap();
        assert_eq!(
            out,
            "<document>\n    <title ids=\"hi\" level=\"1\">\n        Hi\n    <paragraph>\n        See \n        <literal>\n            x\n        .\n"
        );
    }
}
