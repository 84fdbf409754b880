//! Plain-text writer.

use super::Translator;
use crate::builder::OutputFormat;
use crate::node::{Node, NodeKind};

#[derive(Default)]
pub(super) struct TextTranslator {
    output: String,
    /// Next item number per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// Zero-based column of the next entry in the current row.
    column: usize,
}

impl TextTranslator {
    pub(super) fn finish(self) -> String {
        self.output.trim_end().to_owned()
    }

    fn end_line(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }

    fn end_block(&mut self) {
        self.end_line();
        if !self.output.is_empty() && !self.output.ends_with("\n\n") {
            self.output.push('\n');
        }
    }
}

impl Translator for TextTranslator {
    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }

    fn out(&mut self) -> &mut String {
        &mut self.output
    }

    fn enter(&mut self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Heading { .. } => {
                let title = node.astext();
                self.output.push_str(&title);
                self.output.push('\n');
                self.output.push_str(&"=".repeat(title.chars().count()));
                self.end_block();
                return false;
            }
            NodeKind::Text(text) | NodeKind::Literal(text) => {
                self.output.push_str(text);
                return false;
            }
            NodeKind::Image { alt, .. } => {
                self.output.push('[');
                self.output.push_str(alt);
                self.output.push(']');
                return false;
            }
            NodeKind::LiteralBlock { .. } => {
                self.end_block();
                for line in node.astext().lines() {
                    self.output.push_str("    ");
                    self.output.push_str(line);
                    self.output.push('\n');
                }
                self.end_block();
                return false;
            }
            NodeKind::Raw { format, content } => {
                if format == "text" {
                    self.output.push_str(content);
                }
                return false;
            }
            NodeKind::Rule => {
                self.end_block();
                self.output.push_str("----");
                self.end_block();
                return false;
            }
            NodeKind::SoftBreak | NodeKind::HardBreak => {
                self.output.push('\n');
                return false;
            }
            NodeKind::List { start } => {
                self.end_line();
                self.lists.push(*start);
            }
            NodeKind::ListItem => {
                self.end_line();
                match self.lists.last_mut() {
                    Some(Some(number)) => {
                        self.output.push_str(&format!("{number}. "));
                        *number += 1;
                    }
                    _ => self.output.push_str("- "),
                }
            }
            NodeKind::Row => {
                self.end_line();
                self.column = 0;
            }
            NodeKind::Entry => {
                if self.column > 0 {
                    self.output.push_str(" | ");
                }
                self.column += 1;
            }
            NodeKind::FieldName => self.output.push(':'),
            NodeKind::SystemMessage { level } => {
                self.end_line();
                self.output.push_str(&level.as_str().to_uppercase());
                self.output.push_str(": ");
            }
            _ => {}
        }
        true
    }

    fn exit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Paragraph
            | NodeKind::BlockQuote
            | NodeKind::Table
            | NodeKind::LineBlock
            | NodeKind::FieldList
            | NodeKind::SystemMessage { .. } => self.end_block(),
            NodeKind::List { .. } => {
                self.lists.pop();
                self.end_block();
            }
            NodeKind::ListItem
            | NodeKind::Row
            | NodeKind::Line
            | NodeKind::Caption
            | NodeKind::Container
            | NodeKind::FieldBody => self.end_line(),
            NodeKind::Abbreviation { explanation } => {
                self.output.push_str(" (");
                self.output.push_str(explanation);
                self.output.push(')');
            }
            NodeKind::FieldName => self.output.push_str(": "),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builder::Builder;
    use crate::parser::{ParseOptions, parse_document};
    use crate::writer::{NodeRegistry, render};

    fn text(source: &str) -> String {
        let tree = parse_document(source, &ParseOptions::default()).unwrap();
        render(&tree, &Builder::text(), &NodeRegistry::new()).unwrap()
    }

    #[test]
    fn test_heading_and_paragraphs() {
        assert_eq!(
            text("# Title\n\nFirst *para*.\n\nSecond."),
            "Title\n=====\n\nFirst para.\n\nSecond."
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(text("- a\n- b\n"), "- a\n- b");
        assert_eq!(text("3. x\n4. y\n"), "3. x\n4. y");
    }

    #[test]
    fn test_code_block_indented() {
        assert_eq!(
            text("Intro\n\n```\nline 1\nline 2\n```\n"),
            "Intro\n\n    line 1\n    line 2"
        );
    }

    #[test]
    fn test_table_rows() {
        assert_eq!(text("| a | b |\n|---|---|\n| 1 | 2 |\n"), "a | b\n1 | 2");
    }
}
