//! HTML writer.

use std::fmt::Write;

use super::{Translator, starttag, starttag_with};
use crate::builder::OutputFormat;
use crate::node::{Node, NodeKind};
use crate::util::escape_html;

#[derive(Default)]
pub(super) struct HtmlTranslator {
    output: String,
    /// Whether entries are currently inside a table head.
    in_head: bool,
    /// Stub flags of the innermost table's columns.
    stubs: Vec<bool>,
    /// Zero-based column of the next entry in the current row.
    column: usize,
}

impl HtmlTranslator {
    pub(super) fn finish(self) -> String {
        self.output
    }

    fn open(&mut self, node: &Node, tag: &str) {
        self.output.push_str(&starttag(node, tag));
    }

    fn open_classed(&mut self, node: &Node, tag: &str, classes: &[&str]) {
        self.output.push_str(&starttag_with(node, tag, &[], classes));
    }

    fn close(&mut self, tag: &str) {
        write!(self.output, "</{tag}>").ok();
    }

    fn colgroup(&mut self, tgroup: &Node) {
        let widths: Vec<(u32, bool)> = tgroup
            .children
            .iter()
            .filter_map(|child| match child.kind {
                NodeKind::ColSpec { width, stub } => Some((width, stub)),
                _ => None,
            })
            .collect();
        self.stubs = widths.iter().map(|(_, stub)| *stub).collect();

        let total: u32 = widths.iter().map(|(width, _)| width).sum();
        if total == 0 {
            return;
        }
        self.output.push_str("<colgroup>");
        for (width, _) in &widths {
            write!(self.output, r#"<col style="width: {}%" />"#, width * 100 / total).ok();
        }
        self.output.push_str("</colgroup>\n");
    }

    fn entry_tag(&self) -> &'static str {
        let stub = self.stubs.get(self.column).copied().unwrap_or(false);
        if self.in_head || stub { "th" } else { "td" }
    }
}

impl Translator for HtmlTranslator {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn out(&mut self) -> &mut String {
        &mut self.output
    }

    #[allow(clippy::too_many_lines)]
    fn enter(&mut self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Document | NodeKind::ColSpec { .. } | NodeKind::Field => {}
            NodeKind::Paragraph => self.open(node, "p"),
            NodeKind::Heading { level, .. } => self.open(node, &format!("h{level}")),
            NodeKind::Text(text) => {
                self.output.push_str(&escape_html(text));
                return false;
            }
            NodeKind::Emphasis => self.open(node, "em"),
            NodeKind::Strong => self.open(node, "strong"),
            NodeKind::Strikethrough => self.open(node, "del"),
            NodeKind::Literal(code) => {
                self.open(node, "code");
                self.output.push_str(&escape_html(code));
                return false;
            }
            NodeKind::Link { url } => {
                self.output
                    .push_str(&starttag_with(node, "a", &[("href", url)], &[]));
            }
            NodeKind::PendingXref { .. } | NodeKind::Inline | NodeKind::Only { .. } => {
                self.open(node, "span");
            }
            NodeKind::Image { uri, alt } => {
                write!(
                    self.output,
                    r#"<img src="{}" alt="{}" />"#,
                    escape_html(uri),
                    escape_html(alt)
                )
                .ok();
                return false;
            }
            NodeKind::BlockQuote => self.open(node, "blockquote"),
            NodeKind::List { start: None } => self.open(node, "ul"),
            NodeKind::List { start: Some(1) } => self.open(node, "ol"),
            NodeKind::List { start: Some(n) } => {
                write!(self.output, r#"<ol start="{n}">"#).ok();
            }
            NodeKind::ListItem => self.open(node, "li"),
            NodeKind::LiteralBlock { language, linenos } => {
                if *linenos {
                    self.open_classed(node, "pre", &["literal-block", "linenos"]);
                } else {
                    self.open_classed(node, "pre", &["literal-block"]);
                }
                match language {
                    Some(lang) => {
                        write!(self.output, r#"<code class="language-{}">"#, escape_html(lang))
                            .ok();
                    }
                    None => self.output.push_str("<code>"),
                }
                self.output.push_str(&escape_html(&node.astext()));
                self.output.push_str("</code></pre>\n");
                return false;
            }
            NodeKind::Raw { format, content } => {
                if format == "html" {
                    self.output.push_str(content);
                }
                return false;
            }
            NodeKind::Rule => {
                self.output.push_str("<hr />\n");
                return false;
            }
            NodeKind::SoftBreak => {
                self.output.push('\n');
                return false;
            }
            NodeKind::HardBreak => {
                self.output.push_str("<br />\n");
                return false;
            }
            NodeKind::Table => {
                self.open(node, "table");
                self.output.push('\n');
            }
            NodeKind::TGroup { .. } => self.colgroup(node),
            NodeKind::THead => {
                self.in_head = true;
                self.open(node, "thead");
            }
            NodeKind::TBody => self.open(node, "tbody"),
            NodeKind::Row => {
                self.column = 0;
                self.open(node, "tr");
            }
            NodeKind::Entry => {
                let tag = self.entry_tag();
                if !self.in_head && tag == "th" {
                    self.open_classed(node, tag, &["stub"]);
                } else {
                    self.open(node, tag);
                }
            }
            NodeKind::Container => self.open(node, "div"),
            NodeKind::Caption => {
                self.open_classed(node, "div", &["code-block-caption"]);
            }
            NodeKind::LineBlock => {
                self.open_classed(node, "div", &["line-block"]);
            }
            NodeKind::Line => {
                self.open_classed(node, "div", &["line"]);
                if node.children.is_empty() {
                    self.output.push_str("<br />");
                }
            }
            NodeKind::Abbreviation { explanation } => {
                write!(self.output, r#"<abbr title="{}">"#, escape_html(explanation)).ok();
            }
            NodeKind::FieldList => {
                self.open_classed(node, "dl", &["field-list"]);
                self.output.push('\n');
            }
            NodeKind::FieldName => self.open(node, "dt"),
            NodeKind::FieldBody => self.open(node, "dd"),
            NodeKind::SystemMessage { level } => {
                self.open_classed(node, "div", &[level.as_str()]);
            }
            NodeKind::Custom(_) => {}
        }
        true
    }

    fn exit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Paragraph => {
                self.close("p");
                self.output.push('\n');
            }
            NodeKind::Heading { level, .. } => {
                self.close(&format!("h{level}"));
                self.output.push('\n');
            }
            NodeKind::Emphasis => self.close("em"),
            NodeKind::Strong => self.close("strong"),
            NodeKind::Strikethrough => self.close("del"),
            NodeKind::Literal(_) => self.close("code"),
            NodeKind::Link { .. } => self.close("a"),
            NodeKind::PendingXref { .. } | NodeKind::Inline | NodeKind::Only { .. } => {
                self.close("span");
            }
            NodeKind::BlockQuote => self.close("blockquote"),
            NodeKind::List { start: None } => self.close("ul"),
            NodeKind::List { start: Some(_) } => self.close("ol"),
            NodeKind::ListItem => self.close("li"),
            NodeKind::Table => self.output.push_str("</table>\n"),
            NodeKind::THead => {
                self.in_head = false;
                self.output.push_str("</thead>\n");
            }
            NodeKind::TBody => self.output.push_str("</tbody>\n"),
            NodeKind::Row => self.output.push_str("</tr>\n"),
            NodeKind::Entry => {
                let tag = self.entry_tag();
                self.close(tag);
                self.column += 1;
            }
            NodeKind::Container
            | NodeKind::Caption
            | NodeKind::LineBlock
            | NodeKind::SystemMessage { .. } => {
                self.output.push_str("</div>\n");
            }
            NodeKind::Line => self.close("div"),
            NodeKind::Abbreviation { .. } => self.close("abbr"),
            NodeKind::FieldList => self.output.push_str("</dl>\n"),
            NodeKind::FieldName => self.close("dt"),
            NodeKind::FieldBody => {
                self.close("dd");
                self.output.push('\n');
            }
            NodeKind::Document
            | NodeKind::Text(_)
            | NodeKind::Image { .. }
            | NodeKind::LiteralBlock { .. }
            | NodeKind::Raw { .. }
            | NodeKind::Rule
            | NodeKind::SoftBreak
            | NodeKind::HardBreak
            | NodeKind::TGroup { .. }
            | NodeKind::ColSpec { .. }
            | NodeKind::Field
            | NodeKind::Custom(_) => {}
        }
    }
}
