//! Line annotations.
//!
//! A content line may end in a marker, `#:label:`. Markers are stripped from
//! the content before it is shown or rendered, and each marked line is mapped
//! to its label and the label's explanation from the `annotations` field list.
//!
//! ```text
//! x = 1  #:a:        ->  x = 1      line 0: a = "Alpha"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use extcode_doc::{Node, NodeKind, SourceInfo, parse_inline};
use regex::Regex;

use crate::error::FieldListError;

/// Trailing `#:label:` marker. Group 1 is the code before it, group 2 the label.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\S)\s*#:([^:]+):$").unwrap());

/// Field list entry `:label: explanation`.
static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([^:]+):(?:\s+(.*))?$").unwrap());

/// Content lines of one code block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentBlock {
    pub lines: Vec<String>,
    pub source_path: Option<PathBuf>,
    /// Source line of `lines[0]` (1-indexed).
    pub first_line: usize,
}

impl ContentBlock {
    #[must_use]
    pub fn from_text(text: &str, source_path: Option<PathBuf>, first_line: usize) -> Self {
        Self {
            lines: text.lines().map(str::to_owned).collect(),
            source_path,
            first_line,
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Source position of the first content line.
    #[must_use]
    pub fn source_info(&self) -> SourceInfo {
        SourceInfo::new(self.source_path.clone(), self.first_line)
    }
}

/// One `:label: explanation` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationField {
    pub label: String,
    /// Explanation parsed as inline markdown.
    pub value: Vec<Node>,
}

impl AnnotationField {
    /// Plain text of the explanation.
    #[must_use]
    pub fn explanation(&self) -> String {
        self.value.iter().map(Node::astext).collect()
    }
}

/// Label dictionary of one code block, in definition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotations {
    fields: Vec<AnnotationField>,
}

impl Annotations {
    /// Parse a field list.
    ///
    /// Indented lines continue the previous field. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, FieldListError> {
        let mut fields: Vec<(String, String)> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(caps) = FIELD.captures(line) {
                let label = caps[1].trim().to_owned();
                let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_owned();
                fields.push((label, value));
                continue;
            }

            let continuation = line.starts_with([' ', '\t']);
            match fields.last_mut() {
                Some((_, value)) if continuation => {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                _ => {
                    return Err(FieldListError {
                        line: index + 1,
                        text: line.to_owned(),
                    });
                }
            }
        }

        Ok(Self {
            fields: fields
                .into_iter()
                .map(|(label, value)| AnnotationField {
                    value: parse_inline(&value),
                    label,
                })
                .collect(),
        })
    }

    /// Parse a field list, falling back to an empty dictionary.
    #[must_use]
    pub fn parse_or_empty(text: &str, source: &SourceInfo) -> Self {
        Self::parse(text).unwrap_or_else(|err| {
            tracing::debug!(location = %source, error = %err, "Ignoring malformed annotations");
            Self::default()
        })
    }

    /// Look up a label. A label defined twice resolves to its last definition.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&AnnotationField> {
        self.fields.iter().rev().find(|field| field.label == label)
    }

    #[must_use]
    pub fn fields(&self) -> &[AnnotationField] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field list node with every definition, duplicates included.
    #[must_use]
    pub fn to_field_list(&self) -> Node {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                Node::new(NodeKind::Field).with_children(vec![
                    Node::new(NodeKind::FieldName).with_children(vec![Node::text(&field.label)]),
                    Node::new(NodeKind::FieldBody).with_children(vec![
                        Node::new(NodeKind::Paragraph).with_children(field.value.clone()),
                    ]),
                ])
            })
            .collect();
        Node::new(NodeKind::FieldList).with_children(fields)
    }
}

/// Label found on one line, with its explanation when defined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineAnnotation {
    pub label: String,
    pub value: Option<AnnotationField>,
}

/// Zero-based content line index to its annotation.
pub type LineAnnotations = BTreeMap<usize, LineAnnotation>;

/// Strip markers from `content` in place and map marked lines to their labels.
///
/// Stacked markers are all stripped; the line keeps the rightmost label.
pub fn resolve_annotations(
    content: &mut ContentBlock,
    annotations: &Annotations,
) -> LineAnnotations {
    let mut resolved = LineAnnotations::new();

    for (index, line) in content.lines.iter_mut().enumerate() {
        let mut label: Option<String> = None;
        while let Some(caps) = MARKER.captures(line) {
            label.get_or_insert_with(|| caps[2].trim().to_owned());
            *line = caps[1].to_owned();
        }

        if let Some(label) = label {
            let value = annotations.get(&label).cloned();
            resolved.insert(index, LineAnnotation { label, value });
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn content(text: &str) -> ContentBlock {
        ContentBlock::from_text(text, None, 1)
    }

    fn labels(resolved: &LineAnnotations) -> Vec<(usize, &str, Option<String>)> {
        resolved
            .iter()
            .map(|(index, a)| {
                let explanation = a.value.as_ref().map(AnnotationField::explanation);
                (*index, a.label.as_str(), explanation)
            })
            .collect()
    }

    #[test]
    fn test_no_markers() {
        let mut block = content("x = 1\ny = 2");
        let resolved = resolve_annotations(&mut block, &Annotations::default());
        assert!(resolved.is_empty());
        assert_eq!(block.text(), "x = 1\ny = 2");
    }

    #[test]
    fn test_resolves_defined_label() {
        let annotations = Annotations::parse(":a: Alpha").unwrap();
        let mut block = content("x = 1  #:a:");
        let resolved = resolve_annotations(&mut block, &annotations);
        assert_eq!(block.text(), "x = 1");
        assert_eq!(labels(&resolved), vec![(0, "a", Some("Alpha".to_owned()))]);
    }

    #[test]
    fn test_undefined_label() {
        let mut block = content("x = 1 #:a:");
        let resolved = resolve_annotations(&mut block, &Annotations::default());
        assert_eq!(block.text(), "x = 1");
        assert_eq!(labels(&resolved), vec![(0, "a", None)]);
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let mut block = content("a #:x:\nb\nc #:y: #:z:");
        let first = resolve_annotations(&mut block, &Annotations::default());
        let stripped = block.clone();
        let second = resolve_annotations(&mut block, &Annotations::default());

        assert_eq!(block, stripped);
        assert_eq!(block.text(), "a\nb\nc");
        assert_eq!(labels(&first), vec![(0, "x", None), (2, "z", None)]);
        assert!(second.is_empty());
    }

    #[test]
    fn test_marker_needs_code_before_it() {
        let mut block = content("#:a:\nx #:a:b");
        assert!(resolve_annotations(&mut block, &Annotations::default()).is_empty());
        assert_eq!(block.text(), "#:a:\nx #:a:b");
    }

    #[test]
    fn test_parse_field_list() {
        let annotations =
            Annotations::parse(":a: First\n  continued\n\n:b: *Second*\n:c:\n").unwrap();
        let found: Vec<_> = annotations
            .fields()
            .iter()
            .map(|f| (f.label.as_str(), f.explanation()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("a", "First continued".to_owned()),
                ("b", "Second".to_owned()),
                ("c", String::new()),
            ]
        );
        assert_eq!(annotations.get("b").unwrap().value[0].kind, NodeKind::Emphasis);
    }

    #[test]
    fn test_duplicate_label_last_wins() {
        let annotations = Annotations::parse(":a: one\n:a: two").unwrap();
        assert_eq!(annotations.get("a").unwrap().explanation(), "two");
        assert_eq!(annotations.fields().len(), 2);
    }

    #[test]
    fn test_parse_error() {
        let err = Annotations::parse(":a: ok\nnot a field").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(Annotations::parse_or_empty("nope", &SourceInfo::default()).is_empty());
    }

    #[test]
    fn test_to_field_list() {
        let list = Annotations::parse(":a: Alpha").unwrap().to_field_list();
        assert_eq!(list.kind, NodeKind::FieldList);
        assert_eq!(list.children.len(), 1);
        assert_eq!(list.children[0].children[0].astext(), "a");
        assert_eq!(list.children[0].children[1].astext(), "Alpha");
    }
}
