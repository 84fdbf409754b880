//! Layout assembly.
//!
//! Arranges the literal block, the rendered companion, the per-line overlay
//! and the annotation table inside one `extcode` wrapper node.

use extcode_doc::{Builder, Node, NodeKind, SourceInfo};

use crate::annotation::{Annotations, LineAnnotation, LineAnnotations};
use crate::options::LayoutMode;

/// Name of the wrapper node.
pub const WRAPPER_NODE: &str = "extcode";
pub const WRAPPER_CLASS: &str = "extcode";
/// Class of layout tables and their entries.
pub const LAYOUT_CLASS: &str = "extcode-layout";
pub const RENDERED_CLASS: &str = "extcode-rendered";
/// Class of the element holding the rendered output in HTML.
pub const COMPANION_CLASS: &str = "extcode-companion";
pub const OVERLAY_CLASS: &str = "extcode-overlay";
pub const ANNOTATIONS_CLASS: &str = "extcode-annotations";

/// Lead-in of annotated overlay lines.
pub const OVERLAY_PREFIX: &str = "... ";

const LITERAL_LABEL: &str = "literal";
const RENDERED_LABEL: &str = "rendered";

/// Build a table with one entry per cell.
///
/// The first `head_rows` rows go to the table head and the first
/// `stub_columns` columns are stubs.
#[must_use]
pub fn build_table(
    rows: Vec<Vec<Node>>,
    colwidths: &[u32],
    head_rows: usize,
    stub_columns: usize,
    entry_classes: &[&str],
) -> Node {
    let mut tgroup = Node::new(NodeKind::TGroup {
        cols: colwidths.len(),
    });
    for (index, width) in colwidths.iter().enumerate() {
        tgroup.push(Node::new(NodeKind::ColSpec {
            width: *width,
            stub: index < stub_columns,
        }));
    }

    let mut rows: Vec<Node> = rows
        .into_iter()
        .map(|cells| {
            let entries = cells
                .into_iter()
                .map(|cell| {
                    let mut entry = Node::new(NodeKind::Entry).with_children(vec![cell]);
                    for class in entry_classes {
                        entry.add_class(*class);
                    }
                    entry
                })
                .collect();
            Node::new(NodeKind::Row).with_children(entries)
        })
        .collect();

    let body = rows.split_off(head_rows.min(rows.len()));
    if !rows.is_empty() {
        tgroup.push(Node::new(NodeKind::THead).with_children(rows));
    }
    tgroup.push(Node::new(NodeKind::TBody).with_children(body));

    Node::new(NodeKind::Table).with_children(vec![tgroup])
}

/// Container for the rendered fragment, shown by hypertext builders only.
///
/// `image` replaces the fragment for every other builder.
#[must_use]
pub fn rendered_companion(fragment: Node, image: Option<&str>, source: &SourceInfo) -> Node {
    let mut container = Node::new(NodeKind::Container)
        .with_class(COMPANION_CLASS)
        .with_source(source.clone());
    container.push(
        Node::new(NodeKind::Only { hypertext: true })
            .with_children(vec![fragment.with_class(RENDERED_CLASS)]),
    );
    if let Some(uri) = image {
        container.push(
            Node::new(NodeKind::Only { hypertext: false }).with_children(vec![Node::new(
                NodeKind::Image {
                    uri: uri.to_owned(),
                    alt: String::new(),
                },
            )]),
        );
    }
    container
}

/// Wrap the literal block and, when paired, its rendered companion.
#[must_use]
pub fn assemble(
    literal: Node,
    rendered: Option<Node>,
    mode: Option<LayoutMode>,
    source: &SourceInfo,
) -> Node {
    let mut wrapper = Node::new(NodeKind::Custom(WRAPPER_NODE))
        .with_class(WRAPPER_CLASS)
        .with_source(source.clone());

    let (Some(rendered), Some(mode)) = (rendered, mode) else {
        wrapper.push(literal);
        return wrapper;
    };

    wrapper.add_class(mode.class_name());
    match mode {
        LayoutMode::Horizontal => {
            let rows = vec![
                vec![
                    Node::inline_text(LITERAL_LABEL),
                    Node::inline_text(RENDERED_LABEL),
                ],
                vec![literal, rendered],
            ];
            wrapper.push(layout_table(rows, &[1, 1], 1, 0, source));
        }
        LayoutMode::Vertical => {
            let rows = vec![
                vec![Node::inline_text(LITERAL_LABEL), literal],
                vec![Node::inline_text(RENDERED_LABEL), rendered],
            ];
            wrapper.push(layout_table(rows, &[2, 8], 0, 1, source));
        }
        LayoutMode::Tab | LayoutMode::Toggle => {
            wrapper.push(literal);
            wrapper.push(rendered);
        }
    }
    wrapper
}

fn layout_table(
    rows: Vec<Vec<Node>>,
    colwidths: &[u32],
    head_rows: usize,
    stub_columns: usize,
    source: &SourceInfo,
) -> Node {
    build_table(rows, colwidths, head_rows, stub_columns, &[LAYOUT_CLASS])
        .with_class(LAYOUT_CLASS)
        .with_source(source.clone())
}

/// One overlay line per content line, showing the line's label if any.
#[must_use]
pub fn build_overlay(
    annotations: &LineAnnotations,
    line_count: usize,
    source: &SourceInfo,
) -> Node {
    let lines = (0..line_count)
        .map(|index| {
            let children = match annotations.get(&index) {
                Some(LineAnnotation {
                    label,
                    value: Some(field),
                }) => vec![
                    Node::inline_text(OVERLAY_PREFIX),
                    Node::new(NodeKind::Abbreviation {
                        explanation: field.explanation(),
                    })
                    .with_children(vec![Node::text(label)]),
                ],
                Some(LineAnnotation { label, value: None }) => {
                    vec![Node::inline_text(OVERLAY_PREFIX), Node::text(label)]
                }
                None => Vec::new(),
            };
            Node::new(NodeKind::Line).with_children(children)
        })
        .collect();

    Node::new(NodeKind::LineBlock)
        .with_class(OVERLAY_CLASS)
        .with_source(source.clone())
        .with_children(lines)
}

/// Field list of every annotation definition.
#[must_use]
pub fn annotation_table(annotations: &Annotations, source: &SourceInfo) -> Node {
    annotations
        .to_field_list()
        .with_class(ANNOTATIONS_CLASS)
        .with_source(source.clone())
}

/// Remove rendered companions and overlays for builders that cannot show them.
pub fn prune_companions(tree: &mut Node, docname: &str, builder: &Builder) {
    if builder.is_hypertext() {
        return;
    }
    let removed = tree
        .remove_matching(&|node| node.has_class(RENDERED_CLASS) || node.has_class(OVERLAY_CLASS));
    if removed > 0 {
        tracing::debug!(
            document = docname,
            builder = builder.name(),
            removed,
            "Pruned extcode companions"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotation::AnnotationField;

    fn literal() -> Node {
        Node::new(NodeKind::LiteralBlock {
            language: Some("markdown".to_owned()),
            linenos: false,
        })
        .with_children(vec![Node::text("a: 1")])
    }

    fn rendered() -> Node {
        rendered_companion(
            Node::new(NodeKind::Raw {
                format: "html".to_owned(),
                content: "<p>a: 1</p>\n".to_owned(),
            }),
            None,
            &SourceInfo::default(),
        )
    }

    fn tgroup(wrapper: &Node) -> &Node {
        let table = &wrapper.children[0];
        assert_eq!(table.kind, NodeKind::Table);
        &table.children[0]
    }

    fn count(node: &Node, kind: &NodeKind) -> usize {
        node.find_all(|n| n.kind == *kind).len()
    }

    fn stubs(tgroup: &Node) -> usize {
        tgroup
            .children
            .iter()
            .filter(|c| matches!(c.kind, NodeKind::ColSpec { stub: true, .. }))
            .count()
    }

    #[test]
    fn test_horizontal_table() {
        let wrapper = assemble(
            literal(),
            Some(rendered()),
            Some(LayoutMode::Horizontal),
            &SourceInfo::default(),
        );
        assert_eq!(wrapper.classes, vec!["extcode", "extcode-layout-horizontal"]);

        let tgroup = tgroup(&wrapper);
        assert_eq!(tgroup.kind, NodeKind::TGroup { cols: 2 });
        assert_eq!(stubs(tgroup), 0);
        assert_eq!(count(tgroup, &NodeKind::THead), 1);
        let head = tgroup.find_all(|n| n.kind == NodeKind::THead)[0];
        assert_eq!(count(head, &NodeKind::Row), 1);
        assert_eq!(head.astext(), "literalrendered");
    }

    #[test]
    fn test_vertical_table() {
        let wrapper = assemble(
            literal(),
            Some(rendered()),
            Some(LayoutMode::Vertical),
            &SourceInfo::default(),
        );
        let tgroup = tgroup(&wrapper);
        assert_eq!(tgroup.kind, NodeKind::TGroup { cols: 2 });
        assert_eq!(stubs(tgroup), 1);
        assert_eq!(count(tgroup, &NodeKind::THead), 0);

        let widths: Vec<u32> = tgroup
            .children
            .iter()
            .filter_map(|c| match c.kind {
                NodeKind::ColSpec { width, .. } => Some(width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![2, 8]);

        let entries = tgroup.find_all(|n| n.kind == NodeKind::Entry);
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.has_class(LAYOUT_CLASS)));
        assert!(wrapper.children[0].has_class(LAYOUT_CLASS));
    }

    #[test]
    fn test_tab_and_toggle_are_siblings() {
        for mode in [LayoutMode::Tab, LayoutMode::Toggle] {
            let wrapper = assemble(literal(), Some(rendered()), Some(mode), &SourceInfo::default());
            assert_eq!(wrapper.children.len(), 2);
            assert_eq!(count(&wrapper, &NodeKind::Table), 0);
            assert!(wrapper.has_class(&mode.class_name()));
        }
    }

    #[test]
    fn test_unpaired_wrapper_holds_literal() {
        let wrapper = assemble(literal(), None, Some(LayoutMode::Vertical), &SourceInfo::default());
        assert_eq!(wrapper.children, vec![literal()]);
        assert_eq!(wrapper.classes, vec!["extcode"]);

        let wrapper = assemble(literal(), Some(rendered()), None, &SourceInfo::default());
        assert_eq!(wrapper.children, vec![literal()]);
    }

    #[test]
    fn test_rendered_companion_with_image() {
        let raw = Node::new(NodeKind::Raw {
            format: "html".to_owned(),
            content: String::new(),
        });
        let companion = rendered_companion(raw, Some("out.png"), &SourceInfo::default());
        assert_eq!(companion.children.len(), 2);
        assert_eq!(companion.children[0].kind, NodeKind::Only { hypertext: true });
        assert!(companion.children[0].children[0].has_class(RENDERED_CLASS));
        assert_eq!(companion.children[1].kind, NodeKind::Only { hypertext: false });
        let image = NodeKind::Image {
            uri: "out.png".to_owned(),
            alt: String::new(),
        };
        assert_eq!(count(&companion.children[1], &image), 1);
    }

    #[test]
    fn test_overlay_lines() {
        let mut annotations = LineAnnotations::new();
        annotations.insert(
            0,
            LineAnnotation {
                label: "a".to_owned(),
                value: Some(AnnotationField {
                    label: "a".to_owned(),
                    value: vec![Node::text("Alpha")],
                }),
            },
        );
        annotations.insert(
            2,
            LineAnnotation {
                label: "b".to_owned(),
                value: None,
            },
        );

        let overlay = build_overlay(&annotations, 3, &SourceInfo::default());
        assert!(overlay.has_class(OVERLAY_CLASS));
        assert_eq!(overlay.children.len(), 3);

        let first = &overlay.children[0];
        assert_eq!(first.astext(), "... a");
        assert_eq!(
            first.children[1].kind,
            NodeKind::Abbreviation {
                explanation: "Alpha".to_owned()
            }
        );
        assert!(overlay.children[1].children.is_empty());
        assert_eq!(overlay.children[2].astext(), "... b");
        assert_eq!(overlay.children[2].children[1].kind, NodeKind::Text("b".to_owned()));
    }

    #[test]
    fn test_annotation_table() {
        let annotations = Annotations::parse(":a: Alpha").unwrap();
        let table = annotation_table(&annotations, &SourceInfo::new(None, 4));
        assert!(table.has_class(ANNOTATIONS_CLASS));
        assert_eq!(table.source, Some(SourceInfo::new(None, 4)));
    }

    #[test]
    fn test_prune_for_text_builder() {
        let mut doc = Node::new(NodeKind::Document).with_children(vec![
            assemble(literal(), Some(rendered()), Some(LayoutMode::Tab), &SourceInfo::default()),
            build_overlay(&LineAnnotations::new(), 1, &SourceInfo::default()),
        ]);
        let mut html_doc = doc.clone();

        prune_companions(&mut doc, "index", &Builder::text());
        assert!(doc
            .find_all(|n| n.has_class(RENDERED_CLASS) || n.has_class(OVERLAY_CLASS))
            .is_empty());

        prune_companions(&mut html_doc, "index", &Builder::html());
        assert_eq!(html_doc.find_all(|n| n.has_class(RENDERED_CLASS)).len(), 1);
        assert_eq!(html_doc.find_all(|n| n.has_class(OVERLAY_CLASS)).len(), 1);
    }
}
