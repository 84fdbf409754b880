//! The extcode code block processor.

use extcode_doc::{
    CodeBlock, CodeBlockProcessor, DirectiveError, Node, NodeKind, ProcessContext, ProcessResult,
    literal_block,
};

use crate::annotation::{Annotations, ContentBlock, resolve_annotations};
use crate::config::ExtCodeConfig;
use crate::layout::{annotation_table, assemble, build_overlay, rendered_companion};
use crate::options::parse_block;
use crate::sandbox::{SandboxOutcome, render_sandboxed};

/// Languages whose blocks are paired with their rendered output.
const PAIRING_LANGUAGES: [&str; 2] = ["markdown", "md"];

/// Format of the raw rendered fragment.
const RENDERED_FORMAT: &str = "html";

/// Replaces code blocks that use extcode options with an `extcode` wrapper.
#[derive(Debug, Default)]
pub struct ExtCodeProcessor {
    config: ExtCodeConfig,
    warnings: Vec<String>,
}

impl ExtCodeProcessor {
    #[must_use]
    pub fn new(config: ExtCodeConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }
}

fn is_pairing_language(block: &CodeBlock) -> bool {
    block
        .language
        .as_deref()
        .is_some_and(|lang| PAIRING_LANGUAGES.iter().any(|p| lang.eq_ignore_ascii_case(p)))
}

impl CodeBlockProcessor for ExtCodeProcessor {
    fn process(
        &mut self,
        block: &CodeBlock,
        ctx: &ProcessContext<'_>,
    ) -> Result<ProcessResult, DirectiveError> {
        let parsed = parse_block(block)?;
        let options = &parsed.options;

        if !options.any_set() && self.config.is_empty() {
            return Ok(ProcessResult::PassThrough);
        }

        let source = parsed.block.source_info();
        let annotations = options
            .annotations
            .as_deref()
            .map(|text| Annotations::parse_or_empty(text, &source))
            .unwrap_or_default();

        let mut content = ContentBlock::from_text(
            &parsed.block.content,
            parsed.block.source_path.clone(),
            parsed.first_content_line(),
        );
        let line_annotations = resolve_annotations(&mut content, &annotations);
        let literal = literal_block(&parsed.block, &content.text());

        let mode = options.rendered_block.or(self.config.rendered_block);
        let rendered = if mode.is_some() && is_pairing_language(&parsed.block) {
            match render_sandboxed(&content, ctx) {
                SandboxOutcome::Rendered(fragment) => {
                    let raw = Node::new(NodeKind::Raw {
                        format: RENDERED_FORMAT.to_owned(),
                        content: fragment,
                    });
                    Some(rendered_companion(
                        raw,
                        options.rendered_image.as_deref(),
                        &source,
                    ))
                }
                SandboxOutcome::Failed(err) => {
                    self.warnings.push(format!(
                        "{}: extcode: partial build failed: {err}",
                        content.source_info()
                    ));
                    None
                }
            }
        } else {
            tracing::debug!(
                document = ctx.docname,
                location = %source,
                "Showing code block without rendered output"
            );
            None
        };

        let mut wrapper = assemble(literal, rendered, mode, &source);

        if options.annotate_inline && !line_annotations.is_empty() {
            wrapper.push(build_overlay(
                &line_annotations,
                content.line_count(),
                &content.source_info(),
            ));
        }
        if options.annotate_block && !annotations.is_empty() {
            wrapper.push(annotation_table(&annotations, &source));
        }

        Ok(ProcessResult::Replace(vec![wrapper]))
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
