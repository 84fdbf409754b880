//! Sandboxed rendering of a markdown fragment.
//!
//! The fragment is parsed as its own document and built against a scratch
//! symbol scope layered over the shared environment. Labels it defines stay in
//! the scratch scope and are dropped with it.

use extcode_doc::{
    BuildError, ParseError, ParseOptions, ProcessContext, SymbolScope, parse_document,
};

use crate::annotation::ContentBlock;

/// Why a fragment could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum SandboxFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Result of a sandboxed render.
#[derive(Debug)]
pub enum SandboxOutcome {
    /// Body fragment written by the active builder.
    Rendered(String),
    Failed(SandboxFailure),
}

/// Parse and partially build `content` in isolation.
///
/// Never fails: problems are logged and returned as [`SandboxOutcome::Failed`].
#[must_use]
pub fn render_sandboxed(content: &ContentBlock, ctx: &ProcessContext<'_>) -> SandboxOutcome {
    match render(content, ctx) {
        Ok(fragment) => SandboxOutcome::Rendered(fragment),
        Err(err) => {
            tracing::warn!(
                document = ctx.docname,
                location = %content.source_info(),
                error = %err,
                "Rendering nested markdown failed"
            );
            SandboxOutcome::Failed(err)
        }
    }
}

fn render(content: &ContentBlock, ctx: &ProcessContext<'_>) -> Result<String, SandboxFailure> {
    let options =
        ParseOptions::strict().with_source(content.source_path.clone(), content.first_line);
    let mut tree = parse_document(&content.text(), &options)?;

    let mut scope = SymbolScope::new(ctx.env.symbols(), ctx.docname);
    ctx.env.process_doc(&mut scope, &tree)?;

    let warnings = ctx.env.resolve_references(&scope, &mut tree, ctx.builder)?;
    for warning in &warnings {
        tracing::debug!(document = ctx.docname, %warning, "Nested markdown reference");
    }

    Ok(ctx.env.render_fragment(&tree, ctx.builder)?)
}
