//! Code blocks shown as literal source and rendered output.
//!
//! A fenced `markdown` block with a `rendered-block` layout is displayed next
//! to the output of rendering it, side by side, stacked, or as a tab or toggle.
//! Any block may end lines in `#:label:` markers that are stripped from the
//! displayed code and explained by an `annotations` field list.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use extcode::{ExtCode, ExtCodeConfig};
//! use extcode_doc::{Application, Builder, SourceDocument};
//!
//! let mut app = Application::new(Builder::html())
//!     .with_extension(&ExtCode::new(ExtCodeConfig::default()));
//! let docs = SourceDocument::discover(Path::new("docs"))?;
//! let report = app.build(&docs, Path::new("_build"))?;
//! # Ok::<(), extcode_doc::BuildError>(())
//! ```

mod annotation;
mod assets;
mod config;
mod directive;
mod error;
mod extension;
mod layout;
mod options;
mod sandbox;

pub use annotation::{
    AnnotationField, Annotations, ContentBlock, LineAnnotation, LineAnnotations,
    resolve_annotations,
};
pub use assets::static_assets;
pub use config::ExtCodeConfig;
pub use directive::ExtCodeProcessor;
pub use error::{FieldListError, OptionError};
pub use extension::ExtCode;
pub use layout::{
    ANNOTATIONS_CLASS, COMPANION_CLASS, LAYOUT_CLASS, OVERLAY_CLASS, OVERLAY_PREFIX,
    RENDERED_CLASS, WRAPPER_CLASS, WRAPPER_NODE, annotation_table, assemble, build_overlay,
    build_table, prune_companions, rendered_companion,
};
pub use options::{EXTRA_OPTIONS, ExtCodeOptions, LayoutMode, OptionBlock, parse_block};
pub use sandbox::{SandboxFailure, SandboxOutcome, render_sandboxed};
