//! Error types for parsing, domain processing, writing and building.

use crate::builder::OutputFormat;
use crate::node::SourceInfo;

/// Error returned by strict markdown parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A code fence was opened but never closed.
    #[error("{location}: unterminated code fence")]
    UnterminatedFence { location: SourceInfo },
}

/// Error returned by a [`Domain`](crate::Domain) while processing a document.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// An explicit label was defined twice in the same document.
    #[error("duplicate label '{label}' in document '{docname}'")]
    DuplicateLabel { label: String, docname: String },
}

/// Error returned by a writer.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// A custom node has no handlers for the active output format.
    #[error("no {format} handler registered for node '{name}'")]
    UnknownNode {
        name: &'static str,
        format: OutputFormat,
    },
}

/// Error returned by the build pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    #[error("unknown builder: {0}")]
    UnknownBuilder(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid source pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
