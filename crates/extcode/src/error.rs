//! Directive option errors.

use extcode_doc::DirectiveError;

/// Invalid directive option.
///
/// Reported by the host as an error message at the code block's location.
#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    #[error("invalid value '{value}' for option '{option}': expected one of {expected}")]
    InvalidChoice {
        option: &'static str,
        value: String,
        expected: String,
    },

    #[error("option '{option}' requires a non-empty URI")]
    EmptyUri { option: &'static str },

    #[error("option '{option}' is a flag and takes no value (got '{value}')")]
    UnexpectedValue { option: String, value: String },

    #[error("invalid option header entry '{key}': {reason}")]
    InvalidHeader { key: String, reason: String },
}

impl From<OptionError> for DirectiveError {
    fn from(err: OptionError) -> Self {
        DirectiveError(err.to_string())
    }
}

/// Malformed annotation field list.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: expected ':label: explanation', found '{text}'")]
pub struct FieldListError {
    /// Line within the field list (1-indexed).
    pub line: usize,
    pub text: String,
}
