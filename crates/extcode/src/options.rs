//! Directive options.
//!
//! Options come from the fence info string (`key=value` pairs and bare flags)
//! and from an optional YAML header at the very top of the block, delimited by
//! `---` lines. Fence info wins when both set the same option.
//!
//! ````markdown
//! ```markdown rendered-block=vertical
//! ---
//! annotations: |
//!   :a: The first line
//! annotate-inline: true
//! ---
//! # Title #:a:
//! ```
//! ````

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use extcode_doc::CodeBlock;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::OptionError;

pub const RENDERED_BLOCK: &str = "rendered-block";
pub const RENDERED_IMAGE: &str = "rendered-image";
pub const ANNOTATIONS: &str = "annotations";
pub const ANNOTATE_INLINE: &str = "annotate-inline";
pub const ANNOTATE_BLOCK: &str = "annotate-block";

/// Options added on top of base code-block handling.
pub const EXTRA_OPTIONS: [&str; 5] = [
    RENDERED_BLOCK,
    RENDERED_IMAGE,
    ANNOTATIONS,
    ANNOTATE_INLINE,
    ANNOTATE_BLOCK,
];

/// Base code-block options accepted in the option header.
const BASE_OPTIONS: [&str; 4] = ["caption", "linenos", "name", "class"];

/// Options that take no value.
const FLAG_OPTIONS: [&str; 3] = [ANNOTATE_INLINE, ANNOTATE_BLOCK, "linenos"];

const HEADER_DELIMITER: &str = "---";

/// Arrangement of the literal and rendered fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Side by side in a table with a header row.
    Horizontal,
    /// Stacked in a table with a stub column.
    Vertical,
    Tab,
    Toggle,
}

impl LayoutMode {
    pub const ALL: [Self; 4] = [Self::Horizontal, Self::Vertical, Self::Tab, Self::Toggle];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Tab => "tab",
            Self::Toggle => "toggle",
        }
    }

    /// Wrapper class carrying the mode to stylesheets and scripts.
    #[must_use]
    pub fn class_name(self) -> String {
        format!("extcode-layout-{}", self.as_str())
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| OptionError::InvalidChoice {
                option: RENDERED_BLOCK,
                value: value.to_owned(),
                expected: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

/// Validated extcode options of one code block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtCodeOptions {
    pub rendered_block: Option<LayoutMode>,
    /// Image shown instead of the rendered fragment on non-hypertext targets.
    pub rendered_image: Option<String>,
    /// Raw field-list text defining annotation labels.
    pub annotations: Option<String>,
    pub annotate_inline: bool,
    pub annotate_block: bool,
}

impl ExtCodeOptions {
    /// Validate the extcode options in an attribute map.
    ///
    /// Attributes that are not extcode options are ignored.
    pub fn from_attrs(attrs: &HashMap<String, String>) -> Result<Self, OptionError> {
        let rendered_block = attrs
            .get(RENDERED_BLOCK)
            .map(|value| value.parse::<LayoutMode>())
            .transpose()?;

        let rendered_image = match attrs.get(RENDERED_IMAGE) {
            Some(value) => {
                let uri: String = value.split_whitespace().collect();
                if uri.is_empty() {
                    return Err(OptionError::EmptyUri {
                        option: RENDERED_IMAGE,
                    });
                }
                Some(uri)
            }
            None => None,
        };

        Ok(Self {
            rendered_block,
            rendered_image,
            annotations: attrs.get(ANNOTATIONS).cloned(),
            annotate_inline: flag(attrs, ANNOTATE_INLINE)?,
            annotate_block: flag(attrs, ANNOTATE_BLOCK)?,
        })
    }

    /// Whether any extcode option is present.
    #[must_use]
    pub fn any_set(&self) -> bool {
        self.rendered_block.is_some()
            || self.rendered_image.is_some()
            || self.annotations.is_some()
            || self.annotate_inline
            || self.annotate_block
    }
}

fn flag(attrs: &HashMap<String, String>, name: &str) -> Result<bool, OptionError> {
    match attrs.get(name) {
        None => Ok(false),
        Some(value) if value.trim().is_empty() => Ok(true),
        Some(value) => Err(OptionError::UnexpectedValue {
            option: name.to_owned(),
            value: value.clone(),
        }),
    }
}

/// A code block with its option header consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionBlock {
    pub options: ExtCodeOptions,
    /// The block with header options merged into its attributes and the
    /// header removed from its content.
    pub block: CodeBlock,
    /// Number of content lines taken by the header, delimiters included.
    pub header_lines: usize,
}

impl OptionBlock {
    /// Line number of the first content line after the header.
    #[must_use]
    pub fn first_content_line(&self) -> usize {
        self.block.line + 1 + self.header_lines
    }
}

/// Read the option header and validate all extcode options of a block.
pub fn parse_block(block: &CodeBlock) -> Result<OptionBlock, OptionError> {
    let mut block = block.clone();
    let mut header_lines = 0;

    if let Some(header) = split_header(&block.content) {
        for (key, value) in header.attrs? {
            block.attrs.entry(key).or_insert(value);
        }
        header_lines = header.lines;
        block.content = header.body;
    }

    Ok(OptionBlock {
        options: ExtCodeOptions::from_attrs(&block.attrs)?,
        block,
        header_lines,
    })
}

struct Header {
    attrs: Result<Vec<(String, String)>, OptionError>,
    body: String,
    lines: usize,
}

/// Split a leading option header off `content`.
///
/// Returns `None` unless the header is a YAML mapping whose keys are all
/// known options and include at least one extcode option, so ordinary front
/// matter and empty YAML documents in the block stay content.
fn split_header(content: &str) -> Option<Header> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.first()?.trim_end() != HEADER_DELIMITER {
        return None;
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|line| line.trim_end() == HEADER_DELIMITER)?
        + 1;

    let yaml = lines[1..close].join("\n");
    let Value::Mapping(mapping) = serde_yaml::from_str::<Value>(&yaml).ok()? else {
        return None;
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Value::String(key) = key else {
            return None;
        };
        if !EXTRA_OPTIONS.contains(&key.as_str()) && !BASE_OPTIONS.contains(&key.as_str()) {
            return None;
        }
        entries.push((key, value));
    }
    if !entries
        .iter()
        .any(|(key, _)| EXTRA_OPTIONS.contains(&key.as_str()))
    {
        return None;
    }

    Some(Header {
        attrs: header_attrs(entries),
        body: lines[close + 1..].join("\n"),
        lines: close + 1,
    })
}

/// Convert header values to attribute strings. A `false` flag is dropped.
fn header_attrs(entries: Vec<(String, Value)>) -> Result<Vec<(String, String)>, OptionError> {
    let mut attrs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let is_flag = FLAG_OPTIONS.contains(&key.as_str());
        let text = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Bool(true) if is_flag => String::new(),
            Value::Bool(false) if is_flag => continue,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
                return Err(OptionError::InvalidHeader {
                    key,
                    reason: "expected a string, number or boolean".to_owned(),
                });
            }
        };
        attrs.push((key, text));
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_layout_mode_from_str() {
        assert_eq!("vertical".parse::<LayoutMode>().unwrap(), LayoutMode::Vertical);
        assert_eq!(" tab ".parse::<LayoutMode>().unwrap(), LayoutMode::Tab);
        let err = "diagonal".parse::<LayoutMode>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'diagonal' for option 'rendered-block': expected one of horizontal, vertical, tab, toggle"
        );
    }

    #[test]
    fn test_layout_class_name() {
        assert_eq!(LayoutMode::Toggle.class_name(), "extcode-layout-toggle");
    }

    #[test]
    fn test_from_attrs() {
        let options = ExtCodeOptions::from_attrs(&attrs(&[
            ("rendered-block", "horizontal"),
            ("rendered-image", " images/out\n.png "),
            ("annotate-inline", ""),
            ("caption", "ignored here"),
        ]))
        .unwrap();
        assert_eq!(
            options,
            ExtCodeOptions {
                rendered_block: Some(LayoutMode::Horizontal),
                rendered_image: Some("images/out.png".to_owned()),
                annotations: None,
                annotate_inline: true,
                annotate_block: false,
            }
        );
        assert!(options.any_set());
    }

    #[test]
    fn test_from_attrs_none_set() {
        let options = ExtCodeOptions::from_attrs(&attrs(&[("linenos", "")])).unwrap();
        assert!(!options.any_set());
    }

    #[test]
    fn test_empty_image_uri() {
        let err = ExtCodeOptions::from_attrs(&attrs(&[("rendered-image", "  ")])).unwrap_err();
        assert!(matches!(err, OptionError::EmptyUri { option: "rendered-image" }));
    }

    #[test]
    fn test_flag_with_value() {
        let err = ExtCodeOptions::from_attrs(&attrs(&[("annotate-block", "yes")])).unwrap_err();
        assert!(matches!(
            err,
            OptionError::UnexpectedValue { option, .. } if option == "annotate-block"
        ));
    }

    #[test]
    fn test_parse_block_with_header() {
        let block = CodeBlock::new(
            Some("markdown"),
            "---\nannotations: |\n  :a: Alpha\nannotate-inline: true\n\
             annotate-block: false\ncaption: Demo\n---\nx #:a:\ny",
        )
        .with_attr("rendered-block", "tab");
        let parsed = parse_block(&block).unwrap();

        assert_eq!(parsed.block.content, "x #:a:\ny");
        assert_eq!(parsed.header_lines, 7);
        assert_eq!(parsed.first_content_line(), 9);
        assert_eq!(parsed.options.rendered_block, Some(LayoutMode::Tab));
        assert_eq!(parsed.options.annotations.as_deref(), Some(":a: Alpha\n"));
        assert!(parsed.options.annotate_inline);
        assert!(!parsed.options.annotate_block);
        assert_eq!(parsed.block.attr("caption"), Some("Demo"));
    }

    #[test]
    fn test_fence_info_wins_over_header() {
        let block = CodeBlock::new(Some("markdown"), "---\nrendered-block: vertical\n---\nbody")
            .with_attr("rendered-block", "horizontal");
        let parsed = parse_block(&block).unwrap();
        assert_eq!(parsed.options.rendered_block, Some(LayoutMode::Horizontal));
    }

    #[test]
    fn test_front_matter_is_not_a_header() {
        let content = "---\ntitle: Page\n---\n# Page";
        let parsed = parse_block(&CodeBlock::new(Some("markdown"), content)).unwrap();
        assert_eq!(parsed.block.content, content);
        assert_eq!(parsed.header_lines, 0);
        assert!(!parsed.options.any_set());
    }

    #[test]
    fn test_empty_header_is_content() {
        let content = "---\n---\nbody";
        let parsed = parse_block(&CodeBlock::new(Some("markdown"), content)).unwrap();
        assert_eq!(parsed.block.content, content);
        assert_eq!(parsed.header_lines, 0);
        assert!(!parsed.options.any_set());
    }

    #[test]
    fn test_base_options_alone_are_not_a_header() {
        let content = "---\ncaption: Demo\n---\nbody";
        let parsed = parse_block(&CodeBlock::new(Some("markdown"), content)).unwrap();
        assert_eq!(parsed.block.content, content);
        assert_eq!(parsed.block.attr("caption"), None);
    }

    #[test]
    fn test_unclosed_header_is_content() {
        let content = "---\nrendered-block: tab\n";
        let parsed = parse_block(&CodeBlock::new(Some("markdown"), content)).unwrap();
        assert_eq!(parsed.block.content, content);
    }

    #[test]
    fn test_invalid_header_value() {
        let block = CodeBlock::new(Some("markdown"), "---\nrendered-block: [a, b]\n---\nx");
        let err = parse_block(&block).unwrap_err();
        assert!(matches!(err, OptionError::InvalidHeader { key, .. } if key == "rendered-block"));
    }

    #[test]
    fn test_invalid_mode_in_header() {
        let block = CodeBlock::new(Some("markdown"), "---\nrendered-block: sideways\n---\nx");
        assert!(matches!(
            parse_block(&block),
            Err(OptionError::InvalidChoice { .. })
        ));
    }
}
