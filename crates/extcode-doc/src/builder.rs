//! Builders and output formats.

use std::fmt;

use crate::error::BuildError;
use crate::util::relative_path;

/// Builder names whose output can embed raw HTML fragments.
const HYPERTEXT_BUILDERS: [&str; 3] = ["html", "singlehtml", "epub"];

/// Output format produced by a writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    Text,
    Xml,
}

impl OutputFormat {
    /// Format name, as used by [`NodeKind::Raw`](crate::NodeKind::Raw) nodes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Xml => "xml",
        }
    }

    /// File extension of written documents.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "txt",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The active builder: a name plus the output format it writes.
///
/// Several builders share a format (`html`, `singlehtml` and `epub` all write
/// HTML), but only the name decides hypertext capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Builder {
    name: String,
    format: OutputFormat,
}

impl Builder {
    /// Look up a builder by name.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownBuilder`] for names without a writer.
    pub fn from_name(name: &str) -> Result<Self, BuildError> {
        let format = match name {
            "html" | "singlehtml" | "epub" => OutputFormat::Html,
            "text" => OutputFormat::Text,
            "xml" | "pseudoxml" => OutputFormat::Xml,
            _ => return Err(BuildError::UnknownBuilder(name.to_owned())),
        };
        Ok(Self {
            name: name.to_owned(),
            format,
        })
    }

    /// The standard HTML builder.
    #[must_use]
    pub fn html() -> Self {
        Self {
            name: "html".to_owned(),
            format: OutputFormat::Html,
        }
    }

    /// The plain-text builder.
    #[must_use]
    pub fn text() -> Self {
        Self {
            name: "text".to_owned(),
            format: OutputFormat::Text,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether this builder belongs to the hypertext-capable family.
    #[must_use]
    pub fn is_hypertext(&self) -> bool {
        HYPERTEXT_BUILDERS.contains(&self.name.as_str())
    }

    /// Output path of a document, relative to the output directory.
    #[must_use]
    pub fn target_uri(&self, docname: &str) -> String {
        format!("{docname}.{}", self.format.extension())
    }

    /// URI of `to` as seen from the output file of `from`.
    #[must_use]
    pub fn relative_uri(&self, from: &str, to: &str) -> String {
        relative_path(&self.target_uri(from), &self.target_uri(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Builder::from_name("epub").unwrap().format(), OutputFormat::Html);
        assert_eq!(Builder::from_name("text").unwrap().format(), OutputFormat::Text);
        assert_eq!(Builder::from_name("pseudoxml").unwrap().format(), OutputFormat::Xml);
        assert!(matches!(
            Builder::from_name("latex"),
            Err(BuildError::UnknownBuilder(name)) if name == "latex"
        ));
    }

    #[test]
    fn test_hypertext_family() {
        assert!(Builder::html().is_hypertext());
        assert!(Builder::from_name("singlehtml").unwrap().is_hypertext());
        assert!(!Builder::text().is_hypertext());
        assert!(!Builder::from_name("xml").unwrap().is_hypertext());
    }

    #[test]
    fn test_relative_uri() {
        let builder = Builder::html();
        assert_eq!(builder.target_uri("guide/install"), "guide/install.html");
        assert_eq!(builder.relative_uri("guide/install", "index"), "../index.html");
        assert_eq!(builder.relative_uri("guide/install", "guide/usage"), "usage.html");
    }
}
