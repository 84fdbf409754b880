//! Process-wide defaults for the extcode processor.

use serde::{Deserialize, Serialize};

use crate::options::LayoutMode;

/// `[extcode]` configuration section.
///
/// ```toml
/// [extcode]
/// rendered-block = "vertical"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExtCodeConfig {
    /// Layout used by blocks that do not set `rendered-block` themselves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_block: Option<LayoutMode>,
}

impl ExtCodeConfig {
    #[must_use]
    pub fn with_rendered_block(mode: LayoutMode) -> Self {
        Self {
            rendered_block: Some(mode),
        }
    }

    /// Whether no default is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered_block.is_none()
    }
}
