//! Registration with the build application.

use extcode_doc::{Application, Extension, Node, NodeHandlers, OutputFormat, writer};

use crate::assets::static_assets;
use crate::config::ExtCodeConfig;
use crate::directive::ExtCodeProcessor;
use crate::layout::{WRAPPER_NODE, prune_companions};

/// The extcode extension.
///
/// ```no_run
/// use extcode::{ExtCode, ExtCodeConfig};
/// use extcode_doc::{Application, Builder};
///
/// let app = Application::new(Builder::html())
///     .with_extension(&ExtCode::new(ExtCodeConfig::default()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExtCode {
    config: ExtCodeConfig,
}

impl ExtCode {
    #[must_use]
    pub fn new(config: ExtCodeConfig) -> Self {
        Self { config }
    }
}

fn visit_extcode_html(node: &Node, out: &mut String) {
    out.push_str(&writer::starttag(node, "div"));
    out.push('\n');
}

fn depart_extcode_html(_node: &Node, out: &mut String) {
    out.push_str("</div>\n");
}

impl Extension for ExtCode {
    fn name(&self) -> &'static str {
        "extcode"
    }

    fn setup(&self, app: &mut Application) {
        app.add_processor(ExtCodeProcessor::new(self.config.clone()));
        app.add_node(
            WRAPPER_NODE,
            &[
                (
                    OutputFormat::Html,
                    NodeHandlers::new(visit_extcode_html, depart_extcode_html),
                ),
                (OutputFormat::Text, NodeHandlers::NOOP),
                (OutputFormat::Xml, NodeHandlers::NOOP),
            ],
        );
        app.connect_doctree_resolved(prune_companions);
        for asset in static_assets() {
            app.add_static_asset(asset);
        }
    }
}
