//! `extcode build` command implementation.

use std::path::PathBuf;

use clap::Args;
use extcode::{ExtCode, LayoutMode};
use extcode_config::{CliSettings, Config};
use extcode_doc::{Application, BuildReport, SourceDocument};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover extcode.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Builder: html, singlehtml, epub, text, xml or pseudoxml (overrides config).
    #[arg(short, long, env = "EXTCODE_BUILDER")]
    builder: Option<String>,

    /// Default layout for markdown blocks without `rendered-block`.
    #[arg(long)]
    rendered_block: Option<LayoutMode>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a document cannot be built.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            builder: self.builder,
            rendered_block: self.rendered_block,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let report = run(&config, output)?;

        for warning in &report.warnings {
            output.warning(warning);
        }
        output.success(&format!(
            "Wrote {} files to {} ({} warnings)",
            report.written.len(),
            config.build_resolved.output_dir.display(),
            report.warnings.len()
        ));
        Ok(())
    }
}

fn run(config: &Config, output: &Output) -> Result<BuildReport, CliError> {
    let builder = config.builder()?;
    let source_dir = &config.build_resolved.source_dir;

    let documents = SourceDocument::discover(source_dir)?;
    if documents.is_empty() {
        output.warning(&format!("No markdown files found in {}", source_dir.display()));
        return Ok(BuildReport::default());
    }

    tracing::info!(
        source_dir = %source_dir.display(),
        documents = documents.len(),
        builder = builder.name(),
        "Starting build"
    );

    let mut app = Application::new(builder).with_extension(&ExtCode::new(config.extcode.clone()));
    Ok(app.build(&documents, &config.build_resolved.output_dir)?)
}
