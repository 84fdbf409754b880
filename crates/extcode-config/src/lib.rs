//! Configuration management for extcode builds.
//!
//! Parses `extcode.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings are applied on top via [`CliSettings`].
//!
//! ```toml
//! [build]
//! source_dir = "docs"
//! output_dir = "${OUT_DIR:-_build}"
//! builder = "html"
//!
//! [extcode]
//! rendered-block = "vertical"
//! ```
//!
//! `build.source_dir` and `build.output_dir` support `${VAR}` and
//! `${VAR:-default}` expansion and are resolved relative to the config file.

mod expand;

use std::path::{Path, PathBuf};

use extcode::{ExtCodeConfig, LayoutMode};
use extcode_doc::Builder;
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "extcode.toml";

const DEFAULT_SOURCE_DIR: &str = "docs";
const DEFAULT_OUTPUT_DIR: &str = "_build";
const DEFAULT_BUILDER: &str = "html";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub builder: Option<String>,
    /// Override the default layout mode.
    pub rendered_block: Option<LayoutMode>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build paths as written in TOML.
    build: BuildConfigRaw,
    /// Extension defaults.
    pub extcode: ExtCodeConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    builder: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory searched for `*.md` sources.
    pub source_dir: PathBuf,
    /// Directory receiving the built files.
    pub output_dir: PathBuf,
    /// Builder name (`html`, `singlehtml`, `epub`, `text`, `xml`, `pseudoxml`).
    pub builder: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Validation(String),

    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. `build.output_dir`).
        field: String,
        message: String,
    },
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// Loads `config_path` when given, otherwise the nearest `extcode.toml` in
    /// the current directory or its parents, otherwise defaults relative to
    /// the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing fails
    /// or the result is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Builder selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an unknown builder name.
    pub fn builder(&self) -> Result<Builder, ConfigError> {
        Builder::from_name(&self.build_resolved.builder)
            .map_err(|e| ConfigError::Validation(format!("build.builder: {e}")))
    }

    /// Check that configuration values are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any check fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.builder()?;
        if self.build_resolved.source_dir == self.build_resolved.output_dir {
            return Err(ConfigError::Validation(
                "build.output_dir must differ from build.source_dir".to_owned(),
            ));
        }
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(builder) = &settings.builder {
            self.build_resolved.builder.clone_from(builder);
        }
        if let Some(mode) = settings.rendered_block {
            self.extcode.rendered_block = Some(mode);
        }
    }

    /// Search for the config file in the current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            build: BuildConfigRaw::default(),
            extcode: ExtCodeConfig::default(),
            build_resolved: BuildConfig {
                source_dir: base.join(DEFAULT_SOURCE_DIR),
                output_dir: base.join(DEFAULT_OUTPUT_DIR),
                builder: DEFAULT_BUILDER.to_owned(),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.build.source_dir {
            self.build.source_dir = Some(expand::expand_env(dir, "build.source_dir")?);
        }
        if let Some(dir) = &self.build.output_dir {
            self.build.output_dir = Some(expand::expand_env(dir, "build.output_dir")?);
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), DEFAULT_SOURCE_DIR),
            output_dir: resolve(self.build.output_dir.as_deref(), DEFAULT_OUTPUT_DIR),
            builder: self
                .build
                .builder
                .clone()
                .unwrap_or_else(|| DEFAULT_BUILDER.to_owned()),
        };
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/project"));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/project/docs"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/project/_build"));
        assert_eq!(config.build_resolved.builder, "html");
        assert!(config.extcode.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let (dir, path) = write_config(
            r#"
[build]
source_dir = "src"
builder = "text"

[extcode]
rendered-block = "horizontal"
"#,
        );
        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.build_resolved.source_dir, dir.path().join("src"));
        assert_eq!(config.build_resolved.output_dir, dir.path().join("_build"));
        assert_eq!(config.builder().unwrap(), Builder::text());
        assert_eq!(config.extcode.rendered_block, Some(LayoutMode::Horizontal));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/extcode.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_unknown_builder_rejected() {
        let (_dir, path) = write_config("[build]\nbuilder = \"latex\"\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("latex"));
    }

    #[test]
    fn test_unknown_layout_mode_rejected() {
        let (_dir, path) = write_config("[extcode]\nrendered-block = \"grid\"\n");
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_output_dir_must_differ() {
        let (_dir, path) = write_config("[build]\nsource_dir = \"docs\"\noutput_dir = \"docs\"\n");
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_cli_settings_override() {
        let (_dir, path) = write_config("[build]\nbuilder = \"html\"\n");
        let settings = CliSettings {
            output_dir: Some(PathBuf::from("/tmp/out")),
            builder: Some("pseudoxml".to_owned()),
            rendered_block: Some(LayoutMode::Tab),
            ..CliSettings::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.builder().unwrap().name(), "pseudoxml");
        assert_eq!(config.extcode.rendered_block, Some(LayoutMode::Tab));
    }

    #[test]
    fn test_cli_builder_validated() {
        let (_dir, path) = write_config("");
        let settings = CliSettings {
            builder: Some("pdf".to_owned()),
            ..CliSettings::default()
        };
        assert!(Config::load(Some(&path), Some(&settings)).is_err());
    }

    #[test]
    fn test_env_expansion_in_paths() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("EXTCODE_CFG_OUT", "site");
        }
        let (dir, path) = write_config("[build]\noutput_dir = \"${EXTCODE_CFG_OUT}/html\"\n");
        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.build_resolved.output_dir, dir.path().join("site/html"));
        unsafe {
            std::env::remove_var("EXTCODE_CFG_OUT");
        }
    }
}
