//! Build pipeline.
//!
//! [`Application`] owns the environment, the registered code block
//! processors, doctree-resolved hooks and static assets. Extensions plug in
//! through [`Extension::setup`].

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::{Builder, OutputFormat};
use crate::code_block::{CodeBlockProcessor, ProcessContext};
use crate::env::{BuildEnvironment, Environment, SymbolScope};
use crate::error::BuildError;
use crate::node::{Node, NodeKind};
use crate::parser::{ParseOptions, parse_with_processors};
use crate::util::{escape_html, relative_path};
use crate::writer::NodeHandlers;

/// Directory under the output directory that receives static assets.
const STATIC_DIR: &str = "_static";

/// A file copied to `<out>/_static/` for hypertext builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticAsset {
    pub name: String,
    pub data: Cow<'static, [u8]>,
}

/// A pluggable extension.
pub trait Extension {
    fn name(&self) -> &'static str;

    /// Register processors, nodes, hooks and assets.
    fn setup(&self, app: &mut Application);
}

/// Hook run on every resolved document tree before writing.
pub type DoctreeResolvedHook = Box<dyn Fn(&mut Node, &str, &Builder)>;

/// A markdown source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    /// Document name: path relative to the source directory, without extension.
    pub docname: String,
    pub path: Option<PathBuf>,
    pub text: String,
}

impl SourceDocument {
    #[must_use]
    pub fn new(docname: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            docname: docname.into(),
            path: None,
            text: text.into(),
        }
    }

    /// Read every `*.md` file below `source_dir`, sorted by document name.
    pub fn discover(source_dir: &Path) -> Result<Vec<Self>, BuildError> {
        let pattern = source_dir.join("**").join("*.md");
        let mut documents = Vec::new();

        for path in glob::glob(&pattern.to_string_lossy())?.flatten() {
            let Ok(relative) = path.strip_prefix(source_dir) else {
                continue;
            };
            let docname = relative
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let text = fs::read_to_string(&path)?;
            documents.push(Self {
                docname,
                path: Some(path),
                text,
            });
        }

        documents.sort_by(|a, b| a.docname.cmp(&b.docname));
        Ok(documents)
    }
}

/// Result of [`Application::build`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Files written, documents first, then static assets.
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// The build application.
pub struct Application {
    builder: Builder,
    env: Environment,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    hooks: Vec<DoctreeResolvedHook>,
    assets: Vec<StaticAsset>,
    warnings: Vec<String>,
}

impl Application {
    #[must_use]
    pub fn new(builder: Builder) -> Self {
        Self {
            builder,
            env: Environment::new(),
            processors: Vec::new(),
            hooks: Vec::new(),
            assets: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Set up an extension.
    #[must_use]
    pub fn with_extension(mut self, extension: &dyn Extension) -> Self {
        self.add_extension(extension);
        self
    }

    pub fn add_extension(&mut self, extension: &dyn Extension) {
        tracing::debug!(extension = extension.name(), "Setting up extension");
        extension.setup(self);
    }

    #[must_use]
    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Register a code block processor. Processors are tried in order.
    pub fn add_processor<P: CodeBlockProcessor + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    /// Register a custom node with handlers per output format.
    pub fn add_node(&mut self, name: &'static str, handlers: &[(OutputFormat, NodeHandlers)]) {
        let registry = self.env.registry_mut();
        for (format, pair) in handlers {
            registry.register(name, *format, *pair);
        }
    }

    /// Run `hook` on every document after references are resolved.
    pub fn connect_doctree_resolved(&mut self, hook: impl Fn(&mut Node, &str, &Builder) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn add_static_asset(&mut self, asset: StaticAsset) {
        self.assets.push(asset);
    }

    #[must_use]
    pub fn static_assets(&self) -> &[StaticAsset] {
        &self.assets
    }

    /// Parse a document and commit its labels to the environment.
    ///
    /// The document must already be registered with the environment.
    pub fn read(&mut self, doc: &SourceDocument) -> Result<Node, BuildError> {
        let options = ParseOptions::default().with_source(doc.path.clone(), 1);
        let ctx = ProcessContext {
            env: &self.env,
            builder: &self.builder,
            docname: &doc.docname,
        };
        let parsed = parse_with_processors(&doc.text, &options, &mut self.processors, &ctx)?;
        self.warnings.extend(parsed.warnings);
        for processor in &mut self.processors {
            self.warnings.extend(processor.take_warnings());
        }

        let mut scope = SymbolScope::new(self.env.symbols(), doc.docname.as_str());
        self.env.process_doc(&mut scope, &parsed.root)?;
        let targets = scope.into_targets();
        self.env.commit(&doc.docname, targets);

        Ok(parsed.root)
    }

    /// Resolve references and run the doctree-resolved hooks.
    pub fn resolve(&mut self, docname: &str, tree: &mut Node) -> Result<(), BuildError> {
        let scope = SymbolScope::new(self.env.symbols(), docname);
        let warnings = self.env.resolve_references(&scope, tree, &self.builder)?;
        self.warnings.extend(warnings);

        for hook in &self.hooks {
            hook(tree, docname, &self.builder);
        }
        Ok(())
    }

    /// Render a resolved document as a complete output file.
    pub fn write(&self, docname: &str, tree: &Node) -> Result<String, BuildError> {
        let body = self.env.render_fragment(tree, &self.builder)?;
        match self.builder.format() {
            OutputFormat::Html => Ok(self.html_page(docname, tree, &body)),
            OutputFormat::Text | OutputFormat::Xml => Ok(format!("{body}\n")),
        }
    }

    /// Drain warnings collected since the last build or call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Read, resolve and render a single document, body only.
    ///
    /// Warnings are kept for [`Application::take_warnings`].
    pub fn render_document(&mut self, doc: &SourceDocument) -> Result<String, BuildError> {
        self.env.add_document(doc.docname.as_str());
        let mut tree = self.read(doc)?;
        self.resolve(&doc.docname, &mut tree)?;
        self.env.render_fragment(&tree, &self.builder)
    }

    /// Build every document into `out_dir`.
    ///
    /// All documents are read before any is resolved, so references may point
    /// at documents later in the list.
    pub fn build(
        &mut self,
        sources: &[SourceDocument],
        out_dir: &Path,
    ) -> Result<BuildReport, BuildError> {
        for doc in sources {
            self.env.add_document(doc.docname.as_str());
        }

        let mut trees = Vec::with_capacity(sources.len());
        for doc in sources {
            tracing::info!(document = %doc.docname, "Reading");
            trees.push(self.read(doc)?);
        }

        let mut written = Vec::new();
        for (doc, mut tree) in sources.iter().zip(trees) {
            self.resolve(&doc.docname, &mut tree)?;
            let output = self.write(&doc.docname, &tree)?;

            let path = out_dir.join(self.builder.target_uri(&doc.docname));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, output)?;
            tracing::info!(path = %path.display(), "Wrote document");
            written.push(path);
        }

        if self.builder.is_hypertext() {
            written.extend(self.copy_static_assets(out_dir)?);
        }

        Ok(BuildReport {
            written,
            warnings: self.take_warnings(),
        })
    }

    /// Copy registered static assets to `<out_dir>/_static/`.
    pub fn copy_static_assets(&self, out_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        if self.assets.is_empty() {
            return Ok(Vec::new());
        }
        let static_dir = out_dir.join(STATIC_DIR);
        fs::create_dir_all(&static_dir)?;

        let mut written = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let path = static_dir.join(&asset.name);
            fs::write(&path, &asset.data)?;
            tracing::debug!(path = %path.display(), "Copied static asset");
            written.push(path);
        }
        Ok(written)
    }

    fn html_page(&self, docname: &str, tree: &Node, body: &str) -> String {
        let title = tree
            .find_all(|n| matches!(n.kind, NodeKind::Heading { .. }))
            .first()
            .map_or_else(|| docname.to_owned(), |h| h.astext());
        let page = self.builder.target_uri(docname);

        let mut head = String::new();
        let mut scripts = String::new();
        for asset in &self.assets {
            let href = escape_html(&relative_path(&page, &format!("{STATIC_DIR}/{}", asset.name)));
            if asset.name.ends_with(".css") {
                head.push_str(&format!("<link rel=\"stylesheet\" href=\"{href}\" />\n"));
            } else if asset.name.ends_with(".js") {
                scripts.push_str(&format!("<script src=\"{href}\"></script>\n"));
            }
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{}</title>\n{head}</head>\n<body>\n{body}{scripts}</body>\n</html>\n",
            escape_html(&title)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render_document() {
        let mut app = Application::new(Builder::html());
        let html = app
            .render_document(&SourceDocument::new("index", "# Title\n\n[self](#title)"))
            .unwrap();
        assert_eq!(
            html,
            "<h1 id=\"title\">Title</h1>\n<p><a href=\"#title\" class=\"xref\">self</a></p>\n"
        );
    }

    #[test]
    fn test_build_writes_documents_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = Application::new(Builder::html());
        app.add_static_asset(StaticAsset {
            name: "site.css".to_owned(),
            data: Cow::Borrowed(b"body {}"),
        });

        let sources = vec![
            SourceDocument::new("index", "# Home\n\nSee [usage](ref:usage).\n"),
            SourceDocument::new("guide/intro", "# Usage\n\nBack [home](ref:index).\n"),
        ];
        let report = app.build(&sources, dir.path()).unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(report.written.len(), 3);

        let index = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("<title>Home</title>"));
        assert!(index.contains(r#"href="_static/site.css""#));
        assert!(index.contains(r#"<a href="guide/intro.html#usage" class="xref">"#));

        let intro = fs::read_to_string(dir.path().join("guide/intro.html")).unwrap();
        assert!(intro.contains(r#"href="../_static/site.css""#));
        assert!(intro.contains(r#"<a href="../index.html" class="xref">"#));

        let css = fs::read_to_string(dir.path().join("_static/site.css")).unwrap();
        assert_eq!(css, "body {}");
    }

    #[test]
    fn test_text_build_skips_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = Application::new(Builder::text());
        app.add_static_asset(StaticAsset {
            name: "site.css".to_owned(),
            data: Cow::Borrowed(b""),
        });
        let report = app
            .build(&[SourceDocument::new("index", "Hello.")], dir.path())
            .unwrap();
        assert_eq!(report.written, vec![dir.path().join("index.txt")]);
        assert!(!dir.path().join("_static").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("index.txt")).unwrap(),
            "Hello.\n"
        );
    }

    #[test]
    fn test_unresolved_reference_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = Application::new(Builder::html());
        let report = app
            .build(&[SourceDocument::new("index", "[x](#missing)")], dir.path())
            .unwrap();
        assert_eq!(report.warnings, vec!["<string>:1: unresolved reference '#missing'"]);
    }

    #[test]
    fn test_reference_to_unknown_document_does_not_abort_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = Application::new(Builder::html());
        let report = app
            .build(&[SourceDocument::new("index", "[x](ref:typo#a)")], dir.path())
            .unwrap();
        assert_eq!(report.warnings, vec!["<string>:1: unresolved reference 'ref:typo#a'"]);
        assert!(dir.path().join("index.html").exists());
    }

    #[test]
    fn test_doctree_resolved_hook_runs() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut app = Application::new(Builder::html());
        app.connect_doctree_resolved(move |tree, docname, _builder| {
            assert_eq!(docname, "index");
            tree.remove_matching(&|n| matches!(n.kind, NodeKind::Strong));
            seen.set(seen.get() + 1);
        });
        let html = app
            .render_document(&SourceDocument::new("index", "a **b** c"))
            .unwrap();
        assert_eq!(html, "<p>a  c</p>\n");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_discover_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("index.md"), "# Home").unwrap();
        fs::write(dir.path().join("guide/setup.md"), "# Setup").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let docs = SourceDocument::discover(dir.path()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.docname.as_str()).collect();
        assert_eq!(names, vec!["guide/setup", "index"]);
        assert_eq!(docs[1].text, "# Home");
    }

    struct Marker;

    impl Extension for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn setup(&self, app: &mut Application) {
            app.add_static_asset(StaticAsset {
                name: "marker.js".to_owned(),
                data: Cow::Borrowed(b""),
            });
        }
    }

    #[test]
    fn test_extension_setup() {
        let app = Application::new(Builder::html()).with_extension(&Marker);
        assert_eq!(app.static_assets()[0].name, "marker.js");
    }
}
