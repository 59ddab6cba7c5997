//! Per-browser build pipeline configuration.
//!
//! A [`PipelineConfig`] is a declarative description of one browser build:
//! which scripts to compile, where outputs land, which pages to generate,
//! what to copy, and whether to minify or watch. It is consumed by the
//! emitter and printed as JSON by `xpk plan`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::WatchConfig;
use crate::constants::{SCRIPT_FILENAME, STYLE_FILENAME};
use crate::context::BuildContext;
use crate::entry::{Entry, EntryError, EntryMap};
use crate::target::{Browser, Environment};

/// Pages generated for every browser, with the entry each one loads.
const DEFAULT_PAGES: &[(&str, Option<&str>)] = &[
    ("popup", Some("popup")),
    ("sidepanel", Some("sidepanel")),
    ("devtools", Some("devtools")),
    ("panel", Some("panel")),
    ("rate_extension", None),
];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error("page '{page}' references unknown entry '{chunk}'")]
    UnknownChunk { page: String, chunk: String },
    #[error("page output '{0}' is generated twice")]
    DuplicatePage(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub browser: Browser,
    pub mode: Environment,
    pub entries: EntryMap,
    pub output: OutputOptions,
    pub styles: StyleOptions,
    pub pages: Vec<HtmlPage>,
    pub minify: Option<MinifyOptions>,
    pub copy: Vec<CopyPattern>,
    pub watch: Option<WatchOptions>,
    pub source_maps: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputOptions {
    pub path: PathBuf,
    pub filename: String,
}

impl OutputOptions {
    /// Output file for the script of entry `name`.
    pub fn script_for(&self, name: &str) -> PathBuf {
        self.path.join(self.filename.replace("[name]", name))
    }
}

/// Stylesheets are extracted into standalone files, one per entry.
#[derive(Debug, Clone, Serialize)]
pub struct StyleOptions {
    pub filename: String,
}

impl StyleOptions {
    pub fn file_name_for(&self, name: &str) -> String {
        self.filename.replace("[name]", name)
    }

    /// The stylesheet belonging to `entry`: the `.css` sibling of its source.
    pub fn source_for(&self, entry: &Entry) -> PathBuf {
        entry.source.with_extension("css")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlPage {
    pub template: PathBuf,
    pub filename: String,
    /// Entries whose script and stylesheet the page loads.
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinifyOptions {
    pub drop_console: bool,
    pub remove_comments: bool,
    pub collapse_whitespace: bool,
    pub remove_attribute_quotes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyPattern {
    pub from: PathBuf,
    /// Destination relative to the output root; empty means the root itself.
    pub to: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatchOptions {
    pub aggregate_timeout_ms: u64,
    pub poll_ms: u64,
}

impl WatchOptions {
    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self {
            aggregate_timeout_ms: cfg.aggregate_timeout_ms,
            poll_ms: cfg.poll_ms,
        }
    }

    /// Quiet period after the last change before a rebuild starts.
    pub fn aggregate_timeout(&self) -> Duration {
        Duration::from_millis(self.aggregate_timeout_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl PipelineConfig {
    /// Assembles and validates the pipeline for `browser`.
    #[instrument(skip(ctx), fields(env = %ctx.environment))]
    pub fn for_target(ctx: &BuildContext, browser: Browser) -> Result<Self, PipelineError> {
        let cfg = &ctx.config;
        let src = ctx.resolve(&cfg.paths.src);
        let production = ctx.environment.is_production();

        let entries = match &cfg.entries {
            Some(list) => EntryMap::from_entries(
                list.iter()
                    .map(|e| Entry::new(e.name.clone(), ctx.resolve(&e.source))),
            )?,
            None => EntryMap::defaults(&src),
        };

        let pages: Vec<HtmlPage> = match &cfg.pages {
            Some(list) => list
                .iter()
                .map(|page| HtmlPage {
                    template: page
                        .template
                        .as_ref()
                        .map(|t| ctx.resolve(t))
                        .unwrap_or_else(|| src.join(format!("{}.html", page.name))),
                    filename: page
                        .filename
                        .clone()
                        .unwrap_or_else(|| format!("{}.html", page.name)),
                    chunks: page.chunks.clone(),
                })
                .collect(),
            None => DEFAULT_PAGES
                .iter()
                .map(|(name, chunk)| HtmlPage {
                    template: src.join(format!("{name}.html")),
                    filename: format!("{name}.html"),
                    chunks: chunk.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        };
        validate_pages(&pages, &entries)?;

        let mut copy = vec![CopyPattern {
            from: ctx.resolve(&cfg.paths.assets),
            to: PathBuf::from("assets"),
        }];
        copy.extend(cfg.paths.copy.iter().map(|from| CopyPattern {
            from: ctx.resolve(from),
            to: PathBuf::new(),
        }));

        let minify = production.then_some(MinifyOptions {
            drop_console: cfg.minify.drop_console,
            remove_comments: true,
            collapse_whitespace: true,
            remove_attribute_quotes: true,
        });

        let watch = (!production).then(|| WatchOptions::from_config(&cfg.watch));

        debug!(
            "pipeline for {}: {} entries, {} pages",
            browser,
            entries.len(),
            pages.len()
        );

        Ok(Self {
            browser,
            mode: ctx.environment,
            entries,
            output: OutputOptions {
                path: ctx.output_path(browser),
                filename: SCRIPT_FILENAME.to_string(),
            },
            styles: StyleOptions {
                filename: STYLE_FILENAME.to_string(),
            },
            pages,
            minify,
            copy,
            watch,
            source_maps: false,
        })
    }
}

fn validate_pages(pages: &[HtmlPage], entries: &EntryMap) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for page in pages {
        if !seen.insert(page.filename.as_str()) {
            return Err(PipelineError::DuplicatePage(page.filename.clone()));
        }
        for chunk in &page.chunks {
            if !entries.contains(chunk) {
                return Err(PipelineError::UnknownChunk {
                    page: page.filename.clone(),
                    chunk: chunk.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntryConfig, ExtpackConfig, PageConfig};
    use std::path::Path;

    fn ctx(environment: Environment, config: ExtpackConfig) -> BuildContext {
        BuildContext::new("/work", environment, config)
    }

    #[test]
    fn production_pipeline_minifies_and_does_not_watch() {
        let p = PipelineConfig::for_target(&ctx(Environment::Production, ExtpackConfig::default()), Browser::Chrome)
            .unwrap();

        assert_eq!(p.output.path, PathBuf::from("/work/dist/chrome"));
        assert_eq!(p.output.script_for("popup"), PathBuf::from("/work/dist/chrome/popup.js"));
        let minify = p.minify.expect("production minifies");
        assert!(minify.drop_console && minify.collapse_whitespace);
        assert!(p.watch.is_none());
        assert!(!p.source_maps);
    }

    #[test]
    fn development_pipeline_watches_without_minifying() {
        let p = PipelineConfig::for_target(&ctx(Environment::Development, ExtpackConfig::default()), Browser::Firefox)
            .unwrap();

        assert_eq!(p.output.path, PathBuf::from("/work/live/firefox"));
        assert!(p.minify.is_none());
        let watch = p.watch.expect("development watches");
        assert_eq!(watch.aggregate_timeout().as_millis(), 1000);
        assert_eq!(watch.poll().as_millis(), 1000);
    }

    #[test]
    fn default_pages_bind_one_entry_each_except_rate_page() {
        let p = PipelineConfig::for_target(&ctx(Environment::Production, ExtpackConfig::default()), Browser::Chrome)
            .unwrap();

        let bindings: Vec<(&str, Vec<&str>)> = p
            .pages
            .iter()
            .map(|page| {
                (
                    page.filename.as_str(),
                    page.chunks.iter().map(String::as_str).collect(),
                )
            })
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("popup.html", vec!["popup"]),
                ("sidepanel.html", vec!["sidepanel"]),
                ("devtools.html", vec!["devtools"]),
                ("panel.html", vec!["panel"]),
                ("rate_extension.html", vec![]),
            ]
        );
        assert_eq!(p.pages[3].template, PathBuf::from("/work/src/panel.html"));
    }

    #[test]
    fn copies_assets_and_top_level_files() {
        let p = PipelineConfig::for_target(&ctx(Environment::Production, ExtpackConfig::default()), Browser::Chrome)
            .unwrap();

        assert_eq!(
            p.copy,
            vec![
                CopyPattern { from: PathBuf::from("/work/src/assets"), to: PathBuf::from("assets") },
                CopyPattern { from: PathBuf::from("/work/README.md"), to: PathBuf::new() },
                CopyPattern { from: PathBuf::from("/work/LICENSE"), to: PathBuf::new() },
            ]
        );
    }

    #[test]
    fn configured_duplicate_entry_fails_fast() {
        let config = ExtpackConfig {
            entries: Some(vec![
                EntryConfig { name: "devtools".into(), source: "src/devtools.js".into() },
                EntryConfig { name: "devtools".into(), source: "src/panel.js".into() },
            ]),
            pages: Some(vec![]),
            ..ExtpackConfig::default()
        };

        let err = PipelineConfig::for_target(&ctx(Environment::Production, config), Browser::Chrome)
            .expect_err("duplicate entry must fail");
        assert!(matches!(err, PipelineError::Entry(EntryError::Duplicate { .. })));
    }

    #[test]
    fn page_with_unknown_chunk_is_rejected() {
        let config = ExtpackConfig {
            entries: Some(vec![EntryConfig { name: "popup".into(), source: "src/popup.js".into() }]),
            pages: Some(vec![PageConfig {
                name: "options".into(),
                template: None,
                filename: None,
                chunks: vec!["options".into()],
            }]),
            ..ExtpackConfig::default()
        };

        let err = PipelineConfig::for_target(&ctx(Environment::Production, config), Browser::Chrome)
            .expect_err("unknown chunk must fail");
        assert!(matches!(err, PipelineError::UnknownChunk { .. }));
    }

    #[test]
    fn style_source_is_script_sibling() {
        let styles = StyleOptions { filename: STYLE_FILENAME.to_string() };
        let entry = Entry::new("popup", "/work/src/popup.js");
        assert_eq!(styles.source_for(&entry), Path::new("/work/src/popup.css"));
        assert_eq!(styles.file_name_for("popup"), "popup.css");
    }

    #[test]
    fn plan_serializes_to_json() {
        let p = PipelineConfig::for_target(&ctx(Environment::Development, ExtpackConfig::default()), Browser::Firefox)
            .unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["browser"], "firefox");
        assert_eq!(json["mode"], "development");
        assert_eq!(json["entries"][4]["name"], "panel");
        assert_eq!(json["watch"]["poll_ms"], 1000);
        assert!(json["minify"].is_null());
    }
}
