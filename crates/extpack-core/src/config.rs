use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::*;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtpackConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Script entry points. `None` selects the built-in five entries.
    #[serde(default, rename = "entry")]
    pub entries: Option<Vec<EntryConfig>>,
    /// Generated HTML pages. `None` selects the built-in five pages.
    #[serde(default, rename = "page")]
    pub pages: Option<Vec<PageConfig>>,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub minify: MinifyConfig,
    pub bundler: Option<BundlerConfig>,
}

impl ExtpackConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let cfg = toml::from_str::<Self>(&text)
            .with_context(|| format!("failed to parse TOML config: {path}"))?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "extension".to_string(),
        }
    }
}

/// Project-relative locations of inputs and outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub template: PathBuf,
    pub src: PathBuf,
    pub assets: PathBuf,
    pub dist: PathBuf,
    pub live: PathBuf,
    /// Files copied verbatim into the root of every output tree.
    pub copy: Vec<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from(MANIFEST_TEMPLATE),
            src: PathBuf::from(DIR_SRC),
            assets: PathBuf::from(DIR_ASSETS),
            dist: PathBuf::from(DIR_DIST),
            live: PathBuf::from(DIR_LIVE),
            copy: vec![PathBuf::from("README.md"), PathBuf::from("LICENSE")],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    pub name: String,
    pub source: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub name: String,
    /// Defaults to `<src>/<name>.html`.
    pub template: Option<PathBuf>,
    /// Defaults to `<name>.html`.
    pub filename: Option<String>,
    #[serde(default)]
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub aggregate_timeout_ms: u64,
    pub poll_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            aggregate_timeout_ms: WATCH_AGGREGATE_TIMEOUT_MS,
            poll_ms: WATCH_POLL_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    pub drop_console: bool,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self { drop_console: true }
    }
}

/// An external program used to compile entry scripts.
#[derive(Debug, Clone, Deserialize)]
pub struct BundlerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Appended to `args` for production builds.
    #[serde(default)]
    pub minify_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: ExtpackConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.paths.template, PathBuf::from("manifest.template.json"));
        assert_eq!(cfg.paths.dist, PathBuf::from("dist"));
        assert_eq!(cfg.watch.aggregate_timeout_ms, 1000);
        assert!(cfg.minify.drop_console);
        assert!(cfg.entries.is_none());
        assert!(cfg.bundler.is_none());
    }

    #[test]
    fn parses_entries_pages_and_bundler() {
        let cfg: ExtpackConfig = toml::from_str(
            r#"
            [project]
            name = "demo"

            [paths]
            dist = "out"

            [[entry]]
            name = "popup"
            source = "src/popup.ts"

            [[page]]
            name = "popup"
            chunks = ["popup"]

            [watch]
            poll_ms = 250

            [bundler]
            program = "esbuild"
            args = ["{entry}", "--outfile={outfile}"]
            "#,
        )
        .expect("fixture config should parse");

        assert_eq!(cfg.project.name, "demo");
        assert_eq!(cfg.paths.dist, PathBuf::from("out"));
        assert_eq!(cfg.paths.live, PathBuf::from("live"));
        assert_eq!(cfg.entries.as_ref().map(Vec::len), Some(1));
        assert_eq!(cfg.pages.as_ref().map(|p| p[0].chunks.clone()), Some(vec!["popup".to_string()]));
        assert_eq!(cfg.watch.poll_ms, 250);
        assert_eq!(cfg.watch.aggregate_timeout_ms, 1000);
        let bundler = cfg.bundler.expect("bundler should be set");
        assert_eq!(bundler.program, "esbuild");
        assert!(bundler.minify_args.is_empty());
    }

    #[test]
    fn load_from_file_reports_missing_file() {
        let err = ExtpackConfig::load_from_file("/nonexistent/extpack.toml").expect_err("must fail");
        assert!(err.to_string().contains("failed to read config file"));
    }
}
