//! Browser manifest derivation.
//!
//! One template, two manifests. Each derivation reads the template from
//! disk again and builds a fresh document, so the template itself is never
//! mutated and no derivation can observe another's edits.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::constants::MANIFEST_OUTPUT;
use crate::context::BuildContext;
use crate::target::Browser;

const CHROME_REMOVED: &[&str] = &[
    "sidebar_action",
    "devtools_page",
    "content_scripts",
    "browser_specific_settings",
];
const CHROME_BACKGROUND_REMOVED: &[&str] = &["scripts"];

const FIREFOX_REMOVED: &[&str] = &["side_panel", "devtools_page", "content_scripts"];
const FIREFOX_BACKGROUND_REMOVED: &[&str] = &["service_worker"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest template root must be a JSON object")]
    NotAnObject,
}

/// Top-level keys dropped from the template for `browser`.
pub fn removed_keys(browser: Browser) -> &'static [&'static str] {
    match browser {
        Browser::Chrome => CHROME_REMOVED,
        Browser::Firefox => FIREFOX_REMOVED,
    }
}

/// Keys dropped from the `background` object for `browser`.
pub fn removed_background_keys(browser: Browser) -> &'static [&'static str] {
    match browser {
        Browser::Chrome => CHROME_BACKGROUND_REMOVED,
        Browser::Firefox => FIREFOX_BACKGROUND_REMOVED,
    }
}

/// The on-disk manifest template.
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    path: PathBuf,
}

impl ManifestTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the template. Never cached.
    pub fn load(&self) -> Result<Value> {
        let text = fs::read_to_string(&self.path).with_context(|| {
            format!("failed to read manifest template: {}", self.path.display())
        })?;
        let value = serde_json::from_str::<Value>(&text).with_context(|| {
            format!("failed to parse manifest template: {}", self.path.display())
        })?;
        Ok(value)
    }

    /// Loads the template and derives the manifest for `browser`.
    pub fn derive(&self, browser: Browser) -> Result<Value> {
        let template = self.load()?;
        Ok(derive_manifest(&template, browser)?)
    }
}

/// Builds the manifest for `browser` from `template`.
///
/// `action` is always an empty object; the popup or side panel behaviour is
/// wired at runtime by the background script.
pub fn derive_manifest(template: &Value, browser: Browser) -> Result<Value, ManifestError> {
    let source = template.as_object().ok_or(ManifestError::NotAnObject)?;
    let removed = removed_keys(browser);
    let removed_background = removed_background_keys(browser);

    let mut derived = Map::new();
    for (key, value) in source {
        if removed.contains(&key.as_str()) {
            continue;
        }

        let value = match (key.as_str(), value) {
            ("action", _) => Value::Object(Map::new()),
            ("background", Value::Object(background)) => Value::Object(
                background
                    .iter()
                    .filter(|(k, _)| !removed_background.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => value.clone(),
        };
        derived.insert(key.clone(), value);
    }

    derived
        .entry("action")
        .or_insert_with(|| Value::Object(Map::new()));

    debug!(
        "derived {} manifest with {} keys",
        browser,
        derived.len()
    );
    Ok(Value::Object(derived))
}

/// Serializes a manifest with two-space indentation.
pub fn render_manifest(manifest: &Value) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest")
}

/// Derives the manifest for `browser` and writes it into the browser's
/// output tree, replacing any existing file.
#[instrument(skip(ctx), fields(env = %ctx.environment))]
pub fn write_manifest(ctx: &BuildContext, browser: Browser) -> Result<PathBuf> {
    let manifest = ctx.template().derive(browser)?;
    let rendered = render_manifest(&manifest)?;

    let path = ctx.output_path(browser).join(MANIFEST_OUTPUT);
    fs::write(&path, rendered)
        .with_context(|| format!("failed to write manifest '{}'", path.display()))?;

    info!(target: "extpack", "wrote {}", path.display());
    Ok(path)
}
