//! Stylesheet minification backed by lightningcss.

use std::path::Path;

use anyhow::{anyhow, Result};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};

/// Parses `source` and prints it minified. `path` only labels errors.
pub fn minify(path: &Path, source: &str) -> Result<String> {
    let filename = path.to_string_lossy().to_string();
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename,
            ..Default::default()
        },
    )
    .map_err(|e| anyhow!("failed to parse stylesheet '{}': {e}", path.display()))?;

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| anyhow!("failed to minify stylesheet '{}': {e}", path.display()))?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| anyhow!("failed to print stylesheet '{}': {e}", path.display()))?;
    Ok(printed.code)
}
