//! Executes a [`PipelineConfig`] into an output tree.
//!
//! Scripts go through a [`ScriptCompiler`]; stylesheets, HTML pages and
//! copied files are produced here.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use extpack_core::{Environment, MinifyOptions, PipelineConfig};

pub mod copy;
pub mod css;
pub mod html;
pub mod script;

pub use script::OxcCompiler;

/// One entry script to compile.
#[derive(Debug, Clone)]
pub struct ScriptJob {
    pub name: String,
    pub source: PathBuf,
    pub outfile: PathBuf,
    pub mode: Environment,
    pub minify: Option<MinifyOptions>,
}

/// Turns an entry source into its output script.
pub trait ScriptCompiler: std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;
    fn compile(&self, job: &ScriptJob) -> Result<()>;
    /// Whether the compiler honours `job.minify`.
    fn minifies(&self) -> bool {
        false
    }
}

/// Files written by one emit, relative to the output root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub files: Vec<PathBuf>,
}

impl EmitReport {
    fn record(&mut self, root: &Path, path: &Path) {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.files.push(relative.to_path_buf());
    }

    pub fn contains(&self, relative: impl AsRef<Path>) -> bool {
        self.files.iter().any(|f| f == relative.as_ref())
    }
}

/// Writes scripts, stylesheets, pages and copied files for one browser.
///
/// The output root must already exist.
#[instrument(skip_all, fields(browser = %pipeline.browser, mode = %pipeline.mode))]
pub fn emit(pipeline: &PipelineConfig, compiler: &dyn ScriptCompiler) -> Result<EmitReport> {
    let root = &pipeline.output.path;
    let mut report = EmitReport::default();

    if pipeline.minify.is_some() && !compiler.minifies() {
        info!(target: "extpack", "{} compiler does not minify scripts; set [bundler].minify_args or drop [bundler]", compiler.name());
    }

    let mut styled = HashSet::new();
    for entry in pipeline.entries.iter() {
        let outfile = pipeline.output.script_for(&entry.name);
        let job = ScriptJob {
            name: entry.name.clone(),
            source: entry.source.clone(),
            outfile: outfile.clone(),
            mode: pipeline.mode,
            minify: pipeline.minify,
        };
        compiler
            .compile(&job)
            .with_context(|| format!("failed to compile entry '{}'", entry.name))?;
        report.record(root, &outfile);

        let style_source = pipeline.styles.source_for(entry);
        if style_source.is_file() {
            let stylesheet = fs::read_to_string(&style_source)
                .with_context(|| format!("failed to read '{}'", style_source.display()))?;
            let stylesheet = match pipeline.minify {
                Some(_) => css::minify(&style_source, &stylesheet)?,
                None => stylesheet,
            };
            let out = root.join(pipeline.styles.file_name_for(&entry.name));
            fs::write(&out, stylesheet).with_context(|| format!("failed to write '{}'", out.display()))?;
            report.record(root, &out);
            styled.insert(entry.name.as_str());
        } else {
            debug!("entry {} has no stylesheet", entry.name);
        }
    }

    for page in &pipeline.pages {
        let template = fs::read_to_string(&page.template).with_context(|| {
            format!("failed to read page template '{}'", page.template.display())
        })?;
        let tags = html::asset_tags(&page.chunks, &styled, &pipeline.output, &pipeline.styles);
        let mut rendered = html::inject(&template, &tags);
        if let Some(opts) = &pipeline.minify {
            rendered = html::minify(&rendered, opts);
        }
        let out = root.join(&page.filename);
        fs::write(&out, rendered).with_context(|| format!("failed to write '{}'", out.display()))?;
        report.record(root, &out);
    }

    for pattern in &pipeline.copy {
        for written in copy::copy_pattern(pattern, root)? {
            report.record(root, &written);
        }
    }

    info!(target: "extpack", "emitted {} files into {}", report.files.len(), root.display());
    Ok(report)
}
