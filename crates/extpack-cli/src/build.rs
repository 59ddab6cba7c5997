use std::time::Instant;

use anyhow::Result;
use tracing::{info, instrument};

use extpack_core::{manifest, outdir, Browser, BuildContext, PipelineConfig};
use extpack_emit::{OxcCompiler, ScriptCompiler};

use crate::executor::CommandCompiler;

/// Runs one full build cycle for every browser.
///
/// Pipelines are validated before any directory is touched, so a config
/// error never wipes a previous production build.
#[instrument(skip(ctx), fields(env = %ctx.environment))]
pub fn run(ctx: &BuildContext) -> Result<()> {
    let start = Instant::now();
    let pipelines = Browser::ALL
        .iter()
        .map(|browser| PipelineConfig::for_target(ctx, *browser))
        .collect::<Result<Vec<_>, _>>()?;
    let compiler = compiler_for(ctx);

    outdir::prepare(ctx)?;
    for browser in Browser::ALL {
        manifest::write_manifest(ctx, browser)?;
    }
    for pipeline in &pipelines {
        extpack_emit::emit(pipeline, compiler.as_ref())?;
    }

    info!(target: "extpack",
        "{} build finished in {}ms",
        ctx.environment,
        start.elapsed().as_millis()
    );
    Ok(())
}

fn compiler_for(ctx: &BuildContext) -> Box<dyn ScriptCompiler> {
    match &ctx.config.bundler {
        Some(bundler) => Box::new(CommandCompiler::new(bundler.clone())),
        None => Box::new(OxcCompiler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extpack_core::{Environment, ExtpackConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    const TEMPLATE: &str = include_str!("../resources/manifest.template.json");

    fn scaffold(root: &Path) {
        let src = root.join("src");
        fs::create_dir_all(src.join("assets")).unwrap();
        for name in ["background", "popup", "sidepanel", "devtools", "panel"] {
            fs::write(src.join(format!("{name}.js")), "// entry\n").unwrap();
        }
        for name in ["popup", "sidepanel", "devtools", "panel", "rate_extension"] {
            fs::write(src.join(format!("{name}.html")), "<html><head></head><body></body></html>").unwrap();
        }
        fs::write(src.join("assets/icon.png"), b"png").unwrap();
        fs::write(root.join("README.md"), "readme").unwrap();
        fs::write(root.join("LICENSE"), "license").unwrap();
        fs::write(root.join("manifest.template.json"), TEMPLATE).unwrap();
    }

    fn tree(dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(dir)
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().strip_prefix(dir).unwrap().display().to_string())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn second_production_build_leaves_no_stale_files() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        let ctx = BuildContext::new(dir.path(), Environment::Production, ExtpackConfig::default());

        run(&ctx).unwrap();
        let first = tree(&dir.path().join("dist/chrome"));
        fs::write(dir.path().join("dist/chrome/leftover.js"), "stale").unwrap();
        fs::create_dir_all(dir.path().join("dist/firefox/old/nested")).unwrap();

        run(&ctx).unwrap();

        assert_eq!(tree(&dir.path().join("dist/chrome")), first);
        assert!(!dir.path().join("dist/firefox/old").exists());
        assert!(first.contains(&"manifest.json".to_string()));
        assert!(first.contains(&"assets/icon.png".to_string()));
    }

    #[test]
    fn development_build_writes_both_live_trees() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        let ctx = BuildContext::new(dir.path(), Environment::Development, ExtpackConfig::default());

        run(&ctx).unwrap();

        let chrome: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("live/chrome/manifest.json")).unwrap()).unwrap();
        let firefox: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("live/firefox/manifest.json")).unwrap()).unwrap();
        assert!(chrome.get("side_panel").is_some());
        assert!(chrome.get("sidebar_action").is_none());
        assert!(firefox.get("sidebar_action").is_some());
        assert!(firefox.get("side_panel").is_none());
        assert!(dir.path().join("live/firefox/panel.js").is_file());
    }

    #[test]
    fn invalid_pipeline_does_not_touch_previous_output() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        let previous = dir.path().join("dist/chrome/popup.js");
        fs::create_dir_all(previous.parent().unwrap()).unwrap();
        fs::write(&previous, "shipped").unwrap();

        let cfg: ExtpackConfig = toml_fixture();
        let ctx = BuildContext::new(dir.path(), Environment::Production, cfg);

        assert!(run(&ctx).is_err());
        assert!(previous.exists());
    }

    fn toml_fixture() -> ExtpackConfig {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extpack.toml");
        fs::write(
            &path,
            r#"
            [[entry]]
            name = "popup"
            source = "src/popup.js"

            [[entry]]
            name = "popup"
            source = "src/panel.js"
            "#,
        )
        .unwrap();
        ExtpackConfig::load_from_file(&path.to_string_lossy()).unwrap()
    }
}
