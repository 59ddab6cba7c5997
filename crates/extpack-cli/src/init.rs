use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use tracing::{info, instrument};

use crate::Cli;

const CONFIG_SCAFFOLD: &str = include_str!("../resources/extpack.toml");
const TEMPLATE_SCAFFOLD: &str = include_str!("../resources/manifest.template.json");

/// Runs the `init` command to scaffold a new extpack project.
#[instrument(skip(cli))]
pub fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.root.join(&cli.config);
    write_if_absent(&config_path, CONFIG_SCAFFOLD, cli.force)
        .with_context(|| format!("failed to write '{}'", config_path.display()))?;

    // The scaffold config is parsed back so a broken resource fails here.
    let cfg = extpack_core::ExtpackConfig::load_from_file(&config_path.to_string_lossy())?;

    let template_path = cli.root.join(&cfg.paths.template);
    write_if_absent(&template_path, TEMPLATE_SCAFFOLD, cli.force)
        .with_context(|| format!("failed to write '{}'", template_path.display()))?;

    info!(
        "init complete: config={}, template={}",
        config_path.display(),
        template_path.display()
    );
    println!("next: add your entry scripts under src/ and run 'xpk build'");

    Ok(())
}

fn write_if_absent(output: &Path, content: &str, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            output.display()
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}
