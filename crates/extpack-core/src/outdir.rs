//! Output directory management.
//!
//! Production trees are recreated empty on every build; development trees
//! are only created when absent. Any filesystem error aborts the build.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, instrument};

use crate::context::BuildContext;
use crate::target::{Browser, Environment};

/// Removes `path` and everything below it. Absent paths are a no-op.
///
/// Symbolic links inside the tree are unlinked, never followed.
pub fn clean(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("clean: {} is absent", path.display());
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to inspect '{}'", path.display()))
        }
    };

    if !metadata.is_dir() {
        bail!("cannot clean '{}': not a directory", path.display());
    }

    fs::remove_dir_all(path)
        .with_context(|| format!("failed to remove directory '{}'", path.display()))?;
    debug!("clean: removed {}", path.display());
    Ok(())
}

/// Creates `path` and its missing parents when `should_create` is set and
/// the path is absent.
pub fn ensure_exists(path: &Path, should_create: bool) -> Result<()> {
    if !should_create {
        return Ok(());
    }

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => bail!(
            "cannot create directory '{}': a file is in the way",
            path.display()
        ),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir_all(path)
                .with_context(|| format!("failed to create directory '{}'", path.display()))?;
            debug!("created {}", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("failed to inspect '{}'", path.display())),
    }
}

/// Prepares the output trees for every browser and returns their roots in
/// build order.
#[instrument(skip(ctx), fields(env = %ctx.environment))]
pub fn prepare(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let outputs: Vec<PathBuf> = Browser::ALL
        .iter()
        .map(|browser| ctx.output_path(*browser))
        .collect();

    if ctx.environment == Environment::Production {
        for output in &outputs {
            clean(output)?;
        }
    }

    ensure_exists(&ctx.environment_root(), true)?;
    for output in &outputs {
        ensure_exists(output, true)?;
    }

    Ok(outputs)
}
