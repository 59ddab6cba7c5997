//! Byte-for-byte copying of static files into an output tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use extpack_core::pipeline::CopyPattern;

/// Copies `pattern.from` into `output_root/pattern.to`.
///
/// A file lands under its own name; a directory is copied recursively with
/// its structure kept. Returns the written file paths.
pub fn copy_pattern(pattern: &CopyPattern, output_root: &Path) -> Result<Vec<PathBuf>> {
    let dest = output_root.join(&pattern.to);
    let mut written = Vec::new();

    if pattern.from.is_file() {
        let file_name = pattern
            .from
            .file_name()
            .with_context(|| format!("copy source '{}' has no file name", pattern.from.display()))?;
        fs::create_dir_all(&dest)
            .with_context(|| format!("failed to create directory '{}'", dest.display()))?;
        let target = dest.join(file_name);
        copy_file(&pattern.from, &target)?;
        written.push(target);
    } else if pattern.from.is_dir() {
        for entry in WalkDir::new(&pattern.from).follow_links(true) {
            let entry = entry
                .with_context(|| format!("failed to walk '{}'", pattern.from.display()))?;
            let relative = entry
                .path()
                .strip_prefix(&pattern.from)
                .with_context(|| format!("'{}' escaped copy root", entry.path().display()))?;
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("failed to create directory '{}'", target.display()))?;
            } else {
                copy_file(entry.path(), &target)?;
                written.push(target);
            }
        }
    } else {
        bail!("unable to locate copy source '{}'", pattern.from.display());
    }

    debug!(
        "copied {} files from {}",
        written.len(),
        pattern.from.display()
    );
    Ok(written)
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .with_context(|| format!("failed to copy '{}' to '{}'", from.display(), to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_directory_tree_under_destination() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("src/assets");
        fs::create_dir_all(assets.join("icons")).unwrap();
        fs::create_dir_all(assets.join("empty")).unwrap();
        fs::write(assets.join("icons/48.png"), b"icon").unwrap();
        fs::write(assets.join("logo.svg"), b"<svg/>").unwrap();
        let out = dir.path().join("dist/chrome");

        let pattern = CopyPattern {
            from: assets,
            to: PathBuf::from("assets"),
        };
        let mut written = copy_pattern(&pattern, &out).unwrap();
        written.sort();

        assert_eq!(
            written,
            vec![out.join("assets/icons/48.png"), out.join("assets/logo.svg")]
        );
        assert!(out.join("assets/empty").is_dir());
        assert_eq!(fs::read(out.join("assets/logo.svg")).unwrap(), b"<svg/>");
    }

    #[test]
    fn copies_single_file_into_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("LICENSE"), b"MIT").unwrap();
        let out = dir.path().join("out");

        let pattern = CopyPattern {
            from: dir.path().join("LICENSE"),
            to: PathBuf::new(),
        };
        let written = copy_pattern(&pattern, &out).unwrap();

        assert_eq!(written, vec![out.join("LICENSE")]);
        assert_eq!(fs::read(out.join("LICENSE")).unwrap(), b"MIT");
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let pattern = CopyPattern {
            from: dir.path().join("README.md"),
            to: PathBuf::new(),
        };
        let err = copy_pattern(&pattern, dir.path()).expect_err("must fail");
        assert!(err.to_string().contains("unable to locate copy source"));
    }
}
