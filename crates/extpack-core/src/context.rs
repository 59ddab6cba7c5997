use std::path::{Path, PathBuf};

use crate::config::ExtpackConfig;
use crate::manifest::ManifestTemplate;
use crate::target::{Browser, Environment, Target};

/// Immutable settings for one build invocation.
///
/// Constructed once from the CLI and passed by reference to the directory
/// manager, manifest deriver, pipeline configurator and emitter.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub root: PathBuf,
    pub environment: Environment,
    pub config: ExtpackConfig,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, environment: Environment, config: ExtpackConfig) -> Self {
        Self {
            root: root.into(),
            environment,
            config,
        }
    }

    pub fn target(&self, browser: Browser) -> Target {
        Target::new(browser, self.environment)
    }

    /// `<root>/<dist|live>`
    pub fn environment_root(&self) -> PathBuf {
        self.root
            .join(self.environment.output_dir(&self.config.paths))
    }

    /// `<root>/<dist|live>/<browser>`
    pub fn output_path(&self, browser: Browser) -> PathBuf {
        self.target(browser)
            .output_path(&self.root, &self.config.paths)
    }

    pub fn template(&self) -> ManifestTemplate {
        ManifestTemplate::new(self.resolve(&self.config.paths.template))
    }

    /// Resolves a project-relative path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}
