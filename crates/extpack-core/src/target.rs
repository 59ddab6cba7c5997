use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PathsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
}

impl Browser {
    /// Every supported browser, in build order.
    pub const ALL: [Browser; 2] = [Browser::Chrome, Browser::Firefox];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

impl Display for Browser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = TargetParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "chrome" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            other => Err(TargetParseError::UnknownBrowser(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Interprets the value of `NODE_ENV`: only the exact string
    /// `production` selects the production profile.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    /// The configured top-level output directory for this environment.
    pub fn output_dir(self, paths: &PathsConfig) -> &Path {
        match self {
            Self::Production => &paths.dist,
            Self::Development => &paths.live,
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = TargetParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(TargetParseError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// A (browser, environment) pair. Lives only for one build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub browser: Browser,
    pub environment: Environment,
}

impl Target {
    pub fn new(browser: Browser, environment: Environment) -> Self {
        Self {
            browser,
            environment,
        }
    }

    /// Resolves `<root>/<dist|live>/<browser>`.
    pub fn output_path(&self, root: &Path, paths: &PathsConfig) -> PathBuf {
        root.join(self.environment.output_dir(paths))
            .join(self.browser.as_str())
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.environment, self.browser)
    }
}

#[derive(Debug, Error)]
pub enum TargetParseError {
    #[error("unknown browser '{0}' (supported: chrome, firefox)")]
    UnknownBrowser(String),
    #[error("unknown environment '{0}' (supported: production, development)")]
    UnknownEnvironment(String),
}
