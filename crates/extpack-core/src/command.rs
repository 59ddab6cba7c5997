//! `xpk` commands, written as `name` or `name:browser`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::target::{Browser, TargetParseError};

/// A command with its browser selector already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    Build,
    Clean,
    /// Print the manifest derived for one browser.
    Manifest(Browser),
    /// Print pipelines as JSON; `None` means every browser.
    Plan(Option<Browser>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Build => "build",
            Self::Clean => "clean",
            Self::Manifest(_) => "manifest",
            Self::Plan(_) => "plan",
        }
    }

    /// Browsers the command applies to.
    pub fn browsers(&self) -> Vec<Browser> {
        match self {
            Self::Manifest(browser) | Self::Plan(Some(browser)) => vec![*browser],
            _ => Browser::ALL.to_vec(),
        }
    }

    /// Builds a command from a name and an optional browser selector, as
    /// given by `xpk manifest firefox`.
    pub fn from_parts(name: &str, selector: Option<&str>) -> Result<Self, CommandParseError> {
        let browser = selector.map(Browser::from_str).transpose()?;
        let command = match (name, browser) {
            ("init", None) => Self::Init,
            ("build", None) => Self::Build,
            ("clean", None) => Self::Clean,
            ("manifest", Some(browser)) => Self::Manifest(browser),
            ("manifest", None) => return Err(CommandParseError::MissingBrowser("manifest")),
            ("plan", browser) => Self::Plan(browser),
            ("init" | "build" | "clean", Some(browser)) => {
                return Err(CommandParseError::UnexpectedBrowser {
                    command: name.to_string(),
                    browser,
                })
            }
            _ => return Err(CommandParseError::UnknownCommand(name.to_string())),
        };
        Ok(command)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest(browser) | Self::Plan(Some(browser)) => {
                write!(f, "{}:{}", self.name(), browser)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (expected init, build, clean, manifest or plan)")]
    UnknownCommand(String),
    #[error("{0} requires a browser, for example {0}:chrome")]
    MissingBrowser(&'static str),
    #[error("{command} builds every browser and takes no selector (got '{browser}')")]
    UnexpectedBrowser { command: String, browser: Browser },
    #[error(transparent)]
    Browser(#[from] TargetParseError),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            Some((name, selector)) => Self::from_parts(name, Some(selector)),
            None => Self::from_parts(value, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_browserless_commands() {
        assert_eq!(Command::from_str("build").unwrap(), Command::Build);
        assert_eq!(Command::from_str("plan").unwrap(), Command::Plan(None));
        assert_eq!(Command::Plan(None).browsers(), Browser::ALL.to_vec());
    }

    #[test]
    fn colon_and_separate_selector_agree() {
        let joined = Command::from_str("manifest:firefox").unwrap();
        let split = Command::from_parts("manifest", Some("firefox")).unwrap();

        assert_eq!(joined, Command::Manifest(Browser::Firefox));
        assert_eq!(joined, split);
        assert_eq!(joined.to_string(), "manifest:firefox");
        assert_eq!(joined.browsers(), vec![Browser::Firefox]);
    }

    #[test]
    fn manifest_needs_a_known_browser() {
        let err = Command::from_str("manifest").unwrap_err();
        assert!(matches!(err, CommandParseError::MissingBrowser("manifest")));

        let err = Command::from_str("manifest:edge").unwrap_err();
        assert!(err.to_string().contains("unknown browser 'edge'"));
    }

    #[test]
    fn whole_tree_commands_reject_a_selector() {
        let err = Command::from_str("build:chrome").unwrap_err();
        assert!(matches!(
            err,
            CommandParseError::UnexpectedBrowser { browser: Browser::Chrome, .. }
        ));
    }

    #[test]
    fn rejects_unknown_command() {
        let err = Command::from_str("deploy:chrome").unwrap_err();
        assert!(matches!(err, CommandParseError::UnknownCommand(_)));
    }
}
