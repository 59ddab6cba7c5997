use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Logical entries compiled for every browser, in registration order.
pub const DEFAULT_ENTRIES: &[&str] = &["background", "popup", "sidepanel", "devtools", "panel"];

/// A named script compiled into one independently loadable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub source: PathBuf,
}

impl Entry {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry '{name}' is registered twice ({} and {})", first.display(), second.display())]
    Duplicate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("invalid entry name '{0}': must be non-empty and contain no path separators")]
    InvalidName(String),
}

/// Entry points keyed by name. Names are unique; registration order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryMap {
    entries: Vec<Entry>,
}

impl EntryMap {
    /// Builds a map, rejecting the first repeated name instead of letting
    /// the later registration replace the earlier one.
    pub fn from_entries<I>(entries: I) -> Result<Self, EntryError>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut map = Self::default();
        for entry in entries {
            map.insert(entry)?;
        }
        Ok(map)
    }

    /// The five built-in entries, each sourced from `<src>/<name>.js`.
    pub fn defaults(src: &Path) -> Self {
        Self {
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|name| Entry::new(*name, src.join(format!("{name}.js"))))
                .collect(),
        }
    }

    pub fn insert(&mut self, entry: Entry) -> Result<(), EntryError> {
        if entry.name.is_empty() || entry.name.contains(['/', '\\']) {
            return Err(EntryError::InvalidName(entry.name));
        }
        if let Some(existing) = self.get(&entry.name) {
            return Err(EntryError::Duplicate {
                name: entry.name.clone(),
                first: existing.source.clone(),
                second: entry.source,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
