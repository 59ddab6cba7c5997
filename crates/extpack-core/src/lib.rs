//! Core logic for the extpack build tool.
//!
//! This crate defines the project configuration, build targets, command
//! structures, output directory management, manifest derivation and the
//! per-browser pipeline configuration used across the extpack workspace.

pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod entry;
pub mod manifest;
pub mod outdir;
pub mod pipeline;
pub mod target;

pub use command::{Command, CommandParseError};
pub use config::ExtpackConfig;
pub use context::BuildContext;
pub use entry::{Entry, EntryError, EntryMap};
pub use manifest::{ManifestError, ManifestTemplate};
pub use pipeline::{MinifyOptions, PipelineConfig, WatchOptions};
pub use target::{Browser, Environment, Target};
