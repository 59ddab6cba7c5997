//! Polling rebuild loop for development builds.
//!
//! Changes are coalesced: the first event opens a window that stays open
//! until no event arrives for the aggregate timeout, then exactly one
//! rebuild runs.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use extpack_core::{BuildContext, WatchOptions};

use crate::build;

/// Watches the project sources and rebuilds until the process is stopped.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let options = WatchOptions::from_config(&ctx.config.watch);
    let (tx, rx) = mpsc::channel();

    let mut watcher = PollWatcher::new(tx, Config::default().with_poll_interval(options.poll()))
        .context("failed to start file watcher")?;

    for path in watch_paths(ctx) {
        if !path.exists() {
            warn!("not watching {}: path does not exist", path.display());
            continue;
        }
        watcher
            .watch(&path, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch '{}'", path.display()))?;
        debug!("watching {}", path.display());
    }

    let ignored = ignored_roots(ctx);
    info!(target: "extpack",
        "watching for changes (poll {}ms, aggregate {}ms)",
        options.poll_ms,
        options.aggregate_timeout_ms
    );

    loop {
        let Ok(first) = rx.recv() else {
            bail!("file watcher stopped unexpectedly");
        };
        let changed: Vec<PathBuf> = collect_window(&rx, first, options.aggregate_timeout())?
            .into_iter()
            .filter(|path| !is_ignored(path, &ignored))
            .collect();

        if changed.is_empty() {
            continue;
        }

        info!(target: "extpack", "{} changed path(s), rebuilding", changed.len());
        if let Err(e) = build::run(ctx) {
            error!("rebuild failed: {e:#}");
        }
    }
}

/// Gathers the paths of `first` and every event that follows it within
/// `timeout` of the previous one.
fn collect_window(
    rx: &Receiver<notify::Result<Event>>,
    first: notify::Result<Event>,
    timeout: Duration,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    push_event(&mut paths, first);

    loop {
        match rx.recv_timeout(timeout) {
            Ok(event) => push_event(&mut paths, event),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => bail!("file watcher stopped unexpectedly"),
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn push_event(paths: &mut Vec<PathBuf>, event: notify::Result<Event>) {
    match event {
        Ok(event) => paths.extend(event.paths),
        Err(e) => warn!("watch error: {e}"),
    }
}

/// Sources, template and copied files. Nested paths are folded into their
/// watched ancestor.
fn watch_paths(ctx: &BuildContext) -> Vec<PathBuf> {
    let paths = &ctx.config.paths;
    let mut candidates = vec![
        ctx.resolve(&paths.src),
        ctx.resolve(&paths.template),
        ctx.resolve(&paths.assets),
    ];
    candidates.extend(paths.copy.iter().map(|p| ctx.resolve(p)));
    if let Some(entries) = &ctx.config.entries {
        candidates.extend(entries.iter().map(|e| ctx.resolve(&e.source)));
    }

    let mut watched: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        if !watched.iter().any(|w| candidate.starts_with(w)) {
            watched.retain(|w| !w.starts_with(&candidate));
            watched.push(candidate);
        }
    }
    watched
}

fn ignored_roots(ctx: &BuildContext) -> Vec<PathBuf> {
    vec![
        ctx.resolve(&ctx.config.paths.dist),
        ctx.resolve(&ctx.config.paths.live),
    ]
}

fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    ignored.iter().any(|root| path.starts_with(root))
}
