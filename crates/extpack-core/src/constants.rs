//! Constants used across the extpack workspace.

/// The filename for extpack's primary configuration.
pub const CONFIG_FILE: &str = "extpack.toml";

/// The manifest template every browser manifest is derived from.
pub const MANIFEST_TEMPLATE: &str = "manifest.template.json";

/// The manifest file written into each output tree.
pub const MANIFEST_OUTPUT: &str = "manifest.json";

/// Environment variable selecting the build profile.
pub const ENV_VAR: &str = "NODE_ENV";

/// Default source and output directories.
pub const DIR_SRC: &str = "src";
pub const DIR_ASSETS: &str = "src/assets";
pub const DIR_DIST: &str = "dist";
pub const DIR_LIVE: &str = "live";

/// Output filename patterns; `[name]` is replaced with the entry name.
pub const SCRIPT_FILENAME: &str = "[name].js";
pub const STYLE_FILENAME: &str = "[name].css";

/// Watch defaults, in milliseconds.
pub const WATCH_AGGREGATE_TIMEOUT_MS: u64 = 1000;
pub const WATCH_POLL_MS: u64 = 1000;
