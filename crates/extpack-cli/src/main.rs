use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;

use extpack_core::constants::{CONFIG_FILE, ENV_VAR};
use extpack_core::{
    manifest, outdir, BuildContext, Command, Environment, ExtpackConfig, PipelineConfig,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod build;
mod executor;
mod init;
mod styles;
mod watch;

use styles as s;

/// The command-line interface for extpack.
#[derive(Debug, Parser)]
#[command(name = "xpk")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Build Chrome and Firefox extension bundles from one source tree")]
#[command(
    long_about = "extpack builds a browser extension for Chrome and Firefox from a single
source tree and manifest template. Production builds go to dist/, development
builds go to live/ and keep rebuilding while sources change.

Common Commands:
  init              Write extpack.toml and manifest.template.json scaffolds
  build             Build both browsers (NODE_ENV=production selects dist/)
  clean             Remove the dist/ and live/ trees
  manifest:chrome   Print the derived Chrome manifest
  plan:firefox      Print the Firefox pipeline as JSON
"
)]
#[command(
    after_help = "\x1b[1;32mExamples:\x1b[0m\n  \x1b[36mxpk init\x1b[0m                       \x1b[2m# Scaffold config and manifest template\x1b[0m\n  \x1b[36mNODE_ENV=production xpk build\x1b[0m  \x1b[2m# Minified build into dist/\x1b[0m\n  \x1b[36mxpk build\x1b[0m                      \x1b[2m# Development build into live/, then watch\x1b[0m\n  \x1b[36mxpk manifest firefox\x1b[0m           \x1b[2m# Print the Firefox manifest\x1b[0m"
)]
pub(crate) struct Cli {
    /// Command in canonical form, for example: `build`, `manifest:chrome`, `plan:firefox`
    command: Option<String>,
    /// Optional selector (supports `xpk manifest chrome` style)
    selector: Option<String>,
    /// Path to the extpack config file, relative to the project root.
    #[arg(long, default_value = CONFIG_FILE)]
    config: String,
    /// Project root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Build profile (`production` or `development`). Overrides NODE_ENV.
    #[arg(long)]
    env: Option<String>,
    /// Exit after the first development build instead of watching.
    #[arg(long, default_value_t = false)]
    no_watch: bool,
    /// Overwrite scaffold files written by `init`.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    let command_name = match &cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let command = parse_command(command_name, cli.selector.as_deref())?;

    if command == Command::Init {
        return init::run(&cli);
    }

    let node_env = std::env::var(ENV_VAR).ok();
    let environment = resolve_environment(cli.env.as_deref(), node_env.as_deref())?;
    let cfg = load_config(&cli)?;
    let ctx = BuildContext::new(&cli.root, environment, cfg);

    execute(&cli, &ctx, command)
}

/// Accepts both `manifest:chrome` and `manifest chrome`.
fn parse_command(name: &str, selector: Option<&str>) -> Result<Command> {
    let command = match (name.split_once(':'), selector) {
        (Some(_), Some(extra)) => bail!("'{name}' already names a browser; unexpected '{extra}'"),
        (Some(_), None) => Command::from_str(name),
        (None, selector) => Command::from_parts(name, selector),
    };
    command.with_context(|| format!("failed to parse command '{name}'"))
}

/// `--env` wins over `NODE_ENV`.
fn resolve_environment(flag: Option<&str>, node_env: Option<&str>) -> Result<Environment> {
    match flag {
        Some(value) => Ok(Environment::from_str(value)?),
        None => Ok(Environment::from_node_env(node_env)),
    }
}

fn load_config(cli: &Cli) -> Result<ExtpackConfig> {
    let path = cli.root.join(&cli.config);
    if cli.config == CONFIG_FILE && !path.exists() {
        info!(target: "extpack", "no {} found, using defaults", CONFIG_FILE);
        return Ok(ExtpackConfig::default());
    }
    let path = path.to_string_lossy();
    ExtpackConfig::load_from_file(&path).with_context(|| format!("unable to load config '{}'", path))
}

/// Executes a parsed extpack command.
fn execute(cli: &Cli, ctx: &BuildContext, command: Command) -> Result<()> {
    match command {
        Command::Build => {
            build::run(ctx)?;
            if ctx.environment == Environment::Development && !cli.no_watch {
                watch::run(ctx)?;
            }
            Ok(())
        }
        Command::Clean => {
            for dir in [&ctx.config.paths.dist, &ctx.config.paths.live] {
                outdir::clean(&ctx.resolve(dir))?;
            }
            println!(
                "clean removed {} and {}",
                ctx.config.paths.dist.display(),
                ctx.config.paths.live.display()
            );
            Ok(())
        }
        Command::Manifest(browser) => {
            let manifest = ctx.template().derive(browser)?;
            println!("{}", manifest::render_manifest(&manifest)?);
            Ok(())
        }
        Command::Plan(_) => {
            let plans = command
                .browsers()
                .into_iter()
                .map(|browser| PipelineConfig::for_target(ctx, browser))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&plans)?);
            Ok(())
        }
        Command::Init => bail!("init is handled before configuration is loaded"),
    }
}
