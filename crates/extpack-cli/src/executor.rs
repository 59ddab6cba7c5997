use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use extpack_core::config::BundlerConfig;
use extpack_emit::{ScriptCompiler, ScriptJob};

/// Compiles entries by running an external bundler once per entry.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    bundler: BundlerConfig,
}

impl CommandCompiler {
    pub fn new(bundler: BundlerConfig) -> Self {
        Self { bundler }
    }

    fn argv(&self, job: &ScriptJob) -> Vec<String> {
        let outdir = job
            .outfile
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let substitute = |arg: &String| {
            arg.replace("{entry}", &job.source.to_string_lossy())
                .replace("{outfile}", &job.outfile.to_string_lossy())
                .replace("{outdir}", &outdir.to_string_lossy())
                .replace("{name}", &job.name)
                .replace("{mode}", job.mode.as_str())
        };

        let mut argv = vec![self.bundler.program.clone()];
        argv.extend(self.bundler.args.iter().map(substitute));
        if job.minify.is_some() {
            argv.extend(self.bundler.minify_args.iter().map(substitute));
        }
        argv
    }
}

impl ScriptCompiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.bundler.program
    }

    fn compile(&self, job: &ScriptJob) -> Result<()> {
        let argv = self.argv(job);
        info!(target: "extpack", "compile {} with {}", job.name, self.bundler.program);
        run_argv(&argv)
    }

    fn minifies(&self) -> bool {
        !self.bundler.minify_args.is_empty()
    }
}

fn run_argv(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("empty command argv"))?;

    debug!("running {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to start command '{} {}'", program, args.join(" ")))?;

    if !status.success() {
        bail!(
            "command failed with status {}: {} {}",
            status,
            program,
            args.join(" ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extpack_core::{Environment, MinifyOptions};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn job(source: PathBuf, outfile: PathBuf, minify: bool) -> ScriptJob {
        ScriptJob {
            name: "popup".to_string(),
            source,
            outfile,
            mode: if minify {
                Environment::Production
            } else {
                Environment::Development
            },
            minify: minify.then_some(MinifyOptions {
                drop_console: true,
                remove_comments: true,
                collapse_whitespace: true,
                remove_attribute_quotes: true,
            }),
        }
    }

    fn bundler(program: &str, args: &[&str], minify_args: &[&str]) -> BundlerConfig {
        BundlerConfig {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            minify_args: minify_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn substitutes_placeholders_and_appends_minify_args() {
        let compiler = CommandCompiler::new(bundler(
            "esbuild",
            &["{entry}", "--outfile={outfile}", "--define:MODE={mode}"],
            &["--minify"],
        ));
        let prod = job(PathBuf::from("/p/src/popup.js"), PathBuf::from("/p/dist/chrome/popup.js"), true);
        assert_eq!(
            compiler.argv(&prod),
            vec![
                "esbuild",
                "/p/src/popup.js",
                "--outfile=/p/dist/chrome/popup.js",
                "--define:MODE=production",
                "--minify",
            ]
        );

        let dev = job(PathBuf::from("/p/src/popup.js"), PathBuf::from("/p/live/chrome/popup.js"), false);
        assert!(!compiler.argv(&dev).contains(&"--minify".to_string()));
        assert!(compiler.minifies());
    }

    #[test]
    fn runs_external_program() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("popup.js");
        let outfile = dir.path().join("out.js");
        fs::write(&source, "let a = 1;").unwrap();

        let compiler = CommandCompiler::new(bundler("cp", &["{entry}", "{outfile}"], &[]));
        compiler.compile(&job(source, outfile.clone(), false)).unwrap();

        assert_eq!(fs::read_to_string(outfile).unwrap(), "let a = 1;");
    }

    #[test]
    fn failing_program_is_fatal() {
        let compiler = CommandCompiler::new(bundler("false", &[], &[]));
        let err = compiler
            .compile(&job(PathBuf::from("a.js"), PathBuf::from("b.js"), false))
            .expect_err("must fail");
        assert!(err.to_string().contains("command failed with status"));
    }
}
