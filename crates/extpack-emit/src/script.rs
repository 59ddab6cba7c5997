//! Built-in script compiler on top of the oxc parser, minifier and codegen.
//!
//! Entry scripts are loaded as classic extension scripts, so side-effect
//! stylesheet imports (`import "./popup.css";`) are dropped: the stylesheet
//! itself is emitted next to the script by [`crate::emit`].

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use tracing::debug;

use extpack_core::MinifyOptions;

use crate::{ScriptCompiler, ScriptJob};

/// Default compiler: strips stylesheet imports, minifies in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcCompiler;

impl ScriptCompiler for OxcCompiler {
    fn name(&self) -> &str {
        "oxc"
    }

    fn compile(&self, job: &ScriptJob) -> Result<()> {
        let source = fs::read_to_string(&job.source)
            .with_context(|| format!("failed to read '{}'", job.source.display()))?;
        let code = transform(&job.source, &source, job.minify.as_ref())?;
        fs::write(&job.outfile, code)
            .with_context(|| format!("failed to write '{}'", job.outfile.display()))?;
        Ok(())
    }

    fn minifies(&self) -> bool {
        true
    }
}

/// Compiles one script body. `minify` switches on compression, mangling and
/// comment removal.
pub fn transform(path: &Path, source: &str, minify: Option<&MinifyOptions>) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        bail!("failed to parse '{}': {}", path.display(), messages.join("; "));
    }

    let mut program = ret.program;
    let before = program.body.len();
    program.body.retain(|stmt| !is_style_import(stmt));
    if program.body.len() != before {
        debug!("dropped {} stylesheet import(s) from {}", before - program.body.len(), path.display());
    }

    let Some(opts) = minify else {
        return Ok(Codegen::new().build(&program).code);
    };

    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions {
            drop_console: opts.drop_console,
            ..CompressOptions::default()
        }),
        ..MinifierOptions::default()
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Ok(code)
}

fn is_style_import(stmt: &Statement<'_>) -> bool {
    match stmt {
        Statement::ImportDeclaration(decl) => {
            decl.specifiers.is_none() && decl.source.value.as_str().ends_with(".css")
        }
        _ => false,
    }
}
