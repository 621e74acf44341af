//! JavaScript lowering and minification using oxc.
//!
//! ```text
//! parse ──► semantic ──► transform (browserslist targets) ──► minify? ──► codegen
//! ```

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::ast::ast::Statement;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{EnvOptions, TransformOptions, Transformer};
use oxc_compat::EngineTargets;

use crate::config::BuildConfig;

/// Lower a bundled ES module to the `build.browserslist` targets and minify
/// it when `build.minify` is set. Fails with the first syntax or transform
/// error.
///
/// Syntax that can only be lowered with runtime helpers (the transform would
/// have to import them) is rejected: a bundle must be self-contained.
pub fn emit_js(source: &str, path: &Path, build: &BuildConfig) -> Result<String, String> {
    let query = build.browserslist.as_str();
    let env = EnvOptions::from_browserslist_query(query)
        .map_err(|e| format!("browserslist `{query}`: {e}"))?;
    let targets = EngineTargets::try_from_query(query)
        .map_err(|e| format!("browserslist `{query}`: {e}"))?;

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(err) = ret.errors.into_iter().next() {
        return Err(err.to_string());
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let options = TransformOptions {
        env,
        ..TransformOptions::default()
    };
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if let Some(err) = ret.errors.into_iter().next() {
        return Err(err.to_string());
    }
    if program
        .body
        .iter()
        .any(|stmt| matches!(stmt, Statement::ImportDeclaration(_)))
    {
        return Err(format!(
            "lowering for `{query}` needs runtime helpers; raise the browserslist targets"
        ));
    }

    if !build.minify {
        return Ok(Codegen::new().build(&program).code);
    }

    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        // keep the compressor from reintroducing syntax the targets lack
        compress: Some(CompressOptions {
            target: targets,
            ..CompressOptions::smallest()
        }),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Parse `source` as an ES module and return the first syntax error, if any.
#[cfg(test)]
pub fn check_js(source: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    match ret.errors.into_iter().next() {
        Some(err) => Err(err.to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(browserslist: &str, minify: bool) -> BuildConfig {
        BuildConfig {
            browserslist: browserslist.into(),
            minify,
            ..BuildConfig::default()
        }
    }

    fn emit(source: &str, build: &BuildConfig) -> Result<String, String> {
        emit_js(source, Path::new("index.js"), build)
    }

    #[test]
    fn test_minify_js() {
        let out = emit(
            "// greeting\nconst message = 'hi';\nconsole.log(message);\n",
            &build("defaults", true),
        )
        .unwrap();
        assert!(!out.contains("greeting"));
        assert!(out.contains("console.log"));
        assert!(out.len() < 50);
    }

    #[test]
    fn test_lowers_for_old_targets() {
        let source = "\
const a = window.cfg?.a ?? 1;
let w = window.x;
w ||= 2;
console.log(a, w);
";
        for minify in [true, false] {
            let out = emit(source, &build("safari 10", minify)).unwrap();
            assert!(!out.contains("?."), "{out}");
            assert!(!out.contains("??"), "{out}");
            assert!(!out.contains("||="), "{out}");
            check_js(&out).unwrap();
        }
    }

    #[test]
    fn test_modern_targets_keep_syntax() {
        let out = emit(
            "const a = window.cfg?.a ?? 1;\nconsole.log(a);\n",
            &build("chrome 120", false),
        )
        .unwrap();
        assert!(out.contains("?."), "{out}");
        assert!(out.contains("??"), "{out}");
    }

    #[test]
    fn test_reports_errors() {
        assert!(emit("const = ;", &build("defaults", true)).is_err());
        let err = emit("const a = 1;", &build("not a browser 99", true)).unwrap_err();
        assert!(err.contains("browserslist"), "{err}");
        assert!(check_js("let a = {").is_err());
        assert!(check_js("export const a = 1;").is_ok());
    }
}
