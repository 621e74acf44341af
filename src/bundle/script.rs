//! ES module bundling.
//!
//! Relative imports are followed from the entry and every module is hoisted
//! into one script, dependencies first. Each dependency body runs inside its
//! own function scope and hands its exports back as an object:
//!
//! ```text
//! // util.js                     const __sitepipe_m1 = (() => {
//! export const twice = x => 2*x;    const twice = x => 2*x;
//!                                   return { twice: twice };
//!                                 })();
//! // index.js
//! import { twice } from './util.js'; const { twice: twice } = __sitepipe_m1;
//! console.log(twice(2));              console.log(twice(2));
//! ```
//!
//! The entry keeps the top-level scope. Package specifiers, namespace
//! imports and re-exports are rejected.

use std::fs;
use std::path::{Component, Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier, Statement,
};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};
use rustc_hash::FxHashMap;

use super::BundleError;

const MODULE_PREFIX: &str = "__sitepipe_m";
const DEFAULT_PREFIX: &str = "__sitepipe_default";

/// Bundle `entry` and its relative imports into one script.
pub fn bundle_script(entry: &Path) -> Result<String, BundleError> {
    if !entry.is_file() {
        return Err(BundleError::EntryNotFound(entry.to_path_buf()));
    }

    let mut graph = ModuleGraph::default();
    graph.visit(&normalize(entry), &mut Vec::new())?;

    let mut out = String::new();
    let last = graph.order.len().saturating_sub(1);
    for (index, module) in graph.order.iter().enumerate() {
        let rewritten = module.rewrite(&graph.ids)?;
        if index == last {
            // exports of the entry have no importer
            out.push_str(&rewritten.body);
        } else {
            out.push_str(&module.wrap(&rewritten));
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

/// One source module with its resolved relative imports.
struct Module {
    path: PathBuf,
    source: String,
    /// Specifier text → resolved path, for every import/export source.
    resolved: FxHashMap<String, PathBuf>,
    id: usize,
}

#[derive(Default)]
struct ModuleGraph {
    /// Post-order: dependencies before dependents, entry last.
    order: Vec<Module>,
    ids: FxHashMap<PathBuf, usize>,
}

impl ModuleGraph {
    fn visit(&mut self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<(), BundleError> {
        if self.ids.contains_key(path) {
            return Ok(());
        }
        if let Some(importer) = stack.last()
            && stack.iter().any(|p| p == path)
        {
            return Err(BundleError::Cycle {
                path: importer.clone(),
                via: path.to_path_buf(),
            });
        }

        let source = fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let specifiers = collect_specifiers(path, &source)?;
        let mut resolved = FxHashMap::default();
        stack.push(path.to_path_buf());
        for specifier in specifiers {
            let dep = resolve(path, &specifier)?;
            self.visit(&dep, stack)?;
            resolved.insert(specifier, dep);
        }
        stack.pop();

        let id = self.order.len();
        self.ids.insert(path.to_path_buf(), id);
        self.order.push(Module {
            path: path.to_path_buf(),
            source,
            resolved,
            id,
        });
        Ok(())
    }
}

fn parse_error(path: &Path, errors: Vec<oxc::diagnostics::OxcDiagnostic>) -> BundleError {
    let message = errors
        .into_iter()
        .next()
        .map(|e| e.to_string())
        .unwrap_or_default();
    BundleError::Parse {
        path: path.to_path_buf(),
        message,
    }
}

/// Sources of all static imports and `export ... from` of a module.
fn collect_specifiers(path: &Path, source: &str) -> Result<Vec<String>, BundleError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(parse_error(path, ret.errors));
    }

    let mut specifiers = Vec::new();
    for stmt in &ret.program.body {
        let source = match stmt {
            Statement::ImportDeclaration(decl) => Some(&decl.source),
            Statement::ExportNamedDeclaration(decl) => decl.source.as_ref(),
            Statement::ExportAllDeclaration(decl) => Some(&decl.source),
            _ => None,
        };
        if let Some(source) = source {
            let specifier = source.value.to_string();
            if !specifiers.contains(&specifier) {
                specifiers.push(specifier);
            }
        }
    }
    Ok(specifiers)
}

/// Resolve a relative specifier against the importing module.
///
/// Tries the path as written, then with `.js`, then `index.js` inside it.
fn resolve(importer: &Path, specifier: &str) -> Result<PathBuf, BundleError> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return Err(BundleError::unsupported(
            importer,
            format!("package import `{specifier}` cannot be bundled, use a relative path"),
        ));
    }

    let base = importer.parent().unwrap_or(Path::new(""));
    let joined = normalize(&base.join(specifier));
    let candidates = [
        joined.clone(),
        joined.with_extension("js"),
        joined.join("index.js"),
    ];
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| BundleError::UnresolvedImport {
            path: importer.to_path_buf(),
            specifier: specifier.to_string(),
        })
}

/// Lexically resolve `.` and `..` so one file always maps to one key.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// One replacement of a source range.
struct Edit {
    span: Span,
    text: String,
}

/// Module body without import/export syntax, plus its export table.
struct Rewritten {
    body: String,
    /// `(exported name, local binding)` in source order.
    exports: Vec<(String, String)>,
}

impl Module {
    fn var_name(id: usize) -> String {
        format!("{MODULE_PREFIX}{id}")
    }

    /// Module source with import/export syntax replaced by plain bindings.
    fn rewrite(&self, ids: &FxHashMap<PathBuf, usize>) -> Result<Rewritten, BundleError> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, &self.source, SourceType::mjs()).parse();
        if !ret.errors.is_empty() {
            return Err(parse_error(&self.path, ret.errors));
        }

        let mut edits = Vec::new();
        let mut exports: Vec<(String, String)> = Vec::new();
        let default_local = format!("{DEFAULT_PREFIX}{}", self.id);

        for stmt in &ret.program.body {
            match stmt {
                Statement::ImportDeclaration(decl) => {
                    let dep = self.dep_var(decl.source.value.as_str(), ids)?;
                    let mut fields = Vec::new();
                    for spec in decl.specifiers.iter().flatten() {
                        match spec {
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                fields.push(format!(
                                    "{}: {}",
                                    property_key(s.imported.name().as_str()),
                                    s.local.name
                                ));
                            }
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                fields.push(format!("default: {}", s.local.name));
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                return Err(BundleError::unsupported(
                                    &self.path,
                                    format!(
                                        "namespace import `* as {}` is not supported, import names explicitly",
                                        s.local.name
                                    ),
                                ));
                            }
                        }
                    }
                    let text = if fields.is_empty() {
                        String::new()
                    } else {
                        format!("const {{ {} }} = {dep};", fields.join(", "))
                    };
                    edits.push(Edit { span: decl.span, text });
                }

                Statement::ExportNamedDeclaration(decl) => {
                    if decl.source.is_some() {
                        return Err(self.reexport_error());
                    }
                    match &decl.declaration {
                        Some(declaration) => {
                            for name in self.declared_names(declaration)? {
                                exports.push((name.clone(), name));
                            }
                            edits.push(Edit {
                                span: Span::new(decl.span.start, declaration.span().start),
                                text: String::new(),
                            });
                        }
                        None => {
                            for spec in &decl.specifiers {
                                exports.push((
                                    spec.exported.name().to_string(),
                                    spec.local.name().to_string(),
                                ));
                            }
                            edits.push(Edit {
                                span: decl.span,
                                text: String::new(),
                            });
                        }
                    }
                }

                Statement::ExportDefaultDeclaration(decl) => {
                    let inner = decl.declaration.span();
                    let named = match &decl.declaration {
                        ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                            f.id.as_ref().map(|id| id.name.to_string())
                        }
                        ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                            c.id.as_ref().map(|id| id.name.to_string())
                        }
                        _ => None,
                    };
                    match named {
                        Some(name) => {
                            exports.push(("default".into(), name));
                            edits.push(Edit {
                                span: Span::new(decl.span.start, inner.start),
                                text: String::new(),
                            });
                        }
                        None => {
                            exports.push(("default".into(), default_local.clone()));
                            let expr = &self.source[inner.start as usize..inner.end as usize];
                            edits.push(Edit {
                                span: decl.span,
                                text: format!("const {default_local} = {expr};"),
                            });
                        }
                    }
                }

                Statement::ExportAllDeclaration(_) => return Err(self.reexport_error()),

                _ => {}
            }
        }

        Ok(Rewritten {
            body: apply_edits(&self.source, edits),
            exports,
        })
    }

    /// Names bound by an exported declaration.
    fn declared_names(&self, declaration: &Declaration<'_>) -> Result<Vec<String>, BundleError> {
        let name = |id: Option<String>| {
            id.ok_or_else(|| BundleError::unsupported(&self.path, "exported declaration has no name"))
        };
        match declaration {
            Declaration::VariableDeclaration(var) => var
                .declarations
                .iter()
                .map(|d| {
                    d.id.get_identifier_name()
                        .map(|n| n.to_string())
                        .ok_or_else(|| {
                            BundleError::unsupported(
                                &self.path,
                                "destructuring exports are not supported, export each name",
                            )
                        })
                })
                .collect(),
            Declaration::FunctionDeclaration(f) => {
                Ok(vec![name(f.id.as_ref().map(|id| id.name.to_string()))?])
            }
            Declaration::ClassDeclaration(c) => {
                Ok(vec![name(c.id.as_ref().map(|id| id.name.to_string()))?])
            }
            _ => Err(BundleError::unsupported(
                &self.path,
                "only variable, function and class declarations can be exported",
            )),
        }
    }

    /// Dependency body inside its own scope, bound to the module variable.
    fn wrap(&self, rewritten: &Rewritten) -> String {
        let mut body = rewritten.body.trim_end().to_string();
        if !rewritten.exports.is_empty() {
            let fields: Vec<_> = rewritten
                .exports
                .iter()
                .map(|(exported, local)| format!("{}: {local}", property_key(exported)))
                .collect();
            body.push_str(&format!("\nreturn {{ {} }};", fields.join(", ")));
        }
        format!("const {} = (() => {{\n{body}\n}})();", Self::var_name(self.id))
    }

    fn dep_var(&self, specifier: &str, ids: &FxHashMap<PathBuf, usize>) -> Result<String, BundleError> {
        self.resolved
            .get(specifier)
            .and_then(|path| ids.get(path))
            .map(|id| Self::var_name(*id))
            .ok_or_else(|| BundleError::UnresolvedImport {
                path: self.path.clone(),
                specifier: specifier.to_string(),
            })
    }

    fn reexport_error(&self) -> BundleError {
        BundleError::unsupported(
            &self.path,
            "re-exports (`export ... from`) are not supported, import then export",
        )
    }
}

/// Object key for an export name; string names like `"a-b"` stay quoted.
fn property_key(name: &str) -> String {
    let is_ident = name
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c == '$' || c.is_alphabetic() || (i > 0 && c.is_alphanumeric()));
    if is_ident && !name.is_empty() {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.span.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        let (start, end) = (edit.span.start as usize, edit.span.end as usize);
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}
