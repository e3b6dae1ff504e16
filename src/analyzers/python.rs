//! Python import extraction built on the rustpython AST.
//!
//! Walks every statement body in the module (functions, classes,
//! conditionals, loops, with/try blocks, match arms) so imports nested
//! inside any of them are collected, then records every name the file
//! references so unused imports can be flagged.

use crate::analyzers::{FileImports, ImportExtractor};
use crate::core::errors::{Error, Result};
use crate::core::ImportStatement;
use rustpython_parser::{ast, Mode};
use std::collections::HashSet;
use std::path::Path;

pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportExtractor for PythonExtractor {
    fn extract(&self, source: &str, path: &Path) -> Result<FileImports> {
        let index = LineIndex::new(source);
        let parsed = rustpython_parser::parse(source, Mode::Module, &path.to_string_lossy())
            .map_err(|e| {
                Error::parse(path, index.line_of(e.offset.to_usize()), e.error.to_string())
            })?;

        let mut file_imports = FileImports::default();
        if let ast::Mod::Module(module) = parsed {
            for stmt in &module.body {
                collect_stmt(stmt, &index, &mut file_imports);
            }
        }
        file_imports.mark_usage();
        Ok(file_imports)
    }
}

/// Maps byte offsets from the parser to 1-indexed line numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

fn collect_stmt(stmt: &ast::Stmt, index: &LineIndex, out: &mut FileImports) {
    match stmt {
        ast::Stmt::Import(import) => {
            let line = index.line_of(import.range.start().to_usize());
            for alias in &import.names {
                let mut statement = ImportStatement::new(alias.name.as_str(), 0, line);
                if let Some(asname) = &alias.asname {
                    statement = statement.with_alias(asname.as_str());
                }
                out.imports.push(statement);
            }
        }
        ast::Stmt::ImportFrom(import_from) => {
            let line = index.line_of(import_from.range.start().to_usize());
            let level = import_from.level.map(|l| l.to_usize()).unwrap_or(0);
            let module = import_from
                .module
                .as_ref()
                .map(|m| m.as_str())
                .unwrap_or("");
            let prefix = ".".repeat(level);
            for alias in &import_from.names {
                let imported = alias.name.as_str();
                if imported == "*" {
                    // Star imports bind an unknowable set of names, so they
                    // are never reported unused.
                    let mut statement =
                        ImportStatement::new(format!("{prefix}{module}"), level as u32, line);
                    statement.is_used = true;
                    out.imports.push(statement);
                    continue;
                }
                let name = if module.is_empty() {
                    format!("{prefix}{imported}")
                } else {
                    format!("{prefix}{module}.{imported}")
                };
                let mut statement = ImportStatement::new(name, level as u32, line);
                if let Some(asname) = &alias.asname {
                    statement = statement.with_alias(asname.as_str());
                }
                out.imports.push(statement);
            }
        }
        ast::Stmt::FunctionDef(func) => {
            for decorator in &func.decorator_list {
                collect_expr(decorator, &mut out.used_names);
            }
            collect_parameters(&func.args, &mut out.used_names);
            if let Some(returns) = &func.returns {
                collect_expr(returns, &mut out.used_names);
            }
            collect_body(&func.body, index, out);
        }
        ast::Stmt::AsyncFunctionDef(func) => {
            for decorator in &func.decorator_list {
                collect_expr(decorator, &mut out.used_names);
            }
            collect_parameters(&func.args, &mut out.used_names);
            if let Some(returns) = &func.returns {
                collect_expr(returns, &mut out.used_names);
            }
            collect_body(&func.body, index, out);
        }
        ast::Stmt::ClassDef(class) => {
            for decorator in &class.decorator_list {
                collect_expr(decorator, &mut out.used_names);
            }
            for base in &class.bases {
                collect_expr(base, &mut out.used_names);
            }
            for keyword in &class.keywords {
                collect_expr(&keyword.value, &mut out.used_names);
            }
            collect_body(&class.body, index, out);
        }
        ast::Stmt::If(if_stmt) => {
            collect_expr(&if_stmt.test, &mut out.used_names);
            collect_body(&if_stmt.body, index, out);
            collect_body(&if_stmt.orelse, index, out);
        }
        ast::Stmt::While(while_stmt) => {
            collect_expr(&while_stmt.test, &mut out.used_names);
            collect_body(&while_stmt.body, index, out);
            collect_body(&while_stmt.orelse, index, out);
        }
        ast::Stmt::For(for_stmt) => {
            collect_expr(&for_stmt.target, &mut out.used_names);
            collect_expr(&for_stmt.iter, &mut out.used_names);
            collect_body(&for_stmt.body, index, out);
            collect_body(&for_stmt.orelse, index, out);
        }
        ast::Stmt::AsyncFor(for_stmt) => {
            collect_expr(&for_stmt.target, &mut out.used_names);
            collect_expr(&for_stmt.iter, &mut out.used_names);
            collect_body(&for_stmt.body, index, out);
            collect_body(&for_stmt.orelse, index, out);
        }
        ast::Stmt::With(with_stmt) => {
            for item in &with_stmt.items {
                collect_expr(&item.context_expr, &mut out.used_names);
                if let Some(vars) = &item.optional_vars {
                    collect_expr(vars, &mut out.used_names);
                }
            }
            collect_body(&with_stmt.body, index, out);
        }
        ast::Stmt::AsyncWith(with_stmt) => {
            for item in &with_stmt.items {
                collect_expr(&item.context_expr, &mut out.used_names);
                if let Some(vars) = &item.optional_vars {
                    collect_expr(vars, &mut out.used_names);
                }
            }
            collect_body(&with_stmt.body, index, out);
        }
        ast::Stmt::Try(try_stmt) => {
            collect_body(&try_stmt.body, index, out);
            for handler in &try_stmt.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(exc_type) = &handler.type_ {
                    collect_expr(exc_type, &mut out.used_names);
                }
                collect_body(&handler.body, index, out);
            }
            collect_body(&try_stmt.orelse, index, out);
            collect_body(&try_stmt.finalbody, index, out);
        }
        ast::Stmt::TryStar(try_stmt) => {
            collect_body(&try_stmt.body, index, out);
            for handler in &try_stmt.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(exc_type) = &handler.type_ {
                    collect_expr(exc_type, &mut out.used_names);
                }
                collect_body(&handler.body, index, out);
            }
            collect_body(&try_stmt.orelse, index, out);
            collect_body(&try_stmt.finalbody, index, out);
        }
        ast::Stmt::Match(match_stmt) => {
            collect_expr(&match_stmt.subject, &mut out.used_names);
            for case in &match_stmt.cases {
                collect_pattern(&case.pattern, &mut out.used_names);
                if let Some(guard) = &case.guard {
                    collect_expr(guard, &mut out.used_names);
                }
                collect_body(&case.body, index, out);
            }
        }
        ast::Stmt::Assign(assign) => {
            for target in &assign.targets {
                collect_expr(target, &mut out.used_names);
            }
            collect_expr(&assign.value, &mut out.used_names);
        }
        ast::Stmt::AugAssign(assign) => {
            collect_expr(&assign.target, &mut out.used_names);
            collect_expr(&assign.value, &mut out.used_names);
        }
        ast::Stmt::AnnAssign(assign) => {
            collect_expr(&assign.target, &mut out.used_names);
            collect_expr(&assign.annotation, &mut out.used_names);
            if let Some(value) = &assign.value {
                collect_expr(value, &mut out.used_names);
            }
        }
        ast::Stmt::Return(ret) => {
            if let Some(value) = &ret.value {
                collect_expr(value, &mut out.used_names);
            }
        }
        ast::Stmt::Expr(expr_stmt) => {
            collect_expr(&expr_stmt.value, &mut out.used_names);
        }
        ast::Stmt::Delete(delete) => {
            for target in &delete.targets {
                collect_expr(target, &mut out.used_names);
            }
        }
        ast::Stmt::Assert(assert) => {
            collect_expr(&assert.test, &mut out.used_names);
            if let Some(msg) = &assert.msg {
                collect_expr(msg, &mut out.used_names);
            }
        }
        ast::Stmt::Raise(raise) => {
            if let Some(exc) = &raise.exc {
                collect_expr(exc, &mut out.used_names);
            }
            if let Some(cause) = &raise.cause {
                collect_expr(cause, &mut out.used_names);
            }
        }
        _ => {}
    }
}

fn collect_body(body: &[ast::Stmt], index: &LineIndex, out: &mut FileImports) {
    for stmt in body {
        collect_stmt(stmt, index, out);
    }
}

fn collect_parameters(args: &ast::Arguments, used: &mut HashSet<String>) {
    for arg in args
        .posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs)
    {
        if let Some(annotation) = &arg.def.annotation {
            collect_expr(annotation, used);
        }
        if let Some(default) = &arg.default {
            collect_expr(default, used);
        }
    }
    for arg in [&args.vararg, &args.kwarg].into_iter().flatten() {
        if let Some(annotation) = &arg.annotation {
            collect_expr(annotation, used);
        }
    }
}

/// Records every referenced name. Attribute chains rooted at a plain name
/// contribute all their prefixes, so `os.path.join` marks `os`, `os.path`,
/// and `os.path.join` as used.
fn collect_expr(expr: &ast::Expr, used: &mut HashSet<String>) {
    match expr {
        ast::Expr::Name(name) => {
            used.insert(name.id.to_string());
        }
        ast::Expr::Attribute(attr) => {
            if let Some(chain) = attribute_chain(expr) {
                let parts: Vec<&str> = chain.split('.').collect();
                for end in 1..=parts.len() {
                    used.insert(parts[..end].join("."));
                }
            } else {
                collect_expr(&attr.value, used);
            }
        }
        ast::Expr::Call(call) => {
            collect_expr(&call.func, used);
            for arg in &call.args {
                collect_expr(arg, used);
            }
            for keyword in &call.keywords {
                collect_expr(&keyword.value, used);
            }
        }
        ast::Expr::BoolOp(op) => {
            for value in &op.values {
                collect_expr(value, used);
            }
        }
        ast::Expr::NamedExpr(named) => {
            collect_expr(&named.target, used);
            collect_expr(&named.value, used);
        }
        ast::Expr::BinOp(op) => {
            collect_expr(&op.left, used);
            collect_expr(&op.right, used);
        }
        ast::Expr::UnaryOp(op) => {
            collect_expr(&op.operand, used);
        }
        ast::Expr::Lambda(lambda) => {
            collect_parameters(&lambda.args, used);
            collect_expr(&lambda.body, used);
        }
        ast::Expr::IfExp(if_exp) => {
            collect_expr(&if_exp.test, used);
            collect_expr(&if_exp.body, used);
            collect_expr(&if_exp.orelse, used);
        }
        ast::Expr::Dict(dict) => {
            for key in dict.keys.iter().flatten() {
                collect_expr(key, used);
            }
            for value in &dict.values {
                collect_expr(value, used);
            }
        }
        ast::Expr::Set(set) => {
            for elt in &set.elts {
                collect_expr(elt, used);
            }
        }
        ast::Expr::ListComp(comp) => {
            collect_expr(&comp.elt, used);
            collect_generators(&comp.generators, used);
        }
        ast::Expr::SetComp(comp) => {
            collect_expr(&comp.elt, used);
            collect_generators(&comp.generators, used);
        }
        ast::Expr::DictComp(comp) => {
            collect_expr(&comp.key, used);
            collect_expr(&comp.value, used);
            collect_generators(&comp.generators, used);
        }
        ast::Expr::GeneratorExp(comp) => {
            collect_expr(&comp.elt, used);
            collect_generators(&comp.generators, used);
        }
        ast::Expr::Await(await_expr) => {
            collect_expr(&await_expr.value, used);
        }
        ast::Expr::Yield(yield_expr) => {
            if let Some(value) = &yield_expr.value {
                collect_expr(value, used);
            }
        }
        ast::Expr::YieldFrom(yield_from) => {
            collect_expr(&yield_from.value, used);
        }
        ast::Expr::Compare(compare) => {
            collect_expr(&compare.left, used);
            for comparator in &compare.comparators {
                collect_expr(comparator, used);
            }
        }
        ast::Expr::FormattedValue(formatted) => {
            collect_expr(&formatted.value, used);
            if let Some(spec) = &formatted.format_spec {
                collect_expr(spec, used);
            }
        }
        ast::Expr::JoinedStr(joined) => {
            for value in &joined.values {
                collect_expr(value, used);
            }
        }
        ast::Expr::Subscript(subscript) => {
            collect_expr(&subscript.value, used);
            collect_expr(&subscript.slice, used);
        }
        ast::Expr::Starred(starred) => {
            collect_expr(&starred.value, used);
        }
        ast::Expr::List(list) => {
            for elt in &list.elts {
                collect_expr(elt, used);
            }
        }
        ast::Expr::Tuple(tuple) => {
            for elt in &tuple.elts {
                collect_expr(elt, used);
            }
        }
        ast::Expr::Slice(slice) => {
            for bound in [&slice.lower, &slice.upper, &slice.step]
                .into_iter()
                .flatten()
            {
                collect_expr(bound, used);
            }
        }
        ast::Expr::Constant(_) => {}
        _ => {}
    }
}

fn collect_generators(generators: &[ast::Comprehension], used: &mut HashSet<String>) {
    for generator in generators {
        collect_expr(&generator.target, used);
        collect_expr(&generator.iter, used);
        for condition in &generator.ifs {
            collect_expr(condition, used);
        }
    }
}

fn collect_pattern(pattern: &ast::Pattern, used: &mut HashSet<String>) {
    match pattern {
        ast::Pattern::MatchValue(value) => collect_expr(&value.value, used),
        ast::Pattern::MatchSequence(seq) => {
            for inner in &seq.patterns {
                collect_pattern(inner, used);
            }
        }
        ast::Pattern::MatchMapping(mapping) => {
            for key in &mapping.keys {
                collect_expr(key, used);
            }
            for inner in &mapping.patterns {
                collect_pattern(inner, used);
            }
        }
        ast::Pattern::MatchClass(class) => {
            collect_expr(&class.cls, used);
            for inner in &class.patterns {
                collect_pattern(inner, used);
            }
            for inner in &class.kwd_patterns {
                collect_pattern(inner, used);
            }
        }
        ast::Pattern::MatchAs(as_pattern) => {
            if let Some(inner) = &as_pattern.pattern {
                collect_pattern(inner, used);
            }
        }
        ast::Pattern::MatchOr(or_pattern) => {
            for inner in &or_pattern.patterns {
                collect_pattern(inner, used);
            }
        }
        ast::Pattern::MatchSingleton(_) | ast::Pattern::MatchStar(_) => {}
    }
}

/// Renders `a.b.c` for an attribute chain rooted at a plain name, or `None`
/// when the root is a call or subscript.
fn attribute_chain(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.to_string()),
        ast::Expr::Attribute(attr) => {
            attribute_chain(&attr.value).map(|base| format!("{base}.{}", attr.attr.as_str()))
        }
        _ => None,
    }
}
