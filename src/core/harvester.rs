//! Setter-usage harvesting.
//!
//! Follows every call to a declaration's setter binding and enumerates the
//! values it can assign. Direct arguments resolve through the expression
//! resolver; updater functions contribute every resolvable `return` branch;
//! conditionals whose test cannot be decided statically contribute both
//! arms as candidates. Anything unresolvable is recorded as a dynamic-value
//! warning, never an error: a missing variant degrades to a missing style,
//! not a broken build.

use std::collections::HashMap;

use swc_common::{SourceMap, Span, Spanned};
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, Expr, Function, Module, ReturnStmt,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::manifest::Declaration;
use super::parser::context_at;
use super::resolver::{ExprResolver, is_truthy, unwrap_wrappers};
use crate::issues::{DynamicValueIssue, Issue};

/// Result of harvesting one file's setter usages.
pub struct HarvestedValues {
    /// `(key, value)` pairs in discovery order.
    pub values: Vec<(String, String)>,
    /// Dynamic-value warnings for arguments that did not resolve.
    pub warnings: Vec<Issue>,
}

/// Visitor that follows setter references and resolves their arguments.
pub struct SetterUsageHarvester<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    resolver: &'a ExprResolver<'a>,
    /// Setter binding name to state key.
    setters: HashMap<String, String>,
    values: Vec<(String, String)>,
    warnings: Vec<Issue>,
}

impl<'a> SetterUsageHarvester<'a> {
    pub fn harvest(
        module: &Module,
        declarations: &[Declaration],
        file_path: &'a str,
        source_map: &'a SourceMap,
        resolver: &'a ExprResolver<'a>,
    ) -> HarvestedValues {
        let mut setters = HashMap::new();
        for declaration in declarations {
            if let Some(setter) = &declaration.setter {
                // First declaration wins when two share a setter name.
                setters
                    .entry(setter.clone())
                    .or_insert_with(|| declaration.key.clone());
            }
        }

        let mut harvester = Self {
            file_path,
            source_map,
            resolver,
            setters,
            values: Vec::new(),
            warnings: Vec::new(),
        };
        harvester.visit_module(module);
        HarvestedValues {
            values: harvester.values,
            warnings: harvester.warnings,
        }
    }

    fn warn(&mut self, span: Span, key: &str, detail: impl Into<String>) {
        self.warnings.push(Issue::from(DynamicValueIssue {
            context: context_at(self.source_map, self.file_path, span.lo),
            key: key.to_string(),
            detail: detail.into(),
        }));
    }

    fn harvest_argument(&mut self, key: &str, expr: &Expr) {
        match unwrap_wrappers(expr) {
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::Expr(body) => self.harvest_branches(key, body),
                BlockStmtOrExpr::BlockStmt(block) => {
                    self.harvest_updater_block(key, arrow.span, block)
                }
            },
            Expr::Fn(fn_expr) => match &fn_expr.function.body {
                Some(body) => self.harvest_updater_block(key, fn_expr.function.span, body),
                None => self.warn(expr.span(), key, "updater function has no body"),
            },
            other => self.harvest_branches(key, other),
        }
    }

    fn harvest_updater_block(&mut self, key: &str, origin: Span, block: &BlockStmt) {
        let mut returns = ReturnCollector::default();
        block.visit_with(&mut returns);

        if returns.exprs.is_empty() {
            self.warn(origin, key, "updater function never returns a value");
            return;
        }
        for returned in &returns.exprs {
            self.harvest_branches(key, returned);
        }
        if returns.bare_return {
            self.warn(origin, key, "updater function has a bare `return`");
        }
    }

    /// Resolve one value expression, expanding conditional arms. A test that
    /// resolves statically selects its branch; one that does not makes both
    /// arms candidate values.
    fn harvest_branches(&mut self, key: &str, expr: &Expr) {
        let expr = unwrap_wrappers(expr);
        if let Expr::Cond(cond) = expr {
            match self.resolver.resolve(&cond.test) {
                Ok(test) => {
                    let branch = if is_truthy(&test) { &cond.cons } else { &cond.alt };
                    self.harvest_branches(key, branch);
                }
                Err(_) => {
                    self.harvest_branches(key, &cond.cons);
                    self.harvest_branches(key, &cond.alt);
                }
            }
            return;
        }

        match self.resolver.resolve(expr) {
            Ok(value) => self.values.push((key.to_string(), value)),
            Err(e) => self.warn(expr.span(), key, e.message),
        }
    }
}

impl Visit for SetterUsageHarvester<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = &**callee
            && let Some(key) = self.setters.get(ident.sym.as_str()).cloned()
        {
            match node.args.first() {
                None => self.warnings.push(Issue::from(DynamicValueIssue {
                    context: context_at(self.source_map, self.file_path, node.span.lo),
                    key,
                    detail: "setter called without an argument".to_string(),
                })),
                Some(arg) if arg.spread.is_some() => {
                    self.warn(arg.expr.span(), &key, "setter argument is a spread")
                }
                Some(arg) => self.harvest_argument(&key, &arg.expr),
            }
        }
        node.visit_children_with(self);
    }
}

/// Collects `return` arguments from an updater body without descending into
/// nested functions, whose returns belong to those functions.
#[derive(Default)]
struct ReturnCollector {
    exprs: Vec<Expr>,
    bare_return: bool,
}

impl Visit for ReturnCollector {
    fn visit_return_stmt(&mut self, node: &ReturnStmt) {
        match &node.arg {
            Some(arg) => self.exprs.push((**arg).clone()),
            None => self.bare_return = true,
        }
    }

    fn visit_arrow_expr(&mut self, _node: &ArrowExpr) {}

    fn visit_function(&mut self, _node: &Function) {}
}
