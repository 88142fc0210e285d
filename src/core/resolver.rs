//! Static expression resolution.
//!
//! This module provides the evaluator that reduces AST expressions to
//! compile-time string literals. It handles literals, module-level const
//! identifiers, template literals, string concatenation, unary and logical
//! operators, conditionals, member/index access into const object and array
//! literals, and sequence expressions. Everything else fails with a located
//! diagnostic; callers decide whether that failure is fatal.

use std::collections::{HashMap, HashSet};

use swc_common::{SourceMap, Span, Spanned};
use swc_ecma_ast::{
    ArrayLit, Decl, Expr, ImportSpecifier, Lit, MemberExpr, MemberProp, Module, ModuleDecl,
    ModuleItem, ObjectLit, Pat, Prop, PropName, PropOrSpread, Stmt, UnaryOp, VarDecl, VarDeclKind,
};

/// Get a short human-readable name for an expression, for diagnostics.
fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::Array(_) => "array literal",
        Expr::Arrow(_) | Expr::Fn(_) => "function",
        Expr::Assign(_) => "assignment",
        Expr::Await(_) => "await expression",
        Expr::Bin(_) => "binary expression",
        Expr::Call(_) => "call expression",
        Expr::Cond(_) => "conditional",
        Expr::Ident(_) => "identifier",
        Expr::Lit(_) => "literal",
        Expr::Member(_) => "member access",
        Expr::New(_) => "new expression",
        Expr::Object(_) => "object literal",
        Expr::OptChain(_) => "optional chain",
        Expr::Tpl(_) => "template literal",
        Expr::TaggedTpl(_) => "tagged template",
        Expr::Unary(_) => "unary expression",
        Expr::Update(_) => "update expression",
        _ => "expression",
    }
}

/// Strip parentheses and TypeScript-only wrappers (`as`, `as const`, `!`,
/// `satisfies`, angle-bracket assertions) that have no runtime effect.
pub(crate) fn unwrap_wrappers(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(e) => unwrap_wrappers(&e.expr),
        Expr::TsAs(e) => unwrap_wrappers(&e.expr),
        Expr::TsConstAssertion(e) => unwrap_wrappers(&e.expr),
        Expr::TsNonNull(e) => unwrap_wrappers(&e.expr),
        Expr::TsSatisfies(e) => unwrap_wrappers(&e.expr),
        Expr::TsTypeAssertion(e) => unwrap_wrappers(&e.expr),
        other => other,
    }
}

/// JavaScript truthiness of a value that has already been coerced to its
/// string form.
pub(crate) fn is_truthy(value: &str) -> bool {
    !value.is_empty() && !matches!(value, "false" | "0" | "null" | "undefined" | "NaN")
}

/// Failure to reduce an expression to a compile-time string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub message: String,
    pub file_path: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}:{}:{})",
            self.message, self.file_path, self.line, self.col
        )
    }
}

impl std::error::Error for ResolveError {}

/// Module-level bindings visible to the resolver.
///
/// Only the module's top level is recorded: `const` initializers can be
/// chased, while imports and `let`/`var` bindings are known to be
/// unresolvable and produce a diagnostic that names them as such.
#[derive(Debug, Default)]
pub struct ModuleBindings {
    consts: HashMap<String, Box<Expr>>,
    mutables: HashSet<String>,
    imports: HashSet<String>,
}

impl ModuleBindings {
    /// Collect bindings from a module's top-level items, including exported
    /// declarations.
    pub fn collect(module: &Module) -> Self {
        let mut bindings = Self::default();
        for item in &module.body {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    for specifier in &import.specifiers {
                        let local = match specifier {
                            ImportSpecifier::Named(named) => &named.local,
                            ImportSpecifier::Default(default) => &default.local,
                            ImportSpecifier::Namespace(ns) => &ns.local,
                        };
                        bindings.imports.insert(local.sym.to_string());
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    if let Decl::Var(var) = &export.decl {
                        bindings.record_var(var);
                    }
                }
                ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => bindings.record_var(var),
                _ => {}
            }
        }
        bindings
    }

    fn record_var(&mut self, var: &VarDecl) {
        let is_const = var.kind == VarDeclKind::Const;
        for declarator in &var.decls {
            // Destructuring patterns are not tracked; only plain
            // `const NAME = expr` bindings can be chased.
            if let Pat::Ident(binding) = &declarator.name {
                let name = binding.id.sym.to_string();
                match (&declarator.init, is_const) {
                    (Some(init), true) => {
                        self.consts.insert(name, init.clone());
                    }
                    _ => {
                        self.mutables.insert(name);
                    }
                }
            }
        }
    }

    pub fn const_init(&self, name: &str) -> Option<&Expr> {
        self.consts.get(name).map(|init| &**init)
    }

    pub fn is_import(&self, name: &str) -> bool {
        self.imports.contains(name)
    }

    pub fn is_mutable(&self, name: &str) -> bool {
        self.mutables.contains(name)
    }
}

/// Reduces expressions to compile-time strings against one file's bindings.
pub struct ExprResolver<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    bindings: &'a ModuleBindings,
}

impl<'a> ExprResolver<'a> {
    pub fn new(file_path: &'a str, source_map: &'a SourceMap, bindings: &'a ModuleBindings) -> Self {
        Self {
            file_path,
            source_map,
            bindings,
        }
    }

    /// Resolve an expression to its string form, or fail with a diagnostic
    /// locating the unresolvable part.
    pub fn resolve(&self, expr: &Expr) -> Result<String, ResolveError> {
        let mut in_flight = Vec::new();
        self.resolve_inner(expr, &mut in_flight)
    }

    fn err(&self, span: Span, message: impl Into<String>) -> ResolveError {
        let loc = self.source_map.lookup_char_pos(span.lo);
        ResolveError {
            message: message.into(),
            file_path: self.file_path.to_string(),
            line: loc.line,
            col: loc.col_display + 1,
        }
    }

    fn resolve_inner(
        &self,
        expr: &Expr,
        in_flight: &mut Vec<String>,
    ) -> Result<String, ResolveError> {
        let expr = unwrap_wrappers(expr);
        match expr {
            Expr::Lit(Lit::Str(s)) => s
                .value
                .as_str()
                .map(|v| v.to_string())
                .ok_or_else(|| self.err(s.span, "string literal is not valid UTF-8")),
            Expr::Lit(Lit::Num(n)) => Ok(n.value.to_string()),
            Expr::Lit(Lit::Bool(b)) => Ok(b.value.to_string()),
            Expr::Lit(Lit::Null(_)) => Ok("null".to_string()),

            Expr::Ident(ident) => self.resolve_ident(ident, in_flight),

            Expr::Tpl(tpl) => {
                let mut out = String::new();
                for (i, quasi) in tpl.quasis.iter().enumerate() {
                    let cooked = quasi
                        .cooked
                        .as_ref()
                        .and_then(|s| s.as_str())
                        .ok_or_else(|| self.err(quasi.span, "template chunk is not valid UTF-8"))?;
                    out.push_str(cooked);
                    if let Some(part) = tpl.exprs.get(i) {
                        out.push_str(&self.resolve_inner(part, in_flight)?);
                    }
                }
                Ok(out)
            }

            Expr::Bin(bin) => {
                use swc_ecma_ast::BinaryOp;
                match bin.op {
                    BinaryOp::Add => {
                        let left = self.resolve_inner(&bin.left, in_flight)?;
                        let right = self.resolve_inner(&bin.right, in_flight)?;
                        Ok(format!("{}{}", left, right))
                    }
                    BinaryOp::LogicalOr => match self.resolve_inner(&bin.left, in_flight) {
                        Ok(left) if is_truthy(&left) => Ok(left),
                        Ok(_) => self.resolve_inner(&bin.right, in_flight),
                        Err(_) => self.resolve_inner(&bin.right, in_flight),
                    },
                    BinaryOp::LogicalAnd => match self.resolve_inner(&bin.left, in_flight) {
                        Ok(left) if is_truthy(&left) => {
                            self.resolve_inner(&bin.right, in_flight)
                        }
                        Ok(left) => Ok(left),
                        Err(_) => self.resolve_inner(&bin.right, in_flight),
                    },
                    BinaryOp::NullishCoalescing => {
                        match self.resolve_inner(&bin.left, in_flight) {
                            Ok(left) if left != "null" && left != "undefined" => Ok(left),
                            Ok(_) => self.resolve_inner(&bin.right, in_flight),
                            Err(_) => self.resolve_inner(&bin.right, in_flight),
                        }
                    }
                    op => Err(self.err(
                        bin.span,
                        format!("unsupported binary operator `{:?}`", op),
                    )),
                }
            }

            Expr::Unary(unary) => {
                let operand = self.resolve_inner(&unary.arg, in_flight)?;
                match unary.op {
                    // Every resolved value is already string-coerced, so
                    // `typeof` sees a string and `!` negates the string's
                    // truthiness, not the original value's.
                    UnaryOp::TypeOf => Ok("string".to_string()),
                    UnaryOp::Bang => Ok((!is_truthy(&operand)).to_string()),
                    UnaryOp::Void => Ok("undefined".to_string()),
                    UnaryOp::Minus => Ok(operand
                        .parse::<f64>()
                        .map(|v| (-v).to_string())
                        .unwrap_or_else(|_| "NaN".to_string())),
                    UnaryOp::Plus => Ok(operand
                        .parse::<f64>()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|_| "NaN".to_string())),
                    op => Err(self.err(
                        unary.span,
                        format!("unsupported unary operator `{:?}`", op),
                    )),
                }
            }

            Expr::Cond(cond) => match self.resolve_inner(&cond.test, in_flight) {
                Ok(test) if is_truthy(&test) => self.resolve_inner(&cond.cons, in_flight),
                Ok(_) => self.resolve_inner(&cond.alt, in_flight),
                Err(e) => Err(self.err(
                    cond.test.span(),
                    format!("conditional test cannot be resolved statically: {}", e.message),
                )),
            },

            Expr::Member(member) => {
                let projected = self.project_member(member, in_flight)?;
                self.resolve_inner(&projected, in_flight)
            }

            Expr::Seq(seq) => match seq.exprs.last() {
                Some(last) => self.resolve_inner(last, in_flight),
                None => Err(self.err(seq.span, "empty sequence expression")),
            },

            Expr::Call(call) => Err(self.err(
                call.span,
                "call expression results cannot be resolved statically",
            )),

            other => Err(self.err(
                other.span(),
                format!("unsupported expression: {}", expr_kind(other)),
            )),
        }
    }

    fn resolve_ident(
        &self,
        ident: &swc_ecma_ast::Ident,
        in_flight: &mut Vec<String>,
    ) -> Result<String, ResolveError> {
        let name = ident.sym.as_str();
        if name == "undefined" {
            return Ok("undefined".to_string());
        }
        if let Some(init) = self.bindings.const_init(name) {
            if in_flight.iter().any(|n| n == name) {
                return Err(self.err(
                    ident.span,
                    format!("const initializer cycle involving `{}`", name),
                ));
            }
            in_flight.push(name.to_string());
            let result = self.resolve_inner(init, in_flight);
            in_flight.pop();
            return result;
        }
        if self.bindings.is_import(name) {
            return Err(self.err(
                ident.span,
                format!("identifier `{}` refers to an imported binding", name),
            ));
        }
        if self.bindings.is_mutable(name) {
            return Err(self.err(
                ident.span,
                format!("identifier `{}` refers to a mutable binding", name),
            ));
        }
        Err(self.err(
            ident.span,
            format!("identifier `{}` is not a module-level const", name),
        ))
    }

    /// Project a member access through a const-bound object or array literal,
    /// returning the selected element expression.
    fn project_member(
        &self,
        member: &MemberExpr,
        in_flight: &mut Vec<String>,
    ) -> Result<Expr, ResolveError> {
        let target = self.literal_target(&member.obj, in_flight)?;
        let index = match &member.prop {
            MemberProp::Ident(name) => name.sym.to_string(),
            MemberProp::Computed(computed) => self.resolve_inner(&computed.expr, in_flight)?,
            MemberProp::PrivateName(_) => {
                return Err(self.err(member.span, "private member access is not supported"));
            }
        };

        match &target {
            Expr::Object(object) => project_object(object, &index).ok_or_else(|| {
                self.err(
                    member.span,
                    format!("property `{}` not found in const object literal", index),
                )
            }),
            Expr::Array(array) => {
                let idx = index.parse::<usize>().map_err(|_| {
                    self.err(
                        member.span,
                        format!("array index `{}` is not a number", index),
                    )
                })?;
                project_array(array, idx).ok_or_else(|| {
                    self.err(
                        member.span,
                        format!("index {} is out of bounds of const array literal", idx),
                    )
                })
            }
            other => Err(self.err(
                member.span,
                format!(
                    "member access target is {} rather than a const object or array literal",
                    expr_kind(other)
                ),
            )),
        }
    }

    /// Resolve an expression to the object or array literal it denotes.
    fn literal_target(
        &self,
        expr: &Expr,
        in_flight: &mut Vec<String>,
    ) -> Result<Expr, ResolveError> {
        let expr = unwrap_wrappers(expr);
        match expr {
            Expr::Object(_) | Expr::Array(_) => Ok(expr.clone()),
            Expr::Ident(ident) => {
                let name = ident.sym.as_str();
                match self.bindings.const_init(name) {
                    Some(init) => {
                        if in_flight.iter().any(|n| n == name) {
                            return Err(self.err(
                                ident.span,
                                format!("const initializer cycle involving `{}`", name),
                            ));
                        }
                        in_flight.push(name.to_string());
                        let result = self.literal_target(init, in_flight);
                        in_flight.pop();
                        result
                    }
                    None => Err(self.err(
                        ident.span,
                        format!("identifier `{}` is not a module-level const", name),
                    )),
                }
            }
            Expr::Member(member) => {
                let projected = self.project_member(member, in_flight)?;
                self.literal_target(&projected, in_flight)
            }
            other => Err(self.err(
                other.span(),
                format!(
                    "member access target is {} rather than a const object or array literal",
                    expr_kind(other)
                ),
            )),
        }
    }
}

fn project_object(object: &ObjectLit, name: &str) -> Option<Expr> {
    for prop in &object.props {
        if let PropOrSpread::Prop(prop) = prop {
            match &**prop {
                Prop::KeyValue(kv) => {
                    if prop_name(&kv.key).as_deref() == Some(name) {
                        return Some((*kv.value).clone());
                    }
                }
                Prop::Shorthand(ident) => {
                    if ident.sym.as_str() == name {
                        return Some(Expr::Ident(ident.clone()));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

fn project_array(array: &ArrayLit, index: usize) -> Option<Expr> {
    match array.elems.get(index) {
        Some(Some(element)) if element.spread.is_none() => Some((*element.expr).clone()),
        _ => None,
    }
}

fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => s.value.as_str().map(|v| v.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}
