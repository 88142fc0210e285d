//! State-key declaration collection.
//!
//! Finds every call to a recognized declaration hook, resolves its key and
//! initial value, and records the destructured setter binding for the
//! usage harvester:
//!
//! ```tsx
//! const [theme, setTheme] = useUIState("theme", "dark");
//! const [size, setSize] = useScopedUIState("size", compact ? "sm" : "md");
//! ```
//!
//! Keys that cannot be resolved are skipped (dynamic keys are a supported
//! escape hatch); an initial value that cannot be resolved is fatal, since
//! every declared key must have a statically known default.

use swc_common::{SourceMap, Spanned};
use swc_ecma_ast::{CallExpr, Callee, Expr, Module, Pat, VarDecl, VarDeclarator};
use swc_ecma_visit::{Visit, VisitWith};

use super::aggregator::HookNames;
use super::manifest::{Declaration, DeclarationScope, is_valid_state_key};
use super::parser::context_at;
use super::resolver::ExprResolver;
use crate::issues::{Issue, InvalidKeyIssue, UnresolvableValueIssue};

/// Result of collecting declarations from one file.
pub struct CollectedDeclarations {
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Fatal issues. A file with any of these contributes nothing to the
    /// manifest.
    pub issues: Vec<Issue>,
}

/// Visitor that extracts state-key declarations from a parsed module.
pub struct DeclarationCollector<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    hooks: &'a HookNames,
    resolver: &'a ExprResolver<'a>,
    declarations: Vec<Declaration>,
    issues: Vec<Issue>,
}

impl<'a> DeclarationCollector<'a> {
    pub fn collect(
        module: &Module,
        file_path: &'a str,
        source_map: &'a SourceMap,
        hooks: &'a HookNames,
        resolver: &'a ExprResolver<'a>,
    ) -> CollectedDeclarations {
        let mut collector = Self {
            file_path,
            source_map,
            hooks,
            resolver,
            declarations: Vec::new(),
            issues: Vec::new(),
        };
        collector.visit_module(module);
        CollectedDeclarations {
            declarations: collector.declarations,
            issues: collector.issues,
        }
    }

    fn hook_scope(&self, name: &str) -> Option<DeclarationScope> {
        if name == self.hooks.global {
            Some(DeclarationScope::Global)
        } else if name == self.hooks.scoped {
            Some(DeclarationScope::Scoped)
        } else {
            None
        }
    }

    fn handle_declarator(&mut self, declarator: &VarDeclarator) {
        let Some(init) = &declarator.init else {
            return;
        };
        let call = match &**init {
            Expr::Call(call) => call,
            Expr::Await(await_expr) => match &*await_expr.arg {
                Expr::Call(call) => call,
                _ => return,
            },
            _ => return,
        };
        let Callee::Expr(callee) = &call.callee else {
            return;
        };
        let Expr::Ident(callee_ident) = &**callee else {
            return;
        };
        let Some(scope) = self.hook_scope(callee_ident.sym.as_str()) else {
            return;
        };

        self.handle_declaration_call(declarator, call, scope);
    }

    fn handle_declaration_call(
        &mut self,
        declarator: &VarDeclarator,
        call: &CallExpr,
        scope: DeclarationScope,
    ) {
        // Key argument. Unresolvable keys are dynamic by design and skipped.
        let Some(key_arg) = call.args.first() else {
            return;
        };
        if key_arg.spread.is_some() {
            return;
        }
        let Ok(key) = self.resolver.resolve(&key_arg.expr) else {
            return;
        };

        let context = context_at(self.source_map, self.file_path, call.span.lo);
        if !is_valid_state_key(&key) {
            self.issues.push(Issue::from(InvalidKeyIssue { context, key }));
            return;
        }

        // Initial-value argument. Failure here is fatal: a declaration with
        // no statically known default would flash an incorrect state on
        // first paint.
        let initial_value = match call.args.get(1) {
            None => {
                self.issues.push(Issue::from(UnresolvableValueIssue {
                    context,
                    key,
                    detail: "declaration has no initial-value argument".to_string(),
                }));
                return;
            }
            Some(arg) if arg.spread.is_some() => {
                self.issues.push(Issue::from(UnresolvableValueIssue {
                    context,
                    key,
                    detail: "initial value is a spread argument".to_string(),
                }));
                return;
            }
            Some(arg) => match self.resolver.resolve(&arg.expr) {
                Ok(value) => value,
                Err(e) => {
                    let context = context_at(self.source_map, self.file_path, arg.expr.span().lo);
                    self.issues.push(Issue::from(UnresolvableValueIssue {
                        context,
                        key,
                        detail: e.message,
                    }));
                    return;
                }
            },
        };

        let setter = setter_binding(&declarator.name);
        self.declarations.push(Declaration {
            key,
            initial_value,
            scope,
            setter,
            context,
        });
    }
}

/// Extract the setter name from the declaration's destructuring pattern
/// (`const [value, setValue] = ...` binds `setValue`).
fn setter_binding(pat: &Pat) -> Option<String> {
    let Pat::Array(array) = pat else {
        return None;
    };
    match array.elems.get(1) {
        Some(Some(Pat::Ident(binding))) => Some(binding.id.sym.to_string()),
        _ => None,
    }
}

impl Visit for DeclarationCollector<'_> {
    fn visit_var_decl(&mut self, node: &VarDecl) {
        for declarator in &node.decls {
            self.handle_declarator(declarator);
        }
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::parser::parse_source;
    use crate::core::resolver::ModuleBindings;
    use crate::issues::IssueExt;

    fn collect(code: &str) -> CollectedDeclarations {
        let parsed = parse_source(code, "test.tsx").unwrap();
        let bindings = ModuleBindings::collect(&parsed.module);
        let resolver = ExprResolver::new("test.tsx", &parsed.source_map, &bindings);
        let hooks = HookNames::default();
        DeclarationCollector::collect(
            &parsed.module,
            "test.tsx",
            &parsed.source_map,
            &hooks,
            &resolver,
        )
    }

    #[test]
    fn test_collects_global_declaration() {
        let result = collect(
            r#"
            export function App() {
                const [theme, setTheme] = useUIState("theme", "dark");
                return <div />;
            }
            "#,
        );

        assert!(result.issues.is_empty());
        assert_eq!(result.declarations.len(), 1);
        let decl = &result.declarations[0];
        assert_eq!(decl.key, "theme");
        assert_eq!(decl.initial_value, "dark");
        assert_eq!(decl.scope, DeclarationScope::Global);
        assert_eq!(decl.setter.as_deref(), Some("setTheme"));
        assert_eq!(decl.context.line, 3);
    }

    #[test]
    fn test_collects_scoped_declaration() {
        let result = collect(
            r#"const [size, setSize] = useScopedUIState("size", "md");"#,
        );

        assert_eq!(result.declarations.len(), 1);
        assert_eq!(result.declarations[0].scope, DeclarationScope::Scoped);
    }

    #[test]
    fn test_initial_value_through_const() {
        let result = collect(
            "const DEFAULT = 'dark';\nconst [theme, setTheme] = useUIState('theme', DEFAULT);",
        );

        assert!(result.issues.is_empty());
        assert_eq!(result.declarations[0].initial_value, "dark");
    }

    #[test]
    fn test_declaration_order_is_source_order() {
        let result = collect(
            r#"
            const [a, setA] = useUIState("alpha", "1");
            function Widget() {
                const [b, setB] = useUIState("beta", "2");
                return null;
            }
            const [c, setC] = useUIState("gamma", "3");
            "#,
        );

        let keys: Vec<&str> = result.declarations.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_unresolvable_key_is_skipped() {
        let result = collect(
            "const [v, setV] = useUIState(dynamicKey, 'x');",
        );

        assert!(result.declarations.is_empty());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_invalid_key_is_fatal() {
        let result = collect(r#"const [v, setV] = useUIState("Theme_Mode", "x");"#);

        assert!(result.declarations.is_empty());
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].is_fatal());
        assert!(result.issues[0].message().contains("Theme_Mode"));
    }

    #[test]
    fn test_unresolvable_initial_value_is_fatal() {
        let result = collect(
            "import { importedConst } from './config';\nconst [v, setV] = useUIState('v', importedConst);",
        );

        assert!(result.declarations.is_empty());
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert!(issue.is_fatal());
        assert!(
            issue.details().unwrap().contains("`importedConst`"),
            "{:?}",
            issue.details()
        );
    }

    #[test]
    fn test_missing_initial_value_is_fatal() {
        let result = collect("const [v, setV] = useUIState('v');");

        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].is_fatal());
    }

    #[test]
    fn test_declaration_without_destructured_setter() {
        let result = collect("const state = useUIState('theme', 'dark');");

        assert_eq!(result.declarations.len(), 1);
        assert_eq!(result.declarations[0].setter, None);
    }

    #[test]
    fn test_awaited_declaration() {
        let result = collect("const [v, setV] = await useUIState('v', 'x');");

        assert_eq!(result.declarations.len(), 1);
        assert_eq!(result.declarations[0].key, "v");
    }

    #[test]
    fn test_unrelated_calls_are_ignored() {
        let result = collect("const [v, setV] = useState('not-a-ui-key');");

        assert!(result.declarations.is_empty());
        assert!(result.issues.is_empty());
    }
}
