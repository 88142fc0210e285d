//! Issue types for variant analysis results.
//!
//! This module defines every diagnostic the analysis engine can produce.
//! Each issue is self-contained with all information needed by:
//! - Reporter: to display the issue to users (CLI, JSON, etc.)
//! - Callers: to decide whether a build must abort (fatal) or may degrade

use enum_dispatch::enum_dispatch;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
///
/// `Error` issues must abort the surrounding build step: emitting styles or
/// attribute declarations from an incomplete manifest would ship incorrect
/// defaults. `Warning` issues mean the manifest may be missing variants for a
/// key, which degrades to missing styles, not a broken build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Rule identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    UnresolvableValue,
    InvalidKey,
    InitialValueConflict,
    DynamicValue,
    ParseError,
    ScanError,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::UnresolvableValue => write!(f, "unresolvable-value"),
            Rule::InvalidKey => write!(f, "invalid-key"),
            Rule::InitialValueConflict => write!(f, "initial-value-conflict"),
            Rule::DynamicValue => write!(f, "dynamic-value"),
            Rule::ParseError => write!(f, "parse-error"),
            Rule::ScanError => write!(f, "scan-error"),
        }
    }
}

// ============================================================
// Source Context
// ============================================================

/// Location of an issue in a source file.
///
/// `line` and `col` are 1-based; a line of 0 means the issue has no precise
/// location (e.g. it originates from configuration rather than source text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub file_path: String,
    pub line: usize,
    pub col: usize,
    /// Full text of the offending line, for caret display. Empty when the
    /// line could not be recovered.
    pub source_line: String,
}

impl SourceContext {
    pub fn new(
        file_path: impl Into<String>,
        line: usize,
        col: usize,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            col,
            source_line: source_line.into(),
        }
    }

    /// A context for issues that have no source location.
    pub fn detached(file_path: impl Into<String>) -> Self {
        Self::new(file_path, 0, 0, "")
    }
}

// ============================================================
// Issue Types
// ============================================================

/// A declaration's initial value (or required argument) cannot be statically
/// resolved. Fatal: every key must have a known initial value before the
/// application runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvableValueIssue {
    pub context: SourceContext,
    pub key: String,
    /// What made the expression unresolvable.
    pub detail: String,
}

/// A declaration key resolved to a string that is not a valid kebab-case
/// state key. Fatal: such a key cannot round-trip through a DOM attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyIssue {
    pub context: SourceContext,
    pub key: String,
}

/// Two declarations give the same key different initial values. Fatal,
/// reported with both locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictIssue {
    /// Location of the first-seen declaration.
    pub context: SourceContext,
    /// Location of the disagreeing declaration.
    pub other: SourceContext,
    pub key: String,
    pub first_value: String,
    pub second_value: String,
}

/// A setter was called with an argument that cannot be statically resolved.
/// Never fatal: the value set is simply incomplete for that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicValueIssue {
    pub context: SourceContext,
    pub key: String,
    pub detail: String,
}

/// A source file could not be parsed. Fatal for that file only; other files
/// still contribute to the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorIssue {
    pub context: SourceContext,
    pub detail: String,
}

/// The token scanner rejected a file or the searched key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanErrorIssue {
    pub context: SourceContext,
    pub detail: String,
}

// ============================================================
// Issue Enum
// ============================================================

/// A diagnostic produced during variant analysis.
#[enum_dispatch(IssueExt)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    UnresolvableValue(UnresolvableValueIssue),
    InvalidKey(InvalidKeyIssue),
    Conflict(ConflictIssue),
    DynamicValue(DynamicValueIssue),
    ParseError(ParseErrorIssue),
    ScanError(ScanErrorIssue),
}

impl Issue {
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Error
    }
}

// ============================================================
// IssueExt Trait (for CLI output)
// ============================================================

/// Common interface implemented by all issue types. Uses `enum_dispatch`
/// for zero-cost dispatch on the `Issue` enum.
#[enum_dispatch]
pub trait IssueExt {
    /// Location of the issue.
    fn context(&self) -> &SourceContext;

    /// Primary message to display.
    fn message(&self) -> String;

    /// Severity level.
    fn severity(&self) -> Severity;

    /// Rule identifier.
    fn rule(&self) -> Rule;

    /// Optional details for the "= note:" line.
    fn details(&self) -> Option<String> {
        None
    }
}

impl IssueExt for UnresolvableValueIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!(
            "initial value for key `{}` cannot be resolved statically",
            self.key
        )
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn rule(&self) -> Rule {
        Rule::UnresolvableValue
    }

    fn details(&self) -> Option<String> {
        Some(self.detail.clone())
    }
}

impl IssueExt for InvalidKeyIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!(
            "`{}` is not a valid state key (expected kebab-case: lowercase letters, digits, single dashes)",
            self.key
        )
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn rule(&self) -> Rule {
        Rule::InvalidKey
    }
}

impl IssueExt for ConflictIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!(
            "key `{}` is declared with conflicting initial values: `{}` and `{}`",
            self.key, self.first_value, self.second_value
        )
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn rule(&self) -> Rule {
        Rule::InitialValueConflict
    }

    fn details(&self) -> Option<String> {
        Some(format!(
            "conflicting declaration at {}:{}:{}",
            self.other.file_path, self.other.line, self.other.col
        ))
    }
}

impl IssueExt for DynamicValueIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!(
            "value for key `{}` is dynamic and will not generate styles",
            self.key
        )
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn rule(&self) -> Rule {
        Rule::DynamicValue
    }

    fn details(&self) -> Option<String> {
        Some(self.detail.clone())
    }
}

impl IssueExt for ParseErrorIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!("failed to parse file: {}", self.detail)
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn rule(&self) -> Rule {
        Rule::ParseError
    }
}

impl IssueExt for ScanErrorIssue {
    fn context(&self) -> &SourceContext {
        &self.context
    }

    fn message(&self) -> String {
        format!("token scan failed: {}", self.detail)
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn rule(&self) -> Rule {
        Rule::ScanError
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use crate::issues::*;

    #[test]
    fn test_unresolvable_value_issue() {
        let ctx = SourceContext::new("./src/app.tsx", 10, 5, "useUIState('theme', remote)");
        let issue = UnresolvableValueIssue {
            context: ctx,
            key: "theme".to_string(),
            detail: "identifier `remote` refers to an imported binding".to_string(),
        };

        assert_eq!(issue.severity(), Severity::Error);
        assert_eq!(issue.rule(), Rule::UnresolvableValue);
        insta::assert_snapshot!(
            issue.message(),
            @"initial value for key `theme` cannot be resolved statically"
        );
        assert_eq!(
            issue.details().unwrap(),
            "identifier `remote` refers to an imported binding"
        );
    }

    #[test]
    fn test_conflict_issue_names_both_locations() {
        let issue = ConflictIssue {
            context: SourceContext::new("./a.tsx", 3, 7, ""),
            other: SourceContext::new("./b.tsx", 12, 1, ""),
            key: "theme".to_string(),
            first_value: "light".to_string(),
            second_value: "dark".to_string(),
        };

        assert!(Issue::from(issue.clone()).is_fatal());
        insta::assert_snapshot!(
            issue.message(),
            @"key `theme` is declared with conflicting initial values: `light` and `dark`"
        );
        insta::assert_snapshot!(
            issue.details().unwrap(),
            @"conflicting declaration at ./b.tsx:12:1"
        );
    }

    #[test]
    fn test_dynamic_value_is_warning() {
        let issue = Issue::from(DynamicValueIssue {
            context: SourceContext::new("./src/app.tsx", 20, 9, "setTheme(next)"),
            key: "theme".to_string(),
            detail: "identifier `next` is not a module-level const".to_string(),
        });

        assert_eq!(issue.severity(), Severity::Warning);
        assert_eq!(issue.rule(), Rule::DynamicValue);
        assert!(!issue.is_fatal());
    }

    #[test]
    fn test_rule_display_names() {
        assert_eq!(Rule::UnresolvableValue.to_string(), "unresolvable-value");
        assert_eq!(
            Rule::InitialValueConflict.to_string(),
            "initial-value-conflict"
        );
        assert_eq!(Rule::DynamicValue.to_string(), "dynamic-value");
        assert_eq!(Rule::ParseError.to_string(), "parse-error");
    }

    #[test]
    fn test_detached_context() {
        let ctx = SourceContext::detached(".variarc.json");
        assert_eq!(ctx.line, 0);
        assert_eq!(ctx.col, 0);
        assert!(ctx.source_line.is_empty());
    }
}
