//! Data model for the variant manifest.
//!
//! The manifest is the engine's only output: one `VariantRecord` per state
//! key, in first-declaration order, plus the list of files that contributed
//! to it. Downstream emitters (style rules, attribute declarations, build
//! dependency registration) consume it as-is.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::issues::SourceContext;

static STATE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("state key regex"));

/// Check that a key is kebab-case: lowercase alphanumeric segments joined by
/// single dashes. Keys are written verbatim as DOM attribute names, so
/// anything else is rejected.
pub fn is_valid_state_key(key: &str) -> bool {
    STATE_KEY_REGEX.is_match(key)
}

/// A source file supplied to the engine, already read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Whether a declaration targets the document-wide attribute host or a
/// specific element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationScope {
    Global,
    Scoped,
}

/// One state-key declaration site, with its key and initial value already
/// resolved to literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub key: String,
    pub initial_value: String,
    pub scope: DeclarationScope,
    /// Name of the destructured setter binding, when the declaration bound
    /// one. Declarations without a setter have no usages to harvest.
    pub setter: Option<String>,
    pub context: SourceContext,
}

/// All discovered values for one state key.
///
/// `values` preserves first-seen order and never contains duplicates.
/// `initial_value` is `None` for keys that were only ever seen by the token
/// scanner (configured extra keys with no declaration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub key: String,
    pub values: Vec<String>,
    pub initial_value: Option<String>,
}

impl VariantRecord {
    pub fn new(key: impl Into<String>, initial_value: Option<String>) -> Self {
        Self {
            key: key.into(),
            values: Vec::new(),
            initial_value,
        }
    }

    /// Append a value unless it is already present.
    pub fn push_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// The engine's final output for one build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// One record per key, in first-declaration order (scanner-only keys
    /// follow, in discovery order).
    pub records: Vec<VariantRecord>,
    /// Files that contributed at least one declaration, harvested value, or
    /// scanned token, in input order. Returned for downstream dependency
    /// tracking, never interpreted here.
    pub files: Vec<String>,
}

impl Manifest {
    /// Look up a record by key.
    pub fn record(&self, key: &str) -> Option<&VariantRecord> {
        self.records.iter().find(|r| r.key == key)
    }
}
