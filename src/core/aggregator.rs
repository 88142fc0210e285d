//! Per-file analysis orchestration and cross-file aggregation.
//!
//! The aggregator runs two parallel passes over the supplied files. Pass one
//! parses each file, collects declarations, and harvests setter values; the
//! union of declared keys (plus configured extra keys) then forms the key
//! set for pass two, the raw-text token scan. Results merge sequentially in
//! input order, so output is deterministic regardless of worker scheduling.
//!
//! A file that fails to parse, fails a declaration, or fails its scan
//! contributes nothing except its diagnostics; the manifest still carries
//! every healthy file's records.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cache::{FingerprintCache, ScanCache, ScanOutcome};
use super::collector::DeclarationCollector;
use super::harvester::SetterUsageHarvester;
use super::manifest::{Declaration, Manifest, SourceFile, VariantRecord, is_valid_state_key};
use super::parser::parse_source;
use super::resolver::{ExprResolver, ModuleBindings};
use super::scanner::TokenScanner;
use crate::issues::{
    ConflictIssue, InvalidKeyIssue, Issue, IssueExt, ParseErrorIssue, ScanErrorIssue, Severity,
    SourceContext,
};

/// Names of the recognized declaration calls: one for document-wide state,
/// one for element-scoped state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HookNames {
    pub global: String,
    pub scoped: String,
}

impl Default for HookNames {
    fn default() -> Self {
        Self {
            global: "useUIState".to_string(),
            scoped: "useScopedUIState".to_string(),
        }
    }
}

/// Engine options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub hooks: HookNames,
    /// Keys the token scanner should search for even when no file declares
    /// them (e.g. keys produced by a runtime outside this project).
    pub extra_keys: Vec<String>,
}

/// The manifest plus every diagnostic produced along the way. Fatal issues
/// and healthy files' records coexist; the caller decides whether to abort.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub manifest: Manifest,
    pub issues: Vec<Issue>,
}

impl AnalysisOutcome {
    pub fn has_fatal_issues(&self) -> bool {
        self.issues.iter().any(Issue::is_fatal)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
            .count()
    }
}

/// Pass-one output for a single healthy file.
struct FileAnalysis {
    declarations: Vec<Declaration>,
    /// `(key, value)` pairs from setter usages, in discovery order.
    harvested: Vec<(String, String)>,
    warnings: Vec<Issue>,
}

/// Runs the full analysis pipeline over a set of source files.
pub struct Aggregator {
    scanner: TokenScanner,
}

impl Aggregator {
    pub fn new(cache: Arc<dyn ScanCache>) -> Self {
        Self {
            scanner: TokenScanner::new(cache),
        }
    }

    pub fn with_default_cache() -> Self {
        Self::new(Arc::new(FingerprintCache::new()))
    }

    pub fn aggregate(&self, files: &[SourceFile], options: &AnalyzeOptions) -> AnalysisOutcome {
        let mut issues: Vec<Issue> = Vec::new();

        // Extra keys come from configuration; an invalid one would poison
        // every scan, so reject it here and search the rest.
        let mut extra_keys: Vec<String> = Vec::new();
        for key in &options.extra_keys {
            if is_valid_state_key(key) {
                if !extra_keys.contains(key) {
                    extra_keys.push(key.clone());
                }
            } else {
                issues.push(Issue::from(InvalidKeyIssue {
                    context: SourceContext::detached("configuration"),
                    key: key.clone(),
                }));
            }
        }

        // Pass one: parse, collect, harvest. Results come back in input
        // order regardless of worker scheduling.
        let pass_one: Vec<Result<FileAnalysis, Vec<Issue>>> = files
            .par_iter()
            .map(|file| analyze_file(file, &options.hooks))
            .collect();

        // The scanner's key set is every key declared anywhere, in
        // first-declaration order, then the extra keys.
        let mut keys: Vec<String> = Vec::new();
        for analysis in pass_one.iter().filter_map(|r| r.as_ref().ok()) {
            for declaration in &analysis.declarations {
                if !keys.contains(&declaration.key) {
                    keys.push(declaration.key.clone());
                }
            }
        }
        for key in &extra_keys {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }

        // Pass two: token scan of each healthy file's raw text.
        let scans: Vec<Option<ScanOutcome>> = files
            .par_iter()
            .zip(pass_one.par_iter())
            .map(|(file, result)| {
                result
                    .as_ref()
                    .ok()
                    .map(|_| self.scanner.scan(&file.text, &keys))
            })
            .collect();

        // A file contributes only when both passes succeeded.
        let healthy: Vec<bool> = pass_one
            .iter()
            .zip(scans.iter())
            .map(|(analysis, scan)| {
                analysis.is_ok() && matches!(scan, Some(Ok(_)))
            })
            .collect();

        // Per-file diagnostics, in input order.
        for (i, file) in files.iter().enumerate() {
            match &pass_one[i] {
                Ok(analysis) => issues.extend(analysis.warnings.iter().cloned()),
                Err(file_issues) => issues.extend(file_issues.iter().cloned()),
            }
            if let Some(Err(scan_error)) = &scans[i] {
                issues.push(Issue::from(ScanErrorIssue {
                    context: SourceContext::detached(&file.path),
                    detail: scan_error.to_string(),
                }));
            }
        }

        // Conflict pass: every declaration of a key must agree on its
        // initial value. Conflicts are data, reported with both locations.
        let mut first_seen: HashMap<String, (String, SourceContext)> = HashMap::new();
        for analysis in healthy_analyses(&pass_one, &healthy) {
            for declaration in &analysis.declarations {
                match first_seen.get(&declaration.key) {
                    None => {
                        first_seen.insert(
                            declaration.key.clone(),
                            (
                                declaration.initial_value.clone(),
                                declaration.context.clone(),
                            ),
                        );
                    }
                    Some((first_value, first_context))
                        if *first_value != declaration.initial_value =>
                    {
                        issues.push(Issue::from(ConflictIssue {
                            context: first_context.clone(),
                            other: declaration.context.clone(),
                            key: declaration.key.clone(),
                            first_value: first_value.clone(),
                            second_value: declaration.initial_value.clone(),
                        }));
                    }
                    Some(_) => {}
                }
            }
        }

        // Merge. Records appear in first-declaration order; keys only ever
        // seen by the scanner follow in discovery order. Within a file,
        // scanned values precede harvested ones.
        let mut order: Vec<String> = Vec::new();
        let mut records: HashMap<String, VariantRecord> = HashMap::new();
        for analysis in healthy_analyses(&pass_one, &healthy) {
            for declaration in &analysis.declarations {
                if !records.contains_key(&declaration.key) {
                    order.push(declaration.key.clone());
                    records.insert(
                        declaration.key.clone(),
                        VariantRecord::new(
                            &declaration.key,
                            Some(declaration.initial_value.clone()),
                        ),
                    );
                }
            }
        }

        let mut contributing_files: Vec<String> = Vec::new();
        for (i, file) in files.iter().enumerate() {
            if !healthy[i] {
                continue;
            }
            let analysis = pass_one[i].as_ref().expect("healthy file analysis");
            let scan = match &scans[i] {
                Some(Ok(map)) => map,
                _ => continue,
            };

            let mut contributed = !analysis.declarations.is_empty();
            for key in &keys {
                let Some(values) = scan.get(key) else {
                    continue;
                };
                if !values.is_empty() {
                    contributed = true;
                }
                for value in values {
                    ensure_record(&mut order, &mut records, key).push_value(value.clone());
                }
            }
            for (key, value) in &analysis.harvested {
                contributed = true;
                ensure_record(&mut order, &mut records, key).push_value(value.clone());
            }

            if contributed {
                contributing_files.push(file.path.clone());
            }
        }

        let manifest = Manifest {
            records: order
                .iter()
                .map(|key| records.remove(key).expect("record for ordered key"))
                .collect(),
            files: contributing_files,
        };

        AnalysisOutcome { manifest, issues }
    }
}

fn healthy_analyses<'a>(
    pass_one: &'a [Result<FileAnalysis, Vec<Issue>>],
    healthy: &'a [bool],
) -> impl Iterator<Item = &'a FileAnalysis> {
    pass_one
        .iter()
        .zip(healthy.iter())
        .filter_map(|(result, ok)| if *ok { result.as_ref().ok() } else { None })
}

fn ensure_record<'a>(
    order: &mut Vec<String>,
    records: &'a mut HashMap<String, VariantRecord>,
    key: &str,
) -> &'a mut VariantRecord {
    if !records.contains_key(key) {
        order.push(key.to_string());
        records.insert(key.to_string(), VariantRecord::new(key, None));
    }
    records.get_mut(key).expect("record just ensured")
}

fn analyze_file(file: &SourceFile, hooks: &HookNames) -> Result<FileAnalysis, Vec<Issue>> {
    let parsed = parse_source(&file.text, &file.path).map_err(|failure| {
        vec![Issue::from(ParseErrorIssue {
            context: SourceContext::new(&file.path, failure.line, failure.col, ""),
            detail: failure.message,
        })]
    })?;

    let bindings = ModuleBindings::collect(&parsed.module);
    let resolver = ExprResolver::new(&file.path, &parsed.source_map, &bindings);
    let collected = DeclarationCollector::collect(
        &parsed.module,
        &file.path,
        &parsed.source_map,
        hooks,
        &resolver,
    );
    if !collected.issues.is_empty() {
        return Err(collected.issues);
    }

    let harvested = SetterUsageHarvester::harvest(
        &parsed.module,
        &collected.declarations,
        &file.path,
        &parsed.source_map,
        &resolver,
    );

    Ok(FileAnalysis {
        declarations: collected.declarations,
        harvested: harvested.values,
        warnings: harvested.warnings,
    })
}
