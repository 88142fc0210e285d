//! Core analysis engine.
//!
//! Operates on source text the caller has already read; no I/O happens
//! here. The pipeline per build pass:
//!
//! 1. `parser` turns each file into an AST.
//! 2. `collector` finds state-key declarations and resolves their keys and
//!    initial values through `resolver`.
//! 3. `harvester` follows each declaration's setter binding and resolves
//!    every value it can assign.
//! 4. `scanner` searches raw text for free-floating `key-value:directive`
//!    tokens, memoized through `cache`.
//! 5. `aggregator` orchestrates the passes, detects initial-value
//!    conflicts, and merges everything into the ordered `manifest`.

pub mod aggregator;
pub mod cache;
pub mod collector;
pub mod harvester;
pub mod manifest;
pub mod parser;
pub mod resolver;
pub mod scanner;

pub use aggregator::{AnalysisOutcome, AnalyzeOptions, Aggregator, HookNames};
pub use cache::{FingerprintCache, NoopCache, RecordingCache, ScanCache, ScanOutcome, TokenMap};
pub use collector::{CollectedDeclarations, DeclarationCollector};
pub use harvester::{HarvestedValues, SetterUsageHarvester};
pub use manifest::{
    Declaration, DeclarationScope, Manifest, SourceFile, VariantRecord, is_valid_state_key,
};
pub use parser::{ParseFailure, ParsedSource, parse_source};
pub use resolver::{ExprResolver, ModuleBindings, ResolveError};
pub use scanner::{ScanError, TokenScanner, fingerprint, scan_tokens};
