//! Free-floating style token scanning.
//!
//! Markup attributes may carry selector tokens like `theme-dark:hidden` or
//! `md:sidebar-state-open:flex` that never flow through a setter. This
//! scanner finds them in raw source text, independent of the syntax tree,
//! and attributes each `<key>-<value>` segment to a known state key.
//!
//! Candidate tokens are extracted with two complementary patterns: a
//! tolerant one that accepts utility punctuation inside segments (brackets,
//! `#`, `%`, `/`, `.`), and a strict kebab-case one that recovers tokens the
//! tolerant pass glued to surrounding punctuation. The final `:`-separated
//! segment of a candidate is the style directive and is discarded; the rest
//! are matched against the key set, longest key first, so `theme-test-dark`
//! credits `dark` to `theme-test` and never `test-dark` to `theme`.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use sha2::{Digest, Sha256};

use super::cache::{ScanCache, ScanOutcome, TokenMap};
use super::manifest::is_valid_state_key;

static TOLERANT_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_\[\]()#%/.!-]+(?::[A-Za-z0-9_\[\]()#%/.!-]+)+").expect("token regex")
});

static STRICT_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9-]+(?::[a-z0-9-]+)+").expect("token regex"));

/// Guard against pathological input; a single candidate longer than this
/// fails the scan.
const MAX_TOKEN_LEN: usize = 4096;

/// A rejected scan. Memoized by fingerprint and replayed on identical input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The searched key set contains a key that is not kebab-case.
    InvalidKey { key: String },
    /// A candidate token exceeded the length guard.
    TokenTooLong { offset: usize },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::InvalidKey { key } => {
                write!(f, "searched key `{}` is not a valid state key", key)
            }
            ScanError::TokenTooLong { offset } => {
                write!(f, "token at byte offset {} exceeds {} bytes", offset, MAX_TOKEN_LEN)
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// Compute the cache fingerprint for a (source text, key set) pair: the
/// first 16 hex characters of a SHA-256 over the text and the sorted keys.
pub fn fingerprint(source: &str, keys: &[String]) -> String {
    let mut sorted: Vec<&str> = keys.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    for key in &sorted {
        hasher.update(key.as_bytes());
        hasher.update([b'\n']);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Scans raw source text for style tokens, memoizing by fingerprint.
pub struct TokenScanner {
    cache: Arc<dyn ScanCache>,
}

impl TokenScanner {
    pub fn new(cache: Arc<dyn ScanCache>) -> Self {
        Self { cache }
    }

    /// Scan one file against the key set. On a cache hit the memoized map
    /// (or memoized error) is returned without touching the text.
    pub fn scan(&self, source: &str, keys: &[String]) -> ScanOutcome {
        let fingerprint = fingerprint(source, keys);
        if let Some(outcome) = self.cache.get(&fingerprint) {
            return outcome;
        }
        let outcome = scan_tokens(source, keys);
        self.cache.put(&fingerprint, &outcome);
        outcome
    }
}

/// Uncached scan. Every key gets an entry in the result map even when no
/// token matched it; tokens that match no key are ignored.
pub fn scan_tokens(source: &str, keys: &[String]) -> ScanOutcome {
    for key in keys {
        if !is_valid_state_key(key) {
            return Err(ScanError::InvalidKey { key: key.clone() });
        }
    }

    let mut longest_first: Vec<&str> = keys.iter().map(String::as_str).collect();
    longest_first.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    longest_first.dedup();

    let mut map: TokenMap = keys.iter().map(|k| (k.clone(), Vec::new())).collect();

    for regex in [&*TOLERANT_TOKEN_REGEX, &*STRICT_TOKEN_REGEX] {
        for candidate in regex.find_iter(source) {
            if candidate.as_str().len() > MAX_TOKEN_LEN {
                return Err(ScanError::TokenTooLong {
                    offset: candidate.start(),
                });
            }
            collect_candidate(candidate.as_str(), &longest_first, &mut map);
        }
    }

    Ok(map)
}

fn collect_candidate(candidate: &str, longest_first: &[&str], map: &mut TokenMap) {
    let segments: Vec<&str> = candidate.split(':').collect();
    // The final segment is the style directive itself, never a key-value pair.
    for segment in &segments[..segments.len() - 1] {
        for key in longest_first {
            if let Some(value) = segment
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('-'))
                && !value.is_empty()
            {
                let values = map.get_mut(*key).expect("key present in map");
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
                // First matching key wins for this segment.
                break;
            }
        }
    }
}
