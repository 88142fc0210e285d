//! Fingerprint-keyed scan cache.
//!
//! Watch-mode rebuilds re-analyze the same files over and over; the scanner
//! memoizes each (source text, key set) pair by content fingerprint so
//! unchanged input is never re-scanned. Failures are memoized too: a scan
//! that failed must fail identically on the next identical input instead of
//! silently healing or paying the scan cost again.
//!
//! The cache is a trait so callers can inject a no-op cache (tests that must
//! exercise the cold path) or a recording cache (hit-rate diagnostics in
//! long-running watch sessions).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::scanner::ScanError;

/// Map from state key to the values found for it, in discovery order. Every
/// searched key has an entry, even when nothing was found.
pub type TokenMap = HashMap<String, Vec<String>>;

/// A memoized scan result: the token map, or the error the scan produced.
pub type ScanOutcome = Result<TokenMap, ScanError>;

/// Storage for memoized scan outcomes, keyed by content fingerprint.
///
/// Correctness requires the fingerprint to fully determine the outcome;
/// implementations only store and replay, they never recompute.
pub trait ScanCache: Send + Sync {
    fn get(&self, fingerprint: &str) -> Option<ScanOutcome>;
    fn put(&self, fingerprint: &str, outcome: &ScanOutcome);
}

const DEFAULT_CAPACITY: usize = 4096;

struct CacheInner {
    entries: HashMap<String, ScanOutcome>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Bounded, thread-safe in-memory cache. Oldest entries are evicted first
/// once the capacity is reached, which bounds memory across long watch
/// sessions.
pub struct FingerprintCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanCache for FingerprintCache {
    fn get(&self, fingerprint: &str) -> Option<ScanOutcome> {
        let inner = self.inner.lock().expect("cache lock");
        inner.entries.get(fingerprint).cloned()
    }

    fn put(&self, fingerprint: &str, outcome: &ScanOutcome) {
        let mut inner = self.inner.lock().expect("cache lock");
        if inner.entries.contains_key(fingerprint) {
            return;
        }
        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
        inner.entries.insert(fingerprint.to_string(), outcome.clone());
        inner.order.push_back(fingerprint.to_string());
    }
}

/// Cache that stores nothing; every scan takes the cold path.
pub struct NoopCache;

impl ScanCache for NoopCache {
    fn get(&self, _fingerprint: &str) -> Option<ScanOutcome> {
        None
    }

    fn put(&self, _fingerprint: &str, _outcome: &ScanOutcome) {}
}

/// Cache wrapper that counts hits and misses.
pub struct RecordingCache<C> {
    inner: C,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<C: ScanCache> RecordingCache<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<C: ScanCache> ScanCache for RecordingCache<C> {
    fn get(&self, fingerprint: &str) -> Option<ScanOutcome> {
        let outcome = self.inner.get(fingerprint);
        match outcome {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        outcome
    }

    fn put(&self, fingerprint: &str, outcome: &ScanOutcome) {
        self.inner.put(fingerprint, outcome);
    }
}
