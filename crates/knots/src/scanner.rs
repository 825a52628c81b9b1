use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Knot declaration: `== name`, `=== name ===`, `=== function name(...)`
static KNOT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*={2,}\s*(?:function\s+)?([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid knot declaration pattern")
});

/// Variable declaration: `VAR name = ...`
static VAR_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*VAR\s+([A-Za-z_][A-Za-z0-9_]*)\s*=")
        .expect("valid variable declaration pattern")
});

/// A declaration found in script source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedDecl {
    pub name: String,

    /// 1-indexed line of the declaration
    pub line: usize,
}

/// Names extracted from one script source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScannedSource {
    pub knots: Vec<ScannedDecl>,
    pub variables: Vec<ScannedDecl>,
}

/// Extract knot and variable declarations from script source.
///
/// Works on the original text, independent of any compiled bytecode, so
/// files that have not been compiled yet still contribute names.
pub fn scan_source(content: &str) -> ScannedSource {
    let mut scan = ScannedSource::default();

    for (idx, line) in content.lines().enumerate() {
        if let Some(caps) = KNOT_DECL.captures(line) {
            scan.knots.push(ScannedDecl {
                name: caps[1].to_string(),
                line: idx + 1,
            });
        } else if let Some(caps) = VAR_DECL.captures(line) {
            scan.variables.push(ScannedDecl {
                name: caps[1].to_string(),
                line: idx + 1,
            });
        }
    }

    scan
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Maximum number of files kept in the cache
    pub cache_capacity: usize,

    /// How long a cached scan stays valid without rescanning
    pub cache_ttl: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 64,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

struct CacheEntry {
    fingerprint: [u8; 32],
    scanned_at: Instant,
    scan: ScannedSource,
}

/// Source scanner with a TTL- and capacity-bounded per-file cache.
///
/// A cache hit requires both an unexpired entry and an unchanged content
/// fingerprint; either miss triggers a rescan.
pub struct SourceScanner {
    cache: LruCache<String, CacheEntry>,
    ttl: Duration,
}

impl SourceScanner {
    pub fn new(config: ScannerConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity.max(1)).expect("capacity >= 1");
        Self {
            cache: LruCache::new(capacity),
            ttl: config.cache_ttl,
        }
    }

    pub fn scan(&mut self, path: &str, content: &str) -> ScannedSource {
        let fingerprint = fingerprint(content);

        if let Some(entry) = self.cache.get(path) {
            if entry.fingerprint == fingerprint && entry.scanned_at.elapsed() < self.ttl {
                log::debug!("source cache hit for {path}");
                return entry.scan.clone();
            }
        }

        let scan = scan_source(content);
        log::debug!(
            "scanned {path}: {} knots, {} variables",
            scan.knots.len(),
            scan.variables.len()
        );
        self.cache.put(
            path.to_string(),
            CacheEntry {
                fingerprint,
                scanned_at: Instant::now(),
                scan: scan.clone(),
            },
        );
        scan
    }
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

fn fingerprint(content: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().into()
}
