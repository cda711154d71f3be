//! # Digest Cache — SHA-512 Integrity Attestation
//!
//! Installer artifacts can be hundreds of megabytes, so digests are computed
//! by streaming the file through an incremental SHA-512 accumulator with a
//! fixed-size buffer and memoized for the lifetime of the process.
//!
//! ## Cache validity
//!
//! An entry is keyed by artifact path and is valid only while the file's
//! [`Fingerprint`] (size, modification time) matches the one recorded when
//! the digest was computed. A mismatch forces recomputation, so no separate
//! invalidation signal is needed and entries never need evicting.
//!
//! ## Failure isolation
//!
//! A failed or timed-out computation never inserts an entry. A digest whose
//! file changed while it was being read is returned to the caller but not
//! cached.
//!
//! ## Single-flight
//!
//! Concurrent misses for the same path serialize on a per-path gate; callers
//! that waited re-check the cache before hashing, so each distinct
//! `(path, fingerprint)` is hashed once.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::error::UpdateError;
use crate::resolver::{ArtifactRecord, Fingerprint, LocatedArtifact};

/// Read buffer size for streaming digests.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

const MIB: u64 = 1024 * 1024;

/// A 64-byte SHA-512 digest.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sha512Digest([u8; 64]);

impl Sha512Digest {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Digest an in-memory buffer.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&Sha512::digest(data));
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex rendering, always 128 characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Sha512Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Sha512Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha512Digest({})", self.to_hex())
    }
}

/// Upper bound on digest time, proportional to artifact size.
///
/// `limit = base + per_mib * ceil(size / 1 MiB)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestBudget {
    pub base: Duration,
    pub per_mib: Duration,
}

impl Default for DigestBudget {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
            per_mib: Duration::from_millis(250),
        }
    }
}

impl DigestBudget {
    /// Time allowed for hashing a file of `size` bytes.
    pub fn for_size(&self, size: u64) -> Duration {
        let mib = size.div_ceil(MIB).min(u64::from(u32::MAX)) as u32;
        self.base.saturating_add(self.per_mib.saturating_mul(mib))
    }
}

/// Stream `path` through SHA-512.
///
/// When `limit` is set the read loop aborts with
/// [`UpdateError::DigestTimeout`] once it is exceeded; the file handle is
/// dropped on return either way.
pub fn sha512_file(path: &Path, limit: Option<Duration>) -> Result<Sha512Digest, UpdateError> {
    let started = Instant::now();
    let mut file = File::open(path).map_err(|e| UpdateError::io(path, e))?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(UpdateError::io(path, e)),
        };
        hasher.update(&buffer[..n]);

        if let Some(budget) = limit {
            if started.elapsed() > budget {
                return Err(UpdateError::DigestTimeout {
                    path: path.to_path_buf(),
                    budget,
                });
            }
        }
    }

    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&hasher.finalize());
    Ok(Sha512Digest(bytes))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    digest: Sha512Digest,
}

/// Counters describing cache behaviour since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Paths currently holding a digest.
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Completed full-file hashes (including ones that were not cached).
    pub computations: u64,
}

/// Process-lifetime digest memo, safe for concurrent use.
#[derive(Debug, Default)]
pub struct DigestCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    budget: Option<DigestBudget>,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

impl DigestCache {
    /// A cache without a time limit on digest computation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that aborts digests exceeding `budget`.
    pub fn with_budget(budget: DigestBudget) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn budget(&self) -> Option<DigestBudget> {
        self.budget
    }

    /// Return the digest for `path`, hashing it only if no entry matches
    /// `fingerprint`.
    ///
    /// Blocking: call from a blocking-capable context.
    pub fn get_or_compute(
        &self,
        path: &Path,
        fingerprint: Fingerprint,
    ) -> Result<Sha512Digest, UpdateError> {
        if let Some(digest) = self.lookup(path, fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %path.display(), "digest cache hit");
            return Ok(digest);
        }

        let gate = self.gate(path);
        let result = {
            let _held = gate.lock();
            match self.lookup(path, fingerprint) {
                Some(digest) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(digest)
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    self.compute(path, fingerprint)
                }
            }
        };
        self.release_gate(path, gate);
        result
    }

    /// Digest a located artifact and attach the result.
    pub fn attest(&self, located: LocatedArtifact) -> Result<ArtifactRecord, UpdateError> {
        let digest = self.get_or_compute(&located.path, located.fingerprint)?;
        Ok(located.attest(digest))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, path: &Path, fingerprint: Fingerprint) -> Option<Sha512Digest> {
        self.entries
            .lock()
            .get(path)
            .filter(|entry| entry.fingerprint == fingerprint)
            .map(|entry| entry.digest.clone())
    }

    fn compute(&self, path: &Path, fingerprint: Fingerprint) -> Result<Sha512Digest, UpdateError> {
        let limit = self.budget.map(|b| b.for_size(fingerprint.size));
        let started = Instant::now();

        let digest = sha512_file(path, limit).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "digest computation failed");
            e
        })?;
        self.computations.fetch_add(1, Ordering::Relaxed);

        match Fingerprint::of(path) {
            Ok(after) if after == fingerprint => {
                self.entries.lock().insert(
                    path.to_path_buf(),
                    CacheEntry {
                        fingerprint,
                        digest: digest.clone(),
                    },
                );
            }
            Ok(_) => {
                tracing::warn!(
                    path = %path.display(),
                    "artifact changed while hashing; digest not cached"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "artifact vanished after hashing; digest not cached"
                );
            }
        }

        tracing::info!(
            path = %path.display(),
            size = fingerprint.size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed sha512 digest"
        );
        Ok(digest)
    }

    fn gate(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(
            self.in_flight
                .lock()
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // Gates are only cloned under the `in_flight` lock, so a count of two
    // (map + caller) means nobody else is waiting.
    fn release_gate(&self, path: &Path, gate: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        if Arc::strong_count(&gate) <= 2 {
            in_flight.remove(path);
        }
    }
}
