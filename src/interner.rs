//! Weak key interning
//!
//! Guarantees one canonical `FragmentKey` per `(options, fragment type)` pair
//! for as long as anything outside the interner holds that key. The interner
//! itself only keeps `Weak` handles, so a key nobody references is reclaimed
//! and a later request simply registers a fresh instance.
//!
//! Entries live in a fixed number of shards, each a `parking_lot::RwLock`
//! around a map from structural hash to a small bucket of weak handles.
//! Lookups of keys that are already interned only take the read lock, so they
//! never wait on each other. A miss takes the write lock and re-checks before
//! inserting, so two racing callers with equal candidates always come away
//! with the same instance.
//!
//! Handles to reclaimed keys are swept from a shard whenever its bucket count
//! reaches twice what survived the previous sweep (never below
//! `SWEEP_FLOOR`), which keeps each shard proportional to its live keys
//! without a caller having to run `purge()`.

use crate::key::{FragmentKey, KeyData};
use crate::options::{BuildOptions, OptionSet};
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Default number of shards
pub const DEFAULT_SHARDS: usize = 16;

/// Smallest bucket count at which a shard sweeps stale handles
pub const SWEEP_FLOOR: usize = 64;

type Bucket<O> = Vec<Weak<KeyData<O>>>;

struct Shard<O> {
    entries: HashMap<u64, Bucket<O>>,
    sweep_at: usize,
}

impl<O: OptionSet> Shard<O> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: SWEEP_FLOOR,
        }
    }

    fn find(&self, hash: u64, target: &KeyData<O>) -> Option<Arc<KeyData<O>>> {
        self.entries
            .get(&hash)?
            .iter()
            .filter_map(Weak::upgrade)
            .find(|data| data.same_identity(target))
    }

    /// Remove stale handles and empty buckets, returning the handles removed
    fn sweep(&mut self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|weak| weak.strong_count() > 0);
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        self.sweep_at = (self.entries.len() * 2).max(SWEEP_FLOOR);
        removed
    }
}

/// Interner statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternerStats {
    /// Keys currently reachable from outside the interner
    pub live: usize,
    /// Hash buckets held across all shards (including stale ones)
    pub buckets: usize,
    pub shards: usize,
    /// `intern` calls answered with an existing instance
    pub hits: u64,
    /// `intern` calls that registered their candidate
    pub misses: u64,
}

/// Concurrent registry of canonical fragment keys
pub struct KeyInterner<O: OptionSet = BuildOptions> {
    shards: Box<[RwLock<Shard<O>>]>,
    hasher: RandomState,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<O: OptionSet> KeyInterner<O> {
    /// Create an interner with `shards` lock shards (at least one)
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| RwLock::new(Shard::new())).collect(),
            hasher: RandomState::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the canonical instance equal to `candidate`.
    ///
    /// If an equal key is live, `candidate` is dropped and the existing
    /// instance returned; otherwise `candidate` becomes canonical.
    pub fn intern(&self, candidate: FragmentKey<O>) -> FragmentKey<O> {
        let hash = self.hasher.hash_one(&candidate);
        let lock = self.shard(hash);

        if let Some(data) = lock.read().find(hash, &candidate.data) {
            return self.hit(&candidate, data);
        }

        let mut shard = lock.write();
        if let Some(data) = shard.find(hash, &candidate.data) {
            return self.hit(&candidate, data);
        }

        let bucket = shard.entries.entry(hash).or_default();
        bucket.retain(|weak| weak.strong_count() > 0);
        bucket.push(Arc::downgrade(&candidate.data));
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("Interned new {}", candidate);

        if shard.entries.len() >= shard.sweep_at {
            let removed = shard.sweep();
            trace!("Swept {} reclaimed keys from shard", removed);
        }
        candidate
    }

    /// Look up the canonical instance equal to `key` without registering it
    pub fn get(&self, key: &FragmentKey<O>) -> Option<FragmentKey<O>> {
        let hash = self.hasher.hash_one(key);
        self.shard(hash)
            .read()
            .find(hash, &key.data)
            .map(|data| FragmentKey { data })
    }

    /// Drop handles to reclaimed keys and empty buckets.
    ///
    /// Returns the number of stale handles removed.
    pub fn purge(&self) -> usize {
        let removed: usize = self.shards.iter().map(|shard| shard.write().sweep()).sum();

        if removed > 0 {
            debug!("Purged {} reclaimed fragment keys", removed);
        }
        removed
    }

    /// Number of live canonical keys
    pub fn len(&self) -> usize {
        self.stats().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> InternerStats {
        let mut live = 0;
        let mut buckets = 0;
        for shard in self.shards.iter() {
            let shard = shard.read();
            buckets += shard.entries.len();
            live += shard
                .entries
                .values()
                .flatten()
                .filter(|weak| weak.strong_count() > 0)
                .count();
        }

        InternerStats {
            live,
            buckets,
            shards: self.shards.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn hit(&self, candidate: &FragmentKey<O>, data: Arc<KeyData<O>>) -> FragmentKey<O> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!("Interner hit for {}", candidate);
        FragmentKey { data }
    }

    fn shard(&self, hash: u64) -> &RwLock<Shard<O>> {
        &self.shards[(hash % self.shards.len() as u64) as usize]
    }
}

impl<O: OptionSet> Default for KeyInterner<O> {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}
