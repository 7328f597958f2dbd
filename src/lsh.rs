//! Near-duplicate index for SimHash fingerprints.
//!
//! Bucketing follows Manku et al. (2007), "Detecting near-duplicates for web crawling": the
//! `F` bits are cut into `K + 1` contiguous ranges, and every fingerprint is filed under one key
//! per range. Two fingerprints within Hamming distance `K` differ in at most `K` ranges, so by
//! pigeonhole they agree on at least one range and share that bucket. Bucket hits are then
//! re-checked with the exact distance, which removes the false positives.

use std::collections::{HashMap, HashSet};

use crate::simhash::{is_valid_width, Fingerprint, DEFAULT_WIDTH_BITS};

/// Default tolerance: fingerprints at distance `<= 2` are near-duplicates.
pub const DEFAULT_TOLERANCE: usize = 2;

/// Errors for fingerprints and indexes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter is out of range or inconsistent.
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    /// Two fingerprints of different widths were compared.
    #[error("dimension mismatch (expected {expected}, got {got})")]
    DimensionMismatch {
        /// Width of the receiver.
        expected: usize,
        /// Width of the argument.
        got: usize,
    },
    /// A fingerprint could not be reconstructed from its external form.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

/// Index parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Width of admitted fingerprints, in bits.
    pub width_bits: usize,
    /// Largest Hamming distance still reported as a near-duplicate (`K`).
    pub tolerance: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            width_bits: DEFAULT_WIDTH_BITS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl IndexConfig {
    /// Set the fingerprint width.
    pub fn with_width_bits(mut self, width_bits: usize) -> Self {
        self.width_bits = width_bits;
        self
    }

    /// Set the tolerance `K`.
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// An object id paired with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Caller-assigned id. Not required to be unique.
    pub object_id: String,
    /// Fingerprint of the object.
    pub fingerprint: Fingerprint,
}

impl IndexEntry {
    /// Pair `object_id` with `fingerprint`.
    pub fn new(object_id: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            object_id: object_id.into(),
            fingerprint,
        }
    }

    /// `"{hex(value)},{object_id}"`: identity of the entry inside a bucket.
    pub fn serialized(&self) -> String {
        format!("{},{}", self.fingerprint.to_hex(), self.object_id)
    }
}

/// Bucketed index answering "which ids are within distance `K` of this fingerprint".
///
/// # Width policy
///
/// Entries and queries whose width differs from the index width are ignored: `add` and
/// `delete` do nothing and return `false`, `get_near_dups` returns nothing. This keeps the
/// index usable with heterogeneous input. It is deliberately more lenient than
/// [`Fingerprint::distance`], which reports a width mismatch as an error.
///
/// # Concurrency
///
/// No internal locking. Queries take `&self`, so an `RwLock<NearDupIndex>` gives concurrent
/// readers with exclusive writers.
#[derive(Debug, Clone)]
pub struct NearDupIndex {
    width_bits: usize,
    tolerance: usize,
    offsets: Vec<usize>,
    buckets: HashMap<String, HashMap<String, IndexEntry>>,
}

impl NearDupIndex {
    /// Create an empty index.
    ///
    /// An invalid width falls back to 64 bits with a warning. A tolerance whose `K + 1`
    /// partitions would not each get at least one bit is rejected.
    pub fn new(config: IndexConfig) -> Result<Self, Error> {
        let mut width_bits = config.width_bits;
        if !is_valid_width(width_bits) {
            log::warn!(
                "index width must be a positive multiple of 8, got {width_bits}; using {DEFAULT_WIDTH_BITS}"
            );
            width_bits = DEFAULT_WIDTH_BITS;
        }
        let partitions = config
            .tolerance
            .checked_add(1)
            .ok_or(Error::InvalidParam("tolerance overflow"))?;
        if partitions > width_bits {
            return Err(Error::InvalidParam(
                "tolerance + 1 must not exceed the fingerprint width",
            ));
        }
        let chunk = width_bits / partitions;
        Ok(Self {
            width_bits,
            tolerance: config.tolerance,
            offsets: (0..partitions).map(|j| chunk * j).collect(),
            buckets: HashMap::new(),
        })
    }

    /// Create an index and add every entry (mismatched widths are skipped).
    pub fn with_entries<I>(config: IndexConfig, entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = IndexEntry>,
    {
        let mut index = Self::new(config)?;
        for entry in entries {
            index.add(&entry);
        }
        Ok(index)
    }

    /// Width of admitted fingerprints.
    pub fn width_bits(&self) -> usize {
        self.width_bits
    }

    /// Tolerance `K`.
    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Start bit (LSB-relative) of each of the `K + 1` partitions.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// The `K + 1` bucket keys of `fp`: `"{hex(bits in range j)}:{hex(j)}"`.
    ///
    /// The last range absorbs the remainder of `width / (K + 1)`.
    pub fn keys(&self, fp: &Fingerprint) -> Vec<String> {
        self.offsets
            .iter()
            .enumerate()
            .map(|(j, &offset)| {
                let end = self.offsets.get(j + 1).copied().unwrap_or(self.width_bits);
                format!("{}:{:x}", fp.bit_range_hex(offset, end - offset), j)
            })
            .collect()
    }

    /// File `entry` under its `K + 1` buckets.
    ///
    /// Returns `true` if the entry was newly added; `false` if it was already present or its
    /// width does not match.
    pub fn add(&mut self, entry: &IndexEntry) -> bool {
        if !self.admits(&entry.fingerprint) {
            return false;
        }
        let serialized = entry.serialized();
        let mut added = false;
        for key in self.keys(&entry.fingerprint) {
            added |= self
                .buckets
                .entry(key)
                .or_default()
                .insert(serialized.clone(), entry.clone())
                .is_none();
        }
        added
    }

    /// Remove `entry` from its buckets, dropping buckets that become empty.
    ///
    /// Returns `true` if the entry was present.
    pub fn delete(&mut self, entry: &IndexEntry) -> bool {
        if !self.admits(&entry.fingerprint) {
            return false;
        }
        let serialized = entry.serialized();
        let mut removed = false;
        for key in self.keys(&entry.fingerprint) {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                removed |= bucket.remove(&serialized).is_some();
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
        removed
    }

    /// Whether `entry` is currently indexed.
    pub fn contains(&self, entry: &IndexEntry) -> bool {
        if entry.fingerprint.width() != self.width_bits {
            return false;
        }
        let serialized = entry.serialized();
        self.keys(&entry.fingerprint)
            .first()
            .and_then(|key| self.buckets.get(key))
            .is_some_and(|bucket| bucket.contains_key(&serialized))
    }

    /// Ids of entries within distance `K` of `query`, each reported once, in no particular order.
    pub fn get_near_dups(&self, query: &Fingerprint) -> Vec<String> {
        let mut ids: HashSet<&str> = HashSet::new();
        for entry in self.candidates(query) {
            if self.within_tolerance(query, &entry.fingerprint).is_some() {
                ids.insert(entry.object_id.as_str());
            }
        }
        ids.into_iter().map(str::to_string).collect()
    }

    /// Like [`Self::get_near_dups`], with the smallest distance per id, sorted by distance then id.
    pub fn get_near_dups_with_distance(&self, query: &Fingerprint) -> Vec<(String, u32)> {
        let mut best: HashMap<&str, u32> = HashMap::new();
        for entry in self.candidates(query) {
            if let Some(d) = self.within_tolerance(query, &entry.fingerprint) {
                best.entry(entry.object_id.as_str())
                    .and_modify(|cur| *cur = (*cur).min(d))
                    .or_insert(d);
            }
        }
        let mut results: Vec<(String, u32)> =
            best.into_iter().map(|(id, d)| (id.to_string(), d)).collect();
        results.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        results
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn admits(&self, fp: &Fingerprint) -> bool {
        if fp.width() != self.width_bits {
            log::debug!(
                "ignoring {}-bit fingerprint in {}-bit index",
                fp.width(),
                self.width_bits
            );
            return false;
        }
        true
    }

    /// Entries sharing at least one bucket with `query` (may repeat across buckets).
    fn candidates<'a>(&'a self, query: &Fingerprint) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        let keys = if self.admits(query) {
            self.keys(query)
        } else {
            Vec::new()
        };
        keys.into_iter()
            .filter_map(move |key| self.buckets.get(&key))
            .flat_map(|bucket| bucket.values())
    }

    fn within_tolerance(&self, query: &Fingerprint, fp: &Fingerprint) -> Option<u32> {
        query
            .distance(fp)
            .ok()
            .filter(|&d| (d as usize) <= self.tolerance)
    }
}
