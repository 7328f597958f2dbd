//! SimHash: binary fingerprints for fast near-duplicate detection.
//!
//! SimHash (Charikar, 2002) maps weighted feature sets to a fixed-width bitstring such that
//! similar inputs have small Hamming distance. Each feature is digested, its digest is read as
//! a bit vector (most-significant bit first), and output bit `i` is set when the weighted count
//! of features with bit `i` set is a strict majority of the total weight.
//!
//! Per-bit counts are accumulated in bounded batches (see [`SimHashConfig`]) so that neither
//! the pending work nor any single counter grows with the number of repeated features.
//! Counters are `u128`: a sum of `u64` weights over at most `usize::MAX` features cannot
//! overflow them, so any weight is accepted.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::blocking::{feature_counts, Tokenizer};
use crate::digest::{DigestAdapter, Digester, Md5Digester};
use crate::lsh::Error;
use crate::parallel;

/// Default fingerprint width in bits.
pub const DEFAULT_WIDTH_BITS: usize = 64;
/// Default weight above which a feature is scaled directly instead of being batched.
pub const DEFAULT_LARGE_WEIGHT_CUTOFF: u64 = 50;
/// Default number of pending hashes (and partial sums) folded at once.
pub const DEFAULT_BATCH_SIZE: usize = 200;

pub(crate) fn is_valid_width(width_bits: usize) -> bool {
    width_bits > 0 && width_bits % 8 == 0
}

/// A fixed-width SimHash fingerprint.
///
/// Stored as `width / 8` big-endian bytes, so any width that is a positive multiple of 8 is
/// supported. Equality and hashing take the width into account: two fingerprints of different
/// widths are never equal, even when their integer values coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    width: usize,
    bytes: Box<[u8]>,
}

impl Fingerprint {
    /// The all-zero fingerprint of `width` bits.
    pub fn zero(width: usize) -> Result<Self, Error> {
        if !is_valid_width(width) {
            return Err(Error::InvalidParam("width must be a positive multiple of 8"));
        }
        Ok(Self {
            width,
            bytes: vec![0u8; width / 8].into_boxed_slice(),
        })
    }

    /// Build from a `u64`. Fails if the value does not fit in `width` bits.
    pub fn from_u64(value: u64, width: usize) -> Result<Self, Error> {
        Self::from_u128(value as u128, width)
    }

    /// Build from a `u128`. Fails if the value does not fit in `width` bits.
    pub fn from_u128(value: u128, width: usize) -> Result<Self, Error> {
        let mut fp = Self::zero(width)?;
        if width < 128 && value >> width != 0 {
            return Err(Error::InvalidFingerprint(format!(
                "{value:#x} does not fit in {width} bits"
            )));
        }
        let be = value.to_be_bytes();
        let n = fp.bytes.len().min(be.len());
        let dst = fp.bytes.len() - n;
        fp.bytes[dst..].copy_from_slice(&be[be.len() - n..]);
        Ok(fp)
    }

    /// Unpack from big-endian bytes; the width is `8 * bytes.len()`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::InvalidFingerprint("empty byte sequence".to_string()));
        }
        Ok(Self {
            width: bytes.len() * 8,
            bytes: bytes.into(),
        })
    }

    /// Parse a hexadecimal value (as produced by [`Self::to_hex`]) into a `width`-bit fingerprint.
    pub fn from_hex(s: &str, width: usize) -> Result<Self, Error> {
        let mut fp = Self::zero(width)?;
        let digits = s.trim_start_matches('0');
        if digits.is_empty() {
            if s.is_empty() {
                return Err(Error::InvalidFingerprint("empty hex string".to_string()));
            }
            return Ok(fp);
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let decoded = hex::decode(&padded)
            .map_err(|e| Error::InvalidFingerprint(format!("{s:?}: {e}")))?;
        if decoded.len() > fp.bytes.len() {
            return Err(Error::InvalidFingerprint(format!(
                "{s:?} does not fit in {width} bits"
            )));
        }
        let dst = fp.bytes.len() - decoded.len();
        fp.bytes[dst..].copy_from_slice(&decoded);
        Ok(fp)
    }

    /// Width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Big-endian bytes, exactly `width / 8` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pack into an owned big-endian byte vector of length `width / 8`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// The value as a `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// The value as a `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        let split = self.bytes.len().saturating_sub(16);
        let (high, low) = self.bytes.split_at(split);
        if high.iter().any(|&b| b != 0) {
            return None;
        }
        Some(low.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128))
    }

    /// Minimal lowercase hex of the value (no leading zeros, `"0"` for zero).
    pub fn to_hex(&self) -> String {
        minimal_hex(&self.bytes)
    }

    /// Bit `i`, counted from the least-significant end.
    ///
    /// # Panics
    ///
    /// Panics if `i >= width`.
    pub fn bit(&self, i: usize) -> bool {
        assert!(i < self.width, "bit index {i} out of range for width {}", self.width);
        let byte = self.bytes[self.bytes.len() - 1 - i / 8];
        (byte >> (i % 8)) & 1 == 1
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    /// Hamming distance (XOR + popcount).
    pub fn distance(&self, other: &Self) -> Result<u32, Error> {
        self.check_width(other)?;
        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }

    /// `1 - distance / width`, in `[0, 1]`.
    pub fn similarity(&self, other: &Self) -> Result<f64, Error> {
        let d = self.distance(other)?;
        Ok(1.0 - d as f64 / self.width as f64)
    }

    /// Value equality that refuses to compare across widths.
    ///
    /// `==` simply reports `false` for mismatched widths; this variant makes the mismatch an error.
    pub fn try_eq(&self, other: &Self) -> Result<bool, Error> {
        self.check_width(other)?;
        Ok(self.bytes == other.bytes)
    }

    /// Minimal hex of bits `offset .. offset + len` (LSB-relative), right-aligned.
    pub(crate) fn bit_range_hex(&self, offset: usize, len: usize) -> String {
        let n = len.div_ceil(8).max(1);
        let mut out = vec![0u8; n];
        for k in 0..len {
            if self.bit(offset + k) {
                out[n - 1 - k / 8] |= 1 << (k % 8);
            }
        }
        minimal_hex(&out)
    }

    fn check_width(&self, other: &Self) -> Result<(), Error> {
        if self.width != other.width {
            return Err(Error::DimensionMismatch {
                expected: self.width,
                got: other.width,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Fingerprint {
    /// Zero-padded hex, `width / 4` digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.bytes))
    }
}

fn minimal_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    let trimmed = full.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builder parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimHashConfig {
    /// Fingerprint width in bits. Must be a positive multiple of 8.
    pub width_bits: usize,
    /// Features heavier than this skip the batch and are scaled directly.
    pub large_weight_cutoff: u64,
    /// Pending-hash count (and partial-sum count) that triggers a fold.
    pub batch_size: usize,
}

impl Default for SimHashConfig {
    fn default() -> Self {
        Self {
            width_bits: DEFAULT_WIDTH_BITS,
            large_weight_cutoff: DEFAULT_LARGE_WEIGHT_CUTOFF,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SimHashConfig {
    /// Set the fingerprint width.
    pub fn with_width_bits(mut self, width_bits: usize) -> Self {
        self.width_bits = width_bits;
        self
    }

    /// Set the large-weight cutoff.
    pub fn with_large_weight_cutoff(mut self, cutoff: u64) -> Self {
        self.large_weight_cutoff = cutoff;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Replace invalid values with defaults, logging each correction.
    pub fn validated(mut self) -> Self {
        if !is_valid_width(self.width_bits) {
            log::warn!(
                "fingerprint width must be a positive multiple of 8, got {}; using {}",
                self.width_bits,
                DEFAULT_WIDTH_BITS
            );
            self.width_bits = DEFAULT_WIDTH_BITS;
        }
        if self.batch_size == 0 {
            log::warn!("batch size must be >= 1; using {DEFAULT_BATCH_SIZE}");
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        self
    }
}

/// SimHash fingerprint builder.
///
/// Holds its configuration and digest primitive; building is `&self` and deterministic, so one
/// builder can be shared across threads.
#[derive(Debug, Clone)]
pub struct SimHash {
    config: SimHashConfig,
    adapter: DigestAdapter,
}

impl Default for SimHash {
    fn default() -> Self {
        Self::new(SimHashConfig::default())
    }
}

impl SimHash {
    /// Create a builder that digests features with MD5.
    pub fn new(config: SimHashConfig) -> Self {
        Self::with_digester(config, Arc::new(Md5Digester))
    }

    /// Create a builder with a custom digest primitive.
    pub fn with_digester(config: SimHashConfig, digester: Arc<dyn Digester>) -> Self {
        let config = config.validated();
        let adapter = DigestAdapter::new(digester, config.width_bits / 8);
        Self { config, adapter }
    }

    /// Effective (validated) configuration.
    pub fn config(&self) -> &SimHashConfig {
        &self.config
    }

    /// Fingerprint width in bits.
    pub fn width_bits(&self) -> usize {
        self.config.width_bits
    }

    /// Fingerprint a weighted feature mapping.
    ///
    /// Iteration order does not matter. A key that appears more than once contributes the sum
    /// of its weights. Weights are expected to be `>= 1`; a weight of 0 contributes nothing.
    /// Any `u64` weight is accepted, up to and including `u64::MAX`.
    pub fn build_features<I, S>(&self, features: I) -> Fingerprint
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut sums = BitSums::new(&self.config);
        for (feature, weight) in features {
            let hash = self.adapter.feature_bytes(feature.as_ref().as_bytes());
            sums.push(hash, weight);
        }
        let (combined, total_weight) = sums.finish();
        self.threshold(&combined, total_weight)
    }

    /// Fingerprint an unweighted feature list. Repeated tokens count once.
    pub fn build_tokens<I, S>(&self, tokens: I) -> Fingerprint
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: HashSet<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect();
        self.build_features(unique.into_iter().map(|t| (t, 1)))
    }

    /// Tokenize `text`, weight each token by its occurrence count, and fingerprint the result.
    pub fn build_text(&self, text: &str, tokenizer: &dyn Tokenizer) -> Fingerprint {
        self.build_features(feature_counts(tokenizer.tokenize(text)))
    }

    /// Same result as [`Self::build_features`], with per-feature work spread over `workers`
    /// threads. `None` uses the available parallelism; an explicit count is capped by it.
    pub fn build_features_parallel(
        &self,
        features: &HashMap<String, u64>,
        workers: Option<usize>,
    ) -> Fingerprint {
        let items: Vec<(&str, u64)> = features.iter().map(|(k, &w)| (k.as_str(), w)).collect();
        let (combined, total_weight) =
            parallel::weighted_bit_sums(&self.adapter, &self.config, &items, workers);
        self.threshold(&combined, total_weight)
    }

    /// Majority vote: bit `i` is set iff `combined[i] > total_weight / 2`.
    fn threshold(&self, combined: &[u128], total_weight: u128) -> Fingerprint {
        let half = total_weight / 2;
        let mut bytes = vec![0u8; self.config.width_bits / 8];
        for (i, &count) in combined.iter().enumerate() {
            if count > half {
                bytes[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Fingerprint {
            width: self.config.width_bits,
            bytes: bytes.into_boxed_slice(),
        }
    }
}

/// Add `weight` to `acc[i]` for every set bit `i` of `hash` (MSB-first).
pub(crate) fn add_bits(acc: &mut [u128], hash: &[u8], weight: u64) {
    for (j, &byte) in hash.iter().enumerate() {
        for k in 0..8 {
            if (byte >> (7 - k)) & 1 == 1 {
                acc[j * 8 + k] += u128::from(weight);
            }
        }
    }
}

fn sum_rows(rows: &[Vec<u128>], width: usize) -> Vec<u128> {
    let mut total = vec![0u128; width];
    for row in rows {
        for (t, v) in total.iter_mut().zip(row) {
            *t += v;
        }
    }
    total
}

/// Batched per-bit accumulator.
///
/// Light features are queued as `(hash, copies)` runs until `batch_size` copies are pending,
/// then folded into one partial-sum vector. Heavy features become a partial sum immediately.
/// Once `batch_size` partial sums exist they are collapsed into one.
pub(crate) struct BitSums {
    width: usize,
    large_weight_cutoff: u64,
    batch_size: usize,
    sums: Vec<Vec<u128>>,
    batch: Vec<(Vec<u8>, u64)>,
    pending: u128,
    total_weight: u128,
}

impl BitSums {
    pub(crate) fn new(config: &SimHashConfig) -> Self {
        Self {
            width: config.width_bits,
            large_weight_cutoff: config.large_weight_cutoff,
            batch_size: config.batch_size,
            sums: Vec::new(),
            batch: Vec::new(),
            pending: 0,
            total_weight: 0,
        }
    }

    pub(crate) fn push(&mut self, hash: Vec<u8>, weight: u64) {
        self.total_weight += u128::from(weight);
        if weight > self.large_weight_cutoff {
            let mut scaled = vec![0u128; self.width];
            add_bits(&mut scaled, &hash, weight);
            self.sums.push(scaled);
        } else if weight > 0 {
            self.batch.push((hash, weight));
            self.pending += u128::from(weight);
            if self.pending >= self.batch_size as u128 {
                self.fold_batch();
            }
        }
        if self.sums.len() >= self.batch_size {
            log::debug!("collapsing {} partial sums", self.sums.len());
            let total = sum_rows(&self.sums, self.width);
            self.sums = vec![total];
        }
    }

    fn fold_batch(&mut self) {
        let mut summed = vec![0u128; self.width];
        for (hash, copies) in self.batch.drain(..) {
            add_bits(&mut summed, &hash, copies);
        }
        self.pending = 0;
        self.sums.push(summed);
    }

    /// Flush pending hashes and return `(combined, total_weight)`.
    pub(crate) fn finish(mut self) -> (Vec<u128>, u128) {
        if self.pending > 0 {
            self.fold_batch();
        }
        (sum_rows(&self.sums, self.width), self.total_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::ShingleTokenizer;

    #[test]
    fn matches_reference_fixture() {
        let sh = SimHash::default();
        let fp = sh.build_features([("aaa", 1), ("bbb", 1)]);
        assert_eq!(fp.to_u64(), Some(57087923692560392));
        assert_eq!(fp.width(), 64);
    }

    #[test]
    fn unweighted_tokens_match_weight_one() {
        let sh = SimHash::default();
        assert_eq!(
            sh.build_tokens(["aaa", "bbb", "aaa"]),
            sh.build_features([("aaa", 1), ("bbb", 1)])
        );
    }

    #[test]
    fn empty_features_give_zero() {
        let sh = SimHash::default();
        let fp = sh.build_features(Vec::<(String, u64)>::new());
        assert_eq!(fp, Fingerprint::zero(64).unwrap());
    }

    #[test]
    fn invalid_width_falls_back_to_default() {
        for bad in [0, 7, 63] {
            let sh = SimHash::new(SimHashConfig::default().with_width_bits(bad));
            assert_eq!(sh.width_bits(), 64);
            assert_eq!(sh.build_features([("a", 1)]).width(), 64);
        }
    }

    #[test]
    fn exactly_half_does_not_set_bit() {
        // Two features with complementary hashes: every bit is set by exactly half the weight.
        let digester = Arc::new(|data: &[u8]| {
            if data == b"x" {
                vec![0xffu8; 8]
            } else {
                vec![0x00u8; 8]
            }
        });
        let sh = SimHash::with_digester(SimHashConfig::default(), digester);
        let fp = sh.build_features([("x", 3), ("y", 3)]);
        assert_eq!(fp.to_u64(), Some(0));

        // One more vote tips every bit.
        let fp = sh.build_features([("x", 4), ("y", 3)]);
        assert_eq!(fp.to_u64(), Some(u64::MAX));
    }

    #[test]
    fn large_weight_path_matches_batched_path() {
        let sh = SimHash::default();
        let features = [("heavy", 120u64), ("light", 30), ("other", 45)];
        let direct = sh.build_features(features);
        let no_skip = SimHash::new(SimHashConfig::default().with_large_weight_cutoff(u64::MAX));
        assert_eq!(direct, no_skip.build_features(features));
        let tiny_batches = SimHash::new(SimHashConfig::default().with_batch_size(3));
        assert_eq!(direct, tiny_batches.build_features(features));
    }

    #[test]
    fn large_weight_path_matches_batched_path_with_known_bits() {
        // Per-bit votes for a=60 (0xf0), b=30 (0x3c), c=45 (0xaa) against half of 135:
        // bits 0, 2, 3, 4 of each byte pass, giving 0xb8.
        let digester = Arc::new(|data: &[u8]| -> Vec<u8> {
            let byte = if data == b"a" {
                0xf0u8
            } else if data == b"b" {
                0x3c
            } else {
                0xaa
            };
            vec![byte; 8]
        });
        let features = [("a", 60u64), ("b", 30), ("c", 45)];
        let expected = Some(0xb8b8_b8b8_b8b8_b8b8u64);

        let direct = SimHash::with_digester(SimHashConfig::default(), digester.clone());
        assert_eq!(direct.build_features(features).to_u64(), expected);
        for config in [
            SimHashConfig::default().with_large_weight_cutoff(u64::MAX),
            SimHashConfig::default().with_batch_size(1),
            SimHashConfig::default().with_batch_size(3).with_large_weight_cutoff(0),
        ] {
            let sh = SimHash::with_digester(config, digester.clone());
            assert_eq!(sh.build_features(features).to_u64(), expected);
        }
    }

    #[test]
    fn weights_near_u64_max_do_not_overflow() {
        let digester = Arc::new(|data: &[u8]| -> Vec<u8> {
            if data == b"a" {
                vec![0xffu8; 8]
            } else {
                vec![0x00u8; 8]
            }
        });
        let half = u64::MAX / 2 + 1;
        for config in [
            SimHashConfig::default(),
            SimHashConfig::default().with_large_weight_cutoff(u64::MAX),
        ] {
            let sh = SimHash::with_digester(config, digester.clone());
            // Exactly half of 2^64 on every bit: a tie.
            assert_eq!(sh.build_features([("a", half), ("b", half)]).to_u64(), Some(0));
            assert_eq!(
                sh.build_features([("a", u64::MAX), ("b", u64::MAX / 2)]).to_u64(),
                Some(u64::MAX)
            );
            let many: Vec<(String, u64)> = (0..10).map(|i| (format!("b{i}"), u64::MAX)).collect();
            assert_eq!(sh.build_features(many).to_u64(), Some(0));
        }

        let md5 = SimHash::default();
        let heavy = [("aaa", u64::MAX), ("bbb", u64::MAX)];
        assert_eq!(md5.build_features(heavy), md5.build_features([("aaa", 1), ("bbb", 1)]));
    }

    #[test]
    fn partial_sums_collapse_without_changing_result() {
        let features: Vec<(String, u64)> = (0..500).map(|i| (i.to_string(), 1)).collect();
        let a = SimHash::default().build_features(features.iter().cloned());
        let b = SimHash::new(SimHashConfig::default().with_batch_size(2))
            .build_features(features.iter().cloned());
        assert_eq!(a, b);
        assert_ne!(a.to_u64(), Some(0));
    }

    #[test]
    fn wide_fingerprint_uses_whole_digest() {
        let sh = SimHash::new(SimHashConfig::default().with_width_bits(128));
        let fp = sh.build_features([("aaa", 1), ("bbb", 1)]);
        assert_eq!(fp.width(), 128);
        assert_eq!(fp.to_hex(), "b8e0060c40010000cad12a04a8e008");
        assert!(!sh.adapter.is_padded());

        // MD5 cannot fill 256 bits: the top half stays 0.
        let wide = SimHash::new(SimHashConfig::default().with_width_bits(256));
        assert!(wide.adapter.is_padded());
        let fp = wide.build_features([("aaa", 1), ("bbb", 1)]);
        assert!(fp.as_bytes()[..16].iter().all(|&b| b == 0));
    }

    #[test]
    fn text_build_is_stable_and_discriminating() {
        let sh = SimHash::default();
        let tok = ShingleTokenizer::default();
        let a = sh.build_text("My name is John", &tok);
        let b = sh.build_text("My name is John", &tok);
        let c = sh.build_text("My name actually is Jane", &tok);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_u64(), Some(13179842956922262407));
    }

    #[test]
    fn short_texts_are_distinct() {
        let sh = SimHash::default();
        let tok = ShingleTokenizer::default();
        let texts = ["aa", "aaa", "aaaa", "aaaab", "aaaaabb", "aaaaabbb"];
        let fps: Vec<_> = texts.iter().map(|t| sh.build_text(t, &tok)).collect();
        for i in 0..fps.len() {
            for j in 0..fps.len() {
                if i != j {
                    assert_ne!(fps[i], fps[j], "{} vs {}", texts[i], texts[j]);
                }
            }
        }
    }

    #[test]
    fn distance_and_similarity() {
        let a = Fingerprint::from_u64(0b1011, 64).unwrap();
        let b = Fingerprint::from_u64(0b0110, 64).unwrap();
        assert_eq!(a.distance(&b).unwrap(), 3);
        assert_eq!(b.distance(&a).unwrap(), 3);
        assert_eq!(a.distance(&a).unwrap(), 0);
        assert!((a.similarity(&b).unwrap() - (1.0 - 3.0 / 64.0)).abs() < 1e-12);
        assert!(a.try_eq(&a.clone()).unwrap());
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let a = Fingerprint::from_u64(5, 64).unwrap();
        let b = Fingerprint::from_u64(5, 128).unwrap();
        assert!(matches!(
            a.distance(&b),
            Err(Error::DimensionMismatch {
                expected: 64,
                got: 128
            })
        ));
        assert!(a.similarity(&b).is_err());
        assert!(a.try_eq(&b).is_err());
        assert_ne!(a, b);
    }

    #[test]
    fn pack_unpack_and_hex() {
        let fp = Fingerprint::from_u64(4390059585430954713, 64).unwrap();
        let bytes = fp.to_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes, 4390059585430954713u64.to_be_bytes().to_vec());
        assert_eq!(Fingerprint::from_bytes(&bytes).unwrap(), fp);
        assert_eq!(Fingerprint::from_hex(&fp.to_hex(), 64).unwrap(), fp);

        let top = Fingerprint::from_u64(1 << 63, 64).unwrap();
        assert_eq!(top.to_hex(), "8000000000000000");
        assert_eq!(Fingerprint::zero(64).unwrap().to_hex(), "0");
        assert_eq!(Fingerprint::from_u64(0xabc, 16).unwrap().to_string(), "0abc");
    }

    #[test]
    fn rejects_values_that_do_not_fit() {
        assert!(Fingerprint::from_u64(256, 8).is_err());
        assert!(Fingerprint::from_hex("1ff", 8).is_err());
        assert!(Fingerprint::from_hex("zz", 8).is_err());
        assert!(Fingerprint::from_hex("", 8).is_err());
        assert!(Fingerprint::from_bytes(&[]).is_err());
        assert!(Fingerprint::zero(12).is_err());
        assert_eq!(Fingerprint::from_hex("000", 8).unwrap().to_u64(), Some(0));
    }

    #[test]
    fn bits_are_lsb_indexed() {
        let fp = Fingerprint::from_u64(0b101, 16).unwrap();
        assert!(fp.bit(0));
        assert!(!fp.bit(1));
        assert!(fp.bit(2));
        assert!(!fp.bit(15));
        assert_eq!(fp.count_ones(), 2);
        assert_eq!(fp.bit_range_hex(0, 3), "5");
        assert_eq!(fp.bit_range_hex(1, 2), "2");
        assert_eq!(fp.bit_range_hex(8, 8), "0");
    }
}
