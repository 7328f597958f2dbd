//! Per-feature digest primitives.
//!
//! The builder hashes every feature through a [`Digester`] and keeps exactly
//! `width / 8` bytes of the result (see [`DigestAdapter`]). MD5 is the default
//! primitive; any deterministic `Fn(&[u8]) -> Vec<u8>` can stand in for it.

use std::fmt;
use std::sync::Arc;

use md5::{Digest, Md5};
use sha2::Sha256;

/// A deterministic byte-to-byte hash primitive.
pub trait Digester: Send + Sync {
    /// Hash `data`. Must return the same bytes for the same input.
    fn digest(&self, data: &[u8]) -> Vec<u8>;
}

impl<F> Digester for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        self(data)
    }
}

/// MD5 (16 bytes). The default digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digester;

impl Digester for Md5Digester {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Md5::digest(data).to_vec()
    }
}

/// SHA-256 (32 bytes). Wide enough for fingerprints up to 256 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }
}

/// 64-bit FNV-1a, big-endian (8 bytes).
///
/// Cheap and stable across platforms and releases, unlike `DefaultHasher`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1a64Digester;

impl Digester for Fnv1a64Digester {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
        const PRIME: u64 = 0x00000100000001B3;
        let mut state = OFFSET_BASIS;
        for &b in data {
            state ^= b as u64;
            state = state.wrapping_mul(PRIME);
        }
        state.to_be_bytes().to_vec()
    }
}

/// Wraps a [`Digester`] and sizes its output to the fingerprint width.
///
/// Digests longer than `width_bytes` keep their trailing (low-order) bytes.
/// Shorter digests are read as big-endian integers and left-padded with zeros, which leaves
/// the high bits of every fingerprint at 0; construction logs a warning when that happens.
#[derive(Clone)]
pub struct DigestAdapter {
    digester: Arc<dyn Digester>,
    width_bytes: usize,
    sample_len: usize,
}

impl DigestAdapter {
    /// Adapt `digester` to produce `width_bytes` bytes per feature.
    pub fn new(digester: Arc<dyn Digester>, width_bytes: usize) -> Self {
        let sample_len = digester.digest(&[]).len();
        if sample_len < width_bytes {
            log::warn!(
                "digest yields {sample_len} bytes but fingerprints are {width_bytes} bytes wide; \
                 the top {} bits will always be 0",
                (width_bytes - sample_len) * 8
            );
        }
        Self {
            digester,
            width_bytes,
            sample_len,
        }
    }

    /// MD5 sized to `width_bytes`.
    pub fn md5(width_bytes: usize) -> Self {
        Self::new(Arc::new(Md5Digester), width_bytes)
    }

    /// Number of bytes produced per feature.
    pub fn width_bytes(&self) -> usize {
        self.width_bytes
    }

    /// Whether the digest is narrower than the fingerprint, judged on the empty input.
    pub fn is_padded(&self) -> bool {
        self.sample_len < self.width_bytes
    }

    /// Hash one feature and size the result to exactly `width_bytes`.
    pub fn feature_bytes(&self, feature: &[u8]) -> Vec<u8> {
        let digest = self.digester.digest(feature);
        let n = self.width_bytes;
        if digest.len() >= n {
            return digest[digest.len() - n..].to_vec();
        }
        let mut out = vec![0u8; n];
        out[n - digest.len()..].copy_from_slice(&digest);
        out
    }
}

impl fmt::Debug for DigestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestAdapter")
            .field("width_bytes", &self.width_bytes)
            .field("sample_len", &self.sample_len)
            .finish_non_exhaustive()
    }
}
