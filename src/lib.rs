//! `simsketch`: SimHash fingerprints and a near-duplicate index.
//!
//! This crate is intended for **index-only** near-duplicate detection:
//! - fingerprinting weighted feature sets (SimHash, any width that is a multiple of 8)
//! - retrieving every indexed fingerprint within Hamming distance `K` of a query, without a
//!   linear scan (Manku et al. bucketing + exact re-check)
//!
//! Scope here is *primitives*: fingerprints, bucketing, deterministic behavior.
//! Storing documents or persisting the index belongs elsewhere; only object ids are kept.
//!
//! ```rust
//! use simsketch::{Fingerprint, IndexConfig, IndexEntry, NearDupIndex, SimHash};
//!
//! let sh = SimHash::default();
//! let a = sh.build_features([("aaa", 1), ("bbb", 1)]);
//! assert_eq!(a, Fingerprint::from_u64(57087923692560392, 64).unwrap());
//!
//! let mut index = NearDupIndex::new(IndexConfig::default()).unwrap();
//! index.add(&IndexEntry::new("doc-1", a.clone()));
//! assert_eq!(index.get_near_dups(&a), vec!["doc-1".to_string()]);
//! ```

#![warn(missing_docs)]

pub mod blocking;
pub mod digest;
pub mod lsh;
pub mod parallel;
pub mod simhash;

pub use blocking::{feature_counts, ShingleConfig, ShingleTokenizer, SimHashTextIndex, Tokenizer};
pub use digest::{DigestAdapter, Digester, Fnv1a64Digester, Md5Digester, Sha256Digester};
pub use lsh::{Error, IndexConfig, IndexEntry, NearDupIndex};
pub use simhash::{Fingerprint, SimHash, SimHashConfig};
