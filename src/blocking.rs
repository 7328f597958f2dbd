//! Text helpers built on SimHash + the near-duplicate index.
//!
//! This module provides a convenience layer for *text inputs*:
//! raw strings are shingled, weighted by shingle frequency, fingerprinted, and filed in a
//! [`NearDupIndex`].
//!
//! # Example
//!
//! ```rust
//! use simsketch::blocking::SimHashTextIndex;
//! use simsketch::{IndexConfig, SimHashConfig};
//!
//! let mut ix = SimHashTextIndex::new(
//!     SimHashConfig::default(),
//!     IndexConfig::default().with_tolerance(3),
//! )
//! .unwrap();
//! ix.insert_text("1", "How are you? I am fine. Thanks.");
//! ix.insert_text("2", "Something else entirely, about the weather.");
//!
//! let near = ix.query_text("How are you? I am fine. Thanks!");
//! assert_eq!(near, vec!["1".to_string()]);
//! ```
//!
//! # Notes
//!
//! - Shingles are computed on **Unicode scalar values** (`char`), not bytes.
//! - Only letters, digits, `_` and Han characters survive filtering; whitespace and
//!   punctuation are dropped before shingling.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::lsh::{Error, IndexConfig, IndexEntry, NearDupIndex};
use crate::simhash::{Fingerprint, SimHash, SimHashConfig};

/// Characters kept before shingling.
pub const DEFAULT_PATTERN: &str = r"[\p{Han}\p{L}\p{N}_]+";
/// Default shingle width, in characters.
pub const DEFAULT_WINDOW: usize = 4;

/// Splits text into feature tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokens of `text`, in order. Repeats are meaningful (they become weights).
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Configuration for [`ShingleTokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShingleConfig {
    /// Window width in characters.
    pub window: usize,
    /// Regex matching the characters to keep. `None` uses [`DEFAULT_PATTERN`].
    pub pattern: Option<String>,
}

impl Default for ShingleConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            pattern: None,
        }
    }
}

/// Lower-cases, filters, and slides a fixed-width character window.
#[derive(Debug, Clone)]
pub struct ShingleTokenizer {
    window: usize,
    keep: Regex,
}

impl Default for ShingleTokenizer {
    fn default() -> Self {
        Self::new(ShingleConfig::default())
    }
}

impl ShingleTokenizer {
    /// Build a tokenizer. A zero window or an invalid pattern falls back to the default.
    pub fn new(config: ShingleConfig) -> Self {
        let window = if config.window == 0 {
            log::warn!("shingle window must be >= 1; using {DEFAULT_WINDOW}");
            DEFAULT_WINDOW
        } else {
            config.window
        };
        let keep = match config.pattern.as_deref() {
            Some(p) => Regex::new(p).unwrap_or_else(|e| {
                log::warn!("invalid shingle pattern {p:?}, using default: {e}");
                default_keep()
            }),
            None => default_keep(),
        };
        Self { window, keep }
    }

    /// Window width in characters.
    pub fn window(&self) -> usize {
        self.window
    }
}

fn default_keep() -> Regex {
    Regex::new(DEFAULT_PATTERN).expect("default shingle pattern is valid")
}

impl Tokenizer for ShingleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let filtered: String = self.keep.find_iter(&lowered).map(|m| m.as_str()).collect();
        let chars: Vec<char> = filtered.chars().collect();
        if chars.len() < self.window {
            return vec![filtered];
        }
        chars
            .windows(self.window)
            .map(|w| w.iter().collect::<String>())
            .collect()
    }
}

/// Count token occurrences into a weighted feature mapping.
pub fn feature_counts<I, S>(tokens: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts = HashMap::new();
    for t in tokens {
        *counts.entry(t.into()).or_insert(0u64) += 1;
    }
    counts
}

/// SimHash + near-duplicate index over raw text.
pub struct SimHashTextIndex {
    simhash: SimHash,
    tokenizer: Box<dyn Tokenizer>,
    index: NearDupIndex,
}

impl SimHashTextIndex {
    /// Create a text index with the default [`ShingleTokenizer`].
    ///
    /// Fails if the index cannot be built or its width differs from the fingerprint width.
    pub fn new(simhash: SimHashConfig, index: IndexConfig) -> Result<Self, Error> {
        let simhash = SimHash::new(simhash);
        let index = NearDupIndex::new(index)?;
        if index.width_bits() != simhash.width_bits() {
            return Err(Error::InvalidParam(
                "index width must equal the fingerprint width",
            ));
        }
        Ok(Self {
            simhash,
            tokenizer: Box::new(ShingleTokenizer::default()),
            index,
        })
    }

    /// Replace the fingerprint builder (e.g. to change the digest). Widths must still agree.
    pub fn with_simhash(mut self, simhash: SimHash) -> Result<Self, Error> {
        if simhash.width_bits() != self.index.width_bits() {
            return Err(Error::InvalidParam(
                "index width must equal the fingerprint width",
            ));
        }
        self.simhash = simhash;
        Ok(self)
    }

    /// Replace the tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Fingerprint `text` with this index's builder and tokenizer.
    pub fn fingerprint_text(&self, text: &str) -> Fingerprint {
        self.simhash.build_text(text, self.tokenizer.as_ref())
    }

    /// Index `text` under `id` and return its fingerprint.
    pub fn insert_text(&mut self, id: impl Into<String>, text: &str) -> Fingerprint {
        let fingerprint = self.fingerprint_text(text);
        self.index.add(&IndexEntry::new(id, fingerprint.clone()));
        fingerprint
    }

    /// Remove the entry previously inserted as (`id`, `text`). Returns `true` if it was present.
    pub fn remove_text(&mut self, id: impl Into<String>, text: &str) -> bool {
        let fingerprint = self.fingerprint_text(text);
        self.index.delete(&IndexEntry::new(id, fingerprint))
    }

    /// Ids of indexed texts within the index tolerance of `text`.
    pub fn query_text(&self, text: &str) -> Vec<String> {
        self.index.get_near_dups(&self.fingerprint_text(text))
    }

    /// The underlying index.
    pub fn index(&self) -> &NearDupIndex {
        &self.index
    }
}

impl fmt::Debug for SimHashTextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHashTextIndex")
            .field("simhash", &self.simhash)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
