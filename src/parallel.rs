//! Worker-pool fan-out for fingerprint construction.
//!
//! Per-feature work (digest, bit expansion, weighting) is independent, so feature chunks are
//! handed to a fixed set of scoped workers over a bounded task channel. Each worker keeps its
//! own `BitSums` and reports one partial result. Partials are reduced only after every worker
//! has been joined, so the output never depends on scheduling.

use std::thread;

use crossbeam::channel;

use crate::digest::DigestAdapter;
use crate::simhash::{BitSums, SimHashConfig};

/// Number of workers used when the caller does not choose.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Worker count actually used: the request (or [`default_workers`]) capped by the available
/// parallelism and by the number of features, and never below 1.
pub(crate) fn effective_workers(requested: Option<usize>, features: usize) -> usize {
    let available = default_workers();
    requested
        .map_or(available, |w| w.min(available))
        .min(features)
        .max(1)
}

/// Per-bit weighted counts and total weight for `features`.
///
/// Equivalent to feeding every feature through one `BitSums` in order.
pub(crate) fn weighted_bit_sums(
    adapter: &DigestAdapter,
    config: &SimHashConfig,
    features: &[(&str, u64)],
    workers: Option<usize>,
) -> (Vec<u128>, u128) {
    let workers = effective_workers(workers, features.len());
    if workers == 1 {
        let mut sums = BitSums::new(config);
        for &(feature, weight) in features {
            sums.push(adapter.feature_bytes(feature.as_bytes()), weight);
        }
        return sums.finish();
    }

    let chunk_size = features.len().div_ceil(workers * 4);
    log::debug!(
        "fingerprinting {} features on {} workers (chunks of {})",
        features.len(),
        workers,
        chunk_size
    );

    let (task_tx, task_rx) = channel::bounded::<&[(&str, u64)]>(workers);
    // Every worker sends exactly once, so this never blocks.
    let (result_tx, result_rx) = channel::bounded::<(Vec<u128>, u128)>(workers);

    thread::scope(|s| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            s.spawn(move || {
                let mut sums = BitSums::new(config);
                for chunk in task_rx.iter() {
                    for &(feature, weight) in chunk {
                        sums.push(adapter.feature_bytes(feature.as_bytes()), weight);
                    }
                }
                let _ = result_tx.send(sums.finish());
            });
        }
        drop(result_tx);

        for chunk in features.chunks(chunk_size) {
            if task_tx.send(chunk).is_err() {
                break;
            }
        }
        drop(task_tx);
    });

    let mut combined = vec![0u128; config.width_bits];
    let mut total_weight = 0u128;
    for (partial, weight) in result_rx.iter() {
        for (c, p) in combined.iter_mut().zip(&partial) {
            *c += p;
        }
        total_weight += weight;
    }
    (combined, total_weight)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{default_workers, effective_workers};
    use crate::simhash::{SimHash, SimHashConfig};

    fn features(n: usize) -> HashMap<String, u64> {
        (0..n).map(|i| (format!("f{i}"), (i % 97 + 1) as u64)).collect()
    }

    #[test]
    fn parallel_matches_sequential() {
        let sh = SimHash::default();
        let f = features(1000);
        let sequential = sh.build_features(f.iter().map(|(k, &w)| (k.as_str(), w)));
        for workers in [1, 2, 3, 8, 64] {
            assert_eq!(sh.build_features_parallel(&f, Some(workers)), sequential);
        }
        assert_eq!(sh.build_features_parallel(&f, None), sequential);
    }

    #[test]
    fn parallel_handles_tiny_inputs() {
        let sh = SimHash::new(SimHashConfig::default().with_width_bits(128));
        let empty = HashMap::new();
        assert_eq!(
            sh.build_features_parallel(&empty, Some(4)).to_u128(),
            Some(0)
        );
        let one: HashMap<String, u64> = [("aaa".to_string(), 1)].into_iter().collect();
        assert_eq!(
            sh.build_features_parallel(&one, Some(4)),
            sh.build_features([("aaa", 1)])
        );
    }

    #[test]
    fn explicit_worker_count_is_capped_by_available_parallelism() {
        let available = default_workers();
        assert_eq!(effective_workers(None, 10_000), available.min(10_000));
        assert_eq!(effective_workers(Some(available + 64), 10_000), available.min(10_000));
        assert_eq!(effective_workers(Some(1), 10_000), 1);
        assert_eq!(effective_workers(Some(0), 10_000), 1);
        assert_eq!(effective_workers(Some(8), 0), 1);
        assert_eq!(effective_workers(Some(8), 1), 1);
        assert!(effective_workers(Some(2), 10_000) <= 2);
    }

    #[test]
    fn heavy_weights_sum_without_overflow() {
        let f: HashMap<String, u64> = (0..64).map(|i| (format!("f{i}"), u64::MAX)).collect();
        let sh = SimHash::default();
        let sequential = sh.build_features(f.iter().map(|(k, &w)| (k.as_str(), w)));
        let unit = sh.build_features(f.keys().map(|k| (k.as_str(), 1)));
        assert_eq!(sequential, unit);
        assert_eq!(sh.build_features_parallel(&f, Some(4)), sequential);
    }
}
