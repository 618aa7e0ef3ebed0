//! Per-key sample accumulation and coefficient-of-variation convergence.
//!
//! Every measurement key owns an append-only list of raw observations
//! (milliseconds). Aggregates are derived on demand; the raw list is what gets
//! serialized, so downstream tools can recompute any statistic.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::BenchResult;

/// Convergence criteria for a sample set.
///
/// A key is converged when it holds strictly more than 2 samples and
/// `multiplier * stddev / mean < threshold`. The multiplier exists because
/// some historical harness variants compared `2 * CV` against the same nominal
/// threshold; it is explicit configuration here, never hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct CvCriteria {
    pub threshold: f64,
    pub multiplier: f64,
}

impl Default for CvCriteria {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            multiplier: 1.0,
        }
    }
}

/// Aggregates derived from one key's samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl SampleStats {
    /// Coefficient of variation. NaN when the mean is zero; callers treat
    /// that as "not converged".
    pub fn cv(&self) -> f64 {
        self.std_dev / self.mean
    }
}

/// Insertion-order-preserving samples per measurement key, keys kept sorted.
#[derive(Debug, Default)]
pub struct SampleSet {
    samples: BTreeMap<u64, Vec<f64>>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the sample set for `key`, creating it if absent.
    /// Values are recorded as given; validation is the caller's concern.
    pub fn record(&mut self, key: u64, value: f64) {
        self.samples.entry(key).or_default().push(value);
    }

    pub fn samples(&self, key: u64) -> Option<&[f64]> {
        self.samples.get(&key).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean, sample standard deviation (n-1 divisor, zero below 2 samples)
    /// and count for `key`. An untracked key yields all zeros.
    pub fn stats(&self, key: u64) -> SampleStats {
        let Some(values) = self.samples.get(&key) else {
            return SampleStats {
                mean: 0.0,
                std_dev: 0.0,
                count: 0,
            };
        };
        let count = values.len();
        if count == 0 {
            return SampleStats {
                mean: 0.0,
                std_dev: 0.0,
                count: 0,
            };
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let std_dev = if count >= 2 {
            let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
            (sum_sq / (count - 1) as f64).sqrt()
        } else {
            0.0
        };
        SampleStats {
            mean,
            std_dev,
            count,
        }
    }

    /// Whether `key` has accumulated enough stable samples. A zero mean never
    /// converges, keeping the predicate well defined for all-zero inputs.
    pub fn is_converged(&self, key: u64, criteria: &CvCriteria) -> bool {
        let s = self.stats(key);
        if s.count <= 2 || s.mean <= 0.0 {
            return false;
        }
        criteria.multiplier * s.std_dev / s.mean < criteria.threshold
    }

    /// The subset of `keys` that still needs sampling, input order preserved.
    pub fn filter_unconverged(&self, keys: &[u64], criteria: &CvCriteria) -> Vec<u64> {
        keys.iter()
            .copied()
            .filter(|&k| !self.is_converged(k, criteria))
            .collect()
    }

    /// Maximum CV across all keys with at least 2 samples. `None` until some
    /// key qualifies; this feeds a run-level stopping display, so an absent
    /// value must stay distinguishable from a genuine zero.
    pub fn worst_cv(&self) -> Option<f64> {
        self.samples
            .keys()
            .map(|&k| self.stats(k))
            .filter(|s| s.count >= 2)
            .map(|s| s.cv())
            .filter(|cv| !cv.is_nan())
            .fold(None, |acc, cv| match acc {
                Some(best) if best >= cv => Some(best),
                _ => Some(cv),
            })
    }

    /// Write the raw samples as CSV: one header row naming the two axes, then
    /// one variable-width row per key in ascending key order.
    pub fn write_csv<W: Write>(
        &self,
        sink: W,
        key_column: &str,
        value_column: &str,
    ) -> BenchResult<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(sink);
        writer.write_record([key_column, value_column])?;
        for (key, values) in &self.samples {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(key.to_string());
            record.extend(values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the CSV to a file path.
    pub fn save(&self, path: &Path, key_column: &str, value_column: &str) -> BenchResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file, key_column, value_column)
    }
}
