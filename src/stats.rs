//! Injectable observability sink.
//!
//! The matcher reports per-keypoint sample values (accepted descriptor
//! scores, candidates examined without a match) to whatever sink the caller
//! provides. Tests use [`SampleStats`] to assert exact counter values;
//! production callers can forward samples to their telemetry layer or pass
//! [`NullStats`] to discard them.

use std::collections::HashMap;

/// Counter name for the descriptor bit score of every accepted match.
pub const MATCH_BITS: &str = "match bits";

/// Counter name for the number of candidates examined for a source keypoint
/// that ended up with no match.
pub const NO_MATCH_CANDIDATES_CHECKED: &str = "no-match candidates checked";

/// Sink for named sample distributions emitted during matching.
pub trait StatsSink {
    fn add_sample(&mut self, counter: &'static str, sample: f64);
}

/// Discards all samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStats;

impl StatsSink for NullStats {
    fn add_sample(&mut self, _counter: &'static str, _sample: f64) {}
}

/// Running summary of one counter's samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleSummary {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleSummary {
    fn add(&mut self, sample: f64) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        self.count += 1;
        self.sum += sample;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// In-memory sink keeping a summary and the raw samples per counter.
#[derive(Debug, Default)]
pub struct SampleStats {
    summaries: HashMap<&'static str, SampleSummary>,
    samples: HashMap<&'static str, Vec<f64>>,
}

impl SampleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, counter: &str) -> Option<&SampleSummary> {
        self.summaries.get(counter)
    }

    pub fn samples(&self, counter: &str) -> &[f64] {
        self.samples.get(counter).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, counter: &str) -> usize {
        self.summary(counter).map(|s| s.count).unwrap_or(0)
    }
}

impl StatsSink for SampleStats {
    fn add_sample(&mut self, counter: &'static str, sample: f64) {
        self.summaries.entry(counter).or_default().add(sample);
        self.samples.entry(counter).or_default().push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_stats_summary() {
        let mut stats = SampleStats::new();
        stats.add_sample(MATCH_BITS, 200.0);
        stats.add_sample(MATCH_BITS, 250.0);
        stats.add_sample(NO_MATCH_CANDIDATES_CHECKED, 0.0);

        let bits = stats.summary(MATCH_BITS).unwrap();
        assert_eq!(bits.count, 2);
        assert_relative_eq!(bits.min, 200.0);
        assert_relative_eq!(bits.max, 250.0);
        assert_relative_eq!(bits.mean(), 225.0);

        assert_eq!(stats.count(NO_MATCH_CANDIDATES_CHECKED), 1);
        assert_eq!(stats.samples(NO_MATCH_CANDIDATES_CHECKED), &[0.0]);
        assert_eq!(stats.count("unknown"), 0);
    }

    #[test]
    fn test_null_stats_discards() {
        let mut stats = NullStats;
        stats.add_sample(MATCH_BITS, 1.0);
    }
}
