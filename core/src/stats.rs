//! Processing counters

use crate::DEFAULT_MATCH_RATE_THRESHOLD;

/// Running counters owned by a [`Processor`](crate::Processor).
#[derive(Debug, Default, Clone)]
pub(crate) struct Counters {
    pub(crate) lines_processed: u64,
    pub(crate) lines_matched: u64,
    pub(crate) template_errors: u64,
    pub(crate) sequences_started: u64,
    pub(crate) sequences_flushed: u64,
}

impl Counters {
    pub(crate) fn snapshot(&self, cache_hits: u64, cache_misses: u64) -> Stats {
        Stats {
            lines_processed: self.lines_processed,
            lines_matched: self.lines_matched,
            cache_hits,
            cache_misses,
            template_errors: self.template_errors,
            sequences_started: self.sequences_started,
            sequences_flushed: self.sequences_flushed,
        }
    }
}

/// Point-in-time statistics of a processor.
///
/// A line counts as matched when a rule matched it and the rule's output
/// rendered. Pass-through and template-error lines are not matched.
///
/// The serialized form also carries `match_rate`; it is ignored when
/// deserializing and recomputed from the counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Stats {
    /// Lines seen.
    pub lines_processed: u64,
    /// Lines normalized by a rule.
    pub lines_matched: u64,
    /// Lines served from the cache.
    pub cache_hits: u64,
    /// Cache lookups that had to run the rules.
    pub cache_misses: u64,
    /// Matched lines whose template could not be rendered.
    pub template_errors: u64,
    /// Sequences opened by a leader.
    pub sequences_started: u64,
    /// Sequence blocks emitted.
    pub sequences_flushed: u64,
}

/// Alias kept for callers that think of [`Stats`] as a snapshot.
pub type StatsSnapshot = Stats;

impl Stats {
    /// `lines_matched / lines_processed`, or `0.0` before any line.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn match_rate(&self) -> f64 {
        if self.lines_processed == 0 {
            0.0
        } else {
            self.lines_matched as f64 / self.lines_processed as f64
        }
    }

    /// Returns `true` if the match rate is under `threshold`.
    ///
    /// Always `false` before any line was processed.
    #[must_use]
    pub fn below_threshold(&self, threshold: f64) -> bool {
        self.lines_processed > 0 && self.match_rate() < threshold
    }

    /// [`below_threshold`](Self::below_threshold) with
    /// [`DEFAULT_MATCH_RATE_THRESHOLD`].
    #[must_use]
    pub fn poorly_covered(&self) -> bool {
        self.below_threshold(DEFAULT_MATCH_RATE_THRESHOLD)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Stats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Stats", 8)?;
        s.serialize_field("lines_processed", &self.lines_processed)?;
        s.serialize_field("lines_matched", &self.lines_matched)?;
        s.serialize_field("match_rate", &self.match_rate())?;
        s.serialize_field("cache_hits", &self.cache_hits)?;
        s.serialize_field("cache_misses", &self.cache_misses)?;
        s.serialize_field("template_errors", &self.template_errors)?;
        s.serialize_field("sequences_started", &self.sequences_started)?;
        s.serialize_field("sequences_flushed", &self.sequences_flushed)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_rate_of_empty_run_is_zero() {
        let stats = Stats::default();
        assert!((stats.match_rate() - 0.0).abs() < f64::EPSILON);
        assert!(!stats.below_threshold(0.5));
    }

    #[test]
    fn match_rate_and_threshold() {
        let stats = Stats {
            lines_processed: 10,
            lines_matched: 9,
            ..Stats::default()
        };
        assert!((stats.match_rate() - 0.9).abs() < 1e-9);
        assert!(stats.poorly_covered());
        assert!(!stats.below_threshold(0.9));
    }

    #[test]
    fn snapshot_copies_counters() {
        let counters = Counters {
            lines_processed: 3,
            lines_matched: 2,
            template_errors: 1,
            sequences_started: 1,
            sequences_flushed: 1,
        };
        let stats = counters.snapshot(4, 5);
        assert_eq!(stats.cache_hits, 4);
        assert_eq!(stats.cache_misses, 5);
        assert_eq!(stats.template_errors, 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_counters() {
        let stats = Stats {
            lines_processed: 2,
            lines_matched: 1,
            ..Stats::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["lines_processed"], 2);
        assert_eq!(json["lines_matched"], 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialized_stats_carry_match_rate() {
        let stats = Stats {
            lines_processed: 4,
            lines_matched: 3,
            ..Stats::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["match_rate"], 0.75);

        let back: Stats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
