//! Kill-quorum resolution for a single boss at a single difficulty.
//!
//! The progression API records a separate kill time for every character,
//! with sub-minute jitter between characters in the same raid. Timestamps
//! are rounded to a fixed granularity and the most recent rounded time that
//! enough characters share becomes the group's kill time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default rounding granularity in seconds.
pub const DEFAULT_ROUNDING_SECS: u32 = 60;

/// Default number of characters that must share a kill time.
pub const DEFAULT_QUORUM: usize = 5;

/// Parameters for resolving a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumRule {
    /// Minimum characters sharing a rounded timestamp.
    pub quorum: usize,
    /// Rounding granularity in seconds.
    pub rounding_secs: u32,
}

impl Default for QuorumRule {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            rounding_secs: DEFAULT_ROUNDING_SECS,
        }
    }
}

/// Round an epoch-millisecond timestamp to the nearest multiple of
/// `rounding_secs`. Exact halves round up.
///
/// `None` when the rounded time is not a representable date.
pub fn round_timestamp(ts_ms: i64, rounding_secs: u32) -> Option<i64> {
    let step = i64::from(rounding_secs.max(1)) * 1000;
    let rounded = ts_ms.checked_add(step / 2)?.div_euclid(step) * step;
    DateTime::<Utc>::from_timestamp_millis(rounded).map(|_| rounded)
}

/// Decide whether a quorum of characters killed the boss, returning the
/// canonical (rounded) kill time.
///
/// Non-positive timestamps mean "never killed" and are dropped, as are
/// timestamps too large to be a date. Distinct rounded times are scanned
/// newest first and the first one shared by at least `rule.quorum`
/// characters wins.
pub fn resolve_kill<I>(timestamps: I, rule: &QuorumRule) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    let mut tally: BTreeMap<i64, usize> = BTreeMap::new();
    let mut out_of_range = 0usize;
    for ts in timestamps.into_iter().filter(|&ts| ts > 0) {
        match round_timestamp(ts, rule.rounding_secs) {
            Some(rounded) => *tally.entry(rounded).or_insert(0) += 1,
            None => out_of_range += 1,
        }
    }
    if out_of_range > 0 {
        debug!(out_of_range, "Ignoring kill timestamps outside the date range");
    }

    if tally.is_empty() {
        return None;
    }

    debug!(candidates = ?tally, quorum = rule.quorum, "Resolving kill");

    let quorum = rule.quorum.max(1);
    tally
        .iter()
        .rev()
        .find(|(_, &count)| count >= quorum)
        .map(|(&ts, _)| ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_549_400_400_000; // on a minute boundary

    fn rule(quorum: usize) -> QuorumRule {
        QuorumRule {
            quorum,
            rounding_secs: DEFAULT_ROUNDING_SECS,
        }
    }

    #[test]
    fn test_empty_input_is_no_kill() {
        assert_eq!(resolve_kill(Vec::new(), &rule(5)), None);
        assert_eq!(resolve_kill(vec![0, 0, 0, 0, 0], &rule(5)), None);
    }

    #[test]
    fn test_quorum_boundary() {
        assert_eq!(resolve_kill(vec![T; 4], &rule(5)), None);
        assert_eq!(resolve_kill(vec![T; 5], &rule(5)), Some(T));
    }

    #[test]
    fn test_zeros_do_not_count_toward_quorum() {
        let mut times = vec![T; 4];
        times.extend([0, 0, 0]);
        assert_eq!(resolve_kill(times, &rule(5)), None);
    }

    #[test]
    fn test_most_recent_candidate_scanned_first() {
        let mut times = vec![T; 5];
        times.push(T + 3_600_000);
        assert_eq!(resolve_kill(times, &rule(5)), Some(T));
    }

    #[test]
    fn test_most_recent_qualifying_cluster_wins() {
        let later = T + 7 * 24 * 3_600_000;
        let mut times = vec![T; 6];
        times.extend(vec![later; 5]);
        assert_eq!(resolve_kill(times, &rule(5)), Some(later));
    }

    #[test]
    fn test_tie_at_two_times_prefers_newest() {
        let later = T + 120_000;
        let mut times = vec![T; 5];
        times.extend(vec![later; 5]);
        assert_eq!(resolve_kill(times, &rule(5)), Some(later));
    }

    #[test]
    fn test_rounding_collapses_sub_minute_jitter_ms() {
        // millisecond values, all within 30s of 120s
        let times = vec![100_000, 100_010, 100_050, 100_055, 100_059];
        assert_eq!(resolve_kill(times, &rule(5)), Some(120_000));

        let spread = vec![T - 25_000, T - 4_000, T, T + 12_000, T + 29_999];
        assert_eq!(resolve_kill(spread, &rule(5)), Some(T));
    }

    #[test]
    fn test_jitter_across_a_rounding_boundary_splits() {
        // seconds-scale spread straddles the :30 mark of a minute
        let times: Vec<i64> = [0, 10, 50, 55, 59]
            .iter()
            .map(|s| T + 100_000 + s * 1000)
            .collect();
        assert_eq!(round_timestamp(times[0], 60), Some(T + 120_000));
        assert_eq!(round_timestamp(times[4], 60), Some(T + 180_000));
        assert_eq!(resolve_kill(times, &rule(5)), None);
    }

    #[test]
    fn test_round_timestamp_ties_up() {
        assert_eq!(round_timestamp(T + 29_999, 60), Some(T));
        assert_eq!(round_timestamp(T + 30_000, 60), Some(T + 60_000));
        assert_eq!(round_timestamp(T - 30_000, 60), Some(T));
        assert_eq!(round_timestamp(T - 30_001, 60), Some(T - 60_000));
    }

    #[test]
    fn test_huge_timestamps_are_no_kill() {
        assert_eq!(round_timestamp(i64::MAX, 60), None);
        assert_eq!(resolve_kill(vec![i64::MAX; 5], &QuorumRule::default()), None);

        // out-of-range values do not disturb a real quorum
        let mut times = vec![T; 5];
        times.extend([i64::MAX, i64::MAX - 1, 9_000_000_000_000_000]);
        assert_eq!(resolve_kill(times, &rule(5)), Some(T));
    }

    #[test]
    fn test_custom_granularity() {
        let five_min = QuorumRule {
            quorum: 3,
            rounding_secs: 300,
        };
        let times = vec![T, T + 100_000, T + 149_000];
        assert_eq!(resolve_kill(times, &five_min), Some(T));
    }

    #[test]
    fn test_quorum_larger_than_roster() {
        assert_eq!(resolve_kill(vec![T; 6], &rule(8)), None);
    }
}
