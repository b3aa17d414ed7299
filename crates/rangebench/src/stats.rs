use core::time::Duration;

/// Order-independent summary of a latency sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub min: Duration,
    pub median: Duration,
    pub mean: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub max: Duration,
}

impl Summary {
    /// Summarises `samples`, or returns `None` when there is nothing to
    /// summarise.
    ///
    /// Percentiles interpolate linearly between the two closest ranks of the
    /// sorted sample (rank `p / 100 * (n - 1)`); the median is the 50th
    /// percentile under the same rule. The mean is truncated to whole
    /// nanoseconds.
    pub fn from_durations(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let total: u128 = sorted.iter().map(Duration::as_nanos).sum();
        let mean = total / sorted.len() as u128;

        Some(Self {
            min: sorted[0],
            median: percentile(&sorted, 50.0),
            mean: Duration::from_nanos(u64::try_from(mean).unwrap_or(u64::MAX)),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Linear-interpolated percentile of a non-empty, sorted sample.
pub fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    debug_assert!(!sorted.is_empty());
    let upper = sorted.len() - 1;
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * upper as f64;

    let lo_idx = (rank.floor() as usize).min(upper);
    let hi_idx = (rank.ceil() as usize).min(upper);
    let weight = rank - lo_idx as f64;

    let lo = sorted[lo_idx].as_nanos() as f64;
    let hi = sorted[hi_idx].as_nanos() as f64;
    Duration::from_nanos((lo + (hi - lo) * weight).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn empty_sample_has_no_summary() {
        assert_eq!(Summary::from_durations(&[]), None);
    }

    #[test]
    fn single_sample_is_every_statistic() {
        let summary = Summary::from_durations(&ms(&[7])).unwrap();
        let d = Duration::from_millis(7);
        assert_eq!(
            summary,
            Summary {
                min: d,
                median: d,
                mean: d,
                p90: d,
                p95: d,
                max: d,
            }
        );
    }

    #[test]
    fn interpolates_between_ranks() {
        // Sorted: 10, 20, 30, 40
        let summary = Summary::from_durations(&ms(&[40, 10, 30, 20])).unwrap();
        assert_eq!(summary.min, Duration::from_millis(10));
        assert_eq!(summary.max, Duration::from_millis(40));
        assert_eq!(summary.median, Duration::from_millis(25));
        assert_eq!(summary.mean, Duration::from_millis(25));
        // rank 2.7 -> 30 + 0.7 * 10
        assert_eq!(summary.p90, Duration::from_millis(37));
        // rank 2.85 -> 30 + 0.85 * 10
        assert_eq!(summary.p95, Duration::from_micros(38_500));
    }

    #[test]
    fn exact_ranks_pick_samples() {
        // 0, 10, ..., 100 ms: p90 and median fall exactly on samples.
        let samples: Vec<_> = (0..=10).map(|i| Duration::from_millis(i * 10)).collect();
        let summary = Summary::from_durations(&samples).unwrap();
        assert_eq!(summary.median, Duration::from_millis(50));
        assert_eq!(summary.p90, Duration::from_millis(90));
        assert_eq!(summary.p95, Duration::from_millis(95));
        assert_eq!(summary.mean, Duration::from_millis(50));
    }

    #[test]
    fn order_does_not_matter() {
        let a = ms(&[3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5]);
        let mut b = a.clone();
        b.reverse();
        b.rotate_left(4);
        assert_eq!(Summary::from_durations(&a), Summary::from_durations(&b));
    }

    #[test]
    fn percentile_bounds() {
        let sorted = ms(&[1, 2, 3]);
        assert_eq!(percentile(&sorted, 0.0), Duration::from_millis(1));
        assert_eq!(percentile(&sorted, 100.0), Duration::from_millis(3));
    }
}
