use chrono::{DateTime, Duration, Utc};
use ingest_core::BarInterval;

/// Computes which sub-windows of a requested interval are not yet cached.
///
/// The check is edge-only: it compares the request against the coverage
/// window's endpoints and assumes the cached range has no interior holes.
/// Interior-hole repair would be a separate, explicitly tested extension.
#[derive(Debug, Clone, Copy)]
pub struct GapResolver {
    step: Duration,
}

impl GapResolver {
    /// `step` is one bar interval; it is excluded at each cached boundary
    /// so the boundary bar is never re-fetched.
    pub fn new(step: Duration) -> Self {
        Self { step }
    }

    pub fn for_interval(interval: BarInterval) -> Self {
        Self::new(interval.step())
    }

    /// Pure function of the requested closed interval and the current
    /// coverage. Returns zero, one or two disjoint sub-windows to fetch.
    pub fn resolve(
        &self,
        coverage: Option<(DateTime<Utc>, DateTime<Utc>)>,
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        if requested_start > requested_end {
            return Vec::new();
        }

        let Some((cached_min, cached_max)) = coverage else {
            return vec![(requested_start, requested_end)];
        };

        let mut missing = Vec::new();

        if requested_start < cached_min {
            let end = cached_min - self.step;
            if requested_start <= end {
                missing.push((requested_start, end));
            }
        }

        if requested_end > cached_max {
            let start = cached_max + self.step;
            if start <= requested_end {
                missing.push((start, requested_end));
            }
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 14, h, m, 0).unwrap()
    }

    #[test]
    fn empty_store_returns_request_unchanged() {
        let resolver = GapResolver::new(Duration::minutes(1));
        let gaps = resolver.resolve(None, t(9, 30), t(11, 30));
        assert_eq!(gaps, vec![(t(9, 30), t(11, 30))]);
    }

    #[test]
    fn covered_request_yields_no_gaps() {
        let resolver = GapResolver::new(Duration::minutes(1));
        let gaps = resolver.resolve(Some((t(9, 0), t(12, 0))), t(9, 30), t(11, 30));
        assert!(gaps.is_empty());
    }

    #[test]
    fn request_straddling_coverage_yields_both_edges() {
        let resolver = GapResolver::new(Duration::minutes(1));
        let gaps = resolver.resolve(Some((t(10, 0), t(11, 0))), t(9, 30), t(11, 30));
        assert_eq!(gaps, vec![(t(9, 30), t(9, 59)), (t(11, 1), t(11, 30))]);
    }

    #[test]
    fn left_edge_only() {
        let resolver = GapResolver::new(Duration::minutes(1));
        let gaps = resolver.resolve(Some((t(10, 0), t(12, 0))), t(9, 0), t(11, 0));
        assert_eq!(gaps, vec![(t(9, 0), t(9, 59))]);
    }

    #[test]
    fn right_edge_only() {
        let resolver = GapResolver::new(Duration::minutes(1));
        let gaps = resolver.resolve(Some((t(8, 0), t(10, 0))), t(9, 0), t(11, 0));
        assert_eq!(gaps, vec![(t(10, 1), t(11, 0))]);
    }

    #[test]
    fn boundary_bar_is_excluded_per_interval_step() {
        let resolver = GapResolver::for_interval(BarInterval::M15);
        let gaps = resolver.resolve(Some((t(10, 0), t(11, 0))), t(9, 0), t(12, 0));
        assert_eq!(gaps, vec![(t(9, 0), t(9, 45)), (t(11, 15), t(12, 0))]);
    }

    #[test]
    fn sliver_narrower_than_one_step_is_dropped() {
        let resolver = GapResolver::for_interval(BarInterval::M15);
        // Request starts five minutes before coverage; the boundary bar
        // already covers that sliver.
        let gaps = resolver.resolve(Some((t(10, 0), t(11, 0))), t(9, 55), t(11, 0));
        assert!(gaps.is_empty());
    }

    #[test]
    fn inverted_request_is_rejected() {
        let resolver = GapResolver::new(Duration::minutes(1));
        assert!(resolver.resolve(None, t(11, 0), t(10, 0)).is_empty());
    }
}
