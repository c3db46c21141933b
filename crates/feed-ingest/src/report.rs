/// Result of one orchestration unit (a bar sub-window or one symbol's
/// news batch).
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit: String,
    /// Records received from upstream, before merge/dedup.
    pub fetched: usize,
    /// Rows actually written to the store.
    pub new_rows: u64,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// Aggregate result of one fetch cycle for a feed.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub feed: String,
    pub units: Vec<UnitReport>,
}

impl CycleReport {
    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            units: Vec::new(),
        }
    }

    pub fn new_rows(&self) -> u64 {
        self.units.iter().map(|u| u.new_rows).sum()
    }

    pub fn failed_units(&self) -> usize {
        self.units.iter().filter(|u| !u.succeeded).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_units() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_aggregates_units() {
        let mut report = CycleReport::new("news");
        report.units.push(UnitReport {
            unit: "news:GLD".into(),
            fetched: 10,
            new_rows: 4,
            succeeded: true,
            error: None,
        });
        report.units.push(UnitReport {
            unit: "news:NEM".into(),
            fetched: 0,
            new_rows: 0,
            succeeded: false,
            error: Some("timed out".into()),
        });

        assert_eq!(report.new_rows(), 4);
        assert_eq!(report.failed_units(), 1);
        assert!(!report.all_succeeded());
    }
}
