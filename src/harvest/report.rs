//! Per-target reports and the run summary

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of fetching one target (including nothing of its children)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReport {
    /// Type name of the target
    pub type_name: String,
    /// Target URL
    pub url: String,
    /// Records produced by this target
    pub records: usize,
    /// Time spent fetching every page
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    /// Pages whose items are missing
    pub omitted_pages: usize,
    /// Page 1 could not be fetched; the target produced nothing
    pub failed: bool,
    /// Depth below the discovered target; 0 for discovered targets
    pub depth: usize,
}

impl TargetReport {
    /// Whether every page was fetched
    pub fn is_complete(&self) -> bool {
        !self.failed && self.omitted_pages == 0
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Totals of one harvest run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Discovered targets (children excluded)
    pub targets: usize,
    /// Record count per type, site metadata included
    pub records_by_type: BTreeMap<String, usize>,
    /// Types of targets that produced nothing because page 1 failed
    pub failed_targets: Vec<String>,
    /// Pages omitted across all targets
    pub omitted_pages: usize,
    /// Every target report, children included, in fetch order
    pub reports: Vec<TargetReport>,
}

impl HarvestSummary {
    /// Empty summary starting now
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            targets: 0,
            records_by_type: BTreeMap::new(),
            failed_targets: Vec::new(),
            omitted_pages: 0,
            reports: Vec::new(),
        }
    }

    /// Count records that did not come from a target (site metadata)
    pub fn add_records(&mut self, type_name: &str, count: usize) {
        *self.records_by_type.entry(type_name.to_string()).or_default() += count;
    }

    /// Fold one target report into the totals
    pub fn push(&mut self, report: TargetReport) {
        if report.depth == 0 {
            self.targets += 1;
        }
        if report.failed {
            self.failed_targets.push(report.type_name.clone());
        }
        self.omitted_pages += report.omitted_pages;
        self.add_records(&report.type_name, report.records);
        self.reports.push(report);
    }

    /// Stamp the end of the run
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Records across all types
    pub fn total_records(&self) -> usize {
        self.records_by_type.values().sum()
    }

    /// Wall-clock duration of the run
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Whether every target and page was fetched
    pub fn is_complete(&self) -> bool {
        self.failed_targets.is_empty() && self.omitted_pages == 0
    }
}
