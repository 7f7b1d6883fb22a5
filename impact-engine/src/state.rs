use crate::types::AnalyzedRecord;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeopoliticalStatus {
    Alert,
    Stable,
}

/// The latest ranked result set handed to the presentation layer.
///
/// Owned by the caller: each refresh takes the previous state by reference
/// and returns a replacement. Nothing is merged across cycles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub cycle: u64,
    pub refreshed_at: Option<DateTime<Local>>,
    /// Items the aggregator returned this cycle, before the analysis bound.
    pub fetched_count: usize,
    pub records: Vec<AnalyzedRecord>,
}

impl DashboardState {
    pub fn next_cycle(previous: &DashboardState, fetched_count: usize, records: Vec<AnalyzedRecord>) -> Self {
        Self {
            cycle: previous.cycle + 1,
            refreshed_at: Some(Local::now()),
            fetched_count,
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn analyzed_count(&self) -> usize {
        self.records.len()
    }

    /// Mean impact score, 0.0 when nothing was analyzed.
    pub fn sentiment_index(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        // Scores are unclamped and may sit at the i64 extremes.
        let total: f64 = self.records.iter().map(|r| r.impact_score() as f64).sum();
        total / self.records.len() as f64
    }

    /// Most frequent sector; ties go to the alphabetically smallest.
    pub fn top_sector(&self) -> &str {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.analysis.sector.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .max_by_key(|&(sector, count)| (count, Reverse(sector)))
            .map(|(sector, _)| sector)
            .unwrap_or("N/A")
    }

    /// Records whose `impact_type` is exactly one of the critical labels.
    pub fn critical_threats(&self) -> Vec<&AnalyzedRecord> {
        self.records.iter().filter(|r| r.analysis.is_critical()).collect()
    }

    pub fn geopolitical_status(&self) -> GeopoliticalStatus {
        if self.records.iter().any(|r| r.analysis.is_critical()) {
            GeopoliticalStatus::Alert
        } else {
            GeopoliticalStatus::Stable
        }
    }
}
