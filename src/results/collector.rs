//! Result collector for aggregating and deduplicating adapter output
//!
//! In-flight adapters push batches in completion order; `finalize`
//! re-imposes priority order before dedup so the observable result is
//! deterministic no matter which adapter finished first.

use super::types::{AdapterOutcome, ExperienceLevel, JobRecord};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// One adapter's contribution, tagged for deterministic ordering
#[derive(Debug, Clone)]
struct Batch {
    /// Adapter priority (lower ranks first)
    priority: u32,
    /// Registration index; breaks ties between equal priorities
    order: usize,
    records: Vec<JobRecord>,
}

/// Container shared across concurrently running adapter units
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    batches: Arc<RwLock<Vec<Batch>>>,
    outcomes: Arc<RwLock<Vec<AdapterOutcome>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one adapter's records. `order` is the adapter's registration
    /// index, the documented tie-break between equal priorities.
    pub fn add_batch(&self, priority: u32, order: usize, records: Vec<JobRecord>) {
        self.batches.write().unwrap().push(Batch {
            priority,
            order,
            records,
        });
    }

    /// Record a per-adapter outcome
    pub fn add_outcome(&self, outcome: AdapterOutcome) {
        self.outcomes.write().unwrap().push(outcome);
    }

    /// Outcomes sorted by adapter name for stable diagnostics
    pub fn outcomes(&self) -> Vec<AdapterOutcome> {
        let mut outcomes = self.outcomes.read().unwrap().clone();
        outcomes.sort_by(|a, b| a.adapter.cmp(&b.adapter));
        outcomes
    }

    /// Total records buffered before dedup
    pub fn raw_count(&self) -> usize {
        self.batches
            .read()
            .unwrap()
            .iter()
            .map(|b| b.records.len())
            .sum()
    }

    /// Merge, dedup, filter, truncate. Completion order is irrelevant:
    /// batches are ordered by (priority, registration) first.
    pub fn finalize(&self, level: ExperienceLevel, limit: usize) -> Vec<JobRecord> {
        let mut batches = self.batches.read().unwrap().clone();
        batches.sort_by_key(|b| (b.priority, b.order));

        let merged: Vec<JobRecord> = batches.into_iter().flat_map(|b| b.records).collect();

        dedupe(merged)
            .into_iter()
            .filter(|record| level.matches(record))
            .take(limit)
            .collect()
    }
}

/// Collapse duplicates by normalized (title, company); first occurrence wins
pub fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, company: &str, source: &str) -> JobRecord {
        JobRecord::new(title, company, source)
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let records = vec![
            record("Engineer", "Acme", "a"),
            record("Engineer", "Acme", "b"),
            record("Designer", "Beta", "b"),
        ];

        let deduped = dedupe(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].source, "a");
    }

    #[test]
    fn test_dedup_idempotent() {
        let records = vec![
            record("Engineer", "Acme", "a"),
            record("engineer", "ACME", "b"),
            record("Designer", "Beta", "b"),
        ];

        let once = dedupe(records);
        let twice = dedupe(once.clone());

        assert_eq!(once.len(), twice.len());
        let keys_once: Vec<_> = once.iter().map(|r| r.dedup_key()).collect();
        let keys_twice: Vec<_> = twice.iter().map(|r| r.dedup_key()).collect();
        assert_eq!(keys_once, keys_twice);
    }

    #[test]
    fn test_priority_order_beats_completion_order() {
        let collector = ResultCollector::new();

        // Lower-priority adapter finishes first
        collector.add_batch(2, 1, vec![record("Engineer", "Acme", "slowpoke-beat-us")]);
        collector.add_batch(1, 0, vec![record("Engineer", "Acme", "priority-one")]);

        let results = collector.finalize(ExperienceLevel::All, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "priority-one");
    }

    #[test]
    fn test_equal_priority_ties_break_by_registration() {
        let collector = ResultCollector::new();

        collector.add_batch(1, 5, vec![record("Engineer", "Acme", "registered-later")]);
        collector.add_batch(1, 2, vec![record("Engineer", "Acme", "registered-first")]);

        let results = collector.finalize(ExperienceLevel::All, 10);
        assert_eq!(results[0].source, "registered-first");
    }

    #[test]
    fn test_limit_is_a_prefix_of_full_merge() {
        let collector = ResultCollector::new();
        collector.add_batch(
            1,
            0,
            (0..8)
                .map(|i| record(&format!("Role {}", i), "Acme", "a"))
                .collect(),
        );

        let full = collector.finalize(ExperienceLevel::All, usize::MAX);
        let limited = collector.finalize(ExperienceLevel::All, 3);

        assert_eq!(limited.len(), 3);
        for (i, r) in limited.iter().enumerate() {
            assert_eq!(r.dedup_key(), full[i].dedup_key());
        }
    }

    #[test]
    fn test_experience_filter_applied() {
        let collector = ResultCollector::new();
        collector.add_batch(
            1,
            0,
            vec![
                record("Senior Engineer", "Acme", "a"),
                record("Junior Engineer", "Beta", "a"),
            ],
        );

        let seniors = collector.finalize(ExperienceLevel::Senior, 10);
        assert_eq!(seniors.len(), 1);
        assert_eq!(seniors[0].company, "Acme");
    }

    #[test]
    fn test_outcomes_sorted_by_name() {
        let collector = ResultCollector::new();
        collector.add_outcome(AdapterOutcome::success("zeta", 1, 10));
        collector.add_outcome(AdapterOutcome::success("alpha", 2, 20));

        let outcomes = collector.outcomes();
        assert_eq!(outcomes[0].adapter, "alpha");
        assert_eq!(outcomes[1].adapter, "zeta");
    }
}
