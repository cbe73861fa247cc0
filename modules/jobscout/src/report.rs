use std::fmt;

use jobscout_common::EvaluationResult;

/// Collects per-posting results across all sites during a run.
/// Only the single control thread ever touches it.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: Vec<EvaluationResult>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: EvaluationResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rank descending by score. The sort is stable: equal scores keep
    /// their collection order. No deduplication by title or URL.
    pub fn rank(self) -> RankedReport {
        let mut entries = self.results;
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        RankedReport { entries }
    }
}

/// Scored postings in descending score order, ready for review.
#[derive(Debug)]
pub struct RankedReport {
    entries: Vec<EvaluationResult>,
}

impl RankedReport {
    pub fn entries(&self) -> &[EvaluationResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RankedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ranked postings ({}) ===", self.entries.len())?;
        for entry in &self.entries {
            writeln!(f)?;
            writeln!(
                f,
                "[{:>3}] [{}] {}",
                entry.score, entry.source_id, entry.title
            )?;
            for line in entry.analysis.lines() {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(source_id: &str, title: &str, score: u32) -> EvaluationResult {
        EvaluationResult {
            source_id: source_id.to_string(),
            title: title.to_string(),
            score,
            analysis: format!("{score}\nanalysis for {title}"),
        }
    }

    #[test]
    fn rank_sorts_descending_and_keeps_collection_order_on_ties() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("a", "first", 40));
        aggregator.record(result("b", "second", 90));
        aggregator.record(result("c", "third", 90));
        aggregator.record(result("d", "fourth", 10));

        let report = aggregator.rank();
        let ranked: Vec<(&str, u32)> = report
            .entries()
            .iter()
            .map(|e| (e.title.as_str(), e.score))
            .collect();
        assert_eq!(
            ranked,
            vec![("second", 90), ("third", 90), ("first", 40), ("fourth", 10)]
        );
    }

    #[test]
    fn empty_aggregator_ranks_to_an_empty_report() {
        let report = Aggregator::new().rank();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn duplicate_titles_are_kept() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("a", "same posting", 50));
        aggregator.record(result("a", "same posting", 50));
        assert_eq!(aggregator.rank().len(), 2);
    }
}
