use std::fmt;
use std::time::Duration;

use tracing::{error, info, warn};

use jobscout_common::{EvaluationResult, JobScoutError};

use crate::detail;
use crate::listing;
use crate::report::{Aggregator, RankedReport};
use crate::scorer::Scorer;
use crate::sources::{SiteAdapter, SourceRegistry};
use crate::traits::{RenderSession, SessionFactory, TextModel};

/// Fixed waits for client-side rendering to settle after navigation.
/// Known fragility: a slow site can still render after the wait.
#[derive(Debug, Clone, Copy)]
pub struct SettleDelays {
    pub listing: Duration,
    pub detail: Duration,
    pub between_candidates: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(10),
            detail: Duration::from_secs(6),
            between_candidates: Duration::from_secs(3),
        }
    }
}

impl SettleDelays {
    /// No waiting. For tests against mock sessions.
    pub fn zero() -> Self {
        Self {
            listing: Duration::ZERO,
            detail: Duration::ZERO,
            between_candidates: Duration::ZERO,
        }
    }
}

/// Stats from one scout run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub sites_completed: u32,
    pub sites_failed: u32,
    pub candidates_found: u32,
    pub postings_scored: u32,
    pub postings_skipped: u32,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Scout Run Complete ===")?;
        writeln!(f, "Sites completed:  {}", self.sites_completed)?;
        writeln!(f, "Sites failed:     {}", self.sites_failed)?;
        writeln!(f, "Candidates found: {}", self.candidates_found)?;
        writeln!(f, "Postings scored:  {}", self.postings_scored)?;
        writeln!(f, "Postings skipped: {}", self.postings_skipped)?;
        Ok(())
    }
}

/// A failure scoped to one source. The run continues past it.
#[derive(Debug)]
pub struct SiteError {
    pub source_id: String,
    pub message: String,
}

/// Everything a run produces for the presentation layer.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RankedReport,
    pub stats: RunStats,
    pub site_errors: Vec<SiteError>,
}

pub struct Scout {
    registry: SourceRegistry,
    sessions: Box<dyn SessionFactory>,
    scorer: Scorer,
    delays: SettleDelays,
}

impl Scout {
    pub fn new(
        registry: SourceRegistry,
        sessions: Box<dyn SessionFactory>,
        model: Box<dyn TextModel>,
    ) -> Self {
        Self {
            registry,
            sessions,
            scorer: Scorer::new(model),
            delays: SettleDelays::default(),
        }
    }

    pub fn with_delays(mut self, delays: SettleDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.scorer = self.scorer.with_cooldown(cooldown);
        self
    }

    /// Run the pipeline over the selected sources, strictly sequentially:
    /// one site at a time, one candidate at a time. Each site gets a fresh
    /// render session that is torn down unconditionally, error paths
    /// included. A failure inside one site never aborts the others.
    pub async fn run(&self, selected: &[String], limit: usize) -> RunOutcome {
        let limit = limit.max(1);
        let mut aggregator = Aggregator::new();
        let mut stats = RunStats::default();
        let mut site_errors = Vec::new();

        for source_id in selected {
            info!(source = source_id.as_str(), "Collecting source");
            match self
                .run_site(source_id, limit, &mut aggregator, &mut stats)
                .await
            {
                Ok(()) => stats.sites_completed += 1,
                Err(e) => {
                    error!(source = source_id.as_str(), error = %e, "Source failed");
                    stats.sites_failed += 1;
                    site_errors.push(SiteError {
                        source_id: source_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let report = aggregator.rank();
        if report.is_empty() {
            warn!("Nothing collected across all sources; check whether the sites are blocking");
        }

        RunOutcome {
            report,
            stats,
            site_errors,
        }
    }

    async fn run_site(
        &self,
        source_id: &str,
        limit: usize,
        aggregator: &mut Aggregator,
        stats: &mut RunStats,
    ) -> Result<(), JobScoutError> {
        let adapter = self.registry.lookup(source_id)?;

        let mut session = self
            .sessions
            .open()
            .await
            .map_err(|e| JobScoutError::Session(e.to_string()))?;

        let result = self
            .collect_site(session.as_mut(), adapter, limit, aggregator, stats)
            .await;

        // Teardown happens whether collection failed or not; a leaked
        // session is a leaked browser process.
        if let Err(e) = session.close().await {
            warn!(source = source_id, error = %e, "Session teardown failed");
        }

        result
    }

    async fn collect_site(
        &self,
        session: &mut dyn RenderSession,
        adapter: &SiteAdapter,
        limit: usize,
        aggregator: &mut Aggregator,
        stats: &mut RunStats,
    ) -> Result<(), JobScoutError> {
        let candidates = listing::extract(session, adapter, limit, self.delays.listing)
            .await
            .map_err(|e| JobScoutError::Extraction(e.to_string()))?;
        stats.candidates_found += candidates.len() as u32;

        for candidate in candidates {
            let text = match detail::fetch(session, &candidate, self.delays.detail).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        source = adapter.source_id,
                        title = candidate.title.as_str(),
                        error = %e,
                        "Fetch failed, skipping posting"
                    );
                    stats.postings_skipped += 1;
                    continue;
                }
            };

            let evaluation = self.scorer.evaluate(&text).await?;
            info!(
                source = adapter.source_id,
                title = candidate.title.as_str(),
                score = evaluation.score,
                "Posting scored"
            );
            aggregator.record(EvaluationResult {
                source_id: adapter.source_id.to_string(),
                title: candidate.title,
                score: evaluation.score,
                analysis: evaluation.analysis,
            });
            stats.postings_scored += 1;

            tokio::time::sleep(self.delays.between_candidates).await;
        }

        Ok(())
    }
}
