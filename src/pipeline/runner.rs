//! Whole-run orchestration: every event through the staged analysis with
//! bounded concurrency, then a priority pass over the confirmed breaks.

use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::oracle::{AnalysisOracle, BreakRecord, PriorityAssessment};
use crate::recon::EventRecord;

use super::controller::{EventOutcome, EventProcessor};
use super::rank::rank_breaks;

/// One event that could not be analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEvent {
    pub event_key: String,
    pub reason: String,
}

/// Everything a finished run produced.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub events_examined: usize,
    /// Confirmed breaks, highest priority first.
    pub breaks: Vec<BreakRecord>,
    pub failed: Vec<FailedEvent>,
    pub duration_ms: u64,
}

/// Runs the staged analysis across events.
pub struct PipelineRunner {
    oracle: Arc<dyn AnalysisOracle>,
    config: RunConfig,
}

impl PipelineRunner {
    pub fn new(oracle: Arc<dyn AnalysisOracle>, config: RunConfig) -> Self {
        Self { oracle, config }
    }

    /// Analyze every event and rank the confirmed breaks.
    ///
    /// Events run concurrently but results fold back in input order, so
    /// equal-priority breaks keep the event order of the extracts. One
    /// event failing or timing out never stops the run.
    pub async fn run(&self, events: Vec<EventRecord>) -> RunSummary {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let events_examined = events.len();
        let timeout = self.config.event_timeout;
        let max_rounds = self.config.max_critic_iterations;
        let parallelism = self.config.parallelism.max(1);

        tracing::info!(
            %run_id,
            events = events_examined,
            parallelism,
            "Reconciliation run starting"
        );

        let outcomes = stream::iter(events.into_iter().map(|event| {
            let oracle = Arc::clone(&self.oracle);
            async move {
                let event_key = event.event_key.clone();
                let processor = EventProcessor::new(oracle.as_ref(), max_rounds);
                let outcome = tokio::time::timeout(timeout, processor.process(&event)).await;
                (event_key, outcome)
            }
        }))
        .buffered(parallelism)
        .collect::<Vec<_>>()
        .await;

        let mut breaks = Vec::new();
        let mut failed = Vec::new();
        for (event_key, outcome) in outcomes {
            match outcome {
                Err(_) => {
                    tracing::error!(
                        event_key = %event_key,
                        timeout_secs = timeout.as_secs(),
                        "Event analysis timed out, skipping"
                    );
                    failed.push(FailedEvent {
                        event_key,
                        reason: format!("timed out after {}s", timeout.as_secs()),
                    });
                }
                Ok(Err(failure)) => {
                    tracing::error!(
                        event_key = %event_key,
                        error = %failure,
                        "Event analysis failed, skipping"
                    );
                    failed.push(FailedEvent {
                        event_key,
                        reason: failure.to_string(),
                    });
                }
                Ok(Ok(EventOutcome::NotABreak)) => {
                    tracing::debug!(event_key = %event_key, "No break");
                }
                Ok(Ok(EventOutcome::Break(record))) => {
                    tracing::info!(
                        event_key = %event_key,
                        classification = %record.classification,
                        "Break confirmed"
                    );
                    breaks.push(record);
                }
            }
        }

        let breaks = rank_breaks(self.prioritize_all(breaks).await);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            %run_id,
            breaks = breaks.len(),
            failed = failed.len(),
            duration_ms,
            "Reconciliation run finished"
        );

        RunSummary {
            run_id,
            events_examined,
            breaks,
            failed,
            duration_ms,
        }
    }

    /// Priority pass over confirmed breaks. A failed assessment falls back
    /// to the default instead of dropping the break.
    async fn prioritize_all(&self, breaks: Vec<BreakRecord>) -> Vec<BreakRecord> {
        let parallelism = self.config.parallelism.max(1);
        stream::iter(breaks.into_iter().map(|mut record| {
            let oracle = Arc::clone(&self.oracle);
            async move {
                match oracle.prioritize(&record).await {
                    Ok(assessment) => {
                        tracing::info!(
                            event_key = %record.event_key,
                            priority = %assessment.priority,
                            "Priority assigned"
                        );
                        record.priority = Some(assessment);
                    }
                    Err(err) => {
                        tracing::warn!(
                            event_key = %record.event_key,
                            error = %err,
                            "Priority stage failed, using the default priority"
                        );
                        record.priority = Some(PriorityAssessment::unknown());
                    }
                }
                record
            }
        }))
        .buffered(parallelism)
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, PriorityTier};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn config() -> RunConfig {
        RunConfig {
            max_critic_iterations: 3,
            parallelism: 2,
            event_timeout: Duration::from_secs(5),
        }
    }

    fn events(keys: &[&str]) -> Vec<EventRecord> {
        keys.iter().map(|key| EventRecord::new(*key)).collect()
    }

    #[tokio::test]
    async fn mixed_run_partitions_outcomes() {
        let oracle = Arc::new(
            MockOracle::approving()
                .breaking_only(&["EV1"])
                .failing_events(&["EV3"]),
        );
        let runner = PipelineRunner::new(oracle.clone(), config());

        let summary = runner.run(events(&["EV1", "EV2", "EV3"])).await;

        assert_eq!(summary.events_examined, 3);
        assert_eq!(summary.breaks.len(), 1);
        assert_eq!(summary.breaks[0].event_key, "EV1");
        assert!(summary.breaks[0].priority.is_some());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].event_key, "EV3");
        assert!(summary.failed[0].reason.contains("evidence stage failed"));
        assert_eq!(oracle.priority_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn priority_failure_falls_back_to_default() {
        let oracle = Arc::new(MockOracle::breaking("Tax Discrepancy").failing_priority());
        let runner = PipelineRunner::new(oracle, config());

        let summary = runner.run(events(&["EV1"])).await;

        assert_eq!(summary.breaks.len(), 1);
        let assessment = summary.breaks[0].priority.as_ref().unwrap();
        assert_eq!(assessment.priority, PriorityTier::Medium);
        assert_eq!(assessment.materiality, "Unknown");
        assert_eq!(assessment.consequence, "Unknown");
    }

    #[tokio::test]
    async fn slow_event_times_out_and_is_skipped() {
        let oracle = Arc::new(MockOracle::breaking("x").with_delay(Duration::from_millis(200)));
        let runner = PipelineRunner::new(
            oracle,
            RunConfig {
                event_timeout: Duration::from_millis(50),
                ..config()
            },
        );

        let summary = runner.run(events(&["EV1"])).await;

        assert!(summary.breaks.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn equal_priority_breaks_keep_event_order() {
        let oracle = Arc::new(
            MockOracle::breaking("Data Quality").with_priority(PriorityTier::High),
        );
        let runner = PipelineRunner::new(oracle, config());

        let summary = runner.run(events(&["EV1", "EV2", "EV3"])).await;

        let keys: Vec<&str> = summary
            .breaks
            .iter()
            .map(|record| record.event_key.as_str())
            .collect();
        assert_eq!(keys, ["EV1", "EV2", "EV3"]);
    }

    #[tokio::test]
    async fn empty_run_finishes_clean() {
        let oracle = Arc::new(MockOracle::approving());
        let runner = PipelineRunner::new(oracle, config());

        let summary = runner.run(Vec::new()).await;

        assert_eq!(summary.events_examined, 0);
        assert!(summary.breaks.is_empty());
        assert!(summary.failed.is_empty());
    }
}
