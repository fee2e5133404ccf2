//! Per-event staged analysis.
//!
//! One event moves Gathering → Reviewing, looping back to Gathering while
//! the critic rejects, then Concluding. The loop is bounded: running out
//! of rounds is an ordinary transition to Concluding with the last report,
//! not an error. Only a stage failure abandons the event.

use crate::oracle::{AnalysisOracle, BreakRecord, EvidenceReport};
use crate::recon::EventRecord;

use super::{EventFailure, Stage};

/// Final verdict for one event.
#[derive(Debug)]
pub enum EventOutcome {
    Break(BreakRecord),
    NotABreak,
}

enum AnalysisState {
    Gathering {
        iteration: u32,
        prior: Option<EvidenceReport>,
        feedback: Option<String>,
    },
    Reviewing {
        iteration: u32,
        report: EvidenceReport,
    },
    Concluding {
        report: EvidenceReport,
    },
}

/// Drives one event through evidence, review and conclusion.
pub struct EventProcessor<'a> {
    oracle: &'a dyn AnalysisOracle,
    max_critic_iterations: u32,
}

impl<'a> EventProcessor<'a> {
    /// At least one evidence/review round always runs; a cap of 0 is
    /// clamped to 1.
    pub fn new(oracle: &'a dyn AnalysisOracle, max_critic_iterations: u32) -> Self {
        Self {
            oracle,
            max_critic_iterations: max_critic_iterations.max(1),
        }
    }

    pub async fn process(&self, event: &EventRecord) -> Result<EventOutcome, EventFailure> {
        let mut state = AnalysisState::Gathering {
            iteration: 0,
            prior: None,
            feedback: None,
        };

        loop {
            state = match state {
                AnalysisState::Gathering {
                    iteration,
                    prior,
                    feedback,
                } => {
                    let report = self
                        .oracle
                        .gather_evidence(event, prior.as_ref(), feedback.as_deref())
                        .await
                        .map_err(|source| EventFailure {
                            stage: Stage::Evidence,
                            source,
                        })?;
                    tracing::debug!(
                        event_key = %event.event_key,
                        round = iteration + 1,
                        points = report.evidence.len(),
                        "Evidence gathered"
                    );
                    AnalysisState::Reviewing { iteration, report }
                }

                AnalysisState::Reviewing { iteration, report } => {
                    let verdict = self
                        .oracle
                        .review_evidence(event, &report)
                        .await
                        .map_err(|source| EventFailure {
                            stage: Stage::Critic,
                            source,
                        })?;
                    let round = iteration + 1;

                    if verdict.approved {
                        tracing::info!(
                            event_key = %event.event_key,
                            rounds = round,
                            "Evidence approved by critic"
                        );
                        AnalysisState::Concluding { report }
                    } else if round >= self.max_critic_iterations {
                        tracing::warn!(
                            event_key = %event.event_key,
                            rounds = round,
                            "Critic never approved within the round cap, concluding with the last report"
                        );
                        AnalysisState::Concluding { report }
                    } else {
                        if verdict.feedback.trim().is_empty() {
                            tracing::debug!(
                                event_key = %event.event_key,
                                round,
                                "Rejected without feedback, iterating anyway"
                            );
                        } else {
                            tracing::debug!(
                                event_key = %event.event_key,
                                round,
                                feedback_chars = verdict.feedback.len(),
                                "Rejected, iterating"
                            );
                        }
                        // Only the latest report and feedback carry over.
                        AnalysisState::Gathering {
                            iteration: round,
                            prior: Some(report),
                            feedback: Some(verdict.feedback),
                        }
                    }
                }

                AnalysisState::Concluding { report } => {
                    let conclusion = self
                        .oracle
                        .conclude(event, &report)
                        .await
                        .map_err(|source| EventFailure {
                            stage: Stage::Conclusion,
                            source,
                        })?;
                    tracing::info!(
                        event_key = %event.event_key,
                        is_break = conclusion.is_break,
                        classification = %conclusion.classification,
                        "Conclusion reached"
                    );
                    return Ok(if conclusion.is_break {
                        EventOutcome::Break(BreakRecord::from_conclusion(event, conclusion))
                    } else {
                        EventOutcome::NotABreak
                    });
                }
            };
        }
    }
}
