//! Scripted stand-in for the analysis endpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::recon::EventRecord;

use super::types::{
    AnalysisOracle, BreakRecord, Conclusion, CriticVerdict, EvidenceReport, PriorityAssessment,
    PriorityTier,
};
use super::OracleError;

/// Scripted oracle for tests.
///
/// Stage behavior is fixed up front through the builder methods. Call
/// counters and the most recent reviewer feedback seen by the evidence
/// stage are recorded for assertions.
pub struct MockOracle {
    /// Review call (1-based) that approves; 0 means never approve.
    approve_on: u32,
    is_break: bool,
    /// When set, only these event keys conclude as breaks.
    break_keys: Option<Vec<String>>,
    classification: String,
    root_cause_summary: String,
    priority: PriorityTier,
    /// Feedback handed out with every rejection.
    feedback: String,
    /// Gather call (1-based) that fails; 0 means never.
    fail_evidence_on: u32,
    /// Review call (1-based) that fails; 0 means never.
    fail_review_on: u32,
    fail_conclusion: bool,
    fail_priority: bool,
    /// Events whose evidence stage always fails.
    failing_keys: Vec<String>,
    /// Artificial latency added to every evidence call.
    delay: Option<Duration>,

    pub evidence_calls: AtomicU32,
    pub review_calls: AtomicU32,
    pub conclusion_calls: AtomicU32,
    pub priority_calls: AtomicU32,
    pub last_feedback_seen: Mutex<Option<String>>,
}

impl MockOracle {
    /// Critic approves immediately; conclusion says "no break".
    pub fn approving() -> Self {
        Self {
            approve_on: 1,
            is_break: false,
            break_keys: None,
            classification: "No Issue".to_string(),
            root_cause_summary: "Sources agree".to_string(),
            priority: PriorityTier::Medium,
            feedback: "- tighten the evidence".to_string(),
            fail_evidence_on: 0,
            fail_review_on: 0,
            fail_conclusion: false,
            fail_priority: false,
            failing_keys: Vec::new(),
            delay: None,
            evidence_calls: AtomicU32::new(0),
            review_calls: AtomicU32::new(0),
            conclusion_calls: AtomicU32::new(0),
            priority_calls: AtomicU32::new(0),
            last_feedback_seen: Mutex::new(None),
        }
    }

    /// Critic approves immediately; every event concludes as a break.
    pub fn breaking(classification: &str) -> Self {
        Self {
            is_break: true,
            classification: classification.to_string(),
            root_cause_summary: "Scripted root cause".to_string(),
            ..Self::approving()
        }
    }

    /// Approve on the nth review instead of the first.
    pub fn approve_on(mut self, review_call: u32) -> Self {
        self.approve_on = review_call;
        self
    }

    pub fn never_approving(mut self) -> Self {
        self.approve_on = 0;
        self
    }

    pub fn with_feedback(mut self, feedback: &str) -> Self {
        self.feedback = feedback.to_string();
        self
    }

    pub fn with_priority(mut self, priority: PriorityTier) -> Self {
        self.priority = priority;
        self
    }

    /// Only the listed event keys conclude as breaks.
    pub fn breaking_only(mut self, keys: &[&str]) -> Self {
        self.is_break = true;
        self.break_keys = Some(keys.iter().map(|key| key.to_string()).collect());
        self
    }

    pub fn failing_evidence_on(mut self, call: u32) -> Self {
        self.fail_evidence_on = call;
        self
    }

    pub fn failing_review_on(mut self, call: u32) -> Self {
        self.fail_review_on = call;
        self
    }

    pub fn failing_conclusion(mut self) -> Self {
        self.fail_conclusion = true;
        self
    }

    pub fn failing_priority(mut self) -> Self {
        self.fail_priority = true;
        self
    }

    /// Evidence always fails for the listed event keys.
    pub fn failing_events(mut self, keys: &[&str]) -> Self {
        self.failing_keys = keys.iter().map(|key| key.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn unavailable() -> OracleError {
        OracleError::Connection("mock".to_string())
    }
}

#[async_trait]
impl AnalysisOracle for MockOracle {
    async fn gather_evidence(
        &self,
        event: &EventRecord,
        _prior: Option<&EvidenceReport>,
        feedback: Option<&str>,
    ) -> Result<EvidenceReport, OracleError> {
        let call = self.evidence_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(notes) = feedback {
            if let Ok(mut seen) = self.last_feedback_seen.lock() {
                *seen = Some(notes.to_string());
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_evidence_on == call || self.failing_keys.contains(&event.event_key) {
            return Err(Self::unavailable());
        }
        Ok(EvidenceReport {
            evidence: vec![format!("observation {call} for {}", event.event_key)],
            hypothesis: format!("hypothesis after round {call}"),
        })
    }

    async fn review_evidence(
        &self,
        _event: &EventRecord,
        _report: &EvidenceReport,
    ) -> Result<CriticVerdict, OracleError> {
        let call = self.review_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_review_on == call {
            return Err(Self::unavailable());
        }
        if self.approve_on != 0 && call >= self.approve_on {
            Ok(CriticVerdict {
                approved: true,
                feedback: String::new(),
            })
        } else {
            Ok(CriticVerdict {
                approved: false,
                feedback: self.feedback.clone(),
            })
        }
    }

    async fn conclude(
        &self,
        event: &EventRecord,
        report: &EvidenceReport,
    ) -> Result<Conclusion, OracleError> {
        self.conclusion_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_conclusion {
            return Err(Self::unavailable());
        }
        let is_break = match &self.break_keys {
            Some(keys) => keys.contains(&event.event_key),
            None => self.is_break,
        };
        Ok(Conclusion {
            evidence: report.evidence.clone(),
            is_break,
            classification: self.classification.clone(),
            root_cause_summary: self.root_cause_summary.clone(),
        })
    }

    async fn prioritize(&self, _record: &BreakRecord) -> Result<PriorityAssessment, OracleError> {
        self.priority_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_priority {
            return Err(Self::unavailable());
        }
        Ok(PriorityAssessment {
            materiality: "1 MUSD".to_string(),
            consequence: "Reporting impact".to_string(),
            priority: self.priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn approving_mock_returns_scripted_records() {
        let oracle = MockOracle::approving();
        let event = EventRecord::new("EV1");

        let report = oracle.gather_evidence(&event, None, None).await.unwrap();
        assert_eq!(report.evidence.len(), 1);

        let verdict = oracle.review_evidence(&event, &report).await.unwrap();
        assert!(verdict.approved);

        let conclusion = oracle.conclude(&event, &report).await.unwrap();
        assert!(!conclusion.is_break);
        assert_eq!(oracle.evidence_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejections_carry_feedback_until_approval_round() {
        let oracle = MockOracle::breaking("Tax Discrepancy")
            .approve_on(3)
            .with_feedback("- name the fields");
        let event = EventRecord::new("EV1");
        let report = EvidenceReport::default();

        let first = oracle.review_evidence(&event, &report).await.unwrap();
        assert!(!first.approved);
        assert_eq!(first.feedback, "- name the fields");

        let second = oracle.review_evidence(&event, &report).await.unwrap();
        assert!(!second.approved);

        let third = oracle.review_evidence(&event, &report).await.unwrap();
        assert!(third.approved);
    }

    #[tokio::test]
    async fn scripted_failures_fire_on_the_requested_call() {
        let oracle = MockOracle::approving().failing_evidence_on(2);
        let event = EventRecord::new("EV1");

        assert!(oracle.gather_evidence(&event, None, None).await.is_ok());
        assert!(oracle.gather_evidence(&event, None, None).await.is_err());
        assert!(oracle.gather_evidence(&event, None, None).await.is_ok());
    }
}
