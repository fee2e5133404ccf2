//! Records exchanged with the analysis model, and the trait the pipeline
//! drives the stages through.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::recon::EventRecord;

use super::OracleError;

/// Output of the evidence stage: factual observations plus a working
/// hypothesis about what happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceReport {
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub hypothesis: String,
}

/// Output of the critic stage.
///
/// `feedback` is only consulted when `approved` is false; it replaces any
/// earlier feedback wholesale on the next evidence iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticVerdict {
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub feedback: String,
}

/// Output of the conclusion stage: the final break / no-break call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub is_break: bool,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub root_cause_summary: String,
}

/// Priority band for a confirmed break. Ordering is High before Medium
/// before Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    /// Parse a model-produced label. Case and surrounding whitespace are
    /// ignored; anything unrecognized is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(PriorityTier::High),
            "medium" => Some(PriorityTier::Medium),
            "low" => Some(PriorityTier::Low),
            _ => None,
        }
    }

    /// Sort key, smallest first.
    pub fn rank(self) -> u8 {
        match self {
            PriorityTier::High => 0,
            PriorityTier::Medium => 1,
            PriorityTier::Low => 2,
        }
    }
}

impl Default for PriorityTier {
    fn default() -> Self {
        PriorityTier::Medium
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityTier::High => write!(f, "High"),
            PriorityTier::Medium => write!(f, "Medium"),
            PriorityTier::Low => write!(f, "Low"),
        }
    }
}

// The model occasionally invents labels ("Urgent", "critical"). An
// unrecognized label lands on Medium rather than failing the whole
// priority stage.
impl<'de> Deserialize<'de> for PriorityTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(PriorityTier::from_label(&label).unwrap_or_default())
    }
}

/// Output of the priority stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAssessment {
    #[serde(default)]
    pub materiality: String,
    #[serde(default)]
    pub consequence: String,
    #[serde(default)]
    pub priority: PriorityTier,
}

impl PriorityAssessment {
    /// Fallback applied when the priority stage fails. A confirmed break
    /// is never dropped for lack of a priority.
    pub fn unknown() -> Self {
        Self {
            materiality: "Unknown".to_string(),
            consequence: "Unknown".to_string(),
            priority: PriorityTier::Medium,
        }
    }
}

/// A confirmed reconciliation break, carrying the event it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakRecord {
    pub event_key: String,
    pub classification: String,
    pub root_cause_summary: String,
    pub evidence: Vec<String>,
    pub event: EventRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityAssessment>,
}

impl BreakRecord {
    pub fn from_conclusion(event: &EventRecord, conclusion: Conclusion) -> Self {
        Self {
            event_key: event.event_key.clone(),
            classification: conclusion.classification,
            root_cause_summary: conclusion.root_cause_summary,
            evidence: conclusion.evidence,
            event: event.clone(),
            priority: None,
        }
    }
}

/// Staged analysis interface the pipeline drives.
///
/// The production implementation talks to a local Ollama instance; tests
/// inject scripted doubles. Every stage shares [`OracleError`] so the
/// controller never special-cases one stage's failures.
#[async_trait]
pub trait AnalysisOracle: Send + Sync {
    /// Evidence stage. `prior` and `feedback` are both present from the
    /// second critic iteration onward and only ever hold the immediately
    /// preceding attempt.
    async fn gather_evidence(
        &self,
        event: &EventRecord,
        prior: Option<&EvidenceReport>,
        feedback: Option<&str>,
    ) -> Result<EvidenceReport, OracleError>;

    /// Critic stage: cross-check an evidence report against the event.
    async fn review_evidence(
        &self,
        event: &EventRecord,
        report: &EvidenceReport,
    ) -> Result<CriticVerdict, OracleError>;

    /// Conclusion stage: the final break / no-break call.
    async fn conclude(
        &self,
        event: &EventRecord,
        report: &EvidenceReport,
    ) -> Result<Conclusion, OracleError>;

    /// Priority stage, run once per confirmed break.
    async fn prioritize(&self, record: &BreakRecord) -> Result<PriorityAssessment, OracleError>;
}
