//! Extraction of stage records from raw model responses.

use serde::de::DeserializeOwned;

use super::types::{Conclusion, CriticVerdict, EvidenceReport, PriorityAssessment};
use super::OracleError;

/// Pull the JSON object out of a model response.
///
/// A fenced ```json block wins when present; otherwise the outermost
/// braces are taken, so prose before or after the object is tolerated.
pub fn extract_json_object(response: &str) -> Result<&str, OracleError> {
    if let Some(fence) = response.find("```json") {
        let content_start = fence + "```json".len();
        if let Some(fence_len) = response[content_start..].find("```") {
            return Ok(response[content_start..content_start + fence_len].trim());
        }
    }

    let start = response
        .find('{')
        .ok_or_else(|| OracleError::MalformedResponse(preview(response)))?;
    let end = response
        .rfind('}')
        .filter(|end| *end >= start)
        .ok_or_else(|| OracleError::MalformedResponse(preview(response)))?;

    Ok(response[start..=end].trim())
}

fn preview(response: &str) -> String {
    let trimmed = response.trim();
    if trimmed.chars().count() <= 80 {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(80).collect();
    cut.push_str("...");
    cut
}

fn parse_stage<T: DeserializeOwned>(response: &str, stage: &'static str) -> Result<T, OracleError> {
    let json = extract_json_object(response)?;
    serde_json::from_str(json).map_err(|err| OracleError::SchemaMismatch {
        stage,
        detail: err.to_string(),
    })
}

pub fn parse_evidence(response: &str) -> Result<EvidenceReport, OracleError> {
    parse_stage(response, "evidence")
}

pub fn parse_verdict(response: &str) -> Result<CriticVerdict, OracleError> {
    parse_stage(response, "critic")
}

pub fn parse_conclusion(response: &str) -> Result<Conclusion, OracleError> {
    parse_stage(response, "conclusion")
}

pub fn parse_priority(response: &str) -> Result<PriorityAssessment, OracleError> {
    parse_stage(response, "priority")
}
