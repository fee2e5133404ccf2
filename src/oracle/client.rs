//! Ollama-backed implementation of the analysis stages.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::recon::EventRecord;

use super::parser;
use super::prompt;
use super::types::{
    AnalysisOracle, BreakRecord, Conclusion, CriticVerdict, EvidenceReport, PriorityAssessment,
};
use super::OracleError;

/// Environment variables consulted by [`OracleConfig::from_env`].
pub const ENV_ORACLE_URL: &str = "DIVRECON_ORACLE_URL";
pub const ENV_ORACLE_MODEL: &str = "DIVRECON_ORACLE_MODEL";
pub const ENV_CRITIC_MODEL: &str = "DIVRECON_CRITIC_MODEL";

const DEFAULT_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1:8b";
/// Per-request ceiling. The pipeline applies its own per-event deadline on
/// top of this.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the analysis endpoint.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    /// The critic cross-checks the analyst's work, so it may run a
    /// stronger model than the other stages.
    pub critic_model: String,
    pub request_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            critic_model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl OracleConfig {
    /// Read settings from the environment, falling back to local defaults.
    /// An unset critic model falls back to the main model.
    pub fn from_env() -> Self {
        let model =
            std::env::var(ENV_ORACLE_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            base_url: std::env::var(ENV_ORACLE_URL).unwrap_or_else(|_| DEFAULT_URL.to_string()),
            critic_model: std::env::var(ENV_CRITIC_MODEL).unwrap_or_else(|_| model.clone()),
            model,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// HTTP client for a local Ollama instance.
pub struct OllamaOracle {
    base_url: String,
    model: String,
    critic_model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OllamaOracle {
    pub fn new(config: OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            critic_model: config.critic_model,
            client,
            timeout_secs: config.request_timeout_secs,
        }
    }

    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() {
                    OracleError::Connection(self.base_url.clone())
                } else if err.is_timeout() {
                    OracleError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    OracleError::HttpClient(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| OracleError::MalformedResponse(err.to_string()))?;

        Ok(parsed.response)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, OracleError> {
    serde_json::to_string_pretty(value).map_err(|err| OracleError::Encode(err.to_string()))
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl AnalysisOracle for OllamaOracle {
    async fn gather_evidence(
        &self,
        event: &EventRecord,
        prior: Option<&EvidenceReport>,
        feedback: Option<&str>,
    ) -> Result<EvidenceReport, OracleError> {
        let event_json = encode(event)?;
        let prior_json = match prior {
            Some(report) => Some(encode(report)?),
            None => None,
        };
        let prompt =
            prompt::build_evidence_prompt(&event_json, prior_json.as_deref(), feedback);
        let response = self
            .generate(&self.model, prompt::EVIDENCE_SYSTEM_PROMPT, &prompt)
            .await?;
        parser::parse_evidence(&response)
    }

    async fn review_evidence(
        &self,
        event: &EventRecord,
        report: &EvidenceReport,
    ) -> Result<CriticVerdict, OracleError> {
        let prompt = prompt::build_critic_prompt(&encode(event)?, &encode(report)?);
        let response = self
            .generate(&self.critic_model, prompt::CRITIC_SYSTEM_PROMPT, &prompt)
            .await?;
        parser::parse_verdict(&response)
    }

    async fn conclude(
        &self,
        event: &EventRecord,
        report: &EvidenceReport,
    ) -> Result<Conclusion, OracleError> {
        let prompt = prompt::build_conclusion_prompt(
            &encode(event)?,
            &encode(&report.evidence)?,
            &report.hypothesis,
        );
        let response = self
            .generate(&self.model, prompt::CONCLUSION_SYSTEM_PROMPT, &prompt)
            .await?;
        parser::parse_conclusion(&response)
    }

    async fn prioritize(&self, record: &BreakRecord) -> Result<PriorityAssessment, OracleError> {
        let prompt = prompt::build_priority_prompt(
            &record.event_key,
            &record.classification,
            &record.root_cause_summary,
            &encode(&record.event)?,
        );
        let response = self
            .generate(&self.model, prompt::PRIORITY_SYSTEM_PROMPT, &prompt)
            .await?;
        parser::parse_priority(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let oracle = OllamaOracle::new(OracleConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..OracleConfig::default()
        });
        assert_eq!(oracle.base_url, "http://localhost:11434");
    }

    #[test]
    fn default_config_points_at_local_ollama() {
        let config = OracleConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, config.critic_model);
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn env_config_falls_back_and_reuses_model_for_critic() {
        // Single test covers all the env combinations to avoid races on
        // process-wide environment state.
        std::env::remove_var(ENV_ORACLE_URL);
        std::env::remove_var(ENV_ORACLE_MODEL);
        std::env::remove_var(ENV_CRITIC_MODEL);

        let config = OracleConfig::from_env();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.critic_model, config.model);

        std::env::set_var(ENV_ORACLE_MODEL, "qwen2.5:14b");
        let config = OracleConfig::from_env();
        assert_eq!(config.model, "qwen2.5:14b");
        assert_eq!(config.critic_model, "qwen2.5:14b");

        std::env::set_var(ENV_CRITIC_MODEL, "qwen2.5:72b");
        let config = OracleConfig::from_env();
        assert_eq!(config.critic_model, "qwen2.5:72b");

        std::env::remove_var(ENV_ORACLE_MODEL);
        std::env::remove_var(ENV_CRITIC_MODEL);
    }
}
