//! Dividend reconciliation engine.
//!
//! Two dividend extracts, an internal ledger and a custodian statement,
//! are read from semicolon-separated files, normalized into a shared
//! vocabulary and aggregated per corporate action event. Each event with
//! field-level discrepancies is handed to a staged language-model
//! analysis (evidence, critic review, conclusion) and confirmed breaks
//! are prioritized and ranked into an operator-facing report.

pub mod config;
pub mod ingest;
pub mod oracle;
pub mod pipeline;
pub mod recon;
pub mod report;

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
