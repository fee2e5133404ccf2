pub mod client;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod types;

pub use client::*;
pub use mock::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;

use thiserror::Error;

/// One error type for every analysis stage.
///
/// The pipeline handles every variant the same way, so no stage ends up
/// with special recovery handling by accident.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Analysis endpoint is not reachable at {0}")]
    Connection(String),

    #[error("Analysis endpoint returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("No JSON object in model response: {0}")]
    MalformedResponse(String),

    #[error("Model response does not fit the {stage} schema: {detail}")]
    SchemaMismatch { stage: &'static str, detail: String },

    #[error("Failed to encode request payload: {0}")]
    Encode(String),
}
