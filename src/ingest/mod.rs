pub mod reader;

pub use reader::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("Malformed CSV in {path}: {source}")]
    Parse { path: String, source: csv::Error },

    #[error("{path} has no header row")]
    MissingHeader { path: String },
}
