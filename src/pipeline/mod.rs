pub mod controller;
pub mod rank;
pub mod runner;

pub use controller::*;
pub use rank::*;
pub use runner::*;

use std::fmt;

use thiserror::Error;

use crate::oracle::OracleError;

/// Analysis stage names, for failure reporting and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Evidence,
    Critic,
    Conclusion,
    Priority,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Evidence => write!(f, "evidence"),
            Stage::Critic => write!(f, "critic"),
            Stage::Conclusion => write!(f, "conclusion"),
            Stage::Priority => write!(f, "priority"),
        }
    }
}

/// Why one event's analysis was abandoned. The event is skipped; the run
/// carries on with the rest.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct EventFailure {
    pub stage: Stage,
    #[source]
    pub source: OracleError,
}
