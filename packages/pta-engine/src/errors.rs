//! Error types for analysis runs
//!
//! Configuration errors are fatal and reported once; there is no partial
//! success for a single analysis run. Virtual/interface dispatch misses are
//! not errors (they are skipped inside the solver).

use crate::features::taint::domain::rules::TaintConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("program has no entry method")]
    NoEntryMethod,

    #[error("unresolved static call target {class}.{sig}")]
    UnresolvedStaticCall { class: String, sig: String },

    #[error("unresolved special call target {class}.{sig}")]
    UnresolvedSpecialCall { class: String, sig: String },

    #[error("taint configuration: {0}")]
    TaintConfig(#[from] TaintConfigError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
