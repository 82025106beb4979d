//! Domain model for taint tracking
//!
//! - rules: the externally loaded source/sink/transfer tables and their
//!   resolution against the program
//! - flow: one reported source→sink finding

pub mod flow;
pub mod rules;

pub use flow::TaintFlow;
pub use rules::{TaintConfig, TaintConfigError, TaintRules};
