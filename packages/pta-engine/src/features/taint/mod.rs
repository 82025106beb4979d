//! Taint tracking
//!
//! Overlay on the pointer analysis: configured *source* methods produce
//! synthetic taint objects, *transfer* rules move taint between a call's
//! base, arguments and result, and *sink* rules flag arguments that must not
//! receive tainted data. Taint objects travel through the ordinary points-to
//! machinery — the solver cannot tell them apart from real allocations — so
//! every flow finding is backed by a concrete chain through the points-to
//! graph.

pub mod domain;
pub mod infrastructure;

pub use domain::flow::TaintFlow;
pub use domain::rules::{TaintConfig, TaintConfigError, TaintRules};
pub use infrastructure::plugin::TaintAnalysis;
