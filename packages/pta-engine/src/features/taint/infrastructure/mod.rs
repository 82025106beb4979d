//! Infrastructure for taint tracking
//!
//! The plugin observing the solver: it injects and propagates taint objects
//! through the solver's own worklist and scans the finished call graph for
//! sink hits.

pub mod plugin;

pub use plugin::TaintAnalysis;
