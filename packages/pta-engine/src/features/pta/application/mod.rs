//! Application layer for the pointer analysis
//!
//! - **analyzer**: configuration + entry point (`PointerAnalysis`)
//! - **result**: the read-only view produced after the fixpoint, including
//!   the alias queries consumed by interprocedural client analyses

pub mod analyzer;
pub mod result;

pub use analyzer::{AnalysisConfig, ContextPolicy, PointerAnalysis};
pub use result::{FieldAccess, IndexValue, PointerAnalysisResult};
