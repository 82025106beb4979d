//! Whole-program pointer analysis engine
//!
//! Feature-first layout:
//! - `shared/`   : the arena-backed program model (classes, methods, statements)
//! - `features/` : vertical slices (pointer analysis → taint tracking)
//!
//! The core is a context-sensitive inclusion-based points-to solver with
//! on-the-fly call-graph construction: call-target resolution for virtual
//! calls depends on the points-to sets being computed, so both are solved in
//! one worklist fixpoint. A taint plugin rides on the same worklist to track
//! untrusted-data flow from configured source calls to configured sink
//! arguments.
//!
//! # Usage
//! ```text
//! let program = /* ProgramBuilder … */;
//! let config = AnalysisConfig::new(ContextPolicy::CallSite { k: 1 });
//! let result = PointerAnalysis::new(config).analyze(&program)?;
//! assert!(!result.var_points_to(v).is_empty());
//! ```

pub mod errors;
pub mod features;
pub mod shared;

pub use errors::{AnalysisError, AnalysisResult};
pub use features::pta::application::analyzer::{AnalysisConfig, ContextPolicy, PointerAnalysis};
pub use features::pta::application::result::{
    FieldAccess, IndexValue, PointerAnalysisResult,
};
pub use features::pta::domain::call_graph::{CallEdge, CsCallSite, CsMethod};
pub use features::pta::domain::context::ContextId;
pub use features::pta::domain::element::ObjId;
pub use features::taint::domain::flow::TaintFlow;
pub use features::taint::domain::rules::{TaintConfig, TaintConfigError, TaintRules};
pub use shared::{CallKind, ClassId, FieldId, InvokeId, MethodId, Program, ProgramBuilder, TypeId, VarId};
