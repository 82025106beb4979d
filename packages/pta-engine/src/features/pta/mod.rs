//! Pointer analysis
//!
//! Inclusion-based whole-program points-to analysis solved together with
//! call-graph discovery in one worklist fixpoint: virtual-call targets depend
//! on points-to sets, and points-to propagation depends on which methods are
//! reachable, so neither can be computed in a separate pass.
//!
//! Context sensitivity is a pluggable policy ([`ContextSelector`]); the
//! context-insensitive variant is the same solver running with the policy
//! that always returns the empty context.
//!
//! # References
//! - Andersen, L. O. "Program Analysis and Specialization for C" (PhD 1994)
//! - Smaragdakis & Balatsouras "Pointer Analysis" (FnT PL 2015)
//! - Milanova et al. "Parameterized Object Sensitivity" (TOSEM 2005)
//!
//! [`ContextSelector`]: infrastructure::selector::ContextSelector

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::analyzer::{AnalysisConfig, ContextPolicy, PointerAnalysis};
pub use application::result::PointerAnalysisResult;
pub use domain::call_graph::{CallEdge, CsCallGraph, CsCallSite, CsMethod};
pub use domain::context::{ContextElem, ContextId, ContextInterner};
pub use domain::element::{CsManager, CsObj, CsObjId, Obj, ObjId, ObjKind, Pointer, PointerId};
pub use domain::points_to_set::PointsToSet;
