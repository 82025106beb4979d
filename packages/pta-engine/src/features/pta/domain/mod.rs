//! Domain model for the pointer analysis
//!
//! Algorithm-independent abstractions:
//! - Context: interned calling/allocation context tokens
//! - Elements: pointers, abstract objects and their interner
//! - PointsToSet: the monotone per-pointer object set
//! - PointerFlowGraph: the directed may-flow relation over pointers
//! - CsCallGraph: context-qualified call edges discovered on the fly

pub mod call_graph;
pub mod context;
pub mod element;
pub mod flow_graph;
pub mod points_to_set;

pub use call_graph::{CallEdge, CsCallGraph, CsCallSite, CsMethod};
pub use context::{ContextElem, ContextId, ContextInterner};
pub use element::{CsManager, CsObj, CsObjId, Obj, ObjId, ObjKind, Pointer, PointerId};
pub use flow_graph::PointerFlowGraph;
pub use points_to_set::PointsToSet;
