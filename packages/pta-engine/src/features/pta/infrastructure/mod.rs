//! Infrastructure for the pointer analysis
//!
//! - **selector**: interchangeable context-sensitivity policies
//! - **heap_model**: allocation-site heap abstraction (and taint minting)
//! - **dispatch**: call-target resolution per call kind
//! - **worklist**: the pending `(pointer, delta)` queue
//! - **solver**: the worklist fixpoint driving everything

pub mod dispatch;
pub mod heap_model;
pub mod selector;
pub mod solver;
pub mod worklist;

pub use heap_model::HeapModel;
pub use selector::{ContextInsensitive, ContextSelector, KCallSite, KObject};
pub use solver::{Solver, SolverStats};
pub use worklist::WorkList;
