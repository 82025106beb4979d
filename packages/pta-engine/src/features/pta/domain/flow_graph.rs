//! Pointer flow graph
//!
//! Directed graph over pointer nodes; an edge `s → t` means "whatever `s`
//! may point to, `t` may point to". Cycles are expected (mutual aliasing);
//! termination comes from the monotone growth of points-to sets, not from
//! any acyclicity assumption.

use crate::features::pta::domain::element::PointerId;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    succs: FxHashMap<PointerId, FxHashSet<PointerId>>,
    edge_count: usize,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `source → target`; returns true iff the edge is new.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        let added = self.succs.entry(source).or_default().insert(target);
        if added {
            self.edge_count += 1;
        }
        added
    }

    pub fn successors(&self, pointer: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.succs
            .get(&pointer)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn has_edge(&self, source: PointerId, target: PointerId) -> bool {
        self.succs
            .get(&source)
            .is_some_and(|s| s.contains(&target))
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_are_rejected() {
        let mut pfg = PointerFlowGraph::new();
        assert!(pfg.add_edge(PointerId(0), PointerId(1)));
        assert!(!pfg.add_edge(PointerId(0), PointerId(1)));
        assert_eq!(pfg.edge_count(), 1);
    }

    #[test]
    fn cycles_are_representable() {
        let mut pfg = PointerFlowGraph::new();
        assert!(pfg.add_edge(PointerId(0), PointerId(1)));
        assert!(pfg.add_edge(PointerId(1), PointerId(0)));
        assert!(pfg.has_edge(PointerId(0), PointerId(1)));
        assert!(pfg.has_edge(PointerId(1), PointerId(0)));
    }

    #[test]
    fn successors_of_unknown_pointer_are_empty() {
        let pfg = PointerFlowGraph::new();
        assert_eq!(pfg.successors(PointerId(42)).count(), 0);
    }
}
