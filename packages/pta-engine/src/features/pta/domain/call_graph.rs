//! Context-sensitive call graph
//!
//! Built on the fly while the solver runs: an edge is added the first time a
//! call site is resolved to a target under concrete contexts, and a method's
//! statements are visited exactly once, when it first becomes reachable.
//! Edges and reachability are monotone; nothing is ever removed.

use crate::features::pta::domain::context::ContextId;
use crate::shared::{CallKind, InvokeId, MethodId};
use rustc_hash::{FxHashMap, FxHashSet};

/// A call site qualified by the caller's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsCallSite {
    pub ctx: ContextId,
    pub site: InvokeId,
}

/// A method qualified by its calling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsMethod {
    pub ctx: ContextId,
    pub method: MethodId,
}

/// One discovered call edge. At most one per unique triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub kind: CallKind,
    pub call_site: CsCallSite,
    pub callee: CsMethod,
}

#[derive(Debug, Default)]
pub struct CsCallGraph {
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<CallEdge>,
    callees: FxHashMap<CsCallSite, FxHashSet<CsMethod>>,
    reachable: FxHashSet<CsMethod>,
    reachable_list: Vec<CsMethod>,
    entry: Option<CsMethod>,
}

impl CsCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_entry(&mut self, entry: CsMethod) {
        self.entry = Some(entry);
    }

    pub fn entry(&self) -> Option<CsMethod> {
        self.entry
    }

    /// Adds an edge; returns true iff it was not present.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        self.callees
            .entry(edge.call_site)
            .or_default()
            .insert(edge.callee);
        true
    }

    /// Marks a method reachable; returns true iff it was not already, i.e.
    /// exactly when its statements must be visited.
    pub fn add_reachable(&mut self, method: CsMethod) -> bool {
        if !self.reachable.insert(method) {
            return false;
        }
        self.reachable_list.push(method);
        true
    }

    /// Edges in discovery order.
    #[inline]
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// Reachable context-qualified methods in discovery order.
    #[inline]
    pub fn reachable_methods(&self) -> &[CsMethod] {
        &self.reachable_list
    }

    pub fn is_reachable(&self, method: CsMethod) -> bool {
        self.reachable.contains(&method)
    }

    /// Whether `method` is reachable under any context.
    pub fn is_method_reachable(&self, method: MethodId) -> bool {
        self.reachable_list.iter().any(|m| m.method == method)
    }

    pub fn callees_of(&self, call_site: CsCallSite) -> impl Iterator<Item = CsMethod> + '_ {
        self.callees
            .get(&call_site)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn reachable_count(&self) -> usize {
        self.reachable_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(site: u32, method: u32) -> CallEdge {
        CallEdge {
            kind: CallKind::Virtual,
            call_site: CsCallSite {
                ctx: ContextId::EMPTY,
                site: InvokeId(site),
            },
            callee: CsMethod {
                ctx: ContextId::EMPTY,
                method: MethodId(method),
            },
        }
    }

    #[test]
    fn edges_are_added_at_most_once() {
        let mut cg = CsCallGraph::new();
        assert!(cg.add_edge(edge(0, 1)));
        assert!(!cg.add_edge(edge(0, 1)));
        assert!(cg.add_edge(edge(0, 2)));
        assert_eq!(cg.edge_count(), 2);
    }

    #[test]
    fn reachability_is_monotone_and_reported_once() {
        let mut cg = CsCallGraph::new();
        let m = CsMethod {
            ctx: ContextId::EMPTY,
            method: MethodId(0),
        };
        assert!(cg.add_reachable(m));
        assert!(!cg.add_reachable(m));
        assert!(cg.is_reachable(m));
        assert!(cg.is_method_reachable(MethodId(0)));
        assert!(!cg.is_method_reachable(MethodId(1)));
    }

    #[test]
    fn callees_are_indexed_by_call_site() {
        let mut cg = CsCallGraph::new();
        cg.add_edge(edge(0, 1));
        cg.add_edge(edge(0, 2));
        cg.add_edge(edge(1, 3));
        let site = CsCallSite {
            ctx: ContextId::EMPTY,
            site: InvokeId(0),
        };
        assert_eq!(cg.callees_of(site).count(), 2);
    }
}
