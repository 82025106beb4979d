//! Analysis result view
//!
//! Read-only once the fixpoint is reached: points-to queries (both the
//! context-sensitive relation and its context-insensitive projection), the
//! discovered call graph, taint findings, and the field/array may-alias
//! tests that interprocedural client analyses build on.

use crate::features::pta::domain::call_graph::CsCallGraph;
use crate::features::pta::domain::context::{ContextId, ContextInterner};
use crate::features::pta::domain::element::{CsManager, ObjId, Pointer, PointerId};
use crate::features::pta::domain::flow_graph::PointerFlowGraph;
use crate::features::pta::infrastructure::heap_model::HeapModel;
use crate::features::pta::infrastructure::solver::SolverStats;
use crate::features::taint::domain::flow::TaintFlow;
use crate::shared::{FieldId, InvokeId, MethodId, Program, VarId};
use rustc_hash::FxHashSet;

/// A field access, as seen by client analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Static(FieldId),
    Instance { base: VarId, field: FieldId },
}

/// Abstract index value of an array access, as computed by an external
/// constant analysis: bottom (`Undef`), a known constant, or not-a-constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexValue {
    Undef,
    Const(i64),
    Nac,
}

impl IndexValue {
    #[inline]
    pub fn is_undef(self) -> bool {
        self == IndexValue::Undef
    }

    #[inline]
    pub fn is_nac(self) -> bool {
        self == IndexValue::Nac
    }

    #[inline]
    pub fn is_constant(self) -> bool {
        matches!(self, IndexValue::Const(_))
    }

    /// Whether two index values may denote the same element: a known
    /// constant only collides with an equal constant, while not-a-constant
    /// collides with anything that is not bottom.
    pub fn compatible(self, other: IndexValue) -> bool {
        match (self, other) {
            (IndexValue::Const(a), IndexValue::Const(b)) => a == b,
            (IndexValue::Nac, o) => !o.is_undef(),
            (s, IndexValue::Nac) => !s.is_undef(),
            _ => false,
        }
    }
}

/// The queryable outcome of one analysis run.
pub struct PointerAnalysisResult<'p> {
    program: &'p Program,
    contexts: ContextInterner,
    csm: CsManager,
    heap: HeapModel,
    call_graph: CsCallGraph,
    pfg: PointerFlowGraph,
    taint_flows: Vec<TaintFlow>,
    pub stats: SolverStats,
}

impl<'p> PointerAnalysisResult<'p> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        program: &'p Program,
        contexts: ContextInterner,
        csm: CsManager,
        heap: HeapModel,
        call_graph: CsCallGraph,
        pfg: PointerFlowGraph,
        taint_flows: Vec<TaintFlow>,
        stats: SolverStats,
    ) -> Self {
        Self {
            program,
            contexts,
            csm,
            heap,
            call_graph,
            pfg,
            taint_flows,
            stats,
        }
    }

    // ── points-to queries ───────────────────────────────────────────────

    /// Context-insensitive projection: every abstract object `var` may point
    /// to, merged over all calling contexts and heap contexts.
    pub fn var_points_to(&self, var: VarId) -> FxHashSet<ObjId> {
        let mut objs = FxHashSet::default();
        for (id, pointer) in self.csm.pointers() {
            if let Pointer::Var { var: v, .. } = pointer {
                if v == var {
                    objs.extend(self.csm.points_to(id).iter().map(|o| self.csm.cs_obj(o).obj));
                }
            }
        }
        objs
    }

    /// Context-sensitive points-to set of `var` under `ctx`; empty if that
    /// pointer was never materialized.
    pub fn cs_var_points_to(&self, ctx: ContextId, var: VarId) -> Vec<ObjId> {
        self.csm
            .lookup_var(ctx, var)
            .map(|p| {
                self.csm
                    .points_to(p)
                    .iter()
                    .map(|o| self.csm.cs_obj(o).obj)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Calling contexts under which `var`'s pointer was materialized.
    pub fn contexts_of_var(&self, var: VarId) -> Vec<ContextId> {
        self.csm
            .pointers()
            .filter_map(|(_, p)| match p {
                Pointer::Var { ctx, var: v } if v == var => Some(ctx),
                _ => None,
            })
            .collect()
    }

    // ── call graph ──────────────────────────────────────────────────────

    pub fn call_graph(&self) -> &CsCallGraph {
        &self.call_graph
    }

    /// Whether any discovered edge goes from a call site in `caller` to
    /// `callee` (contexts merged).
    pub fn calls_between(&self, caller: MethodId, callee: MethodId) -> bool {
        self.call_graph.edges().iter().any(|e| {
            e.callee.method == callee && self.program.invoke(e.call_site.site).caller == caller
        })
    }

    pub fn is_method_reachable(&self, method: MethodId) -> bool {
        self.call_graph.is_method_reachable(method)
    }

    /// Whether the flow graph connects any pointer of `from` to any pointer
    /// of `to` (contexts merged).
    pub fn has_var_flow_edge(&self, from: VarId, to: VarId) -> bool {
        let of = |var: VarId| -> Vec<PointerId> {
            self.csm
                .pointers()
                .filter_map(|(id, p)| match p {
                    Pointer::Var { var: v, .. } if v == var => Some(id),
                    _ => None,
                })
                .collect()
        };
        let froms = of(from);
        let tos = of(to);
        froms
            .iter()
            .any(|&f| tos.iter().any(|&t| self.pfg.has_edge(f, t)))
    }

    // ── taint ───────────────────────────────────────────────────────────

    /// Detected source→sink flows, deduplicated and totally ordered.
    pub fn taint_flows(&self) -> &[TaintFlow] {
        &self.taint_flows
    }

    /// Whether `obj` represents tainted data.
    pub fn is_taint_object(&self, obj: ObjId) -> bool {
        self.heap.is_taint(obj)
    }

    /// The source call site a taint object originated from.
    pub fn taint_source_of(&self, obj: ObjId) -> Option<InvokeId> {
        self.heap.taint_source(obj)
    }

    // ── alias queries ───────────────────────────────────────────────────

    /// May the two field accesses touch the same memory? True iff they name
    /// the same declared field and are either both static or have bases
    /// whose merged points-to sets intersect.
    pub fn fields_may_alias(&self, a: FieldAccess, b: FieldAccess) -> bool {
        match (a, b) {
            (FieldAccess::Static(f1), FieldAccess::Static(f2)) => f1 == f2,
            (
                FieldAccess::Instance { base: b1, field: f1 },
                FieldAccess::Instance { base: b2, field: f2 },
            ) => f1 == f2 && !self.var_points_to(b1).is_disjoint(&self.var_points_to(b2)),
            _ => false,
        }
    }

    /// May the two array accesses touch the same element? True iff the base
    /// variables' merged points-to sets intersect and the abstract index
    /// values are compatible.
    pub fn arrays_may_alias(
        &self,
        base_a: VarId,
        index_a: IndexValue,
        base_b: VarId,
        index_b: IndexValue,
    ) -> bool {
        !self.var_points_to(base_a).is_disjoint(&self.var_points_to(base_b))
            && index_a.compatible(index_b)
    }

    /// Number of distinct contexts created during the run.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_indexes_collide_only_when_equal() {
        assert!(IndexValue::Const(3).compatible(IndexValue::Const(3)));
        assert!(!IndexValue::Const(3).compatible(IndexValue::Const(4)));
    }

    #[test]
    fn nac_collides_with_everything_defined() {
        assert!(IndexValue::Nac.compatible(IndexValue::Const(0)));
        assert!(IndexValue::Const(0).compatible(IndexValue::Nac));
        assert!(IndexValue::Nac.compatible(IndexValue::Nac));
    }

    #[test]
    fn undef_collides_with_nothing() {
        assert!(!IndexValue::Undef.compatible(IndexValue::Undef));
        assert!(!IndexValue::Undef.compatible(IndexValue::Const(1)));
        assert!(!IndexValue::Undef.compatible(IndexValue::Nac));
        assert!(!IndexValue::Nac.compatible(IndexValue::Undef));
    }
}
