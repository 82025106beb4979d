//! Taint plugin
//!
//! Rides on the running pointer analysis without touching its invariants:
//!
//! - on every *new call edge* whose callee matches a source rule, a taint
//!   object tagged with the call site is pushed into the result pointer —
//!   through the shared worklist, never a side channel, so ordering
//!   guarantees hold;
//! - on every call resolution, transfer rules move taint between base,
//!   arguments and result; the injected object is re-tagged with the
//!   *original* source call site, preserving provenance through chains;
//! - after the fixpoint, sink rules are checked against every call edge and
//!   findings are reported in a deterministic total order.
//!
//! Taint objects live under the empty heap context: they model data, not
//! allocation sites, so cloning them per context would only split identical
//! facts.

use crate::features::pta::domain::call_graph::{CallEdge, CsCallGraph, CsCallSite};
use crate::features::pta::domain::context::ContextId;
use crate::features::pta::domain::element::{CsManager, PointerId};
use crate::features::pta::domain::points_to_set::PointsToSet;
use crate::features::pta::infrastructure::heap_model::HeapModel;
use crate::features::pta::infrastructure::worklist::WorkList;
use crate::features::taint::domain::flow::TaintFlow;
use crate::features::taint::domain::rules::{TaintConfig, TransferFrom, TransferTo};
use crate::shared::{InvokeId, MethodId, Program, TypeId};
use std::collections::BTreeSet;
use tracing::debug;

pub struct TaintAnalysis {
    config: TaintConfig,
    injected: usize,
}

impl TaintAnalysis {
    pub fn new(config: TaintConfig) -> Self {
        Self {
            config,
            injected: 0,
        }
    }

    /// Number of taint objects pushed onto the worklist so far.
    pub fn injected(&self) -> usize {
        self.injected
    }

    fn inject(
        &mut self,
        source: InvokeId,
        ty: TypeId,
        target: PointerId,
        heap: &mut HeapModel,
        csm: &mut CsManager,
        worklist: &mut WorkList,
    ) {
        let obj = heap.get_taint(source, ty);
        let cs_obj = csm.get_cs_obj(ContextId::EMPTY, obj);
        worklist.add(target, PointsToSet::singleton(cs_obj));
        self.injected += 1;
    }

    /// Source injection plus a first transfer pass, fired once per new call
    /// edge (this is the only hook static calls get).
    pub fn on_new_call_edge(
        &mut self,
        program: &Program,
        edge: CallEdge,
        heap: &mut HeapModel,
        csm: &mut CsManager,
        worklist: &mut WorkList,
    ) {
        let callee = edge.callee.method;
        let inv = program.invoke(edge.call_site.site);
        if let Some(result) = inv.result {
            for i in 0..self.config.sources.len() {
                let source = self.config.sources[i];
                if source.method != callee || source.ty != program.return_type(callee) {
                    continue;
                }
                debug!(
                    site = %program.invoke_label(edge.call_site.site),
                    "taint source call"
                );
                let result_ptr = csm.get_var(edge.call_site.ctx, result);
                self.inject(edge.call_site.site, source.ty, result_ptr, heap, csm, worklist);
            }
        }
        self.apply_transfers(program, callee, edge.call_site, heap, csm, worklist);
    }

    /// Applies every transfer rule of `callee` whose from-position currently
    /// holds taint. Re-invoked on each call resolution; re-injection of an
    /// already-propagated object is a worklist no-op.
    pub fn apply_transfers(
        &mut self,
        program: &Program,
        callee: MethodId,
        call_site: CsCallSite,
        heap: &mut HeapModel,
        csm: &mut CsManager,
        worklist: &mut WorkList,
    ) {
        let inv = program.invoke(call_site.site);
        let ctx = call_site.ctx;
        for i in 0..self.config.transfers.len() {
            let transfer = self.config.transfers[i];
            if transfer.method != callee {
                continue;
            }
            let from_ptr = match transfer.from {
                TransferFrom::Base => inv.recv.map(|r| csm.get_var(ctx, r)),
                TransferFrom::Arg(idx) => inv.args.get(idx).map(|&a| csm.get_var(ctx, a)),
            };
            let to_ptr = match transfer.to {
                TransferTo::Base => inv.recv.map(|r| csm.get_var(ctx, r)),
                TransferTo::Result => inv.result.map(|r| csm.get_var(ctx, r)),
            };
            let (Some(from), Some(to)) = (from_ptr, to_ptr) else {
                continue;
            };
            // Re-tag with the original source call site, not this call.
            let origins: Vec<InvokeId> = csm
                .points_to(from)
                .iter()
                .filter_map(|o| heap.taint_source(csm.cs_obj(o).obj))
                .collect();
            for origin in origins {
                self.inject(origin, transfer.ty, to, heap, csm, worklist);
            }
        }
    }

    /// Sink scan over the finished call graph.
    pub fn collect_flows(
        &self,
        program: &Program,
        call_graph: &CsCallGraph,
        heap: &HeapModel,
        csm: &CsManager,
    ) -> Vec<TaintFlow> {
        let mut flows = BTreeSet::new();
        for edge in call_graph.edges() {
            let inv = program.invoke(edge.call_site.site);
            for sink in &self.config.sinks {
                if sink.method != edge.callee.method {
                    continue;
                }
                let Some(&arg) = inv.args.get(sink.index) else {
                    continue;
                };
                let Some(arg_ptr) = csm.lookup_var(edge.call_site.ctx, arg) else {
                    continue;
                };
                for cs_obj in csm.points_to(arg_ptr).iter() {
                    if let Some(source) = heap.taint_source(csm.cs_obj(cs_obj).obj) {
                        flows.insert(TaintFlow {
                            source,
                            sink: edge.call_site.site,
                            index: sink.index,
                        });
                    }
                }
            }
        }
        flows.into_iter().collect()
    }
}
