//! Worklist solver
//!
//! The fixpoint core. Points-to propagation and call-graph construction are
//! mutually dependent — virtual-call targets come from points-to sets, and
//! points-to facts come from statements of reachable methods — so both are
//! driven by one queue of `(pointer, delta)` entries:
//!
//! 1. **Propagate**: the genuinely-new subset Δ of a drained delta is added
//!    to the pointer's set and forwarded to every flow-graph successor. An
//!    empty Δ ends the entry; all work is bounded to strictly new facts.
//! 2. **React**: when a variable pointer grows, its field/array accesses are
//!    wired for each new object, and call sites using it as receiver are
//!    resolved against each new object's runtime type.
//!
//! A method's statements are visited exactly once, when it first becomes
//! reachable. Statement intake seeds allocations, copy edges, static field
//! edges and static calls; instance field/array edges wait for base objects.
//!
//! The loop is single-threaded and free of suspension points: every new fact
//! has its full consequences applied before the next entry is drained. The
//! taint plugin injects its facts through this same worklist.

use crate::errors::AnalysisResult;
use crate::features::pta::application::result::PointerAnalysisResult;
use crate::features::pta::domain::call_graph::{CallEdge, CsCallGraph, CsCallSite, CsMethod};
use crate::features::pta::domain::context::{ContextId, ContextInterner};
use crate::features::pta::domain::element::{CsManager, CsObjId, Pointer, PointerId};
use crate::features::pta::domain::flow_graph::PointerFlowGraph;
use crate::features::pta::domain::points_to_set::PointsToSet;
use crate::features::pta::infrastructure::dispatch::resolve_callee;
use crate::features::pta::infrastructure::heap_model::HeapModel;
use crate::features::pta::infrastructure::selector::ContextSelector;
use crate::features::pta::infrastructure::worklist::WorkList;
use crate::features::taint::infrastructure::plugin::TaintAnalysis;
use crate::shared::{CallKind, InvokeId, MethodId, Program, Stmt, VarId};
use tracing::{debug, info, trace};

/// Counters reported after the fixpoint.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub reachable_methods: usize,
    pub call_edges: usize,
    pub pointers: usize,
    pub objects: usize,
    pub cs_objects: usize,
    pub contexts: usize,
    pub pfg_edges: usize,
    pub worklist_entries: usize,
    pub propagated_objects: usize,
    pub taint_objects: usize,
    pub taint_flows: usize,
    pub duration_ms: f64,
}

pub struct Solver<'p> {
    program: &'p Program,
    selector: Box<dyn ContextSelector>,
    contexts: ContextInterner,
    heap: HeapModel,
    csm: CsManager,
    call_graph: CsCallGraph,
    pfg: PointerFlowGraph,
    worklist: WorkList,
    taint: Option<TaintAnalysis>,
    stats: SolverStats,
}

impl<'p> Solver<'p> {
    pub fn new(
        program: &'p Program,
        selector: Box<dyn ContextSelector>,
        taint: Option<TaintAnalysis>,
    ) -> Self {
        Self {
            program,
            selector,
            contexts: ContextInterner::new(),
            heap: HeapModel::new(),
            csm: CsManager::new(),
            call_graph: CsCallGraph::new(),
            pfg: PointerFlowGraph::new(),
            worklist: WorkList::new(),
            taint,
            stats: SolverStats::default(),
        }
    }

    /// Runs the analysis to its fixpoint and produces the read-only result.
    pub fn solve(mut self) -> AnalysisResult<PointerAnalysisResult<'p>> {
        self.initialize()?;
        self.analyze()?;
        Ok(self.finish())
    }

    fn initialize(&mut self) -> AnalysisResult<()> {
        let entry = CsMethod {
            ctx: self.selector.empty_context(),
            method: self.program.entry(),
        };
        self.call_graph.set_entry(entry);
        self.add_reachable(entry)
    }

    /// Marks a context-qualified method reachable and, on first reachability,
    /// visits its statements.
    fn add_reachable(&mut self, cs_method: CsMethod) -> AnalysisResult<()> {
        if !self.call_graph.add_reachable(cs_method) {
            return Ok(());
        }
        debug!(
            method = self.program.method_name(cs_method.method),
            "newly reachable method"
        );
        let program = self.program;
        for &stmt in &program.method(cs_method.method).stmts {
            self.process_stmt(cs_method, stmt)?;
        }
        Ok(())
    }

    /// Statement intake for a newly reachable method.
    fn process_stmt(&mut self, cs_method: CsMethod, stmt: Stmt) -> AnalysisResult<()> {
        let ctx = cs_method.ctx;
        match stmt {
            Stmt::New(new) => {
                let ty = self.program.class(new.class).ty;
                let obj = self.heap.get_alloc(new.site, ty);
                let heap_ctx = self.selector.select_heap(&mut self.contexts, ctx, obj);
                let cs_obj = self.csm.get_cs_obj(heap_ctx, obj);
                let ptr = self.csm.get_var(ctx, new.lhs);
                self.worklist.add(ptr, PointsToSet::singleton(cs_obj));
            }
            Stmt::Copy(copy) => {
                let src = self.csm.get_var(ctx, copy.rhs);
                let tgt = self.csm.get_var(ctx, copy.lhs);
                self.add_pfg_edge(src, tgt);
            }
            Stmt::LoadStatic(load) => {
                let src = self.csm.get_static_field(load.field);
                let tgt = self.csm.get_var(ctx, load.lhs);
                self.add_pfg_edge(src, tgt);
            }
            Stmt::StoreStatic(store) => {
                let src = self.csm.get_var(ctx, store.rhs);
                let tgt = self.csm.get_static_field(store.field);
                self.add_pfg_edge(src, tgt);
            }
            Stmt::Call(invoke) => {
                if self.program.invoke(invoke).kind == CallKind::Static {
                    self.process_static_call(cs_method, invoke)?;
                }
            }
            // Instance accesses are wired per receiver object, once the base
            // variable's points-to set grows.
            Stmt::LoadField(_) | Stmt::StoreField(_) | Stmt::LoadArray(_) | Stmt::StoreArray(_) => {}
        }
        Ok(())
    }

    /// Static calls need no receiver and are resolved once, at intake.
    fn process_static_call(&mut self, caller: CsMethod, invoke: InvokeId) -> AnalysisResult<()> {
        let Some(callee) = resolve_callee(self.program, None, invoke)? else {
            return Ok(());
        };
        let call_site = CsCallSite {
            ctx: caller.ctx,
            site: invoke,
        };
        let callee_ctx =
            self.selector
                .select_static(&mut self.contexts, caller.ctx, invoke, callee);
        let cs_callee = CsMethod {
            ctx: callee_ctx,
            method: callee,
        };
        let edge = CallEdge {
            kind: CallKind::Static,
            call_site,
            callee: cs_callee,
        };
        if self.call_graph.add_edge(edge) {
            self.add_reachable(cs_callee)?;
            self.wire_invoke(call_site, cs_callee);
            self.taint_on_new_edge(edge);
        }
        Ok(())
    }

    /// Adds `source → target` to the flow graph; if the edge is new, the
    /// source's existing points-to set flows to the target immediately.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            let pts = self.csm.points_to(source);
            if !pts.is_empty() {
                let pts = pts.clone();
                self.worklist.add(target, pts);
            }
        }
    }

    /// Drains the worklist to the fixpoint.
    fn analyze(&mut self) -> AnalysisResult<()> {
        while let Some(entry) = self.worklist.poll() {
            self.stats.worklist_entries += 1;
            let delta = self.propagate(entry.pointer, &entry.pts);
            if delta.is_empty() {
                continue;
            }
            if let Pointer::Var { ctx, var } = self.csm.pointer(entry.pointer) {
                self.react_to_growth(ctx, var, &delta)?;
            }
        }
        Ok(())
    }

    /// Adds the new objects to `pointer`'s set; forwards the genuinely-new
    /// subset to every flow-graph successor.
    fn propagate(&mut self, pointer: PointerId, pts: &PointsToSet) -> PointsToSet {
        let mut delta = PointsToSet::new();
        for obj in pts.iter() {
            if self.csm.add_points_to(pointer, obj) {
                delta.add(obj);
                self.stats.propagated_objects += 1;
            }
        }
        if !delta.is_empty() {
            let succs: Vec<PointerId> = self.pfg.successors(pointer).collect();
            for succ in succs {
                self.worklist.add(succ, delta.clone());
            }
        }
        delta
    }

    /// Wires field/array accesses and resolves receiver calls for each
    /// object newly pointed to by `var`.
    fn react_to_growth(
        &mut self,
        ctx: ContextId,
        var: VarId,
        delta: &PointsToSet,
    ) -> AnalysisResult<()> {
        let program = self.program;
        let uses = &program.var(var).uses;
        for cs_obj in delta.iter() {
            for load in &uses.load_fields {
                let src = self.csm.get_instance_field(cs_obj, load.field);
                let tgt = self.csm.get_var(ctx, load.lhs);
                self.add_pfg_edge(src, tgt);
            }
            for store in &uses.store_fields {
                let src = self.csm.get_var(ctx, store.rhs);
                let tgt = self.csm.get_instance_field(cs_obj, store.field);
                self.add_pfg_edge(src, tgt);
            }
            for load in &uses.load_arrays {
                let src = self.csm.get_array_index(cs_obj);
                let tgt = self.csm.get_var(ctx, load.lhs);
                self.add_pfg_edge(src, tgt);
            }
            for store in &uses.store_arrays {
                let src = self.csm.get_var(ctx, store.rhs);
                let tgt = self.csm.get_array_index(cs_obj);
                self.add_pfg_edge(src, tgt);
            }
            self.process_call(ctx, var, cs_obj)?;
        }
        Ok(())
    }

    /// Resolves every call site using `recv_var` as receiver against the
    /// newly discovered receiver object.
    fn process_call(
        &mut self,
        caller_ctx: ContextId,
        recv_var: VarId,
        recv_obj: CsObjId,
    ) -> AnalysisResult<()> {
        let program = self.program;
        for &invoke in &program.var(recv_var).uses.invokes {
            let recv = self.csm.cs_obj(recv_obj);
            let recv_class = program.class_of_type(self.heap.obj(recv.obj).ty);
            let Some(callee) = resolve_callee(program, recv_class, invoke)? else {
                trace!(site = invoke.0, "dispatch miss, receiver skipped");
                continue;
            };
            let call_site = CsCallSite {
                ctx: caller_ctx,
                site: invoke,
            };
            let callee_ctx = self.selector.select_instance(
                &mut self.contexts,
                caller_ctx,
                invoke,
                recv,
                callee,
            );
            let cs_callee = CsMethod {
                ctx: callee_ctx,
                method: callee,
            };
            // Every new receiver object flows into the callee's `this`,
            // whether or not the call edge itself is new.
            if let Some(this_var) = program.method(callee).this_var {
                let this_ptr = self.csm.get_var(callee_ctx, this_var);
                self.worklist.add(this_ptr, PointsToSet::singleton(recv_obj));
            }
            let edge = CallEdge {
                kind: program.invoke(invoke).kind,
                call_site,
                callee: cs_callee,
            };
            if self.call_graph.add_edge(edge) {
                self.add_reachable(cs_callee)?;
                self.wire_invoke(call_site, cs_callee);
                self.taint_on_new_edge(edge);
            }
            self.taint_transfers(callee, call_site);
        }
        Ok(())
    }

    /// Argument/parameter and return/result wiring for a new call edge.
    /// Arguments and the result live in the caller's context; parameters and
    /// return variables in the callee's.
    fn wire_invoke(&mut self, call_site: CsCallSite, callee: CsMethod) {
        let program = self.program;
        let inv = program.invoke(call_site.site);
        let callee_m = program.method(callee.method);
        for (&arg, &param) in inv.args.iter().zip(&callee_m.params) {
            let arg_ptr = self.csm.get_var(call_site.ctx, arg);
            let param_ptr = self.csm.get_var(callee.ctx, param);
            self.add_pfg_edge(arg_ptr, param_ptr);
        }
        if let Some(result) = inv.result {
            let result_ptr = self.csm.get_var(call_site.ctx, result);
            for &ret in &callee_m.return_vars {
                let ret_ptr = self.csm.get_var(callee.ctx, ret);
                self.add_pfg_edge(ret_ptr, result_ptr);
            }
        }
    }

    fn taint_on_new_edge(&mut self, edge: CallEdge) {
        let Some(taint) = self.taint.as_mut() else {
            return;
        };
        taint.on_new_call_edge(
            self.program,
            edge,
            &mut self.heap,
            &mut self.csm,
            &mut self.worklist,
        );
    }

    fn taint_transfers(&mut self, callee: MethodId, call_site: CsCallSite) {
        let Some(taint) = self.taint.as_mut() else {
            return;
        };
        taint.apply_transfers(
            self.program,
            callee,
            call_site,
            &mut self.heap,
            &mut self.csm,
            &mut self.worklist,
        );
    }

    fn finish(mut self) -> PointerAnalysisResult<'p> {
        let taint_flows = match &self.taint {
            Some(taint) => {
                taint.collect_flows(self.program, &self.call_graph, &self.heap, &self.csm)
            }
            None => Vec::new(),
        };
        self.stats.reachable_methods = self.call_graph.reachable_count();
        self.stats.call_edges = self.call_graph.edge_count();
        self.stats.pointers = self.csm.pointer_count();
        self.stats.objects = self.heap.obj_count();
        self.stats.cs_objects = self.csm.cs_obj_count();
        self.stats.contexts = self.contexts.len();
        self.stats.pfg_edges = self.pfg.edge_count();
        self.stats.taint_objects = self.heap.taint_count();
        self.stats.taint_flows = taint_flows.len();
        info!(
            reachable = self.stats.reachable_methods,
            call_edges = self.stats.call_edges,
            pointers = self.stats.pointers,
            propagated = self.stats.propagated_objects,
            "fixpoint reached"
        );
        PointerAnalysisResult::new(
            self.program,
            self.contexts,
            self.csm,
            self.heap,
            self.call_graph,
            self.pfg,
            taint_flows,
            self.stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pta::infrastructure::selector::ContextInsensitive;
    use crate::shared::ProgramBuilder;

    #[test]
    fn empty_entry_reaches_fixpoint() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let main = b.add_static_method(c, "main", &[]);
        b.set_entry(main);
        let program = b.finish().unwrap();

        let solver = Solver::new(&program, Box::new(ContextInsensitive), None);
        let result = solver.solve().unwrap();
        assert_eq!(result.stats.reachable_methods, 1);
        assert_eq!(result.stats.call_edges, 0);
    }

    #[test]
    fn copy_chain_propagates_allocation() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let main = b.add_static_method(c, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        let y = b.add_var(main, "y");
        let z = b.add_var(main, "z");
        b.stmt_new(main, x, c);
        b.stmt_copy(main, y, x);
        b.stmt_copy(main, z, y);
        let program = b.finish().unwrap();

        let solver = Solver::new(&program, Box::new(ContextInsensitive), None);
        let result = solver.solve().unwrap();
        assert_eq!(result.var_points_to(x).len(), 1);
        assert_eq!(result.var_points_to(z), result.var_points_to(x));
    }

    #[test]
    fn instance_field_flow_goes_through_heap() {
        // a.f = x; y = b.f with a, b aliased through one allocation.
        let mut b = ProgramBuilder::new();
        let c = b.add_class("C");
        let v = b.add_class("V");
        let f = b.add_field(c, "f");
        let main = b.add_static_method(c, "main", &[]);
        b.set_entry(main);
        let a = b.add_var(main, "a");
        let b2 = b.add_var(main, "b");
        let x = b.add_var(main, "x");
        let y = b.add_var(main, "y");
        b.stmt_new(main, a, c);
        b.stmt_copy(main, b2, a);
        b.stmt_new(main, x, v);
        b.stmt_store_field(main, a, f, x);
        b.stmt_load_field(main, y, b2, f);
        let program = b.finish().unwrap();

        let solver = Solver::new(&program, Box::new(ContextInsensitive), None);
        let result = solver.solve().unwrap();
        assert_eq!(result.var_points_to(y), result.var_points_to(x));
        assert_eq!(result.var_points_to(y).len(), 1);
    }
}
