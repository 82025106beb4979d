//! Context selectors
//!
//! Pluggable policies mapping a call site (and optionally a receiver object)
//! to the context the callee is analyzed under, plus the heap context for
//! allocations. The solver and the taint plugin never depend on which policy
//! is active; the same inputs must always map to the same context.
//!
//! Policies:
//! - [`ContextInsensitive`]: everything runs under the empty context
//! - [`KCallSite`]: the last k call sites (k-CFA)
//! - [`KObject`]: the last k receiver allocation sites (object sensitivity)

use crate::features::pta::domain::context::{ContextElem, ContextId, ContextInterner};
use crate::features::pta::domain::element::{CsObj, ObjId};
use crate::shared::{InvokeId, MethodId};

pub trait ContextSelector {
    /// Context for the callee of a static call.
    fn select_static(
        &self,
        cx: &mut ContextInterner,
        caller: ContextId,
        site: InvokeId,
        callee: MethodId,
    ) -> ContextId;

    /// Context for the callee of an instance call dispatched on `recv`.
    fn select_instance(
        &self,
        cx: &mut ContextInterner,
        caller: ContextId,
        site: InvokeId,
        recv: CsObj,
        callee: MethodId,
    ) -> ContextId;

    /// Heap context for an allocation in a method running under `method_ctx`.
    fn select_heap(
        &self,
        cx: &mut ContextInterner,
        method_ctx: ContextId,
        obj: ObjId,
    ) -> ContextId;

    /// The designated analysis-root context.
    fn empty_context(&self) -> ContextId {
        ContextId::EMPTY
    }
}

/// Baseline policy: one context for the whole program.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInsensitive;

impl ContextSelector for ContextInsensitive {
    fn select_static(
        &self,
        _cx: &mut ContextInterner,
        _caller: ContextId,
        _site: InvokeId,
        _callee: MethodId,
    ) -> ContextId {
        ContextId::EMPTY
    }

    fn select_instance(
        &self,
        _cx: &mut ContextInterner,
        _caller: ContextId,
        _site: InvokeId,
        _recv: CsObj,
        _callee: MethodId,
    ) -> ContextId {
        ContextId::EMPTY
    }

    fn select_heap(
        &self,
        _cx: &mut ContextInterner,
        _method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        ContextId::EMPTY
    }
}

/// k-limited call-string sensitivity: the callee context is the caller
/// context extended with the call site, truncated to the last k sites.
#[derive(Debug, Clone, Copy)]
pub struct KCallSite {
    pub k: usize,
}

impl KCallSite {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for KCallSite {
    fn select_static(
        &self,
        cx: &mut ContextInterner,
        caller: ContextId,
        site: InvokeId,
        _callee: MethodId,
    ) -> ContextId {
        cx.append_limited(caller, ContextElem::CallSite(site), self.k)
    }

    fn select_instance(
        &self,
        cx: &mut ContextInterner,
        caller: ContextId,
        site: InvokeId,
        _recv: CsObj,
        _callee: MethodId,
    ) -> ContextId {
        cx.append_limited(caller, ContextElem::CallSite(site), self.k)
    }

    fn select_heap(
        &self,
        cx: &mut ContextInterner,
        method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        cx.suffix(method_ctx, self.k.saturating_sub(1))
    }
}

/// k-limited object sensitivity: the callee context is the receiver's heap
/// context extended with the receiver's allocation site. Static calls keep
/// the caller's context (they have no receiver to refine by).
#[derive(Debug, Clone, Copy)]
pub struct KObject {
    pub k: usize,
}

impl KObject {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for KObject {
    fn select_static(
        &self,
        _cx: &mut ContextInterner,
        caller: ContextId,
        _site: InvokeId,
        _callee: MethodId,
    ) -> ContextId {
        caller
    }

    fn select_instance(
        &self,
        cx: &mut ContextInterner,
        _caller: ContextId,
        _site: InvokeId,
        recv: CsObj,
        _callee: MethodId,
    ) -> ContextId {
        cx.append_limited(recv.ctx, ContextElem::Alloc(recv.obj), self.k)
    }

    fn select_heap(
        &self,
        cx: &mut ContextInterner,
        method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        cx.suffix(method_ctx, self.k.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insensitive_always_selects_empty() {
        let mut cx = ContextInterner::new();
        let s = ContextInsensitive;
        let recv = CsObj {
            ctx: ContextId::EMPTY,
            obj: ObjId(0),
        };
        assert_eq!(
            s.select_instance(&mut cx, ContextId::EMPTY, InvokeId(1), recv, MethodId(0)),
            ContextId::EMPTY
        );
        assert_eq!(
            s.select_heap(&mut cx, ContextId::EMPTY, ObjId(0)),
            ContextId::EMPTY
        );
        assert_eq!(cx.len(), 1);
    }

    #[test]
    fn one_call_site_distinguishes_sites() {
        let mut cx = ContextInterner::new();
        let s = KCallSite::new(1);
        let a = s.select_static(&mut cx, ContextId::EMPTY, InvokeId(1), MethodId(0));
        let b = s.select_static(&mut cx, ContextId::EMPTY, InvokeId(2), MethodId(0));
        assert_ne!(a, b);
        // Stable across repeated selection.
        let a2 = s.select_static(&mut cx, ContextId::EMPTY, InvokeId(1), MethodId(0));
        assert_eq!(a, a2);
    }

    #[test]
    fn call_string_is_k_limited() {
        let mut cx = ContextInterner::new();
        let s = KCallSite::new(1);
        let c1 = s.select_static(&mut cx, ContextId::EMPTY, InvokeId(1), MethodId(0));
        let c2 = s.select_static(&mut cx, c1, InvokeId(2), MethodId(0));
        assert_eq!(cx.elements(c2), &[ContextElem::CallSite(InvokeId(2))]);
    }

    #[test]
    fn one_object_uses_receiver_allocation_site() {
        let mut cx = ContextInterner::new();
        let s = KObject::new(1);
        let r1 = CsObj {
            ctx: ContextId::EMPTY,
            obj: ObjId(10),
        };
        let r2 = CsObj {
            ctx: ContextId::EMPTY,
            obj: ObjId(11),
        };
        let a = s.select_instance(&mut cx, ContextId::EMPTY, InvokeId(0), r1, MethodId(0));
        let b = s.select_instance(&mut cx, ContextId::EMPTY, InvokeId(0), r2, MethodId(0));
        assert_ne!(a, b);
        assert_eq!(cx.elements(a), &[ContextElem::Alloc(ObjId(10))]);
    }

    #[test]
    fn heap_context_truncates_to_k_minus_one() {
        let mut cx = ContextInterner::new();
        let s = KCallSite::new(2);
        let c1 = s.select_static(&mut cx, ContextId::EMPTY, InvokeId(1), MethodId(0));
        let c2 = s.select_static(&mut cx, c1, InvokeId(2), MethodId(0));
        let h = s.select_heap(&mut cx, c2, ObjId(0));
        assert_eq!(cx.elements(h), &[ContextElem::CallSite(InvokeId(2))]);

        let s1 = KCallSite::new(1);
        let h1 = s1.select_heap(&mut cx, c1, ObjId(0));
        assert_eq!(h1, ContextId::EMPTY);
    }
}
