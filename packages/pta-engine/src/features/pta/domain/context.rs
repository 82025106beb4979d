//! Analysis contexts
//!
//! A context is an opaque, comparable token distinguishing analysis facts for
//! the same syntactic entity by calling/allocation history. The solver never
//! inspects a context's structure; only the [`ContextSelector`] policies
//! construct them. Contexts are interned so equality is index equality and
//! the context space stays finite under any k-limited policy.
//!
//! [`ContextSelector`]: crate::features::pta::infrastructure::selector::ContextSelector

use crate::features::pta::domain::element::ObjId;
use crate::shared::{define_id, InvokeId};
use rustc_hash::FxHashMap;

define_id!(
    /// An interned context. `ContextId::EMPTY` is the analysis root.
    ContextId
);

impl ContextId {
    pub const EMPTY: ContextId = ContextId(0);
}

/// One element of a context string: a call site (call-string sensitivity) or
/// an allocation site (object sensitivity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextElem {
    CallSite(InvokeId),
    Alloc(ObjId),
}

/// Interner for context strings. The empty context is pre-interned at
/// index 0 and never evicted; repeated interning of structurally-equal
/// strings returns the cached id.
#[derive(Debug)]
pub struct ContextInterner {
    contexts: Vec<Vec<ContextElem>>,
    index: FxHashMap<Vec<ContextElem>, ContextId>,
}

impl Default for ContextInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextInterner {
    pub fn new() -> Self {
        let empty: Vec<ContextElem> = Vec::new();
        let mut index = FxHashMap::default();
        index.insert(empty.clone(), ContextId::EMPTY);
        Self {
            contexts: vec![empty],
            index,
        }
    }

    pub fn intern(&mut self, elems: Vec<ContextElem>) -> ContextId {
        if let Some(&id) = self.index.get(&elems) {
            return id;
        }
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(elems.clone());
        self.index.insert(elems, id);
        id
    }

    #[inline]
    pub fn elements(&self, ctx: ContextId) -> &[ContextElem] {
        &self.contexts[ctx.index()]
    }

    /// `base` extended with `elem`, k-limited to the last `k` elements.
    pub fn append_limited(&mut self, base: ContextId, elem: ContextElem, k: usize) -> ContextId {
        if k == 0 {
            return ContextId::EMPTY;
        }
        let mut elems = self.elements(base).to_vec();
        elems.push(elem);
        if elems.len() > k {
            let drop = elems.len() - k;
            elems.drain(..drop);
        }
        self.intern(elems)
    }

    /// The last `k` elements of `base`.
    pub fn suffix(&mut self, base: ContextId, k: usize) -> ContextId {
        let elems = self.elements(base);
        if elems.len() <= k {
            return base;
        }
        let elems = elems[elems.len() - k..].to_vec();
        self.intern(elems)
    }

    #[inline]
    pub fn depth(&self, ctx: ContextId) -> usize {
        self.elements(ctx).len()
    }

    /// Number of distinct contexts created so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // The empty context always exists.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_context_is_root() {
        let cx = ContextInterner::new();
        assert_eq!(cx.depth(ContextId::EMPTY), 0);
        assert_eq!(cx.len(), 1);
    }

    #[test]
    fn interning_is_stable() {
        let mut cx = ContextInterner::new();
        let a = cx.append_limited(ContextId::EMPTY, ContextElem::CallSite(InvokeId(1)), 2);
        let b = cx.append_limited(ContextId::EMPTY, ContextElem::CallSite(InvokeId(1)), 2);
        assert_eq!(a, b);
        assert_eq!(cx.len(), 2);
    }

    #[test]
    fn k_limiting_drops_oldest() {
        let mut cx = ContextInterner::new();
        let c1 = cx.append_limited(ContextId::EMPTY, ContextElem::CallSite(InvokeId(1)), 2);
        let c2 = cx.append_limited(c1, ContextElem::CallSite(InvokeId(2)), 2);
        let c3 = cx.append_limited(c2, ContextElem::CallSite(InvokeId(3)), 2);
        assert_eq!(
            cx.elements(c3),
            &[
                ContextElem::CallSite(InvokeId(2)),
                ContextElem::CallSite(InvokeId(3)),
            ]
        );
    }

    #[test]
    fn zero_depth_limit_stays_empty() {
        let mut cx = ContextInterner::new();
        let c = cx.append_limited(ContextId::EMPTY, ContextElem::CallSite(InvokeId(7)), 0);
        assert_eq!(c, ContextId::EMPTY);
    }

    #[test]
    fn same_call_site_twice_is_a_valid_string() {
        let mut cx = ContextInterner::new();
        let c1 = cx.append_limited(ContextId::EMPTY, ContextElem::CallSite(InvokeId(4)), 3);
        let c2 = cx.append_limited(c1, ContextElem::CallSite(InvokeId(4)), 3);
        assert_eq!(cx.depth(c2), 2);
    }

    #[test]
    fn suffix_truncates() {
        let mut cx = ContextInterner::new();
        let c1 = cx.append_limited(ContextId::EMPTY, ContextElem::Alloc(ObjId(1)), 3);
        let c2 = cx.append_limited(c1, ContextElem::Alloc(ObjId(2)), 3);
        let s = cx.suffix(c2, 1);
        assert_eq!(cx.elements(s), &[ContextElem::Alloc(ObjId(2))]);
        // Short enough strings are returned untouched.
        assert_eq!(cx.suffix(c2, 5), c2);
    }

    proptest! {
        #[test]
        fn depth_never_exceeds_k(sites in prop::collection::vec(0u32..64, 0..32), k in 0usize..5) {
            let mut cx = ContextInterner::new();
            let mut ctx = ContextId::EMPTY;
            for s in sites {
                ctx = cx.append_limited(ctx, ContextElem::CallSite(InvokeId(s)), k);
                prop_assert!(cx.depth(ctx) <= k);
            }
        }
    }
}
