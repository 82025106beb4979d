//! Pointers, abstract objects, and their interner
//!
//! Every `(context, entity)` pair the solver touches is canonicalized to a
//! stable `u32` index, so structural equality becomes identity equality and
//! each pointer owns exactly one points-to set for the whole run. Nothing is
//! ever evicted; a repeated request returns the cached index, never a copy.

use crate::features::pta::domain::context::ContextId;
use crate::features::pta::domain::points_to_set::PointsToSet;
use crate::shared::{define_id, FieldId, InvokeId, TypeId, VarId};
use rustc_hash::FxHashMap;

define_id!(
    /// An abstract heap object (allocation site or taint object).
    ObjId
);
define_id!(
    /// A context-qualified abstract object.
    CsObjId
);
define_id!(
    /// An interned pointer node.
    PointerId
);

/// What an abstract object stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// All objects ever created at one allocation site.
    Alloc { site: u32 },
    /// Synthetic object representing data produced by a taint source call.
    Taint { source: InvokeId },
}

/// An abstract heap object. Immutable once created; distinct allocation
/// sites are always distinct objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Obj {
    pub kind: ObjKind,
    pub ty: TypeId,
}

/// A heap-context-qualified object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsObj {
    pub ctx: ContextId,
    pub obj: ObjId,
}

/// Pointer variants. Each owns one points-to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pointer {
    /// A local variable under a calling context.
    Var { ctx: ContextId, var: VarId },
    /// A static field (no context-dependent receiver).
    StaticField { field: FieldId },
    /// An instance field of a context-qualified object.
    InstanceField { base: CsObjId, field: FieldId },
    /// The merged element cell of a context-qualified array object.
    ArrayIndex { base: CsObjId },
}

/// Arena-backed interner for pointers and context-qualified objects, owned
/// by one analysis run and passed explicitly to every component.
#[derive(Debug, Default)]
pub struct CsManager {
    pointers: Vec<Pointer>,
    pointer_index: FxHashMap<Pointer, PointerId>,
    points_to: Vec<PointsToSet>,
    cs_objs: Vec<CsObj>,
    cs_obj_index: FxHashMap<CsObj, CsObjId>,
}

impl CsManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_pointer(&mut self, pointer: Pointer) -> PointerId {
        if let Some(&id) = self.pointer_index.get(&pointer) {
            return id;
        }
        let id = PointerId(self.pointers.len() as u32);
        self.pointers.push(pointer);
        self.points_to.push(PointsToSet::new());
        self.pointer_index.insert(pointer, id);
        id
    }

    pub fn get_var(&mut self, ctx: ContextId, var: VarId) -> PointerId {
        self.get_pointer(Pointer::Var { ctx, var })
    }

    pub fn get_static_field(&mut self, field: FieldId) -> PointerId {
        self.get_pointer(Pointer::StaticField { field })
    }

    pub fn get_instance_field(&mut self, base: CsObjId, field: FieldId) -> PointerId {
        self.get_pointer(Pointer::InstanceField { base, field })
    }

    pub fn get_array_index(&mut self, base: CsObjId) -> PointerId {
        self.get_pointer(Pointer::ArrayIndex { base })
    }

    /// Lookup without interning; `None` when the pointer was never created.
    pub fn lookup_var(&self, ctx: ContextId, var: VarId) -> Option<PointerId> {
        self.pointer_index.get(&Pointer::Var { ctx, var }).copied()
    }

    pub fn get_cs_obj(&mut self, ctx: ContextId, obj: ObjId) -> CsObjId {
        let cs_obj = CsObj { ctx, obj };
        if let Some(&id) = self.cs_obj_index.get(&cs_obj) {
            return id;
        }
        let id = CsObjId(self.cs_objs.len() as u32);
        self.cs_objs.push(cs_obj);
        self.cs_obj_index.insert(cs_obj, id);
        id
    }

    #[inline]
    pub fn pointer(&self, id: PointerId) -> Pointer {
        self.pointers[id.index()]
    }

    #[inline]
    pub fn cs_obj(&self, id: CsObjId) -> CsObj {
        self.cs_objs[id.index()]
    }

    #[inline]
    pub fn points_to(&self, id: PointerId) -> &PointsToSet {
        &self.points_to[id.index()]
    }

    /// Adds `obj` to `id`'s points-to set; true iff it was new.
    #[inline]
    pub fn add_points_to(&mut self, id: PointerId, obj: CsObjId) -> bool {
        self.points_to[id.index()].add(obj)
    }

    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, Pointer)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(i, &p)| (PointerId(i as u32), p))
    }

    #[inline]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    #[inline]
    pub fn cs_obj_count(&self) -> usize {
        self.cs_objs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_identical_ids() {
        let mut csm = CsManager::new();
        let a = csm.get_var(ContextId::EMPTY, VarId(3));
        let b = csm.get_var(ContextId::EMPTY, VarId(3));
        assert_eq!(a, b);
        assert_eq!(csm.pointer_count(), 1);
    }

    #[test]
    fn distinct_entities_get_distinct_ids() {
        let mut csm = CsManager::new();
        let a = csm.get_var(ContextId::EMPTY, VarId(1));
        let b = csm.get_var(ContextId(1), VarId(1));
        let c = csm.get_static_field(FieldId(0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn points_to_set_is_owned_per_pointer() {
        let mut csm = CsManager::new();
        let p = csm.get_var(ContextId::EMPTY, VarId(0));
        let q = csm.get_var(ContextId::EMPTY, VarId(1));
        let o = csm.get_cs_obj(ContextId::EMPTY, ObjId(0));
        assert!(csm.add_points_to(p, o));
        assert!(!csm.add_points_to(p, o));
        assert!(csm.points_to(q).is_empty());
    }

    #[test]
    fn cs_objects_are_interned() {
        let mut csm = CsManager::new();
        let a = csm.get_cs_obj(ContextId::EMPTY, ObjId(5));
        let b = csm.get_cs_obj(ContextId::EMPTY, ObjId(5));
        let c = csm.get_cs_obj(ContextId(2), ObjId(5));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn lookup_does_not_intern() {
        let csm = CsManager::new();
        assert_eq!(csm.lookup_var(ContextId::EMPTY, VarId(9)), None);
        assert_eq!(csm.pointer_count(), 0);
    }
}
