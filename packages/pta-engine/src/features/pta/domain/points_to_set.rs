//! Points-to sets
//!
//! The set of context-qualified abstract objects one pointer may reference.
//! Monotone: objects are only ever added, never removed, which bounds the
//! fixpoint (the object universe is finite) and makes re-adding a safe no-op.

use crate::features::pta::domain::element::CsObjId;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToSet {
    objs: FxHashSet<CsObjId>,
}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(obj: CsObjId) -> Self {
        let mut set = Self::new();
        set.add(obj);
        set
    }

    /// Returns true iff `obj` was not already present.
    #[inline]
    pub fn add(&mut self, obj: CsObjId) -> bool {
        self.objs.insert(obj)
    }

    #[inline]
    pub fn contains(&self, obj: CsObjId) -> bool {
        self.objs.contains(&obj)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objs.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn intersects(&self, other: &PointsToSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|o| large.contains(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_reports_novelty() {
        let mut pts = PointsToSet::new();
        assert!(pts.add(CsObjId(1)));
        assert!(!pts.add(CsObjId(1)));
        assert_eq!(pts.len(), 1);
    }

    #[test]
    fn intersects_checks_common_objects() {
        let mut a = PointsToSet::new();
        let mut b = PointsToSet::new();
        a.add(CsObjId(1));
        a.add(CsObjId(2));
        b.add(CsObjId(3));
        assert!(!a.intersects(&b));
        b.add(CsObjId(2));
        assert!(a.intersects(&b));
    }

    proptest! {
        #[test]
        fn growth_is_monotone(objs in prop::collection::vec(0u32..128, 0..64)) {
            let mut pts = PointsToSet::new();
            let mut prev = 0;
            for o in objs {
                pts.add(CsObjId(o));
                prop_assert!(pts.len() >= prev);
                prop_assert!(pts.contains(CsObjId(o)));
                prev = pts.len();
            }
        }
    }
}
