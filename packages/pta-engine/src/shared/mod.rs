//! Shared program model
//!
//! The intermediate representation consumed by the analyses:
//! - Classes with a hierarchy (superclass, implemented interfaces)
//! - Methods with parameters, `this`, return variables and statements
//! - Variables with precomputed relevant-use indexes
//! - Call sites with kind, target reference, arguments and result

pub mod builder;
pub mod program;

pub use builder::ProgramBuilder;
pub use program::{
    ArrayLoad, ArrayStore, CallKind, ClassId, CopyStmt, FieldId, InstanceLoad, InstanceStore,
    InvokeId, MethodId, MethodRef, NewStmt, Program, SigId, StaticLoad, StaticStore, Stmt, TypeId,
    VarId,
};

/// Defines a `u32`-backed index type for one arena.
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

pub(crate) use define_id;
