//! Program model
//!
//! Arena-backed intermediate representation: classes, methods, fields,
//! variables and call sites are stored in flat vectors and referenced by
//! `u32` index types. Statements are a closed tagged variant, so the solver
//! matches on statement kinds instead of dispatching over an open hierarchy.

use crate::shared::define_id;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

define_id!(
    /// A class (or interface) in the hierarchy.
    ClassId
);
define_id!(
    /// A declared method.
    MethodId
);
define_id!(
    /// A declared field (static or instance).
    FieldId
);
define_id!(
    /// A local variable, parameter, `this`, or return variable of one method.
    VarId
);
define_id!(
    /// A named type. Every class has one; value types (e.g. `String`) may
    /// exist without a class.
    TypeId
);
define_id!(
    /// An interned method signature (`name/arity`).
    SigId
);
define_id!(
    /// A call site.
    InvokeId
);

/// Call kinds, selected once per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
    Dynamic,
    Other,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Static => "static",
            CallKind::Special => "special",
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
            CallKind::Dynamic => "dynamic",
            CallKind::Other => "other",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a method named at a call site: declaring class + signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub sig: SigId,
}

/// `x = new T()`; `site` is unique per allocation statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewStmt {
    pub lhs: VarId,
    pub site: u32,
    pub class: ClassId,
}

/// `x = y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyStmt {
    pub lhs: VarId,
    pub rhs: VarId,
}

/// `x = T.f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticLoad {
    pub lhs: VarId,
    pub field: FieldId,
}

/// `T.f = y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticStore {
    pub field: FieldId,
    pub rhs: VarId,
}

/// `x = b.f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceLoad {
    pub lhs: VarId,
    pub base: VarId,
    pub field: FieldId,
}

/// `b.f = y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceStore {
    pub base: VarId,
    pub field: FieldId,
    pub rhs: VarId,
}

/// `x = b[*]` (index-insensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayLoad {
    pub lhs: VarId,
    pub base: VarId,
}

/// `b[*] = y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayStore {
    pub base: VarId,
    pub rhs: VarId,
}

/// The closed statement variant visited once per newly reachable method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stmt {
    New(NewStmt),
    Copy(CopyStmt),
    LoadStatic(StaticLoad),
    StoreStatic(StaticStore),
    LoadField(InstanceLoad),
    StoreField(InstanceStore),
    LoadArray(ArrayLoad),
    StoreArray(ArrayStore),
    Call(InvokeId),
}

#[derive(Debug, Clone)]
pub(crate) struct TypeData {
    pub name: String,
    /// Back-reference when this type is a class type.
    pub class: Option<ClassId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ClassData {
    pub name: String,
    pub ty: TypeId,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    /// Declared methods by signature.
    pub declared: FxHashMap<SigId, MethodId>,
}

#[derive(Debug, Clone)]
pub(crate) struct MethodData {
    pub class: ClassId,
    pub name: String,
    pub sig: SigId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub this_var: Option<VarId>,
    pub params: Vec<VarId>,
    pub return_vars: Vec<VarId>,
    pub ret_ty: TypeId,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldData {
    pub class: ClassId,
    pub name: String,
    pub is_static: bool,
}

/// A variable plus the precomputed statements that use it as a base or
/// receiver. The solver's reaction to points-to growth walks these lists.
#[derive(Debug, Clone, Default)]
pub(crate) struct VarUses {
    pub load_fields: Vec<InstanceLoad>,
    pub store_fields: Vec<InstanceStore>,
    pub load_arrays: Vec<ArrayLoad>,
    pub store_arrays: Vec<ArrayStore>,
    pub invokes: Vec<InvokeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct VarData {
    pub name: String,
    pub method: MethodId,
    pub uses: VarUses,
}

#[derive(Debug, Clone)]
pub(crate) struct InvokeData {
    pub kind: CallKind,
    pub target: MethodRef,
    pub recv: Option<VarId>,
    pub args: Vec<VarId>,
    pub result: Option<VarId>,
    pub caller: MethodId,
}

/// The whole-program model: arenas plus the designated entry method.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) types: Vec<TypeData>,
    pub(crate) classes: Vec<ClassData>,
    pub(crate) methods: Vec<MethodData>,
    pub(crate) fields: Vec<FieldData>,
    pub(crate) vars: Vec<VarData>,
    pub(crate) invokes: Vec<InvokeData>,
    pub(crate) sigs: Vec<String>,
    pub(crate) entry: MethodId,
}

impl Program {
    /// The designated program entry method.
    #[inline]
    pub fn entry(&self) -> MethodId {
        self.entry
    }

    #[inline]
    pub(crate) fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.index()]
    }

    #[inline]
    pub(crate) fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.index()]
    }

    #[inline]
    pub(crate) fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id.index()]
    }

    #[inline]
    pub(crate) fn var(&self, id: VarId) -> &VarData {
        &self.vars[id.index()]
    }

    #[inline]
    pub(crate) fn invoke(&self, id: InvokeId) -> &InvokeData {
        &self.invokes[id.index()]
    }

    #[inline]
    pub(crate) fn ty(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        &self.classes[id.index()].name
    }

    pub fn is_interface(&self, id: ClassId) -> bool {
        self.classes[id.index()].is_interface
    }

    pub fn superclass_of(&self, id: ClassId) -> Option<ClassId> {
        self.classes[id.index()].superclass
    }

    pub fn interfaces_of(&self, id: ClassId) -> &[ClassId] {
        &self.classes[id.index()].interfaces
    }

    pub fn method_name(&self, id: MethodId) -> &str {
        &self.methods[id.index()].name
    }

    pub fn method_is_static(&self, id: MethodId) -> bool {
        self.methods[id.index()].is_static
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        &self.fields[id.index()].name
    }

    pub fn field_class(&self, id: FieldId) -> ClassId {
        self.fields[id.index()].class
    }

    pub fn field_is_static(&self, id: FieldId) -> bool {
        self.fields[id.index()].is_static
    }

    pub fn var_method(&self, id: VarId) -> MethodId {
        self.vars[id.index()].method
    }

    pub fn var_name(&self, id: VarId) -> &str {
        &self.vars[id.index()].name
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    pub fn sig_name(&self, id: SigId) -> &str {
        &self.sigs[id.index()]
    }

    /// Class type of `ty`, when `ty` names a class.
    #[inline]
    pub fn class_of_type(&self, ty: TypeId) -> Option<ClassId> {
        self.types[ty.index()].class
    }

    /// Return type declared for `method`.
    #[inline]
    pub fn return_type(&self, method: MethodId) -> TypeId {
        self.methods[method.index()].ret_ty
    }

    /// Declaring class of `method`.
    #[inline]
    pub fn declaring_class(&self, method: MethodId) -> ClassId {
        self.methods[method.index()].class
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.name == name)
            .map(|i| ClassId(i as u32))
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(|i| TypeId(i as u32))
    }

    /// Declared (not inherited) method of `class` with signature `sig`.
    pub fn declared_method(&self, class: ClassId, sig: SigId) -> Option<MethodId> {
        self.class(class).declared.get(&sig).copied()
    }

    /// Single dispatch: the first non-abstract method matching `sig`,
    /// starting at `class` and walking up the superclass chain.
    pub fn dispatch(&self, class: ClassId, sig: SigId) -> Option<MethodId> {
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            if let Some(&m) = self.class(c).declared.get(&sig) {
                if !self.method(m).is_abstract {
                    return Some(m);
                }
            }
            cursor = self.class(c).superclass;
        }
        None
    }

    /// Human-readable label for a call site, used in reports.
    pub fn invoke_label(&self, id: InvokeId) -> String {
        let inv = self.invoke(id);
        format!(
            "{}/{}:{}.{}",
            self.method_name(inv.caller),
            id.0,
            self.class_name(inv.target.class),
            self.sig_name(inv.target.sig),
        )
    }
}
