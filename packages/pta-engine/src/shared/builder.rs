//! Program builder
//!
//! Constructs the arena-backed program model in memory. Front ends (and the
//! test suite) create classes, methods and statements through this API; the
//! relevant-use indexes consumed by the solver are computed in [`finish`].
//!
//! [`finish`]: ProgramBuilder::finish

use crate::errors::AnalysisError;
use crate::shared::program::{
    ArrayLoad, ArrayStore, CallKind, ClassData, ClassId, CopyStmt, FieldData, FieldId,
    InstanceLoad, InstanceStore, InvokeData, InvokeId, MethodData, MethodId, MethodRef, NewStmt,
    Program, SigId, StaticLoad, StaticStore, Stmt, TypeData, TypeId, VarData, VarId, VarUses,
};
use rustc_hash::FxHashMap;

/// Incremental builder for [`Program`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    types: Vec<TypeData>,
    classes: Vec<ClassData>,
    methods: Vec<MethodData>,
    fields: Vec<FieldData>,
    vars: Vec<VarData>,
    invokes: Vec<InvokeData>,
    sigs: Vec<String>,
    sig_index: FxHashMap<String, SigId>,
    type_index: FxHashMap<String, TypeId>,
    next_site: u32,
    entry: Option<MethodId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        let mut b = Self::default();
        // Methods default to this return type until one is set.
        b.add_type("void");
        b
    }

    /// Interns a named type, reusing an existing entry.
    pub fn add_type(&mut self, name: &str) -> TypeId {
        if let Some(&ty) = self.type_index.get(name) {
            return ty;
        }
        let ty = TypeId(self.types.len() as u32);
        self.types.push(TypeData {
            name: name.to_string(),
            class: None,
        });
        self.type_index.insert(name.to_string(), ty);
        ty
    }

    fn add_class_raw(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
        is_interface: bool,
    ) -> ClassId {
        let ty = self.add_type(name);
        let class = ClassId(self.classes.len() as u32);
        self.classes.push(ClassData {
            name: name.to_string(),
            ty,
            superclass,
            interfaces: Vec::new(),
            is_interface,
            declared: FxHashMap::default(),
        });
        self.types[ty.index()].class = Some(class);
        class
    }

    /// A root class with no superclass.
    pub fn add_class(&mut self, name: &str) -> ClassId {
        self.add_class_raw(name, None, false)
    }

    pub fn add_class_extends(&mut self, name: &str, superclass: ClassId) -> ClassId {
        self.add_class_raw(name, Some(superclass), false)
    }

    pub fn add_interface(&mut self, name: &str) -> ClassId {
        self.add_class_raw(name, None, true)
    }

    pub fn add_implements(&mut self, class: ClassId, interface: ClassId) {
        self.classes[class.index()].interfaces.push(interface);
    }

    pub fn add_field(&mut self, class: ClassId, name: &str) -> FieldId {
        self.add_field_raw(class, name, false)
    }

    pub fn add_static_field(&mut self, class: ClassId, name: &str) -> FieldId {
        self.add_field_raw(class, name, true)
    }

    fn add_field_raw(&mut self, class: ClassId, name: &str, is_static: bool) -> FieldId {
        let field = FieldId(self.fields.len() as u32);
        self.fields.push(FieldData {
            class,
            name: name.to_string(),
            is_static,
        });
        field
    }

    fn sig(&mut self, name: &str, arity: usize) -> SigId {
        let key = format!("{name}/{arity}");
        if let Some(&sig) = self.sig_index.get(&key) {
            return sig;
        }
        let sig = SigId(self.sigs.len() as u32);
        self.sigs.push(key.clone());
        self.sig_index.insert(key, sig);
        sig
    }

    fn add_method_raw(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[&str],
        is_static: bool,
        is_abstract: bool,
    ) -> MethodId {
        let method = MethodId(self.methods.len() as u32);
        let sig = self.sig(name, params.len());
        let this_var = if is_static || is_abstract {
            None
        } else {
            Some(self.add_var(method, "this"))
        };
        let params = params
            .iter()
            .map(|p| self.add_var(method, p))
            .collect::<Vec<_>>();
        self.methods.push(MethodData {
            class,
            name: name.to_string(),
            sig,
            is_static,
            is_abstract,
            this_var,
            params,
            return_vars: Vec::new(),
            ret_ty: TypeId(0),
            stmts: Vec::new(),
        });
        self.classes[class.index()].declared.insert(sig, method);
        method
    }

    /// An instance method; a `this` variable is created implicitly.
    pub fn add_method(&mut self, class: ClassId, name: &str, params: &[&str]) -> MethodId {
        self.add_method_raw(class, name, params, false, false)
    }

    pub fn add_static_method(&mut self, class: ClassId, name: &str, params: &[&str]) -> MethodId {
        self.add_method_raw(class, name, params, true, false)
    }

    /// An abstract (or interface) method; never a dispatch target.
    pub fn add_abstract_method(&mut self, class: ClassId, name: &str, params: &[&str]) -> MethodId {
        self.add_method_raw(class, name, params, false, true)
    }

    pub fn set_return_type(&mut self, method: MethodId, ty: TypeId) {
        self.methods[method.index()].ret_ty = ty;
    }

    pub fn add_var(&mut self, method: MethodId, name: &str) -> VarId {
        let var = VarId(self.vars.len() as u32);
        self.vars.push(VarData {
            name: name.to_string(),
            method,
            uses: VarUses::default(),
        });
        var
    }

    pub fn this_of(&self, method: MethodId) -> Option<VarId> {
        self.methods[method.index()].this_var
    }

    pub fn param(&self, method: MethodId, index: usize) -> VarId {
        self.methods[method.index()].params[index]
    }

    /// Registers `var` as (one of) the method's return variables.
    pub fn add_return(&mut self, method: MethodId, var: VarId) {
        self.methods[method.index()].return_vars.push(var);
    }

    // ── statements ──────────────────────────────────────────────────────

    pub fn stmt_new(&mut self, method: MethodId, lhs: VarId, class: ClassId) {
        let site = self.next_site;
        self.next_site += 1;
        self.methods[method.index()]
            .stmts
            .push(Stmt::New(NewStmt { lhs, site, class }));
    }

    pub fn stmt_copy(&mut self, method: MethodId, lhs: VarId, rhs: VarId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::Copy(CopyStmt { lhs, rhs }));
    }

    pub fn stmt_load_static(&mut self, method: MethodId, lhs: VarId, field: FieldId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::LoadStatic(StaticLoad { lhs, field }));
    }

    pub fn stmt_store_static(&mut self, method: MethodId, field: FieldId, rhs: VarId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::StoreStatic(StaticStore { field, rhs }));
    }

    pub fn stmt_load_field(&mut self, method: MethodId, lhs: VarId, base: VarId, field: FieldId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::LoadField(InstanceLoad { lhs, base, field }));
    }

    pub fn stmt_store_field(&mut self, method: MethodId, base: VarId, field: FieldId, rhs: VarId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::StoreField(InstanceStore { base, field, rhs }));
    }

    pub fn stmt_load_array(&mut self, method: MethodId, lhs: VarId, base: VarId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::LoadArray(ArrayLoad { lhs, base }));
    }

    pub fn stmt_store_array(&mut self, method: MethodId, base: VarId, rhs: VarId) {
        self.methods[method.index()]
            .stmts
            .push(Stmt::StoreArray(ArrayStore { base, rhs }));
    }

    fn add_invoke(
        &mut self,
        caller: MethodId,
        kind: CallKind,
        class: ClassId,
        name: &str,
        recv: Option<VarId>,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> InvokeId {
        let sig = self.sig(name, args.len());
        let invoke = InvokeId(self.invokes.len() as u32);
        self.invokes.push(InvokeData {
            kind,
            target: MethodRef { class, sig },
            recv,
            args,
            result,
            caller,
        });
        self.methods[caller.index()].stmts.push(Stmt::Call(invoke));
        invoke
    }

    pub fn invoke_static(
        &mut self,
        caller: MethodId,
        class: ClassId,
        name: &str,
        args: &[VarId],
        result: Option<VarId>,
    ) -> InvokeId {
        self.add_invoke(caller, CallKind::Static, class, name, None, args.to_vec(), result)
    }

    pub fn invoke_virtual(
        &mut self,
        caller: MethodId,
        recv: VarId,
        class: ClassId,
        name: &str,
        args: &[VarId],
        result: Option<VarId>,
    ) -> InvokeId {
        self.add_invoke(
            caller,
            CallKind::Virtual,
            class,
            name,
            Some(recv),
            args.to_vec(),
            result,
        )
    }

    pub fn invoke_interface(
        &mut self,
        caller: MethodId,
        recv: VarId,
        class: ClassId,
        name: &str,
        args: &[VarId],
        result: Option<VarId>,
    ) -> InvokeId {
        self.add_invoke(
            caller,
            CallKind::Interface,
            class,
            name,
            Some(recv),
            args.to_vec(),
            result,
        )
    }

    pub fn invoke_special(
        &mut self,
        caller: MethodId,
        recv: VarId,
        class: ClassId,
        name: &str,
        args: &[VarId],
        result: Option<VarId>,
    ) -> InvokeId {
        self.add_invoke(
            caller,
            CallKind::Special,
            class,
            name,
            Some(recv),
            args.to_vec(),
            result,
        )
    }

    pub fn set_entry(&mut self, method: MethodId) {
        self.entry = Some(method);
    }

    /// Seals the model: computes per-variable relevant-use indexes and
    /// validates that an entry method was designated.
    pub fn finish(mut self) -> Result<Program, AnalysisError> {
        let entry = self.entry.ok_or(AnalysisError::NoEntryMethod)?;

        for m in 0..self.methods.len() {
            let stmts = self.methods[m].stmts.clone();
            for stmt in stmts {
                match stmt {
                    Stmt::LoadField(load) => {
                        self.vars[load.base.index()].uses.load_fields.push(load);
                    }
                    Stmt::StoreField(store) => {
                        self.vars[store.base.index()].uses.store_fields.push(store);
                    }
                    Stmt::LoadArray(load) => {
                        self.vars[load.base.index()].uses.load_arrays.push(load);
                    }
                    Stmt::StoreArray(store) => {
                        self.vars[store.base.index()].uses.store_arrays.push(store);
                    }
                    Stmt::Call(invoke) => {
                        if let Some(recv) = self.invokes[invoke.index()].recv {
                            self.vars[recv.index()].uses.invokes.push(invoke);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(Program {
            types: self.types,
            classes: self.classes,
            methods: self.methods,
            fields: self.fields,
            vars: self.vars,
            invokes: self.invokes,
            sigs: self.sigs,
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_hierarchy_and_dispatches() {
        let mut b = ProgramBuilder::new();
        let animal = b.add_class("Animal");
        let dog = b.add_class_extends("Dog", animal);
        b.add_method(animal, "speak", &[]);
        let dog_speak = b.add_method(dog, "speak", &[]);
        let main = b.add_static_method(animal, "main", &[]);
        b.set_entry(main);
        let program = b.finish().unwrap();

        let sig = SigId(
            program
                .sigs
                .iter()
                .position(|s| s == "speak/0")
                .unwrap() as u32,
        );
        assert_eq!(program.dispatch(dog, sig), Some(dog_speak));
    }

    #[test]
    fn dispatch_skips_abstract_methods() {
        let mut b = ProgramBuilder::new();
        let shape = b.add_class("Shape");
        let circle = b.add_class_extends("Circle", shape);
        b.add_abstract_method(shape, "area", &[]);
        let circle_area = b.add_method(circle, "area", &[]);
        let main = b.add_static_method(shape, "main", &[]);
        b.set_entry(main);
        let program = b.finish().unwrap();

        let sig = program.method(circle_area).sig;
        assert_eq!(program.dispatch(circle, sig), Some(circle_area));
        // Dispatch from the abstract declaration's class finds nothing.
        assert_eq!(program.dispatch(shape, sig), None);
    }

    #[test]
    fn hierarchy_surface_is_preserved() {
        let mut b = ProgramBuilder::new();
        let iface = b.add_interface("Walker");
        let base = b.add_class("Base");
        let derived = b.add_class_extends("Derived", base);
        b.add_implements(derived, iface);
        let f = b.add_static_field(base, "shared");
        let main = b.add_static_method(base, "main", &[]);
        b.set_entry(main);
        let program = b.finish().unwrap();

        assert!(program.is_interface(iface));
        assert!(!program.is_interface(derived));
        assert_eq!(program.superclass_of(derived), Some(base));
        assert_eq!(program.interfaces_of(derived), &[iface]);
        assert!(program.method_is_static(main));
        assert!(program.field_is_static(f));
        assert_eq!(program.field_class(f), base);
        assert_eq!(program.field_name(f), "shared");
    }

    #[test]
    fn finish_requires_entry() {
        let b = ProgramBuilder::new();
        assert!(matches!(b.finish(), Err(AnalysisError::NoEntryMethod)));
    }

    #[test]
    fn use_indexes_cover_bases_and_receivers() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("C");
        let f = b.add_field(c, "f");
        let main = b.add_static_method(c, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        let y = b.add_var(main, "y");
        b.stmt_load_field(main, y, x, f);
        b.stmt_store_field(main, x, f, y);
        b.stmt_load_array(main, y, x);
        b.invoke_virtual(main, x, c, "m", &[], None);

        let program = b.finish().unwrap();
        assert_eq!(program.var_method(x), main);
        let uses = &program.var(x).uses;
        assert_eq!(uses.load_fields.len(), 1);
        assert_eq!(uses.store_fields.len(), 1);
        assert_eq!(uses.load_arrays.len(), 1);
        assert_eq!(uses.invokes.len(), 1);
    }
}
