//! Call-target resolution
//!
//! One resolution rule per call kind:
//! - static: direct lookup on the declaring class; a miss is fatal
//! - special: single dispatch from the declaring class; a miss is fatal
//! - virtual/interface: single dispatch from the *receiver's runtime class*;
//!   a miss is skipped (an incompatible receiver type reaching a call site
//!   must not crash the solver)
//! - dynamic/other: never resolved here
//!
//! Abstract methods are never dispatch targets; the superclass walk skips
//! them (`Program::dispatch`).

use crate::errors::{AnalysisError, AnalysisResult};
use crate::shared::{CallKind, ClassId, InvokeId, MethodId, Program};

/// Resolves the callee of `invoke`. `recv_class` is the runtime class of the
/// receiver object and is ignored for static calls. `Ok(None)` means "skip
/// this receiver/call", which is only legal for virtual, interface, dynamic
/// and other kinds.
pub fn resolve_callee(
    program: &Program,
    recv_class: Option<ClassId>,
    invoke: InvokeId,
) -> AnalysisResult<Option<MethodId>> {
    let inv = program.invoke(invoke);
    let target = inv.target;
    match inv.kind {
        CallKind::Static => program
            .declared_method(target.class, target.sig)
            .map(Some)
            .ok_or_else(|| AnalysisError::UnresolvedStaticCall {
                class: program.class_name(target.class).to_string(),
                sig: program.sig_name(target.sig).to_string(),
            }),
        CallKind::Special => program
            .dispatch(target.class, target.sig)
            .map(Some)
            .ok_or_else(|| AnalysisError::UnresolvedSpecialCall {
                class: program.class_name(target.class).to_string(),
                sig: program.sig_name(target.sig).to_string(),
            }),
        CallKind::Virtual | CallKind::Interface => {
            Ok(recv_class.and_then(|c| program.dispatch(c, target.sig)))
        }
        CallKind::Dynamic | CallKind::Other => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ProgramBuilder;

    #[test]
    fn virtual_dispatch_uses_runtime_class() {
        let mut b = ProgramBuilder::new();
        let animal = b.add_class("Animal");
        let dog = b.add_class_extends("Dog", animal);
        b.add_method(animal, "speak", &[]);
        let dog_speak = b.add_method(dog, "speak", &[]);
        let main = b.add_static_method(animal, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        // Declared type is Animal; dispatch must follow the runtime class.
        let call = b.invoke_virtual(main, x, animal, "speak", &[], None);
        let program = b.finish().unwrap();

        let resolved = resolve_callee(&program, Some(dog), call).unwrap();
        assert_eq!(resolved, Some(dog_speak));
    }

    #[test]
    fn inherited_method_is_found_by_superclass_walk() {
        let mut b = ProgramBuilder::new();
        let base = b.add_class("Base");
        let derived = b.add_class_extends("Derived", base);
        let base_m = b.add_method(base, "m", &[]);
        let main = b.add_static_method(base, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        let call = b.invoke_virtual(main, x, derived, "m", &[], None);
        let program = b.finish().unwrap();

        // Derived declares nothing; dispatch walks up to Base.
        assert_eq!(resolve_callee(&program, Some(derived), call).unwrap(), Some(base_m));
    }

    #[test]
    fn virtual_miss_is_skipped_not_fatal() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A");
        let unrelated = b.add_class("Unrelated");
        b.add_method(a, "m", &[]);
        let main = b.add_static_method(a, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        let call = b.invoke_virtual(main, x, a, "m", &[], None);
        let program = b.finish().unwrap();

        assert_eq!(resolve_callee(&program, Some(unrelated), call).unwrap(), None);
        assert_eq!(resolve_callee(&program, None, call).unwrap(), None);
    }

    #[test]
    fn static_miss_is_fatal() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A");
        let main = b.add_static_method(a, "main", &[]);
        b.set_entry(main);
        let call = b.invoke_static(main, a, "missing", &[], None);
        let program = b.finish().unwrap();

        assert!(matches!(
            resolve_callee(&program, None, call),
            Err(AnalysisError::UnresolvedStaticCall { .. })
        ));
    }

    #[test]
    fn abstract_declarations_are_never_targets() {
        let mut b = ProgramBuilder::new();
        let iface = b.add_interface("Greeter");
        let impl_class = b.add_class("ConsoleGreeter");
        b.add_implements(impl_class, iface);
        b.add_abstract_method(iface, "greet", &[]);
        let concrete = b.add_method(impl_class, "greet", &[]);
        let main = b.add_static_method(impl_class, "main", &[]);
        b.set_entry(main);
        let x = b.add_var(main, "x");
        let call = b.invoke_interface(main, x, iface, "greet", &[], None);
        let program = b.finish().unwrap();

        // A receiver of the implementing class resolves to the override.
        assert_eq!(
            resolve_callee(&program, Some(impl_class), call).unwrap(),
            Some(concrete)
        );
        // "Dispatching" on the interface itself finds only the abstract
        // declaration and is skipped.
        assert_eq!(resolve_callee(&program, Some(iface), call).unwrap(), None);
    }
}
