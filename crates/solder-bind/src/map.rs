//! Native-to-managed type classification.
//!
//! Pointer slots are deliberately left unexpanded here: a single-level
//! pointer maps to [`ManagedType::OpaquePointer`] or
//! [`ManagedType::TypedPointer`], and the expansion engine later turns
//! those into concrete array/buffer overloads.

use crate::error::BindError;
use crate::managed::{ManagedType, PrimitiveKind};
use solder_model::{ConfigError, FnDirectives, NativeArg, NativeType, TypeKind};

/// Maps one native type to its managed representation, with no directive
/// influence. `slot` names the position for error reporting (an argument
/// name or `"return"`).
pub fn map_type(symbol: &str, slot: &str, ty: &NativeType) -> Result<ManagedType, BindError> {
    match ty.kind() {
        TypeKind::Context => Ok(ManagedType::RuntimeContext),
        TypeKind::Void => Ok(ManagedType::Void),
        TypeKind::Primitive(p) => Ok(ManagedType::Primitive(PrimitiveKind::from_native(*p))),
        // A compound passed by value marshals through the same accessor
        // wrapper a pointer-to-compound does.
        TypeKind::Compound { name, .. } => Ok(ManagedType::CompoundWrapper(name.clone())),
        TypeKind::Pointer { .. } | TypeKind::Array { .. } => map_indirect(symbol, slot, ty),
        TypeKind::Function { .. } => Err(BindError::unsupported(
            symbol,
            slot,
            "bare function type outside a compound field",
        )),
    }
}

fn map_indirect(symbol: &str, slot: &str, ty: &NativeType) -> Result<ManagedType, BindError> {
    let depth = ty.indirection_depth();
    let inner = ty.innermost();
    match depth {
        1 => match inner.kind() {
            TypeKind::Void => Ok(ManagedType::OpaquePointer),
            TypeKind::Primitive(p) => Ok(ManagedType::TypedPointer(PrimitiveKind::from_native(*p))),
            TypeKind::Compound { name, .. } => Ok(ManagedType::CompoundWrapper(name.clone())),
            other => Err(BindError::unsupported(
                symbol,
                slot,
                format!("pointer to {other:?}"),
            )),
        },
        2 => match inner.kind() {
            TypeKind::Primitive(p) => {
                Ok(ManagedType::BufferArray(Some(PrimitiveKind::from_native(*p))))
            }
            TypeKind::Void => Ok(ManagedType::BufferArray(None)),
            other => Err(BindError::unsupported(
                symbol,
                slot,
                format!("double pointer to {other:?}"),
            )),
        },
        d => Err(BindError::too_deep(symbol, slot, d)),
    }
}

/// Maps one argument, honoring the per-argument text-coercion directive.
pub fn map_argument(
    symbol: &str,
    index: usize,
    arg: &NativeArg,
    directives: &FnDirectives,
) -> Result<ManagedType, BindError> {
    let slot = arg.param_name(index);
    if directives.text_args.contains(&index) {
        return coerce_text(symbol, index, &arg.ty);
    }
    map_type(symbol, &slot, &arg.ty)
}

/// Maps the return type, honoring the text-coercion directive for 8-bit
/// pointer returns.
pub fn map_return(
    symbol: &str,
    ty: &NativeType,
    directives: &FnDirectives,
) -> Result<ManagedType, BindError> {
    if directives.text_return {
        if is_byte_pointer(ty) {
            return Ok(ManagedType::Text);
        }
        return Err(ConfigError::TextReturnShape { symbol: symbol.to_owned() }.into());
    }
    let mapped = map_type(symbol, "return", ty)?;
    // A declared length expression turns a compound-pointer return into an
    // array of accessor windows; the planner enforces the shape otherwise.
    if directives.return_length.is_some() {
        if let ManagedType::CompoundWrapper(name) = &mapped {
            return Ok(ManagedType::CompoundArray(name.clone()));
        }
    }
    Ok(mapped)
}

fn coerce_text(symbol: &str, index: usize, ty: &NativeType) -> Result<ManagedType, BindError> {
    match ty.indirection_depth() {
        1 if is_byte_inner(ty) => Ok(ManagedType::Text),
        2 if is_byte_inner(ty) => Ok(ManagedType::TextArray),
        _ => Err(ConfigError::TextCoercionShape { symbol: symbol.to_owned(), index }.into()),
    }
}

fn is_byte_inner(ty: &NativeType) -> bool {
    ty.innermost()
        .as_primitive()
        .is_some_and(|p| p.is_byte_sized())
}

fn is_byte_pointer(ty: &NativeType) -> bool {
    ty.indirection_depth() == 1 && is_byte_inner(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solder_model::{CPrimitive, TypeInterner};

    fn directives() -> FnDirectives {
        FnDirectives::default()
    }

    #[test]
    fn primitives_and_void_map_directly() {
        let mut i = TypeInterner::new();
        let void = i.void();
        let f = i.primitive(CPrimitive::Float32);
        assert_eq!(map_type("f", "return", &void).unwrap(), ManagedType::Void);
        assert_eq!(
            map_type("f", "x", &f).unwrap(),
            ManagedType::Primitive(PrimitiveKind::Float)
        );
    }

    #[test]
    fn single_level_pointers_stay_unexpanded() {
        let mut i = TypeInterner::new();
        let void = i.void();
        let int = i.primitive(CPrimitive::Int32);
        let vp = i.pointer_to(void, false);
        let ip = i.pointer_to(int, false);
        assert_eq!(map_type("f", "p", &vp).unwrap(), ManagedType::OpaquePointer);
        assert_eq!(
            map_type("f", "p", &ip).unwrap(),
            ManagedType::TypedPointer(PrimitiveKind::Int)
        );
    }

    #[test]
    fn double_pointers_become_buffer_arrays() {
        let mut i = TypeInterner::new();
        let void = i.void();
        let fl = i.primitive(CPrimitive::Float32);
        let fpp = {
            let fp = i.pointer_to(fl, false);
            i.pointer_to(fp, false)
        };
        let vpp = {
            let vp = i.pointer_to(void, false);
            i.pointer_to(vp, false)
        };
        assert_eq!(
            map_type("f", "rows", &fpp).unwrap(),
            ManagedType::BufferArray(Some(PrimitiveKind::Float))
        );
        assert_eq!(map_type("f", "ptrs", &vpp).unwrap(), ManagedType::BufferArray(None));
    }

    #[test]
    fn triple_indirection_is_fatal() {
        let mut i = TypeInterner::new();
        let int = i.primitive(CPrimitive::Int32);
        let p1 = i.pointer_to(int, false);
        let p2 = i.pointer_to(p1, false);
        let p3 = i.pointer_to(p2, false);
        assert!(matches!(
            map_type("f", "p", &p3),
            Err(BindError::PointerTooDeep { depth: 3, .. })
        ));
    }

    #[test]
    fn text_directive_coerces_byte_pointers_only() {
        let mut i = TypeInterner::new();
        let ch = i.primitive(CPrimitive::Char8);
        let int = i.primitive(CPrimitive::Int32);
        let cp = i.pointer_to(ch.clone(), true);
        let cpp = i.pointer_to(cp.clone(), true);
        let ip = i.pointer_to(int, true);

        let mut d = directives();
        d.text_args.insert(0);

        let text = map_argument("f", 0, &NativeArg::new(cp, Some("name")), &d).unwrap();
        assert_eq!(text, ManagedType::Text);
        let texts = map_argument("f", 0, &NativeArg::new(cpp, Some("names")), &d).unwrap();
        assert_eq!(texts, ManagedType::TextArray);
        let err = map_argument("f", 0, &NativeArg::new(ip, Some("n")), &d).unwrap_err();
        assert!(matches!(err, BindError::Config(ConfigError::TextCoercionShape { index: 0, .. })));
    }

    #[test]
    fn text_return_requires_byte_pointer() {
        let mut i = TypeInterner::new();
        let ch = i.primitive(CPrimitive::Char8);
        let cp = i.pointer_to(ch, true);
        let int = i.primitive(CPrimitive::Int32);

        let mut d = directives();
        d.text_return = true;
        assert_eq!(map_return("f", &cp, &d).unwrap(), ManagedType::Text);
        assert!(matches!(
            map_return("f", &int, &d),
            Err(BindError::Config(ConfigError::TextReturnShape { .. }))
        ));
    }
}
