use crate::managed::{ManagedType, PrimitiveKind};
use solder_model::{FunctionSymbol, NativeType};
use std::cell::Cell;
use std::sync::Arc;

/// The compound a struct-bound function pointer is dispatched through:
/// its managed wrapper type and the native compound type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub managed: ManagedType,
    pub native: NativeType,
}

/// One managed entry point for a native symbol: the symbol itself, the
/// managed argument/return types, and the owning compound for function
/// pointers stored in structs.
///
/// Bindings are cloned and specialized by the expansion engine; once a
/// variant is finalized and handed to codegen it is never mutated again.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    symbol: Arc<FunctionSymbol>,
    ret: ManagedType,
    args: Vec<ManagedType>,
    owner: Option<Owner>,
    receiver: Option<usize>,
    // Memoized needs_custom_body, cleared by any type mutation.
    custom_body: Cell<Option<bool>>,
}

impl MethodBinding {
    pub fn new(
        symbol: Arc<FunctionSymbol>,
        ret: ManagedType,
        args: Vec<ManagedType>,
        owner: Option<Owner>,
    ) -> Self {
        debug_assert_eq!(symbol.args.len(), args.len());
        MethodBinding { symbol, ret, args, owner, receiver: None, custom_body: Cell::new(None) }
    }

    pub fn symbol(&self) -> &FunctionSymbol {
        &self.symbol
    }

    pub fn symbol_arc(&self) -> Arc<FunctionSymbol> {
        self.symbol.clone()
    }

    pub fn ret(&self) -> &ManagedType {
        &self.ret
    }

    pub fn args(&self) -> &[ManagedType] {
        &self.args
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn receiver(&self) -> Option<usize> {
        self.receiver
    }

    pub fn set_ret(&mut self, ret: ManagedType) {
        self.ret = ret;
        self.custom_body.set(None);
    }

    pub fn set_arg(&mut self, index: usize, ty: ManagedType) {
        self.args[index] = ty;
        self.receiver = None;
        self.custom_body.set(None);
    }

    /// An independently mutable copy for variant specialization. The native
    /// symbol itself is shared (it is immutable); all managed types are
    /// owned by the clone.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// The family-identity tuple: two members of one variant family may
    /// never share it.
    pub fn family_key(&self) -> (Vec<ManagedType>, ManagedType) {
        (self.args.clone(), self.ret.clone())
    }

    /// Scans for the receiver slot: the first argument, skipping context
    /// slots, whose managed type equals the owner's. The scan stops at the
    /// first non-context slot either way — a receiver must be
    /// syntactically leftmost.
    pub fn find_receiver(&mut self) -> Option<usize> {
        self.receiver = None;
        let owner = self.owner.as_ref()?;
        for (i, arg) in self.args.iter().enumerate() {
            if arg.is_context() {
                continue;
            }
            if *arg == owner.managed {
                self.receiver = Some(i);
            }
            break;
        }
        self.receiver
    }

    /// Whether the managed side needs a hand-written wrapper body around
    /// the raw native method: compound wrappers and fixed-length native
    /// arrays need validation/wrapping code the native layer cannot
    /// express one-to-one, as does dispatch through an owner.
    pub fn needs_custom_body(&self) -> bool {
        if let Some(memo) = self.custom_body.get() {
            return memo;
        }
        let computed = self.compute_custom_body();
        self.custom_body.set(Some(computed));
        computed
    }

    fn compute_custom_body(&self) -> bool {
        if self.owner.is_some() {
            return true;
        }
        match &self.ret {
            ManagedType::CompoundWrapper(_) | ManagedType::CompoundArray(_) => return true,
            ManagedType::TypedBuffer(PrimitiveKind::Byte) => return true,
            _ => {}
        }
        if self.args.iter().any(|a| matches!(a, ManagedType::CompoundWrapper(_))) {
            return true;
        }
        self.symbol.args.iter().any(|a| a.ty.is_fixed_array())
    }
}

/// Equality is defined over the native symbol (argument names excluded),
/// the managed return/argument types, and the owner's *native* type —
/// the basis for deduplicating syntactically redundant declarations.
impl PartialEq for MethodBinding {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.ret == other.ret
            && self.args == other.args
            && self.owner.as_ref().map(|o| &o.native) == other.owner.as_ref().map(|o| &o.native)
    }
}

impl Eq for MethodBinding {}

#[cfg(test)]
mod tests {
    use super::*;
    use solder_model::{CPrimitive, NativeArg, TypeInterner};

    fn symbol_with_args(i: &mut TypeInterner, n: usize) -> Arc<FunctionSymbol> {
        let void = i.void();
        let int = i.primitive(CPrimitive::Int32);
        let args = (0..n)
            .map(|k| NativeArg::new(int.clone(), Some(format!("a{k}").as_str())))
            .collect();
        Arc::new(FunctionSymbol::new("cb", void, args))
    }

    fn owner(i: &mut TypeInterner) -> Owner {
        Owner {
            managed: ManagedType::CompoundWrapper("Device".into()),
            native: i.compound("Device", false, 16),
        }
    }

    #[test]
    fn receiver_skips_context_slots() {
        let mut i = TypeInterner::new();
        let sym = symbol_with_args(&mut i, 3);
        let ow = owner(&mut i);
        let mut binding = MethodBinding::new(
            sym,
            ManagedType::Void,
            vec![
                ManagedType::RuntimeContext,
                ManagedType::CompoundWrapper("Device".into()),
                ManagedType::Primitive(PrimitiveKind::Int),
            ],
            Some(ow),
        );
        assert_eq!(binding.find_receiver(), Some(1));
    }

    #[test]
    fn receiver_must_be_leftmost() {
        let mut i = TypeInterner::new();
        let sym = symbol_with_args(&mut i, 2);
        let ow = owner(&mut i);
        // The matching slot sits after a non-context, non-matching one.
        let mut binding = MethodBinding::new(
            sym,
            ManagedType::Void,
            vec![
                ManagedType::Primitive(PrimitiveKind::Int),
                ManagedType::CompoundWrapper("Device".into()),
            ],
            Some(ow),
        );
        assert_eq!(binding.find_receiver(), None);
    }

    #[test]
    fn equality_ignores_native_argument_names() {
        let mut i = TypeInterner::new();
        let void = i.void();
        let int = i.primitive(CPrimitive::Int32);
        let a = Arc::new(FunctionSymbol::new(
            "f",
            void.clone(),
            vec![NativeArg::new(int.clone(), Some("count"))],
        ));
        let b = Arc::new(FunctionSymbol::new("f", void, vec![NativeArg::new(int, Some("n"))]));
        let args = vec![ManagedType::Primitive(PrimitiveKind::Int)];
        let ba = MethodBinding::new(a, ManagedType::Void, args.clone(), None);
        let bb = MethodBinding::new(b, ManagedType::Void, args, None);
        assert_eq!(ba, bb);
    }

    #[test]
    fn custom_body_memo_invalidated_by_mutation() {
        let mut i = TypeInterner::new();
        let sym = symbol_with_args(&mut i, 1);
        let mut binding = MethodBinding::new(
            sym,
            ManagedType::Void,
            vec![ManagedType::Primitive(PrimitiveKind::Int)],
            None,
        );
        assert!(!binding.needs_custom_body());
        binding.set_arg(0, ManagedType::CompoundWrapper("Device".into()));
        assert!(binding.needs_custom_body());
    }

    #[test]
    fn byte_buffer_return_needs_custom_body() {
        let mut i = TypeInterner::new();
        let sym = symbol_with_args(&mut i, 0);
        let binding = MethodBinding::new(
            sym,
            ManagedType::TypedBuffer(PrimitiveKind::Byte),
            vec![],
            None,
        );
        assert!(binding.needs_custom_body());
    }
}
