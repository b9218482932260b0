use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Size in bytes of a native pointer on the supported targets.
pub const POINTER_SIZE: usize = 8;

/// A resolved C primitive kind, as classified by the upstream header parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CPrimitive {
    Bool,
    /// Plain `char`. Treated as an 8-bit byte, signedness-agnostic.
    Char8,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl CPrimitive {
    /// Declared size in bytes.
    pub fn size(self) -> usize {
        match self {
            CPrimitive::Bool | CPrimitive::Char8 | CPrimitive::Int8 | CPrimitive::UInt8 => 1,
            CPrimitive::Int16 | CPrimitive::UInt16 => 2,
            CPrimitive::Int32 | CPrimitive::UInt32 | CPrimitive::Float32 => 4,
            CPrimitive::Int64 | CPrimitive::UInt64 | CPrimitive::Float64 => 8,
        }
    }

    /// Whether this is an 8-bit character-shaped kind, i.e. a legal target
    /// for text coercion directives.
    pub fn is_byte_sized(self) -> bool {
        matches!(self, CPrimitive::Char8 | CPrimitive::Int8 | CPrimitive::UInt8)
    }
}

/// Structural classification of a native type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    /// The runtime call-context handle type. Never surfaced to managed
    /// callers; every shim receives it implicitly.
    Context,
    Primitive(CPrimitive),
    /// A struct or union reference. Field lists live on the owning
    /// [`crate::NativeModule`], keyed by name.
    Compound { name: String, is_union: bool },
    Pointer { target: NativeType, is_const: bool },
    Array { elem: NativeType, len: usize },
    /// A bare function type; only meaningful behind a pointer, as a
    /// function-pointer field of a compound.
    Function { ret: NativeType, params: Vec<NativeType> },
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct TypeData {
    kind: TypeKind,
    size: usize,
}

/// A canonical, immutable native type.
///
/// Produced only by [`TypeInterner`]; structurally equal types share one
/// allocation, so equality and hashing are pointer-based.
#[derive(Debug, Clone)]
pub struct NativeType(Arc<TypeData>);

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NativeType {}

impl Hash for NativeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl NativeType {
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Declared size in bytes. Zero for `void`, the context handle, and
    /// bare function types.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// Number of pointer/array indirection levels down to the innermost
    /// non-pointer, non-array type.
    pub fn indirection_depth(&self) -> usize {
        match self.kind() {
            TypeKind::Pointer { target, .. } => 1 + target.indirection_depth(),
            TypeKind::Array { elem, .. } => 1 + elem.indirection_depth(),
            _ => 0,
        }
    }

    /// The innermost non-pointer, non-array type.
    pub fn innermost(&self) -> &NativeType {
        match self.kind() {
            TypeKind::Pointer { target, .. } => target.innermost(),
            TypeKind::Array { elem, .. } => elem.innermost(),
            _ => self,
        }
    }

    /// Whether every indirection level at and below this one is const.
    /// A depth-0 type is trivially const-safe.
    pub fn is_read_only(&self) -> bool {
        match self.kind() {
            TypeKind::Pointer { target, is_const } => *is_const && target.is_read_only(),
            TypeKind::Array { elem, .. } => elem.is_read_only(),
            _ => true,
        }
    }

    /// Whether this is a fixed-length native array at the top level.
    pub fn is_fixed_array(&self) -> bool {
        matches!(self.kind(), TypeKind::Array { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind(), TypeKind::Void)
    }

    pub fn is_context(&self) -> bool {
        matches!(self.kind(), TypeKind::Context)
    }

    /// The primitive kind, if this is a primitive type.
    pub fn as_primitive(&self) -> Option<CPrimitive> {
        match self.kind() {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// The compound name, if this is a struct or union reference.
    pub fn compound_name(&self) -> Option<&str> {
        match self.kind() {
            TypeKind::Compound { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Hash-consing interner for [`NativeType`].
///
/// Children are interned before parents, so structural equality of
/// [`TypeData`] reduces to pointer equality of child types and the map
/// lookup stays cheap.
#[derive(Debug, Default)]
pub struct TypeInterner {
    map: FxHashMap<Arc<TypeData>, NativeType>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: TypeKind, size: usize) -> NativeType {
        let data = Arc::new(TypeData { kind, size });
        if let Some(existing) = self.map.get(&data) {
            return existing.clone();
        }
        let ty = NativeType(data.clone());
        self.map.insert(data, ty.clone());
        ty
    }

    pub fn void(&mut self) -> NativeType {
        self.intern(TypeKind::Void, 0)
    }

    pub fn context(&mut self) -> NativeType {
        self.intern(TypeKind::Context, POINTER_SIZE)
    }

    pub fn primitive(&mut self, prim: CPrimitive) -> NativeType {
        self.intern(TypeKind::Primitive(prim), prim.size())
    }

    pub fn pointer_to(&mut self, target: NativeType, is_const: bool) -> NativeType {
        self.intern(TypeKind::Pointer { target, is_const }, POINTER_SIZE)
    }

    /// A struct/union reference with its parser-declared size.
    pub fn compound(&mut self, name: impl Into<String>, is_union: bool, size: usize) -> NativeType {
        self.intern(
            TypeKind::Compound { name: name.into(), is_union },
            size,
        )
    }

    pub fn array_of(&mut self, elem: NativeType, len: usize) -> NativeType {
        let size = elem.size() * len;
        self.intern(TypeKind::Array { elem, len }, size)
    }

    pub fn function(&mut self, ret: NativeType, params: Vec<NativeType>) -> NativeType {
        self.intern(TypeKind::Function { ret, params }, 0)
    }
}
