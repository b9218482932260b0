use solder_model::CPrimitive;
use std::fmt;

/// A managed primitive kind. One-to-one with the hosting runtime's
/// primitive types and their one-letter linkage codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Every managed primitive kind, in canonical emission order.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Size in bytes of one element in a managed array of this kind.
    pub fn element_size(self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Byte => 1,
            PrimitiveKind::Char | PrimitiveKind::Short => 2,
            PrimitiveKind::Int | PrimitiveKind::Float => 4,
            PrimitiveKind::Long | PrimitiveKind::Double => 8,
        }
    }

    /// The managed kind a resolved C primitive maps to.
    pub fn from_native(prim: CPrimitive) -> PrimitiveKind {
        match prim {
            CPrimitive::Bool => PrimitiveKind::Bool,
            CPrimitive::Char8 | CPrimitive::Int8 | CPrimitive::UInt8 => PrimitiveKind::Byte,
            CPrimitive::Int16 => PrimitiveKind::Short,
            CPrimitive::UInt16 => PrimitiveKind::Char,
            CPrimitive::Int32 | CPrimitive::UInt32 => PrimitiveKind::Int,
            CPrimitive::Int64 | CPrimitive::UInt64 => PrimitiveKind::Long,
            CPrimitive::Float32 => PrimitiveKind::Float,
            CPrimitive::Float64 => PrimitiveKind::Double,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

/// Which uniform family an expanded pointer slot landed in. Used by the
/// flattening rule: a retained variant must not mix the two across its
/// originally-pointer arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Array,
    Buffer,
}

/// The managed-side representation of one argument or return slot.
///
/// Value-equality over variant and payload is the basis of overload
/// deduplication, so every payload type here is `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManagedType {
    Void,
    /// The call-context handle. Present in every shim, never surfaced to
    /// managed callers and never mangled.
    RuntimeContext,
    Primitive(PrimitiveKind),
    /// An array-backed expansion of a pointer slot.
    PrimitiveArray(PrimitiveKind),
    Text,
    /// `char**` coerced by directive to an array of managed strings.
    TextArray,
    /// A single-level `void*`, awaiting expansion.
    OpaquePointer,
    /// A single-level pointer to a primitive, awaiting expansion.
    TypedPointer(PrimitiveKind),
    /// A generic native-backed buffer.
    Buffer,
    /// A precisely-typed native-backed buffer.
    TypedBuffer(PrimitiveKind),
    /// A double-level pointer: an array of typed (`Some`) or generic
    /// (`None`) buffers.
    BufferArray(Option<PrimitiveKind>),
    /// An accessor object over one native compound region.
    CompoundWrapper(String),
    /// An array of compound accessors sliced out of one allocation.
    CompoundArray(String),
}

impl ManagedType {
    pub fn is_context(&self) -> bool {
        matches!(self, ManagedType::RuntimeContext)
    }

    /// Whether this slot still awaits expansion into concrete overloads.
    pub fn needs_expansion(&self) -> bool {
        matches!(self, ManagedType::OpaquePointer | ManagedType::TypedPointer(_))
    }

    /// The uniform family an expanded slot belongs to, if any. `Text`
    /// counts as array-backed: a string is marshaled from array-shaped
    /// storage, never through a direct buffer address.
    pub fn family(&self) -> Option<Family> {
        match self {
            ManagedType::PrimitiveArray(_) | ManagedType::Text | ManagedType::TextArray => {
                Some(Family::Array)
            }
            ManagedType::Buffer | ManagedType::TypedBuffer(_) | ManagedType::BufferArray(_) => {
                Some(Family::Buffer)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedType::Void => write!(f, "void"),
            ManagedType::RuntimeContext => write!(f, "<context>"),
            ManagedType::Primitive(k) => write!(f, "{}", k.name()),
            ManagedType::PrimitiveArray(k) => write!(f, "{}[]", k.name()),
            ManagedType::Text => write!(f, "String"),
            ManagedType::TextArray => write!(f, "String[]"),
            ManagedType::OpaquePointer => write!(f, "<void*>"),
            ManagedType::TypedPointer(k) => write!(f, "<{}*>", k.name()),
            ManagedType::Buffer => write!(f, "Buffer"),
            ManagedType::TypedBuffer(k) => write!(f, "{}Buffer", k.name()),
            ManagedType::BufferArray(Some(k)) => write!(f, "{}Buffer[]", k.name()),
            ManagedType::BufferArray(None) => write!(f, "Buffer[]"),
            ManagedType::CompoundWrapper(name) => write!(f, "{name}"),
            ManagedType::CompoundArray(name) => write!(f, "{name}[]"),
        }
    }
}
