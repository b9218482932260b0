//! Resolved native type and symbol model consumed by the binding generator.
//!
//! This crate is the read-only oracle the rest of the pipeline works from:
//! an external header parser has already resolved C declarations into
//! [`NativeType`]s, [`FunctionSymbol`]s and [`CompoundType`]s before any of
//! the generator crates run. Nothing here performs generation; the model is
//! constructed once and never mutated afterwards.
//!
//! Types are canonicalized through [`TypeInterner`]: structurally equal
//! types are reference-identical, so type equality anywhere downstream is a
//! pointer comparison.

pub mod config;
mod symbol;
mod types;

pub use config::{ArrayPolicy, BufferPolicy, ConfigError, FnDirectives, GeneratorConfig};
pub use symbol::{CompoundType, FunctionSymbol, NativeArg, NativeModule};
pub use types::{CPrimitive, NativeType, TypeInterner, TypeKind, POINTER_SIZE};
