//! Managed-type mapping, the method-binding model, and variant expansion.
//!
//! This crate turns one resolved native function into the family of
//! concrete managed entry points that expose it:
//!
//! 1. [`map`] classifies each native argument/return type into a
//!    [`ManagedType`], leaving untyped/typed pointer slots unexpanded.
//! 2. [`binding::MethodBinding`] pairs the native symbol with the managed
//!    signature and detects receiver slots for struct-bound function
//!    pointers.
//! 3. [`expand`] blows the pointer slots up into the deduplicated set of
//!    array-backed and buffer-backed overloads, applying the per-function
//!    directives and the family-flattening rule.

mod binding;
mod error;
pub mod expand;
pub mod map;
mod managed;

pub use binding::{MethodBinding, Owner};
pub use error::BindError;
pub use expand::expand;
pub use managed::{Family, ManagedType, PrimitiveKind};
