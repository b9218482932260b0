//! solder — a foreign-function binding generator.
//!
//! Given an already-resolved model of native (C) function signatures and
//! struct definitions plus per-function directives, one [`Generator`] pass
//! produces, for every native symbol, the deduplicated family of managed
//! entry points (array-backed and buffer-backed overloads), the exported
//! linkage name each shim must carry, and the structured marshaling plan
//! the native shim is rendered from; plus a [`solder_layout::StructLayout`]
//! for every compound the module defines.
//!
//! Processing is all-or-nothing per symbol: an unsupported shape or an
//! invalid directive skips that one symbol with a recorded reason and the
//! pass continues. Nothing half-emitted ever reaches downstream emitters.

mod error;
mod generator;
mod report;

pub use error::GenerateError;
pub use generator::Generator;
pub use report::{BoundSymbol, GenerationReport, SkippedSymbol};

pub use solder_bind::{expand, BindError, ManagedType, MethodBinding, Owner, PrimitiveKind};
pub use solder_mangle::MangleEnv;
pub use solder_native::{MarshalPlan, PlanError, RetPlan, ShimFrame};
