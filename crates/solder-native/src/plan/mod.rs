//! Marshaling-plan derivation for one concrete binding.

mod args;
mod ret;

use crate::error::PlanError;
use crate::frame::{check_balance, ShimFrame};
use solder_bind::MethodBinding;
use solder_model::FnDirectives;

/// The marshaling strategy for one argument slot. Purely a function of the
/// slot's managed/native type pair; stateless and recomputed per binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalPlan {
    /// Primitive or context value, passed unchanged.
    PassThroughPrimitive,
    /// Direct buffer or compound region: resolve the native base address
    /// and, for buffers, add the paired byte-offset parameter.
    DirectAddress { offset_param: Option<String> },
    /// Critical-section pin on a managed array; the paired element offset
    /// is scaled by `elem_size` for the pointer arithmetic.
    PinnedArray { offset_param: String, elem_size: usize },
    /// A pointer table copied element-by-element into native scratch.
    CopiedNestedArray { elem: ElementStrategy },
    /// Characters extracted from a managed string before the call and
    /// released after it.
    ExtractedText,
    /// The receiver argument: resolved once and used as the call's
    /// function-pointer dispatch base.
    ReceiverAddress,
}

/// How each element of a copied nested array reaches native memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementStrategy {
    ExtractedText,
    DirectAddress,
}

/// Capacity of a buffer wrapped around a returned native pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityExpr {
    /// The target type's declared size; used when no capacity expression
    /// was configured (a diagnostic is logged on this fallback).
    Declared(usize),
    /// A user-declared capacity expression, emitted verbatim.
    Expression(String),
}

/// Return-value marshaling for one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetPlan {
    Void,
    /// Primitive passthrough.
    Primitive,
    /// Wrap the returned pointer as a managed string; a null native
    /// pointer yields a null managed string with no wrapping attempted.
    Text,
    /// Wrap the returned pointer as a new native-backed buffer.
    Buffer { capacity: CapacityExpr },
    /// Wrap the single returned compound region.
    Compound { name: String, size: usize },
    /// Slice one contiguous allocation into `length` accessor windows of
    /// `elem_size` bytes each, at `index * elem_size` offsets.
    CompoundArray { name: String, elem_size: usize, length: String },
}

/// Derives the full shim frame for one retained binding.
///
/// Runs the static acquire/release balance check before returning, so no
/// unbalanced plan ever reaches an emitter. The binding itself is never
/// mutated.
pub fn plan_binding(
    binding: &MethodBinding,
    directives: &FnDirectives,
) -> Result<ShimFrame, PlanError> {
    let symbol = binding.symbol();
    let mut frames = Vec::with_capacity(binding.args().len());
    for (index, managed) in binding.args().iter().enumerate() {
        let native = &symbol.args[index];
        frames.push(args::plan_argument(
            symbol,
            index,
            managed,
            native,
            binding.receiver(),
        )?);
    }
    let ret = ret::plan_return(symbol, binding.ret(), directives)?;
    let frame = ShimFrame { symbol: symbol.name.clone(), args: frames, ret };
    check_balance(&frame)?;
    Ok(frame)
}
