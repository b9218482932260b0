//! Pre-parsed per-function generator directives.
//!
//! The line-oriented directive file format and its parser are out of scope;
//! by the time the generator runs, configuration has been resolved into the
//! plain structs here. Directive *usage* is still validated against the
//! actual native shapes during binding and planning, producing
//! [`ConfigError`]s.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Whether array-backed overloads are emitted for pointer arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayPolicy {
    /// Emit array overloads (the default).
    #[default]
    Default,
    /// Suppress every array-backed overload for this function.
    Suppressed,
}

/// Whether buffer-backed overloads are emitted for pointer arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Generic buffers for untyped pointers only (the default). Typed
    /// pointers get no buffer overload.
    #[default]
    Default,
    /// Suppress every buffer-backed overload for this function.
    Suppressed,
    /// Additionally emit precisely-typed buffers for typed pointers.
    Typed,
}

/// Directives applying to a single native function.
#[derive(Debug, Clone)]
pub struct FnDirectives {
    pub array_policy: ArrayPolicy,
    pub buffer_policy: BufferPolicy,
    /// Groups of argument positions that must share one managed type in
    /// every retained variant. Each group must name at least two positions.
    pub mirrored: Vec<Vec<usize>>,
    /// Capacity expression for a pointer/buffer return value; falls back to
    /// the target type's declared size when absent.
    pub return_capacity: Option<String>,
    /// Length expression required for an array-of-compound return value.
    pub return_length: Option<String>,
    /// Argument positions coerced from 8-bit pointers to managed strings.
    pub text_args: FxHashSet<usize>,
    /// Coerce an 8-bit-pointer return to a managed string.
    pub text_return: bool,
    /// Keep the binding and linkage name but emit no shim body; the user
    /// supplies the implementation.
    pub manual_body: bool,
    /// Collapse mixed array/buffer variants into uniform families.
    pub flatten: bool,
}

impl Default for FnDirectives {
    fn default() -> Self {
        FnDirectives {
            array_policy: ArrayPolicy::Default,
            buffer_policy: BufferPolicy::Default,
            mirrored: Vec::new(),
            return_capacity: None,
            return_length: None,
            text_args: FxHashSet::default(),
            text_return: false,
            manual_body: false,
            flatten: true,
        }
    }
}

/// The full directive set for one generator run.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    per_function: FxHashMap<String, FnDirectives>,
    fallback: FnDirectives,
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, function: impl Into<String>, directives: FnDirectives) {
        self.per_function.insert(function.into(), directives);
    }

    /// Directives for a function, falling back to the defaults.
    pub fn directives_for(&self, function: &str) -> &FnDirectives {
        self.per_function.get(function).unwrap_or(&self.fallback)
    }
}

/// Invalid directive usage, detected once directives meet actual native
/// shapes. Fatal for the affected function only.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{symbol}`: text coercion on argument {index} requires a single-level 8-bit pointer")]
    #[diagnostic(code(solder::config::text_coercion_shape))]
    TextCoercionShape { symbol: String, index: usize },

    #[error("`{symbol}`: text coercion on the return value requires an 8-bit pointer return")]
    #[diagnostic(code(solder::config::text_return_shape))]
    TextReturnShape { symbol: String },

    #[error("`{symbol}`: return-length directive requires an array-of-compound return")]
    #[diagnostic(code(solder::config::return_length_shape))]
    ReturnLengthShape { symbol: String },

    #[error("`{symbol}`: return-capacity directive requires a pointer or buffer return")]
    #[diagnostic(code(solder::config::capacity_on_non_buffer))]
    CapacityOnNonBuffer { symbol: String },

    #[error("`{symbol}`: mirrored-argument group names {len} position(s); at least two are required")]
    #[diagnostic(code(solder::config::mirrored_group_too_small))]
    MirroredGroupTooSmall { symbol: String, len: usize },

    #[error("`{symbol}`: mirrored-argument position {index} is out of range for {arg_count} argument(s)")]
    #[diagnostic(code(solder::config::mirrored_position_out_of_range))]
    MirroredPositionOutOfRange { symbol: String, index: usize, arg_count: usize },
}
