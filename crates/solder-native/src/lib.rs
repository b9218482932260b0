//! Native-side marshaling planner.
//!
//! For every retained method binding this crate derives a per-argument
//! [`MarshalPlan`] and the structured shim frame the source emitters render
//! into C: which arguments pin, which copy, which extract, where the
//! byte/element offsets come from, and the acquire/release pairs on both
//! the null and non-null paths. The planner is a pure function of the
//! binding and its directives — it never mutates the binding and caches
//! nothing across bindings.
//!
//! The core correctness property of the emitted shim is that every acquire
//! has exactly one matching release on every exit path;
//! [`frame::check_balance`] verifies that statically for every plan before
//! it leaves this crate.

pub mod error;
pub mod frame;
pub mod plan;

pub use error::PlanError;
pub use frame::{check_balance, ArgFrame, FrameOp, ShimFrame};
pub use plan::{plan_binding, CapacityExpr, ElementStrategy, MarshalPlan, RetPlan};
