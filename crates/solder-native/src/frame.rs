//! The structured shim frame: per-argument op sequences on explicit null
//! and non-null paths, and the static acquire/release balance check.

use crate::error::PlanError;
use crate::plan::{MarshalPlan, RetPlan};

/// One operation in the generated shim. Source emitters render these; the
/// planner only guarantees their pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOp {
    /// Pass the managed value through unchanged.
    PassValue,
    /// Null path: pass a null pointer and a zero offset, resolving nothing.
    PassNull,
    /// Resolve a direct buffer's native base address.
    ResolveBufferBase,
    /// Add the paired byte-offset parameter to the resolved base.
    AddByteOffset { param: String },
    /// Open a critical-section pin on the array's backing storage.
    AcquirePin,
    /// Scale the paired element-offset parameter by the element size and
    /// add it to the pinned base.
    ScaleElementOffset { param: String, elem_size: usize },
    /// Close the pin. Write-back is never requested: supported call shapes
    /// do not mutate caller-owned arrays in place.
    ReleasePin { write_back: bool },
    /// Extract the managed string's characters.
    ExtractText,
    /// Release an extracted string.
    ReleaseText,
    /// Allocate a native table of `elem_size`-byte slots, one per element.
    AllocScratch { elem_size: usize },
    /// Free the allocated table.
    FreeScratch,
    /// Run the nested ops once per element of the copied array.
    EachElement(Vec<FrameOp>),
    /// Resolve the receiver argument's base address for call dispatch.
    ResolveReceiver,
}

/// The marshaling frame for one argument: its strategy plus the op
/// sequences for the null path (`pre_null`/`post_null`) and the non-null
/// path (`pre`/`post`). Arguments without null semantics leave the null
/// paths empty and `null_guard` false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgFrame {
    pub name: String,
    pub plan: MarshalPlan,
    pub null_guard: bool,
    pub pre: Vec<FrameOp>,
    pub post: Vec<FrameOp>,
    pub pre_null: Vec<FrameOp>,
    pub post_null: Vec<FrameOp>,
}

impl ArgFrame {
    /// A frame that only passes the value through.
    pub fn pass_through(name: String, plan: MarshalPlan) -> Self {
        ArgFrame {
            name,
            plan,
            null_guard: false,
            pre: vec![FrameOp::PassValue],
            post: Vec::new(),
            pre_null: Vec::new(),
            post_null: Vec::new(),
        }
    }
}

/// The complete plan for one shim: every argument frame plus the
/// return-value plan, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimFrame {
    /// The native symbol the shim calls.
    pub symbol: String,
    pub args: Vec<ArgFrame>,
    pub ret: RetPlan,
}

// Acquire/release op categories for the balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Pin,
    Text,
    Scratch,
}

fn count(ops: &[FrameOp], resource: Resource, acquires: bool) -> usize {
    ops.iter()
        .map(|op| match op {
            FrameOp::AcquirePin if acquires && resource == Resource::Pin => 1,
            FrameOp::ReleasePin { .. } if !acquires && resource == Resource::Pin => 1,
            FrameOp::ExtractText if acquires && resource == Resource::Text => 1,
            FrameOp::ReleaseText if !acquires && resource == Resource::Text => 1,
            FrameOp::AllocScratch { .. } if acquires && resource == Resource::Scratch => 1,
            FrameOp::FreeScratch if !acquires && resource == Resource::Scratch => 1,
            FrameOp::EachElement(inner) => count(inner, resource, acquires),
            _ => 0,
        })
        .sum()
}

/// Statically verifies that every acquire in the frame has exactly one
/// matching release on its own path: pinned arrays, extracted strings and
/// scratch tables must all tear down on the non-null path, and the null
/// path must not acquire anything it does not release.
pub fn check_balance(frame: &ShimFrame) -> Result<(), PlanError> {
    for arg in &frame.args {
        for resource in [Resource::Pin, Resource::Text, Resource::Scratch] {
            check_path(frame, arg, resource, &arg.pre, &arg.post, "non-null")?;
            check_path(frame, arg, resource, &arg.pre_null, &arg.post_null, "null")?;
        }
    }
    Ok(())
}

fn check_path(
    frame: &ShimFrame,
    arg: &ArgFrame,
    resource: Resource,
    pre: &[FrameOp],
    post: &[FrameOp],
    path: &str,
) -> Result<(), PlanError> {
    let acquired = count(pre, resource, true);
    let released = count(post, resource, false) + count(pre, resource, false);
    if acquired != released {
        return Err(PlanError::UnbalancedFrame {
            symbol: frame.symbol.clone(),
            arg: arg.name.clone(),
            detail: format!(
                "{acquired} acquire(s) vs {released} release(s) for {resource:?} on the {path} path"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin_frame(post: Vec<FrameOp>) -> ShimFrame {
        ShimFrame {
            symbol: "f".into(),
            args: vec![ArgFrame {
                name: "data".into(),
                plan: MarshalPlan::PinnedArray {
                    offset_param: "data_offset".into(),
                    elem_size: 4,
                },
                null_guard: true,
                pre: vec![
                    FrameOp::AcquirePin,
                    FrameOp::ScaleElementOffset { param: "data_offset".into(), elem_size: 4 },
                ],
                post,
                pre_null: vec![FrameOp::PassNull],
                post_null: Vec::new(),
            }],
            ret: RetPlan::Void,
        }
    }

    #[test]
    fn balanced_pin_frame_passes() {
        let frame = pin_frame(vec![FrameOp::ReleasePin { write_back: false }]);
        assert!(check_balance(&frame).is_ok());
    }

    #[test]
    fn missing_release_is_detected() {
        let frame = pin_frame(Vec::new());
        assert!(matches!(check_balance(&frame), Err(PlanError::UnbalancedFrame { .. })));
    }

    #[test]
    fn double_release_is_detected() {
        let frame = pin_frame(vec![
            FrameOp::ReleasePin { write_back: false },
            FrameOp::ReleasePin { write_back: false },
        ]);
        assert!(matches!(check_balance(&frame), Err(PlanError::UnbalancedFrame { .. })));
    }

    #[test]
    fn nested_element_ops_are_counted() {
        let frame = ShimFrame {
            symbol: "exec".into(),
            args: vec![ArgFrame {
                name: "argv".into(),
                plan: MarshalPlan::CopiedNestedArray {
                    elem: crate::plan::ElementStrategy::ExtractedText,
                },
                null_guard: true,
                pre: vec![
                    FrameOp::AllocScratch { elem_size: 8 },
                    FrameOp::EachElement(vec![FrameOp::ExtractText]),
                ],
                post: vec![
                    FrameOp::EachElement(vec![FrameOp::ReleaseText]),
                    FrameOp::FreeScratch,
                ],
                pre_null: vec![FrameOp::PassNull],
                post_null: Vec::new(),
            }],
            ret: RetPlan::Void,
        };
        assert!(check_balance(&frame).is_ok());
    }
}
