//! Per-argument marshaling strategy and frame construction.

use crate::error::PlanError;
use crate::frame::{ArgFrame, FrameOp};
use crate::plan::{ElementStrategy, MarshalPlan};
use solder_bind::ManagedType;
use solder_model::{FunctionSymbol, NativeArg, NativeType, TypeKind, POINTER_SIZE};

pub(super) fn plan_argument(
    symbol: &FunctionSymbol,
    index: usize,
    managed: &ManagedType,
    native: &NativeArg,
    receiver: Option<usize>,
) -> Result<ArgFrame, PlanError> {
    let name = native.param_name(index);

    if receiver == Some(index) {
        return Ok(ArgFrame {
            name,
            plan: MarshalPlan::ReceiverAddress,
            null_guard: false,
            pre: vec![FrameOp::ResolveReceiver],
            post: Vec::new(),
            pre_null: Vec::new(),
            post_null: Vec::new(),
        });
    }

    match managed {
        ManagedType::RuntimeContext | ManagedType::Primitive(_) => {
            Ok(ArgFrame::pass_through(name, MarshalPlan::PassThroughPrimitive))
        }

        ManagedType::Buffer | ManagedType::TypedBuffer(_) => {
            let offset_param = format!("{name}_offset");
            Ok(ArgFrame {
                plan: MarshalPlan::DirectAddress { offset_param: Some(offset_param.clone()) },
                null_guard: true,
                pre: vec![
                    FrameOp::ResolveBufferBase,
                    FrameOp::AddByteOffset { param: offset_param },
                ],
                post: Vec::new(),
                pre_null: vec![FrameOp::PassNull],
                post_null: Vec::new(),
                name,
            })
        }

        ManagedType::CompoundWrapper(_) | ManagedType::CompoundArray(_) => Ok(ArgFrame {
            name,
            plan: MarshalPlan::DirectAddress { offset_param: None },
            null_guard: true,
            pre: vec![FrameOp::ResolveBufferBase],
            post: Vec::new(),
            pre_null: vec![FrameOp::PassNull],
            post_null: Vec::new(),
        }),

        ManagedType::PrimitiveArray(kind) => {
            let offset_param = format!("{name}_offset");
            let elem_size = kind.element_size();
            Ok(ArgFrame {
                plan: MarshalPlan::PinnedArray {
                    offset_param: offset_param.clone(),
                    elem_size,
                },
                null_guard: true,
                pre: vec![
                    FrameOp::AcquirePin,
                    FrameOp::ScaleElementOffset { param: offset_param, elem_size },
                ],
                post: vec![FrameOp::ReleasePin { write_back: false }],
                pre_null: vec![FrameOp::PassNull],
                post_null: Vec::new(),
                name,
            })
        }

        ManagedType::Text => Ok(ArgFrame {
            name,
            plan: MarshalPlan::ExtractedText,
            null_guard: true,
            pre: vec![FrameOp::ExtractText],
            post: vec![FrameOp::ReleaseText],
            pre_null: vec![FrameOp::PassNull],
            post_null: Vec::new(),
        }),

        ManagedType::TextArray => {
            nested_copy(symbol, &name, &native.ty, ElementStrategy::ExtractedText)
        }
        ManagedType::BufferArray(_) => {
            nested_copy(symbol, &name, &native.ty, ElementStrategy::DirectAddress)
        }

        ManagedType::OpaquePointer | ManagedType::TypedPointer(_) | ManagedType::Void => {
            Err(PlanError::UnexpandedBinding { symbol: symbol.name.clone(), arg: name })
        }
    }
}

/// A pointer table copied into native scratch: allocate one pointer-sized
/// slot per element, fill each via the element strategy, tear everything
/// down after the call in reverse order.
fn nested_copy(
    symbol: &FunctionSymbol,
    name: &str,
    native: &NativeType,
    elem: ElementStrategy,
) -> Result<ArgFrame, PlanError> {
    let depth = native.indirection_depth();
    if depth > 2 {
        return Err(PlanError::NestingTooDeep {
            symbol: symbol.name.clone(),
            arg: name.to_owned(),
            depth,
        });
    }
    // The copied table cannot be written back; the element level must be
    // const for the copy to be sound.
    let element_read_only = match native.kind() {
        TypeKind::Pointer { target, .. } | TypeKind::Array { elem: target, .. } => {
            target.is_read_only()
        }
        _ => false,
    };
    if !element_read_only {
        return Err(PlanError::NestedWriteBack {
            symbol: symbol.name.clone(),
            arg: name.to_owned(),
        });
    }

    let per_element_pre = match elem {
        ElementStrategy::ExtractedText => vec![FrameOp::ExtractText],
        ElementStrategy::DirectAddress => vec![FrameOp::ResolveBufferBase],
    };
    let per_element_post = match elem {
        ElementStrategy::ExtractedText => vec![FrameOp::ReleaseText],
        ElementStrategy::DirectAddress => Vec::new(),
    };

    let mut post = Vec::new();
    if !per_element_post.is_empty() {
        post.push(FrameOp::EachElement(per_element_post));
    }
    post.push(FrameOp::FreeScratch);

    Ok(ArgFrame {
        name: name.to_owned(),
        plan: MarshalPlan::CopiedNestedArray { elem },
        null_guard: true,
        pre: vec![
            FrameOp::AllocScratch { elem_size: POINTER_SIZE },
            FrameOp::EachElement(per_element_pre),
        ],
        post,
        pre_null: vec![FrameOp::PassNull],
        post_null: Vec::new(),
    })
}
