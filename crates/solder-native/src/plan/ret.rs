//! Return-value marshaling plans.

use crate::error::PlanError;
use crate::plan::{CapacityExpr, RetPlan};
use solder_bind::ManagedType;
use solder_model::{ConfigError, FnDirectives, FunctionSymbol, TypeKind};

pub(super) fn plan_return(
    symbol: &FunctionSymbol,
    managed: &ManagedType,
    directives: &FnDirectives,
) -> Result<RetPlan, PlanError> {
    let is_buffer_ret = matches!(managed, ManagedType::Buffer | ManagedType::TypedBuffer(_));
    if directives.return_capacity.is_some() && !is_buffer_ret {
        return Err(ConfigError::CapacityOnNonBuffer { symbol: symbol.name.clone() }.into());
    }
    if directives.return_length.is_some() && !matches!(managed, ManagedType::CompoundArray(_)) {
        return Err(ConfigError::ReturnLengthShape { symbol: symbol.name.clone() }.into());
    }

    match managed {
        ManagedType::Void => Ok(RetPlan::Void),
        ManagedType::Primitive(_) => Ok(RetPlan::Primitive),
        ManagedType::Text => Ok(RetPlan::Text),

        ManagedType::Buffer | ManagedType::TypedBuffer(_) => {
            let capacity = match &directives.return_capacity {
                Some(expr) => CapacityExpr::Expression(expr.clone()),
                None => {
                    let size = return_target_size(symbol);
                    log::warn!(
                        "`{}`: no return-capacity expression; falling back to the target type's declared size ({size})",
                        symbol.name
                    );
                    CapacityExpr::Declared(size)
                }
            };
            Ok(RetPlan::Buffer { capacity })
        }

        ManagedType::CompoundWrapper(name) => Ok(RetPlan::Compound {
            name: name.clone(),
            size: return_target_size(symbol),
        }),

        ManagedType::CompoundArray(name) => {
            let length = directives
                .return_length
                .clone()
                .ok_or_else(|| PlanError::MissingLengthExpr { symbol: symbol.name.clone() })?;
            Ok(RetPlan::CompoundArray {
                name: name.clone(),
                elem_size: return_target_size(symbol),
                length,
            })
        }

        other => Err(PlanError::UnexpandedBinding {
            symbol: symbol.name.clone(),
            arg: format!("return ({other})"),
        }),
    }
}

/// Declared size of what the returned pointer points at; the size of the
/// return type itself when it is not a pointer.
fn return_target_size(symbol: &FunctionSymbol) -> usize {
    match symbol.ret.kind() {
        TypeKind::Pointer { target, .. } => target.size(),
        _ => symbol.ret.size(),
    }
}
