use miette::Diagnostic;
use solder_bind::BindError;
use solder_layout::LayoutError;
use solder_mangle::MangleError;
use solder_native::PlanError;
use thiserror::Error;

/// Any per-symbol failure during one generation pass. These never abort
/// the pass; the generator turns them into skip-report entries.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum GenerateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mangle(#[from] MangleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),
}
