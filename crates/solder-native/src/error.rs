use miette::Diagnostic;
use solder_model::ConfigError;
use thiserror::Error;

/// Errors during marshaling-plan derivation. All are fatal for the
/// affected symbol only; the generator records the reason and moves on.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum PlanError {
    #[error("`{symbol}`: argument `{arg}` is still unexpanded; only concrete variants can be planned")]
    #[diagnostic(code(solder::plan::unexpanded_binding))]
    UnexpandedBinding { symbol: String, arg: String },

    #[error("`{symbol}`: argument `{arg}` is a non-const nested pointer; no write-back semantics exist for copied element tables")]
    #[diagnostic(code(solder::plan::nested_write_back))]
    NestedWriteBack { symbol: String, arg: String },

    #[error("`{symbol}`: argument `{arg}` nests {depth} levels deep; copy planning supports at most 2")]
    #[diagnostic(code(solder::plan::nesting_too_deep))]
    NestingTooDeep { symbol: String, arg: String, depth: usize },

    #[error("`{symbol}`: an array-of-compound return requires a declared length expression")]
    #[diagnostic(code(solder::plan::missing_length_expr))]
    MissingLengthExpr { symbol: String },

    #[error("`{symbol}`: argument `{arg}` has unbalanced acquire/release ops: {detail}")]
    #[diagnostic(code(solder::plan::unbalanced_frame))]
    UnbalancedFrame { symbol: String, arg: String, detail: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
