use miette::Diagnostic;
use solder_model::ConfigError;
use thiserror::Error;

/// Errors that abort binding of a single native symbol. The generator
/// skips the symbol, records the reason, and continues with the rest of
/// the module.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum BindError {
    #[error("`{symbol}`: {slot} has unsupported pointer/array nesting depth {depth} (maximum is 2)")]
    #[diagnostic(code(solder::bind::pointer_too_deep))]
    PointerTooDeep { symbol: String, slot: String, depth: usize },

    #[error("`{symbol}`: {slot} has a native shape the mapper does not recognize: {detail}")]
    #[diagnostic(code(solder::bind::unsupported_shape))]
    UnsupportedShape { symbol: String, slot: String, detail: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl BindError {
    pub(crate) fn too_deep(symbol: &str, slot: impl Into<String>, depth: usize) -> Self {
        BindError::PointerTooDeep { symbol: symbol.to_owned(), slot: slot.into(), depth }
    }

    pub(crate) fn unsupported(symbol: &str, slot: impl Into<String>, detail: impl Into<String>) -> Self {
        BindError::UnsupportedShape {
            symbol: symbol.to_owned(),
            slot: slot.into(),
            detail: detail.into(),
        }
    }
}
