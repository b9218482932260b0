//! Linkage-name mangling for generated native methods.
//!
//! The hosting runtime's dynamic linker resolves a declared native method
//! to an exported shim symbol by name. That name is a fixed, externally
//! defined contract: `prefix_mangledOwnerPath_mangledMethodName`, with a
//! `__`-separated argument signature appended only when the method name is
//! overloaded. The character transform (`_` → `_1`, `.` → `_`, other
//! non-alphanumerics → `_0xxxx`) and the per-type codes must match the
//! runtime bit-for-bit; nothing here is a stylistic choice.

use miette::Diagnostic;
use solder_bind::{ManagedType, PrimitiveKind};
use thiserror::Error;

/// Errors from mangling a concrete binding.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum MangleError {
    /// The binding still carries an unexpanded or unmangleable slot; only
    /// fully concrete variants reach the mangler.
    #[error("`{method}`: type `{ty}` has no linkage signature code")]
    #[diagnostic(code(solder::mangle::unmangleable))]
    Unmangleable { method: String, ty: String },
}

/// Build-global mangling environment: the exported-symbol prefix, the
/// class paths behind the object type codes, and the opaque addressing
/// mode toggle (global per build, not per function).
#[derive(Debug, Clone)]
pub struct MangleEnv {
    pub prefix: String,
    /// When set, every non-primitive argument mangles as one fixed object
    /// class instead of its real type.
    pub opaque_mode: bool,
    pub text_class: String,
    pub buffer_class: String,
    /// Package holding the generated compound wrapper classes. Empty means
    /// the wrappers sit in the default package.
    pub wrapper_package: String,
    /// Substitute class used for every non-primitive argument in opaque
    /// mode.
    pub opaque_class: String,
}

impl Default for MangleEnv {
    fn default() -> Self {
        MangleEnv {
            prefix: "Java".into(),
            opaque_mode: false,
            text_class: "java.lang.String".into(),
            buffer_class: "java.nio.Buffer".into(),
            wrapper_package: String::new(),
            opaque_class: "java.lang.Object".into(),
        }
    }
}

impl MangleEnv {
    fn typed_buffer_class(&self, kind: PrimitiveKind) -> String {
        let stem = match kind {
            PrimitiveKind::Bool | PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        };
        format!("java.nio.{stem}Buffer")
    }

    fn wrapper_class(&self, name: &str) -> String {
        if self.wrapper_package.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.wrapper_package)
        }
    }
}

/// Applies the identifier transform: `_` → `_1`, `.` → `_`, alphanumerics
/// unchanged, anything else escaped as `_0xxxx`.
pub fn mangle_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '_' => out.push_str("_1"),
            '.' => out.push('_'),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => out.push_str(&format!("_0{:04x}", c as u32)),
        }
    }
    out
}

/// The short-form symbol: final unless the method name is overloaded.
pub fn short_name(env: &MangleEnv, package: &str, owner: &str, method: &str) -> String {
    let owner_path = if package.is_empty() {
        owner.to_owned()
    } else {
        format!("{package}.{owner}")
    };
    format!(
        "{}_{}_{}",
        env.prefix,
        mangle_identifier(&owner_path),
        mangle_identifier(method)
    )
}

/// The exported symbol for one concrete binding.
///
/// `receiver` and context arguments never appear in the signature; the
/// long form (`__` + per-argument codes) is appended only when
/// `overloaded` says another entry point shares this owner and name.
pub fn linkage_name(
    env: &MangleEnv,
    package: &str,
    owner: &str,
    method: &str,
    args: &[ManagedType],
    receiver: Option<usize>,
    overloaded: bool,
) -> Result<String, MangleError> {
    let mut name = short_name(env, package, owner, method);
    if !overloaded {
        return Ok(name);
    }
    name.push_str("__");
    for (i, arg) in args.iter().enumerate() {
        if arg.is_context() || receiver == Some(i) {
            continue;
        }
        name.push_str(&type_code(env, method, arg)?);
    }
    Ok(name)
}

fn primitive_code(kind: PrimitiveKind) -> char {
    match kind {
        PrimitiveKind::Bool => 'Z',
        PrimitiveKind::Byte => 'B',
        PrimitiveKind::Char => 'C',
        PrimitiveKind::Short => 'S',
        PrimitiveKind::Int => 'I',
        PrimitiveKind::Long => 'J',
        PrimitiveKind::Float => 'F',
        PrimitiveKind::Double => 'D',
    }
}

fn object_code(class_path: &str) -> String {
    format!("L{}_2", mangle_identifier(class_path))
}

fn type_code(env: &MangleEnv, method: &str, ty: &ManagedType) -> Result<String, MangleError> {
    if env.opaque_mode {
        if let ManagedType::Primitive(k) = ty {
            return Ok(primitive_code(*k).to_string());
        }
        return Ok(object_code(&env.opaque_class));
    }
    Ok(match ty {
        ManagedType::Primitive(k) => primitive_code(*k).to_string(),
        ManagedType::PrimitiveArray(k) => format!("_3{}", primitive_code(*k)),
        ManagedType::Text => object_code(&env.text_class),
        ManagedType::TextArray => format!("_3{}", object_code(&env.text_class)),
        ManagedType::Buffer => object_code(&env.buffer_class),
        ManagedType::TypedBuffer(k) => object_code(&env.typed_buffer_class(*k)),
        ManagedType::BufferArray(Some(k)) => format!("_3{}", object_code(&env.typed_buffer_class(*k))),
        ManagedType::BufferArray(None) => format!("_3{}", object_code(&env.buffer_class)),
        ManagedType::CompoundWrapper(name) => object_code(&env.wrapper_class(name)),
        ManagedType::CompoundArray(name) => format!("_3{}", object_code(&env.wrapper_class(name))),
        other @ (ManagedType::Void
        | ManagedType::RuntimeContext
        | ManagedType::OpaquePointer
        | ManagedType::TypedPointer(_)) => {
            return Err(MangleError::Unmangleable {
                method: method.to_owned(),
                ty: other.to_string(),
            })
        }
    })
}
