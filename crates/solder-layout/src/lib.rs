//! Field-offset and aggregate-size computation for native compounds.
//!
//! Walks a compound's fields in declaration order with a running byte
//! cursor. Scalars self-align to their own size; nested compounds and
//! arrays of compounds align to the platform struct alignment; union
//! members all sit at offset 0 and the union's size is its largest member.
//!
//! The aggregate size is the final cursor value: no trailing padding is
//! added to round a struct up to its own alignment, so an array of structs
//! laid out here packs tighter than the platform C ABI would. Downstream
//! accessor generation relies on these exact offsets.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use solder_model::{CompoundType, NativeModule, TypeKind, POINTER_SIZE};
use thiserror::Error;

/// Errors that can occur during layout computation.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown compound type `{0}`")]
    #[diagnostic(code(solder::layout::unknown_compound))]
    UnknownCompound(String),

    #[error("recursive compound nesting detected for `{0}`")]
    #[diagnostic(code(solder::layout::recursive_compound))]
    RecursiveCompound(String),

    #[error("field `{field}` of `{compound}` has a shape that cannot be laid out")]
    #[diagnostic(code(solder::layout::unsupported_field))]
    UnsupportedField { compound: String, field: String },
}

/// One laid-out field: its name and byte offset from the compound's base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    pub offset: usize,
}

/// The computed layout of one compound type. Immutable once computed;
/// nested compounds each get their own independent layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldSlot>,
    /// Raw cursor size for structs, max member size for unions. See the
    /// module docs about the absence of trailing padding.
    pub size: usize,
}

impl StructLayout {
    pub fn offset_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.offset)
    }
}

/// Computes [`StructLayout`]s against one platform struct alignment.
pub struct LayoutEngine<'m> {
    module: &'m NativeModule,
    struct_align: usize,
    in_progress: FxHashSet<String>,
}

impl<'m> LayoutEngine<'m> {
    /// `struct_align` is the platform struct alignment constant, e.g. 8.
    pub fn new(module: &'m NativeModule, struct_align: usize) -> Self {
        LayoutEngine { module, struct_align, in_progress: FxHashSet::default() }
    }

    /// Lays out the named compound. Recomputed on every call; layouts are
    /// never shared or mutated in place.
    pub fn layout_of(&mut self, name: &str) -> Result<StructLayout, LayoutError> {
        let compound = self
            .module
            .compound(name)
            .ok_or_else(|| LayoutError::UnknownCompound(name.to_owned()))?;
        self.layout_compound(compound)
    }

    pub fn layout_compound(&mut self, compound: &CompoundType) -> Result<StructLayout, LayoutError> {
        if !self.in_progress.insert(compound.name.clone()) {
            return Err(LayoutError::RecursiveCompound(compound.name.clone()));
        }
        let result = self.walk_fields(compound);
        self.in_progress.remove(&compound.name);
        result
    }

    fn walk_fields(&mut self, compound: &CompoundType) -> Result<StructLayout, LayoutError> {
        let mut cursor = 0usize;
        let mut max_member = 0usize;
        let mut fields = Vec::with_capacity(compound.fields.len());

        for (field_name, field_ty) in &compound.fields {
            let (align, size) = self.field_shape(compound, field_name, field_ty)?;
            let offset = if compound.is_union { 0 } else { round_up(cursor, align) };
            fields.push(FieldSlot { name: field_name.clone(), offset });
            if compound.is_union {
                max_member = max_member.max(size);
            } else {
                cursor = offset + size;
            }
        }

        let size = if compound.is_union { max_member } else { cursor };
        Ok(StructLayout { name: compound.name.clone(), fields, size })
    }

    /// Alignment and size of one field. Compound-shaped fields are laid out
    /// first so the size reflects the computed layout, not the declared one.
    fn field_shape(
        &mut self,
        compound: &CompoundType,
        field_name: &str,
        field_ty: &solder_model::NativeType,
    ) -> Result<(usize, usize), LayoutError> {
        match field_ty.kind() {
            TypeKind::Primitive(p) => Ok((p.size(), p.size())),
            TypeKind::Pointer { .. } | TypeKind::Context => Ok((POINTER_SIZE, POINTER_SIZE)),
            TypeKind::Compound { name, .. } => {
                let nested = self
                    .module
                    .compound(name)
                    .ok_or_else(|| LayoutError::UnknownCompound(name.clone()))?
                    .clone();
                let nested_layout = self.layout_compound(&nested)?;
                Ok((self.struct_align, nested_layout.size))
            }
            TypeKind::Array { elem, len } => {
                let (elem_align, elem_size) = self.field_shape(compound, field_name, elem)?;
                // Arrays of compounds take struct alignment; the recursion
                // already returned it for the element.
                Ok((elem_align, elem_size * len))
            }
            TypeKind::Void | TypeKind::Function { .. } => Err(LayoutError::UnsupportedField {
                compound: compound.name.clone(),
                field: field_name.to_owned(),
            }),
        }
    }
}

fn round_up(value: usize, align: usize) -> usize {
    debug_assert!(align > 0);
    value.div_ceil(align) * align
}
