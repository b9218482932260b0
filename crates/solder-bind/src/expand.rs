//! Worklist-based expansion of pointer slots into concrete overload
//! families.
//!
//! One seed binding containing `OpaquePointer`/`TypedPointer` slots yields
//! a deduplicated set of concrete bindings: array-backed and buffer-backed
//! clones per slot, filtered by the mirrored-argument directive and the
//! array/buffer flattening rule. Deduplication is keyed by the
//! family-identity tuple (managed argument types plus managed return type),
//! so no two retained variants can collide as managed overloads.

use crate::binding::MethodBinding;
use crate::error::BindError;
use crate::managed::{Family, ManagedType, PrimitiveKind};
use rustc_hash::FxHashSet;
use solder_model::{ArrayPolicy, BufferPolicy, ConfigError, FnDirectives};
use std::collections::VecDeque;

/// Expands one seed binding into its full deduplicated variant family.
///
/// An empty result is not an error: directives may legitimately eliminate
/// every representation, leaving the native symbol unbound.
pub fn expand(seed: MethodBinding, directives: &FnDirectives) -> Result<Vec<MethodBinding>, BindError> {
    validate_mirrored(&seed, directives)?;

    // Argument positions that carried a pointer before expansion; the
    // flattening rule applies only to these.
    let pointer_positions: Vec<usize> = seed
        .args()
        .iter()
        .enumerate()
        .filter(|(_, a)| a.needs_expansion())
        .map(|(i, _)| i)
        .collect();

    let mut work: VecDeque<MethodBinding> = VecDeque::new();
    let mut seen: FxHashSet<(Vec<ManagedType>, ManagedType)> = FxHashSet::default();
    let mut result: Vec<MethodBinding> = Vec::new();

    seen.insert(seed.family_key());
    work.push_back(seed);

    while let Some(binding) = work.pop_front() {
        match next_unexpanded(&binding) {
            None => result.push(binding),
            Some(Slot::Arg(j)) => {
                let slot_ty = binding.args()[j].clone();
                for candidate in argument_candidates(&slot_ty, directives) {
                    let mut clone = binding.deep_clone();
                    clone.set_arg(j, candidate);
                    if seen.insert(clone.family_key()) {
                        work.push_back(clone);
                    }
                }
            }
            Some(Slot::Return) => {
                // A native pointer return is never itself a valid managed
                // return type; it wraps as a buffer and the original is
                // always dropped.
                for candidate in return_candidates(binding.ret()) {
                    let mut clone = binding.deep_clone();
                    clone.set_ret(candidate);
                    if seen.insert(clone.family_key()) {
                        work.push_back(clone);
                    }
                }
            }
        }
    }

    apply_mirrored(&mut result, directives);
    if directives.flatten {
        apply_flattening(&mut result, &pointer_positions);
    }

    log::debug!(
        "expanded `{}` into {} variant(s)",
        result.first().map(|b| b.symbol().name.as_str()).unwrap_or("<none>"),
        result.len()
    );
    Ok(result)
}

enum Slot {
    Arg(usize),
    Return,
}

fn next_unexpanded(binding: &MethodBinding) -> Option<Slot> {
    if let Some((j, _)) = binding
        .args()
        .iter()
        .enumerate()
        .find(|(_, a)| a.needs_expansion())
    {
        return Some(Slot::Arg(j));
    }
    binding.ret().needs_expansion().then_some(Slot::Return)
}

/// Concrete representations for one unexpanded argument slot.
///
/// An opaque `void*` fans out to every primitive array kind plus `Text` —
/// the nine array-family candidates — and, policy permitting, the generic
/// buffer. A typed pointer fans out only to its matching array kind, with a
/// precisely-typed buffer solely on explicit request.
fn argument_candidates(slot: &ManagedType, directives: &FnDirectives) -> Vec<ManagedType> {
    let arrays_on = directives.array_policy != ArrayPolicy::Suppressed;
    let buffers_on = directives.buffer_policy != BufferPolicy::Suppressed;
    let mut out = Vec::new();
    match slot {
        ManagedType::OpaquePointer => {
            if arrays_on {
                out.extend(PrimitiveKind::ALL.iter().map(|k| ManagedType::PrimitiveArray(*k)));
                out.push(ManagedType::Text);
            }
            if buffers_on {
                out.push(ManagedType::Buffer);
            }
        }
        ManagedType::TypedPointer(k) => {
            if arrays_on {
                out.push(ManagedType::PrimitiveArray(*k));
            }
            if directives.buffer_policy == BufferPolicy::Typed {
                out.push(ManagedType::TypedBuffer(*k));
            }
        }
        _ => {}
    }
    out
}

fn return_candidates(slot: &ManagedType) -> Vec<ManagedType> {
    match slot {
        ManagedType::OpaquePointer => vec![ManagedType::Buffer],
        ManagedType::TypedPointer(k) => vec![ManagedType::TypedBuffer(*k)],
        _ => Vec::new(),
    }
}

fn validate_mirrored(seed: &MethodBinding, directives: &FnDirectives) -> Result<(), BindError> {
    let symbol = &seed.symbol().name;
    let arg_count = seed.args().len();
    for group in &directives.mirrored {
        if group.len() < 2 {
            return Err(ConfigError::MirroredGroupTooSmall {
                symbol: symbol.clone(),
                len: group.len(),
            }
            .into());
        }
        for &index in group {
            if index >= arg_count {
                return Err(ConfigError::MirroredPositionOutOfRange {
                    symbol: symbol.clone(),
                    index,
                    arg_count,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Drops variants where a mirrored group's positions are not pairwise
/// equal.
fn apply_mirrored(variants: &mut Vec<MethodBinding>, directives: &FnDirectives) {
    if directives.mirrored.is_empty() {
        return;
    }
    variants.retain(|binding| {
        directives.mirrored.iter().all(|group| {
            let first = &binding.args()[group[0]];
            group[1..].iter().all(|&i| &binding.args()[i] == first)
        })
    });
}

/// Drops variants that mix array-backed and buffer-backed representations
/// across the originally-pointer-bearing argument positions. This bounds
/// the output to the two internally consistent families.
fn apply_flattening(variants: &mut Vec<MethodBinding>, pointer_positions: &[usize]) {
    if pointer_positions.len() < 2 {
        return;
    }
    variants.retain(|binding| {
        let mut family: Option<Family> = None;
        for &p in pointer_positions {
            let Some(f) = binding.args()[p].family() else { continue };
            match family {
                None => family = Some(f),
                Some(existing) if existing != f => return false,
                Some(_) => {}
            }
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;
    use solder_model::{CPrimitive, FunctionSymbol, NativeArg, TypeInterner};
    use std::sync::Arc;

    fn seed_fn(i: &mut TypeInterner, name: &str, arg_types: Vec<ManagedType>) -> MethodBinding {
        let void = i.void();
        let placeholder = i.primitive(CPrimitive::Int32);
        let native_args = (0..arg_types.len())
            .map(|k| NativeArg::new(placeholder.clone(), Some(format!("a{k}").as_str())))
            .collect();
        let symbol = Arc::new(FunctionSymbol::new(name, void, native_args));
        MethodBinding::new(symbol, ManagedType::Void, arg_types, None)
    }

    #[test]
    fn opaque_pointer_yields_nine_array_variants_plus_buffer() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(&mut i, "f", vec![ManagedType::OpaquePointer]);
        let variants = expand(seed, &FnDirectives::default()).unwrap();
        assert_eq!(variants.len(), 10);
        let array_backed = variants
            .iter()
            .filter(|v| v.args()[0].family() == Some(Family::Array))
            .count();
        let buffer_backed = variants
            .iter()
            .filter(|v| v.args()[0] == ManagedType::Buffer)
            .count();
        assert_eq!(array_backed, 9);
        assert_eq!(buffer_backed, 1);
    }

    #[test]
    fn typed_pointer_with_default_policy_yields_matching_array_only() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(&mut i, "g", vec![ManagedType::TypedPointer(PrimitiveKind::Int)]);
        let variants = expand(seed, &FnDirectives::default()).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].args()[0], ManagedType::PrimitiveArray(PrimitiveKind::Int));
    }

    #[test]
    fn typed_pointer_buffer_emission_is_opt_in() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(&mut i, "g", vec![ManagedType::TypedPointer(PrimitiveKind::Float)]);
        let directives = FnDirectives { buffer_policy: BufferPolicy::Typed, ..Default::default() };
        let variants = expand(seed, &directives).unwrap();
        let types: Vec<_> = variants.iter().map(|v| v.args()[0].clone()).collect();
        assert!(types.contains(&ManagedType::PrimitiveArray(PrimitiveKind::Float)));
        assert!(types.contains(&ManagedType::TypedBuffer(PrimitiveKind::Float)));
        assert_eq!(variants.len(), 2);
    }

    #[test]
    fn no_two_variants_share_an_identity_tuple() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(
            &mut i,
            "h",
            vec![ManagedType::OpaquePointer, ManagedType::OpaquePointer],
        );
        let directives = FnDirectives { flatten: false, ..Default::default() };
        let variants = expand(seed, &directives).unwrap();
        let mut keys = FxHashSet::default();
        for v in &variants {
            assert!(keys.insert(v.family_key()), "duplicate identity tuple");
        }
        assert_eq!(variants.len(), 100);
    }

    #[test]
    fn flattening_keeps_only_uniform_families() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(
            &mut i,
            "h",
            vec![ManagedType::OpaquePointer, ManagedType::OpaquePointer],
        );
        let variants = expand(seed, &FnDirectives::default()).unwrap();
        // 9x9 array-family combinations plus the single all-buffer variant.
        assert_eq!(variants.len(), 82);
        for v in &variants {
            let fa = v.args()[0].family().unwrap();
            let fb = v.args()[1].family().unwrap();
            assert_eq!(fa, fb, "mixed family variant retained: {:?}", v.family_key());
        }
    }

    #[test]
    fn mirrored_positions_must_share_a_type() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(
            &mut i,
            "swap",
            vec![ManagedType::OpaquePointer, ManagedType::OpaquePointer],
        );
        let directives = FnDirectives { mirrored: vec![vec![0, 1]], ..Default::default() };
        let variants = expand(seed, &directives).unwrap();
        // 9 identical array pairs plus the buffer pair.
        assert_eq!(variants.len(), 10);
        for v in &variants {
            assert_eq!(v.args()[0], v.args()[1]);
        }
    }

    #[test]
    fn mirrored_group_of_one_is_a_configuration_error() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(&mut i, "f", vec![ManagedType::OpaquePointer]);
        let directives = FnDirectives { mirrored: vec![vec![0]], ..Default::default() };
        let err = expand(seed, &directives).unwrap_err();
        assert!(matches!(
            err,
            BindError::Config(ConfigError::MirroredGroupTooSmall { len: 1, .. })
        ));
    }

    #[test]
    fn suppressing_everything_yields_zero_variants() {
        let mut i = TypeInterner::new();
        let seed = seed_fn(&mut i, "f", vec![ManagedType::OpaquePointer]);
        let directives = FnDirectives {
            array_policy: ArrayPolicy::Suppressed,
            buffer_policy: BufferPolicy::Suppressed,
            ..Default::default()
        };
        let variants = expand(seed, &directives).unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn pointer_return_wraps_as_typed_buffer() {
        let mut i = TypeInterner::new();
        let mut seed = seed_fn(&mut i, "alloc", vec![]);
        seed.set_ret(ManagedType::TypedPointer(PrimitiveKind::Byte));
        let variants = expand(seed, &FnDirectives::default()).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].ret(), &ManagedType::TypedBuffer(PrimitiveKind::Byte));
    }
}
