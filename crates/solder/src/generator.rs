use crate::error::GenerateError;
use crate::report::{BoundSymbol, GenerationReport, SkippedSymbol};
use rustc_hash::FxHashMap;
use solder_bind::{expand, map, ManagedType, MethodBinding, Owner};
use solder_layout::LayoutEngine;
use solder_mangle::{linkage_name, MangleEnv};
use solder_model::{
    FunctionSymbol, GeneratorConfig, NativeArg, NativeModule, TypeInterner, TypeKind,
};
use solder_native::{plan_binding, ShimFrame};
use std::sync::Arc;

/// Default platform struct alignment used for compound layouts.
const DEFAULT_STRUCT_ALIGN: usize = 8;

/// One single-pass batch transform over a resolved native module.
///
/// Symbols are processed independently; the generator imposes no ordering
/// between them beyond the module's declaration order.
pub struct Generator<'a> {
    module: &'a NativeModule,
    config: &'a GeneratorConfig,
    env: MangleEnv,
    struct_align: usize,
}

/// A symbol's variants after expansion and planning, awaiting overload
/// detection and mangling.
struct Planned {
    method: String,
    owner_class: String,
    variants: Vec<MethodBinding>,
    shims: Option<Vec<ShimFrame>>,
}

impl<'a> Generator<'a> {
    pub fn new(module: &'a NativeModule, config: &'a GeneratorConfig) -> Self {
        Generator {
            module,
            config,
            env: MangleEnv::default(),
            struct_align: DEFAULT_STRUCT_ALIGN,
        }
    }

    pub fn with_mangle_env(mut self, env: MangleEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_struct_alignment(mut self, align: usize) -> Self {
        self.struct_align = align;
        self
    }

    /// Runs the pass. `interner` must be the same interner the module's
    /// types were resolved through, so synthesized owner types stay
    /// canonical.
    pub fn run(&self, interner: &mut TypeInterner) -> GenerationReport {
        let mut report = GenerationReport::default();

        self.compute_layouts(&mut report);
        let planned = self.bind_and_plan(interner, &mut report);
        self.mangle_all(planned, &mut report);

        log::info!(
            "generation pass over `{}`: {} entry point(s), {} layout(s), {} skipped, {} unbound",
            self.module.owner,
            report.bound.len(),
            report.layouts.len(),
            report.skipped.len(),
            report.unbound.len()
        );
        report
    }

    fn compute_layouts(&self, report: &mut GenerationReport) {
        let mut engine = LayoutEngine::new(self.module, self.struct_align);
        for compound in self.module.compounds() {
            match engine.layout_compound(compound) {
                Ok(layout) => report.layouts.push(layout),
                Err(err) => {
                    log::warn!("skipping compound `{}`: {err}", compound.name);
                    report.skipped.push(SkippedSymbol {
                        symbol: compound.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// Seeds, expands and plans every symbol. All-or-nothing per symbol:
    /// any error drops the whole symbol into the skip report.
    fn bind_and_plan(
        &self,
        interner: &mut TypeInterner,
        report: &mut GenerationReport,
    ) -> Vec<Planned> {
        let mut planned = Vec::new();
        let mut seen_seeds: Vec<MethodBinding> = Vec::new();

        for (symbol, owner, method) in self.seed_symbols(interner, report) {
            match self.process_symbol(&symbol, owner, &method) {
                Ok((seed, output)) => {
                    // Syntactically redundant declarations dedup by
                    // binding equality, which ignores argument names.
                    if seen_seeds.contains(&seed) {
                        log::debug!("duplicate declaration of `{}` ignored", symbol.name);
                        continue;
                    }
                    seen_seeds.push(seed);
                    match output {
                        Some(p) => planned.push(p),
                        None => report.unbound.push(symbol.name.clone()),
                    }
                }
                Err(err) => {
                    log::warn!("skipping `{}`: {err}", symbol.name);
                    report.skipped.push(SkippedSymbol {
                        symbol: symbol.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        planned
    }

    /// The seed list: every plain function, then one owned symbol per
    /// function-pointer field of each compound.
    fn seed_symbols(
        &self,
        interner: &mut TypeInterner,
        report: &GenerationReport,
    ) -> Vec<(Arc<FunctionSymbol>, Option<Owner>, String)> {
        let mut seeds = Vec::new();
        for function in &self.module.functions {
            seeds.push((Arc::new(function.clone()), None, function.name.clone()));
        }
        for compound in self.module.compounds() {
            let size = report.layout_of(&compound.name).map(|l| l.size).unwrap_or(0);
            for (field, field_ty) in compound.function_pointer_fields() {
                let TypeKind::Pointer { target, .. } = field_ty.kind() else { continue };
                let TypeKind::Function { ret, params } = target.kind() else { continue };
                let args = params
                    .iter()
                    .map(|p| NativeArg::new(p.clone(), None))
                    .collect();
                let symbol = FunctionSymbol::new(
                    format!("{}_{field}", compound.name),
                    ret.clone(),
                    args,
                );
                let owner = Owner {
                    managed: ManagedType::CompoundWrapper(compound.name.clone()),
                    native: interner.compound(&compound.name, compound.is_union, size),
                };
                seeds.push((Arc::new(symbol), Some(owner), field.to_owned()));
            }
        }
        seeds
    }

    /// Maps, expands and plans one symbol. `Ok((seed, None))` means the
    /// directives eliminated every representation.
    fn process_symbol(
        &self,
        symbol: &Arc<FunctionSymbol>,
        owner: Option<Owner>,
        method: &str,
    ) -> Result<(MethodBinding, Option<Planned>), GenerateError> {
        let directives = self.config.directives_for(&symbol.name);

        let ret = map::map_return(&symbol.name, &symbol.ret, directives)?;
        let args = symbol
            .args
            .iter()
            .enumerate()
            .map(|(i, a)| map::map_argument(&symbol.name, i, a, directives))
            .collect::<Result<Vec<_>, _>>()?;

        let owner_class = match &owner {
            Some(o) => match &o.managed {
                ManagedType::CompoundWrapper(name) => name.clone(),
                _ => self.module.owner.clone(),
            },
            None => self.module.owner.clone(),
        };
        let seed = MethodBinding::new(symbol.clone(), ret, args, owner);

        let mut variants = expand(seed.deep_clone(), directives)?;
        if variants.is_empty() {
            return Ok((seed, None));
        }
        for variant in &mut variants {
            variant.find_receiver();
        }

        let shims = if directives.manual_body {
            None
        } else {
            let mut frames = Vec::with_capacity(variants.len());
            for variant in &variants {
                frames.push(plan_binding(variant, directives)?);
            }
            Some(frames)
        };

        Ok((
            seed,
            Some(Planned { method: method.to_owned(), owner_class, variants, shims }),
        ))
    }

    /// Computes overload counts across every retained entry point, then
    /// mangles each variant's linkage name.
    fn mangle_all(&self, planned: Vec<Planned>, report: &mut GenerationReport) {
        let mut counts: FxHashMap<(String, String), usize> = FxHashMap::default();
        for p in &planned {
            *counts
                .entry((p.owner_class.clone(), p.method.clone()))
                .or_default() += p.variants.len();
        }

        for p in planned {
            let overloaded = counts[&(p.owner_class.clone(), p.method.clone())] > 1;
            let shims = match p.shims {
                Some(s) => s.into_iter().map(Some).collect::<Vec<_>>(),
                None => vec![None; p.variants.len()],
            };
            for (variant, shim) in p.variants.into_iter().zip(shims) {
                let name = linkage_name(
                    &self.env,
                    &self.module.package,
                    &p.owner_class,
                    &p.method,
                    variant.args(),
                    variant.receiver(),
                    overloaded,
                );
                match name {
                    Ok(linkage_name) => {
                        report.bound.push(BoundSymbol { binding: variant, linkage_name, shim })
                    }
                    Err(err) => {
                        log::warn!("skipping `{}`: {err}", variant.symbol().name);
                        report.skipped.push(SkippedSymbol {
                            symbol: variant.symbol().name.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
    }
}
