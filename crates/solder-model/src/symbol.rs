use crate::types::NativeType;
use crate::TypeKind;
use rustc_hash::FxHashMap;

/// One argument of a native function: its resolved type and, when the
/// header declared one, its name. Argument names are cosmetic — they never
/// participate in symbol or binding equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeArg {
    pub ty: NativeType,
    pub name: Option<String>,
}

impl NativeArg {
    pub fn new(ty: NativeType, name: Option<&str>) -> Self {
        NativeArg { ty, name: name.map(str::to_owned) }
    }

    /// The name used for generated parameters: the declared name, or a
    /// positional fallback.
    pub fn param_name(&self, index: usize) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("arg{index}"),
        }
    }
}

/// A resolved C function declaration.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub ret: NativeType,
    pub args: Vec<NativeArg>,
}

impl FunctionSymbol {
    pub fn new(name: impl Into<String>, ret: NativeType, args: Vec<NativeArg>) -> Self {
        FunctionSymbol { name: name.into(), ret, args }
    }
}

/// Two symbols are equal when their names and argument/return *types*
/// agree; declared argument names are ignored so that syntactically
/// redundant declarations deduplicate.
impl PartialEq for FunctionSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ret == other.ret
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for FunctionSymbol {}

/// A resolved struct or union definition with its ordered field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundType {
    pub name: String,
    pub is_union: bool,
    pub fields: Vec<(String, NativeType)>,
}

impl CompoundType {
    pub fn new(name: impl Into<String>, is_union: bool, fields: Vec<(String, NativeType)>) -> Self {
        CompoundType { name: name.into(), is_union, fields }
    }

    /// Function-pointer fields, in declaration order. Each becomes an
    /// owned [`FunctionSymbol`] dispatched through the compound.
    pub fn function_pointer_fields(&self) -> impl Iterator<Item = (&str, &NativeType)> {
        self.fields.iter().filter_map(|(name, ty)| match ty.kind() {
            TypeKind::Pointer { target, .. } if matches!(target.kind(), TypeKind::Function { .. }) => {
                Some((name.as_str(), ty))
            }
            _ => None,
        })
    }
}

/// The whole resolved input to one generator run: every function symbol and
/// compound definition the external parser produced, plus the managed
/// namespace the entry points land in.
#[derive(Debug, Clone)]
pub struct NativeModule {
    /// Managed package path, dotted (e.g. `org.toolkit.gl`).
    pub package: String,
    /// Managed class that owns the generated entry points.
    pub owner: String,
    pub functions: Vec<FunctionSymbol>,
    compounds: FxHashMap<String, CompoundType>,
    compound_order: Vec<String>,
}

impl NativeModule {
    pub fn new(package: impl Into<String>, owner: impl Into<String>) -> Self {
        NativeModule {
            package: package.into(),
            owner: owner.into(),
            functions: Vec::new(),
            compounds: FxHashMap::default(),
            compound_order: Vec::new(),
        }
    }

    pub fn add_function(&mut self, symbol: FunctionSymbol) {
        self.functions.push(symbol);
    }

    pub fn add_compound(&mut self, compound: CompoundType) {
        self.compound_order.push(compound.name.clone());
        self.compounds.insert(compound.name.clone(), compound);
    }

    pub fn compound(&self, name: &str) -> Option<&CompoundType> {
        self.compounds.get(name)
    }

    /// Compound definitions in declaration order.
    pub fn compounds(&self) -> impl Iterator<Item = &CompoundType> {
        self.compound_order.iter().filter_map(|n| self.compounds.get(n))
    }
}
