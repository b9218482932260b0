use solder_bind::MethodBinding;
use solder_layout::StructLayout;
use solder_native::ShimFrame;

/// One finished managed entry point: the concrete binding, the exported
/// symbol its shim must carry, and the marshaling plan. `shim` is `None`
/// when the function opted out of body generation.
#[derive(Debug, Clone)]
pub struct BoundSymbol {
    pub binding: MethodBinding,
    pub linkage_name: String,
    pub shim: Option<ShimFrame>,
}

/// A native symbol or compound the pass could not process, with the
/// reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Everything one generation pass hands to the source emitters.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub bound: Vec<BoundSymbol>,
    pub layouts: Vec<StructLayout>,
    /// Symbols aborted by a fatal-per-symbol or fatal-configuration error.
    pub skipped: Vec<SkippedSymbol>,
    /// Symbols whose directives eliminated every representation. Not an
    /// error; they simply get no managed entry point.
    pub unbound: Vec<String>,
}

impl GenerationReport {
    /// Entry points generated for one native symbol name.
    pub fn variants_of(&self, symbol: &str) -> Vec<&BoundSymbol> {
        self.bound.iter().filter(|b| b.binding.symbol().name == symbol).collect()
    }

    pub fn layout_of(&self, compound: &str) -> Option<&StructLayout> {
        self.layouts.iter().find(|l| l.name == compound)
    }

    pub fn was_skipped(&self, symbol: &str) -> bool {
        self.skipped.iter().any(|s| s.symbol == symbol)
    }
}
