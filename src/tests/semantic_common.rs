//! Common utilities for semantic analysis tests.
use crate::StringId;
use crate::semantic::{Control, Overview, ScopeRef, SemanticOptions, SymbolRef};
use crate::translation_unit::TranslationUnit;

/// A checked translation unit with the symbols it produced.
pub struct Checked {
    pub unit: TranslationUnit,
    pub control: Control,
    pub global: SymbolRef,
}

pub fn setup_semantic(source: &str) -> Checked {
    setup_semantic_with(source, SemanticOptions::default())
}

pub fn setup_semantic_with(source: &str, options: SemanticOptions) -> Checked {
    let _ = env_logger::try_init();
    let mut unit = TranslationUnit::new("test.cpp", source);
    let mut control = Control::new();
    let global = unit.check(&mut control, None, options);
    Checked { unit, control, global }
}

impl Checked {
    pub fn members(&self, symbol: SymbolRef) -> ScopeRef {
        match self.control.symbol(symbol).members() {
            Some(members) => members,
            None => panic!("{} has no member scope", self.control.symbol(symbol).kind_name()),
        }
    }

    pub fn global_members(&self) -> ScopeRef {
        self.members(self.global)
    }

    pub fn lookup(&self, scope: ScopeRef, name: &str) -> Vec<SymbolRef> {
        self.control.lookat(scope, StringId::new(name)).to_vec()
    }

    /// First symbol called `name` in `scope`
    pub fn find(&self, scope: ScopeRef, name: &str) -> SymbolRef {
        match self.lookup(scope, name).first() {
            Some(&symbol) => symbol,
            None => panic!("no symbol `{}' in scope", name),
        }
    }

    /// Symbols of a scope as `Kind name`, in declaration order
    pub fn summary(&self, scope: ScopeRef) -> Vec<String> {
        let overview = Overview::new();
        self.control
            .scope(scope)
            .symbols()
            .iter()
            .map(|&symbol| {
                let symbol = self.control.symbol(symbol);
                let name = overview.pretty_name(&self.control, symbol.name);
                if name.is_empty() {
                    symbol.kind_name().to_string()
                } else {
                    format!("{} {}", symbol.kind_name(), name)
                }
            })
            .collect()
    }

    /// Type of `symbol` printed with its name as declarator
    pub fn declared(&self, symbol: SymbolRef) -> String {
        let symbol = self.control.symbol(symbol);
        Overview::new().pretty_type(&self.control, symbol.ty(), symbol.name)
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.unit
            .diagnostics()
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect()
    }
}
