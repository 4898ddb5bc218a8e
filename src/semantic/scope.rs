//! Ordered, name-indexed symbol containers.

use hashbrown::HashMap;
use serde::Serialize;

use crate::StringId;
use crate::arena::Id;
use crate::semantic::names::OperatorKind;
use crate::semantic::symbols::SymbolRef;

pub type ScopeRef = Id<Scope>;

/// What kind of region a scope models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Namespace,
    Class,
    Enum,
    Block,
    /// Body of a function
    Function,
    /// Arguments of a function
    Prototype,
    TemplateParameters,
    ObjCClass,
    ObjCProtocol,
    ObjCMethod,
}

/// Lookup key derived from a symbol's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ScopeKey {
    Identifier(StringId),
    Operator(OperatorKind),
}

/// Symbols of one lexical region, in insertion order.
#[derive(Debug, Clone)]
pub struct Scope {
    pub owner: Option<SymbolRef>,
    pub kind: ScopeKind,
    symbols: Vec<SymbolRef>,
    by_identifier: HashMap<StringId, Vec<SymbolRef>>,
    by_operator: HashMap<OperatorKind, Vec<SymbolRef>>,
}

impl Scope {
    pub fn new(owner: Option<SymbolRef>, kind: ScopeKind) -> Self {
        Scope {
            owner,
            kind,
            symbols: Vec::new(),
            by_identifier: HashMap::new(),
            by_operator: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, symbol: SymbolRef, key: Option<ScopeKey>) {
        self.symbols.push(symbol);
        match key {
            Some(ScopeKey::Identifier(id)) => self.by_identifier.entry(id).or_default().push(symbol),
            Some(ScopeKey::Operator(op)) => self.by_operator.entry(op).or_default().push(symbol),
            None => {}
        }
    }

    pub fn symbols(&self) -> &[SymbolRef] {
        &self.symbols
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol_at(&self, index: usize) -> Option<SymbolRef> {
        self.symbols.get(index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Every symbol whose name has `identifier`, in insertion order.
    pub fn lookat(&self, identifier: StringId) -> &[SymbolRef] {
        self.by_identifier.get(&identifier).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every `operator@` function for `op`, in insertion order.
    pub fn lookat_operator(&self, op: OperatorKind) -> &[SymbolRef] {
        self.by_operator.get(&op).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_namespace_scope(&self) -> bool {
        self.kind == ScopeKind::Namespace
    }

    pub fn is_class_scope(&self) -> bool {
        self.kind == ScopeKind::Class
    }

    pub fn is_enum_scope(&self) -> bool {
        self.kind == ScopeKind::Enum
    }

    /// Blocks and function bodies
    pub fn is_block_scope(&self) -> bool {
        matches!(self.kind, ScopeKind::Block | ScopeKind::Function | ScopeKind::ObjCMethod)
    }

    pub fn is_prototype_scope(&self) -> bool {
        self.kind == ScopeKind::Prototype
    }

    pub fn is_template_parameter_scope(&self) -> bool {
        self.kind == ScopeKind::TemplateParameters
    }
}
