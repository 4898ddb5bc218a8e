//! Symbols produced by the semantic pass.

use serde::Serialize;

use crate::StringId;
use crate::arena::Id;
use crate::semantic::names::NameRef;
use crate::semantic::scope::ScopeRef;
use crate::semantic::types::FullySpecifiedType;

/// Reference to a [`Symbol`] owned by a [`super::Control`]
pub type SymbolRef = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
    Package,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Storage {
    #[default]
    NoStorage,
    Friend,
    Register,
    Static,
    Extern,
    Mutable,
    Typedef,
}

/// Qt meta-object role of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MethodKey {
    #[default]
    Normal,
    Slot,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ClassKey {
    #[default]
    Class,
    Struct,
    Union,
}

/// Where a symbol was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub file_name: StringId,
    /// Token index in the translation unit
    pub token: u32,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file_name: StringId, token: u32, line: u32, column: u32) -> Self {
        Location {
            file_name,
            token,
            line,
            column,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new(StringId::new(""), 0, 0, 0)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u8 {
        const CONST        = 1 << 0;
        const VOLATILE     = 1 << 1;
        const VARIADIC     = 1 << 2;
        const PURE_VIRTUAL = 1 << 3;
        /// Parsed from `T x(y)` where `y` may also be an initializer
        const AMBIGUOUS    = 1 << 4;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: FullySpecifiedType,
    /// Prototype scope holding the [`SymbolKind::Argument`]s
    pub arguments: ScopeRef,
    pub members: ScopeRef,
    pub flags: FunctionFlags,
    pub method_key: MethodKey,
    pub template_parameters: Option<ScopeRef>,
}

impl Function {
    pub fn is_const(&self) -> bool {
        self.flags.contains(FunctionFlags::CONST)
    }

    pub fn is_volatile(&self) -> bool {
        self.flags.contains(FunctionFlags::VOLATILE)
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(FunctionFlags::VARIADIC)
    }

    pub fn is_pure_virtual(&self) -> bool {
        self.flags.contains(FunctionFlags::PURE_VIRTUAL)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.flags.contains(FunctionFlags::AMBIGUOUS)
    }

    pub fn is_signal(&self) -> bool {
        self.method_key == MethodKey::Signal
    }

    pub fn is_slot(&self) -> bool {
        self.method_key == MethodKey::Slot
    }

    pub fn has_return_type(&self) -> bool {
        self.return_type.is_valid() || self.return_type.is_signed() || self.return_type.is_unsigned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub key: ClassKey,
    pub members: ScopeRef,
    /// [`SymbolKind::BaseClass`] symbols in declaration order
    pub base_classes: Vec<SymbolRef>,
    pub template_parameters: Option<ScopeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjCClass {
    pub members: ScopeRef,
    pub is_interface: bool,
    pub category_name: Option<NameRef>,
    pub base_class: Option<NameRef>,
    pub protocols: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjCMethod {
    pub return_type: FullySpecifiedType,
    pub arguments: ScopeRef,
    pub members: ScopeRef,
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Declaration {
        template_parameters: Option<ScopeRef>,
    },
    Argument {
        has_initializer: bool,
    },
    Function(Function),
    Namespace {
        members: ScopeRef,
    },
    Class(Class),
    Enum {
        members: ScopeRef,
    },
    Block {
        members: ScopeRef,
    },
    BaseClass {
        is_virtual: bool,
    },
    ForwardClassDeclaration {
        template_parameters: Option<ScopeRef>,
    },
    UsingDeclaration,
    UsingNamespaceDirective,
    ObjCClass(ObjCClass),
    ObjCProtocol {
        members: ScopeRef,
        protocols: Vec<NameRef>,
    },
    ObjCMethod(ObjCMethod),
    ObjCForwardClassDeclaration,
    ObjCForwardProtocolDeclaration,
}

/// A named (or anonymous) entity declared in a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: Option<NameRef>,
    pub location: Location,
    /// Byte offsets of the first and last token of the declaration
    pub start_offset: u32,
    pub end_offset: u32,
    /// Enclosing scope, set when the symbol is entered
    pub scope: Option<ScopeRef>,
    pub visibility: Visibility,
    pub storage: Storage,
    /// Declared type; the symbol itself for function, class, enum and namespace
    pub ty: FullySpecifiedType,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(location: Location, name: Option<NameRef>, kind: SymbolKind) -> Self {
        Symbol {
            name,
            location,
            start_offset: 0,
            end_offset: 0,
            scope: None,
            visibility: Visibility::Public,
            storage: Storage::NoStorage,
            ty: FullySpecifiedType::default(),
            kind,
        }
    }

    pub fn ty(&self) -> FullySpecifiedType {
        self.ty
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SymbolKind::Declaration { .. } => "Declaration",
            SymbolKind::Argument { .. } => "Argument",
            SymbolKind::Function(_) => "Function",
            SymbolKind::Namespace { .. } => "Namespace",
            SymbolKind::Class(_) => "Class",
            SymbolKind::Enum { .. } => "Enum",
            SymbolKind::Block { .. } => "Block",
            SymbolKind::BaseClass { .. } => "BaseClass",
            SymbolKind::ForwardClassDeclaration { .. } => "ForwardClassDeclaration",
            SymbolKind::UsingDeclaration => "UsingDeclaration",
            SymbolKind::UsingNamespaceDirective => "UsingNamespaceDirective",
            SymbolKind::ObjCClass(_) => "ObjCClass",
            SymbolKind::ObjCProtocol { .. } => "ObjCProtocol",
            SymbolKind::ObjCMethod(_) => "ObjCMethod",
            SymbolKind::ObjCForwardClassDeclaration => "ObjCForwardClassDeclaration",
            SymbolKind::ObjCForwardProtocolDeclaration => "ObjCForwardProtocolDeclaration",
        }
    }

    /// Member scope of scoped symbols
    pub fn members(&self) -> Option<ScopeRef> {
        match &self.kind {
            SymbolKind::Function(f) => Some(f.members),
            SymbolKind::Namespace { members }
            | SymbolKind::Enum { members }
            | SymbolKind::Block { members }
            | SymbolKind::ObjCProtocol { members, .. } => Some(*members),
            SymbolKind::Class(c) => Some(c.members),
            SymbolKind::ObjCClass(c) => Some(c.members),
            SymbolKind::ObjCMethod(m) => Some(m.members),
            _ => None,
        }
    }

    pub fn template_parameters(&self) -> Option<ScopeRef> {
        match &self.kind {
            SymbolKind::Declaration { template_parameters }
            | SymbolKind::ForwardClassDeclaration { template_parameters } => *template_parameters,
            SymbolKind::Function(f) => f.template_parameters,
            SymbolKind::Class(c) => c.template_parameters,
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            SymbolKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match &mut self.kind {
            SymbolKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match &self.kind {
            SymbolKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self.kind, SymbolKind::Declaration { .. })
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.kind, SymbolKind::Argument { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, SymbolKind::Namespace { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, SymbolKind::Class(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, SymbolKind::Enum { .. })
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, SymbolKind::Block { .. })
    }

    pub fn is_using_namespace_directive(&self) -> bool {
        matches!(self.kind, SymbolKind::UsingNamespaceDirective)
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_typedef(&self) -> bool {
        self.storage == Storage::Typedef
    }
}
