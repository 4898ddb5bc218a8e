//! Owner of every name, type, symbol and scope of a semantic pass.
//!
//! Names and types are interned: building the same name or type twice
//! yields the same reference. Symbols and scopes are plain arena entries.

use hashbrown::HashMap;
use log::trace;

use crate::StringId;
use crate::arena::Arena;
use crate::semantic::names::{Name, NameRef, OperatorKind};
use crate::semantic::scope::{Scope, ScopeKey, ScopeKind, ScopeRef};
use crate::semantic::symbols::{
    Class, ClassKey, Function, FunctionFlags, Location, MethodKey, ObjCClass, ObjCMethod, Symbol, SymbolKind,
    SymbolRef,
};
use crate::semantic::types::{FloatKind, FullySpecifiedType, IntegerKind, Type, TypeRef};

#[derive(Debug, Default)]
pub struct Control {
    names: Arena<Name>,
    name_index: HashMap<Name, NameRef>,
    types: Arena<Type>,
    type_index: HashMap<Type, TypeRef>,
    symbols: Arena<Symbol>,
    scopes: Arena<Scope>,
}

impl Control {
    pub fn new() -> Self {
        Control::default()
    }

    // names

    fn intern_name(&mut self, name: Name) -> NameRef {
        if let Some(&existing) = self.name_index.get(&name) {
            return existing;
        }
        let id = self.names.alloc(name.clone());
        self.name_index.insert(name, id);
        id
    }

    pub fn identifier(&mut self, text: &str) -> NameRef {
        self.intern_name(Name::Identifier(StringId::new(text)))
    }

    pub fn name_id(&mut self, id: StringId) -> NameRef {
        self.intern_name(Name::Identifier(id))
    }

    pub fn destructor_name(&mut self, id: StringId) -> NameRef {
        self.intern_name(Name::Destructor(id))
    }

    pub fn template_name(&mut self, identifier: StringId, arguments: Vec<FullySpecifiedType>) -> NameRef {
        self.intern_name(Name::Template { identifier, arguments })
    }

    pub fn operator_name(&mut self, op: OperatorKind) -> NameRef {
        self.intern_name(Name::Operator(op))
    }

    pub fn conversion_name(&mut self, ty: FullySpecifiedType) -> NameRef {
        self.intern_name(Name::Conversion(ty))
    }

    pub fn qualified_name(&mut self, names: Vec<NameRef>, global: bool) -> NameRef {
        self.intern_name(Name::Qualified { names, global })
    }

    pub fn selector_name(&mut self, names: Vec<NameRef>, has_arguments: bool) -> NameRef {
        self.intern_name(Name::Selector { names, has_arguments })
    }

    pub fn name(&self, name: NameRef) -> &Name {
        &self.names[name]
    }

    /// Identifier of a name, looking through the last component of a qualified name.
    pub fn name_identifier(&self, name: NameRef) -> Option<StringId> {
        match self.name(name) {
            Name::Qualified { names, .. } => names.last().and_then(|&last| self.name_identifier(last)),
            other => other.identifier(),
        }
    }

    /// Unqualified part of a name
    pub fn unqualified_name(&self, name: NameRef) -> NameRef {
        match self.name(name) {
            Name::Qualified { names, .. } => names.last().copied().unwrap_or(name),
            _ => name,
        }
    }

    // types

    fn intern_type(&mut self, ty: Type) -> TypeRef {
        if let Some(&existing) = self.type_index.get(&ty) {
            return existing;
        }
        let id = self.types.alloc(ty.clone());
        self.type_index.insert(ty, id);
        id
    }

    pub fn void_type(&mut self) -> TypeRef {
        self.intern_type(Type::Void)
    }

    pub fn integer_type(&mut self, kind: IntegerKind) -> TypeRef {
        self.intern_type(Type::Integer(kind))
    }

    pub fn float_type(&mut self, kind: FloatKind) -> TypeRef {
        self.intern_type(Type::Float(kind))
    }

    pub fn pointer_type(&mut self, element: FullySpecifiedType) -> TypeRef {
        self.intern_type(Type::Pointer(element))
    }

    pub fn reference_type(&mut self, element: FullySpecifiedType) -> TypeRef {
        self.intern_type(Type::Reference(element))
    }

    pub fn pointer_to_member_type(&mut self, member_name: NameRef, element: FullySpecifiedType) -> TypeRef {
        self.intern_type(Type::PointerToMember { member_name, element })
    }

    pub fn array_type(&mut self, element: FullySpecifiedType, size: u32) -> TypeRef {
        self.intern_type(Type::Array { element, size })
    }

    pub fn named_type(&mut self, name: NameRef) -> TypeRef {
        self.intern_type(Type::Named(name))
    }

    pub fn type_of(&self, ty: TypeRef) -> &Type {
        &self.types[ty]
    }

    /// Symbol behind a type-as-symbol type
    pub fn type_symbol(&self, ty: FullySpecifiedType) -> Option<SymbolRef> {
        ty.ty.and_then(|t| self.type_of(t).symbol())
    }

    // scopes

    pub fn new_scope(&mut self, owner: Option<SymbolRef>, kind: ScopeKind) -> ScopeRef {
        self.scopes.alloc(Scope::new(owner, kind))
    }

    pub fn scope(&self, scope: ScopeRef) -> &Scope {
        &self.scopes[scope]
    }

    pub fn scope_mut(&mut self, scope: ScopeRef) -> &mut Scope {
        self.scopes.get_mut(scope)
    }

    /// Append `symbol` to `scope` and record `scope` as its enclosing scope.
    pub fn enter_symbol(&mut self, scope: ScopeRef, symbol: SymbolRef) {
        let key = self.symbols[symbol].name.and_then(|name| match self.name(self.unqualified_name(name)) {
            Name::Operator(op) => Some(ScopeKey::Operator(*op)),
            other => other.identifier().map(ScopeKey::Identifier),
        });
        self.symbols.get_mut(symbol).scope = Some(scope);
        self.scopes.get_mut(scope).insert(symbol, key);
    }

    /// Symbols of `scope` named `id`, insertion order
    pub fn lookat(&self, scope: ScopeRef, id: StringId) -> &[SymbolRef] {
        self.scope(scope).lookat(id)
    }

    // symbols

    pub fn symbol(&self, symbol: SymbolRef) -> &Symbol {
        &self.symbols[symbol]
    }

    pub fn symbol_mut(&mut self, symbol: SymbolRef) -> &mut Symbol {
        self.symbols.get_mut(symbol)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Identifier of a symbol's name
    pub fn symbol_identifier(&self, symbol: SymbolRef) -> Option<StringId> {
        self.symbol(symbol).name.and_then(|name| self.name_identifier(name))
    }

    fn alloc_symbol(&mut self, location: Location, name: Option<NameRef>, kind: SymbolKind) -> SymbolRef {
        let symbol = self.symbols.alloc(Symbol::new(location, name, kind));
        trace!("new symbol {:?} {}", symbol, self.symbols[symbol].kind_name());
        symbol
    }

    /// Allocate a symbol that owns one scope per entry of `scope_kinds` and doubles as a type.
    fn alloc_scoped(
        &mut self,
        location: Location,
        name: Option<NameRef>,
        scope_kinds: &[ScopeKind],
        make_kind: impl FnOnce(&[ScopeRef]) -> SymbolKind,
        make_type: impl FnOnce(SymbolRef) -> Type,
    ) -> SymbolRef {
        let scopes: Vec<ScopeRef> = scope_kinds.iter().map(|&kind| self.new_scope(None, kind)).collect();
        let symbol = self.alloc_symbol(location, name, make_kind(&scopes));
        for &scope in &scopes {
            self.scopes.get_mut(scope).owner = Some(symbol);
        }
        let ty = self.intern_type(make_type(symbol));
        self.symbols.get_mut(symbol).ty = FullySpecifiedType::new(ty);
        symbol
    }

    pub fn new_declaration(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(
            location,
            name,
            SymbolKind::Declaration {
                template_parameters: None,
            },
        )
    }

    pub fn new_argument(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::Argument { has_initializer: false })
    }

    pub fn new_function(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::Prototype, ScopeKind::Function],
            |scopes| {
                SymbolKind::Function(Function {
                    return_type: FullySpecifiedType::default(),
                    arguments: scopes[0],
                    members: scopes[1],
                    flags: FunctionFlags::empty(),
                    method_key: MethodKey::Normal,
                    template_parameters: None,
                })
            },
            Type::Function,
        )
    }

    pub fn new_namespace(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::Namespace],
            |scopes| SymbolKind::Namespace { members: scopes[0] },
            Type::Namespace,
        )
    }

    pub fn new_class(&mut self, location: Location, name: Option<NameRef>, key: ClassKey) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::Class],
            |scopes| {
                SymbolKind::Class(Class {
                    key,
                    members: scopes[0],
                    base_classes: Vec::new(),
                    template_parameters: None,
                })
            },
            Type::Class,
        )
    }

    pub fn new_enum(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::Enum],
            |scopes| SymbolKind::Enum { members: scopes[0] },
            Type::Enum,
        )
    }

    pub fn new_block(&mut self, location: Location) -> SymbolRef {
        let members = self.new_scope(None, ScopeKind::Block);
        let symbol = self.alloc_symbol(location, None, SymbolKind::Block { members });
        self.scopes.get_mut(members).owner = Some(symbol);
        symbol
    }

    pub fn new_base_class(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::BaseClass { is_virtual: false })
    }

    pub fn new_forward_class_declaration(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        let symbol = self.alloc_symbol(
            location,
            name,
            SymbolKind::ForwardClassDeclaration {
                template_parameters: None,
            },
        );
        let ty = self.intern_type(Type::ForwardClassDeclaration(symbol));
        self.symbols.get_mut(symbol).ty = FullySpecifiedType::new(ty);
        symbol
    }

    pub fn new_using_declaration(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::UsingDeclaration)
    }

    pub fn new_using_namespace_directive(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::UsingNamespaceDirective)
    }

    pub fn new_objc_class(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::ObjCClass],
            |scopes| {
                SymbolKind::ObjCClass(ObjCClass {
                    members: scopes[0],
                    is_interface: false,
                    category_name: None,
                    base_class: None,
                    protocols: Vec::new(),
                })
            },
            Type::ObjCClass,
        )
    }

    pub fn new_objc_protocol(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::ObjCProtocol],
            |scopes| SymbolKind::ObjCProtocol {
                members: scopes[0],
                protocols: Vec::new(),
            },
            Type::ObjCProtocol,
        )
    }

    pub fn new_objc_method(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_scoped(
            location,
            name,
            &[ScopeKind::Prototype, ScopeKind::ObjCMethod],
            |scopes| {
                SymbolKind::ObjCMethod(ObjCMethod {
                    return_type: FullySpecifiedType::default(),
                    arguments: scopes[0],
                    members: scopes[1],
                    is_variadic: false,
                })
            },
            Type::ObjCMethod,
        )
    }

    pub fn new_objc_forward_class_declaration(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::ObjCForwardClassDeclaration)
    }

    pub fn new_objc_forward_protocol_declaration(&mut self, location: Location, name: Option<NameRef>) -> SymbolRef {
        self.alloc_symbol(location, name, SymbolKind::ObjCForwardProtocolDeclaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_types_are_interned() {
        let mut control = Control::new();
        let a = control.identifier("a");
        assert_eq!(a, control.identifier("a"));
        assert_ne!(a, control.identifier("b"));

        let int = control.integer_type(IntegerKind::Int);
        let p1 = control.pointer_type(FullySpecifiedType::new(int));
        let p2 = control.pointer_type(FullySpecifiedType::new(int));
        assert_eq!(p1, p2);
        assert!(control.is_equal_type(p1, p2));
    }

    #[test]
    fn test_enter_symbol_keeps_insertion_order() {
        let mut control = Control::new();
        let global = control.new_namespace(Location::default(), None);
        let members = control.symbol(global).members().unwrap();
        let x = control.identifier("x");
        let first = control.new_declaration(Location::default(), Some(x));
        let second = control.new_declaration(Location::default(), Some(x));
        control.enter_symbol(members, first);
        control.enter_symbol(members, second);

        assert_eq!(control.scope(members).symbols(), &[first, second]);
        assert_eq!(control.lookat(members, StringId::new("x")), &[first, second]);
        assert_eq!(control.symbol(first).scope, Some(members));
        assert!(control.lookat(members, StringId::new("y")).is_empty());
    }

    #[test]
    fn test_function_owns_argument_and_member_scopes() {
        let mut control = Control::new();
        let name = control.identifier("f");
        let f = control.new_function(Location::default(), Some(name));
        let function = control.symbol(f).as_function().unwrap().clone();
        assert_eq!(control.scope(function.arguments).owner, Some(f));
        assert!(control.scope(function.arguments).is_prototype_scope());
        assert_eq!(control.scope(function.members).owner, Some(f));
        assert_eq!(control.type_symbol(control.symbol(f).ty()), Some(f));
    }

    #[test]
    fn test_function_equality_compares_signature() {
        let mut control = Control::new();
        let int = FullySpecifiedType::new(control.integer_type(IntegerKind::Int));
        let char_ty = FullySpecifiedType::new(control.integer_type(IntegerKind::Char));
        let f = control.identifier("f");

        let make = |control: &mut Control, arg: FullySpecifiedType, is_const: bool| {
            let function = control.new_function(Location::default(), Some(f));
            let arguments = control.symbol(function).as_function().unwrap().arguments;
            let a = control.new_argument(Location::default(), None);
            control.symbol_mut(a).ty = arg;
            control.enter_symbol(arguments, a);
            let data = control.symbol_mut(function).as_function_mut().unwrap();
            data.return_type = int;
            data.flags.set(FunctionFlags::CONST, is_const);
            control.symbol(function).ty().ty.unwrap()
        };

        let f1 = make(&mut control, int, false);
        let f2 = make(&mut control, int, false);
        let f3 = make(&mut control, char_ty, false);
        let f4 = make(&mut control, int, true);
        assert_ne!(f1, f2);
        assert!(control.is_equal_type(f1, f2));
        assert!(!control.is_equal_type(f1, f3));
        assert!(!control.is_equal_type(f1, f4));
    }

    #[test]
    fn test_operator_symbols_indexed_by_operator() {
        let mut control = Control::new();
        let class = control.new_class(Location::default(), None, ClassKey::Struct);
        let members = control.symbol(class).members().unwrap();
        let plus = control.operator_name(OperatorKind::Plus);
        let f = control.new_function(Location::default(), Some(plus));
        control.enter_symbol(members, f);
        assert_eq!(control.scope(members).lookat_operator(OperatorKind::Plus), &[f]);
        assert!(control.scope(members).lookat_operator(OperatorKind::Minus).is_empty());
    }
}
