//! Declarations.
//!
//! Every `visit_*` returns `false`: nested declarations are checked
//! explicitly, each into the scope it belongs to.

use log::debug;

use crate::ast::*;
use crate::diagnostic::SemanticError;
use crate::lexer::TokenKind;
use crate::semantic::names::{Name, NameRef};
use crate::semantic::scope::{ScopeKind, ScopeRef};
use crate::semantic::control::Control;
use crate::semantic::symbols::{Location, MethodKey, Storage, SymbolKind, SymbolRef, Visibility};
use crate::semantic::types::{FullySpecifiedType, Type, TypeFlags};
use crate::semantic::Semantic;

pub(crate) struct CheckDeclaration<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
    template_parameters: Option<ScopeRef>,
}

impl<'s, 'a> CheckDeclaration<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef, template_parameters: Option<ScopeRef>) -> Self {
        CheckDeclaration {
            sem,
            scope,
            template_parameters,
        }
    }

    pub(crate) fn check(mut self, node: NodeRef) {
        let ast = self.sem.ast;
        accept(ast, node, &mut self);
    }

    /// Token of the declarator-id, looking through parenthesized declarators
    fn location_of_declarator_id(ast: &Ast, declarator: Option<NodeRef>) -> u32 {
        let Some(NodeKind::Declarator(declarator)) = declarator.map(|d| &ast[d]) else {
            return 0;
        };
        match declarator.core_declarator.map(|core| (core, &ast[core])) {
            Some((core, NodeKind::DeclaratorId(_))) => ast.first_token(core),
            Some((_, NodeKind::NestedDeclarator(nested))) => Self::location_of_declarator_id(ast, nested.declarator),
            _ => 0,
        }
    }

    /// Declarator-id, else first token of the declarator, else of `node`
    fn declaration_location(ast: &Ast, node: NodeRef, declarator: Option<NodeRef>) -> u32 {
        match Self::location_of_declarator_id(ast, declarator) {
            0 => declarator.map(|d| ast.first_token(d)).unwrap_or_else(|| ast.first_token(node)),
            location => location,
        }
    }

    fn qt_method_key(&self, qt_invokable: u32) -> Option<MethodKey> {
        match qt_invokable {
            0 => None,
            token => match self.sem.token_kind(token) {
                TokenKind::QSignal => Some(MethodKey::Signal),
                TokenKind::QSlot => Some(MethodKey::Slot),
                _ => None,
            },
        }
    }

    fn storage_of(ty: FullySpecifiedType) -> Storage {
        if ty.is_friend() {
            Storage::Friend
        } else if ty.flags.contains(TypeFlags::REGISTER) {
            Storage::Register
        } else if ty.is_static() {
            Storage::Static
        } else if ty.flags.contains(TypeFlags::EXTERN) {
            Storage::Extern
        } else if ty.flags.contains(TypeFlags::MUTABLE) {
            Storage::Mutable
        } else if ty.is_typedef() {
            Storage::Typedef
        } else {
            Storage::NoStorage
        }
    }

    /// Warn about unnamed arguments of public member functions.
    fn check_function_arguments(&mut self, function: SymbolRef) {
        if !self.sem.options.check_anonymous_arguments {
            return;
        }
        let control = &*self.sem.control;
        if !control.scope(self.scope).is_class_scope() || !control.symbol(function).is_public() {
            return;
        }
        let Some(arguments) = control.symbol(function).as_function().map(|f| f.arguments) else {
            return;
        };
        let anonymous: Vec<u32> = control
            .scope(arguments)
            .symbols()
            .iter()
            .map(|&arg| control.symbol(arg))
            .filter(|arg| arg.name.is_none())
            .map(|arg| arg.location.token)
            .collect();
        for token in anonymous {
            self.sem.warning(token, SemanticError::AnonymousArgument);
        }
    }

    fn is_class_type(&self, ty: FullySpecifiedType) -> bool {
        ty.ty.is_some_and(|t| self.sem.control.type_of(t).is_class())
    }

    /// Symbols of an identifier list, one per identifier
    fn forward_declarations(
        &mut self,
        ast: &Ast,
        node: NodeRef,
        identifiers: &[NodeRef],
        make: fn(&mut Control, Location, Option<NameRef>) -> SymbolRef,
    ) -> Vec<SymbolRef> {
        let mut symbols = Vec::new();
        for &identifier in identifiers {
            let name = self.sem.check_name(Some(identifier), self.scope);
            let location = self.sem.location(ast.first_token(identifier));
            let symbol = make(self.sem.control, location, name);
            self.sem.set_offsets(symbol, node);
            self.sem.control.enter_symbol(self.scope, symbol);
            symbols.push(symbol);
        }
        symbols
    }
}

impl Visitor for CheckDeclaration<'_, '_> {
    fn visit_simple_declaration(&mut self, ast: &Ast, node: NodeRef, n: &SimpleDeclaration) -> bool {
        let ty = self.sem.check_specifiers(&n.decl_specifiers, self.scope);
        let qualified = ty.qualified_type();

        if let Some(template_parameters) = self.template_parameters {
            if let Some(class) = self.sem.control.type_symbol(ty) {
                if let SymbolKind::Class(data) = &mut self.sem.control.symbol_mut(class).kind {
                    data.template_parameters = Some(template_parameters);
                }
            }
        }

        if n.declarators.is_empty() && n.decl_specifiers.len() == 1 {
            if let NodeKind::ElaboratedTypeSpecifier(elaborated) = &ast[n.decl_specifiers[0]] {
                let location = match elaborated.name {
                    Some(name) => ast.first_token(name),
                    None => ast.first_token(n.decl_specifiers[0]),
                };
                let name = elaborated.name.and_then(|name| ast[name].semantic_name());
                let location = self.sem.location(location);
                let symbol = self.sem.control.new_forward_class_declaration(location, name);
                self.sem.set_offsets(symbol, node);
                if let Some(template_parameters) = self.template_parameters.take() {
                    self.sem.control.symbol_mut(symbol).kind = SymbolKind::ForwardClassDeclaration {
                        template_parameters: Some(template_parameters),
                    };
                }
                n.symbols.borrow_mut().push(symbol);
                self.sem.control.enter_symbol(self.scope, symbol);
                return false;
            }
        }

        let qt_method_key = self.qt_method_key(n.qt_invokable);
        let visibility = self.sem.visibility_in(self.scope);

        for (index, &declarator) in n.declarators.iter().enumerate() {
            let (decl_ty, name) = self.sem.check_declarator(Some(declarator), qualified, self.scope);
            let location = Self::declaration_location(ast, node, Some(declarator));

            let function = self
                .sem
                .control
                .type_symbol(decl_ty)
                .filter(|&symbol| self.sem.control.symbol(symbol).is_function());
            if let Some(function) = function {
                let method_key = qt_method_key.unwrap_or(self.sem.current_method_key());
                let location = self.sem.location(location);
                let scope = self.scope;
                let symbol = self.sem.control.symbol_mut(function);
                symbol.location = location;
                symbol.scope = Some(scope);
                symbol.name = name;
                symbol.visibility = visibility;
                if let Some(data) = symbol.as_function_mut() {
                    data.method_key = method_key;
                }
            } else if self.sem.current_method_key() != MethodKey::Normal {
                self.sem
                    .warning(ast.first_token(node), SemanticError::ExpectedFunctionDeclaration);
            }

            let location = self.sem.location(location);
            let symbol = self.sem.control.new_declaration(location, name);
            self.sem.set_offsets(symbol, node);
            let template_parameters = match self.template_parameters {
                Some(params) if index == 0 && ty.is_valid() && !self.is_class_type(ty) => Some(params),
                _ => None,
            };
            let declaration = self.sem.control.symbol_mut(symbol);
            declaration.ty = decl_ty;
            declaration.visibility = visibility;
            declaration.storage = Self::storage_of(ty);
            declaration.kind = SymbolKind::Declaration { template_parameters };

            if let NodeKind::Declarator(d) = &ast[declarator] {
                self.sem.check_expression(d.initializer, self.scope);
            }

            n.symbols.borrow_mut().push(symbol);
            self.sem.control.enter_symbol(self.scope, symbol);
        }
        false
    }

    fn visit_empty_declaration(&mut self, _ast: &Ast, _node: NodeRef, _n: &EmptyDeclaration) -> bool {
        false
    }

    fn visit_access_declaration(&mut self, _ast: &Ast, _node: NodeRef, n: &AccessDeclaration) -> bool {
        let access = self.sem.token_kind(n.access_specifier);
        self.sem
            .switch_visibility(Semantic::visibility_for_access_specifier(access));
        let method_key = if n.slots_kw != 0 {
            MethodKey::Slot
        } else if access == TokenKind::Signals {
            MethodKey::Signal
        } else {
            MethodKey::Normal
        };
        self.sem.switch_method_key(method_key);
        false
    }

    fn visit_asm_definition(&mut self, _ast: &Ast, _node: NodeRef, _n: &AsmDefinition) -> bool {
        false
    }

    fn visit_exception_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ExceptionDeclaration) -> bool {
        if n.declarator.is_none() {
            return false;
        }
        let ty = self.sem.check_specifiers(&n.type_specifiers, self.scope);
        let (decl_ty, name) = self.sem.check_declarator(n.declarator, ty.qualified_type(), self.scope);
        if name.is_none() {
            return false;
        }
        let location = Self::declaration_location(ast, node, n.declarator);
        let location = self.sem.location(location);
        let symbol = self.sem.control.new_declaration(location, name);
        self.sem.set_offsets(symbol, node);
        self.sem.control.symbol_mut(symbol).ty = decl_ty;
        self.sem.control.enter_symbol(self.scope, symbol);
        false
    }

    fn visit_function_definition(&mut self, ast: &Ast, node: NodeRef, n: &FunctionDefinition) -> bool {
        let ty = self.sem.check_specifiers(&n.decl_specifiers, self.scope);
        let (fun_ty, name) = self.sem.check_declarator(n.declarator, ty.qualified_type(), self.scope);
        let function = self
            .sem
            .control
            .type_symbol(fun_ty)
            .filter(|&symbol| self.sem.control.symbol(symbol).is_function());
        let Some(function) = function else {
            self.sem.error(ast.first_token(node), SemanticError::ExpectedFunctionPrototype);
            return false;
        };

        self.sem.set_offsets(function, node);
        let location = match n.declarator {
            Some(declarator) => self.sem.location(ast.first_token(declarator)),
            None => self.sem.control.symbol(function).location,
        };
        let visibility = self.sem.visibility_in(self.scope);
        let method_key = self
            .qt_method_key(n.qt_invokable)
            .unwrap_or(self.sem.current_method_key());
        let template_parameters = self.template_parameters;
        let symbol = self.sem.control.symbol_mut(function);
        symbol.location = location;
        symbol.name = name;
        symbol.visibility = visibility;
        if let Some(data) = symbol.as_function_mut() {
            data.template_parameters = template_parameters;
            data.method_key = method_key;
        }

        self.check_function_arguments(function);

        n.symbol.set(Some(function));
        self.sem.control.enter_symbol(self.scope, function);

        if self.sem.options.skip_function_bodies {
            return false;
        }

        if let Some(ctor_initializer) = n.ctor_initializer {
            let looks_like_ctor = !ty.is_valid()
                && name.is_some_and(|name| {
                    let unqualified = self.sem.control.unqualified_name(name);
                    matches!(
                        self.sem.control.name(unqualified),
                        Name::Identifier(_) | Name::Template { .. }
                    )
                });
            if !looks_like_ctor {
                self.sem.error(
                    ast.first_token(ctor_initializer),
                    SemanticError::OnlyConstructorsTakeBaseInitializers,
                );
            }
            if let NodeKind::CtorInitializer(init) = &ast[ctor_initializer] {
                for &member in &init.member_initializers {
                    if let NodeKind::MemInitializer(mem) = &ast[member] {
                        self.sem.check_name(mem.name, self.scope);
                        for &expression in &mem.expressions {
                            self.sem.check_expression(Some(expression), self.scope);
                        }
                    }
                }
            }
        }

        if let Some(members) = self.sem.control.symbol(function).members() {
            self.sem.with_access(Visibility::Public, MethodKey::Normal, |sem| {
                sem.check_statement(n.function_body, members);
            });
        }
        false
    }

    fn visit_linkage_body(&mut self, _ast: &Ast, _node: NodeRef, n: &LinkageBody) -> bool {
        for &declaration in &n.declarations {
            self.sem.check_declaration(Some(declaration), self.scope, None);
        }
        false
    }

    fn visit_linkage_specification(&mut self, _ast: &Ast, _node: NodeRef, n: &LinkageSpecification) -> bool {
        self.sem.check_declaration(n.declaration, self.scope, None);
        false
    }

    fn visit_namespace(&mut self, ast: &Ast, node: NodeRef, n: &Namespace) -> bool {
        let name = match n.identifier {
            0 => None,
            token => {
                let id = self.sem.spell(token);
                Some(self.sem.control.name_id(id))
            }
        };
        let location = match n.identifier {
            0 => ast.first_token(node),
            token => token,
        };
        let location = self.sem.location(location);
        let namespace = self.sem.control.new_namespace(location, name);
        self.sem.set_offsets(namespace, node);
        n.symbol.set(Some(namespace));
        self.sem.control.enter_symbol(self.scope, namespace);
        debug!("namespace {:?} at {}:{}", name, location.line, location.column);

        if let Some(members) = self.sem.control.symbol(namespace).members() {
            self.sem.check_declaration(n.linkage_body, members, None);
        }
        false
    }

    fn visit_namespace_alias_definition(&mut self, _ast: &Ast, _node: NodeRef, _n: &NamespaceAliasDefinition) -> bool {
        false
    }

    fn visit_parameter_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ParameterDeclaration) -> bool {
        let location = Self::declaration_location(ast, node, n.declarator);
        let ty = self.sem.check_specifiers(&n.type_specifiers, self.scope);
        let (arg_ty, name) = self.sem.check_declarator(n.declarator, ty.qualified_type(), self.scope);
        self.sem.check_expression(n.expression, self.scope);

        let location = self.sem.location(location);
        let argument = self.sem.control.new_argument(location, name);
        let symbol = self.sem.control.symbol_mut(argument);
        symbol.ty = arg_ty;
        symbol.kind = SymbolKind::Argument {
            has_initializer: n.expression.is_some(),
        };
        n.symbol.set(Some(argument));
        self.sem.control.enter_symbol(self.scope, argument);
        false
    }

    fn visit_template_declaration(&mut self, _ast: &Ast, _node: NodeRef, n: &TemplateDeclaration) -> bool {
        let owner = self.sem.control.scope(self.scope).owner;
        let parameters = self.sem.control.new_scope(owner, ScopeKind::TemplateParameters);
        for &parameter in &n.template_parameters {
            self.sem.check_declaration(Some(parameter), parameters, None);
        }
        self.sem.check_declaration(n.declaration, self.scope, Some(parameters));
        false
    }

    fn visit_typename_type_parameter(&mut self, ast: &Ast, node: NodeRef, n: &TypenameTypeParameter) -> bool {
        let location = n.name.map(|name| ast.first_token(name)).unwrap_or_else(|| ast.first_token(node));
        let name = self.sem.check_name(n.name, self.scope);
        let location = self.sem.location(location);
        let argument = self.sem.control.new_argument(location, name);
        n.symbol.set(Some(argument));
        self.sem.control.enter_symbol(self.scope, argument);
        false
    }

    fn visit_template_type_parameter(&mut self, ast: &Ast, node: NodeRef, n: &TemplateTypeParameter) -> bool {
        let location = n.name.map(|name| ast.first_token(name)).unwrap_or_else(|| ast.first_token(node));
        let name = self.sem.check_name(n.name, self.scope);
        let location = self.sem.location(location);
        let argument = self.sem.control.new_argument(location, name);
        n.symbol.set(Some(argument));
        self.sem.control.enter_symbol(self.scope, argument);
        false
    }

    fn visit_using_declaration(&mut self, ast: &Ast, node: NodeRef, n: &UsingDeclaration) -> bool {
        let name = self.sem.check_name(n.name, self.scope);
        let location = n.name.map(|name| ast.first_token(name)).unwrap_or_else(|| ast.first_token(node));
        let location = self.sem.location(location);
        let symbol = self.sem.control.new_using_declaration(location, name);
        n.symbol.set(Some(symbol));
        self.sem.control.enter_symbol(self.scope, symbol);
        false
    }

    fn visit_using_directive(&mut self, ast: &Ast, node: NodeRef, n: &UsingDirective) -> bool {
        let name = self.sem.check_name(n.name, self.scope);
        let location = n.name.map(|name| ast.first_token(name)).unwrap_or_else(|| ast.first_token(node));
        let location = self.sem.location(location);
        let symbol = self.sem.control.new_using_namespace_directive(location, name);
        n.symbol.set(Some(symbol));
        self.sem.control.enter_symbol(self.scope, symbol);

        let scope = self.sem.control.scope(self.scope);
        if !(scope.is_block_scope() || scope.is_namespace_scope()) {
            self.sem.error(ast.first_token(node), SemanticError::UsingDirectiveScope);
        }
        false
    }

    fn visit_objc_protocol_forward_declaration(
        &mut self,
        ast: &Ast,
        node: NodeRef,
        n: &ObjCProtocolForwardDeclaration,
    ) -> bool {
        let symbols = self.forward_declarations(
            ast,
            node,
            &n.identifiers,
            Control::new_objc_forward_protocol_declaration,
        );
        n.symbols.borrow_mut().extend(symbols);
        false
    }

    fn visit_objc_class_forward_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ObjCClassForwardDeclaration) -> bool {
        let symbols = self.forward_declarations(
            ast,
            node,
            &n.identifiers,
            Control::new_objc_forward_class_declaration,
        );
        n.symbols.borrow_mut().extend(symbols);
        false
    }

    fn visit_objc_protocol_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ObjCProtocolDeclaration) -> bool {
        let location = n.name.map(|name| ast.first_token(name)).unwrap_or_else(|| ast.first_token(node));
        let name = self.sem.check_name(n.name, self.scope);
        let location = self.sem.location(location);
        let protocol = self.sem.control.new_objc_protocol(location, name);
        self.sem.set_offsets(protocol, node);
        n.symbol.set(Some(protocol));

        let refs = self.protocol_names(ast, n.protocol_refs);
        if let SymbolKind::ObjCProtocol { protocols, .. } = &mut self.sem.control.symbol_mut(protocol).kind {
            *protocols = refs;
        }
        self.sem.control.enter_symbol(self.scope, protocol);

        if let Some(members) = self.sem.control.symbol(protocol).members() {
            let previous = self.sem.switch_objc_visibility(Visibility::Public);
            for &member in &n.member_declarations {
                self.sem.check_declaration(Some(member), members, None);
            }
            self.sem.switch_objc_visibility(previous);
        }
        false
    }

    fn visit_objc_class_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ObjCClassDeclaration) -> bool {
        let location = n
            .class_name
            .map(|name| ast.first_token(name))
            .unwrap_or_else(|| ast.first_token(node));
        let name = self.sem.check_name(n.class_name, self.scope);
        let location = self.sem.location(location);
        let class = self.sem.control.new_objc_class(location, name);
        self.sem.set_offsets(class, node);
        n.symbol.set(Some(class));

        let category_name = self.sem.check_name(n.category_name, self.scope);
        let base_class = self.sem.check_name(n.superclass, self.scope);
        let protocols = self.protocol_names(ast, n.protocol_refs);
        if let SymbolKind::ObjCClass(data) = &mut self.sem.control.symbol_mut(class).kind {
            data.is_interface = n.interface_kw != 0;
            data.category_name = category_name;
            data.base_class = base_class;
            data.protocols = protocols;
        }
        self.sem.control.enter_symbol(self.scope, class);

        let Some(members) = self.sem.control.symbol(class).members() else {
            return false;
        };
        let previous = self.sem.switch_objc_visibility(Visibility::Protected);
        if let Some(NodeKind::ObjCInstanceVariablesDeclaration(vars)) = n.inst_vars_decl.map(|v| &ast[v]) {
            for &variable in &vars.instance_variables {
                self.sem.check_declaration(Some(variable), members, None);
            }
        }
        self.sem.switch_objc_visibility(Visibility::Public);
        for &member in &n.member_declarations {
            self.sem.check_declaration(Some(member), members, None);
        }
        self.sem.switch_objc_visibility(previous);
        false
    }

    fn visit_objc_method_declaration(&mut self, ast: &Ast, node: NodeRef, n: &ObjCMethodDeclaration) -> bool {
        let Some(prototype) = n.method_prototype else {
            return false;
        };
        let method_ty = self.sem.check_objc_method_prototype(prototype, self.scope);
        let Some(method) = method_ty
            .ty
            .and_then(|ty| match self.sem.control.type_of(ty) {
                Type::ObjCMethod(method) => Some(*method),
                _ => None,
            })
        else {
            return false;
        };

        let symbol = match n.function_body {
            None => {
                let name = self.sem.control.symbol(method).name;
                let location = self.sem.location(ast.first_token(node));
                let declaration = self.sem.control.new_declaration(location, name);
                self.sem.control.symbol_mut(declaration).ty = method_ty;
                declaration
            }
            Some(body) => {
                if !self.sem.options.skip_function_bodies {
                    if let Some(members) = self.sem.control.symbol(method).members() {
                        self.sem.check_statement(Some(body), members);
                    }
                }
                method
            }
        };

        self.sem.set_offsets(symbol, node);
        let visibility = self.sem.visibility_in(self.scope);
        let is_class_method = matches!(
            &ast[prototype],
            NodeKind::ObjCMethodPrototype(p) if self.sem.token_kind(p.method_type) == TokenKind::Plus
        );
        let symbol_data = self.sem.control.symbol_mut(symbol);
        symbol_data.visibility = visibility;
        if is_class_method {
            symbol_data.storage = Storage::Static;
        }
        self.sem.control.enter_symbol(self.scope, symbol);
        false
    }

    fn visit_objc_visibility_declaration(&mut self, _ast: &Ast, _node: NodeRef, n: &ObjCVisibilityDeclaration) -> bool {
        let kind = self.sem.token_kind(n.visibility);
        self.sem
            .switch_objc_visibility(Semantic::visibility_for_objc_access_specifier(kind));
        false
    }

    fn visit_objc_property_declaration(&mut self, _ast: &Ast, _node: NodeRef, n: &ObjCPropertyDeclaration) -> bool {
        self.sem.check_declaration(n.simple_declaration, self.scope, None);
        false
    }

    fn visit_objc_synthesized_properties_declaration(
        &mut self,
        _ast: &Ast,
        _node: NodeRef,
        _n: &ObjCSynthesizedPropertiesDeclaration,
    ) -> bool {
        false
    }

    fn visit_objc_dynamic_properties_declaration(
        &mut self,
        _ast: &Ast,
        _node: NodeRef,
        _n: &ObjCDynamicPropertiesDeclaration,
    ) -> bool {
        false
    }
}

impl CheckDeclaration<'_, '_> {
    fn protocol_names(&mut self, ast: &Ast, refs: Option<NodeRef>) -> Vec<NameRef> {
        let Some(NodeKind::ObjCProtocolRefs(refs)) = refs.map(|r| &ast[r]) else {
            return Vec::new();
        };
        refs.identifiers
            .iter()
            .filter_map(|&identifier| self.sem.check_name(Some(identifier), self.scope))
            .collect()
    }
}
