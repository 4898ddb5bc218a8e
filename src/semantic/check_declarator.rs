//! Declarator types.
//!
//! A declarator wraps the base type of its specifier sequence from the
//! outside in: pointer operators first, then the postfix declarators
//! (function parameters, array bounds) innermost-last, then the core
//! declarator, where a parenthesized declarator continues with the type
//! built so far. `int (*p)(char)` thus becomes pointer to function.

use crate::ast::*;
use crate::lexer::TokenKind;
use crate::semantic::names::NameRef;
use crate::semantic::scope::ScopeRef;
use crate::semantic::symbols::{FunctionFlags, SymbolKind};
use crate::semantic::types::{FullySpecifiedType, TypeFlags};
use crate::semantic::Semantic;

pub(crate) struct CheckDeclarator<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
    ty: FullySpecifiedType,
    name: Option<NameRef>,
}

impl<'s, 'a> CheckDeclarator<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef) -> Self {
        CheckDeclarator {
            sem,
            scope,
            ty: FullySpecifiedType::default(),
            name: None,
        }
    }

    pub(crate) fn check(mut self, declarator: NodeRef, base: FullySpecifiedType) -> (FullySpecifiedType, Option<NameRef>) {
        self.ty = base;
        let ast = self.sem.ast;
        accept(ast, declarator, &mut self);
        (self.ty, self.name)
    }

    pub(crate) fn check_method_prototype(mut self, prototype: NodeRef) -> FullySpecifiedType {
        let ast = self.sem.ast;
        let NodeKind::ObjCMethodPrototype(p) = &ast[prototype] else {
            return FullySpecifiedType::default();
        };
        let return_type = self.check_objc_type_name(p.type_name);
        let name = self.sem.check_name(p.selector, self.scope);
        let location = match p.selector {
            Some(selector) => ast.first_token(selector),
            None => ast.first_token(prototype),
        };
        let location = self.sem.location(location);
        let method = self.sem.control.new_objc_method(location, name);

        let mut arguments_scope = None;
        if let SymbolKind::ObjCMethod(data) = &mut self.sem.control.symbol_mut(method).kind {
            data.return_type = return_type;
            data.is_variadic = p.dot_dot_dot != 0;
            arguments_scope = Some(data.arguments);
        }
        if let Some(arguments) = arguments_scope {
            for &argument in &p.arguments {
                let NodeKind::ObjCMessageArgumentDeclaration(decl) = &ast[argument] else {
                    continue;
                };
                let ty = self.check_objc_type_name(decl.type_name);
                let name = match decl.param_name {
                    0 => None,
                    token => {
                        let id = self.sem.spell(token);
                        Some(self.sem.control.name_id(id))
                    }
                };
                let location = self.sem.location(ast.first_token(argument));
                let symbol = self.sem.control.new_argument(location, name);
                self.sem.control.symbol_mut(symbol).ty = ty;
                decl.symbol.set(Some(symbol));
                self.sem.control.enter_symbol(arguments, symbol);
            }
        }
        p.symbol.set(Some(method));
        self.sem.control.symbol(method).ty()
    }

    fn check_objc_type_name(&mut self, type_name: Option<NodeRef>) -> FullySpecifiedType {
        let ast = self.sem.ast;
        let Some(NodeKind::ObjCTypeName(type_name)) = type_name.map(|node| &ast[node]) else {
            return FullySpecifiedType::default();
        };
        let Some(NodeKind::TypeId(type_id)) = type_name.type_id.map(|node| &ast[node]) else {
            return FullySpecifiedType::default();
        };
        let base = self.sem.check_specifiers(&type_id.type_specifiers, self.scope);
        self.sem.check_declarator(type_id.declarator, base.qualified_type(), self.scope).0
    }

    fn cv_flags(&self, ast: &Ast, qualifiers: &[NodeRef]) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        for &qualifier in qualifiers {
            if let NodeKind::SimpleSpecifier(spec) = &ast[qualifier] {
                match self.sem.token_kind(spec.specifier) {
                    TokenKind::Const => flags |= TypeFlags::CONST,
                    TokenKind::Volatile => flags |= TypeFlags::VOLATILE,
                    _ => {}
                }
            }
        }
        flags
    }

    fn array_size(&self, ast: &Ast, expression: Option<NodeRef>) -> u32 {
        let Some(NodeKind::NumericLiteral(literal)) = expression.map(|node| &ast[node]) else {
            return 0;
        };
        let spelling = self.sem.spell(literal.literal).as_str();
        let digits = spelling.trim_end_matches(['u', 'U', 'l', 'L']);
        let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16)
        } else if digits.len() > 1 && digits.starts_with('0') {
            u32::from_str_radix(&digits[1..], 8)
        } else {
            digits.parse()
        };
        parsed.unwrap_or(0)
    }

    fn is_zero_literal(&self, ast: &Ast, node: Option<NodeRef>) -> bool {
        matches!(node.map(|node| &ast[node]), Some(NodeKind::NumericLiteral(literal))
            if self.sem.spell(literal.literal).as_str() == "0")
    }
}

/// Wrap `base` in the pointer operators of a declarator, in order.
pub(crate) fn apply_ptr_operators(
    sem: &mut Semantic<'_>,
    ast: &Ast,
    ptr_operators: &[NodeRef],
    base: FullySpecifiedType,
    scope: ScopeRef,
) -> FullySpecifiedType {
    let mut check = CheckDeclarator::new(sem, scope);
    check.ty = base;
    accept_list(ast, ptr_operators, &mut check);
    check.ty
}

impl Visitor for CheckDeclarator<'_, '_> {
    fn visit_declarator(&mut self, ast: &Ast, _node: NodeRef, n: &Declarator) -> bool {
        accept_list(ast, &n.ptr_operators, self);
        for &postfix in n.postfix_declarators.iter().rev() {
            accept(ast, postfix, self);
        }
        accept_opt(ast, n.core_declarator, self);

        if n.equal != 0 && self.is_zero_literal(ast, n.initializer) {
            if let Some(function) = self.sem.control.type_symbol(self.ty) {
                if let Some(data) = self.sem.control.symbol_mut(function).as_function_mut() {
                    data.flags |= FunctionFlags::PURE_VIRTUAL;
                }
            }
        }
        false
    }

    fn visit_declarator_id(&mut self, _ast: &Ast, _node: NodeRef, n: &DeclaratorId) -> bool {
        self.name = self.sem.check_name(n.name, self.scope);
        false
    }

    fn visit_nested_declarator(&mut self, ast: &Ast, _node: NodeRef, n: &NestedDeclarator) -> bool {
        accept_opt(ast, n.declarator, self);
        false
    }

    fn visit_function_declarator(&mut self, ast: &Ast, node: NodeRef, n: &FunctionDeclarator) -> bool {
        let location = self.sem.location(ast.first_token(node));
        let function = self.sem.control.new_function(location, None);
        let Some(arguments) = self.sem.control.symbol(function).as_function().map(|f| f.arguments) else {
            return false;
        };

        let mut flags = FunctionFlags::empty();
        if let Some(NodeKind::ParameterDeclarationClause(clause)) = n.parameters.map(|p| &ast[p]) {
            for &parameter in &clause.parameter_declarations {
                self.sem.check_declaration(Some(parameter), arguments, None);
            }
            if clause.dot_dot_dot != 0 {
                flags |= FunctionFlags::VARIADIC;
            }
        }
        let cv = self.cv_flags(ast, &n.cv_qualifiers);
        if cv.contains(TypeFlags::CONST) {
            flags |= FunctionFlags::CONST;
        }
        if cv.contains(TypeFlags::VOLATILE) {
            flags |= FunctionFlags::VOLATILE;
        }
        if n.as_cpp_initializer.is_some() {
            flags |= FunctionFlags::AMBIGUOUS;
        }

        let return_type = self.ty;
        if let Some(data) = self.sem.control.symbol_mut(function).as_function_mut() {
            data.return_type = return_type;
            data.flags = flags;
        }
        n.symbol.set(Some(function));
        self.ty = self.sem.control.symbol(function).ty();
        false
    }

    fn visit_array_declarator(&mut self, ast: &Ast, _node: NodeRef, n: &ArrayDeclarator) -> bool {
        self.sem.check_expression(n.expression, self.scope);
        let size = self.array_size(ast, n.expression);
        let array = self.sem.control.array_type(self.ty, size);
        self.ty = FullySpecifiedType::new(array);
        false
    }

    fn visit_pointer(&mut self, ast: &Ast, _node: NodeRef, n: &Pointer) -> bool {
        let pointer = self.sem.control.pointer_type(self.ty);
        self.ty = FullySpecifiedType::with_flags(Some(pointer), self.cv_flags(ast, &n.cv_qualifiers));
        false
    }

    fn visit_reference(&mut self, _ast: &Ast, _node: NodeRef, _n: &Reference) -> bool {
        let reference = self.sem.control.reference_type(self.ty);
        self.ty = FullySpecifiedType::new(reference);
        false
    }

    fn visit_pointer_to_member(&mut self, ast: &Ast, _node: NodeRef, n: &PointerToMember) -> bool {
        let mut names = Vec::new();
        for &specifier in &n.nested_name_specifiers {
            if let NodeKind::NestedNameSpecifier(nested) = &ast[specifier] {
                names.extend(self.sem.check_name(nested.class_or_namespace_name, self.scope));
            }
        }
        let member_name = self.sem.control.qualified_name(names, n.global_scope != 0);
        let pointer = self.sem.control.pointer_to_member_type(member_name, self.ty);
        self.ty = FullySpecifiedType::with_flags(Some(pointer), self.cv_flags(ast, &n.cv_qualifiers));
        false
    }
}
