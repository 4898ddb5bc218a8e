//! Semantic names of name nodes.

use crate::ast::*;
use crate::lexer::TokenKind;
use crate::semantic::names::{NameRef, OperatorKind};
use crate::semantic::scope::ScopeRef;
use crate::semantic::types::FullySpecifiedType;
use crate::semantic::Semantic;
use crate::semantic::check_declarator::apply_ptr_operators;

/// Computes the [`NameRef`] of a name node and records it on the node.
pub(crate) struct CheckName<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
    name: Option<NameRef>,
}

impl<'s, 'a> CheckName<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef) -> Self {
        CheckName { sem, scope, name: None }
    }

    pub(crate) fn check(mut self, node: NodeRef) -> Option<NameRef> {
        let ast = self.sem.ast;
        accept(ast, node, &mut self);
        self.name
    }

    fn record(&mut self, slot: &std::cell::Cell<Option<NameRef>>, name: NameRef) {
        slot.set(Some(name));
        self.name = Some(name);
    }

    fn operator_kind(&self, ast: &Ast, node: Option<NodeRef>) -> Option<OperatorKind> {
        let NodeKind::Operator(op) = &ast[node?] else {
            return None;
        };
        let bracketed = op.open != 0 && self.sem.token_kind(op.open) == TokenKind::LeftBracket;
        match self.sem.token_kind(op.op) {
            TokenKind::New if bracketed => Some(OperatorKind::NewArray),
            TokenKind::Delete if bracketed => Some(OperatorKind::DeleteArray),
            TokenKind::LeftParen => Some(OperatorKind::FunctionCall),
            TokenKind::LeftBracket => Some(OperatorKind::ArrayAccess),
            kind => OperatorKind::from_token(kind),
        }
    }

    fn template_argument(&mut self, ast: &Ast, argument: NodeRef) -> FullySpecifiedType {
        match &ast[argument] {
            NodeKind::TypeId(type_id) => {
                let base = self.sem.check_specifiers(&type_id.type_specifiers, self.scope);
                self.sem.check_declarator(type_id.declarator, base.qualified_type(), self.scope).0
            }
            _ => {
                self.sem.check_expression(Some(argument), self.scope);
                FullySpecifiedType::default()
            }
        }
    }
}

impl Visitor for CheckName<'_, '_> {
    fn visit_simple_name(&mut self, _ast: &Ast, _node: NodeRef, n: &SimpleName) -> bool {
        let id = self.sem.spell(n.identifier);
        let name = self.sem.control.name_id(id);
        self.record(&n.name, name);
        false
    }

    fn visit_destructor_name(&mut self, _ast: &Ast, _node: NodeRef, n: &DestructorName) -> bool {
        let id = self.sem.spell(n.identifier);
        let name = self.sem.control.destructor_name(id);
        self.record(&n.name, name);
        false
    }

    fn visit_template_id(&mut self, ast: &Ast, _node: NodeRef, n: &TemplateId) -> bool {
        let arguments = n
            .template_arguments
            .iter()
            .map(|&argument| self.template_argument(ast, argument))
            .collect();
        let id = self.sem.spell(n.identifier);
        let name = self.sem.control.template_name(id, arguments);
        self.record(&n.name, name);
        false
    }

    fn visit_operator_function_id(&mut self, ast: &Ast, _node: NodeRef, n: &OperatorFunctionId) -> bool {
        if let Some(op) = self.operator_kind(ast, n.op) {
            let name = self.sem.control.operator_name(op);
            self.record(&n.name, name);
        }
        false
    }

    fn visit_conversion_function_id(&mut self, ast: &Ast, _node: NodeRef, n: &ConversionFunctionId) -> bool {
        let base = self.sem.check_specifiers(&n.type_specifiers, self.scope);
        let ty = apply_ptr_operators(self.sem, ast, &n.ptr_operators, base, self.scope);
        let name = self.sem.control.conversion_name(ty);
        self.record(&n.name, name);
        false
    }

    fn visit_qualified_name(&mut self, ast: &Ast, _node: NodeRef, n: &QualifiedName) -> bool {
        let mut names = Vec::new();
        for &specifier in &n.nested_name_specifiers {
            if let NodeKind::NestedNameSpecifier(nested) = &ast[specifier] {
                names.extend(self.sem.check_name(nested.class_or_namespace_name, self.scope));
            }
        }
        names.extend(self.sem.check_name(n.unqualified_name, self.scope));
        let name = self.sem.control.qualified_name(names, n.global_scope != 0);
        self.record(&n.name, name);
        false
    }

    fn visit_objc_selector_without_arguments(
        &mut self,
        _ast: &Ast,
        _node: NodeRef,
        n: &ObjCSelectorWithoutArguments,
    ) -> bool {
        let id = self.sem.spell(n.name_token);
        let part = self.sem.control.name_id(id);
        let name = self.sem.control.selector_name(vec![part], false);
        self.record(&n.name, name);
        false
    }

    fn visit_objc_selector_with_arguments(&mut self, ast: &Ast, _node: NodeRef, n: &ObjCSelectorWithArguments) -> bool {
        let mut parts = Vec::new();
        for &argument in &n.selector_arguments {
            if let NodeKind::ObjCSelectorArgument(argument) = &ast[argument] {
                let id = self.sem.spell(argument.name_token);
                parts.push(self.sem.control.name_id(id));
            }
        }
        let name = self.sem.control.selector_name(parts, true);
        self.record(&n.name, name);
        false
    }
}
