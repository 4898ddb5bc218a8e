//! Expressions: names and embedded type ids.
//!
//! Expression types are not inferred. The walk records semantic names on
//! every name node and checks the type ids of casts, `new`, `sizeof` and
//! Qt `SIGNAL`/`SLOT` signatures.

use crate::ast::*;
use crate::semantic::scope::ScopeRef;
use crate::semantic::Semantic;

pub(crate) struct CheckExpression<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
}

impl<'s, 'a> CheckExpression<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef) -> Self {
        CheckExpression { sem, scope }
    }

    pub(crate) fn check(mut self, node: NodeRef) {
        let ast = self.sem.ast;
        accept(ast, node, &mut self);
    }

    fn name(&mut self, node: NodeRef) -> bool {
        self.sem.check_name(Some(node), self.scope);
        false
    }
}

impl Visitor for CheckExpression<'_, '_> {
    fn visit_simple_name(&mut self, _ast: &Ast, node: NodeRef, _n: &SimpleName) -> bool {
        self.name(node)
    }

    fn visit_destructor_name(&mut self, _ast: &Ast, node: NodeRef, _n: &DestructorName) -> bool {
        self.name(node)
    }

    fn visit_template_id(&mut self, _ast: &Ast, node: NodeRef, _n: &TemplateId) -> bool {
        self.name(node)
    }

    fn visit_operator_function_id(&mut self, _ast: &Ast, node: NodeRef, _n: &OperatorFunctionId) -> bool {
        self.name(node)
    }

    fn visit_conversion_function_id(&mut self, _ast: &Ast, node: NodeRef, _n: &ConversionFunctionId) -> bool {
        self.name(node)
    }

    fn visit_qualified_name(&mut self, _ast: &Ast, node: NodeRef, _n: &QualifiedName) -> bool {
        self.name(node)
    }

    fn visit_type_id(&mut self, _ast: &Ast, _node: NodeRef, n: &TypeId) -> bool {
        let base = self.sem.check_specifiers(&n.type_specifiers, self.scope);
        self.sem.check_declarator(n.declarator, base.qualified_type(), self.scope);
        false
    }

    fn visit_new_type_id(&mut self, ast: &Ast, _node: NodeRef, n: &NewTypeId) -> bool {
        self.sem.check_specifiers(&n.type_specifiers, self.scope);
        for &array in &n.new_array_declarators {
            if let NodeKind::NewArrayDeclarator(array) = &ast[array] {
                self.sem.check_expression(array.expression, self.scope);
            }
        }
        false
    }

    fn visit_type_constructor_call(&mut self, ast: &Ast, _node: NodeRef, n: &TypeConstructorCall) -> bool {
        self.sem.check_specifiers(&n.type_specifiers, self.scope);
        accept_list(ast, &n.expressions, self);
        false
    }

    fn visit_qt_method(&mut self, _ast: &Ast, _node: NodeRef, n: &QtMethod) -> bool {
        self.sem.check_declarator(n.declarator, Default::default(), self.scope);
        false
    }

    fn visit_member_access(&mut self, ast: &Ast, _node: NodeRef, n: &MemberAccess) -> bool {
        accept_opt(ast, n.member_name, self);
        false
    }

    fn visit_objc_message_expression(&mut self, ast: &Ast, _node: NodeRef, n: &ObjCMessageExpression) -> bool {
        accept_opt(ast, n.receiver_expression, self);
        self.sem.check_name(n.selector, self.scope);
        accept_list(ast, &n.arguments, self);
        false
    }

    fn visit_objc_selector_expression(&mut self, _ast: &Ast, _node: NodeRef, n: &ObjCSelectorExpression) -> bool {
        self.sem.check_name(n.selector, self.scope);
        false
    }
}
