//! Statements.
//!
//! Compound statements, the loop and selection statements and catch
//! clauses each open a [`SymbolKind::Block`] entered in the enclosing
//! scope; their nested statements and condition declarations go into the
//! block's member scope.
//!
//! [`SymbolKind::Block`]: crate::semantic::SymbolKind::Block

use crate::ast::*;
use crate::semantic::scope::ScopeRef;
use crate::semantic::symbols::SymbolRef;
use crate::semantic::Semantic;

pub(crate) struct CheckStatement<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
}

impl<'s, 'a> CheckStatement<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef) -> Self {
        CheckStatement { sem, scope }
    }

    pub(crate) fn check(mut self, node: NodeRef) {
        let ast = self.sem.ast;
        accept(ast, node, &mut self);
    }

    /// Create a block for `node`, record it in `slot` and return its member scope.
    fn open_block(&mut self, node: NodeRef, slot: &std::cell::Cell<Option<SymbolRef>>) -> ScopeRef {
        let location = self.sem.location(self.sem.ast.first_token(node));
        let block = self.sem.control.new_block(location);
        self.sem.set_offsets(block, node);
        slot.set(Some(block));
        self.sem.control.enter_symbol(self.scope, block);
        self.sem.control.symbol(block).members().unwrap_or(self.scope)
    }

    /// Run `f` with `scope` as the current scope.
    fn within<R>(&mut self, scope: ScopeRef, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = previous;
        result
    }

    fn statement(&mut self, node: Option<NodeRef>) {
        self.sem.check_statement(node, self.scope);
    }

    fn expression(&mut self, node: Option<NodeRef>) {
        self.sem.check_expression(node, self.scope);
    }

    /// Declaration statement, condition declaration or plain expression
    fn condition(&mut self, ast: &Ast, node: Option<NodeRef>) {
        let Some(node) = node else {
            return;
        };
        match &ast[node] {
            NodeKind::Condition(condition) => {
                self.declare(ast, node, &condition.type_specifiers, condition.declarator);
            }
            kind if kind.is_statement() => self.statement(Some(node)),
            _ => self.expression(Some(node)),
        }
    }

    /// Enter a Declaration for `specifiers declarator` in the current scope.
    fn declare(&mut self, ast: &Ast, node: NodeRef, specifiers: &[NodeRef], declarator: Option<NodeRef>) {
        let base = self.sem.check_specifiers(specifiers, self.scope);
        let (ty, name) = self.sem.check_declarator(declarator, base.qualified_type(), self.scope);
        let location = declarator.map(|d| ast.first_token(d)).unwrap_or_else(|| ast.first_token(node));
        let location = self.sem.location(location);
        let symbol = self.sem.control.new_declaration(location, name);
        self.sem.set_offsets(symbol, node);
        self.sem.control.symbol_mut(symbol).ty = ty;
        self.sem.control.enter_symbol(self.scope, symbol);
        if let Some(NodeKind::Declarator(d)) = declarator.map(|d| &ast[d]) {
            self.expression(d.initializer);
        }
    }
}

impl Visitor for CheckStatement<'_, '_> {
    fn visit_case_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &CaseStatement) -> bool {
        self.expression(n.expression);
        self.statement(n.statement);
        false
    }

    fn visit_compound_statement(&mut self, _ast: &Ast, node: NodeRef, n: &CompoundStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            for &statement in &n.statements {
                this.statement(Some(statement));
            }
        });
        false
    }

    fn visit_declaration_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &DeclarationStatement) -> bool {
        self.sem.check_declaration(n.declaration, self.scope, None);
        false
    }

    fn visit_do_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &DoStatement) -> bool {
        self.statement(n.statement);
        self.expression(n.expression);
        false
    }

    fn visit_expression_or_declaration_statement(
        &mut self,
        _ast: &Ast,
        _node: NodeRef,
        n: &ExpressionOrDeclarationStatement,
    ) -> bool {
        self.statement(n.declaration);
        false
    }

    fn visit_expression_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &ExpressionStatement) -> bool {
        self.expression(n.expression);
        false
    }

    fn visit_foreach_statement(&mut self, ast: &Ast, node: NodeRef, n: &ForeachStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            if n.type_specifiers.is_empty() {
                this.expression(n.initializer);
            } else {
                this.declare(ast, node, &n.type_specifiers, n.declarator);
            }
            this.expression(n.expression);
            this.statement(n.statement);
        });
        false
    }

    fn visit_for_statement(&mut self, ast: &Ast, node: NodeRef, n: &ForStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            this.statement(n.initializer);
            this.condition(ast, n.condition);
            this.expression(n.expression);
            this.statement(n.statement);
        });
        false
    }

    fn visit_if_statement(&mut self, ast: &Ast, node: NodeRef, n: &IfStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            this.condition(ast, n.condition);
            this.statement(n.statement);
            this.statement(n.else_statement);
        });
        false
    }

    fn visit_labeled_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &LabeledStatement) -> bool {
        self.statement(n.statement);
        false
    }

    fn visit_break_statement(&mut self, _ast: &Ast, _node: NodeRef, _n: &BreakStatement) -> bool {
        false
    }

    fn visit_continue_statement(&mut self, _ast: &Ast, _node: NodeRef, _n: &ContinueStatement) -> bool {
        false
    }

    fn visit_goto_statement(&mut self, _ast: &Ast, _node: NodeRef, _n: &GotoStatement) -> bool {
        false
    }

    fn visit_return_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &ReturnStatement) -> bool {
        self.expression(n.expression);
        false
    }

    fn visit_switch_statement(&mut self, ast: &Ast, node: NodeRef, n: &SwitchStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            this.condition(ast, n.condition);
            this.statement(n.statement);
        });
        false
    }

    fn visit_try_block_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &TryBlockStatement) -> bool {
        self.statement(n.statement);
        for &clause in &n.catch_clauses {
            self.statement(Some(clause));
        }
        false
    }

    fn visit_catch_clause(&mut self, _ast: &Ast, node: NodeRef, n: &CatchClause) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            this.sem.check_declaration(n.exception_declaration, this.scope, None);
            this.statement(n.statement);
        });
        false
    }

    fn visit_while_statement(&mut self, ast: &Ast, node: NodeRef, n: &WhileStatement) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            this.condition(ast, n.condition);
            this.statement(n.statement);
        });
        false
    }

    fn visit_objc_fast_enumeration(&mut self, ast: &Ast, node: NodeRef, n: &ObjCFastEnumeration) -> bool {
        let block = self.open_block(node, &n.symbol);
        self.within(block, |this| {
            if n.type_specifiers.is_empty() {
                this.expression(n.initializer);
            } else {
                this.declare(ast, node, &n.type_specifiers, n.declarator);
            }
            this.expression(n.fast_enumeratable_expression);
            this.statement(n.body_statement);
        });
        false
    }

    fn visit_objc_synchronized_statement(&mut self, _ast: &Ast, _node: NodeRef, n: &ObjCSynchronizedStatement) -> bool {
        self.expression(n.synchronized_object);
        self.statement(n.statement);
        false
    }
}
