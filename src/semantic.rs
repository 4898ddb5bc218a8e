//! Semantic analysis module.
//!
//! This module populates symbol tables from a parsed translation unit:
//! - [`Control`]: the factory owning names, types, symbols and scopes
//! - the checkers, one visitor per syntactic category, which create
//!   symbols, attach fully specified types and annotate the AST
//! - [`namespace_binding`]: merging namespace fragments after checking
//! - [`pretty`]: printing names and types
//!
//! [`Semantic`] carries the state shared by every checker: the translation
//! unit being checked, the current visibility and Qt method key, and the
//! options.

use log::debug;

use crate::StringId;
use crate::ast::{Ast, NodeRef};
use crate::diagnostic::{DiagnosticEngine, SemanticError};
use crate::lexer::{Token, TokenKind};
use crate::source_manager::LineMap;

pub mod check_declaration;
pub mod check_declarator;
pub mod check_expression;
pub mod check_name;
pub mod check_specifier;
pub mod check_statement;
pub mod control;
pub mod names;
pub mod namespace_binding;
pub mod pretty;
pub mod scope;
pub mod symbols;
pub mod types;

// Re-export key types for public API
pub use control::Control;
pub use names::{Name, NameRef, OperatorKind};
pub use namespace_binding::{Binder, BindingRef, NamespaceBinding, NamespaceBindings};
pub use pretty::{NamePrettyPrinter, Overview, TypePrettyPrinter};
pub use scope::{Scope, ScopeKind, ScopeRef};
pub use symbols::{
    Class, ClassKey, Function, FunctionFlags, Location, MethodKey, ObjCClass, ObjCMethod, Storage, Symbol,
    SymbolKind, SymbolRef, Visibility,
};
pub use types::{FloatKind, FullySpecifiedType, IntegerKind, Type, TypeFlags, TypeRef};

use check_declaration::CheckDeclaration;
use check_declarator::CheckDeclarator;
use check_expression::CheckExpression;
use check_name::CheckName;
use check_specifier::CheckSpecifier;
use check_statement::CheckStatement;

/// Options of a semantic pass
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticOptions {
    /// Leave function bodies unchecked
    pub skip_function_bodies: bool,
    /// Warn about unnamed arguments of public member functions
    pub check_anonymous_arguments: bool,
}

/// Shared state of the checkers for one translation unit.
pub struct Semantic<'a> {
    pub(crate) ast: &'a Ast,
    tokens: &'a [Token],
    lines: &'a LineMap,
    file_name: StringId,
    pub control: &'a mut Control,
    pub diagnostics: &'a mut DiagnosticEngine,
    pub options: SemanticOptions,
    visibility: Visibility,
    method_key: MethodKey,
    objc_visibility: Visibility,
}

impl<'a> Semantic<'a> {
    pub fn new(
        ast: &'a Ast,
        tokens: &'a [Token],
        lines: &'a LineMap,
        file_name: StringId,
        control: &'a mut Control,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        Semantic {
            ast,
            tokens,
            lines,
            file_name,
            control,
            diagnostics,
            options: SemanticOptions::default(),
            visibility: Visibility::Public,
            method_key: MethodKey::Normal,
            objc_visibility: Visibility::Protected,
        }
    }

    pub fn with_options(mut self, options: SemanticOptions) -> Self {
        self.options = options;
        self
    }

    /// Check every top-level declaration of `root` into the members of
    /// `global`, creating the global namespace when none is given.
    ///
    /// Passing the namespace returned by an earlier call shares one symbol
    /// forest between translation units.
    pub fn check_translation_unit(&mut self, root: NodeRef, global: Option<SymbolRef>) -> SymbolRef {
        let global = match global {
            Some(global) => global,
            None => {
                let location = self.location(0);
                self.control.new_namespace(location, None)
            }
        };
        let Some(members) = self.control.symbol(global).members() else {
            return global;
        };
        debug!("checking translation unit {}", self.file_name);
        let declarations = match &self.ast[root] {
            crate::ast::NodeKind::TranslationUnitDecl(unit) => unit.declarations.to_vec(),
            _ => vec![root],
        };
        for declaration in declarations {
            self.check_declaration(Some(declaration), members, None);
        }
        global
    }

    pub fn check_declaration(&mut self, node: Option<NodeRef>, scope: ScopeRef, template_parameters: Option<ScopeRef>) {
        if let Some(node) = node {
            CheckDeclaration::new(self, scope, template_parameters).check(node);
        }
    }

    pub fn check_statement(&mut self, node: Option<NodeRef>, scope: ScopeRef) {
        if let Some(node) = node {
            CheckStatement::new(self, scope).check(node);
        }
    }

    /// Base type of a specifier sequence
    pub fn check_specifiers(&mut self, specifiers: &[NodeRef], scope: ScopeRef) -> FullySpecifiedType {
        CheckSpecifier::new(self, scope).check(specifiers)
    }

    /// Type and name of a declarator applied to `base`
    pub fn check_declarator(
        &mut self,
        declarator: Option<NodeRef>,
        base: FullySpecifiedType,
        scope: ScopeRef,
    ) -> (FullySpecifiedType, Option<NameRef>) {
        match declarator {
            Some(declarator) => CheckDeclarator::new(self, scope).check(declarator, base),
            None => (base, None),
        }
    }

    /// Type of an Objective-C method prototype
    pub fn check_objc_method_prototype(&mut self, prototype: NodeRef, scope: ScopeRef) -> FullySpecifiedType {
        CheckDeclarator::new(self, scope).check_method_prototype(prototype)
    }

    pub fn check_expression(&mut self, node: Option<NodeRef>, scope: ScopeRef) {
        if let Some(node) = node {
            CheckExpression::new(self, scope).check(node);
        }
    }

    pub fn check_name(&mut self, node: Option<NodeRef>, scope: ScopeRef) -> Option<NameRef> {
        node.and_then(|node| CheckName::new(self, scope).check(node))
    }

    // state switches

    pub fn current_visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn switch_visibility(&mut self, visibility: Visibility) -> Visibility {
        std::mem::replace(&mut self.visibility, visibility)
    }

    pub fn current_method_key(&self) -> MethodKey {
        self.method_key
    }

    pub fn switch_method_key(&mut self, method_key: MethodKey) -> MethodKey {
        std::mem::replace(&mut self.method_key, method_key)
    }

    pub fn current_objc_visibility(&self) -> Visibility {
        self.objc_visibility
    }

    pub fn switch_objc_visibility(&mut self, visibility: Visibility) -> Visibility {
        std::mem::replace(&mut self.objc_visibility, visibility)
    }

    /// Run `f` with `visibility` and `method_key`, restoring both afterwards.
    pub(crate) fn with_access<R>(
        &mut self,
        visibility: Visibility,
        method_key: MethodKey,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous_visibility = self.switch_visibility(visibility);
        let previous_method_key = self.switch_method_key(method_key);
        let result = f(self);
        self.switch_method_key(previous_method_key);
        self.switch_visibility(previous_visibility);
        result
    }

    /// Visibility given to members declared in `scope`
    pub(crate) fn visibility_in(&self, scope: ScopeRef) -> Visibility {
        match self.control.scope(scope).kind {
            ScopeKind::ObjCClass => self.objc_visibility,
            _ => self.visibility,
        }
    }

    pub fn visibility_for_access_specifier(kind: TokenKind) -> Visibility {
        match kind {
            TokenKind::Protected => Visibility::Protected,
            TokenKind::Private => Visibility::Private,
            TokenKind::Signals => Visibility::Protected,
            _ => Visibility::Public,
        }
    }

    pub fn visibility_for_objc_access_specifier(kind: TokenKind) -> Visibility {
        match kind {
            TokenKind::AtPublic => Visibility::Public,
            TokenKind::AtPrivate => Visibility::Private,
            TokenKind::AtPackage => Visibility::Package,
            _ => Visibility::Protected,
        }
    }

    pub fn visibility_for_class_key(kind: TokenKind) -> Visibility {
        match kind {
            TokenKind::Class => Visibility::Private,
            _ => Visibility::Public,
        }
    }

    // token helpers

    pub(crate) fn token(&self, index: u32) -> Token {
        self.tokens.get(index as usize).copied().unwrap_or_else(Token::invalid)
    }

    pub(crate) fn token_kind(&self, index: u32) -> TokenKind {
        self.token(index).kind
    }

    pub(crate) fn spell(&self, index: u32) -> StringId {
        self.token(index).text
    }

    pub(crate) fn location(&self, token: u32) -> Location {
        let (line, column) = self.lines.line_column(self.token(token).offset);
        Location::new(self.file_name, token, line, column)
    }

    /// Record the byte range of `node` on `symbol`.
    pub(crate) fn set_offsets(&mut self, symbol: SymbolRef, node: NodeRef) {
        let start = self.token(self.ast.first_token(node)).offset;
        let end = match self.ast.last_token(node) {
            0 => start,
            last => self.token(last - 1).end(),
        };
        let symbol = self.control.symbol_mut(symbol);
        symbol.start_offset = start;
        symbol.end_offset = end;
    }

    pub(crate) fn error(&mut self, token: u32, error: SemanticError) {
        let location = self.location(token);
        self.diagnostics
            .report_semantic_error(error, self.file_name.as_str(), location.line, location.column);
    }

    pub(crate) fn warning(&mut self, token: u32, warning: SemanticError) {
        let location = self.location(token);
        self.diagnostics
            .report_semantic_warning(warning, self.file_name.as_str(), location.line, location.column);
    }
}
