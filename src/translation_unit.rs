//! Translation unit: one preprocessed buffer with its tokens, AST and
//! diagnostics.
//!
//! A [`TranslationUnit`] owns everything the parser and the semantic pass
//! borrow. Symbols live in a [`Control`] owned by the caller, so several
//! units can share one symbol forest.

use log::debug;

use crate::StringId;
use crate::ast::dumper::AstDumper;
use crate::ast::{Ast, NodeRef};
use crate::diagnostic::DiagnosticEngine;
use crate::lang_options::LanguageFeatures;
use crate::lexer::{Token, tokenize};
use crate::parser::{Parser, ParserOptions};
use crate::semantic::{Binder, Control, NamespaceBindings, Semantic, SemanticOptions, SymbolRef};
use crate::source_manager::LineMap;

/// What [`TranslationUnit::parse`] expects the buffer to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    TranslationUnit,
    /// A single comma expression
    Expression,
}

pub struct TranslationUnit {
    file_name: StringId,
    source: String,
    tokens: Vec<Token>,
    lines: LineMap,
    ast: Ast,
    diagnostics: DiagnosticEngine,
    features: LanguageFeatures,
    options: ParserOptions,
    root: Option<NodeRef>,
}

impl TranslationUnit {
    pub fn new(file_name: &str, source: impl Into<String>) -> Self {
        let source = source.into();
        let lines = LineMap::new(&source);
        TranslationUnit {
            file_name: StringId::new(file_name),
            source,
            tokens: Vec::new(),
            lines,
            ast: Ast::new(),
            diagnostics: DiagnosticEngine::new(),
            features: LanguageFeatures::default(),
            options: ParserOptions::default(),
            root: None,
        }
    }

    pub fn with_features(mut self, features: LanguageFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Tokenize on first use. Index 0 holds the reserved invalid token.
    fn ensure_tokens(&mut self) {
        if !self.tokens.is_empty() {
            return;
        }
        self.tokens.push(Token::invalid());
        self.tokens.extend(tokenize(&self.source, self.features));
        debug!("{}: {} tokens", self.file_name, self.tokens.len() - 1);
    }

    /// Parse the buffer and return the root. Parsing twice returns the
    /// first root.
    pub fn parse(&mut self, mode: ParseMode) -> Option<NodeRef> {
        if self.root.is_some() {
            return self.root;
        }
        self.ensure_tokens();
        let mut parser = Parser::new(
            &self.tokens,
            &self.lines,
            self.file_name.as_str(),
            &mut self.ast,
            &mut self.diagnostics,
        )
        .with_features(self.features)
        .with_options(self.options);
        self.root = match mode {
            ParseMode::TranslationUnit => Some(parser.parse_translation_unit()),
            ParseMode::Expression => parser.parse_expression(),
        };
        debug!("{}: parsed {} nodes", self.file_name, self.ast.len());
        self.root
    }

    /// A semantic pass over this unit, recording into `control`.
    pub fn semantic<'a>(&'a mut self, control: &'a mut Control) -> Semantic<'a> {
        self.ensure_tokens();
        Semantic::new(
            &self.ast,
            &self.tokens,
            &self.lines,
            self.file_name,
            control,
            &mut self.diagnostics,
        )
    }

    /// Parse if needed, then check every declaration into `global` (a fresh
    /// global namespace when `None`). Returns the global namespace.
    pub fn check(&mut self, control: &mut Control, global: Option<SymbolRef>, options: SemanticOptions) -> SymbolRef {
        let root = self.parse(ParseMode::TranslationUnit);
        let mut semantic = self.semantic(control).with_options(options);
        match root {
            Some(root) => semantic.check_translation_unit(root, global),
            None => {
                let location = semantic.location(0);
                global.unwrap_or_else(|| semantic.control.new_namespace(location, None))
            }
        }
    }

    /// Merge the namespaces reachable from `global` into a binding tree.
    pub fn bind(&mut self, control: &Control, global: SymbolRef) -> NamespaceBindings {
        Binder::new(control, &mut self.diagnostics).bind(global)
    }

    pub fn file_name(&self) -> StringId {
        self.file_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: u32) -> Token {
        self.tokens.get(index as usize).copied().unwrap_or_else(Token::invalid)
    }

    /// Number of real tokens, end of file included
    pub fn token_count(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub fn line_map(&self) -> &LineMap {
        &self.lines
    }

    /// 1-based line and column of a token
    pub fn position(&self, index: u32) -> (u32, u32) {
        self.lines.line_column(self.token(index).offset)
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    pub fn features(&self) -> LanguageFeatures {
        self.features
    }

    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticEngine {
        &mut self.diagnostics
    }

    /// Text dump of the tree under `node`
    pub fn dump(&self, node: NodeRef) -> String {
        AstDumper::dump_text(&self.ast, &self.tokens, node)
    }
}
