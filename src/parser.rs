//! Speculative recursive-descent parser for C++ family sources.
//!
//! The parser walks a token stream whose index 0 is a reserved invalid
//! token, so a token index of `0` always means "absent". Productions are free
//! functions in the sub-modules; each returns `Option<NodeRef>` and leaves the
//! cursor where it stopped. Ambiguous constructs are parsed speculatively
//! through [`ParserTransaction`](utils::ParserTransaction) checkpoints.

use crate::ast::*;
use crate::diagnostic::{DiagnosticEngine, DiagnosticLevel, ParseError};
use crate::lang_options::LanguageFeatures;
use crate::lexer::{Token, TokenKind};
use crate::source_manager::LineMap;
use log::{debug, trace};

pub mod declarations;
pub mod declarator;
pub mod enum_parsing;
pub mod expressions;
pub mod names;
pub mod objc;
pub mod statements;
pub mod struct_parsing;
#[cfg(test)]
mod tests_parser;
pub mod type_specifiers;
pub mod utils;

/// Default bound on nested statement, declaration and expression recursion.
pub const MAX_DEPTH: usize = 512;

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Skip function bodies by brace matching instead of parsing them.
    pub skip_function_bodies: bool,
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            skip_function_bodies: false,
            max_depth: MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParserState {
    current_idx: usize,
    diag_len: usize,
}

/// Main parser structure
pub struct Parser<'arena, 'src> {
    tokens: &'src [Token],
    current_idx: usize,
    ast: &'arena mut Ast,
    diag: &'src mut DiagnosticEngine,
    lines: &'src LineMap,
    file_name: &'src str,

    pub(crate) features: LanguageFeatures,
    pub(crate) options: ParserOptions,
    /// `>` closes a template argument list instead of being relational
    pub(crate) template_arguments: bool,
    pub(crate) in_function_body: bool,
    depth: usize,
    /// Token where the depth limit was first hit
    too_deep: Option<u32>,
}

impl<'arena, 'src> Parser<'arena, 'src> {
    /// Create a new parser. `tokens[0]` must be the reserved invalid token
    /// and the stream must end with [`TokenKind::EndOfFile`].
    pub fn new(
        tokens: &'src [Token],
        lines: &'src LineMap,
        file_name: &'src str,
        ast: &'arena mut Ast,
        diag: &'src mut DiagnosticEngine,
    ) -> Self {
        Parser {
            tokens,
            current_idx: 1,
            ast,
            diag,
            lines,
            file_name,
            features: LanguageFeatures::default(),
            options: ParserOptions::default(),
            template_arguments: false,
            in_function_body: false,
            depth: 0,
            too_deep: None,
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

    /// Parse a whole translation unit. Always produces a root node.
    pub fn parse_translation_unit(&mut self) -> NodeRef {
        let root = declarations::parse_translation_unit(self);
        self.report_depth_limit();
        root
    }

    /// Parse a single comma expression.
    pub fn parse_expression(&mut self) -> Option<NodeRef> {
        let expression = expressions::parse_expression(self);
        self.report_depth_limit();
        expression
    }

    fn report_depth_limit(&mut self) {
        if let Some(index) = self.too_deep {
            let blocked = self.block_errors(false);
            self.error_at(index, ParseError::TooDeeplyNested);
            self.block_errors(blocked);
        }
    }

    // ---- token access ----

    /// The token `n` positions away: `1` is the current token, `0` the
    /// previous one. Out of range positions read as end of file.
    pub(crate) fn la_n(&self, n: usize) -> TokenKind {
        (self.current_idx + n)
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(TokenKind::EndOfFile, |token| token.kind)
    }

    /// The current token kind
    pub(crate) fn la(&self) -> TokenKind {
        self.la_n(1)
    }

    pub(crate) fn tok(&self) -> Token {
        self.token(self.cursor())
    }

    pub(crate) fn token(&self, index: u32) -> Token {
        self.tokens.get(index as usize).copied().unwrap_or_else(Token::invalid)
    }

    pub(crate) fn cursor(&self) -> u32 {
        self.current_idx as u32
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.la() == TokenKind::EndOfFile
    }

    /// Advance and return the index of the consumed token. The end of file
    /// token is never consumed.
    pub(crate) fn consume_token(&mut self) -> u32 {
        let index = self.cursor();
        if !self.at_eof() {
            self.current_idx += 1;
        }
        index
    }

    pub(crate) fn rewind(&mut self, index: u32) {
        trace!("rewind: {} -> {}", self.current_idx, index);
        self.current_idx = (index as usize).clamp(1, self.tokens.len().saturating_sub(1).max(1));
    }

    /// Spelling of the current token for diagnostics
    pub(crate) fn spell(&self) -> &'static str {
        let token = self.tok();
        if token.spell().is_empty() {
            token.kind.spell()
        } else {
            token.spell()
        }
    }

    /// Consume a token of `kind` and return its index, or report
    /// "expected token" and return `0` without moving.
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> u32 {
        if self.la() == kind {
            return self.consume_token();
        }
        self.error(ParseError::ExpectedToken {
            expected: kind.spell().to_string(),
            found: self.spell().to_string(),
        });
        0
    }

    // ---- recovery ----

    /// Skip to the next token of `kind`. Returns false at end of file.
    pub(crate) fn skip_until(&mut self, kind: TokenKind) -> bool {
        while !self.at_eof() {
            if self.la() == kind {
                return true;
            }
            self.consume_token();
        }
        false
    }

    /// Skip to a token that can start a declaration
    pub(crate) fn skip_until_declaration(&mut self) -> bool {
        use TokenKind::*;
        while !self.at_eof() {
            match self.la() {
                Semicolon | Tilde | ColonColon | Identifier | Operator | Char | WcharT | Bool | Short | Int
                | Long | Signed | Unsigned | Float | Double | Void | Extern | Namespace | Using | Typedef | Asm
                | Template | Export | Const | Volatile | Public | Protected | Private | Class | Struct | Union
                | Typename => return true,
                _ => {
                    self.consume_token();
                }
            }
        }
        false
    }

    /// Skip to a token that can start a statement
    pub(crate) fn skip_until_statement(&mut self) -> bool {
        use TokenKind::*;
        while !self.at_eof() {
            match self.la() {
                Semicolon | LeftBrace | RightBrace | Const | Volatile | Identifier | Case | Default | If | Switch
                | While | Do | For | Break | Continue | Return | Goto | Try | Catch | Throw | Char | WcharT | Bool
                | Short | Int | Long | Signed | Unsigned | Float | Double | Void | Class | Struct | Union | Enum
                | ColonColon | Template | Using => return true,
                AtSynchronized if self.features.objc() => return true,
                _ => {
                    self.consume_token();
                }
            }
        }
        false
    }

    /// Move to the token closing the balanced group opened at the cursor.
    /// Groups other than braces give up at `{`, `}` or `;`.
    pub(crate) fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> bool {
        let mut count = 0usize;
        while !self.at_eof() {
            let kind = self.la();
            if kind == open {
                count += 1;
            } else if kind == close {
                count = count.saturating_sub(1);
            } else if open != TokenKind::LeftBrace
                && matches!(kind, TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::Semicolon)
            {
                return false;
            }
            if count == 0 {
                return true;
            }
            self.consume_token();
        }
        false
    }

    // ---- diagnostics ----

    pub(crate) fn error(&mut self, error: ParseError) {
        self.error_at(self.cursor(), error);
    }

    pub(crate) fn error_at(&mut self, index: u32, error: ParseError) {
        let (line, column) = self.position(index);
        self.diag.report_parse_error(error, self.file_name, line, column);
    }

    pub(crate) fn warning_at(&mut self, index: u32, warning: ParseError) {
        let (line, column) = self.position(index);
        self.diag
            .report_at(DiagnosticLevel::Warning, self.file_name, line, column, warning.to_string());
    }

    fn position(&self, index: u32) -> (u32, u32) {
        self.lines.line_column(self.token(index).offset)
    }

    /// Suppress (or re-enable) diagnostics. Returns the previous setting.
    pub(crate) fn block_errors(&mut self, block: bool) -> bool {
        self.diag.block_errors(block)
    }

    pub(crate) fn switch_template_arguments(&mut self, template_arguments: bool) -> bool {
        std::mem::replace(&mut self.template_arguments, template_arguments)
    }

    // ---- speculation ----

    fn save_state(&self) -> ParserState {
        ParserState {
            current_idx: self.current_idx,
            diag_len: self.diag.diagnostics.len(),
        }
    }

    fn restore_state(&mut self, state: ParserState) {
        self.current_idx = state.current_idx;
        self.diag.diagnostics.truncate(state.diag_len);
    }

    pub(crate) fn start_transaction(&mut self) -> utils::ParserTransaction<'_, 'arena, 'src> {
        utils::ParserTransaction::new(self)
    }

    /// Run `f` speculatively: on `None` the cursor and any diagnostics it
    /// reported are rolled back.
    pub(crate) fn speculate<T>(&mut self, f: impl FnOnce(&mut Parser<'arena, 'src>) -> Option<T>) -> Option<T> {
        let trans = self.start_transaction();
        let result = f(trans.parser);
        if result.is_some() {
            trans.commit();
        }
        result
    }

    /// Like [`Parser::speculate`] with diagnostics suppressed.
    pub(crate) fn tentative<T>(&mut self, f: impl FnOnce(&mut Parser<'arena, 'src>) -> Option<T>) -> Option<T> {
        let blocked = self.block_errors(true);
        let result = self.speculate(f);
        self.block_errors(blocked);
        result
    }

    /// Bound the recursion of `f`. Once `options.max_depth` is exceeded every
    /// further nested production fails, and the parse entry point reports
    /// "too deeply nested" once.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Parser<'arena, 'src>) -> Option<T>) -> Option<T> {
        if self.too_deep.is_some() {
            return None;
        }
        if self.depth >= self.options.max_depth {
            debug!("nested: depth limit {} reached at token {}", self.options.max_depth, self.cursor());
            self.too_deep = Some(self.cursor());
            return None;
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ---- nodes ----

    pub(crate) fn alloc(&mut self, kind: impl Into<NodeKind>) -> NodeRef {
        self.ast.alloc(kind)
    }

    pub(crate) fn node(&self, node: NodeRef) -> &NodeKind {
        self.ast.get(node)
    }

    pub(crate) fn node_mut(&mut self, node: NodeRef) -> &mut NodeKind {
        self.ast.get_mut(node)
    }

    pub(crate) fn first_token(&self, node: NodeRef) -> u32 {
        self.ast.first_token(node)
    }
}
