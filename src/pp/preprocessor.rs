//! Macro expansion and conditional compilation for one file at a time.
//!
//! The preprocessor works on the lexer's tokens and produces text. Directive
//! lines and skipped lines turn into empty lines, so every line of the output
//! corresponds to the same line of the input.

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use crate::lang_options::LanguageFeatures;
use crate::lexer::{Lexer, Token, TokenFlags, TokenKind};
use crate::pp::client::{Client, IncludeAction, IncludeRequest, IncludeType, MacroArgumentReference};
use crate::pp::interpreter::Interpreter;
use crate::pp::macros::{Environment, Macro, MacroFlags};
use crate::source_manager::LineMap;
use crate::StringId;
use chrono::{DateTime, Datelike, Local, Timelike};
use std::collections::VecDeque;
use std::path::PathBuf;

/// Maximum nesting of `#if` groups in one file.
pub const MAX_LEVEL: usize = 512;

/// Preprocessor errors. Only the first two abort processing; the rest are reported as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PPError {
    #[error("too many nested conditionals")]
    TooManyNestedConditionals,
    #[error("#include nested too deeply")]
    IncludeDepthExceeded,
    #[error("#{0} without #if")]
    UnmatchedConditional(&'static str),
    #[error("#{0} after #else")]
    DirectiveAfterElse(&'static str),
    #[error("unterminated conditional directive")]
    UnterminatedConditional,
    #[error("malformed #{0} directive")]
    MalformedDirective(String),
    #[error("invalid conditional expression")]
    InvalidConditionalExpression,
    #[error("division by zero in preprocessor expression")]
    DivisionByZero,
    #[error("macro `{0}' used with the wrong number of arguments")]
    MacroArgumentCount(String),
}

/// Include search and resource limits
#[derive(Debug, Clone)]
pub struct PPConfig {
    pub local_include_paths: Vec<PathBuf>,
    pub global_include_paths: Vec<PathBuf>,
    /// Text served for the `<configuration>` pseudo file
    pub configuration: String,
    pub max_include_depth: usize,
    pub features: LanguageFeatures,
}

impl Default for PPConfig {
    fn default() -> Self {
        PPConfig {
            local_include_paths: Vec::new(),
            global_include_paths: Vec::new(),
            configuration: String::new(),
            max_include_depth: 200,
            features: LanguageFeatures::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Conditional {
    /// Some branch of this group was (or is) active
    taken: bool,
    skipping: bool,
    seen_else: bool,
}

struct CollectedArguments {
    args: Vec<Vec<Token>>,
    refs: Vec<MacroArgumentReference>,
    /// Tokens from `(` to `)` inclusive
    length: usize,
}

enum Pending {
    Token(Token),
    /// End of a macro's expansion; the macro is enabled again once this is read
    End(StringId),
}

/// Tokens waiting to be rescanned, followed by the unread part of `rest`.
///
/// Only a function-like macro name reads into `rest`, to find its arguments.
struct Rescan<'t> {
    pending: VecDeque<Pending>,
    rest: &'t [Token],
    /// Tokens of `rest` taken by the rescan
    consumed: usize,
}

impl<'t> Rescan<'t> {
    fn new(tokens: Vec<Token>, rest: &'t [Token]) -> Self {
        Rescan {
            pending: tokens.into_iter().map(Pending::Token).collect(),
            rest,
            consumed: 0,
        }
    }

    /// Tokens after the cursor, without consuming them
    fn lookahead(&self) -> impl Iterator<Item = Token> + '_ {
        let pending = self.pending.iter().filter_map(|item| match item {
            Pending::Token(token) => Some(*token),
            Pending::End(_) => None,
        });
        pending.chain(self.rest[self.consumed..].iter().copied())
    }
}

/// State of the file being processed
struct FileState<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    line_map: LineMap,
    pos: usize,
    conditions: Vec<Conditional>,
    output: String,
    output_line: u32,
    at_line_start: bool,
    last_kind: Option<TokenKind>,
}

impl<'s> FileState<'s> {
    fn new(source: &'s str, features: LanguageFeatures) -> Self {
        let mut lexer = Lexer::new(source, features);
        lexer.set_scan_keywords(false);
        FileState {
            source,
            tokens: lexer.tokenize_all(),
            line_map: LineMap::new(source),
            pos: 0,
            conditions: Vec::new(),
            output: String::with_capacity(source.len()),
            output_line: 1,
            at_line_start: true,
            last_kind: None,
        }
    }

    fn skipping(&self) -> bool {
        self.conditions.last().is_some_and(|c| c.skipping)
    }

    fn parent_skipping(&self) -> bool {
        let len = self.conditions.len();
        len >= 2 && self.conditions[len - 2].skipping
    }

    fn token(&self, index: usize) -> Token {
        self.tokens.get(index).copied().unwrap_or_else(Token::invalid)
    }

    fn advance_to_line(&mut self, line: u32) {
        while self.output_line < line {
            self.output.push('\n');
            self.output_line += 1;
            self.at_line_start = true;
            self.last_kind = None;
        }
    }

    fn emit(&mut self, token: &Token, line: u32) {
        self.advance_to_line(line);
        if !self.at_line_start && (token.has_leading_space() || needs_separator(self.last_kind, token.kind)) {
            self.output.push(' ');
        }
        self.output.push_str(token.spell());
        self.at_line_start = false;
        self.last_kind = Some(token.kind);
    }

    /// Offset of the first character after the line holding `token`
    fn end_of_line(&self, token: &Token) -> u32 {
        let line = self.line_map.line(token.offset);
        self.line_map
            .line_start(line + 1)
            .unwrap_or(self.source.len() as u32)
    }

    fn finish(mut self) -> String {
        let lines = self.line_map.line_count() as u32;
        self.advance_to_line(lines);
        self.output
    }
}

fn is_word_like(kind: TokenKind) -> bool {
    kind.is_identifier_like() || kind == TokenKind::NumericLiteral
}

fn needs_separator(previous: Option<TokenKind>, next: TokenKind) -> bool {
    match previous {
        Some(previous) => is_word_like(previous) && is_word_like(next),
        None => false,
    }
}

fn synthetic_token(kind: TokenKind, text: &str) -> Token {
    Token::new(
        kind,
        TokenFlags::EXPANDED,
        0,
        text.len() as u32,
        StringId::new(text),
    )
}

fn strip_quotes(text: &str) -> Option<&str> {
    text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"'))
}

/// The macro preprocessor engine.
pub struct Preprocessor<'a> {
    client: &'a mut dyn Client,
    env: &'a mut Environment,
    features: LanguageFeatures,
    max_include_depth: usize,
    include_depth: usize,
}

impl<'a> Preprocessor<'a> {
    pub fn new(client: &'a mut dyn Client, env: &'a mut Environment) -> Self {
        Preprocessor {
            client,
            env,
            features: LanguageFeatures::default(),
            max_include_depth: PPConfig::default().max_include_depth,
            include_depth: 0,
        }
    }

    pub fn with_features(mut self, features: LanguageFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Preprocess `source`, entering includes through the client.
    pub fn run(&mut self, file_name: &str, source: &str) -> Result<String, PPError> {
        log::debug!("preprocess {}", file_name);
        let previous_file = std::mem::replace(&mut self.env.current_file, file_name.to_string());
        let previous_line = self.env.current_line;
        let result = self.process_file(source);
        self.env.current_file = previous_file;
        self.env.current_line = previous_line;
        result
    }

    fn process_file(&mut self, source: &str) -> Result<String, PPError> {
        let mut state = FileState::new(source, self.features);

        while state.pos < state.tokens.len() {
            let token = state.tokens[state.pos];
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            if token.kind == TokenKind::Pound && token.at_line_start() {
                self.handle_directive(&mut state)?;
                continue;
            }
            if state.skipping() {
                state.pos += 1;
                continue;
            }
            if token.kind.is_identifier_like() && self.expand_at_cursor(&mut state) {
                continue;
            }
            let line = state.line_map.line(token.offset);
            state.emit(&token, line);
            state.pos += 1;
        }

        if !state.conditions.is_empty() {
            if state.skipping() && !state.parent_skipping() {
                self.client.stop_skipping_blocks(source.len() as u32);
            }
            let line = state.line_map.line_count() as u32;
            self.report(DiagnosticLevel::Error, line, PPError::UnterminatedConditional);
        }

        Ok(state.finish())
    }

    fn report(&mut self, level: DiagnosticLevel, line: u32, error: PPError) {
        log::debug!("{}:{}: {}", self.env.current_file, line, error);
        let diagnostic = Diagnostic::new(level, self.env.current_file.clone(), line, 0, error.to_string());
        self.client.report(diagnostic);
    }

    fn handle_directive(&mut self, state: &mut FileState) -> Result<(), PPError> {
        let hash = state.tokens[state.pos];
        let start = state.pos + 1;
        state.pos += 1;
        while state.pos < state.tokens.len() {
            let token = state.tokens[state.pos];
            if token.kind == TokenKind::EndOfFile || token.at_line_start() {
                break;
            }
            state.pos += 1;
        }
        let directive: Vec<Token> = state.tokens[start..state.pos].to_vec();
        let line = state.line_map.line(hash.offset);
        self.env.current_line = line;

        let Some(name) = directive.first() else {
            return Ok(());
        };
        let args = &directive[1..];
        let line_end = state.end_of_line(directive.last().unwrap_or(&hash));

        log::trace!("directive #{} at line {}", name.spell(), line);
        match name.spell() {
            "if" => {
                self.push_conditional(state, line_end, |pp| pp.evaluate_condition(args, line))?;
            }
            "ifdef" | "ifndef" => {
                let negate = name.spell() == "ifndef";
                self.push_conditional(state, line_end, |pp| match args.first() {
                    Some(t) if t.kind.is_identifier_like() => pp.env.is_defined(t.text) != negate,
                    _ => {
                        let directive = if negate { "ifndef" } else { "ifdef" };
                        pp.report(DiagnosticLevel::Error, line, PPError::MalformedDirective(directive.into()));
                        false
                    }
                })?;
            }
            "elif" => self.handle_elif(state, args, hash, line, line_end),
            "else" => self.handle_else(state, hash, line, line_end),
            "endif" => self.handle_endif(state, hash, line),
            _ if state.skipping() => {}
            "define" => self.handle_define(state, hash, args, line),
            "undef" => match args.first() {
                Some(t) if t.kind.is_identifier_like() => {
                    self.env.remove(t.text);
                }
                _ => self.report(DiagnosticLevel::Error, line, PPError::MalformedDirective("undef".into())),
            },
            "include" | "import" => self.handle_include(state, args, line, false)?,
            "include_next" => self.handle_include(state, args, line, true)?,
            other => log::trace!("ignore directive #{}", other),
        }
        Ok(())
    }

    fn push_conditional(
        &mut self,
        state: &mut FileState,
        line_end: u32,
        condition: impl FnOnce(&mut Self) -> bool,
    ) -> Result<(), PPError> {
        if state.conditions.len() >= MAX_LEVEL {
            return Err(PPError::TooManyNestedConditionals);
        }
        if state.skipping() {
            state.conditions.push(Conditional {
                taken: true,
                skipping: true,
                seen_else: false,
            });
            return Ok(());
        }
        let value = condition(self);
        state.conditions.push(Conditional {
            taken: value,
            skipping: !value,
            seen_else: false,
        });
        if !value {
            self.client.start_skipping_blocks(line_end);
        }
        Ok(())
    }

    fn handle_elif(&mut self, state: &mut FileState, args: &[Token], hash: Token, line: u32, line_end: u32) {
        let parent_skipping = state.parent_skipping();
        let Some(top) = state.conditions.last().copied() else {
            self.report(DiagnosticLevel::Error, line, PPError::UnmatchedConditional("elif"));
            return;
        };
        if top.seen_else {
            self.report(DiagnosticLevel::Error, line, PPError::DirectiveAfterElse("elif"));
            return;
        }
        if parent_skipping {
            return;
        }
        if top.taken {
            if !top.skipping {
                self.client.start_skipping_blocks(line_end);
            }
            if let Some(top) = state.conditions.last_mut() {
                top.skipping = true;
            }
            return;
        }
        if self.evaluate_condition(args, line) {
            if let Some(top) = state.conditions.last_mut() {
                top.taken = true;
                top.skipping = false;
            }
            self.client.stop_skipping_blocks(hash.offset);
        }
    }

    fn handle_else(&mut self, state: &mut FileState, hash: Token, line: u32, line_end: u32) {
        let parent_skipping = state.parent_skipping();
        let Some(top) = state.conditions.last_mut() else {
            self.report(DiagnosticLevel::Error, line, PPError::UnmatchedConditional("else"));
            return;
        };
        if top.seen_else {
            self.report(DiagnosticLevel::Error, line, PPError::DirectiveAfterElse("else"));
            return;
        }
        top.seen_else = true;
        if parent_skipping {
            return;
        }
        if top.taken {
            let was_skipping = std::mem::replace(&mut top.skipping, true);
            if !was_skipping {
                self.client.start_skipping_blocks(line_end);
            }
        } else {
            top.taken = true;
            top.skipping = false;
            self.client.stop_skipping_blocks(hash.offset);
        }
    }

    fn handle_endif(&mut self, state: &mut FileState, hash: Token, line: u32) {
        let parent_skipping = state.parent_skipping();
        match state.conditions.pop() {
            Some(top) => {
                if top.skipping && !parent_skipping {
                    self.client.stop_skipping_blocks(hash.offset);
                }
            }
            None => self.report(DiagnosticLevel::Error, line, PPError::UnmatchedConditional("endif")),
        }
    }

    fn evaluate_condition(&mut self, args: &[Token], line: u32) -> bool {
        let resolved = self.replace_defined(args);
        let expanded = self.expand_tokens(resolved);
        match Interpreter::evaluate(&expanded) {
            Ok(value) => value,
            Err(error) => {
                self.report(DiagnosticLevel::Error, line, error);
                false
            }
        }
    }

    /// Replace `defined X` and `defined(X)` with `1` or `0`.
    fn replace_defined(&self, tokens: &[Token]) -> Vec<Token> {
        let mut result = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            if token.kind.is_identifier_like() && token.spell() == "defined" {
                let (name, consumed) = match tokens.get(i + 1).map(|t| t.kind) {
                    Some(TokenKind::LeftParen) => {
                        let closed = tokens.get(i + 3).is_some_and(|t| t.kind == TokenKind::RightParen);
                        (tokens.get(i + 2).copied(), if closed { 4 } else { 3 })
                    }
                    _ => (tokens.get(i + 1).copied(), 2),
                };
                let defined = name.is_some_and(|name| self.env.is_defined(name.text));
                result.push(synthetic_token(TokenKind::NumericLiteral, if defined { "1" } else { "0" }));
                i += consumed;
                continue;
            }
            result.push(token);
            i += 1;
        }
        result
    }

    fn handle_define(&mut self, state: &FileState, hash: Token, args: &[Token], line: u32) {
        let name_token = match args.first() {
            Some(t) if t.kind.is_identifier_like() => *t,
            _ => {
                self.report(DiagnosticLevel::Error, line, PPError::MalformedDirective("define".into()));
                return;
            }
        };
        let mut m = Macro::new(name_token.text);
        let mut body_start = 1;

        if args
            .get(1)
            .is_some_and(|t| t.kind == TokenKind::LeftParen && t.offset == name_token.end())
        {
            m.flags |= MacroFlags::FUNCTION_LIKE;
            let mut i = 2;
            loop {
                match args.get(i) {
                    Some(t) if t.kind == TokenKind::RightParen => {
                        i += 1;
                        break;
                    }
                    Some(t) if t.kind == TokenKind::Comma => i += 1,
                    Some(t) if t.kind == TokenKind::DotDotDot => {
                        m.formals.push(StringId::new("__VA_ARGS__"));
                        m.flags |= MacroFlags::VARIADIC;
                        i += 1;
                    }
                    Some(t) if t.kind.is_identifier_like() => {
                        m.formals.push(t.text);
                        i += 1;
                        if args.get(i).is_some_and(|t| t.kind == TokenKind::DotDotDot) {
                            m.flags |= MacroFlags::VARIADIC | MacroFlags::GNU_VARARGS;
                            i += 1;
                        }
                    }
                    _ => {
                        self.report(DiagnosticLevel::Error, line, PPError::MalformedDirective("define".into()));
                        return;
                    }
                }
            }
            body_start = i;
        }

        m.body = args[body_start.min(args.len())..].to_vec();
        if let Some(first) = m.body.first_mut() {
            first.flags.remove(TokenFlags::LEADING_SPACE);
        }
        if let (Some(first), Some(last)) = (m.body.first(), m.body.last()) {
            m.definition = state.source[first.offset as usize..last.end() as usize].to_string();
        }
        let end = args.last().map_or(name_token.end(), |t| t.end());
        m.file_name = self.env.current_file.clone();
        m.line = line;
        m.offset = hash.offset;
        m.length = end - hash.offset;

        log::debug!("define {}", m.signature());
        self.client.macro_added(&m);
        self.env.bind(m);
    }

    fn header_name(&mut self, state: &FileState, args: &[Token]) -> Option<(String, IncludeType)> {
        let first = args.first()?;
        match first.kind {
            TokenKind::StringLiteral => strip_quotes(first.spell()).map(|name| (name.to_string(), IncludeType::Local)),
            TokenKind::Less => {
                let close = args.iter().find(|t| t.kind == TokenKind::Greater)?;
                let name = &state.source[first.end() as usize..close.offset as usize];
                Some((name.to_string(), IncludeType::Global))
            }
            _ => {
                let expanded = self.expand_tokens(args.to_vec());
                let first = expanded.first()?;
                match first.kind {
                    TokenKind::StringLiteral => {
                        strip_quotes(first.spell()).map(|name| (name.to_string(), IncludeType::Local))
                    }
                    TokenKind::Less => {
                        let name: String = expanded[1..]
                            .iter()
                            .take_while(|t| t.kind != TokenKind::Greater)
                            .map(|t| t.spell())
                            .collect();
                        Some((name, IncludeType::Global))
                    }
                    _ => None,
                }
            }
        }
    }

    fn handle_include(
        &mut self,
        state: &FileState,
        args: &[Token],
        line: u32,
        next: bool,
    ) -> Result<(), PPError> {
        let Some((file_name, include_type)) = self.header_name(state, args) else {
            self.report(DiagnosticLevel::Error, line, PPError::MalformedDirective("include".into()));
            return Ok(());
        };
        if self.include_depth >= self.max_include_depth {
            return Err(PPError::IncludeDepthExceeded);
        }

        let request = IncludeRequest {
            file_name,
            include_type,
            line,
            next,
        };
        log::debug!("include {:?} {} at {}:{}", include_type, request.file_name, self.env.current_file, line);
        match self.client.source_needed(&request) {
            IncludeAction::Skip => {}
            IncludeAction::MergeMacros(macros) => {
                log::debug!("reuse {} macros for {}", macros.len(), request.file_name);
                self.env.add_macros(macros.iter());
            }
            IncludeAction::Enter(included) => {
                self.include_depth += 1;
                let output = self.run(&included.file_name, &included.contents);
                self.include_depth -= 1;
                let output = output.unwrap_or_else(|error| {
                    // abandon the included file, keep going in the includer
                    log::warn!("{}: {}", included.file_name, error);
                    let file_name = included.file_name.clone();
                    let diagnostic = Diagnostic::new(DiagnosticLevel::Fatal, file_name, 0, 0, error.to_string());
                    self.client.report(diagnostic);
                    String::new()
                });
                self.client.source_processed(&included.file_name, &output);
            }
        }
        Ok(())
    }

    fn builtin_macro(&self, token: &Token) -> Option<Token> {
        let kind_text = match token.spell() {
            "__LINE__" | "__FILE__" | "__DATE__" | "__TIME__" if self.env.is_defined(token.text) => return None,
            "__LINE__" => (TokenKind::NumericLiteral, self.env.current_line.to_string()),
            "__FILE__" => (
                TokenKind::StringLiteral,
                format!("\"{}\"", self.env.current_file.replace('\\', "\\\\")),
            ),
            "__DATE__" => {
                let now: DateTime<Local> = Local::now();
                (
                    TokenKind::StringLiteral,
                    format!("\"{} {:>2} {}\"", now.format("%b"), now.day(), now.year()),
                )
            }
            "__TIME__" => {
                let now: DateTime<Local> = Local::now();
                (
                    TokenKind::StringLiteral,
                    format!("\"{:02}:{:02}:{:02}\"", now.hour(), now.minute(), now.second()),
                )
            }
            _ => return None,
        };
        let mut replacement = synthetic_token(kind_text.0, &kind_text.1);
        replacement.flags |= token.flags & TokenFlags::LEADING_SPACE;
        Some(replacement)
    }

    fn enabled_macro(&self, token: &Token) -> Option<Macro> {
        self.env.resolve(token.text).filter(|m| !m.is_disabled()).cloned()
    }

    /// Expand the macro named by the token at the cursor. Returns false when
    /// the token is not an expandable macro use.
    fn expand_at_cursor(&mut self, state: &mut FileState) -> bool {
        let token = state.tokens[state.pos];
        let line = state.line_map.line(token.offset);
        self.env.current_line = line;

        if let Some(replacement) = self.builtin_macro(&token) {
            state.emit(&replacement, line);
            state.pos += 1;
            return true;
        }
        let Some(m) = self.enabled_macro(&token) else {
            return false;
        };

        if !m.is_function_like() {
            log::trace!("expand {} at {}", m.name, token.offset);
            self.client.start_expanding_macro(token.offset, &m, token.spell(), &[]);
            let body = m.body.clone();
            let (expansion, consumed) = self.expand_in_source(&state.tokens, state.pos + 1, &token, &m, body);
            self.client.stop_expanding_macro(token.offset, &m);
            emit_expansion(state, &token, expansion, line);
            state.pos += 1 + consumed;
            return true;
        }

        if state.token(state.pos + 1).kind != TokenKind::LeftParen {
            return false;
        }
        let Some(collected) = collect_arguments(state.tokens[state.pos + 1..].iter().copied(), &m) else {
            return false;
        };
        let rparen_index = state.pos + collected.length;
        let rparen = state.tokens[rparen_index];
        let original_text = &state.source[token.offset as usize..rparen.end() as usize];
        log::trace!("expand {}", original_text);

        if !arity_matches(&m, &collected.args) {
            self.report(
                DiagnosticLevel::Warning,
                line,
                PPError::MacroArgumentCount(m.name.as_str().to_string()),
            );
        }

        self.client
            .start_expanding_macro(token.offset, &m, original_text, &collected.refs);
        let substituted = self.substitute_macro(&m, &collected.args);
        let (expansion, consumed) = self.expand_in_source(&state.tokens, rparen_index + 1, &token, &m, substituted);
        self.client.stop_expanding_macro(token.offset, &m);
        emit_expansion(state, &token, expansion, line);
        state.pos = rparen_index + 1 + consumed;
        true
    }

    /// Rescan the expansion of `m` with the source tokens from `resume` on
    /// behind it. Returns the output and the number of source tokens taken.
    fn expand_in_source(
        &mut self,
        tokens: &[Token],
        resume: usize,
        invocation: &Token,
        m: &Macro,
        substituted: Vec<Token>,
    ) -> (Vec<Token>, usize) {
        let mut rescan = Rescan::new(Vec::new(), &tokens[resume.min(tokens.len())..]);
        self.push_expansion(&mut rescan, invocation, m, substituted);
        let expansion = self.rescan(&mut rescan);
        (expansion, rescan.consumed)
    }

    /// Put the expansion of `m` in front of the pending tokens and disable
    /// `m` until all of it has been read.
    fn push_expansion(&mut self, rescan: &mut Rescan, invocation: &Token, m: &Macro, mut tokens: Vec<Token>) {
        if let Some(first) = tokens.first_mut() {
            first.flags.set(TokenFlags::LEADING_SPACE, invocation.has_leading_space());
        }
        self.env.set_disabled(m.name, true);
        rescan.pending.push_front(Pending::End(m.name));
        for mut token in tokens.into_iter().rev() {
            token.flags |= TokenFlags::EXPANDED;
            rescan.pending.push_front(Pending::Token(token));
        }
    }

    /// Drop `count` lookahead tokens. Expansions read to their end are enabled again.
    fn advance(&mut self, rescan: &mut Rescan, mut count: usize) {
        while count > 0 {
            match rescan.pending.pop_front() {
                Some(Pending::End(name)) => self.env.set_disabled(name, false),
                Some(Pending::Token(_)) => count -= 1,
                None => {
                    rescan.consumed += count;
                    count = 0;
                }
            }
        }
    }

    /// Read pending tokens until none are left, expanding every enabled macro.
    fn rescan(&mut self, rescan: &mut Rescan) -> Vec<Token> {
        let mut result = Vec::with_capacity(rescan.pending.len());
        while let Some(item) = rescan.pending.pop_front() {
            let token = match item {
                Pending::End(name) => {
                    self.env.set_disabled(name, false);
                    continue;
                }
                Pending::Token(token) => token,
            };
            if token.kind.is_identifier_like() {
                if let Some(replacement) = self.builtin_macro(&token) {
                    result.push(replacement);
                    continue;
                }
                if let Some(m) = self.enabled_macro(&token) {
                    if !m.is_function_like() {
                        self.push_expansion(rescan, &token, &m, m.body.clone());
                        continue;
                    }
                    if let Some(collected) = collect_arguments(rescan.lookahead(), &m) {
                        log::trace!("expand {} while rescanning", m.name);
                        self.advance(rescan, collected.length);
                        let substituted = self.substitute_macro(&m, &collected.args);
                        self.push_expansion(rescan, &token, &m, substituted);
                        continue;
                    }
                }
            }
            result.push(token);
        }
        result
    }

    /// Expand a self-contained token list.
    fn expand_tokens(&mut self, tokens: Vec<Token>) -> Vec<Token> {
        let mut rescan = Rescan::new(tokens, &[]);
        self.rescan(&mut rescan)
    }

    fn argument<'t>(&self, m: &Macro, args: &'t [Vec<Token>], name: StringId) -> Option<&'t [Token]> {
        let index = m.formal_index(name)?;
        Some(args.get(index).map_or(&[][..], |arg| arg.as_slice()))
    }

    fn substitute_macro(&mut self, m: &Macro, args: &[Vec<Token>]) -> Vec<Token> {
        let body = &m.body;
        let mut result: Vec<Token> = Vec::new();
        let mut i = 0;

        while i < body.len() {
            let token = body[i];
            let next = body.get(i + 1).copied();

            // #param
            if token.kind == TokenKind::Pound {
                if let Some(arg) = next.and_then(|next| self.argument(m, args, next.text)) {
                    let mut stringified = stringify_tokens(arg);
                    stringified.flags |= token.flags & TokenFlags::LEADING_SPACE;
                    result.push(stringified);
                    i += 2;
                    continue;
                }
            }

            // GNU `, ## args`: the comma goes away with an empty variadic argument
            if token.kind == TokenKind::PoundPound
                && result.last().is_some_and(|t| t.kind == TokenKind::Comma)
                && next.is_some_and(|next| m.is_variadic() && m.formals.last() == Some(&next.text))
            {
                let variadic = next.and_then(|next| self.argument(m, args, next.text)).unwrap_or_default();
                if variadic.is_empty() {
                    result.pop();
                } else {
                    result.extend_from_slice(variadic);
                }
                i += 2;
                continue;
            }

            // lhs ## rhs
            if token.kind == TokenKind::PoundPound {
                if let Some(next) = next {
                    let rhs: Vec<Token> = match self.argument(m, args, next.text) {
                        Some(arg) => arg.to_vec(),
                        None => vec![next],
                    };
                    match (result.pop(), rhs.split_first()) {
                        (Some(left), Some((right, rest))) => {
                            result.push(paste_tokens(&left, right, self.features));
                            result.extend_from_slice(rest);
                        }
                        (Some(left), None) => result.push(left),
                        (None, _) => result.extend(rhs),
                    }
                    i += 2;
                    continue;
                }
            }

            if token.kind.is_identifier_like() {
                if let Some(arg) = self.argument(m, args, token.text) {
                    let pasted_next = next.is_some_and(|t| t.kind == TokenKind::PoundPound);
                    let mut replacement = if pasted_next {
                        arg.to_vec()
                    } else {
                        self.expand_tokens(arg.to_vec())
                    };
                    if let Some(first) = replacement.first_mut() {
                        first.flags.set(TokenFlags::LEADING_SPACE, token.has_leading_space());
                    }
                    result.extend(replacement);
                    i += 1;
                    continue;
                }
            }

            result.push(token);
            i += 1;
        }
        result
    }
}

fn arity_matches(m: &Macro, args: &[Vec<Token>]) -> bool {
    if m.is_variadic() {
        args.len() + 1 >= m.formals.len()
    } else {
        args.len() == m.formals.len()
    }
}

/// Scan a balanced argument list; `tokens` starts at the `(`.
/// Returns `None` when the list is not closed.
fn collect_arguments(tokens: impl IntoIterator<Item = Token>, m: &Macro) -> Option<CollectedArguments> {
    let mut tokens = tokens.into_iter();
    let lparen = tokens.next()?;
    if lparen.kind != TokenKind::LeftParen {
        return None;
    }
    let mut args: Vec<Vec<Token>> = vec![Vec::new()];
    let mut refs = Vec::new();
    let mut depth = 0usize;
    let mut arg_start = lparen.end();
    let mut length = 1;

    let close_argument = |arg: &[Token], arg_start: u32, refs: &mut Vec<MacroArgumentReference>| {
        let reference = match (arg.first(), arg.last()) {
            (Some(first), Some(last)) => MacroArgumentReference::new(first.offset, last.end() - first.offset),
            _ => MacroArgumentReference::new(arg_start, 0),
        };
        refs.push(reference);
    };

    loop {
        let token = tokens.next()?;
        length += 1;
        match token.kind {
            TokenKind::EndOfFile => return None,
            TokenKind::Pound if token.at_line_start() && !token.flags.contains(TokenFlags::EXPANDED) => return None,
            TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
            TokenKind::RightBracket => depth = depth.saturating_sub(1),
            TokenKind::RightParen if depth == 0 => {
                if let Some(arg) = args.last() {
                    close_argument(arg, arg_start, &mut refs);
                }
                break;
            }
            TokenKind::RightParen => depth -= 1,
            TokenKind::Comma if depth == 0 && !(m.is_variadic() && args.len() >= m.formals.len()) => {
                if let Some(arg) = args.last() {
                    close_argument(arg, arg_start, &mut refs);
                }
                args.push(Vec::new());
                arg_start = token.end();
                continue;
            }
            _ => {}
        }
        if let Some(arg) = args.last_mut() {
            arg.push(token);
        }
    }

    // `F()` passes no arguments to a macro without formals
    if m.formals.is_empty() && args.len() == 1 && args[0].is_empty() {
        args.clear();
        refs.clear();
    }

    Some(CollectedArguments { args, refs, length })
}

fn emit_expansion(state: &mut FileState, invocation: &Token, mut expansion: Vec<Token>, line: u32) {
    if let Some(first) = expansion.first_mut() {
        first.flags.set(TokenFlags::LEADING_SPACE, invocation.has_leading_space());
    }
    for token in &expansion {
        state.emit(token, line);
    }
}

/// `#arg`: spell the argument tokens as a string literal.
fn stringify_tokens(tokens: &[Token]) -> Token {
    let mut text = String::from("\"");
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && token.has_leading_space() {
            text.push(' ');
        }
        let spelling = token.spell();
        if token.kind.is_string_literal() || matches!(token.kind, TokenKind::CharLiteral | TokenKind::WideCharLiteral) {
            for ch in spelling.chars() {
                match ch {
                    '"' => text.push_str("\\\""),
                    '\\' => text.push_str("\\\\"),
                    _ => text.push(ch),
                }
            }
        } else {
            text.push_str(spelling);
        }
    }
    text.push('"');
    synthetic_token(TokenKind::StringLiteral, &text)
}

/// `a ## b`: glue two spellings and classify the result.
fn paste_tokens(left: &Token, right: &Token, features: LanguageFeatures) -> Token {
    let text = format!("{}{}", left.spell(), right.spell());
    let mut lexer = Lexer::new(&text, features);
    lexer.set_scan_keywords(false);
    let first = lexer.next_token();
    let kind = if first.length as usize == text.len() {
        first.kind
    } else {
        TokenKind::Identifier
    };
    let mut pasted = synthetic_token(kind, &text);
    pasted.flags |= left.flags & TokenFlags::LEADING_SPACE;
    pasted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pp::client::NullClient;

    fn preprocess(source: &str) -> String {
        let mut client = NullClient;
        let mut env = Environment::new();
        let mut pp = Preprocessor::new(&mut client, &mut env);
        match pp.run("test.cpp", source) {
            Ok(output) => output,
            Err(e) => panic!("preprocessing failed: {}", e),
        }
    }

    #[test]
    fn test_object_like_macro() {
        assert_eq!(preprocess("#define A 1\nint x = A;\n"), "\nint x = 1;\n");
    }

    #[test]
    fn test_function_like_macro_with_nested_parens() {
        assert_eq!(preprocess("#define M(x,y) x+y\nM((1,2),3)\n"), "\n(1,2)+3\n");
    }

    #[test]
    fn test_function_like_macro_without_parens_is_not_expanded() {
        assert_eq!(preprocess("#define F(x) x\nint F;\n"), "\nint F;\n");
    }

    #[test]
    fn test_self_reference_is_not_rescanned() {
        assert_eq!(preprocess("#define X X + 1\nX\n"), "\nX + 1\n");
    }

    #[test]
    fn test_stringify_and_paste() {
        let output = preprocess("#define S(a) #a\n#define CAT(a, b) a ## b\nS(x + \"y\") CAT(foo, bar)\n");
        assert_eq!(output, "\n\n\"x + \\\"y\\\"\" foobar\n");
    }

    #[test]
    fn test_variadic_macro() {
        let output = preprocess("#define LOG(fmt, ...) f(fmt, __VA_ARGS__)\nLOG(\"%d %d\", 1, 2)\n");
        assert_eq!(output, "\nf(\"%d %d\", 1, 2)\n");
    }

    #[test]
    fn test_gnu_comma_paste_drops_comma_for_empty_arguments() {
        let output = preprocess("#define LOG(fmt, args...) p(fmt, ## args)\nLOG(\"a\") LOG(\"b\", 1, 2)\n");
        assert_eq!(output, "\np(\"a\") p(\"b\", 1, 2)\n");
        let output = preprocess("#define E(fmt, ...) e(fmt,##__VA_ARGS__)\nE(x) E(x,)\n");
        assert_eq!(output, "\ne(x) e(x)\n");
    }

    #[test]
    fn test_expansion_result_takes_arguments_from_source() {
        assert_eq!(preprocess("#define f(x) x+1\n#define g f\ng(2)\n"), "\n\n2+1\n");
        // the arguments may span lines
        assert_eq!(preprocess("#define f(x) x+1\n#define g f\ng\n(3)\n"), "\n\n3+1\n\n");
        let source = "#define CALL(fn) fn\n#define twice(x) x*2\nint y = CALL(twice)(4);\n";
        assert_eq!(preprocess(source), "\n\nint y = 4*2;\n");
    }

    #[test]
    fn test_macro_is_enabled_after_its_expansion_is_read() {
        // `g` ends before `f` reads its arguments, so it expands again inside them
        let source = "#define f(x) [x]\n#define g f\ng(g)(1)\n";
        assert_eq!(preprocess(source), "\n\n[f](1)\n");
        assert_eq!(preprocess("#define X X + 1\n#define Y X\nY\n"), "\n\nX + 1\n");
    }

    #[test]
    fn test_conditionals_keep_line_structure() {
        let source = "#if 0\nint a;\n#elif defined(B)\nint b;\n#else\nint c;\n#endif\nint d;\n";
        assert_eq!(preprocess(source), "\n\n\n\n\nint c;\n\nint d;\n");
    }

    #[test]
    fn test_too_many_nested_conditionals() {
        let source = "#if 1\n".repeat(MAX_LEVEL + 1);
        let mut client = NullClient;
        let mut env = Environment::new();
        let mut pp = Preprocessor::new(&mut client, &mut env);
        assert_eq!(pp.run("deep.cpp", &source), Err(PPError::TooManyNestedConditionals));
    }

    #[test]
    fn test_builtin_line() {
        assert_eq!(preprocess("\n\nint l = __LINE__;"), "\n\nint l = 3;");
    }
}
