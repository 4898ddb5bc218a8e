//! Statements.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use log::debug;
use thin_vec::ThinVec;

use super::Parser;
use super::declarations::parse_block_declaration;
use super::declarator::{parse_declarator, parse_declarator_or_abstract_declarator, parse_init_declarator};
use super::expressions::{parse_assignment_expression, parse_constant_expression, parse_expression};
use super::objc::{parse_objc_context_keyword, parse_objc_synchronized_statement, peek_at_objc_context_keyword};
use super::type_specifiers::parse_type_specifier;

pub(crate) fn parse_statement(parser: &mut Parser) -> Option<NodeRef> {
    parser.nested(|parser| match parser.la() {
        TokenKind::While => parse_while_statement(parser),
        TokenKind::Do => parse_do_statement(parser),
        TokenKind::QForeach => parse_foreach_statement(parser),
        TokenKind::For => parse_for_statement(parser),
        TokenKind::If => parse_if_statement(parser),
        TokenKind::Switch => parse_switch_statement(parser),
        TokenKind::Try => parse_try_block_statement(parser),
        TokenKind::Case | TokenKind::Default => parse_labeled_statement(parser),
        TokenKind::Break => parse_break_statement(parser),
        TokenKind::Continue => parse_continue_statement(parser),
        TokenKind::Goto => parse_goto_statement(parser),
        TokenKind::Return => parse_return_statement(parser),
        TokenKind::LeftBrace => parse_compound_statement(parser),
        TokenKind::Asm
        | TokenKind::Namespace
        | TokenKind::Using
        | TokenKind::Template
        | TokenKind::Class
        | TokenKind::Struct
        | TokenKind::Union => parse_declaration_statement(parser),
        TokenKind::Semicolon => {
            let semicolon = parser.consume_token();
            Some(parser.alloc(ExpressionStatement {
                expression: None,
                semicolon,
            }))
        }
        TokenKind::AtSynchronized if parser.features.objc() => parse_objc_synchronized_statement(parser),
        TokenKind::Identifier if parser.la_n(2) == TokenKind::Colon => parse_labeled_statement(parser),
        _ => parse_expression_or_declaration_statement(parser),
    })
}

fn parse_break_statement(parser: &mut Parser) -> Option<NodeRef> {
    let break_kw = parser.consume_token();
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(BreakStatement { break_kw, semicolon }))
}

fn parse_continue_statement(parser: &mut Parser) -> Option<NodeRef> {
    let continue_kw = parser.consume_token();
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(ContinueStatement { continue_kw, semicolon }))
}

fn parse_goto_statement(parser: &mut Parser) -> Option<NodeRef> {
    let goto_kw = parser.consume_token();
    let identifier = parser.match_token(TokenKind::Identifier);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(GotoStatement {
        goto_kw,
        identifier,
        semicolon,
    }))
}

fn parse_return_statement(parser: &mut Parser) -> Option<NodeRef> {
    let return_kw = parser.consume_token();
    let expression = parse_expression(parser);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(ReturnStatement {
        return_kw,
        expression,
        semicolon,
    }))
}

pub(crate) fn parse_expression_statement(parser: &mut Parser) -> Option<NodeRef> {
    let expression = if parser.la() == TokenKind::Semicolon {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(ExpressionStatement { expression, semicolon }))
}

/// `T(x);` where `T` names a type: as likely a call as a declaration
fn maybe_function_call(parser: &Parser, declaration: &SimpleDeclaration) -> bool {
    let [specifier] = declaration.decl_specifiers.as_slice() else {
        return false;
    };
    if !matches!(parser.node(*specifier), NodeKind::NamedTypeSpecifier(_)) {
        return false;
    }
    let [declarator] = declaration.declarators.as_slice() else {
        return false;
    };
    let NodeKind::Declarator(declarator) = parser.node(*declarator) else {
        return false;
    };
    declarator.ptr_operators.is_empty()
        && declarator.postfix_declarators.is_empty()
        && declarator.initializer.is_none()
        && declarator
            .core_declarator
            .is_some_and(|core| matches!(parser.node(core), NodeKind::NestedDeclarator(_)))
}

/// `x;` with `x` read as a type name and no declarator
fn maybe_simple_expression(parser: &Parser, declaration: &SimpleDeclaration) -> bool {
    declaration.declarators.is_empty()
        && matches!(declaration.decl_specifiers.as_slice(),
            [specifier] if matches!(parser.node(*specifier), NodeKind::NamedTypeSpecifier(_)))
}

/// A statement that may be a declaration. When it reads both ways over the
/// same tokens, both readings are kept.
pub(crate) fn parse_expression_or_declaration_statement(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() == TokenKind::Semicolon {
        return parse_expression_statement(parser);
    }

    let start = parser.cursor();
    let blocked = parser.block_errors(true);
    if let Some(statement) = parse_declaration_statement(parser) {
        let ambiguous = match parser.node(statement) {
            NodeKind::DeclarationStatement(DeclarationStatement { declaration: Some(declaration) }) => {
                match parser.node(*declaration) {
                    NodeKind::SimpleDeclaration(simple) => {
                        !simple.decl_specifiers.is_empty()
                            && !maybe_function_call(parser, simple)
                            && !maybe_simple_expression(parser, simple)
                    }
                    _ => false,
                }
            }
            _ => false,
        };

        if ambiguous {
            let end_of_declaration = parser.cursor();
            parser.rewind(start);
            let result = match parse_expression_statement(parser) {
                Some(expression) if parser.cursor() == end_of_declaration => {
                    debug!("parse_expression_or_declaration_statement: tokens {}..{} read both ways", start, end_of_declaration);
                    parser.alloc(ExpressionOrDeclarationStatement {
                        expression: Some(expression),
                        declaration: Some(statement),
                    })
                }
                _ => {
                    parser.rewind(end_of_declaration);
                    statement
                }
            };
            parser.block_errors(blocked);
            return Some(result);
        }
    }

    parser.block_errors(blocked);
    parser.rewind(start);
    parse_expression_statement(parser)
}

/// A declaration with an initializer, or an expression
fn parse_condition(parser: &mut Parser) -> Option<NodeRef> {
    let condition = parser.tentative(|parser| {
        let type_specifiers = parse_type_specifier(parser)?;
        let declarator = parse_init_declarator(parser, false)??;
        match parser.node(declarator) {
            NodeKind::Declarator(d) if d.initializer.is_some() => Some(parser.alloc(Condition {
                type_specifiers,
                declarator: Some(declarator),
            })),
            _ => None,
        }
    });
    condition.or_else(|| parse_expression(parser))
}

fn parse_while_statement(parser: &mut Parser) -> Option<NodeRef> {
    let while_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let condition = parse_condition(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let statement = parse_statement(parser);
    Some(parser.alloc(WhileStatement {
        while_kw,
        lparen,
        condition,
        rparen,
        statement,
        ..Default::default()
    }))
}

fn parse_do_statement(parser: &mut Parser) -> Option<NodeRef> {
    let do_kw = parser.consume_token();
    let statement = parse_statement(parser);
    let while_kw = parser.match_token(TokenKind::While);
    let lparen = parser.match_token(TokenKind::LeftParen);
    let expression = parse_expression(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(DoStatement {
        do_kw,
        statement,
        while_kw,
        lparen,
        expression,
        rparen,
        semicolon,
    }))
}

/// Qt `foreach (T x, container)` or `foreach (x, container)`
fn parse_foreach_statement(parser: &mut Parser) -> Option<NodeRef> {
    let mut foreach = ForeachStatement {
        foreach_kw: parser.consume_token(),
        ..Default::default()
    };
    foreach.lparen = parser.match_token(TokenKind::LeftParen);

    let declaration = parser.tentative(|parser| {
        let type_specifiers = parse_type_specifier(parser)?;
        let declarator = parse_declarator(parser, false)?;
        Some((type_specifiers, declarator))
    });
    match declaration {
        Some((type_specifiers, declarator)) => {
            foreach.type_specifiers = type_specifiers;
            foreach.declarator = Some(declarator);
        }
        None => foreach.initializer = parse_assignment_expression(parser),
    }

    foreach.comma = parser.match_token(TokenKind::Comma);
    foreach.expression = parse_expression(parser);
    foreach.rparen = parser.match_token(TokenKind::RightParen);
    foreach.statement = parse_statement(parser);
    Some(parser.alloc(foreach))
}

fn parse_for_statement(parser: &mut Parser) -> Option<NodeRef> {
    let for_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);

    if parser.features.objc()
        && let Some(fast_enumeration) = parser.tentative(|parser| parse_objc_fast_enumeration(parser, for_kw, lparen))
    {
        return Some(fast_enumeration);
    }

    let initializer = parse_expression_or_declaration_statement(parser);
    let condition = parse_expression(parser);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    let expression = parse_expression(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let statement = parse_statement(parser);
    Some(parser.alloc(ForStatement {
        for_kw,
        lparen,
        initializer,
        condition,
        semicolon,
        expression,
        rparen,
        statement,
        ..Default::default()
    }))
}

/// `for (T x in collection)` or `for (x in collection)`. The header is
/// parsed with diagnostics blocked; the caller rolls back when there is no
/// `in`.
fn parse_objc_fast_enumeration(parser: &mut Parser, for_kw: u32, lparen: u32) -> Option<NodeRef> {
    let mut enumeration = ObjCFastEnumeration {
        for_kw,
        lparen,
        ..Default::default()
    };

    let declaration = parser.tentative(|parser| {
        let type_specifiers = parse_type_specifier(parser)?;
        let declarator = parse_declarator(parser, false)?;
        peek_at_objc_context_keyword(parser, "in").then_some((type_specifiers, declarator))
    });
    match declaration {
        Some((type_specifiers, declarator)) => {
            enumeration.type_specifiers = type_specifiers;
            enumeration.declarator = Some(declarator);
        }
        None => enumeration.initializer = parse_assignment_expression(parser),
    }

    enumeration.in_token = parse_objc_context_keyword(parser, "in")?;
    parser.block_errors(false);
    enumeration.fast_enumeratable_expression = parse_expression(parser);
    enumeration.rparen = parser.match_token(TokenKind::RightParen);
    enumeration.body_statement = parse_statement(parser);
    Some(parser.alloc(enumeration))
}

pub(crate) fn parse_compound_statement(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftBrace {
        return None;
    }
    let lbrace = parser.consume_token();
    let mut statements = ThinVec::new();
    while !parser.at_eof() && parser.la() != TokenKind::RightBrace {
        let start_statement = parser.cursor();
        match parse_statement(parser) {
            Some(statement) => statements.push(statement),
            None => {
                debug!("parse_compound_statement: skipping from token {}", start_statement);
                parser.rewind(start_statement + 1);
                parser.skip_until_statement();
            }
        }
    }
    let rbrace = parser.match_token(TokenKind::RightBrace);
    Some(parser.alloc(CompoundStatement {
        lbrace,
        statements,
        rbrace,
        ..Default::default()
    }))
}

fn parse_if_statement(parser: &mut Parser) -> Option<NodeRef> {
    let mut statement = IfStatement {
        if_kw: parser.consume_token(),
        ..Default::default()
    };
    statement.lparen = parser.match_token(TokenKind::LeftParen);
    statement.condition = parse_condition(parser);
    statement.rparen = parser.match_token(TokenKind::RightParen);
    statement.statement = parse_statement(parser);
    if statement.statement.is_none() {
        parser.error(ParseError::ExpectedStatement);
    }
    if parser.la() == TokenKind::Else {
        statement.else_kw = parser.consume_token();
        statement.else_statement = parse_statement(parser);
        if statement.else_statement.is_none() {
            parser.error(ParseError::ExpectedStatement);
        }
    }
    Some(parser.alloc(statement))
}

fn parse_switch_statement(parser: &mut Parser) -> Option<NodeRef> {
    let switch_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let condition = parse_condition(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let statement = parse_statement(parser);
    Some(parser.alloc(SwitchStatement {
        switch_kw,
        lparen,
        condition,
        rparen,
        statement,
        ..Default::default()
    }))
}

/// `label:`, `default:` and `case expr:` statements
fn parse_labeled_statement(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Identifier if parser.la_n(2) == TokenKind::Colon => {
            let label = parser.consume_token();
            let colon = parser.consume_token();
            let statement = parse_statement(parser);
            Some(parser.alloc(LabeledStatement { label, colon, statement }))
        }
        TokenKind::Default => {
            let label = parser.consume_token();
            let colon = parser.match_token(TokenKind::Colon);
            let statement = parse_statement(parser);
            Some(parser.alloc(LabeledStatement { label, colon, statement }))
        }
        TokenKind::Case => {
            let case_kw = parser.consume_token();
            let expression = parse_constant_expression(parser);
            let colon = parser.match_token(TokenKind::Colon);
            let statement = parse_statement(parser);
            Some(parser.alloc(CaseStatement {
                case_kw,
                expression,
                colon,
                statement,
            }))
        }
        _ => None,
    }
}

pub(crate) fn parse_declaration_statement(parser: &mut Parser) -> Option<NodeRef> {
    let declaration = parse_block_declaration(parser)?;
    Some(parser.alloc(DeclarationStatement {
        declaration: Some(declaration),
    }))
}

pub(crate) fn parse_try_block_statement(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Try {
        return None;
    }
    let try_kw = parser.consume_token();
    let statement = parse_compound_statement(parser);
    let mut catch_clauses = ThinVec::new();
    while let Some(catch_clause) = parse_catch_clause(parser) {
        catch_clauses.push(catch_clause);
    }
    Some(parser.alloc(TryBlockStatement {
        try_kw,
        statement,
        catch_clauses,
    }))
}

fn parse_catch_clause(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Catch {
        return None;
    }
    let catch_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let exception_declaration = parse_exception_declaration(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let statement = parse_compound_statement(parser);
    Some(parser.alloc(CatchClause {
        catch_kw,
        lparen,
        exception_declaration,
        rparen,
        statement,
        ..Default::default()
    }))
}

/// `...` or a type with an optional (possibly abstract) declarator
fn parse_exception_declaration(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() == TokenKind::DotDotDot {
        let dot_dot_dot = parser.consume_token();
        return Some(parser.alloc(ExceptionDeclaration {
            dot_dot_dot,
            ..Default::default()
        }));
    }
    let type_specifiers = parse_type_specifier(parser)?;
    let declarator = parse_declarator_or_abstract_declarator(parser);
    Some(parser.alloc(ExceptionDeclaration {
        type_specifiers,
        declarator,
        dot_dot_dot: 0,
    }))
}
