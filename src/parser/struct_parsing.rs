//! Class parsing module
//!
//! This module handles parsing of class, struct and union specifiers,
//! including base clauses, member specifications, access declarations and
//! constructor initializers.

use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use log::debug;

use super::Parser;
use super::declarations::{parse_empty_declaration, parse_simple_declaration, parse_template_declaration, parse_using};
use super::expressions::parse_expression_list;
use super::names::parse_name;
use super::type_specifiers::parse_attribute_specifiers;

/// Parse `class-key attributes name? base-clause? { members }`.
///
/// Returns `None` without a body; the caller then tries an elaborated type
/// specifier.
pub(crate) fn parse_class_specifier(parser: &mut Parser) -> Option<NodeRef> {
    if !parser.la().is_class_key() {
        return None;
    }
    let classkey = parser.consume_token();
    let attributes = parse_attribute_specifiers(parser);

    // `class EXPORT_MACRO Name`
    if parser.la() == TokenKind::Identifier && parser.la_n(2) == TokenKind::Identifier {
        parser.warning_at(parser.cursor(), ParseError::SkipIdentifier(parser.spell().to_string()));
        parser.consume_token();
    }

    let name = parse_name(parser, true);
    if !matches!(parser.la(), TokenKind::Colon | TokenKind::LeftBrace) {
        return None;
    }

    let previous_in_function_body = std::mem::replace(&mut parser.in_function_body, false);

    let mut class = ClassSpecifier {
        classkey,
        attributes,
        name,
        ..Default::default()
    };

    if parser.la() == TokenKind::Colon {
        class.colon = parser.consume_token();
        parse_base_clause(parser, &mut class.base_clause);
        if parser.la() != TokenKind::LeftBrace {
            parser.error(ParseError::ExpectedLeftBrace(parser.spell().to_string()));
            let saved = parser.cursor();
            for _ in 0..3 {
                if parser.at_eof() || parser.la() == TokenKind::LeftBrace {
                    break;
                }
                parser.consume_token();
            }
            if parser.la() != TokenKind::LeftBrace {
                parser.rewind(saved);
            }
        }
    }

    if parser.la() == TokenKind::LeftBrace {
        class.lbrace = parser.consume_token();
        while !parser.at_eof() && parser.la() != TokenKind::RightBrace {
            let start_declaration = parser.cursor();
            match parse_member_specification(parser) {
                Some(member) => class.member_specifiers.push(member),
                None => {
                    debug!("parse_class_specifier: skipping member at token {}", start_declaration);
                    parser.rewind(start_declaration + 1);
                    parser.skip_until_declaration();
                }
            }
        }
        class.rbrace = parser.match_token(TokenKind::RightBrace);
    }

    parser.in_function_body = previous_in_function_body;
    Some(parser.alloc(class))
}

/// `public:`, `protected slots:`, `signals:`
pub(crate) fn parse_access_declaration(parser: &mut Parser) -> Option<NodeRef> {
    let kind = parser.la();
    if !(kind.is_access_specifier() || kind == TokenKind::Signals) {
        return None;
    }
    let access_specifier = parser.consume_token();
    let slots_kw = if kind != TokenKind::Signals && parser.la() == TokenKind::Slots {
        parser.consume_token()
    } else {
        0
    };
    let colon = parser.match_token(TokenKind::Colon);
    Some(parser.alloc(AccessDeclaration {
        access_specifier,
        slots_kw,
        colon,
    }))
}

fn parse_member_specification(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Semicolon => parse_empty_declaration(parser),
        TokenKind::Using => parse_using(parser),
        TokenKind::Template => parse_template_declaration(parser),
        TokenKind::Signals | TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
            parse_access_declaration(parser)
        }
        _ => parse_simple_declaration(parser, true),
    }
}

/// Base specifiers after the `:` of a class head
fn parse_base_clause(parser: &mut Parser, base_clause: &mut ThinVec<NodeRef>) {
    base_clause.push(parse_base_specifier(parser));
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        base_clause.push(parse_base_specifier(parser));
    }
}

/// `virtual`/access in either order, then the base class name
fn parse_base_specifier(parser: &mut Parser) -> NodeRef {
    let mut base = BaseSpecifier::default();
    if parser.la() == TokenKind::Virtual {
        base.virtual_kw = parser.consume_token();
        if parser.la().is_access_specifier() {
            base.access_specifier = parser.consume_token();
        }
    } else {
        if parser.la().is_access_specifier() {
            base.access_specifier = parser.consume_token();
        }
        if parser.la() == TokenKind::Virtual {
            base.virtual_kw = parser.consume_token();
        }
    }

    base.name = parse_name(parser, true);
    if base.name.is_none() {
        parser.error(ParseError::ExpectedClassName);
    }
    parser.alloc(base)
}

/// `: member(args), ...` before a constructor body
pub(crate) fn parse_ctor_initializer(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Colon {
        return None;
    }
    let colon = parser.consume_token();
    let mut member_initializers = ThinVec::new();
    if let Some(initializer) = parse_mem_initializer(parser) {
        member_initializers.push(initializer);
        while parser.la() == TokenKind::Comma {
            parser.consume_token();
            if let Some(initializer) = parse_mem_initializer(parser) {
                member_initializers.push(initializer);
            }
        }
    }
    Some(parser.alloc(CtorInitializer {
        colon,
        member_initializers,
    }))
}

fn parse_mem_initializer(parser: &mut Parser) -> Option<NodeRef> {
    let name = parse_name(parser, true)?;
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();
    let mut expressions = ThinVec::new();
    parse_expression_list(parser, &mut expressions);
    let rparen = if parser.la() == TokenKind::RightParen {
        parser.consume_token()
    } else {
        0
    };
    Some(parser.alloc(MemInitializer {
        name: Some(name),
        lparen,
        expressions,
        rparen,
    }))
}
