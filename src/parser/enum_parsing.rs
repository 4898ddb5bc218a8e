//! Enum parsing module
//!
//! This module handles parsing of enum specifiers and their enumerators.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use thin_vec::ThinVec;

use super::Parser;
use super::expressions::parse_constant_expression;
use super::names::parse_name;

/// Parse `enum name? { enumerator, ... }`. Without a body this is not an
/// enum specifier and the cursor is left where it stopped.
pub(crate) fn parse_enum_specifier(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Enum {
        return None;
    }
    let enum_kw = parser.consume_token();
    let name = parse_name(parser, true);
    if parser.la() != TokenKind::LeftBrace {
        return None;
    }
    let lbrace = parser.consume_token();

    let mut enumerators = ThinVec::new();
    while !parser.at_eof() && parser.la() != TokenKind::RightBrace {
        if parser.la() != TokenKind::Identifier {
            parser.error(ParseError::ExpectedIdentifier(parser.spell().to_string()));
            parser.skip_until(TokenKind::Identifier);
            if parser.at_eof() {
                break;
            }
        }

        enumerators.push(parse_enumerator(parser));

        if parser.la() != TokenKind::RightBrace {
            parser.match_token(TokenKind::Comma);
        }
    }
    let rbrace = parser.match_token(TokenKind::RightBrace);

    Some(parser.alloc(EnumSpecifier {
        enum_kw,
        name,
        lbrace,
        enumerators,
        rbrace,
        ..Default::default()
    }))
}

/// `identifier` or `identifier = constant-expression`
fn parse_enumerator(parser: &mut Parser) -> NodeRef {
    let identifier = parser.consume_token();
    let mut equal = 0;
    let mut expression = None;
    if parser.la() == TokenKind::Equal {
        equal = parser.consume_token();
        expression = parse_constant_expression(parser);
    }
    parser.alloc(Enumerator {
        identifier,
        equal,
        expression,
    })
}
