//! Declaration specifiers: cv-qualifiers, builtin types, `__typeof__`,
//! `__attribute__`, named and elaborated type specifiers.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use thin_vec::ThinVec;

use super::Parser;
use super::declarator::parse_type_id;
use super::expressions::{parse_expression_list, parse_unary_expression};
use super::names::parse_name;

/// Builtin type keywords plus the `__typeof__` and `__attribute__` extensions
pub(crate) fn look_at_builtin_type_specifier(parser: &Parser) -> bool {
    let kind = parser.la();
    kind.is_builtin_type_specifier() || matches!(kind, TokenKind::Typeof | TokenKind::Attribute)
}

fn simple_specifier(parser: &mut Parser) -> NodeRef {
    let specifier = parser.consume_token();
    parser.alloc(SimpleSpecifier { specifier })
}

/// A type specifier sequence as used by type-ids, parameters and conditions.
pub(crate) fn parse_type_specifier(parser: &mut Parser) -> Option<ThinVec<NodeRef>> {
    parse_decl_specifier_seq(parser, true)
}

/// Parse a run of declaration specifiers. At most one type specifier is
/// accepted. Returns `None` when nothing was parsed or a name failed.
pub(crate) fn parse_decl_specifier_seq(parser: &mut Parser, only_type_specifiers: bool) -> Option<ThinVec<NodeRef>> {
    let mut specifiers = ThinVec::new();
    let mut has_type_specifier = false;
    let mut has_named_type_specifier = false;
    loop {
        let kind = parser.la();
        if kind.is_cv_qualifier() || (!only_type_specifiers && kind.is_storage_class_specifier()) {
            specifiers.push(simple_specifier(parser));
        } else if !has_named_type_specifier && look_at_builtin_type_specifier(parser) {
            if let Some(specifier) = parse_builtin_type_specifier(parser) {
                specifiers.push(specifier);
            }
            has_type_specifier = true;
        } else if !has_type_specifier && matches!(kind, TokenKind::ColonColon | TokenKind::Identifier) {
            let name = parse_name(parser, true)?;
            specifiers.push(parser.alloc(NamedTypeSpecifier { name: Some(name) }));
            has_named_type_specifier = true;
            has_type_specifier = true;
        } else if !has_type_specifier && (matches!(kind, TokenKind::Typename | TokenKind::Enum) || kind.is_class_key()) {
            let start = parser.cursor();
            let Some(specifier) = parse_elaborated_type_specifier(parser) else {
                parser.error_at(start, ParseError::ExpectedElaboratedTypeSpecifier);
                break;
            };
            specifiers.push(specifier);
            has_type_specifier = true;
        } else {
            break;
        }
    }
    (!specifiers.is_empty()).then_some(specifiers)
}

/// One builtin keyword, `__attribute__((...))` or `__typeof__`
pub(crate) fn parse_builtin_type_specifier(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Attribute => parse_attribute_specifier(parser),
        TokenKind::Typeof => {
            let typeof_kw = parser.consume_token();
            if parser.la() == TokenKind::LeftParen {
                let lparen = parser.consume_token();
                if let Some(type_id) = parse_type_id(parser)
                    && parser.la() == TokenKind::RightParen
                {
                    let rparen = parser.consume_token();
                    return Some(parser.alloc(TypeofSpecifier {
                        typeof_kw,
                        lparen,
                        expression: Some(type_id),
                        rparen,
                    }));
                }
                parser.rewind(lparen);
            }
            let expression = parse_unary_expression(parser);
            Some(parser.alloc(TypeofSpecifier {
                typeof_kw,
                expression,
                ..Default::default()
            }))
        }
        kind if kind.is_builtin_type_specifier() => Some(simple_specifier(parser)),
        _ => None,
    }
}

pub(crate) fn parse_attribute_specifier(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Attribute {
        return None;
    }
    let attribute_kw = parser.consume_token();
    let first_lparen = parser.match_token(TokenKind::LeftParen);
    let second_lparen = parser.match_token(TokenKind::LeftParen);
    let attributes = parse_attribute_list(parser);
    let first_rparen = parser.match_token(TokenKind::RightParen);
    let second_rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(AttributeSpecifier {
        attribute_kw,
        first_lparen,
        second_lparen,
        attributes,
        first_rparen,
        second_rparen,
    }))
}

/// Comma separated `name`, `name(args)` or `name(tag, args)` entries
pub(crate) fn parse_attribute_list(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut attributes = ThinVec::new();
    while matches!(parser.la(), TokenKind::Identifier | TokenKind::Const) {
        let mut attribute = Attribute {
            identifier: parser.consume_token(),
            ..Default::default()
        };
        if parser.la() == TokenKind::LeftParen {
            attribute.lparen = parser.consume_token();
            if parser.la() == TokenKind::Identifier
                && matches!(parser.la_n(2), TokenKind::Comma | TokenKind::RightParen)
            {
                attribute.tag = parser.consume_token();
                if parser.la() == TokenKind::Comma {
                    parser.consume_token();
                    parse_expression_list(parser, &mut attribute.expressions);
                }
            } else {
                parse_expression_list(parser, &mut attribute.expressions);
            }
            attribute.rparen = parser.match_token(TokenKind::RightParen);
        }
        attributes.push(parser.alloc(attribute));

        if parser.la() != TokenKind::Comma {
            break;
        }
        parser.consume_token();
    }
    attributes
}

/// Run of `__attribute__` specifiers
pub(crate) fn parse_attribute_specifiers(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut attributes = ThinVec::new();
    while let Some(attribute) = parse_attribute_specifier(parser) {
        attributes.push(attribute);
    }
    attributes
}

/// `class X`, `enum E`, `typename T::U`
pub(crate) fn parse_elaborated_type_specifier(parser: &mut Parser) -> Option<NodeRef> {
    let kind = parser.la();
    if !(kind.is_class_key() || matches!(kind, TokenKind::Enum | TokenKind::Typename)) {
        return None;
    }
    let classkey = parser.consume_token();
    let name = parse_name(parser, true)?;
    Some(parser.alloc(ElaboratedTypeSpecifier {
        classkey,
        name: Some(name),
    }))
}

/// Append `const`, `volatile` and attribute specifiers. Returns whether any
/// were consumed.
pub(crate) fn parse_cv_qualifiers(parser: &mut Parser, qualifiers: &mut ThinVec<NodeRef>) -> bool {
    let start = parser.cursor();
    loop {
        let kind = parser.la();
        if kind.is_cv_qualifier() {
            qualifiers.push(simple_specifier(parser));
        } else if kind == TokenKind::Attribute {
            if let Some(attribute) = parse_attribute_specifier(parser) {
                qualifiers.push(attribute);
            }
        } else {
            break;
        }
    }
    start != parser.cursor()
}
