//! Declarators, abstract declarators, parameters and type-ids.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use log::debug;
use thin_vec::ThinVec;

use super::Parser;
use super::expressions::{
    parse_constant_expression, parse_initializer_clause, parse_logical_or_expression, parse_primary_expression,
};
use super::names::{parse_name, parse_nested_name_specifier};
use super::type_specifiers::{parse_attribute_specifiers, parse_cv_qualifiers, parse_decl_specifier_seq, parse_type_specifier};

/// `&`, `*` cv-qualifiers, or `X::*` cv-qualifiers
pub(crate) fn parse_ptr_operator(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Ampersand => {
            let amp = parser.consume_token();
            Some(parser.alloc(Reference { amp }))
        }
        TokenKind::Star => {
            let star = parser.consume_token();
            let mut cv_qualifiers = ThinVec::new();
            parse_cv_qualifiers(parser, &mut cv_qualifiers);
            Some(parser.alloc(Pointer { star, cv_qualifiers }))
        }
        TokenKind::ColonColon | TokenKind::Identifier => {
            let start = parser.cursor();
            let global_scope = if parser.la() == TokenKind::ColonColon {
                parser.consume_token()
            } else {
                0
            };
            let mut nested_name_specifiers = ThinVec::new();
            if parse_nested_name_specifier(parser, &mut nested_name_specifiers) && parser.la() == TokenKind::Star {
                let star = parser.consume_token();
                let mut cv_qualifiers = ThinVec::new();
                parse_cv_qualifiers(parser, &mut cv_qualifiers);
                return Some(parser.alloc(PointerToMember {
                    global_scope,
                    nested_name_specifiers,
                    star,
                    cv_qualifiers,
                }));
            }
            parser.rewind(start);
            None
        }
        _ => None,
    }
}

fn parse_ptr_operators(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut ptr_operators = ThinVec::new();
    while let Some(ptr_operator) = parse_ptr_operator(parser) {
        ptr_operators.push(ptr_operator);
    }
    ptr_operators
}

/// Attributes, pointer operators and either a declarator-id or a
/// parenthesized declarator. The cursor is restored on failure.
fn parse_core_declarator(parser: &mut Parser) -> Option<Declarator> {
    let start = parser.cursor();
    let attributes = parse_attribute_specifiers(parser);
    let ptr_operators = parse_ptr_operators(parser);

    match parser.la() {
        TokenKind::ColonColon | TokenKind::Identifier | TokenKind::Tilde | TokenKind::Operator => {
            if let Some(name) = parse_name(parser, true) {
                let declarator_id = parser.alloc(DeclaratorId { name: Some(name) });
                return Some(Declarator {
                    attributes,
                    ptr_operators,
                    core_declarator: Some(declarator_id),
                    ..Default::default()
                });
            }
        }
        TokenKind::LeftParen => {
            if !attributes.is_empty() {
                parser.warning_at(start, ParseError::UnexpectedAttributes);
            }
            let lparen = parser.consume_token();
            if let Some(declarator) = parse_declarator(parser, false)
                && parser.la() == TokenKind::RightParen
            {
                let rparen = parser.consume_token();
                let nested = parser.alloc(NestedDeclarator {
                    lparen,
                    declarator: Some(declarator),
                    rparen,
                });
                return Some(Declarator {
                    attributes,
                    ptr_operators,
                    core_declarator: Some(nested),
                    ..Default::default()
                });
            }
        }
        _ => {}
    }
    parser.rewind(start);
    None
}

/// A declarator with its function and array suffixes.
///
/// With `stop_at_cpp_initializer`, `T x(expr);` is kept as a declarator
/// followed by a parenthesized initializer unless the parentheses also read
/// as a parameter list, in which case a function declarator remembering the
/// initializer reading is produced.
pub(crate) fn parse_declarator(parser: &mut Parser, stop_at_cpp_initializer: bool) -> Option<NodeRef> {
    parser.nested(|parser| {
        let mut declarator = parse_core_declarator(parser)?;
        match parse_postfix_declarators(parser, stop_at_cpp_initializer, &mut declarator.postfix_declarators) {
            PostfixEnd::CppInitializer => {}
            PostfixEnd::Done => declarator.post_attributes = parse_attribute_specifiers(parser),
        }
        Some(parser.alloc(declarator))
    })
}

enum PostfixEnd {
    Done,
    /// Stopped before an initializer, or after a function declarator that
    /// also reads as one
    CppInitializer,
}

fn parse_postfix_declarators(
    parser: &mut Parser,
    stop_at_cpp_initializer: bool,
    postfix_declarators: &mut ThinVec<NodeRef>,
) -> PostfixEnd {
    loop {
        let start_of_postfix = parser.cursor();
        match parser.la() {
            TokenKind::LeftParen => {
                if stop_at_cpp_initializer
                    && let Some(end) = parse_ambiguous_cpp_initializer(parser, postfix_declarators)
                {
                    return end;
                }
                let lparen = parser.consume_token();
                let parameters = parse_parameter_declaration_clause(parser);
                if parser.la() != TokenKind::RightParen {
                    parser.rewind(start_of_postfix);
                    return PostfixEnd::Done;
                }
                let rparen = parser.consume_token();
                let mut cv_qualifiers = ThinVec::new();
                parse_cv_qualifiers(parser, &mut cv_qualifiers);
                let exception_specification = parse_exception_specification(parser);
                postfix_declarators.push(parser.alloc(FunctionDeclarator {
                    lparen,
                    parameters,
                    rparen,
                    cv_qualifiers,
                    exception_specification,
                    ..Default::default()
                }));
            }
            TokenKind::LeftBracket => {
                let lbracket = parser.consume_token();
                let expression = match parser.la() {
                    TokenKind::RightBracket => None,
                    _ => parse_constant_expression(parser),
                };
                let rbracket = if expression.is_some() || parser.la() == TokenKind::RightBracket {
                    parser.match_token(TokenKind::RightBracket)
                } else {
                    0
                };
                postfix_declarators.push(parser.alloc(ArrayDeclarator {
                    lbracket,
                    expression,
                    rbracket,
                }));
            }
            _ => return PostfixEnd::Done,
        }
    }
}

/// `(expr)` followed by `,` or `;`. Returns `None` when the parentheses are
/// not an initializer and should be read as a parameter list.
fn parse_ambiguous_cpp_initializer(parser: &mut Parser, postfix_declarators: &mut ThinVec<NodeRef>) -> Option<PostfixEnd> {
    let lparen = parser.cursor();
    let blocked = parser.block_errors(true);
    let mut equal = 0;
    let initializer = parse_initializer(parser, &mut equal).filter(|&initializer| {
        matches!(parser.node(initializer), NodeKind::NestedExpression(nested)
            if nested.expression.is_some() && nested.rparen != 0)
            && matches!(parser.la(), TokenKind::Comma | TokenKind::Semicolon)
    });
    let Some(initializer) = initializer else {
        parser.block_errors(blocked);
        parser.rewind(lparen);
        return None;
    };

    parser.rewind(lparen);
    parser.consume_token();
    let parameters = parse_parameter_declaration_clause(parser);
    if parser.la() == TokenKind::RightParen {
        debug!("parse_declarator: parentheses at {} read as both initializer and parameters", lparen);
        let rparen = parser.consume_token();
        postfix_declarators.push(parser.alloc(FunctionDeclarator {
            lparen,
            parameters,
            rparen,
            as_cpp_initializer: Some(initializer),
            ..Default::default()
        }));
    } else {
        parser.rewind(lparen);
    }
    parser.block_errors(blocked);
    Some(PostfixEnd::CppInitializer)
}

/// Pointer operators and an optional parenthesized abstract declarator.
/// `None` means nothing was declared.
fn parse_abstract_core_declarator(parser: &mut Parser) -> Option<Declarator> {
    let ptr_operators = parse_ptr_operators(parser);
    let after_ptr_operators = parser.cursor();

    if parser.la() == TokenKind::LeftParen {
        let lparen = parser.consume_token();
        if let Some(declarator) = parse_abstract_declarator(parser)
            && parser.la() == TokenKind::RightParen
        {
            let rparen = parser.consume_token();
            let nested = parser.alloc(NestedDeclarator {
                lparen,
                declarator: Some(declarator),
                rparen,
            });
            return Some(Declarator {
                ptr_operators,
                core_declarator: Some(nested),
                ..Default::default()
            });
        }
    }

    parser.rewind(after_ptr_operators);
    (!ptr_operators.is_empty()).then(|| Declarator {
        ptr_operators,
        ..Default::default()
    })
}

/// A declarator without a name. `None` means the declarator is empty.
pub(crate) fn parse_abstract_declarator(parser: &mut Parser) -> Option<NodeRef> {
    parser.nested(|parser| {
        let mut declarator = parse_abstract_core_declarator(parser);
        let mut postfix_declarators = ThinVec::new();
        loop {
            match parser.la() {
                TokenKind::LeftParen => {
                    let lparen = parser.consume_token();
                    let parameters = match parser.la() {
                        TokenKind::RightParen => None,
                        _ => parse_parameter_declaration_clause(parser),
                    };
                    let rparen = if parser.la() == TokenKind::RightParen {
                        parser.consume_token()
                    } else {
                        0
                    };
                    let mut cv_qualifiers = ThinVec::new();
                    parse_cv_qualifiers(parser, &mut cv_qualifiers);
                    let exception_specification = parse_exception_specification(parser);
                    postfix_declarators.push(parser.alloc(FunctionDeclarator {
                        lparen,
                        parameters,
                        rparen,
                        cv_qualifiers,
                        exception_specification,
                        ..Default::default()
                    }));
                }
                TokenKind::LeftBracket => {
                    let lbracket = parser.consume_token();
                    let expression = match parser.la() {
                        TokenKind::RightBracket => None,
                        _ => parse_constant_expression(parser),
                    };
                    let rbracket = if parser.la() == TokenKind::RightBracket {
                        parser.consume_token()
                    } else {
                        0
                    };
                    postfix_declarators.push(parser.alloc(ArrayDeclarator {
                        lbracket,
                        expression,
                        rbracket,
                    }));
                }
                _ => break,
            }
        }
        if !postfix_declarators.is_empty() {
            declarator.get_or_insert_with(Declarator::default).postfix_declarators = postfix_declarators;
        }
        declarator.map(|declarator| parser.alloc(declarator))
    })
}

pub(crate) fn parse_declarator_or_abstract_declarator(parser: &mut Parser) -> Option<NodeRef> {
    if let Some(declarator) = parser.tentative(|parser| parse_declarator(parser, false)) {
        return Some(declarator);
    }
    parse_abstract_declarator(parser)
}

/// A declarator with its initializer. In member context an anonymous
/// bit-field yields `Some(None)`, bit-field widths are consumed, and a lone
/// parenthesized declarator is rejected.
pub(crate) fn parse_init_declarator(parser: &mut Parser, accept_struct_declarator: bool) -> Option<Option<NodeRef>> {
    let start = parser.cursor();

    let declarator = if accept_struct_declarator && parser.la() == TokenKind::Colon {
        None
    } else {
        Some(parse_declarator(parser, !accept_struct_declarator)?)
    };

    if parser.la() == TokenKind::Asm && parser.la_n(2) == TokenKind::LeftParen {
        parser.consume_token();
        if parser.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen) {
            parser.consume_token();
        }
    }

    let (has_postfix, is_nested) = match declarator.map(|d| parser.node(d)) {
        Some(NodeKind::Declarator(d)) => (
            !d.postfix_declarators.is_empty(),
            d.core_declarator
                .is_some_and(|core| matches!(parser.node(core), NodeKind::NestedDeclarator(_))),
        ),
        _ => (false, false),
    };

    if accept_struct_declarator && !has_postfix && is_nested {
        parser.rewind(start);
        return None;
    }

    if accept_struct_declarator && parser.la() == TokenKind::Colon && !has_postfix {
        let colon = parser.consume_token();
        if parse_constant_expression(parser).is_some() && matches!(parser.la(), TokenKind::Comma | TokenKind::Semicolon) {
            return Some(declarator);
        }
        parser.rewind(colon);
    } else if parser.la() == TokenKind::Equal || (!accept_struct_declarator && parser.la() == TokenKind::LeftParen) {
        if let Some(node) = declarator {
            let mut equal = 0;
            let initializer = parse_initializer(parser, &mut equal);
            if let NodeKind::Declarator(d) = parser.node_mut(node) {
                d.equal = equal;
                d.initializer = initializer;
            }
        }
    }
    Some(declarator)
}

/// `( expression )` or `= initializer-clause`
pub(crate) fn parse_initializer(parser: &mut Parser, equal: &mut u32) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::LeftParen => parse_primary_expression(parser),
        TokenKind::Equal => {
            *equal = parser.consume_token();
            parse_initializer_clause(parser)
        }
        _ => None,
    }
}

/// Parameters up to (not including) `)`. `None` for an empty list.
pub(crate) fn parse_parameter_declaration_clause(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() == TokenKind::RightParen {
        return None;
    }

    let mut parameter_declarations = ThinVec::new();
    let mut dot_dot_dot = 0;
    if parser.la() == TokenKind::DotDotDot {
        dot_dot_dot = parser.consume_token();
    } else {
        parse_parameter_declaration_list(parser, &mut parameter_declarations);
        if parser.la() == TokenKind::DotDotDot {
            dot_dot_dot = parser.consume_token();
        } else if parser.la() == TokenKind::Comma && parser.la_n(2) == TokenKind::DotDotDot {
            parser.consume_token();
            dot_dot_dot = parser.consume_token();
        }
    }

    if parameter_declarations.is_empty() && dot_dot_dot == 0 {
        return None;
    }
    Some(parser.alloc(ParameterDeclarationClause {
        parameter_declarations,
        dot_dot_dot,
    }))
}

pub(crate) fn parse_parameter_declaration_list(parser: &mut Parser, parameters: &mut ThinVec<NodeRef>) -> bool {
    if parser.la() == TokenKind::DotDotDot || (parser.la() == TokenKind::Comma && parser.la_n(2) == TokenKind::DotDotDot)
    {
        return false;
    }
    let Some(parameter) = parse_parameter_declaration(parser) else {
        return false;
    };
    parameters.push(parameter);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        if parser.la() == TokenKind::DotDotDot {
            break;
        }
        if let Some(parameter) = parse_parameter_declaration(parser) {
            parameters.push(parameter);
        }
    }
    true
}

pub(crate) fn parse_parameter_declaration(parser: &mut Parser) -> Option<NodeRef> {
    let type_specifiers = parse_decl_specifier_seq(parser, false)?;
    let declarator = parse_declarator_or_abstract_declarator(parser);
    let (equal, expression) = if parser.la() == TokenKind::Equal {
        let equal = parser.consume_token();
        (equal, parse_logical_or_expression(parser))
    } else {
        (0, None)
    };
    Some(parser.alloc(ParameterDeclaration {
        type_specifiers,
        declarator,
        equal,
        expression,
        ..Default::default()
    }))
}

/// `throw ( type-id-list )` or `throw ( ... )`
pub(crate) fn parse_exception_specification(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Throw {
        return None;
    }
    let mut specification = ExceptionSpecification {
        throw_kw: parser.consume_token(),
        ..Default::default()
    };
    if parser.la() == TokenKind::LeftParen {
        specification.lparen = parser.consume_token();
    }
    if parser.la() == TokenKind::DotDotDot {
        specification.dot_dot_dot = parser.consume_token();
    } else {
        parse_type_id_list(parser, &mut specification.type_ids);
    }
    if parser.la() == TokenKind::RightParen {
        specification.rparen = parser.consume_token();
    }
    Some(parser.alloc(specification))
}

pub(crate) fn parse_type_id(parser: &mut Parser) -> Option<NodeRef> {
    let type_specifiers = parse_type_specifier(parser)?;
    let declarator = parse_abstract_declarator(parser);
    Some(parser.alloc(TypeId {
        type_specifiers,
        declarator,
    }))
}

pub(crate) fn parse_type_id_list(parser: &mut Parser, type_ids: &mut ThinVec<NodeRef>) -> bool {
    let Some(type_id) = parse_type_id(parser) else {
        return false;
    };
    type_ids.push(type_id);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        if let Some(type_id) = parse_type_id(parser) {
            type_ids.push(type_id);
        }
    }
    true
}
