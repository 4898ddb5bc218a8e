//! Names: identifiers, destructor names, template-ids, operator and
//! conversion function ids, and qualified names.

use crate::ast::*;
use crate::lexer::TokenKind;
use log::debug;
use thin_vec::ThinVec;

use super::Parser;
use super::declarator::{parse_ptr_operator, parse_type_id};
use super::expressions::{parse_cast_expression, parse_logical_or_expression};
use super::type_specifiers::parse_type_specifier;

fn simple_name(parser: &mut Parser) -> NodeRef {
    let identifier = parser.consume_token();
    parser.alloc(SimpleName {
        identifier,
        ..Default::default()
    })
}

/// `X` or `X<args>` directly followed by `::`
pub(crate) fn parse_class_or_namespace_name(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Identifier => {
            let identifier = parser.cursor();
            if parser.la_n(2) == TokenKind::Less
                && let Some(template_id) = parse_template_id(parser)
                && parser.la() == TokenKind::ColonColon
            {
                return Some(template_id);
            }
            parser.rewind(identifier);
            if parser.la_n(2) == TokenKind::ColonColon {
                return Some(simple_name(parser));
            }
            None
        }
        TokenKind::Template => {
            let template_kw = parser.consume_token();
            if let Some(template_id) = parse_template_id(parser) {
                return Some(template_id);
            }
            parser.rewind(template_kw);
            None
        }
        _ => None,
    }
}

pub(crate) fn parse_template_id(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Identifier || parser.la_n(2) != TokenKind::Less {
        return None;
    }
    let identifier = parser.consume_token();
    let less = parser.consume_token();
    let mut template_arguments = ThinVec::new();
    if parser.la() != TokenKind::Greater && !parse_template_argument_list(parser, &mut template_arguments) {
        return None;
    }
    if parser.la() != TokenKind::Greater {
        return None;
    }
    let greater = parser.consume_token();
    Some(parser.alloc(TemplateId {
        identifier,
        less,
        template_arguments,
        greater,
        ..Default::default()
    }))
}

/// One or more `class-or-namespace-name ::` pairs.
pub(crate) fn parse_nested_name_specifier(parser: &mut Parser, specifiers: &mut ThinVec<NodeRef>) -> bool {
    let mut last_scope = 0;
    while let Some(class_or_namespace_name) = parse_class_or_namespace_name(parser) {
        if parser.la() != TokenKind::ColonColon {
            break;
        }
        let scope = parser.consume_token();
        last_scope = scope;
        specifiers.push(parser.alloc(NestedNameSpecifier {
            class_or_namespace_name: Some(class_or_namespace_name),
            scope,
        }));
    }
    if last_scope == 0 {
        return false;
    }
    // a failed attempt after the last `::` may have moved the cursor
    parser.rewind(last_scope + 1);
    true
}

/// An optionally qualified name. On failure the cursor is not restored.
pub(crate) fn parse_name(parser: &mut Parser, accept_template_id: bool) -> Option<NodeRef> {
    let global_scope = if parser.la() == TokenKind::ColonColon {
        parser.consume_token()
    } else {
        0
    };

    let start = parser.cursor();
    let mut nested_name_specifiers = ThinVec::new();
    if !parse_nested_name_specifier(parser, &mut nested_name_specifiers) {
        parser.rewind(start);
        nested_name_specifiers.clear();
    }

    let accept_template_id = accept_template_id || !nested_name_specifiers.is_empty();
    let unqualified_name = parse_unqualified_name(parser, accept_template_id)?;
    if global_scope == 0 && nested_name_specifiers.is_empty() {
        return Some(unqualified_name);
    }
    Some(parser.alloc(QualifiedName {
        global_scope,
        nested_name_specifiers,
        unqualified_name: Some(unqualified_name),
        ..Default::default()
    }))
}

pub(crate) fn parse_unqualified_name(parser: &mut Parser, accept_template_id: bool) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Tilde if parser.la_n(2) == TokenKind::Identifier => {
            let tilde = parser.consume_token();
            let identifier = parser.consume_token();
            Some(parser.alloc(DestructorName {
                tilde,
                identifier,
                ..Default::default()
            }))
        }
        TokenKind::Operator => {
            let operator_kw = parser.cursor();
            if let Some(name) = parse_operator_function_id(parser) {
                return Some(name);
            }
            parser.rewind(operator_kw);
            parse_conversion_function_id(parser)
        }
        TokenKind::Identifier => {
            let identifier = parser.cursor();
            if accept_template_id
                && parser.la_n(2) == TokenKind::Less
                && let Some(template_id) = parse_template_id(parser)
                && (!parser.template_arguments
                    || matches!(
                        parser.la(),
                        TokenKind::Comma
                            | TokenKind::Greater
                            | TokenKind::LeftParen
                            | TokenKind::RightParen
                            | TokenKind::ColonColon
                    ))
            {
                return Some(template_id);
            }
            parser.rewind(identifier);
            Some(simple_name(parser))
        }
        TokenKind::Template => {
            let template_kw = parser.consume_token();
            if let Some(template_id) = parse_template_id(parser) {
                return Some(template_id);
            }
            parser.rewind(template_kw);
            None
        }
        _ => None,
    }
}

pub(crate) fn parse_template_argument_list(parser: &mut Parser, arguments: &mut ThinVec<NodeRef>) -> bool {
    let Some(argument) = parse_template_argument(parser) else {
        return false;
    };
    arguments.push(argument);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        if let Some(argument) = parse_template_argument(parser) {
            arguments.push(argument);
        }
    }
    true
}

/// A type-id when one ends at `,` or `>`, otherwise an expression with `>`
/// closing the argument list.
pub(crate) fn parse_template_argument(parser: &mut Parser) -> Option<NodeRef> {
    let start = parser.cursor();
    if let Some(type_id) = parse_type_id(parser)
        && matches!(parser.la(), TokenKind::Comma | TokenKind::Greater)
    {
        return Some(type_id);
    }
    parser.rewind(start);
    let previous = parser.switch_template_arguments(true);
    let expression = parse_logical_or_expression(parser);
    parser.switch_template_arguments(previous);
    expression
}

/// The operator of an operator-function-id, including `new[]`, `()` and `[]`
pub(crate) fn parse_operator(parser: &mut Parser) -> Option<NodeRef> {
    use TokenKind::*;
    let mut operator = crate::ast::Operator::default();
    match parser.la() {
        New | Delete => {
            operator.op = parser.consume_token();
            if parser.la() == LeftBracket {
                operator.open = parser.consume_token();
                operator.close = parser.match_token(RightBracket);
            }
        }
        Plus | Minus | Star | Slash | Percent | Caret | Ampersand | Pipe | Tilde | Exclaim | Less | Greater
        | Comma | AmperEqual | CaretEqual | SlashEqual | Equal | EqualEqual | ExclaimEqual | GreaterEqual
        | GreaterGreaterEqual | LessEqual | LessLessEqual | MinusEqual | PercentEqual | PipeEqual | PlusEqual
        | StarEqual | LessLess | GreaterGreater | AmperAmper | PipePipe | PlusPlus | MinusMinus | ArrowStar
        | DotStar | Arrow => {
            operator.op = parser.consume_token();
        }
        LeftParen if parser.la_n(2) == RightParen => {
            operator.op = parser.consume_token();
            operator.open = operator.op;
            operator.close = parser.consume_token();
        }
        LeftBracket if parser.la_n(2) == RightBracket => {
            operator.op = parser.consume_token();
            operator.open = operator.op;
            operator.close = parser.consume_token();
        }
        _ => return None,
    }
    Some(parser.alloc(operator))
}

pub(crate) fn parse_operator_function_id(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Operator {
        return None;
    }
    let operator_kw = parser.consume_token();
    let op = parse_operator(parser)?;
    Some(parser.alloc(OperatorFunctionId {
        operator_kw,
        op: Some(op),
        ..Default::default()
    }))
}

pub(crate) fn parse_conversion_function_id(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Operator {
        return None;
    }
    let operator_kw = parser.consume_token();
    let type_specifiers = parse_type_specifier(parser)?;
    let mut ptr_operators = ThinVec::new();
    while let Some(ptr_operator) = parse_ptr_operator(parser) {
        ptr_operators.push(ptr_operator);
    }
    Some(parser.alloc(ConversionFunctionId {
        operator_kw,
        type_specifiers,
        ptr_operators,
        ..Default::default()
    }))
}

/// A name used as a primary expression.
///
/// `f<a < b>(c)` is re-read as a plain name when the single template
/// argument is a comparison and what follows parses as a cast. A
/// template-id followed by something that cannot follow a name is re-read
/// the same way.
pub(crate) fn parse_name_id(parser: &mut Parser) -> Option<NodeRef> {
    let start = parser.cursor();
    let name = parse_name(parser, true)?;

    if parser.la() == TokenKind::LeftParen
        && let NodeKind::TemplateId(template_id) = parser.node(name)
        && let [argument] = template_id.template_arguments.as_slice()
        && matches!(parser.node(*argument), NodeKind::BinaryExpression(_))
    {
        let saved = parser.cursor();
        let looks_like_cast = parser
            .tentative(|parser| parse_cast_expression(parser))
            .is_some_and(|expression| match parser.node(expression) {
                NodeKind::CastExpression(cast) => {
                    cast.lparen != 0 && cast.rparen != 0 && cast.type_id.is_some() && cast.expression.is_some()
                }
                _ => false,
            });
        if looks_like_cast {
            debug!("parse_name_id: template-id at {} re-read as a name before a cast", start);
            parser.rewind(start);
            return parse_name(parser, false);
        }
        parser.rewind(saved);
    }

    let kind = parser.la();
    if matches!(
        kind,
        TokenKind::Comma | TokenKind::Semicolon | TokenKind::LeftBracket | TokenKind::LeftParen
    ) {
        return Some(name);
    }
    if matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::StaticCast
            | TokenKind::DynamicCast
            | TokenKind::ReinterpretCast
            | TokenKind::ConstCast
    ) || kind.is_literal()
        || kind.is_operator()
    {
        parser.rewind(start);
        return parse_name(parser, false);
    }
    Some(name)
}
