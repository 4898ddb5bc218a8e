//! Expression parsing module
//!
//! This module handles all expression parsing logic. Binary operators from
//! pointer-to-member up to logical-or are parsed by precedence climbing over
//! [`BindingPower`]; assignment, conditional and comma expressions, and
//! everything below cast expressions, are separate productions.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use log::trace;
use thin_vec::ThinVec;

use super::Parser;
use super::declarator::{parse_declarator, parse_ptr_operator, parse_type_id};
use super::names::{parse_name, parse_name_id};
use super::objc::parse_objc_expression;
use super::statements::parse_compound_statement;
use super::type_specifiers::{look_at_builtin_type_specifier, parse_type_specifier};

/// Binding power of the binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingPower(u8);

impl BindingPower {
    pub const LOGICAL_OR: Self = Self(1);
    pub const LOGICAL_AND: Self = Self(2);
    pub const BITWISE_OR: Self = Self(3);
    pub const BITWISE_XOR: Self = Self(4);
    pub const BITWISE_AND: Self = Self(5);
    pub const EQUALITY: Self = Self(6);
    pub const RELATIONAL: Self = Self(7);
    pub const SHIFT: Self = Self(8);
    pub const ADDITIVE: Self = Self(9);
    pub const MULTIPLICATIVE: Self = Self(10);
    pub const POINTER_TO_MEMBER: Self = Self(11);

    fn tighter(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Binary operators are all left-associative. `>` is not an operator while
/// a template argument list is open.
fn binding_power(parser: &Parser) -> Option<BindingPower> {
    use TokenKind::*;
    match parser.la() {
        PipePipe => Some(BindingPower::LOGICAL_OR),
        AmperAmper => Some(BindingPower::LOGICAL_AND),
        Pipe => Some(BindingPower::BITWISE_OR),
        Caret => Some(BindingPower::BITWISE_XOR),
        Ampersand => Some(BindingPower::BITWISE_AND),
        EqualEqual | ExclaimEqual => Some(BindingPower::EQUALITY),
        Greater if parser.template_arguments => None,
        Less | Greater | LessEqual | GreaterEqual => Some(BindingPower::RELATIONAL),
        LessLess | GreaterGreater => Some(BindingPower::SHIFT),
        Plus | Minus => Some(BindingPower::ADDITIVE),
        Star | Slash | Percent => Some(BindingPower::MULTIPLICATIVE),
        ArrowStar | DotStar => Some(BindingPower::POINTER_TO_MEMBER),
        _ => None,
    }
}

/// Operators binding at least as tight as `min_binding_power` over cast
/// expression operands. A missing right operand fails the whole expression.
fn parse_binary_expression(parser: &mut Parser, min_binding_power: BindingPower) -> Option<NodeRef> {
    let mut left = parse_cast_expression(parser)?;
    while let Some(binding_power) = binding_power(parser) {
        if binding_power < min_binding_power {
            break;
        }
        let op = parser.consume_token();
        trace!("parse_binary_expression: `{}` at token {}", parser.token(op).spell(), op);
        let right = parse_binary_expression(parser, binding_power.tighter())?;
        left = parser.alloc(BinaryExpression {
            left: Some(left),
            op,
            right: Some(right),
        });
    }
    Some(left)
}

pub(crate) fn parse_logical_or_expression(parser: &mut Parser) -> Option<NodeRef> {
    parse_binary_expression(parser, BindingPower::LOGICAL_OR)
}

pub(crate) fn parse_conditional_expression(parser: &mut Parser) -> Option<NodeRef> {
    let condition = parse_logical_or_expression(parser)?;
    if parser.la() != TokenKind::Question {
        return Some(condition);
    }
    let question = parser.consume_token();
    let left = parse_assignment_expression(parser);
    let colon = parser.match_token(TokenKind::Colon);
    let right = parse_assignment_expression(parser);
    Some(parser.alloc(ConditionalExpression {
        condition: Some(condition),
        question,
        left,
        colon,
        right,
    }))
}

/// Right-associative assignment, or a `throw` expression
pub(crate) fn parse_assignment_expression(parser: &mut Parser) -> Option<NodeRef> {
    parser.nested(|parser| {
        if parser.la() == TokenKind::Throw {
            return parse_throw_expression(parser);
        }
        let left = parse_conditional_expression(parser)?;
        if !parser.la().is_assignment_operator() {
            return Some(left);
        }
        let op = parser.consume_token();
        let right = parse_assignment_expression(parser)?;
        Some(parser.alloc(BinaryExpression {
            left: Some(left),
            op,
            right: Some(right),
        }))
    })
}

pub(crate) fn parse_constant_expression(parser: &mut Parser) -> Option<NodeRef> {
    parse_conditional_expression(parser)
}

/// A comma expression
pub(crate) fn parse_expression(parser: &mut Parser) -> Option<NodeRef> {
    let mut left = parse_assignment_expression(parser)?;
    while parser.la() == TokenKind::Comma {
        let op = parser.consume_token();
        let right = parse_assignment_expression(parser)?;
        left = parser.alloc(BinaryExpression {
            left: Some(left),
            op,
            right: Some(right),
        });
    }
    Some(left)
}

fn parse_throw_expression(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Throw {
        return None;
    }
    let throw_kw = parser.consume_token();
    let expression = parse_assignment_expression(parser);
    Some(parser.alloc(ThrowExpression { throw_kw, expression }))
}

/// Comma separated assignment expressions. Returns false when the first one
/// is missing.
pub(crate) fn parse_expression_list(parser: &mut Parser, expressions: &mut ThinVec<NodeRef>) -> bool {
    let Some(first) = parse_assignment_expression(parser) else {
        return false;
    };
    expressions.push(first);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        if let Some(expression) = parse_assignment_expression(parser) {
            expressions.push(expression);
        }
    }
    true
}

/// `{ clauses }` or an assignment expression
pub(crate) fn parse_initializer_clause(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftBrace {
        return parse_assignment_expression(parser);
    }
    let lbrace = parser.consume_token();
    let mut expressions = ThinVec::new();
    if let Some(first) = parse_initializer_clause(parser) {
        expressions.push(first);
        while parser.la() == TokenKind::Comma {
            parser.consume_token();
            if let Some(clause) = parse_initializer_clause(parser) {
                expressions.push(clause);
            }
        }
    }
    let rbrace = parser.match_token(TokenKind::RightBrace);
    Some(parser.alloc(ArrayInitializer {
        lbrace,
        expressions,
        rbrace,
    }))
}

// ---- cast and unary ----

/// `(type-id) cast-expression`, otherwise a unary expression
pub(crate) fn parse_cast_expression(parser: &mut Parser) -> Option<NodeRef> {
    parser.nested(|parser| {
        if parser.la() == TokenKind::LeftParen
            && let Some((lparen, type_id, rparen)) = parser.tentative(parse_parenthesized_type_id)
        {
            if let Some(expression) = parse_cast_expression(parser) {
                return Some(parser.alloc(CastExpression {
                    lparen,
                    type_id: Some(type_id),
                    rparen,
                    expression: Some(expression),
                }));
            }
            parser.rewind(lparen);
        }
        parse_unary_expression(parser)
    })
}

/// `( type-id )`
fn parse_parenthesized_type_id(parser: &mut Parser) -> Option<(u32, NodeRef, u32)> {
    let lparen = parser.match_token(TokenKind::LeftParen);
    if lparen == 0 {
        return None;
    }
    let type_id = parse_type_id(parser)?;
    if parser.la() != TokenKind::RightParen {
        return None;
    }
    Some((lparen, type_id, parser.consume_token()))
}

pub(crate) fn parse_unary_expression(parser: &mut Parser) -> Option<NodeRef> {
    use TokenKind::*;
    match parser.la() {
        PlusPlus | MinusMinus | Star | Ampersand | Plus | Minus | Exclaim => return parse_prefix_operator(parser),
        // `~X(` is left to the postfix expression as a destructor name
        Tilde if !(parser.la_n(2) == Identifier && parser.la_n(3) == LeftParen) => {
            return parse_prefix_operator(parser);
        }
        Sizeof => return parse_sizeof_expression(parser),
        _ => {}
    }

    let scoped = parser.la() == ColonColon;
    let keyword = if scoped { parser.la_n(2) } else { parser.la() };
    match keyword {
        New => parse_new_expression(parser),
        Delete => parse_delete_expression(parser),
        _ => parse_postfix_expression(parser),
    }
}

fn parse_prefix_operator(parser: &mut Parser) -> Option<NodeRef> {
    let op = parser.consume_token();
    let expression = parse_cast_expression(parser);
    Some(parser.alloc(UnaryExpression { op, expression }))
}

/// `sizeof (type-id)` or `sizeof unary-expression`
fn parse_sizeof_expression(parser: &mut Parser) -> Option<NodeRef> {
    let sizeof_kw = parser.consume_token();
    if parser.la() == TokenKind::LeftParen
        && let Some((lparen, type_id, rparen)) = parser.tentative(parse_parenthesized_type_id)
    {
        return Some(parser.alloc(SizeofExpression {
            sizeof_kw,
            lparen,
            expression: Some(type_id),
            rparen,
        }));
    }
    let expression = parse_unary_expression(parser);
    Some(parser.alloc(SizeofExpression {
        sizeof_kw,
        expression,
        ..Default::default()
    }))
}

// ---- new and delete ----

fn parse_new_placement(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();
    let mut expressions = ThinVec::new();
    if !parse_expression_list(parser, &mut expressions) || parser.la() != TokenKind::RightParen {
        return None;
    }
    let rparen = parser.consume_token();
    Some(parser.alloc(NewPlacement {
        lparen,
        expressions,
        rparen,
    }))
}

/// `::? new placement? new-type-id initializer?` or
/// `::? new placement? (type-id) initializer?`
fn parse_new_expression(parser: &mut Parser) -> Option<NodeRef> {
    let mut expression = NewExpression::default();
    if parser.la() == TokenKind::ColonColon {
        expression.scope = parser.consume_token();
    }
    if parser.la() != TokenKind::New {
        return None;
    }
    expression.new_kw = parser.consume_token();

    if let Some(new_placement) = parser.tentative(parse_new_placement) {
        let after_new_placement = parser.cursor();
        if let Some(new_type_id) = parse_new_type_id(parser) {
            expression.new_placement = Some(new_placement);
            expression.new_type_id = Some(new_type_id);
            expression.new_initializer = parse_new_initializer(parser);
            return Some(parser.alloc(expression));
        }
        parser.rewind(after_new_placement);
        if parse_new_type_id_in_parens(parser, &mut expression) {
            expression.new_placement = Some(new_placement);
            expression.new_initializer = parse_new_initializer(parser);
            return Some(parser.alloc(expression));
        }
    }

    parser.rewind(expression.new_kw + 1);
    if !parse_new_type_id_in_parens(parser, &mut expression) {
        expression.new_type_id = parse_new_type_id(parser);
    }
    expression.new_initializer = parse_new_initializer(parser);
    Some(parser.alloc(expression))
}

/// `( type-id )` of a new expression
fn parse_new_type_id_in_parens(parser: &mut Parser, expression: &mut NewExpression) -> bool {
    if parser.la() != TokenKind::LeftParen {
        return false;
    }
    match parser.tentative(parse_parenthesized_type_id) {
        Some((lparen, type_id, rparen)) => {
            expression.lparen = lparen;
            expression.type_id = Some(type_id);
            expression.rparen = rparen;
            true
        }
        None => false,
    }
}

fn parse_new_type_id(parser: &mut Parser) -> Option<NodeRef> {
    let type_specifiers = parse_type_specifier(parser)?;
    let mut ptr_operators = ThinVec::new();
    while let Some(ptr_operator) = parse_ptr_operator(parser) {
        ptr_operators.push(ptr_operator);
    }
    let mut new_array_declarators = ThinVec::new();
    while parser.la() == TokenKind::LeftBracket {
        let lbracket = parser.consume_token();
        let expression = parse_expression(parser);
        let rbracket = parser.match_token(TokenKind::RightBracket);
        new_array_declarators.push(parser.alloc(NewArrayDeclarator {
            lbracket,
            expression,
            rbracket,
        }));
    }
    Some(parser.alloc(NewTypeId {
        type_specifiers,
        ptr_operators,
        new_array_declarators,
    }))
}

fn parse_new_initializer(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let start = parser.cursor();
    let lparen = parser.consume_token();
    let expression = if parser.la() == TokenKind::RightParen {
        None
    } else {
        let Some(expression) = parse_expression(parser) else {
            parser.rewind(start);
            return None;
        };
        Some(expression)
    };
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(NewInitializer {
        lparen,
        expression,
        rparen,
    }))
}

fn parse_delete_expression(parser: &mut Parser) -> Option<NodeRef> {
    let mut expression = DeleteExpression::default();
    if parser.la() == TokenKind::ColonColon {
        expression.scope = parser.consume_token();
    }
    if parser.la() != TokenKind::Delete {
        return None;
    }
    expression.delete_kw = parser.consume_token();
    if parser.la() == TokenKind::LeftBracket {
        expression.lbracket = parser.consume_token();
        expression.rbracket = parser.match_token(TokenKind::RightBracket);
    }
    expression.expression = parse_cast_expression(parser);
    Some(parser.alloc(expression))
}

// ---- postfix ----

/// A core postfix expression followed by calls, subscripts, `++`/`--` and
/// member accesses
pub(crate) fn parse_postfix_expression(parser: &mut Parser) -> Option<NodeRef> {
    let base_expression = parse_core_postfix_expression(parser)?;
    let mut postfix_expressions = ThinVec::new();
    loop {
        let postfix = match parser.la() {
            TokenKind::LeftParen => {
                let lparen = parser.consume_token();
                let mut expressions = ThinVec::new();
                parse_expression_list(parser, &mut expressions);
                let rparen = parser.match_token(TokenKind::RightParen);
                parser.alloc(Call {
                    lparen,
                    expressions,
                    rparen,
                })
            }
            TokenKind::LeftBracket => {
                let lbracket = parser.consume_token();
                let expression = parse_expression(parser);
                let rbracket = parser.match_token(TokenKind::RightBracket);
                parser.alloc(ArrayAccess {
                    lbracket,
                    expression,
                    rbracket,
                })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let incr_decr = parser.consume_token();
                parser.alloc(PostIncrDecr { incr_decr })
            }
            TokenKind::Dot | TokenKind::Arrow => {
                let access = parser.consume_token();
                let template_kw = if parser.la() == TokenKind::Template {
                    parser.consume_token()
                } else {
                    0
                };
                let member_name = parse_name_id(parser);
                if member_name.is_none() {
                    parser.error(ParseError::ExpectedUnqualifiedId(parser.spell().to_string()));
                }
                parser.alloc(MemberAccess {
                    access,
                    template_kw,
                    member_name,
                })
            }
            _ => break,
        };
        postfix_expressions.push(postfix);
    }

    if postfix_expressions.is_empty() {
        return Some(base_expression);
    }
    Some(parser.alloc(PostfixExpression {
        base_expression: Some(base_expression),
        postfix_expressions,
    }))
}

/// C++ casts, `typename` calls, `typeid`, type constructor calls,
/// compound literals and primary expressions
fn parse_core_postfix_expression(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::DynamicCast | TokenKind::StaticCast | TokenKind::ReinterpretCast | TokenKind::ConstCast => {
            return parse_cpp_cast_expression(parser);
        }
        TokenKind::Typename => {
            let start = parser.cursor();
            if let Some(call) = parse_typename_call_expression(parser) {
                return Some(call);
            }
            parser.rewind(start);
        }
        TokenKind::Typeid => return parse_typeid_expression(parser),
        _ => {}
    }

    if look_at_builtin_type_specifier(parser)
        && let Some(call) = parser.tentative(parse_type_constructor_call)
    {
        return Some(call);
    }

    if parser.la() == TokenKind::LeftParen
        && let Some(literal) = parser.tentative(parse_compound_literal_head)
    {
        let (lparen, type_id, rparen) = literal;
        let initializer = parse_initializer_clause(parser);
        return Some(parser.alloc(CompoundLiteral {
            lparen,
            type_id: Some(type_id),
            rparen,
            initializer,
        }));
    }

    parse_primary_expression(parser)
}

/// `int(1)`, `unsigned long(x)`
fn parse_type_constructor_call(parser: &mut Parser) -> Option<NodeRef> {
    let type_specifiers = parse_type_specifier(parser)?;
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();
    let mut expressions = ThinVec::new();
    parse_expression_list(parser, &mut expressions);
    if parser.la() != TokenKind::RightParen {
        return None;
    }
    let rparen = parser.consume_token();
    Some(parser.alloc(TypeConstructorCall {
        type_specifiers,
        lparen,
        expressions,
        rparen,
    }))
}

/// `(type-id)` directly followed by `{`
fn parse_compound_literal_head(parser: &mut Parser) -> Option<(u32, NodeRef, u32)> {
    let head = parse_parenthesized_type_id(parser)?;
    (parser.la() == TokenKind::LeftBrace).then_some(head)
}

fn parse_cpp_cast_expression(parser: &mut Parser) -> Option<NodeRef> {
    let cast_kw = parser.consume_token();
    let less = parser.match_token(TokenKind::Less);
    let previous = parser.switch_template_arguments(true);
    let type_id = parse_type_id(parser);
    parser.switch_template_arguments(previous);
    let greater = parser.match_token(TokenKind::Greater);
    let lparen = parser.match_token(TokenKind::LeftParen);
    let expression = parse_expression(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(CppCastExpression {
        cast_kw,
        less,
        type_id,
        greater,
        lparen,
        expression,
        rparen,
    }))
}

/// `typename T::U(args)`
fn parse_typename_call_expression(parser: &mut Parser) -> Option<NodeRef> {
    let typename_kw = parser.consume_token();
    let name = parse_name(parser, true)?;
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();
    let mut expressions = ThinVec::new();
    parse_expression_list(parser, &mut expressions);
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(TypenameCallExpression {
        typename_kw,
        name: Some(name),
        lparen,
        expressions,
        rparen,
    }))
}

/// `typeid (type-id)` or `typeid (expression)`
fn parse_typeid_expression(parser: &mut Parser) -> Option<NodeRef> {
    let typeid_kw = parser.consume_token();
    let lparen = if parser.la() == TokenKind::LeftParen {
        parser.consume_token()
    } else {
        0
    };
    let expression = parser
        .tentative(|parser| {
            let type_id = parse_type_id(parser)?;
            (parser.la() == TokenKind::RightParen).then_some(type_id)
        })
        .or_else(|| parse_expression(parser));
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(TypeidExpression {
        typeid_kw,
        lparen,
        expression,
        rparen,
    }))
}

// ---- primary ----

pub(crate) fn parse_primary_expression(parser: &mut Parser) -> Option<NodeRef> {
    use TokenKind::*;
    match parser.la() {
        StringLiteral | WideStringLiteral => parse_string_literal(parser),
        CharLiteral | WideCharLiteral | NumericLiteral => {
            let literal = parser.consume_token();
            Some(parser.alloc(crate::ast::NumericLiteral { literal }))
        }
        True | False => {
            let literal = parser.consume_token();
            Some(parser.alloc(BoolLiteral { literal }))
        }
        This => {
            let this_kw = parser.consume_token();
            Some(parser.alloc(ThisExpression { this_kw }))
        }
        LeftParen => parse_nested_expression(parser),
        Signal | Slot => parse_qt_method(parser),
        LeftBracket | AtStringLiteral | AtEncode | AtProtocol | AtSelector => parse_objc_expression(parser),
        _ => parse_name_id(parser),
    }
}

/// Adjacent string literals, linked front to back through `next`
fn parse_string_literal(parser: &mut Parser) -> Option<NodeRef> {
    let mut literals = Vec::new();
    while matches!(parser.la(), TokenKind::StringLiteral | TokenKind::WideStringLiteral) {
        literals.push(parser.consume_token());
    }
    literals
        .into_iter()
        .rev()
        .fold(None, |next, literal| Some(parser.alloc(StringLiteral { literal, next })))
}

/// `( expression )`, or the GNU statement expression `({ ... })`
fn parse_nested_expression(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();

    if parser.la() == TokenKind::LeftBrace {
        let expression = parse_compound_statement(parser);
        let rparen = parser.match_token(TokenKind::RightParen);
        return Some(parser.alloc(NestedExpression {
            lparen,
            expression,
            rparen,
        }));
    }

    let previous = parser.switch_template_arguments(false);
    let nested = match parse_expression(parser) {
        Some(expression) if parser.la() == TokenKind::RightParen => {
            let rparen = parser.consume_token();
            Some(parser.alloc(NestedExpression {
                lparen,
                expression: Some(expression),
                rparen,
            }))
        }
        _ => None,
    };
    parser.switch_template_arguments(previous);
    nested
}

/// Qt `SIGNAL(signature)` / `SLOT(signature)`
fn parse_qt_method(parser: &mut Parser) -> Option<NodeRef> {
    let method = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let declarator = parse_declarator(parser, false);
    if declarator.is_none() {
        parser.error(ParseError::ExpectedFunctionDeclarator(parser.spell().to_string()));
    }
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(QtMethod {
        method,
        lparen,
        declarator,
        rparen,
    }))
}
