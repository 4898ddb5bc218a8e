//! Objective-C declarations, expressions and statements.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use thin_vec::{ThinVec, thin_vec};

use super::Parser;
use super::declarations::{parse_block_declaration, parse_declaration, parse_function_body, parse_simple_declaration};
use super::declarator::{parse_parameter_declaration, parse_type_id};
use super::expressions::{parse_assignment_expression, parse_expression, parse_unary_expression};
use super::statements::parse_statement;
use super::type_specifiers::parse_attribute_specifiers;

/// Identifiers valid as parameter type qualifiers and context keywords
const TYPE_QUALIFIERS: &[&str] = &["in", "out", "inout", "oneway", "bycopy", "byref"];

/// Selector pieces: identifiers and any keyword, including the alternative
/// operator spellings such as `and` or `not_eq`.
pub(crate) fn look_at_objc_selector(parser: &Parser) -> bool {
    let token = parser.tok();
    token.kind.is_identifier_like()
        || (token.kind.is_operator() && token.spell().chars().next().is_some_and(|c| c.is_ascii_alphabetic()))
}

fn parse_objc_selector(parser: &mut Parser) -> u32 {
    if look_at_objc_selector(parser) {
        parser.consume_token()
    } else {
        0
    }
}

fn simple_name_at(parser: &mut Parser, identifier: u32) -> NodeRef {
    parser.alloc(SimpleName {
        identifier,
        ..Default::default()
    })
}

/// `T_IDENTIFIER (, T_IDENTIFIER)*` as simple names
fn parse_identifier_list(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut identifiers = ThinVec::new();
    let identifier = parser.match_token(TokenKind::Identifier);
    identifiers.push(simple_name_at(parser, identifier));
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        let identifier = parser.match_token(TokenKind::Identifier);
        identifiers.push(simple_name_at(parser, identifier));
    }
    identifiers
}

// ---- declarations ----

/// `@class A, B;`
pub(crate) fn parse_objc_class_forward_declaration(parser: &mut Parser, attributes: ThinVec<NodeRef>) -> Option<NodeRef> {
    if parser.la() != TokenKind::AtClass {
        return None;
    }
    let class_kw = parser.consume_token();
    let identifiers = parse_identifier_list(parser);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(ObjCClassForwardDeclaration {
        attributes,
        class_kw,
        identifiers,
        semicolon,
        ..Default::default()
    }))
}

/// A class interface `@interface A : B <P> { ivars } ... @end` or a category
/// interface `@interface A (Cat) <P> ... @end`
pub(crate) fn parse_objc_interface(parser: &mut Parser, mut attributes: ThinVec<NodeRef>) -> Option<NodeRef> {
    if attributes.is_empty() && parser.la() == TokenKind::Attribute {
        attributes = parse_attribute_specifiers(parser);
    }
    if parser.la() != TokenKind::AtInterface {
        return None;
    }

    let interface_kw = parser.consume_token();
    let identifier = parser.match_token(TokenKind::Identifier);
    let class_name = simple_name_at(parser, identifier);
    let mut class = ObjCClassDeclaration {
        interface_kw,
        class_name: Some(class_name),
        ..Default::default()
    };

    if parser.la() == TokenKind::LeftParen {
        if let Some(&first) = attributes.first() {
            let first_token = parser.first_token(first);
            parser.error_at(first_token, ParseError::InvalidCategoryAttributes);
        }
        class.lparen = parser.consume_token();
        if parser.la() == TokenKind::Identifier {
            let category = parser.consume_token();
            class.category_name = Some(simple_name_at(parser, category));
        }
        class.rparen = parser.match_token(TokenKind::RightParen);
        class.protocol_refs = parse_objc_protocol_refs(parser);
    } else {
        if parser.la() == TokenKind::Colon {
            class.colon = parser.consume_token();
            let superclass = parser.match_token(TokenKind::Identifier);
            class.superclass = Some(simple_name_at(parser, superclass));
        }
        class.protocol_refs = parse_objc_protocol_refs(parser);
        class.inst_vars_decl = parse_objc_class_instance_variables(parser);
    }

    class.attributes = attributes;
    class.member_declarations = parse_objc_interface_member_declarations(parser);
    class.end_kw = parser.match_token(TokenKind::AtEnd);
    Some(parser.alloc(class))
}

/// `@protocol A, B;` or `@protocol P <Q> ... @end`
pub(crate) fn parse_objc_protocol(parser: &mut Parser, mut attributes: ThinVec<NodeRef>) -> Option<NodeRef> {
    if attributes.is_empty() && parser.la() == TokenKind::Attribute {
        attributes = parse_attribute_specifiers(parser);
    }
    if parser.la() != TokenKind::AtProtocol {
        return None;
    }

    let protocol_kw = parser.consume_token();
    if matches!(parser.la_n(2), TokenKind::Comma | TokenKind::Semicolon) {
        let identifiers = parse_identifier_list(parser);
        let semicolon = parser.match_token(TokenKind::Semicolon);
        return Some(parser.alloc(ObjCProtocolForwardDeclaration {
            attributes,
            protocol_kw,
            identifiers,
            semicolon,
            ..Default::default()
        }));
    }

    let identifier = parser.match_token(TokenKind::Identifier);
    let name = simple_name_at(parser, identifier);
    let protocol_refs = parse_objc_protocol_refs(parser);
    let member_declarations = parse_objc_interface_member_declarations(parser);
    let end_kw = parser.match_token(TokenKind::AtEnd);
    Some(parser.alloc(ObjCProtocolDeclaration {
        attributes,
        protocol_kw,
        name: Some(name),
        protocol_refs,
        member_declarations,
        end_kw,
        ..Default::default()
    }))
}

/// `@implementation A : B { ivars } methods @end` or
/// `@implementation A (Cat) methods @end`
pub(crate) fn parse_objc_implementation(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::AtImplementation {
        return None;
    }
    let implementation_kw = parser.consume_token();
    let identifier = parser.match_token(TokenKind::Identifier);
    let class_name = simple_name_at(parser, identifier);
    let mut class = ObjCClassDeclaration {
        implementation_kw,
        class_name: Some(class_name),
        ..Default::default()
    };

    if parser.la() == TokenKind::LeftParen {
        class.lparen = parser.consume_token();
        let category = parser.match_token(TokenKind::Identifier);
        class.category_name = Some(simple_name_at(parser, category));
        class.rparen = parser.match_token(TokenKind::RightParen);
    } else {
        if parser.la() == TokenKind::Colon {
            class.colon = parser.consume_token();
            let superclass = parser.match_token(TokenKind::Identifier);
            class.superclass = Some(simple_name_at(parser, superclass));
        }
        class.inst_vars_decl = parse_objc_class_instance_variables(parser);
    }

    class.member_declarations = parse_objc_method_definition_list(parser);
    class.end_kw = parser.match_token(TokenKind::AtEnd);
    Some(parser.alloc(class))
}

/// Members of an implementation up to `@end`
fn parse_objc_method_definition_list(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut declarations = ThinVec::new();
    while !parser.at_eof() && parser.la() != TokenKind::AtEnd {
        let start = parser.cursor();
        let declaration = match parser.la() {
            TokenKind::Plus | TokenKind::Minus => {
                let definition = parse_objc_method_definition(parser);
                if start == parser.cursor() {
                    parser.consume_token();
                }
                definition
            }
            TokenKind::Semicolon => {
                parser.consume_token();
                None
            }
            TokenKind::AtSynthesize => Some(parse_objc_synthesized_properties(parser)),
            TokenKind::AtDynamic => {
                let dynamic_kw = parser.consume_token();
                let property_identifiers = parse_identifier_list(parser);
                let semicolon = parser.match_token(TokenKind::Semicolon);
                Some(parser.alloc(ObjCDynamicPropertiesDeclaration {
                    dynamic_kw,
                    property_identifiers,
                    semicolon,
                }))
            }
            TokenKind::Extern if parser.la_n(2) == TokenKind::StringLiteral => parse_declaration(parser),
            _ => {
                let declaration = parse_block_declaration(parser);
                if declaration.is_none() {
                    parser.rewind(start);
                    parser.error(ParseError::SkipToken(parser.spell().to_string()));
                    parser.consume_token();
                }
                declaration
            }
        };
        declarations.extend(declaration);
    }
    declarations
}

/// `@synthesize a, b = _b;`
fn parse_objc_synthesized_properties(parser: &mut Parser) -> NodeRef {
    let synthesize_kw = parser.consume_token();
    let mut property_identifiers = ThinVec::new();
    loop {
        let mut property = ObjCSynthesizedProperty {
            property_identifier: parser.match_token(TokenKind::Identifier),
            ..Default::default()
        };
        if parser.la() == TokenKind::Equal {
            property.equal = parser.consume_token();
            property.alias_identifier = parser.match_token(TokenKind::Identifier);
        }
        property_identifiers.push(parser.alloc(property));
        if parser.la() != TokenKind::Comma {
            break;
        }
        parser.consume_token();
    }
    let semicolon = parser.match_token(TokenKind::Semicolon);
    parser.alloc(ObjCSynthesizedPropertiesDeclaration {
        synthesize_kw,
        property_identifiers,
        semicolon,
    })
}

/// A method prototype with a body. `- (void) f; { ... }` is accepted.
fn parse_objc_method_definition(parser: &mut Parser) -> Option<NodeRef> {
    let method_prototype = parse_objc_method_prototype(parser)?;
    let semicolon = if parser.la() == TokenKind::Semicolon {
        parser.consume_token()
    } else {
        0
    };
    let function_body = parse_function_body(parser);
    Some(parser.alloc(ObjCMethodDeclaration {
        method_prototype: Some(method_prototype),
        function_body,
        semicolon,
    }))
}

/// `< P, Q >`
fn parse_objc_protocol_refs(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Less {
        return None;
    }
    let less = parser.consume_token();
    let identifiers = parse_identifier_list(parser);
    let greater = parser.match_token(TokenKind::Greater);
    Some(parser.alloc(ObjCProtocolRefs {
        less,
        identifiers,
        greater,
    }))
}

/// `{ @private int x; ... }`
fn parse_objc_class_instance_variables(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftBrace {
        return None;
    }
    let lbrace = parser.consume_token();
    let mut instance_variables = ThinVec::new();
    while !parser.at_eof() && parser.la() != TokenKind::RightBrace {
        let start = parser.cursor();
        if let Some(declaration) = parse_objc_instance_variable_declaration(parser) {
            instance_variables.push(declaration);
        }
        if start == parser.cursor() {
            parser.error(ParseError::StrayToken(parser.spell().to_string()));
            parser.consume_token();
        }
    }
    let rbrace = parser.match_token(TokenKind::RightBrace);
    Some(parser.alloc(ObjCInstanceVariablesDeclaration {
        lbrace,
        instance_variables,
        rbrace,
    }))
}

fn parse_objc_instance_variable_declaration(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::AtPrivate | TokenKind::AtProtected | TokenKind::AtPublic | TokenKind::AtPackage => {
            let visibility = parser.consume_token();
            Some(parser.alloc(ObjCVisibilityDeclaration { visibility }))
        }
        _ => parse_simple_declaration(parser, true),
    }
}

/// Members of an interface or protocol up to `@end`. `@required`,
/// `@optional` and stray semicolons are consumed without a node.
fn parse_objc_interface_member_declarations(parser: &mut Parser) -> ThinVec<NodeRef> {
    let mut declarations = ThinVec::new();
    loop {
        match parser.la() {
            TokenKind::AtEnd | TokenKind::EndOfFile => break,
            TokenKind::AtRequired | TokenKind::AtOptional | TokenKind::Semicolon => {
                parser.consume_token();
            }
            TokenKind::AtProperty => match parse_objc_property_declaration(parser, ThinVec::new()) {
                Some(declaration) => declarations.push(declaration),
                None => break,
            },
            TokenKind::Plus | TokenKind::Minus => {
                let Some(method_prototype) = parse_objc_method_prototype(parser) else {
                    break;
                };
                let semicolon = parser.match_token(TokenKind::Semicolon);
                declarations.push(parser.alloc(ObjCMethodDeclaration {
                    method_prototype: Some(method_prototype),
                    function_body: None,
                    semicolon,
                }));
            }
            _ => match parse_simple_declaration(parser, true) {
                Some(declaration) => declarations.push(declaration),
                None => break,
            },
        }
    }
    declarations
}

/// `@property (attr, getter = g, setter = s:) simple-declaration`
pub(crate) fn parse_objc_property_declaration(parser: &mut Parser, attributes: ThinVec<NodeRef>) -> Option<NodeRef> {
    if parser.la() != TokenKind::AtProperty {
        return None;
    }
    let mut property = ObjCPropertyDeclaration {
        attributes,
        property_kw: parser.consume_token(),
        ..Default::default()
    };

    if parser.la() == TokenKind::LeftParen {
        property.lparen = parser.consume_token();
        if let Some(attribute) = parse_objc_property_attribute(parser) {
            property.property_attributes.push(attribute);
            while parser.la() == TokenKind::Comma {
                parser.consume_token();
                if let Some(attribute) = parse_objc_property_attribute(parser) {
                    property.property_attributes.push(attribute);
                }
            }
        }
        property.rparen = parser.match_token(TokenKind::RightParen);
    }

    property.simple_declaration = parse_simple_declaration(parser, true);
    Some(parser.alloc(property))
}

fn parse_objc_property_attribute(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Identifier {
        return None;
    }
    let mut attribute = ObjCPropertyAttribute {
        attribute_identifier: parser.consume_token(),
        ..Default::default()
    };
    if parser.la() == TokenKind::Equal {
        attribute.equal = parser.consume_token();
        let name_token = parser.match_token(TokenKind::Identifier);
        let selector = if parser.la() == TokenKind::Colon {
            let colon = parser.consume_token();
            let argument = parser.alloc(ObjCSelectorArgument { name_token, colon });
            parser.alloc(ObjCSelectorWithArguments {
                selector_arguments: thin_vec![argument],
                ..Default::default()
            })
        } else {
            parser.alloc(ObjCSelectorWithoutArguments {
                name_token,
                ..Default::default()
            })
        };
        attribute.method_selector = Some(selector);
    }
    Some(parser.alloc(attribute))
}

/// `-` or `+`, an optional return type, then a unary or keyword selector
pub(crate) fn parse_objc_method_prototype(parser: &mut Parser) -> Option<NodeRef> {
    if !matches!(parser.la(), TokenKind::Plus | TokenKind::Minus) {
        return None;
    }
    let mut prototype = ObjCMethodPrototype {
        method_type: parser.consume_token(),
        ..Default::default()
    };
    prototype.type_name = parse_objc_type_name(parser);

    if (look_at_objc_selector(parser) && parser.la_n(2) == TokenKind::Colon) || parser.la() == TokenKind::Colon {
        let mut selector_arguments = ThinVec::new();
        while let Some((argument, declaration)) = parse_objc_keyword_declaration(parser) {
            selector_arguments.push(argument);
            prototype.arguments.push(declaration);
        }
        prototype.selector = Some(parser.alloc(ObjCSelectorWithArguments {
            selector_arguments,
            ..Default::default()
        }));

        // C style variadic tail
        while parser.la() == TokenKind::Comma {
            parser.consume_token();
            if parser.la() == TokenKind::DotDotDot {
                prototype.dot_dot_dot = parser.consume_token();
                break;
            }
            parse_parameter_declaration(parser);
        }
    } else if look_at_objc_selector(parser) {
        let name_token = parser.consume_token();
        prototype.selector = Some(parser.alloc(ObjCSelectorWithoutArguments {
            name_token,
            ..Default::default()
        }));
    } else {
        parser.error(ParseError::ExpectedSelector);
    }

    prototype.attributes = parse_attribute_specifiers(parser);
    Some(parser.alloc(prototype))
}

/// `selector? : (type)? attributes? name`
fn parse_objc_keyword_declaration(parser: &mut Parser) -> Option<(NodeRef, NodeRef)> {
    if !(parser.la() == TokenKind::Colon || (look_at_objc_selector(parser) && parser.la_n(2) == TokenKind::Colon)) {
        return None;
    }
    let name_token = parse_objc_selector(parser);
    let colon = parser.match_token(TokenKind::Colon);
    let argument = parser.alloc(ObjCSelectorArgument { name_token, colon });

    let type_name = parse_objc_type_name(parser);
    let attributes = parse_attribute_specifiers(parser);
    let param_name = parser.match_token(TokenKind::Identifier);
    let declaration = parser.alloc(ObjCMessageArgumentDeclaration {
        type_name,
        attributes,
        param_name,
        ..Default::default()
    });
    Some((argument, declaration))
}

/// `( qualifier? type-id )`
fn parse_objc_type_name(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftParen {
        return None;
    }
    let lparen = parser.consume_token();
    let type_qualifier = if peek_at_type_qualifier(parser) {
        parser.consume_token()
    } else {
        0
    };
    let type_id = parse_type_id(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(ObjCTypeName {
        lparen,
        type_qualifier,
        type_id,
        rparen,
    }))
}

fn peek_at_type_qualifier(parser: &Parser) -> bool {
    parser.la() == TokenKind::Identifier && TYPE_QUALIFIERS.contains(&parser.tok().spell())
}

/// Whether the current token is the context keyword `keyword`, such as the
/// `in` of a fast enumeration.
pub(crate) fn peek_at_objc_context_keyword(parser: &Parser, keyword: &str) -> bool {
    peek_at_type_qualifier(parser) && parser.tok().spell() == keyword
}

pub(crate) fn parse_objc_context_keyword(parser: &mut Parser, keyword: &str) -> Option<u32> {
    peek_at_objc_context_keyword(parser, keyword).then(|| parser.consume_token())
}

// ---- expressions ----

/// `[`, `@"..."`, `@encode`, `@protocol` and `@selector` expressions
pub(crate) fn parse_objc_expression(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::AtEncode => {
            let encode_kw = parser.consume_token();
            let type_name = parse_objc_type_name(parser);
            Some(parser.alloc(ObjCEncodeExpression { encode_kw, type_name }))
        }
        TokenKind::AtProtocol => {
            let protocol_kw = parser.consume_token();
            let lparen = parser.match_token(TokenKind::LeftParen);
            let identifier = parser.match_token(TokenKind::Identifier);
            let rparen = parser.match_token(TokenKind::RightParen);
            Some(parser.alloc(ObjCProtocolExpression {
                protocol_kw,
                lparen,
                identifier,
                rparen,
            }))
        }
        TokenKind::AtSelector => parse_objc_selector_expression(parser),
        TokenKind::LeftBracket => parse_objc_message_expression(parser),
        TokenKind::AtStringLiteral => parse_objc_string_literal(parser),
        _ => None,
    }
}

/// A chain of adjacent `@"..."` literals
fn parse_objc_string_literal(parser: &mut Parser) -> Option<NodeRef> {
    let mut literals = Vec::new();
    while parser.la() == TokenKind::AtStringLiteral {
        literals.push(parser.consume_token());
    }
    literals
        .into_iter()
        .rev()
        .fold(None, |next, literal| Some(parser.alloc(StringLiteral { literal, next })))
}

/// `@selector(name)` or `@selector(a:b:)`
fn parse_objc_selector_expression(parser: &mut Parser) -> Option<NodeRef> {
    let selector_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let name_token = parser.match_token(TokenKind::Identifier);

    let selector = if parser.la() == TokenKind::Colon {
        let colon = parser.consume_token();
        let mut selector_arguments = ThinVec::new();
        selector_arguments.push(parser.alloc(ObjCSelectorArgument { name_token, colon }));
        while !parser.at_eof() && parser.la() != TokenKind::RightParen {
            let start = parser.cursor();
            let name_token = parser.match_token(TokenKind::Identifier);
            let colon = parser.match_token(TokenKind::Colon);
            selector_arguments.push(parser.alloc(ObjCSelectorArgument { name_token, colon }));
            if start == parser.cursor() {
                break;
            }
        }
        parser.alloc(ObjCSelectorWithArguments {
            selector_arguments,
            ..Default::default()
        })
    } else {
        parser.alloc(ObjCSelectorWithoutArguments {
            name_token,
            ..Default::default()
        })
    };

    let rparen = parser.match_token(TokenKind::RightParen);
    Some(parser.alloc(ObjCSelectorExpression {
        selector_kw,
        lparen,
        selector: Some(selector),
        rparen,
    }))
}

/// `[receiver selector]` or `[receiver key: arg key: arg, extra]`
fn parse_objc_message_expression(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftBracket {
        return None;
    }
    let lbracket = parser.consume_token();
    let receiver_expression = parse_expression(parser);
    let (selector, arguments) = parse_objc_message_arguments(parser);
    let rbracket = parser.match_token(TokenKind::RightBracket);
    Some(parser.alloc(ObjCMessageExpression {
        lbracket,
        receiver_expression,
        selector,
        arguments,
        rbracket,
    }))
}

fn parse_objc_message_arguments(parser: &mut Parser) -> (Option<NodeRef>, ThinVec<NodeRef>) {
    if parser.la() == TokenKind::RightBracket {
        return (None, ThinVec::new());
    }

    let start = parser.cursor();
    let mut selector_arguments = ThinVec::new();
    let mut arguments = ThinVec::new();
    let mut last_value = None;
    while let Some((selector_argument, value)) = parse_objc_selector_arg(parser) {
        selector_arguments.push(selector_argument);
        arguments.push(parser.alloc(ObjCMessageArgument {
            parameter_value_expression: value,
        }));
        last_value = value;
    }

    if selector_arguments.is_empty() {
        parser.rewind(start);
        let name_token = parse_objc_selector(parser);
        let selector = parser.alloc(ObjCSelectorWithoutArguments {
            name_token,
            ..Default::default()
        });
        return (Some(selector), arguments);
    }

    // variadic arguments fold into the last value
    if parser.la() == TokenKind::Comma {
        while parser.la() == TokenKind::Comma {
            let op = parser.consume_token();
            let right = parse_assignment_expression(parser);
            last_value = Some(parser.alloc(BinaryExpression {
                left: last_value,
                op,
                right,
            }));
        }
        if let Some(&last) = arguments.last()
            && let NodeKind::ObjCMessageArgument(argument) = parser.node_mut(last)
        {
            argument.parameter_value_expression = last_value;
        }
    }

    let selector = parser.alloc(ObjCSelectorWithArguments {
        selector_arguments,
        ..Default::default()
    });
    (Some(selector), arguments)
}

/// `selector : value`. A value read as a cast before another `:` is re-read
/// as a unary expression.
fn parse_objc_selector_arg(parser: &mut Parser) -> Option<(NodeRef, Option<NodeRef>)> {
    let start = parser.cursor();
    let name_token = parse_objc_selector(parser);
    if name_token == 0 || parser.la() != TokenKind::Colon {
        parser.rewind(start);
        return None;
    }
    let colon = parser.consume_token();
    let selector_argument = parser.alloc(ObjCSelectorArgument { name_token, colon });

    let expression_start = parser.cursor();
    let mut value = parse_assignment_expression(parser);
    if parser.la() == TokenKind::Colon
        && value.is_some_and(|value| matches!(parser.node(value), NodeKind::CastExpression(_)))
    {
        parser.rewind(expression_start);
        value = parse_unary_expression(parser);
    }
    Some((selector_argument, value))
}

// ---- statements ----

/// `@synchronized (object) statement`
pub(crate) fn parse_objc_synchronized_statement(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::AtSynchronized {
        return None;
    }
    let synchronized_kw = parser.consume_token();
    let lparen = parser.match_token(TokenKind::LeftParen);
    let synchronized_object = parse_expression(parser);
    let rparen = parser.match_token(TokenKind::RightParen);
    let statement = parse_statement(parser);
    Some(parser.alloc(ObjCSynchronizedStatement {
        synchronized_kw,
        lparen,
        synchronized_object,
        rparen,
        statement,
    }))
}
