//! Declaration parsing module
//!
//! This module handles the declaration level of the grammar: the translation
//! unit, namespaces and linkage specifications, using declarations and
//! directives, `asm` definitions, templates, and simple declarations with
//! function definitions.

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;
use log::debug;
use thin_vec::ThinVec;

use super::Parser;
use super::declarator::{parse_init_declarator, parse_parameter_declaration, parse_type_id};
use super::enum_parsing::parse_enum_specifier;
use super::expressions::parse_expression;
use super::names::parse_name;
use super::objc::{
    parse_objc_class_forward_declaration, parse_objc_implementation, parse_objc_interface,
    parse_objc_property_declaration, parse_objc_protocol,
};
use super::statements::{parse_compound_statement, parse_try_block_statement};
use super::struct_parsing::{parse_class_specifier, parse_ctor_initializer};
use super::type_specifiers::{
    look_at_builtin_type_specifier, parse_attribute_specifier, parse_attribute_specifiers,
    parse_builtin_type_specifier, parse_elaborated_type_specifier,
};

/// Parse declarations until end of file, skipping to the next plausible
/// declaration start after each failure.
pub(crate) fn parse_translation_unit(parser: &mut Parser) -> NodeRef {
    let mut declarations = ThinVec::new();
    while !parser.at_eof() {
        let start_declaration = parser.cursor();
        match parse_declaration(parser) {
            Some(declaration) => declarations.push(declaration),
            None => {
                debug!("parse_translation_unit: recovering at token {}", start_declaration);
                parser.rewind(start_declaration + 1);
                parser.skip_until_declaration();
            }
        }
    }
    debug!("parse_translation_unit: {} declarations", declarations.len());
    parser.alloc(TranslationUnitDecl { declarations })
}

pub(crate) fn parse_empty_declaration(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Semicolon {
        return None;
    }
    let semicolon = parser.consume_token();
    Some(parser.alloc(EmptyDeclaration { semicolon }))
}

/// Parse one declaration
pub(crate) fn parse_declaration(parser: &mut Parser) -> Option<NodeRef> {
    parser.nested(|parser| match parser.la() {
        TokenKind::Semicolon => parse_empty_declaration(parser),
        TokenKind::Namespace => parse_namespace(parser),
        TokenKind::Using => parse_using(parser),
        TokenKind::Asm => parse_asm_definition(parser),
        TokenKind::Template | TokenKind::Export => parse_template_declaration(parser),

        TokenKind::AtClass => parse_objc_class_forward_declaration(parser, ThinVec::new()),
        TokenKind::AtInterface => parse_objc_interface(parser, ThinVec::new()),
        TokenKind::AtProtocol => parse_objc_protocol(parser, ThinVec::new()),
        TokenKind::AtImplementation => parse_objc_implementation(parser),
        TokenKind::AtEnd => {
            parser.error(ParseError::StrayToken(parser.spell().to_string()));
            parser.consume_token();
            None
        }

        _ => {
            if parser.features.objc() && parser.la() == TokenKind::Attribute {
                let start = parser.cursor();
                let attributes = parse_attribute_specifiers(parser);
                match parser.la() {
                    TokenKind::AtInterface => return parse_objc_interface(parser, attributes),
                    TokenKind::AtProtocol => return parse_objc_protocol(parser, attributes),
                    TokenKind::AtProperty => return parse_objc_property_declaration(parser, attributes),
                    _ => parser.rewind(start),
                }
            }

            if parser.la() == TokenKind::Extern && parser.la_n(2) == TokenKind::Template {
                parse_template_declaration(parser)
            } else if parser.la() == TokenKind::Extern && parser.la_n(2) == TokenKind::StringLiteral {
                parse_linkage_specification(parser)
            } else {
                parse_simple_declaration(parser, false)
            }
        }
    })
}

/// `extern "C" declaration` or `extern "C" { ... }`
fn parse_linkage_specification(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Extern || parser.la_n(2) != TokenKind::StringLiteral {
        return None;
    }
    let extern_kw = parser.consume_token();
    let extern_type = parser.consume_token();
    let declaration = if parser.la() == TokenKind::LeftBrace {
        parse_linkage_body(parser)
    } else {
        parse_declaration(parser)
    };
    Some(parser.alloc(LinkageSpecification {
        extern_kw,
        extern_type,
        declaration,
    }))
}

/// `{ declarations }` of a namespace or linkage specification
fn parse_linkage_body(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::LeftBrace {
        return None;
    }
    let lbrace = parser.consume_token();
    let mut declarations = ThinVec::new();
    while !parser.at_eof() && parser.la() != TokenKind::RightBrace {
        let start_declaration = parser.cursor();
        match parse_declaration(parser) {
            Some(declaration) => declarations.push(declaration),
            None => {
                parser.rewind(start_declaration + 1);
                parser.skip_until_declaration();
            }
        }
    }
    let rbrace = parser.match_token(TokenKind::RightBrace);
    Some(parser.alloc(LinkageBody {
        lbrace,
        declarations,
        rbrace,
    }))
}

/// A namespace definition, or an alias when `namespace N = ...` follows
fn parse_namespace(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Namespace {
        return None;
    }
    if parser.la_n(2) == TokenKind::Identifier && parser.la_n(3) == TokenKind::Equal {
        return parse_namespace_alias_definition(parser);
    }

    let namespace_kw = parser.consume_token();
    let identifier = if parser.la() == TokenKind::Identifier {
        parser.consume_token()
    } else {
        0
    };
    let attributes = parse_attribute_specifiers(parser);
    let linkage_body = parse_linkage_body(parser);
    Some(parser.alloc(Namespace {
        namespace_kw,
        identifier,
        attributes,
        linkage_body,
        ..Default::default()
    }))
}

fn parse_namespace_alias_definition(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Namespace
        || parser.la_n(2) != TokenKind::Identifier
        || parser.la_n(3) != TokenKind::Equal
    {
        return None;
    }
    let namespace_kw = parser.consume_token();
    let namespace_name = parser.consume_token();
    let equal = parser.consume_token();
    let name = parse_name(parser, true);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(NamespaceAliasDefinition {
        namespace_kw,
        namespace_name,
        equal,
        name,
        semicolon,
    }))
}

/// `using [typename] name;` or a using directive
pub(crate) fn parse_using(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Using {
        return None;
    }
    if parser.la_n(2) == TokenKind::Namespace {
        return parse_using_directive(parser);
    }

    let using_kw = parser.consume_token();
    let typename_kw = if parser.la() == TokenKind::Typename {
        parser.consume_token()
    } else {
        0
    };
    let name = parse_name(parser, true);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(UsingDeclaration {
        using_kw,
        typename_kw,
        name,
        semicolon,
        ..Default::default()
    }))
}

fn parse_using_directive(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Using || parser.la_n(2) != TokenKind::Namespace {
        return None;
    }
    let using_kw = parser.consume_token();
    let namespace_kw = parser.consume_token();
    let name = parse_name(parser, true);
    if name.is_none() {
        parser.warning_at(parser.cursor(), ParseError::ExpectedNamespaceName(parser.spell().to_string()));
    }
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(UsingDirective {
        using_kw,
        namespace_kw,
        name,
        semicolon,
        ..Default::default()
    }))
}

/// `asm volatile? ( "text" : outputs : inputs : clobbers );`
///
/// Only the keyword and punctuation are kept.
fn parse_asm_definition(parser: &mut Parser) -> Option<NodeRef> {
    if parser.la() != TokenKind::Asm {
        return None;
    }
    let asm_kw = parser.consume_token();
    let volatile_kw = if parser.la() == TokenKind::Volatile {
        parser.consume_token()
    } else {
        0
    };
    let lparen = parser.match_token(TokenKind::LeftParen);
    parser.match_token(TokenKind::StringLiteral);
    while parser.la() == TokenKind::StringLiteral {
        parser.consume_token();
    }

    match parser.la() {
        TokenKind::Colon => {
            parser.consume_token();
            parse_asm_operand_list(parser);
            match parser.la() {
                TokenKind::Colon => {
                    parser.consume_token();
                    parse_asm_operand_list(parser);
                    if parser.la() == TokenKind::Colon {
                        parser.consume_token();
                        parse_asm_clobber_list(parser);
                    }
                }
                TokenKind::ColonColon => {
                    parser.consume_token();
                    parse_asm_clobber_list(parser);
                }
                _ => {}
            }
        }
        TokenKind::ColonColon => {
            parser.consume_token();
            parse_asm_clobber_list(parser);
        }
        _ => {}
    }

    let rparen = parser.match_token(TokenKind::RightParen);
    let semicolon = parser.match_token(TokenKind::Semicolon);
    Some(parser.alloc(AsmDefinition {
        asm_kw,
        volatile_kw,
        lparen,
        rparen,
        semicolon,
    }))
}

fn parse_asm_operand_list(parser: &mut Parser) {
    if parser.la() != TokenKind::StringLiteral {
        return;
    }
    parse_asm_operand(parser);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        parse_asm_operand(parser);
    }
}

/// `"constraint" [ "name" ]? ( expression )`
fn parse_asm_operand(parser: &mut Parser) {
    parser.match_token(TokenKind::StringLiteral);
    if parser.la() == TokenKind::LeftBracket {
        parser.consume_token();
        parser.match_token(TokenKind::StringLiteral);
        parser.match_token(TokenKind::RightBracket);
    }
    parser.match_token(TokenKind::LeftParen);
    parse_expression(parser);
    parser.match_token(TokenKind::RightParen);
}

fn parse_asm_clobber_list(parser: &mut Parser) {
    if parser.la() != TokenKind::StringLiteral {
        return;
    }
    parser.consume_token();
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        parser.match_token(TokenKind::StringLiteral);
    }
}

/// `template <params> declaration`, also with a leading `export` or
/// `extern`
pub(crate) fn parse_template_declaration(parser: &mut Parser) -> Option<NodeRef> {
    let introduces_template = parser.la() == TokenKind::Template
        || (matches!(parser.la(), TokenKind::Export | TokenKind::Extern) && parser.la_n(2) == TokenKind::Template);
    if !introduces_template {
        return None;
    }

    let mut template = TemplateDeclaration::default();
    if matches!(parser.la(), TokenKind::Export | TokenKind::Extern) {
        template.export_kw = parser.consume_token();
    }
    template.template_kw = parser.consume_token();

    if parser.la() == TokenKind::Less {
        template.less = parser.consume_token();
        if parser.la() == TokenKind::Greater
            || parse_template_parameter_list(parser, &mut template.template_parameters)
        {
            template.greater = parser.match_token(TokenKind::Greater);
        }
    }

    template.declaration = parse_declaration(parser);
    Some(parser.alloc(template))
}

fn parse_template_parameter_list(parser: &mut Parser, parameters: &mut ThinVec<NodeRef>) -> bool {
    let Some(parameter) = parse_template_parameter(parser) else {
        return false;
    };
    parameters.push(parameter);
    while parser.la() == TokenKind::Comma {
        parser.consume_token();
        if let Some(parameter) = parse_template_parameter(parser) {
            parameters.push(parameter);
        }
    }
    true
}

/// A type parameter, or a non-type parameter read with `>` closing the list
fn parse_template_parameter(parser: &mut Parser) -> Option<NodeRef> {
    if let Some(parameter) = parse_type_parameter(parser) {
        return Some(parameter);
    }
    let previous = parser.switch_template_arguments(true);
    let parameter = parse_parameter_declaration(parser);
    parser.switch_template_arguments(previous);
    parameter
}

fn parse_type_parameter(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Class | TokenKind::Typename => parse_typename_type_parameter(parser),
        TokenKind::Template => parse_template_type_parameter(parser),
        _ => None,
    }
}

/// `class T`, `typename T = int`
fn parse_typename_type_parameter(parser: &mut Parser) -> Option<NodeRef> {
    let mut parameter = TypenameTypeParameter {
        classkey: parser.consume_token(),
        ..Default::default()
    };
    parameter.name = parse_name(parser, true);
    if parser.la() == TokenKind::Equal {
        parameter.equal = parser.consume_token();
        parameter.type_id = parse_type_id(parser);
    }
    Some(parser.alloc(parameter))
}

/// `template <params> class T = Default`
fn parse_template_type_parameter(parser: &mut Parser) -> Option<NodeRef> {
    let mut parameter = TemplateTypeParameter {
        template_kw: parser.consume_token(),
        ..Default::default()
    };
    if parser.la() == TokenKind::Less {
        parameter.less = parser.consume_token();
    }
    parse_template_parameter_list(parser, &mut parameter.template_parameters);
    if parser.la() == TokenKind::Greater {
        parameter.greater = parser.consume_token();
    }
    if parser.la() == TokenKind::Class {
        parameter.class_kw = parser.consume_token();
    }
    parameter.name = parse_name(parser, true);
    if parser.la() == TokenKind::Equal {
        parameter.equal = parser.consume_token();
        parameter.type_id = parse_type_id(parser);
    }
    Some(parser.alloc(parameter))
}

/// Declarations allowed at block scope
pub(crate) fn parse_block_declaration(parser: &mut Parser) -> Option<NodeRef> {
    match parser.la() {
        TokenKind::Using => parse_using(parser),
        TokenKind::Asm => parse_asm_definition(parser),
        TokenKind::Namespace => parse_namespace_alias_definition(parser),
        _ => parse_simple_declaration(parser, false),
    }
}

/// Parse a simple declaration or a function definition.
///
/// `accept_struct_declarator` enables member context: Qt invokable markers,
/// bit-fields and member function bodies.
pub(crate) fn parse_simple_declaration(parser: &mut Parser, accept_struct_declarator: bool) -> Option<NodeRef> {
    let qt_invokable = if accept_struct_declarator && matches!(parser.la(), TokenKind::QSignal | TokenKind::QSlot) {
        parser.consume_token()
    } else {
        0
    };

    let mut decl_specifiers = ThinVec::new();
    let mut has_type_specifier = false;
    let mut has_complex_type_specifier = false;
    // index of the named type specifier and the token it starts at
    let mut named_type_specifier: Option<(usize, u32)> = None;

    loop {
        let kind = parser.la();
        if kind.is_cv_qualifier() || kind.is_function_specifier() || kind.is_storage_class_specifier() {
            let specifier = parser.consume_token();
            decl_specifiers.push(parser.alloc(SimpleSpecifier { specifier }));
        } else if kind == TokenKind::Attribute {
            if let Some(attribute) = parse_attribute_specifier(parser) {
                decl_specifiers.push(attribute);
            }
        } else if named_type_specifier.is_none() && !has_complex_type_specifier && look_at_builtin_type_specifier(parser)
        {
            if let Some(specifier) = parse_builtin_type_specifier(parser) {
                decl_specifiers.push(specifier);
            }
            has_type_specifier = true;
        } else if !has_type_specifier && matches!(kind, TokenKind::ColonColon | TokenKind::Identifier) {
            let start = parser.cursor();
            let Some(name) = parse_name(parser, true) else {
                parser.rewind(start);
                break;
            };
            named_type_specifier = Some((decl_specifiers.len(), start));
            decl_specifiers.push(parser.alloc(NamedTypeSpecifier { name: Some(name) }));
            has_type_specifier = true;
        } else if !has_type_specifier && kind == TokenKind::Enum {
            let start = parser.cursor();
            let elaborated = parse_elaborated_type_specifier(parser);
            match elaborated {
                Some(specifier) if parser.la() != TokenKind::LeftBrace => decl_specifiers.push(specifier),
                _ => {
                    parser.rewind(start);
                    let Some(specifier) = parse_enum_specifier(parser) else {
                        parser.error_at(start, ParseError::ExpectedEnumSpecifier);
                        break;
                    };
                    decl_specifiers.push(specifier);
                    has_complex_type_specifier = true;
                }
            }
            has_type_specifier = true;
        } else if !has_type_specifier && kind == TokenKind::Typename {
            let start = parser.cursor();
            let Some(specifier) = parse_elaborated_type_specifier(parser) else {
                parser.error_at(start, ParseError::ExpectedElaboratedTypeSpecifier);
                break;
            };
            decl_specifiers.push(specifier);
            has_type_specifier = true;
        } else if !has_type_specifier && kind.is_class_key() {
            let start = parser.cursor();
            let elaborated = parse_elaborated_type_specifier(parser);
            // `class EXPORT_MACRO Name {` reads as elaborated up to the macro
            let class_head_follows = matches!(parser.la(), TokenKind::Colon | TokenKind::LeftBrace)
                || (parser.la_n(0) == TokenKind::Identifier
                    && parser.la() == TokenKind::Identifier
                    && matches!(parser.la_n(2), TokenKind::Colon | TokenKind::LeftBrace));
            match elaborated {
                Some(specifier) if !class_head_follows => decl_specifiers.push(specifier),
                _ => {
                    parser.rewind(start);
                    let Some(specifier) = parse_class_specifier(parser) else {
                        parser.error_at(start, ParseError::WrongTypeSpecifier);
                        break;
                    };
                    decl_specifiers.push(specifier);
                    has_complex_type_specifier = true;
                }
            }
            has_type_specifier = true;
        } else {
            break;
        }
    }

    let mut declarators = ThinVec::new();
    let mut first_declarator = None;
    if parser.la() != TokenKind::Semicolon {
        let maybe_ctor = parser.la() == TokenKind::LeftParen && named_type_specifier.is_some();
        match parse_init_declarator(parser, accept_struct_declarator) {
            Some(declarator) => first_declarator = declarator,
            None => {
                if let Some((index, start)) = named_type_specifier.filter(|_| maybe_ctor) {
                    // the name was the declarator of a constructor
                    debug!("parse_simple_declaration: retrying token {} as a constructor", start);
                    parser.rewind(start);
                    decl_specifiers.truncate(index);
                    first_declarator = parse_init_declarator(parser, accept_struct_declarator)?;
                }
            }
        }
    }
    declarators.extend(first_declarator);

    if matches!(parser.la(), TokenKind::Comma | TokenKind::Semicolon) || has_complex_type_specifier {
        while parser.la() == TokenKind::Comma {
            parser.consume_token();
            if let Some(declarator) = parse_init_declarator(parser, accept_struct_declarator) {
                declarators.extend(declarator);
            }
        }
        let semicolon = parser.match_token(TokenKind::Semicolon);
        return Some(parser.alloc(SimpleDeclaration {
            qt_invokable,
            decl_specifiers,
            declarators,
            semicolon,
            ..Default::default()
        }));
    }

    if !parser.in_function_body
        && first_declarator.is_some()
        && matches!(parser.la(), TokenKind::Colon | TokenKind::LeftBrace | TokenKind::Try)
    {
        let ctor_initializer = if parser.la() == TokenKind::Colon {
            parse_ctor_initializer(parser)
        } else {
            None
        };

        let function_body = match parser.la() {
            TokenKind::LeftBrace => Some(parse_function_body(parser)),
            TokenKind::Try => Some(parse_try_block_statement(parser)),
            _ => None,
        };
        if let Some(function_body) = function_body {
            return Some(parser.alloc(FunctionDefinition {
                qt_invokable,
                decl_specifiers,
                declarator: first_declarator,
                ctor_initializer,
                function_body,
                ..Default::default()
            }));
        }
    }

    parser.error(ParseError::UnexpectedToken(parser.spell().to_string()));
    None
}

/// A function body. With `skip_function_bodies` the braces are matched and
/// an empty compound statement is produced.
pub(crate) fn parse_function_body(parser: &mut Parser) -> Option<NodeRef> {
    if parser.options.skip_function_bodies {
        if parser.la() != TokenKind::LeftBrace {
            parser.match_token(TokenKind::LeftBrace);
            return None;
        }
        let lbrace = parser.cursor();
        parser.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
        let rbrace = parser.match_token(TokenKind::RightBrace);
        return Some(parser.alloc(CompoundStatement {
            lbrace,
            rbrace,
            ..Default::default()
        }));
    }

    let previous = std::mem::replace(&mut parser.in_function_body, true);
    let body = parse_compound_statement(parser);
    parser.in_function_body = previous;
    body
}
