//! Base types of specifier sequences.
//!
//! Class and enum specifiers also declare their symbols here, in the
//! scope the specifier sequence appears in.

use log::trace;

use crate::ast::*;
use crate::lexer::TokenKind;
use crate::semantic::scope::ScopeRef;
use crate::semantic::symbols::{ClassKey, MethodKey, SymbolKind};
use crate::semantic::types::{FloatKind, FullySpecifiedType, IntegerKind, Type, TypeFlags};
use crate::semantic::Semantic;

pub(crate) struct CheckSpecifier<'s, 'a> {
    sem: &'s mut Semantic<'a>,
    scope: ScopeRef,
    ty: FullySpecifiedType,
}

impl<'s, 'a> CheckSpecifier<'s, 'a> {
    pub(crate) fn new(sem: &'s mut Semantic<'a>, scope: ScopeRef) -> Self {
        CheckSpecifier {
            sem,
            scope,
            ty: FullySpecifiedType::default(),
        }
    }

    pub(crate) fn check(mut self, specifiers: &[NodeRef]) -> FullySpecifiedType {
        let ast = self.sem.ast;
        accept_list(ast, specifiers, &mut self);
        if !self.ty.is_valid() && self.ty.flags.intersects(TypeFlags::SIGNED | TypeFlags::UNSIGNED) {
            self.ty.ty = Some(self.sem.control.integer_type(IntegerKind::Int));
        }
        self.ty
    }

    fn current(&self) -> Option<&Type> {
        self.ty.ty.map(|ty| self.sem.control.type_of(ty))
    }

    fn set_integer(&mut self, kind: IntegerKind) {
        self.ty.ty = Some(self.sem.control.integer_type(kind));
    }

    fn set_float(&mut self, kind: FloatKind) {
        self.ty.ty = Some(self.sem.control.float_type(kind));
    }

    fn simple(&mut self, kind: TokenKind) {
        let flag = match kind {
            TokenKind::Const => Some(TypeFlags::CONST),
            TokenKind::Volatile => Some(TypeFlags::VOLATILE),
            TokenKind::Signed => Some(TypeFlags::SIGNED),
            TokenKind::Unsigned => Some(TypeFlags::UNSIGNED),
            TokenKind::Friend => Some(TypeFlags::FRIEND),
            TokenKind::Register => Some(TypeFlags::REGISTER),
            TokenKind::Static => Some(TypeFlags::STATIC),
            TokenKind::Extern => Some(TypeFlags::EXTERN),
            TokenKind::Mutable => Some(TypeFlags::MUTABLE),
            TokenKind::Typedef => Some(TypeFlags::TYPEDEF),
            TokenKind::Inline => Some(TypeFlags::INLINE),
            TokenKind::Virtual => Some(TypeFlags::VIRTUAL),
            TokenKind::Explicit => Some(TypeFlags::EXPLICIT),
            _ => None,
        };
        if let Some(flag) = flag {
            self.ty.flags |= flag;
            return;
        }

        match kind {
            TokenKind::Char => self.set_integer(IntegerKind::Char),
            TokenKind::WcharT => self.set_integer(IntegerKind::WideChar),
            TokenKind::Bool => self.set_integer(IntegerKind::Bool),
            TokenKind::Short => self.set_integer(IntegerKind::Short),
            TokenKind::Int => {
                // `short int`, `long int` and `long long int` keep their kind
                if !matches!(
                    self.current(),
                    Some(Type::Integer(IntegerKind::Short | IntegerKind::Long | IntegerKind::LongLong))
                ) {
                    self.set_integer(IntegerKind::Int);
                }
            }
            TokenKind::Long => match self.current() {
                Some(Type::Integer(IntegerKind::Long)) => self.set_integer(IntegerKind::LongLong),
                Some(Type::Float(FloatKind::Double)) => self.set_float(FloatKind::LongDouble),
                _ => self.set_integer(IntegerKind::Long),
            },
            TokenKind::Float => self.set_float(FloatKind::Float),
            TokenKind::Double => {
                if matches!(self.current(), Some(Type::Integer(IntegerKind::Long))) {
                    self.set_float(FloatKind::LongDouble);
                } else {
                    self.set_float(FloatKind::Double);
                }
            }
            TokenKind::Void => self.ty.ty = Some(self.sem.control.void_type()),
            _ => {}
        }
    }
}

impl Visitor for CheckSpecifier<'_, '_> {
    fn visit_simple_specifier(&mut self, _ast: &Ast, _node: NodeRef, n: &SimpleSpecifier) -> bool {
        let kind = self.sem.token_kind(n.specifier);
        self.simple(kind);
        false
    }

    fn visit_attribute_specifier(&mut self, _ast: &Ast, _node: NodeRef, _n: &AttributeSpecifier) -> bool {
        false
    }

    fn visit_typeof_specifier(&mut self, _ast: &Ast, _node: NodeRef, n: &TypeofSpecifier) -> bool {
        self.sem.check_expression(n.expression, self.scope);
        false
    }

    fn visit_named_type_specifier(&mut self, _ast: &Ast, _node: NodeRef, n: &NamedTypeSpecifier) -> bool {
        if let Some(name) = self.sem.check_name(n.name, self.scope) {
            self.ty.ty = Some(self.sem.control.named_type(name));
        }
        false
    }

    fn visit_elaborated_type_specifier(&mut self, _ast: &Ast, _node: NodeRef, n: &ElaboratedTypeSpecifier) -> bool {
        if let Some(name) = self.sem.check_name(n.name, self.scope) {
            self.ty.ty = Some(self.sem.control.named_type(name));
        }
        false
    }

    fn visit_class_specifier(&mut self, ast: &Ast, node: NodeRef, n: &ClassSpecifier) -> bool {
        let name = self.sem.check_name(n.name, self.scope);
        let location = match n.name {
            Some(name) => ast.first_token(name),
            None => n.classkey,
        };
        let classkey = self.sem.token_kind(n.classkey);
        let key = match classkey {
            TokenKind::Struct => ClassKey::Struct,
            TokenKind::Union => ClassKey::Union,
            _ => ClassKey::Class,
        };
        let location = self.sem.location(location);
        let class = self.sem.control.new_class(location, name, key);
        self.sem.set_offsets(class, node);
        let visibility = self.sem.visibility_in(self.scope);
        self.sem.control.symbol_mut(class).visibility = visibility;
        n.symbol.set(Some(class));
        self.sem.control.enter_symbol(self.scope, class);
        trace!("class specifier {:?}", class);

        for &base in &n.base_clause {
            let NodeKind::BaseSpecifier(spec) = &ast[base] else {
                continue;
            };
            let base_name = self.sem.check_name(spec.name, self.scope);
            let location = match spec.name {
                Some(name) => ast.first_token(name),
                None => ast.first_token(base),
            };
            let location = self.sem.location(location);
            let base_class = self.sem.control.new_base_class(location, base_name);
            let visibility = match spec.access_specifier {
                0 => Semantic::visibility_for_class_key(classkey),
                token => Semantic::visibility_for_access_specifier(self.sem.token_kind(token)),
            };
            let symbol = self.sem.control.symbol_mut(base_class);
            symbol.visibility = visibility;
            symbol.kind = SymbolKind::BaseClass {
                is_virtual: spec.virtual_kw != 0,
            };
            spec.symbol.set(Some(base_class));
            if let SymbolKind::Class(data) = &mut self.sem.control.symbol_mut(class).kind {
                data.base_classes.push(base_class);
            }
        }

        if let Some(members) = self.sem.control.symbol(class).members() {
            let visibility = Semantic::visibility_for_class_key(classkey);
            self.sem.with_access(visibility, MethodKey::Normal, |sem| {
                for &member in &n.member_specifiers {
                    sem.check_declaration(Some(member), members, None);
                }
            });
        }

        self.ty.ty = self.sem.control.symbol(class).ty().ty;
        false
    }

    fn visit_enum_specifier(&mut self, ast: &Ast, node: NodeRef, n: &EnumSpecifier) -> bool {
        let name = self.sem.check_name(n.name, self.scope);
        let location = match n.name {
            Some(name) => ast.first_token(name),
            None => n.enum_kw,
        };
        let location = self.sem.location(location);
        let enumeration = self.sem.control.new_enum(location, name);
        self.sem.set_offsets(enumeration, node);
        let visibility = self.sem.visibility_in(self.scope);
        self.sem.control.symbol_mut(enumeration).visibility = visibility;
        n.symbol.set(Some(enumeration));
        self.sem.control.enter_symbol(self.scope, enumeration);

        let enum_type = self.sem.control.symbol(enumeration).ty();
        if let Some(members) = self.sem.control.symbol(enumeration).members() {
            for &enumerator in &n.enumerators {
                let NodeKind::Enumerator(e) = &ast[enumerator] else {
                    continue;
                };
                self.sem.check_expression(e.expression, self.scope);
                if e.identifier == 0 {
                    continue;
                }
                let id = self.sem.spell(e.identifier);
                let name = self.sem.control.name_id(id);
                let location = self.sem.location(e.identifier);
                let symbol = self.sem.control.new_declaration(location, Some(name));
                self.sem.set_offsets(symbol, enumerator);
                self.sem.control.symbol_mut(symbol).ty = FullySpecifiedType::with_flags(enum_type.ty, TypeFlags::CONST);
                self.sem.control.enter_symbol(members, symbol);
            }
        }

        self.ty.ty = enum_type.ty;
        false
    }
}
