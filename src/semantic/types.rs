//! Type representation and structural equality.

use serde::Serialize;

use crate::arena::Id;
use crate::semantic::control::Control;
use crate::semantic::names::{Name, NameRef};
use crate::semantic::symbols::{SymbolKind, SymbolRef};

/// Reference to an interned [`Type`] owned by a [`Control`]
pub type TypeRef = Id<Type>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntegerKind {
    Char,
    WideChar,
    Bool,
    Short,
    Int,
    Long,
    LongLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

/// The closed set of type kinds.
///
/// Function, class, enum, namespace and the Objective-C kinds are symbols
/// that double as types; the variant holds the symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Integer(IntegerKind),
    Float(FloatKind),
    Pointer(FullySpecifiedType),
    Reference(FullySpecifiedType),
    PointerToMember {
        member_name: NameRef,
        element: FullySpecifiedType,
    },
    Array {
        element: FullySpecifiedType,
        size: u32,
    },
    Named(NameRef),
    Function(SymbolRef),
    Class(SymbolRef),
    Enum(SymbolRef),
    Namespace(SymbolRef),
    ForwardClassDeclaration(SymbolRef),
    ObjCClass(SymbolRef),
    ObjCProtocol(SymbolRef),
    ObjCMethod(SymbolRef),
}

impl Type {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function(_))
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    /// The symbol of a type-as-symbol kind
    pub fn symbol(&self) -> Option<SymbolRef> {
        match self {
            Type::Function(s)
            | Type::Class(s)
            | Type::Enum(s)
            | Type::Namespace(s)
            | Type::ForwardClassDeclaration(s)
            | Type::ObjCClass(s)
            | Type::ObjCProtocol(s)
            | Type::ObjCMethod(s) => Some(*s),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Qualifiers and declaration specifiers carried next to a type
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u16 {
        const CONST    = 1 << 0;
        const VOLATILE = 1 << 1;
        const SIGNED   = 1 << 2;
        const UNSIGNED = 1 << 3;
        const FRIEND   = 1 << 4;
        const REGISTER = 1 << 5;
        const STATIC   = 1 << 6;
        const EXTERN   = 1 << 7;
        const MUTABLE  = 1 << 8;
        const TYPEDEF  = 1 << 9;
        const INLINE   = 1 << 10;
        const VIRTUAL  = 1 << 11;
        const EXPLICIT = 1 << 12;

        /// Flags that survive into the type of a declarator
        const QUALIFIERS = Self::CONST.bits() | Self::VOLATILE.bits()
            | Self::SIGNED.bits() | Self::UNSIGNED.bits();
    }
}

/// A type plus its flags. The default value is the undefined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FullySpecifiedType {
    pub ty: Option<TypeRef>,
    pub flags: TypeFlags,
}

impl FullySpecifiedType {
    pub fn new(ty: TypeRef) -> Self {
        FullySpecifiedType {
            ty: Some(ty),
            flags: TypeFlags::empty(),
        }
    }

    pub fn with_flags(ty: Option<TypeRef>, flags: TypeFlags) -> Self {
        FullySpecifiedType { ty, flags }
    }

    pub fn is_valid(&self) -> bool {
        self.ty.is_some()
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(TypeFlags::CONST)
    }

    pub fn is_volatile(&self) -> bool {
        self.flags.contains(TypeFlags::VOLATILE)
    }

    pub fn is_signed(&self) -> bool {
        self.flags.contains(TypeFlags::SIGNED)
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(TypeFlags::UNSIGNED)
    }

    pub fn is_friend(&self) -> bool {
        self.flags.contains(TypeFlags::FRIEND)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(TypeFlags::STATIC)
    }

    pub fn is_typedef(&self) -> bool {
        self.flags.contains(TypeFlags::TYPEDEF)
    }

    /// Same type keeping only cv and sign qualifiers
    pub fn qualified_type(&self) -> FullySpecifiedType {
        FullySpecifiedType {
            ty: self.ty,
            flags: self.flags & TypeFlags::QUALIFIERS,
        }
    }

    /// Structural equality over the type and the flags.
    pub fn is_equal_to(&self, other: &FullySpecifiedType, control: &Control) -> bool {
        if self.flags != other.flags {
            return false;
        }
        match (self.ty, other.ty) {
            (None, None) => true,
            (Some(l), Some(r)) => control.is_equal_type(l, r),
            _ => false,
        }
    }
}

impl Control {
    /// Structural type equality.
    pub fn is_equal_type(&self, left: TypeRef, right: TypeRef) -> bool {
        if left == right {
            return true;
        }
        match (self.type_of(left), self.type_of(right)) {
            (Type::Void, Type::Void) => true,
            (Type::Integer(l), Type::Integer(r)) => l == r,
            (Type::Float(l), Type::Float(r)) => l == r,
            (Type::Pointer(l), Type::Pointer(r)) | (Type::Reference(l), Type::Reference(r)) => {
                l.is_equal_to(r, self)
            }
            (
                Type::PointerToMember {
                    member_name: ln,
                    element: le,
                },
                Type::PointerToMember {
                    member_name: rn,
                    element: re,
                },
            ) => self.is_equal_name(*ln, *rn) && le.is_equal_to(re, self),
            (
                Type::Array {
                    element: le,
                    size: ls,
                },
                Type::Array {
                    element: re,
                    size: rs,
                },
            ) => ls == rs && le.is_equal_to(re, self),
            (Type::Named(l), Type::Named(r)) => self.is_equal_name(*l, *r),
            (Type::Function(l), Type::Function(r)) => self.is_equal_function(*l, *r),
            (Type::ObjCMethod(l), Type::ObjCMethod(r)) => self.is_equal_function(*l, *r),
            (Type::Class(l), Type::Class(r))
            | (Type::Enum(l), Type::Enum(r))
            | (Type::Namespace(l), Type::Namespace(r))
            | (Type::ForwardClassDeclaration(l), Type::ForwardClassDeclaration(r))
            | (Type::ObjCClass(l), Type::ObjCClass(r))
            | (Type::ObjCProtocol(l), Type::ObjCProtocol(r)) => {
                self.is_equal_optional_name(self.symbol(*l).name, self.symbol(*r).name)
            }
            _ => false,
        }
    }

    fn is_equal_function(&self, left: SymbolRef, right: SymbolRef) -> bool {
        let (l, r) = (self.symbol(left), self.symbol(right));
        let (lf, rf) = match (&l.kind, &r.kind) {
            (SymbolKind::Function(lf), SymbolKind::Function(rf)) => (
                (lf.return_type, lf.arguments, lf.is_const(), lf.is_volatile()),
                (rf.return_type, rf.arguments, rf.is_const(), rf.is_volatile()),
            ),
            (SymbolKind::ObjCMethod(lm), SymbolKind::ObjCMethod(rm)) => (
                (lm.return_type, lm.arguments, false, false),
                (rm.return_type, rm.arguments, false, false),
            ),
            _ => return false,
        };
        if lf.2 != rf.2 || lf.3 != rf.3 {
            return false;
        }
        if !self.is_equal_optional_name(l.name, r.name) {
            return false;
        }
        let (largs, rargs) = (self.scope(lf.1).symbols(), self.scope(rf.1).symbols());
        if largs.len() != rargs.len() || !lf.0.is_equal_to(&rf.0, self) {
            return false;
        }
        largs
            .iter()
            .zip(rargs)
            .all(|(&a, &b)| self.symbol(a).ty().is_equal_to(&self.symbol(b).ty(), self))
    }

    fn is_equal_optional_name(&self, left: Option<NameRef>, right: Option<NameRef>) -> bool {
        match (left, right) {
            (None, None) => true,
            (Some(l), Some(r)) => self.is_equal_name(l, r),
            _ => false,
        }
    }

    /// Structural name equality.
    pub fn is_equal_name(&self, left: NameRef, right: NameRef) -> bool {
        if left == right {
            return true;
        }
        match (self.name(left), self.name(right)) {
            (Name::Identifier(l), Name::Identifier(r)) | (Name::Destructor(l), Name::Destructor(r)) => l == r,
            (
                Name::Template {
                    identifier: li,
                    arguments: la,
                },
                Name::Template {
                    identifier: ri,
                    arguments: ra,
                },
            ) => li == ri && la.len() == ra.len() && la.iter().zip(ra).all(|(a, b)| a.is_equal_to(b, self)),
            (Name::Operator(l), Name::Operator(r)) => l == r,
            (Name::Conversion(l), Name::Conversion(r)) => l.is_equal_to(r, self),
            (
                Name::Qualified {
                    names: ln,
                    global: lg,
                },
                Name::Qualified {
                    names: rn,
                    global: rg,
                },
            ) => lg == rg && self.is_equal_name_list(ln, rn),
            (
                Name::Selector {
                    names: ln,
                    has_arguments: la,
                },
                Name::Selector {
                    names: rn,
                    has_arguments: ra,
                },
            ) => la == ra && self.is_equal_name_list(ln, rn),
            _ => false,
        }
    }

    fn is_equal_name_list(&self, left: &[NameRef], right: &[NameRef]) -> bool {
        left.len() == right.len() && left.iter().zip(right).all(|(&l, &r)| self.is_equal_name(l, r))
    }
}
