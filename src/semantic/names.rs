//! Semantic names.

use crate::StringId;
use crate::arena::Id;
use crate::lexer::TokenKind;
use crate::semantic::types::FullySpecifiedType;

/// Reference to an interned [`Name`] owned by a [`super::Control`]
pub type NameRef = Id<Name>;

/// Operator of an `operator@` function name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    New,
    Delete,
    NewArray,
    DeleteArray,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Exclaim,
    Equal,
    Less,
    Greater,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    CaretEqual,
    AmpEqual,
    PipeEqual,
    LessLess,
    GreaterGreater,
    LessLessEqual,
    GreaterGreaterEqual,
    EqualEqual,
    ExclaimEqual,
    LessEqual,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Comma,
    ArrowStar,
    Arrow,
    FunctionCall,
    ArrayAccess,
}

impl OperatorKind {
    /// Operator for a single punctuator token. `()`, `[]` and the
    /// `new`/`delete` forms are built by the caller.
    pub fn from_token(kind: TokenKind) -> Option<OperatorKind> {
        let op = match kind {
            TokenKind::New => OperatorKind::New,
            TokenKind::Delete => OperatorKind::Delete,
            TokenKind::Plus => OperatorKind::Plus,
            TokenKind::Minus => OperatorKind::Minus,
            TokenKind::Star => OperatorKind::Star,
            TokenKind::Slash => OperatorKind::Slash,
            TokenKind::Percent => OperatorKind::Percent,
            TokenKind::Caret => OperatorKind::Caret,
            TokenKind::Ampersand => OperatorKind::Amp,
            TokenKind::Pipe => OperatorKind::Pipe,
            TokenKind::Tilde => OperatorKind::Tilde,
            TokenKind::Exclaim => OperatorKind::Exclaim,
            TokenKind::Equal => OperatorKind::Equal,
            TokenKind::Less => OperatorKind::Less,
            TokenKind::Greater => OperatorKind::Greater,
            TokenKind::PlusEqual => OperatorKind::PlusEqual,
            TokenKind::MinusEqual => OperatorKind::MinusEqual,
            TokenKind::StarEqual => OperatorKind::StarEqual,
            TokenKind::SlashEqual => OperatorKind::SlashEqual,
            TokenKind::PercentEqual => OperatorKind::PercentEqual,
            TokenKind::CaretEqual => OperatorKind::CaretEqual,
            TokenKind::AmperEqual => OperatorKind::AmpEqual,
            TokenKind::PipeEqual => OperatorKind::PipeEqual,
            TokenKind::LessLess => OperatorKind::LessLess,
            TokenKind::GreaterGreater => OperatorKind::GreaterGreater,
            TokenKind::LessLessEqual => OperatorKind::LessLessEqual,
            TokenKind::GreaterGreaterEqual => OperatorKind::GreaterGreaterEqual,
            TokenKind::EqualEqual => OperatorKind::EqualEqual,
            TokenKind::ExclaimEqual => OperatorKind::ExclaimEqual,
            TokenKind::LessEqual => OperatorKind::LessEqual,
            TokenKind::GreaterEqual => OperatorKind::GreaterEqual,
            TokenKind::AmperAmper => OperatorKind::AmpAmp,
            TokenKind::PipePipe => OperatorKind::PipePipe,
            TokenKind::PlusPlus => OperatorKind::PlusPlus,
            TokenKind::MinusMinus => OperatorKind::MinusMinus,
            TokenKind::Comma => OperatorKind::Comma,
            TokenKind::ArrowStar => OperatorKind::ArrowStar,
            TokenKind::Arrow => OperatorKind::Arrow,
            _ => return None,
        };
        Some(op)
    }

    pub fn spelling(self) -> &'static str {
        match self {
            OperatorKind::New => "new",
            OperatorKind::Delete => "delete",
            OperatorKind::NewArray => "new[]",
            OperatorKind::DeleteArray => "delete[]",
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Star => "*",
            OperatorKind::Slash => "/",
            OperatorKind::Percent => "%",
            OperatorKind::Caret => "^",
            OperatorKind::Amp => "&",
            OperatorKind::Pipe => "|",
            OperatorKind::Tilde => "~",
            OperatorKind::Exclaim => "!",
            OperatorKind::Equal => "=",
            OperatorKind::Less => "<",
            OperatorKind::Greater => ">",
            OperatorKind::PlusEqual => "+=",
            OperatorKind::MinusEqual => "-=",
            OperatorKind::StarEqual => "*=",
            OperatorKind::SlashEqual => "/=",
            OperatorKind::PercentEqual => "%=",
            OperatorKind::CaretEqual => "^=",
            OperatorKind::AmpEqual => "&=",
            OperatorKind::PipeEqual => "|=",
            OperatorKind::LessLess => "<<",
            OperatorKind::GreaterGreater => ">>",
            OperatorKind::LessLessEqual => "<<=",
            OperatorKind::GreaterGreaterEqual => ">>=",
            OperatorKind::EqualEqual => "==",
            OperatorKind::ExclaimEqual => "!=",
            OperatorKind::LessEqual => "<=",
            OperatorKind::GreaterEqual => ">=",
            OperatorKind::AmpAmp => "&&",
            OperatorKind::PipePipe => "||",
            OperatorKind::PlusPlus => "++",
            OperatorKind::MinusMinus => "--",
            OperatorKind::Comma => ",",
            OperatorKind::ArrowStar => "->*",
            OperatorKind::Arrow => "->",
            OperatorKind::FunctionCall => "()",
            OperatorKind::ArrayAccess => "[]",
        }
    }

    /// `new`, `delete` and their array forms are spelled with a space after `operator`
    pub fn is_word(self) -> bool {
        matches!(
            self,
            OperatorKind::New | OperatorKind::Delete | OperatorKind::NewArray | OperatorKind::DeleteArray
        )
    }
}

/// A name as seen by the semantic pass
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    /// `x`
    Identifier(StringId),
    /// `~X`
    Destructor(StringId),
    /// `T<int, X>`
    Template {
        identifier: StringId,
        arguments: Vec<FullySpecifiedType>,
    },
    /// `operator+`
    Operator(OperatorKind),
    /// `operator int`
    Conversion(FullySpecifiedType),
    /// `a::b::c`, `::x`
    Qualified { names: Vec<NameRef>, global: bool },
    /// Objective-C selector, `foo:bar:`
    Selector { names: Vec<NameRef>, has_arguments: bool },
}

impl Name {
    /// The identifier used to index the name in a scope
    pub fn identifier(&self) -> Option<StringId> {
        match self {
            Name::Identifier(id) | Name::Destructor(id) => Some(*id),
            Name::Template { identifier, .. } => Some(*identifier),
            _ => None,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Name::Identifier(_))
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Name::Template { .. })
    }

    pub fn is_destructor(&self) -> bool {
        matches!(self, Name::Destructor(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Name::Operator(_))
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, Name::Conversion(_))
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, Name::Qualified { .. })
    }
}
