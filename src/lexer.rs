//! Tokenizer shared by the preprocessor and the parser.
//!
//! The lexer works directly on source text. Every token keeps its byte offset
//! and length in the buffer it was read from plus its interned spelling, so
//! consumers never have to slice the buffer again.

use crate::lang_options::LanguageFeatures;
use crate::StringId;
use serde::Serialize;

macro_rules! define_token_kinds {
    ($($kind:ident => $spell:literal,)*) => {
        /// Token kinds for C++ family sources
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum TokenKind {
            $($kind,)*
        }

        impl TokenKind {
            /// Canonical spelling, used in diagnostics.
            pub fn spell(self) -> &'static str {
                match self {
                    $(TokenKind::$kind => $spell,)*
                }
            }
        }
    };
}

define_token_kinds! {
    EndOfFile => "<eof>",
    Error => "<error>",

    // literals and names
    Identifier => "<identifier>",
    NumericLiteral => "<numeric literal>",
    CharLiteral => "<char literal>",
    WideCharLiteral => "<wide char literal>",
    StringLiteral => "<string literal>",
    WideStringLiteral => "<wide string literal>",
    AtStringLiteral => "<@string literal>",

    // punctuators
    Ampersand => "&",
    AmperAmper => "&&",
    AmperEqual => "&=",
    Arrow => "->",
    ArrowStar => "->*",
    Caret => "^",
    CaretEqual => "^=",
    Colon => ":",
    ColonColon => "::",
    Comma => ",",
    Slash => "/",
    SlashEqual => "/=",
    Dot => ".",
    DotDotDot => "...",
    DotStar => ".*",
    Equal => "=",
    EqualEqual => "==",
    Exclaim => "!",
    ExclaimEqual => "!=",
    Greater => ">",
    GreaterEqual => ">=",
    GreaterGreater => ">>",
    GreaterGreaterEqual => ">>=",
    LeftBrace => "{",
    LeftBracket => "[",
    LeftParen => "(",
    Less => "<",
    LessEqual => "<=",
    LessLess => "<<",
    LessLessEqual => "<<=",
    Minus => "-",
    MinusEqual => "-=",
    MinusMinus => "--",
    Percent => "%",
    PercentEqual => "%=",
    Pipe => "|",
    PipeEqual => "|=",
    PipePipe => "||",
    Plus => "+",
    PlusEqual => "+=",
    PlusPlus => "++",
    Pound => "#",
    PoundPound => "##",
    Question => "?",
    RightBrace => "}",
    RightBracket => "]",
    RightParen => ")",
    Semicolon => ";",
    Star => "*",
    StarEqual => "*=",
    Tilde => "~",
    At => "@",

    // keywords
    Asm => "asm",
    Attribute => "__attribute__",
    Auto => "auto",
    Bool => "bool",
    Break => "break",
    Case => "case",
    Catch => "catch",
    Char => "char",
    Class => "class",
    Const => "const",
    ConstCast => "const_cast",
    Continue => "continue",
    Default => "default",
    Delete => "delete",
    Do => "do",
    Double => "double",
    DynamicCast => "dynamic_cast",
    Else => "else",
    Enum => "enum",
    Explicit => "explicit",
    Export => "export",
    Extern => "extern",
    False => "false",
    Float => "float",
    For => "for",
    Friend => "friend",
    Goto => "goto",
    If => "if",
    Inline => "inline",
    Int => "int",
    Long => "long",
    Mutable => "mutable",
    Namespace => "namespace",
    New => "new",
    Operator => "operator",
    Private => "private",
    Protected => "protected",
    Public => "public",
    Register => "register",
    ReinterpretCast => "reinterpret_cast",
    Return => "return",
    Short => "short",
    Signed => "signed",
    Sizeof => "sizeof",
    Static => "static",
    StaticCast => "static_cast",
    Struct => "struct",
    Switch => "switch",
    Template => "template",
    This => "this",
    Throw => "throw",
    True => "true",
    Try => "try",
    Typedef => "typedef",
    Typeid => "typeid",
    Typename => "typename",
    Typeof => "typeof",
    Union => "union",
    Unsigned => "unsigned",
    Using => "using",
    Virtual => "virtual",
    Void => "void",
    Volatile => "volatile",
    WcharT => "wchar_t",
    While => "while",

    // Qt meta-object keywords
    Signals => "signals",
    Slots => "slots",
    Signal => "SIGNAL",
    Slot => "SLOT",
    QSignal => "Q_SIGNAL",
    QSlot => "Q_SLOT",
    QForeach => "foreach",

    // Objective-C @ keywords
    AtCatch => "@catch",
    AtClass => "@class",
    AtCompatibilityAlias => "@compatibility_alias",
    AtDefs => "@defs",
    AtDynamic => "@dynamic",
    AtEncode => "@encode",
    AtEnd => "@end",
    AtFinally => "@finally",
    AtImplementation => "@implementation",
    AtInterface => "@interface",
    AtOptional => "@optional",
    AtPackage => "@package",
    AtPrivate => "@private",
    AtProperty => "@property",
    AtProtected => "@protected",
    AtProtocol => "@protocol",
    AtPublic => "@public",
    AtRequired => "@required",
    AtSelector => "@selector",
    AtSynchronized => "@synchronized",
    AtSynthesize => "@synthesize",
    AtThrow => "@throw",
    AtTry => "@try",
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NumericLiteral
                | TokenKind::CharLiteral
                | TokenKind::WideCharLiteral
                | TokenKind::StringLiteral
                | TokenKind::WideStringLiteral
                | TokenKind::AtStringLiteral
        )
    }

    pub fn is_string_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral | TokenKind::WideStringLiteral | TokenKind::AtStringLiteral
        )
    }

    pub fn is_keyword(self) -> bool {
        (self as u16) >= (TokenKind::Asm as u16)
    }

    pub fn is_objc_at_keyword(self) -> bool {
        (self as u16) >= (TokenKind::AtCatch as u16)
    }

    /// Identifiers and keywords. These may name macros.
    pub fn is_identifier_like(self) -> bool {
        self == TokenKind::Identifier || (self.is_keyword() && !self.is_objc_at_keyword())
    }

    pub fn is_operator(self) -> bool {
        let value = self as u16;
        value >= TokenKind::Ampersand as u16 && value <= TokenKind::At as u16
    }

    /// `char`, `int`, `void`, ... including the sign and size modifiers
    pub fn is_builtin_type_specifier(self) -> bool {
        matches!(
            self,
            TokenKind::Char
                | TokenKind::WcharT
                | TokenKind::Bool
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Void
        )
    }

    pub fn is_cv_qualifier(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Volatile)
    }

    pub fn is_storage_class_specifier(self) -> bool {
        matches!(
            self,
            TokenKind::Friend
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::Static
                | TokenKind::Extern
                | TokenKind::Mutable
                | TokenKind::Typedef
        )
    }

    pub fn is_function_specifier(self) -> bool {
        matches!(self, TokenKind::Inline | TokenKind::Virtual | TokenKind::Explicit)
    }

    pub fn is_class_key(self) -> bool {
        matches!(self, TokenKind::Class | TokenKind::Struct | TokenKind::Union)
    }

    pub fn is_access_specifier(self) -> bool {
        matches!(self, TokenKind::Public | TokenKind::Protected | TokenKind::Private)
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::StarEqual
                | TokenKind::SlashEqual
                | TokenKind::PercentEqual
                | TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::GreaterGreaterEqual
                | TokenKind::LessLessEqual
                | TokenKind::AmperEqual
                | TokenKind::CaretEqual
                | TokenKind::PipeEqual
        )
    }
}

bitflags::bitflags! {
    /// Layout flags recorded while scanning
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u8 {
        /// First token on its physical line
        const AT_LINE_START = 1 << 0;
        /// Preceded by whitespace or a comment
        const LEADING_SPACE = 1 << 1;
        /// Produced by macro expansion
        const EXPANDED      = 1 << 2;
    }
}

/// A token with its position in the buffer it was scanned from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub flags: TokenFlags,
    pub offset: u32,
    pub length: u32,
    pub text: StringId,
}

impl Token {
    pub fn new(kind: TokenKind, flags: TokenFlags, offset: u32, length: u32, text: StringId) -> Self {
        Token {
            kind,
            flags,
            offset,
            length,
            text,
        }
    }

    /// The reserved token stored at index 0 of every token stream.
    pub fn invalid() -> Self {
        Token::new(TokenKind::Error, TokenFlags::empty(), 0, 0, StringId::new(""))
    }

    pub fn spell(&self) -> &'static str {
        self.text.as_str()
    }

    pub fn end(&self) -> u32 {
        self.offset + self.length
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn at_line_start(&self) -> bool {
        self.flags.contains(TokenFlags::AT_LINE_START)
    }

    pub fn has_leading_space(&self) -> bool {
        self.flags.contains(TokenFlags::LEADING_SPACE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeywordSet {
    Common,
    Cxx,
    Qt,
}

fn keyword_map() -> &'static hashbrown::HashMap<StringId, (TokenKind, KeywordSet)> {
    static KEYWORDS: std::sync::OnceLock<hashbrown::HashMap<StringId, (TokenKind, KeywordSet)>> =
        std::sync::OnceLock::new();
    KEYWORDS.get_or_init(|| {
        use KeywordSet::*;
        let entries: &[(&str, TokenKind, KeywordSet)] = &[
            ("auto", TokenKind::Auto, Common),
            ("break", TokenKind::Break, Common),
            ("case", TokenKind::Case, Common),
            ("char", TokenKind::Char, Common),
            ("const", TokenKind::Const, Common),
            ("continue", TokenKind::Continue, Common),
            ("default", TokenKind::Default, Common),
            ("do", TokenKind::Do, Common),
            ("double", TokenKind::Double, Common),
            ("else", TokenKind::Else, Common),
            ("enum", TokenKind::Enum, Common),
            ("extern", TokenKind::Extern, Common),
            ("float", TokenKind::Float, Common),
            ("for", TokenKind::For, Common),
            ("goto", TokenKind::Goto, Common),
            ("if", TokenKind::If, Common),
            ("inline", TokenKind::Inline, Common),
            ("int", TokenKind::Int, Common),
            ("long", TokenKind::Long, Common),
            ("register", TokenKind::Register, Common),
            ("return", TokenKind::Return, Common),
            ("short", TokenKind::Short, Common),
            ("signed", TokenKind::Signed, Common),
            ("sizeof", TokenKind::Sizeof, Common),
            ("static", TokenKind::Static, Common),
            ("struct", TokenKind::Struct, Common),
            ("switch", TokenKind::Switch, Common),
            ("typedef", TokenKind::Typedef, Common),
            ("union", TokenKind::Union, Common),
            ("unsigned", TokenKind::Unsigned, Common),
            ("void", TokenKind::Void, Common),
            ("volatile", TokenKind::Volatile, Common),
            ("while", TokenKind::While, Common),
            ("asm", TokenKind::Asm, Common),
            ("__asm", TokenKind::Asm, Common),
            ("__asm__", TokenKind::Asm, Common),
            ("__attribute", TokenKind::Attribute, Common),
            ("__attribute__", TokenKind::Attribute, Common),
            ("__const", TokenKind::Const, Common),
            ("__const__", TokenKind::Const, Common),
            ("__inline", TokenKind::Inline, Common),
            ("__inline__", TokenKind::Inline, Common),
            ("typeof", TokenKind::Typeof, Common),
            ("__typeof", TokenKind::Typeof, Common),
            ("__typeof__", TokenKind::Typeof, Common),
            ("__volatile", TokenKind::Volatile, Common),
            ("__volatile__", TokenKind::Volatile, Common),
            ("bool", TokenKind::Bool, Cxx),
            ("catch", TokenKind::Catch, Cxx),
            ("class", TokenKind::Class, Cxx),
            ("const_cast", TokenKind::ConstCast, Cxx),
            ("delete", TokenKind::Delete, Cxx),
            ("dynamic_cast", TokenKind::DynamicCast, Cxx),
            ("explicit", TokenKind::Explicit, Cxx),
            ("export", TokenKind::Export, Cxx),
            ("false", TokenKind::False, Cxx),
            ("friend", TokenKind::Friend, Cxx),
            ("mutable", TokenKind::Mutable, Cxx),
            ("namespace", TokenKind::Namespace, Cxx),
            ("new", TokenKind::New, Cxx),
            ("operator", TokenKind::Operator, Cxx),
            ("private", TokenKind::Private, Cxx),
            ("protected", TokenKind::Protected, Cxx),
            ("public", TokenKind::Public, Cxx),
            ("reinterpret_cast", TokenKind::ReinterpretCast, Cxx),
            ("static_cast", TokenKind::StaticCast, Cxx),
            ("template", TokenKind::Template, Cxx),
            ("this", TokenKind::This, Cxx),
            ("throw", TokenKind::Throw, Cxx),
            ("true", TokenKind::True, Cxx),
            ("try", TokenKind::Try, Cxx),
            ("typeid", TokenKind::Typeid, Cxx),
            ("typename", TokenKind::Typename, Cxx),
            ("using", TokenKind::Using, Cxx),
            ("virtual", TokenKind::Virtual, Cxx),
            ("wchar_t", TokenKind::WcharT, Cxx),
            ("and", TokenKind::AmperAmper, Cxx),
            ("and_eq", TokenKind::AmperEqual, Cxx),
            ("bitand", TokenKind::Ampersand, Cxx),
            ("bitor", TokenKind::Pipe, Cxx),
            ("compl", TokenKind::Tilde, Cxx),
            ("not", TokenKind::Exclaim, Cxx),
            ("not_eq", TokenKind::ExclaimEqual, Cxx),
            ("or", TokenKind::PipePipe, Cxx),
            ("or_eq", TokenKind::PipeEqual, Cxx),
            ("xor", TokenKind::Caret, Cxx),
            ("xor_eq", TokenKind::CaretEqual, Cxx),
            ("signals", TokenKind::Signals, Qt),
            ("Q_SIGNALS", TokenKind::Signals, Qt),
            ("slots", TokenKind::Slots, Qt),
            ("Q_SLOTS", TokenKind::Slots, Qt),
            ("SIGNAL", TokenKind::Signal, Qt),
            ("SLOT", TokenKind::Slot, Qt),
            ("Q_SIGNAL", TokenKind::QSignal, Qt),
            ("Q_SLOT", TokenKind::QSlot, Qt),
            ("foreach", TokenKind::QForeach, Qt),
            ("Q_FOREACH", TokenKind::QForeach, Qt),
        ];
        let mut m = hashbrown::HashMap::new();
        for (spelling, kind, set) in entries {
            m.insert(StringId::new(spelling), (*kind, *set));
        }
        m
    })
}

fn objc_keyword_map() -> &'static hashbrown::HashMap<StringId, TokenKind> {
    static KEYWORDS: std::sync::OnceLock<hashbrown::HashMap<StringId, TokenKind>> = std::sync::OnceLock::new();
    KEYWORDS.get_or_init(|| {
        let entries: &[(&str, TokenKind)] = &[
            ("catch", TokenKind::AtCatch),
            ("class", TokenKind::AtClass),
            ("compatibility_alias", TokenKind::AtCompatibilityAlias),
            ("defs", TokenKind::AtDefs),
            ("dynamic", TokenKind::AtDynamic),
            ("encode", TokenKind::AtEncode),
            ("end", TokenKind::AtEnd),
            ("finally", TokenKind::AtFinally),
            ("implementation", TokenKind::AtImplementation),
            ("interface", TokenKind::AtInterface),
            ("optional", TokenKind::AtOptional),
            ("package", TokenKind::AtPackage),
            ("private", TokenKind::AtPrivate),
            ("property", TokenKind::AtProperty),
            ("protected", TokenKind::AtProtected),
            ("protocol", TokenKind::AtProtocol),
            ("public", TokenKind::AtPublic),
            ("required", TokenKind::AtRequired),
            ("selector", TokenKind::AtSelector),
            ("synchronized", TokenKind::AtSynchronized),
            ("synthesize", TokenKind::AtSynthesize),
            ("throw", TokenKind::AtThrow),
            ("try", TokenKind::AtTry),
        ];
        entries.iter().map(|(s, k)| (StringId::new(s), *k)).collect()
    })
}

/// Keyword kind of `spelling` under `features`, if any.
pub fn classify_keyword(spelling: StringId, features: LanguageFeatures) -> Option<TokenKind> {
    let (kind, set) = *keyword_map().get(&spelling)?;
    match set {
        KeywordSet::Common => Some(kind),
        KeywordSet::Cxx if features.cxx() => Some(kind),
        KeywordSet::Qt if features.qt_moc_run() => Some(kind),
        _ => None,
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_ident_continue(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}

/// Lexer state machine over one buffer
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    features: LanguageFeatures,
    at_line_start: bool,
    leading_space: bool,
    scan_keywords: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, features: LanguageFeatures) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            features,
            at_line_start: true,
            leading_space: false,
            scan_keywords: true,
        }
    }

    /// Report every name as `Identifier`. Used for macro bodies and directives.
    pub fn set_scan_keywords(&mut self, scan_keywords: bool) {
        self.scan_keywords = scan_keywords;
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    fn peek(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => {
                    self.pos += 1;
                    self.at_line_start = true;
                    self.leading_space = false;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => {
                    self.pos += 1;
                    self.leading_space = true;
                }
                b'\\' if self.peek(1) == b'\n' => {
                    self.pos += 2;
                    self.leading_space = true;
                }
                b'\\' if self.peek(1) == b'\r' && self.peek(2) == b'\n' => {
                    self.pos += 3;
                    self.leading_space = true;
                }
                b'/' if self.peek(1) == b'/' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        // a backslash continues a line comment onto the next line
                        if self.bytes[self.pos] == b'\\' && self.peek(1) == b'\n' {
                            self.pos += 1;
                        }
                        self.pos += 1;
                    }
                    self.leading_space = true;
                }
                b'/' if self.peek(1) == b'*' => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() && !(self.bytes[self.pos] == b'*' && self.peek(1) == b'/') {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                    self.leading_space = true;
                }
                _ => break,
            }
        }
    }

    fn make_token(&mut self, kind: TokenKind, start: usize) -> Token {
        let mut flags = TokenFlags::empty();
        if self.at_line_start {
            flags |= TokenFlags::AT_LINE_START;
        }
        if self.leading_space {
            flags |= TokenFlags::LEADING_SPACE;
        }
        self.at_line_start = false;
        self.leading_space = false;
        let text = StringId::new(&self.source[start..self.pos]);
        Token::new(kind, flags, start as u32, (self.pos - start) as u32, text)
    }

    fn scan_quoted(&mut self, quote: u8) {
        // opening quote already consumed
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'\n' => return,
                c if c == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_number(&mut self) {
        // pp-number: digits, letters, '.', and exponent signs
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if (c == b'+' || c == b'-') && matches!(self.bytes[self.pos - 1], b'e' | b'E' | b'p' | b'P') {
                self.pos += 1;
            } else if is_ident_continue(c) || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_identifier(&mut self) {
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn advance_char(&mut self) {
        // keep `pos` on a char boundary for non-ascii input
        let width = self.source[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.pos += width;
    }

    /// Scan the next token. Returns `EndOfFile` forever once the buffer is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        if self.pos >= self.bytes.len() {
            return self.make_token(TokenKind::EndOfFile, start);
        }

        let c = self.bytes[self.pos];
        self.pos += 1;

        let kind = match c {
            b'"' => {
                self.scan_quoted(b'"');
                TokenKind::StringLiteral
            }
            b'\'' => {
                self.scan_quoted(b'\'');
                TokenKind::CharLiteral
            }
            b'L' if self.peek(0) == b'"' => {
                self.pos += 1;
                self.scan_quoted(b'"');
                TokenKind::WideStringLiteral
            }
            b'L' if self.peek(0) == b'\'' => {
                self.pos += 1;
                self.scan_quoted(b'\'');
                TokenKind::WideCharLiteral
            }
            b'0'..=b'9' => {
                self.scan_number();
                TokenKind::NumericLiteral
            }
            b'.' if self.peek(0).is_ascii_digit() => {
                self.scan_number();
                TokenKind::NumericLiteral
            }
            c if is_ident_start(c) => {
                self.pos -= 1;
                if c >= 0x80 {
                    self.advance_char();
                }
                self.scan_identifier();
                let text = StringId::new(&self.source[start..self.pos]);
                if self.scan_keywords {
                    classify_keyword(text, self.features).unwrap_or(TokenKind::Identifier)
                } else {
                    TokenKind::Identifier
                }
            }
            b'@' if self.features.objc() => self.scan_objc_at(),
            _ => self.scan_punctuator(c),
        };

        self.make_token(kind, start)
    }

    fn scan_objc_at(&mut self) -> TokenKind {
        if self.peek(0) == b'"' {
            self.pos += 1;
            self.scan_quoted(b'"');
            return TokenKind::AtStringLiteral;
        }
        if is_ident_start(self.peek(0)) {
            let name_start = self.pos;
            self.scan_identifier();
            let name = StringId::new(&self.source[name_start..self.pos]);
            if let Some(kind) = objc_keyword_map().get(&name) {
                return *kind;
            }
            // not an @ keyword, leave the identifier for the next token
            self.pos = name_start;
        }
        TokenKind::At
    }

    fn scan_punctuator(&mut self, c: u8) -> TokenKind {
        let next = self.peek(0);
        let after = self.peek(1);
        let mut take = |n: usize, kind: TokenKind| {
            self.pos += n;
            kind
        };
        match c {
            b'&' => match next {
                b'&' => take(1, TokenKind::AmperAmper),
                b'=' => take(1, TokenKind::AmperEqual),
                _ => TokenKind::Ampersand,
            },
            b'-' => match next {
                b'>' if after == b'*' => take(2, TokenKind::ArrowStar),
                b'>' => take(1, TokenKind::Arrow),
                b'-' => take(1, TokenKind::MinusMinus),
                b'=' => take(1, TokenKind::MinusEqual),
                _ => TokenKind::Minus,
            },
            b'^' => match next {
                b'=' => take(1, TokenKind::CaretEqual),
                _ => TokenKind::Caret,
            },
            b':' => match next {
                b':' => take(1, TokenKind::ColonColon),
                _ => TokenKind::Colon,
            },
            b',' => TokenKind::Comma,
            b'/' => match next {
                b'=' => take(1, TokenKind::SlashEqual),
                _ => TokenKind::Slash,
            },
            b'.' => match next {
                b'.' if after == b'.' => take(2, TokenKind::DotDotDot),
                b'*' => take(1, TokenKind::DotStar),
                _ => TokenKind::Dot,
            },
            b'=' => match next {
                b'=' => take(1, TokenKind::EqualEqual),
                _ => TokenKind::Equal,
            },
            b'!' => match next {
                b'=' => take(1, TokenKind::ExclaimEqual),
                _ => TokenKind::Exclaim,
            },
            b'>' => match next {
                b'>' if after == b'=' => take(2, TokenKind::GreaterGreaterEqual),
                b'>' => take(1, TokenKind::GreaterGreater),
                b'=' => take(1, TokenKind::GreaterEqual),
                _ => TokenKind::Greater,
            },
            b'<' => match next {
                b'<' if after == b'=' => take(2, TokenKind::LessLessEqual),
                b'<' => take(1, TokenKind::LessLess),
                b'=' => take(1, TokenKind::LessEqual),
                _ => TokenKind::Less,
            },
            b'%' => match next {
                b'=' => take(1, TokenKind::PercentEqual),
                _ => TokenKind::Percent,
            },
            b'|' => match next {
                b'|' => take(1, TokenKind::PipePipe),
                b'=' => take(1, TokenKind::PipeEqual),
                _ => TokenKind::Pipe,
            },
            b'+' => match next {
                b'+' => take(1, TokenKind::PlusPlus),
                b'=' => take(1, TokenKind::PlusEqual),
                _ => TokenKind::Plus,
            },
            b'#' => match next {
                b'#' => take(1, TokenKind::PoundPound),
                _ => TokenKind::Pound,
            },
            b'*' => match next {
                b'=' => take(1, TokenKind::StarEqual),
                _ => TokenKind::Star,
            },
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b';' => TokenKind::Semicolon,
            b'?' => TokenKind::Question,
            b'~' => TokenKind::Tilde,
            b'@' => TokenKind::At,
            _ => {
                self.pos -= 1;
                self.advance_char();
                TokenKind::Error
            }
        }
    }

    /// Scan the rest of the buffer, including the final `EndOfFile` token.
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

/// Tokenize `source`; the result always ends with `EndOfFile`.
pub fn tokenize(source: &str, features: LanguageFeatures) -> Vec<Token> {
    Lexer::new(source, features).tokenize_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, LanguageFeatures::default())
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_alternative_tokens() {
        assert_eq!(
            kinds("class X and __const__ signals"),
            vec![
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::AmperAmper,
                TokenKind::Const,
                TokenKind::Signals,
                TokenKind::EndOfFile
            ]
        );
        let plain = tokenize("class signals", LanguageFeatures::empty());
        assert_eq!(plain[0].kind, TokenKind::Identifier);
        assert_eq!(plain[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_punctuators_longest_match() {
        assert_eq!(
            kinds("->* >>= ... :: <<"),
            vec![
                TokenKind::ArrowStar,
                TokenKind::GreaterGreaterEqual,
                TokenKind::DotDotDot,
                TokenKind::ColonColon,
                TokenKind::LessLess,
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn test_literals_and_comments() {
        let tokens = tokenize("x = \"a,b\" /* c */ + L'q' // tail\n 1.5e+3f", LanguageFeatures::default());
        let spelled: Vec<(&TokenKind, &str)> = tokens.iter().map(|t| (&t.kind, t.spell())).collect();
        assert_eq!(
            spelled,
            vec![
                (&TokenKind::Identifier, "x"),
                (&TokenKind::Equal, "="),
                (&TokenKind::StringLiteral, "\"a,b\""),
                (&TokenKind::Plus, "+"),
                (&TokenKind::WideCharLiteral, "L'q'"),
                (&TokenKind::NumericLiteral, "1.5e+3f"),
                (&TokenKind::EndOfFile, ""),
            ]
        );
        assert!(tokens[5].at_line_start());
        assert!(tokens[3].has_leading_space());
    }

    #[test]
    fn test_objc_at_keywords() {
        assert_eq!(
            kinds("@interface @end @\"s\" @foo"),
            vec![
                TokenKind::AtInterface,
                TokenKind::AtEnd,
                TokenKind::AtStringLiteral,
                TokenKind::At,
                TokenKind::Identifier,
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn test_line_splice_is_whitespace() {
        let tokens = tokenize("#define A \\\n 1\nB", LanguageFeatures::default());
        assert!(tokens[0].at_line_start());
        assert!(!tokens[3].at_line_start());
        assert!(tokens[4].at_line_start());
    }
}
