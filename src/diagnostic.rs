use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticLevel {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single message attached to a file position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub file_name: String,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, file_name: impl Into<String>, line: u32, column: u32, text: impl Into<String>) -> Self {
        Diagnostic {
            level,
            file_name: file_name.into(),
            line,
            column,
            text: text.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == DiagnosticLevel::Warning
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }

    pub fn is_fatal(&self) -> bool {
        self.level == DiagnosticLevel::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file_name, self.line, self.column, self.level, self.text
        )
    }
}

/// Parse errors. The display text is the reported message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected token `{expected}' got `{found}'")]
    ExpectedToken { expected: String, found: String },

    #[error("unexpected token `{0}'")]
    UnexpectedToken(String),

    #[error("skip stray token `{0}'")]
    StrayToken(String),

    #[error("skip token `{0}'")]
    SkipToken(String),

    #[error("skip identifier `{0}'")]
    SkipIdentifier(String),

    #[error("expected `namespace name' before `{0}'")]
    ExpectedNamespaceName(String),

    #[error("expected identifier before `{0}'")]
    ExpectedIdentifier(String),

    #[error("expected `{{' before `{0}'")]
    ExpectedLeftBrace(String),

    #[error("expected unqualified-id before token `{0}'")]
    ExpectedUnqualifiedId(String),

    #[error("expected a function declarator before token `{0}'")]
    ExpectedFunctionDeclarator(String),

    #[error("expected class-name")]
    ExpectedClassName,

    #[error("expected statement")]
    ExpectedStatement,

    #[error("expected an elaborated type specifier")]
    ExpectedElaboratedTypeSpecifier,

    #[error("expected an enum specifier")]
    ExpectedEnumSpecifier,

    #[error("wrong type specifier")]
    WrongTypeSpecifier,

    #[error("unexpected attributes")]
    UnexpectedAttributes,

    #[error("invalid attributes for category interface declaration")]
    InvalidCategoryAttributes,

    #[error("expected a selector")]
    ExpectedSelector,

    #[error("too deeply nested")]
    TooDeeplyNested,
}

/// Errors found while populating symbol tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("expected a function declaration")]
    ExpectedFunctionDeclaration,

    #[error("expected a function prototype")]
    ExpectedFunctionPrototype,

    #[error("only constructors take base initializers")]
    OnlyConstructorsTakeBaseInitializers,

    #[error("using-directive not within namespace or block scope")]
    UsingDirectiveScope,

    #[error("expected namespace-name")]
    ExpectedNamespaceName,

    #[error("anonymous argument")]
    AnonymousArgument,
}

/// Accumulates diagnostics for one translation unit or document.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
    blocked: bool,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress (or re-enable) reporting. Returns the previous setting.
    pub fn block_errors(&mut self, block: bool) -> bool {
        std::mem::replace(&mut self.blocked, block)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.blocked {
            return;
        }
        log::debug!("diagnostic: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn report_at(&mut self, level: DiagnosticLevel, file_name: &str, line: u32, column: u32, text: impl Into<String>) {
        self.report(Diagnostic::new(level, file_name, line, column, text));
    }

    pub fn report_parse_error(&mut self, error: ParseError, file_name: &str, line: u32, column: u32) {
        self.report_at(DiagnosticLevel::Error, file_name, line, column, error.to_string());
    }

    pub fn report_semantic_error(&mut self, error: SemanticError, file_name: &str, line: u32, column: u32) {
        self.report_at(DiagnosticLevel::Error, file_name, line, column, error.to_string());
    }

    pub fn report_semantic_warning(&mut self, warning: SemanticError, file_name: &str, line: u32, column: u32) {
        self.report_at(DiagnosticLevel::Warning, file_name, line, column, warning.to_string());
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drop every diagnostic recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error | DiagnosticLevel::Fatal))
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_warning()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_engine_drops_reports() {
        let mut diag = DiagnosticEngine::new();
        let previous = diag.block_errors(true);
        assert!(!previous);
        diag.report_parse_error(ParseError::ExpectedStatement, "a.cpp", 1, 1);
        assert!(diag.is_empty());
        diag.block_errors(previous);
        diag.report_parse_error(ParseError::UnexpectedToken("}".into()), "a.cpp", 2, 3);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.diagnostics[0].to_string(), "a.cpp:2:3: error: unexpected token `}'");
    }

    #[test]
    fn test_counts() {
        let mut diag = DiagnosticEngine::new();
        diag.report_semantic_warning(SemanticError::ExpectedFunctionDeclaration, "x.h", 1, 0);
        diag.report_semantic_error(SemanticError::ExpectedNamespaceName, "x.h", 2, 0);
        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
        diag.truncate(1);
        assert!(!diag.has_errors());
    }
}
