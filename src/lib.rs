//! A front end for C++ family sources.
//!
//! Raw text is preprocessed ([`pp`]), tokenized ([`lexer`]) and parsed
//! ([`parser`]) into an arena-owned AST ([`ast`]). The semantic pass
//! ([`semantic`]) populates scopes with symbols and types, and the namespace
//! binder merges namespace fragments. [`translation_unit::TranslationUnit`]
//! ties the stages together for one buffer.

/// Contains the typed arena used by the AST and the symbol tables.
pub mod arena;
pub mod ast;
/// Contains diagnostics and the error types reported through them.
pub mod diagnostic;
pub mod lang_options;
pub mod lexer;
pub mod parser;
/// Contains the macro preprocessor.
pub mod pp;
/// Contains symbols, scopes, types and the semantic checkers.
pub mod semantic;
pub mod source_manager;
pub mod translation_unit;

#[cfg(test)]
mod tests;

pub use symbol_table::GlobalSymbol as StringId;
