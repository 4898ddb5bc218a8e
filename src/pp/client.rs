use crate::diagnostic::Diagnostic;
use crate::pp::macros::Macro;
use serde::Serialize;

/// Position and length of one actual macro argument in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MacroArgumentReference {
    pub position: u32,
    pub length: u32,
}

impl MacroArgumentReference {
    pub fn new(position: u32, length: u32) -> Self {
        MacroArgumentReference { position, length }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IncludeType {
    /// `#include "file"`
    Local,
    /// `#include <file>`
    Global,
}

/// One `#include`, `#include_next` or `#import` request.
///
/// `#import` arrives as a plain include; [`CppPreprocessor`](crate::pp::CppPreprocessor)
/// enters every file at most once per run, which covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    pub file_name: String,
    pub include_type: IncludeType,
    pub line: u32,
    pub next: bool,
}

/// Content handed back for an include the client decided to enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedSource {
    /// Resolved path, becomes `__FILE__` while the include is processed
    pub file_name: String,
    pub contents: String,
}

/// What the preprocessor does with an include request
#[derive(Debug, Clone, PartialEq)]
pub enum IncludeAction {
    /// Nothing to read: missing, already included, or not followed
    Skip,
    /// Process the contents, then report back through `source_processed`
    Enter(IncludedSource),
    /// The file was processed by an earlier run; bind copies of its macros
    MergeMacros(Vec<Macro>),
}

/// Receives preprocessing events.
///
/// `source_needed` decides whether an include is entered. For
/// [`IncludeAction::Enter`] the preprocessor processes the contents and then
/// calls `source_processed` with the same file name and the resulting text.
pub trait Client {
    fn macro_added(&mut self, m: &Macro);

    fn source_needed(&mut self, request: &IncludeRequest) -> IncludeAction;

    fn source_processed(&mut self, file_name: &str, output: &str);

    fn start_expanding_macro(
        &mut self,
        offset: u32,
        m: &Macro,
        original_text: &str,
        actuals: &[MacroArgumentReference],
    );

    fn stop_expanding_macro(&mut self, offset: u32, m: &Macro);

    fn start_skipping_blocks(&mut self, offset: u32);

    fn stop_skipping_blocks(&mut self, offset: u32);

    /// Directive errors and include warnings.
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Client that ignores every event and never enters includes.
#[derive(Debug, Default)]
pub struct NullClient;

impl Client for NullClient {
    fn macro_added(&mut self, _m: &Macro) {}

    fn source_needed(&mut self, _request: &IncludeRequest) -> IncludeAction {
        IncludeAction::Skip
    }

    fn source_processed(&mut self, _file_name: &str, _output: &str) {}

    fn start_expanding_macro(&mut self, _: u32, _: &Macro, _: &str, _: &[MacroArgumentReference]) {}

    fn stop_expanding_macro(&mut self, _: u32, _: &Macro) {}

    fn start_skipping_blocks(&mut self, _: u32) {}

    fn stop_skipping_blocks(&mut self, _: u32) {}
}
