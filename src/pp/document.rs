//! Per-file results of a preprocessing run.

use crate::diagnostic::Diagnostic;
use crate::pp::client::{IncludeType, MacroArgumentReference};
use crate::pp::macros::{Macro, MacroSummary};
use indexmap::IndexMap;
use serde::Serialize;

/// Half-open byte range `[begin, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CharBlock {
    pub begin: u32,
    pub end: u32,
}

impl CharBlock {
    pub fn new(begin: u32, end: u32) -> Self {
        CharBlock { begin, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.begin <= offset && offset < self.end
    }
}

/// One expansion of a macro in the source of a document
#[derive(Debug, Clone, PartialEq)]
pub struct MacroUse {
    pub macro_def: Macro,
    pub block: CharBlock,
    pub arguments: Vec<CharBlock>,
}

/// An `#include` line of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Include {
    /// Key of the included document in the [`DocumentTree`]
    pub file_name: String,
    pub include_type: IncludeType,
    pub line: u32,
}

/// Preprocessing results for one file
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub file_name: String,
    /// Preprocessed text
    pub source: String,
    pub defined_macros: Vec<Macro>,
    pub macro_uses: Vec<MacroUse>,
    pub includes: Vec<Include>,
    pub skipped_blocks: Vec<CharBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn new(file_name: impl Into<String>) -> Self {
        Document {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn append_macro(&mut self, m: &Macro) {
        self.defined_macros.push(m.clone());
    }

    pub(crate) fn add_macro_use(&mut self, m: &Macro, offset: u32, length: u32, actuals: &[MacroArgumentReference]) {
        let arguments = actuals
            .iter()
            .map(|actual| CharBlock::new(actual.position, actual.position + actual.length))
            .collect();
        self.macro_uses.push(MacroUse {
            macro_def: m.clone(),
            block: CharBlock::new(offset, offset + length),
            arguments,
        });
    }

    pub(crate) fn add_include(&mut self, file_name: &str, include_type: IncludeType, line: u32) {
        self.includes.push(Include {
            file_name: file_name.to_string(),
            include_type,
            line,
        });
    }

    pub(crate) fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn start_skipping_blocks(&mut self, offset: u32) {
        self.skipped_blocks.push(CharBlock::new(offset, offset));
    }

    pub(crate) fn stop_skipping_blocks(&mut self, offset: u32) {
        let Some(last) = self.skipped_blocks.last_mut() else {
            return;
        };
        if last.begin > offset {
            self.skipped_blocks.pop();
        } else {
            last.end = offset;
        }
    }

    /// Whether `offset` lies inside a block excluded by conditional compilation
    pub fn is_skipped(&self, offset: u32) -> bool {
        self.skipped_blocks.iter().any(|block| block.contains(offset))
    }

    /// The macro use covering `offset`, if any
    pub fn macro_use_at(&self, offset: u32) -> Option<&MacroUse> {
        self.macro_uses.iter().find(|u| u.block.contains(offset))
    }
}

/// Every document produced by one recursive run, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    pub root: String,
    pub documents: IndexMap<String, Document>,
}

impl DocumentTree {
    pub fn root_document(&self) -> Option<&Document> {
        self.documents.get(&self.root)
    }

    pub fn document(&self, file_name: &str) -> Option<&Document> {
        self.documents.get(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.documents.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents directly included by `file_name`, in include order
    pub fn included_documents<'a>(&'a self, file_name: &str) -> impl Iterator<Item = &'a Document> + 'a {
        let includes = self
            .documents
            .get(file_name)
            .map(|doc| doc.includes.as_slice())
            .unwrap_or_default();
        includes.iter().filter_map(|include| self.documents.get(&include.file_name))
    }

    /// Macros defined by `file_name` and, transitively, by the files it includes.
    pub fn macros_visible_from(&self, file_name: &str) -> Vec<&Macro> {
        let mut visited = hashbrown::HashSet::new();
        let mut macros = Vec::new();
        self.collect_macros(file_name, &mut visited, &mut macros);
        macros
    }

    fn collect_macros<'a>(&'a self, file_name: &str, visited: &mut hashbrown::HashSet<String>, macros: &mut Vec<&'a Macro>) {
        if !visited.insert(file_name.to_string()) {
            return;
        }
        let Some(doc) = self.documents.get(file_name) else {
            return;
        };
        for include in &doc.includes {
            self.collect_macros(&include.file_name, visited, macros);
        }
        macros.extend(doc.defined_macros.iter());
    }

    /// Serializable overview of the tree for snapshots and debugging.
    pub fn summary(&self) -> Vec<DocumentSummary> {
        self.documents.values().map(DocumentSummary::from).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub includes: Vec<Include>,
    pub macros: Vec<MacroSummary>,
    pub macro_uses: Vec<(String, CharBlock)>,
    pub skipped_blocks: Vec<CharBlock>,
    pub diagnostics: Vec<String>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        DocumentSummary {
            file_name: doc.file_name.clone(),
            includes: doc.includes.clone(),
            macros: doc.defined_macros.iter().map(MacroSummary::from).collect(),
            macro_uses: doc
                .macro_uses
                .iter()
                .map(|u| (u.macro_def.name.as_str().to_string(), u.block))
                .collect(),
            skipped_blocks: doc.skipped_blocks.clone(),
            diagnostics: doc.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_before_start_drops_block() {
        let mut doc = Document::new("a.cpp");
        doc.start_skipping_blocks(10);
        doc.stop_skipping_blocks(20);
        doc.start_skipping_blocks(30);
        doc.stop_skipping_blocks(25);
        assert_eq!(doc.skipped_blocks, vec![CharBlock::new(10, 20)]);
        assert!(doc.is_skipped(15));
        assert!(!doc.is_skipped(20));
    }
}
