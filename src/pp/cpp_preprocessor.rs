//! Document-building driver on top of [`Preprocessor`].
//!
//! The driver resolves includes against the configured search paths, records
//! one [`Document`] per file it meets, and hands the results back as a
//! [`DocumentTree`].

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use crate::lang_options::LanguageFeatures;
use crate::pp::client::{Client, IncludeAction, IncludeRequest, IncludeType, IncludedSource, MacroArgumentReference};
use crate::pp::document::{Document, DocumentTree};
use crate::pp::header_search::{CONFIGURATION_FILE, FoundHeader, HeaderSearch, SearchLocation};
use crate::pp::macros::{Environment, Macro};
use crate::pp::preprocessor::{PPConfig, Preprocessor};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Reads source files for the driver.
pub trait SourceProvider {
    fn read(&self, path: &str) -> Option<String>;
}

/// Reads from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read(&self, path: &str) -> Option<String> {
        let path = Path::new(path);
        if !path.is_file() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Serves files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: IndexMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl SourceProvider for MemoryProvider {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Sources used while resolving includes
struct Sources<'a> {
    provider: &'a dyn SourceProvider,
    working_copy: &'a IndexMap<String, String>,
    configuration: &'a str,
}

impl Sources<'_> {
    fn read(&self, path: &str) -> Option<String> {
        if path == CONFIGURATION_FILE {
            return Some(self.configuration.to_string());
        }
        if let Some(contents) = self.working_copy.get(path) {
            return Some(contents.clone());
        }
        self.provider.read(path)
    }
}

/// Client that records preprocessing events into documents
struct DocumentBuilder<'a> {
    sources: Sources<'a>,
    header_search: &'a HeaderSearch,
    snapshot: &'a DocumentTree,
    documents: IndexMap<String, Document>,
    /// Files whose contents were already handed out during this run
    included: HashSet<String>,
    /// Search location each file was found at, for `#include_next`
    locations: HashMap<String, SearchLocation>,
    /// Documents being processed, innermost last
    stack: Vec<String>,
}

impl<'a> DocumentBuilder<'a> {
    fn current_document(&mut self) -> Option<&mut Document> {
        let name = self.stack.last()?;
        self.documents.get_mut(name)
    }

    fn document_entry(&mut self, file_name: &str) -> &mut Document {
        self.documents
            .entry(file_name.to_string())
            .or_insert_with(|| Document::new(file_name))
    }

    fn warn_current(&mut self, line: u32, text: String) {
        let Some(doc) = self.current_document() else {
            return;
        };
        let diagnostic = Diagnostic::new(DiagnosticLevel::Warning, doc.file_name.clone(), line, 0, text);
        doc.add_diagnostic(diagnostic);
    }

    fn resolve(&self, request: &IncludeRequest) -> Option<FoundHeader> {
        let sources = &self.sources;
        let included = &self.included;
        // a file that was already handed out resolves with no contents
        let mut read = |path: &str| {
            if included.contains(path) {
                Some(String::new())
            } else {
                sources.read(path)
            }
        };
        let current = self.stack.last().map(String::as_str);
        if request.next {
            let after = current
                .and_then(|file| self.locations.get(file))
                .copied()
                .unwrap_or(SearchLocation::Direct);
            self.header_search
                .resolve_next_path(&request.file_name, after, &mut read)
        } else {
            self.header_search
                .resolve_path(&request.file_name, request.include_type, current, &mut read)
        }
    }

    /// Copy documents of an earlier run reachable from `file_name` into this run.
    fn reuse_snapshot(&mut self, file_name: &str) -> Vec<Macro> {
        let macros: Vec<Macro> = self
            .snapshot
            .macros_visible_from(file_name)
            .into_iter()
            .cloned()
            .collect();
        let mut pending = vec![file_name.to_string()];
        while let Some(name) = pending.pop() {
            if self.documents.contains_key(&name) && name != file_name {
                continue;
            }
            if let Some(doc) = self.snapshot.document(&name) {
                pending.extend(doc.includes.iter().map(|include| include.file_name.clone()));
                self.included.insert(name.clone());
                self.documents.insert(name, doc.clone());
            }
        }
        macros
    }
}

impl Client for DocumentBuilder<'_> {
    fn macro_added(&mut self, m: &Macro) {
        if let Some(doc) = self.current_document() {
            doc.append_macro(m);
        }
    }

    fn source_needed(&mut self, request: &IncludeRequest) -> IncludeAction {
        let found = self.resolve(request);

        let Some(found) = found else {
            log::debug!("{}: not found", request.file_name);
            let name = &request.file_name;
            if let Some(doc) = self.current_document() {
                doc.add_include(name, request.include_type, request.line);
            }
            self.document_entry(name);
            self.warn_current(request.line, format!("{}: No such file or directory", name));
            return IncludeAction::Skip;
        };

        if let Some(doc) = self.current_document() {
            doc.add_include(&found.path, request.include_type, request.line);
        }

        if self.included.contains(&found.path) {
            log::trace!("{}: already included", found.path);
            self.document_entry(&found.path);
            return IncludeAction::Skip;
        }

        if found.is_global_fallback(request.include_type) {
            let text = format!(
                "{}: is included as a local include but was only found in the global include path.",
                found.path
            );
            self.warn_current(request.line, text);
        }

        if self.snapshot.contains(&found.path) {
            log::debug!("{}: reuse from snapshot", found.path);
            return IncludeAction::MergeMacros(self.reuse_snapshot(&found.path));
        }

        self.included.insert(found.path.clone());
        self.locations.insert(found.path.clone(), found.location);
        self.document_entry(&found.path);
        self.stack.push(found.path.clone());
        IncludeAction::Enter(IncludedSource {
            file_name: found.path,
            contents: found.contents,
        })
    }

    fn source_processed(&mut self, file_name: &str, output: &str) {
        self.document_entry(file_name).source = output.to_string();
        if self.stack.last().is_some_and(|name| name == file_name) {
            self.stack.pop();
        }
    }

    fn start_expanding_macro(&mut self, offset: u32, m: &Macro, original_text: &str, actuals: &[MacroArgumentReference]) {
        if let Some(doc) = self.current_document() {
            doc.add_macro_use(m, offset, original_text.len() as u32, actuals);
        }
    }

    fn stop_expanding_macro(&mut self, _offset: u32, _m: &Macro) {}

    fn start_skipping_blocks(&mut self, offset: u32) {
        if let Some(doc) = self.current_document() {
            doc.start_skipping_blocks(offset);
        }
    }

    fn stop_skipping_blocks(&mut self, offset: u32) {
        if let Some(doc) = self.current_document() {
            doc.stop_skipping_blocks(offset);
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(doc) = self.current_document() {
            doc.add_diagnostic(diagnostic);
        }
    }
}

/// Preprocesses a file and every file it includes into a [`DocumentTree`].
pub struct CppPreprocessor<P: SourceProvider = FileSystemProvider> {
    provider: P,
    header_search: HeaderSearch,
    configuration: String,
    working_copy: IndexMap<String, String>,
    snapshot: DocumentTree,
    features: LanguageFeatures,
    max_include_depth: usize,
    env: Environment,
}

impl CppPreprocessor<FileSystemProvider> {
    pub fn new(config: PPConfig) -> Self {
        Self::with_provider(config, FileSystemProvider)
    }
}

impl<P: SourceProvider> CppPreprocessor<P> {
    pub fn with_provider(config: PPConfig, provider: P) -> Self {
        CppPreprocessor {
            provider,
            header_search: HeaderSearch::new(config.local_include_paths, config.global_include_paths),
            configuration: config.configuration,
            working_copy: IndexMap::new(),
            snapshot: DocumentTree::default(),
            features: config.features,
            max_include_depth: config.max_include_depth,
            env: Environment::new(),
        }
    }

    pub fn set_local_include_paths(&mut self, paths: Vec<PathBuf>) {
        self.header_search.local_paths = paths;
    }

    pub fn set_global_include_paths(&mut self, paths: Vec<PathBuf>) {
        self.header_search.global_paths = paths;
    }

    pub fn set_configuration(&mut self, configuration: impl Into<String>) {
        self.configuration = configuration.into();
    }

    /// In-memory file contents that take precedence over the provider.
    pub fn set_working_copy(&mut self, working_copy: IndexMap<String, String>) {
        self.working_copy = working_copy;
    }

    pub fn add_working_copy_file(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.working_copy.insert(path.into(), contents.into());
    }

    /// Documents of an earlier run. Headers found there are not read again.
    pub fn set_snapshot(&mut self, snapshot: DocumentTree) {
        self.snapshot = snapshot;
    }

    /// Macro environment left by the last run
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Preprocess `file_name` and every file it includes.
    pub fn run(&mut self, file_name: &str) -> DocumentTree {
        self.env = Environment::new();
        if !self.configuration.is_empty() {
            self.run_configuration();
        }

        let sources = Sources {
            provider: &self.provider,
            working_copy: &self.working_copy,
            configuration: &self.configuration,
        };
        let contents = sources.read(file_name);
        let mut builder = DocumentBuilder {
            sources,
            header_search: &self.header_search,
            snapshot: &self.snapshot,
            documents: IndexMap::new(),
            included: HashSet::new(),
            locations: HashMap::new(),
            stack: vec![file_name.to_string()],
        };
        builder.document_entry(file_name);

        match contents {
            Some(contents) => {
                builder.included.insert(file_name.to_string());
                let result = Preprocessor::new(&mut builder, &mut self.env)
                    .with_features(self.features)
                    .with_max_include_depth(self.max_include_depth)
                    .run(file_name, &contents);
                match result {
                    Ok(output) => builder.document_entry(file_name).source = output,
                    Err(error) => {
                        let diagnostic =
                            Diagnostic::new(DiagnosticLevel::Fatal, file_name, self.env.current_line, 0, error.to_string());
                        builder.document_entry(file_name).add_diagnostic(diagnostic);
                    }
                }
            }
            None => {
                builder.warn_current(0, format!("{}: No such file or directory", file_name));
            }
        }

        DocumentTree {
            root: file_name.to_string(),
            documents: builder.documents,
        }
    }

    /// Preprocessed text of `file_name` alone.
    pub fn preprocess(&mut self, file_name: &str) -> String {
        let mut tree = self.run(file_name);
        tree.documents
            .swap_remove(file_name)
            .map(|doc| doc.source)
            .unwrap_or_default()
    }

    /// Bind the macros of the configuration text before the main file.
    fn run_configuration(&mut self) {
        let mut client = crate::pp::client::NullClient;
        let result = Preprocessor::new(&mut client, &mut self.env)
            .with_features(self.features)
            .run(CONFIGURATION_FILE, &self.configuration);
        if let Err(error) = result {
            log::warn!("{}: {}", CONFIGURATION_FILE, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(files: &[(&str, &str)]) -> CppPreprocessor<MemoryProvider> {
        let mut provider = MemoryProvider::new();
        for (path, contents) in files {
            provider.add_file(*path, *contents);
        }
        let config = PPConfig {
            global_include_paths: vec![PathBuf::from("/usr/include")],
            ..Default::default()
        };
        CppPreprocessor::with_provider(config, provider)
    }

    #[test]
    fn test_missing_include_warns_once() {
        let mut pp = driver(&[("/src/main.cpp", "#include \"missing.h\"\nint x;\n")]);
        let tree = pp.run("/src/main.cpp");
        let root = tree.root_document().map(|d| (d.source.clone(), d.diagnostics.clone()));
        let Some((source, diagnostics)) = root else {
            panic!("root document missing");
        };
        assert_eq!(source, "\nint x;\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_warning());
        assert!(diagnostics[0].text.contains("missing.h"));
        assert_eq!(tree.document("missing.h").map(|d| d.source.as_str()), Some(""));
    }

    #[test]
    fn test_macros_from_headers_apply() {
        let mut pp = driver(&[
            ("/src/main.cpp", "#include \"config.h\"\nint v = VALUE;\n#include <config.h>\n"),
            ("/src/config.h", "#define VALUE 42\n"),
        ]);
        let tree = pp.run("/src/main.cpp");
        let root = tree.root_document().map(|d| d.source.clone()).unwrap_or_default();
        assert_eq!(root, "\nint v = 42;\n\n");
        let header = tree.document("/src/config.h").map(|d| d.defined_macros.len());
        assert_eq!(header, Some(1));
        // the second include finds nothing through the global paths
        assert_eq!(tree.root_document().map(|d| d.includes.len()), Some(2));
    }

    #[test]
    fn test_configuration_macros() {
        let mut pp = driver(&[("/a.cpp", "#ifdef CONFIGURED\nyes\n#endif\n")]);
        pp.set_configuration("#define CONFIGURED 1\n");
        assert_eq!(pp.preprocess("/a.cpp"), "\nyes\n\n");
    }
}
