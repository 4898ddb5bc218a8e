//! Common utilities for preprocessor tests.
use crate::diagnostic::Diagnostic;
use crate::pp::{
    Client, CppPreprocessor, Environment, IncludeAction, IncludeRequest, IncludedSource, Macro, MacroArgumentReference,
    MemoryProvider, NullClient, PPConfig, Preprocessor,
};
use std::path::PathBuf;

pub fn preprocess(source: &str) -> String {
    let _ = env_logger::try_init();
    let mut client = NullClient;
    let mut env = Environment::new();
    let mut pp = Preprocessor::new(&mut client, &mut env);
    match pp.run("test.cpp", source) {
        Ok(output) => output,
        Err(e) => panic!("preprocessing failed: {}", e),
    }
}

/// One client callback, in the order it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MacroAdded(String),
    StartExpanding {
        offset: u32,
        name: String,
        text: String,
        actuals: Vec<MacroArgumentReference>,
    },
    StopExpanding(u32, String),
    StartSkipping(u32),
    StopSkipping(u32),
    Include(String),
    Processed(String),
}

/// Client that records every callback.
#[derive(Debug, Default)]
pub struct Recording {
    pub events: Vec<Event>,
    pub diagnostics: Vec<Diagnostic>,
    /// Served for include requests by file name
    pub headers: Vec<(String, String)>,
}

impl Recording {
    pub fn skipped(&self) -> Vec<(u32, u32)> {
        let mut blocks = Vec::new();
        let mut start = None;
        for event in &self.events {
            match *event {
                Event::StartSkipping(offset) => start = Some(offset),
                Event::StopSkipping(offset) => {
                    if let Some(begin) = start.take() {
                        blocks.push((begin, offset));
                    }
                }
                _ => {}
            }
        }
        blocks
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.to_string()).collect()
    }
}

impl Client for Recording {
    fn macro_added(&mut self, m: &Macro) {
        self.events.push(Event::MacroAdded(m.signature()));
    }

    fn source_needed(&mut self, request: &IncludeRequest) -> IncludeAction {
        self.events.push(Event::Include(request.file_name.clone()));
        match self.headers.iter().find(|(name, _)| *name == request.file_name) {
            Some((name, contents)) => IncludeAction::Enter(IncludedSource {
                file_name: name.clone(),
                contents: contents.clone(),
            }),
            None => IncludeAction::Skip,
        }
    }

    fn source_processed(&mut self, file_name: &str, _output: &str) {
        self.events.push(Event::Processed(file_name.to_string()));
    }

    fn start_expanding_macro(&mut self, offset: u32, m: &Macro, original_text: &str, actuals: &[MacroArgumentReference]) {
        self.events.push(Event::StartExpanding {
            offset,
            name: m.name.as_str().to_string(),
            text: original_text.to_string(),
            actuals: actuals.to_vec(),
        });
    }

    fn stop_expanding_macro(&mut self, offset: u32, m: &Macro) {
        self.events.push(Event::StopExpanding(offset, m.name.as_str().to_string()));
    }

    fn start_skipping_blocks(&mut self, offset: u32) {
        self.events.push(Event::StartSkipping(offset));
    }

    fn stop_skipping_blocks(&mut self, offset: u32) {
        self.events.push(Event::StopSkipping(offset));
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Run `source` through a recording client, returning the output with the client.
pub fn record(source: &str) -> (String, Recording) {
    record_with_headers(source, &[])
}

pub fn record_with_headers(source: &str, headers: &[(&str, &str)]) -> (String, Recording) {
    let _ = env_logger::try_init();
    let mut client = Recording {
        headers: headers
            .iter()
            .map(|(name, contents)| (name.to_string(), contents.to_string()))
            .collect(),
        ..Default::default()
    };
    let mut env = Environment::new();
    let output = Preprocessor::new(&mut client, &mut env).run("test.cpp", source);
    match output {
        Ok(output) => (output, client),
        Err(e) => panic!("preprocessing failed: {}", e),
    }
}

/// Document driver over in-memory files under `/src`, `/usr/include` and `/opt/include`.
pub fn setup_driver(files: &[(&str, &str)]) -> CppPreprocessor<MemoryProvider> {
    let _ = env_logger::try_init();
    let mut provider = MemoryProvider::new();
    for (path, contents) in files {
        provider.add_file(*path, *contents);
    }
    let config = PPConfig {
        local_include_paths: vec![PathBuf::from("/src/include")],
        global_include_paths: vec![PathBuf::from("/usr/include"), PathBuf::from("/opt/include")],
        ..Default::default()
    };
    CppPreprocessor::with_provider(config, provider)
}
