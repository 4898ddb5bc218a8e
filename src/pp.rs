pub use crate::pp::client::{
    Client, IncludeAction, IncludeRequest, IncludeType, IncludedSource, MacroArgumentReference, NullClient,
};
pub use crate::pp::cpp_preprocessor::{CppPreprocessor, FileSystemProvider, MemoryProvider, SourceProvider};
pub use crate::pp::document::{CharBlock, Document, DocumentSummary, DocumentTree, Include, MacroUse};
pub use crate::pp::header_search::{CONFIGURATION_FILE, HeaderSearch, SearchLocation};
pub use crate::pp::macros::{Environment, Macro, MacroFlags};
pub use crate::pp::preprocessor::{MAX_LEVEL, PPConfig, PPError, Preprocessor};

pub mod client;
pub mod cpp_preprocessor;
pub mod document;
pub(crate) mod header_search;
mod interpreter;
pub mod macros;
mod preprocessor;
