pub mod pp_common;
pub mod pp_documents;
pub mod pp_macros;

pub mod semantic_common;
pub mod semantic_declarations;
pub mod semantic_namespaces;
pub mod semantic_statements;
