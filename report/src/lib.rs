pub mod format;
pub mod output;
pub mod parser;

pub use format::{parse_structured, serialize_structured, serialize_text, StructuredReport};
pub use output::{
    artifact_paths, write_artifacts, write_structured_report, write_text_report, ArtifactPaths,
};
pub use parser::parse;
