pub mod csv_parser;
pub mod deadline;
pub mod error;
pub mod ets_model;
pub mod format;
pub mod ga_parser;
pub mod generic_scan;
pub mod knxproj_reader;
pub mod options;
pub mod project_index;
pub mod source;
pub mod text;

pub use deadline::Deadline;
pub use error::ImportError;
pub use ets_model::{KnxDocument, parse_knx_document};
pub use options::ParseOptions;
pub use project_index::{DeviceMetadata, DeviceRecord, ProjectIndex};
pub use source::{ExtractedSource, extract_source};
