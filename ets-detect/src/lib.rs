//! Device classification for ETS group address exports.
//!
//! [`EtsParser`] runs the whole import: format detection and extraction
//! (`ets-project`), function-based classification of project files, rule
//! based detection over the remaining addresses, and the location tree.

pub mod function_types;
pub mod infer;
pub mod location;
pub mod parser;
pub mod rules;
pub mod statistics;
pub mod tier1;
pub mod tier2;
pub mod warnings;

pub use parser::EtsParser;
pub use rules::{DatapointRequirement, DetectionRule, default_detection_rules};
