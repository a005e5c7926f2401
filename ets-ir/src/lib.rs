pub mod address;
pub mod dpt;
pub mod slug;
pub mod types;
pub mod validate;

pub use address::{is_valid_address, normalize_address};
pub use dpt::{matches_datapoint, normalize_datapoint};
pub use slug::{clean_name, slugify};
pub use types::*;
pub use validate::{ValidationError, validate_result};
