use std::time::Duration;

use crate::deadline::Deadline;

/// Default ceiling for input files and for each decompressed archive entry.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
/// Default wall-clock limit for one parse.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Resource limits for one parse invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum size of the raw input.
    pub max_file_size: u64,
    /// Maximum decompressed size of any single archive entry.
    pub max_entry_size: u64,
    /// `None` disables the time limit.
    pub timeout: Option<Duration>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_entry_size: DEFAULT_MAX_FILE_SIZE,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ParseOptions {
    /// Start a deadline for a parse beginning now.
    pub fn deadline(&self) -> Deadline {
        match self.timeout {
            Some(timeout) => Deadline::after(timeout),
            None => Deadline::unbounded(),
        }
    }
}
