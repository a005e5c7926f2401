use std::time::Duration;
use thiserror::Error;

/// Fatal errors of a single import. No partial result accompanies them.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file: {context}")]
    InvalidFile { context: String },
    #[error("unsupported ETS export: {0}")]
    UnsupportedVersion(String),
    #[error("corrupt archive: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),
    #[error("no group addresses found (tried: {})", .tried.join(", "))]
    NoGroupAddresses { tried: Vec<String> },
    #[error("encoding error in {context}")]
    Encoding { context: String },
    #[error("'{entry}' exceeds the size limit of {limit} bytes")]
    FileTooLarge { entry: String, limit: u64 },
    #[error("parse timed out during {stage} after {elapsed:?}")]
    ParseTimeout { stage: &'static str, elapsed: Duration },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    pub(crate) fn invalid(context: impl Into<String>) -> Self {
        ImportError::InvalidFile {
            context: context.into(),
        }
    }

    pub(crate) fn no_addresses(tried: &[&str]) -> Self {
        ImportError::NoGroupAddresses {
            tried: tried.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Whether this error is the caller-imposed time limit running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ImportError::ParseTimeout { .. })
    }
}
