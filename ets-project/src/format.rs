//! Input format detection: extension first, content sniffing second.

use ets_ir::ImportFormat;
use std::path::Path;

use crate::error::ImportError;

const ZIP_MAGIC: &[u8] = b"PK";

/// Pick the parser for an input by file extension, falling back to content
/// sniffing when the extension is absent or unknown.
pub fn detect_format(filename: &str, bytes: &[u8]) -> Result<ImportFormat, ImportError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("knxproj") => Ok(ImportFormat::Knxproj),
        Some("xml") => Ok(ImportFormat::Xml),
        Some("csv") => Ok(ImportFormat::Csv),
        _ => sniff_format(bytes).ok_or_else(|| {
            ImportError::invalid(format!("unrecognized format for '{filename}'"))
        }),
    }
}

/// Classify raw content as a ZIP archive or XML document.
pub fn sniff_format(bytes: &[u8]) -> Option<ImportFormat> {
    if is_zip(bytes) {
        return Some(ImportFormat::Knxproj);
    }
    if looks_like_xml(bytes) {
        return Some(ImportFormat::Xml);
    }
    None
}

pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes.starts_with(ZIP_MAGIC)
}

fn looks_like_xml(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    bytes.trim_ascii_start().starts_with(b"<")
}
