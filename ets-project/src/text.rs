//! Byte-to-text decoding for XML and CSV payloads.

use crate::error::ImportError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode `bytes` as UTF-8, or as UTF-16 when a UTF-16 byte order mark is
/// present. `what` names the payload in error messages.
pub fn decode_text(bytes: &[u8], what: &str) -> Result<String, ImportError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return utf8(rest, what);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return utf16(rest, what, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return utf16(rest, what, u16::from_be_bytes);
    }
    utf8(bytes, what)
}

fn utf8(bytes: &[u8], what: &str) -> Result<String, ImportError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ImportError::Encoding {
        context: format!("{what}: invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
    })
}

fn utf16(bytes: &[u8], what: &str, unit: fn([u8; 2]) -> u16) -> Result<String, ImportError> {
    if bytes.len() % 2 != 0 {
        return Err(ImportError::Encoding {
            context: format!("{what}: truncated UTF-16 data"),
        });
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| ImportError::Encoding {
            context: format!("{what}: unpaired UTF-16 surrogate {:#06x}", e.unpaired_surrogate()),
        })
}
