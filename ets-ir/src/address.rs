//! KNX group address normalization.
//!
//! ETS writes group addresses in three shapes: 3-level `main/middle/sub`,
//! 2-level `main/sub16`, and the raw 16-bit integer used inside project
//! XML. All of them are folded into the 3-level form.

use regex::Regex;
use std::sync::LazyLock;

static VALID_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}/\d{1,2}/\d{1,3}|\d{1,2}/\d{1,4}|\d+)$").expect("address pattern")
});

/// Largest raw 16-bit group address.
const MAX_RAW_ADDRESS: u32 = 0xFFFF;
/// Largest sub group in the 2-level form (11 bits).
const MAX_TWO_LEVEL_SUB: u32 = 0x07FF;

/// Check whether `s` is a group address in any accepted shape.
///
/// Anything this accepts normalizes to a canonical 3-level address.
pub fn is_valid_address(s: &str) -> bool {
    if !VALID_ADDRESS.is_match(s) {
        return false;
    }
    match s.split_once('/') {
        None => s.parse::<u32>().is_ok_and(|v| v <= MAX_RAW_ADDRESS),
        Some((_, rest)) if !rest.contains('/') => {
            rest.parse::<u32>().is_ok_and(|v| v <= MAX_TWO_LEVEL_SUB)
        }
        Some(_) => true,
    }
}

/// Normalize a raw group address to `main/middle/sub`.
///
/// Input that cannot be interpreted is returned trimmed but otherwise
/// unchanged; this never fails.
pub fn normalize_address(raw: &str) -> String {
    let addr = raw.trim();
    if addr.is_empty() {
        return String::new();
    }

    match addr.matches('/').count() {
        2 => addr.to_string(),
        1 => {
            let (main, sub) = addr.split_once('/').unwrap_or((addr, ""));
            match sub.trim().parse::<u32>() {
                // main (5 bits) / sub (11 bits) -> main / middle (3 bits) / sub (8 bits)
                Ok(sub16) => format!("{}/{}/{}", main.trim(), (sub16 >> 8) & 0x07, sub16 & 0xFF),
                Err(_) => addr.to_string(),
            }
        }
        _ => match addr.parse::<u32>() {
            // MMMMM MMM SSSSSSSS
            Ok(v) => format!("{}/{}/{}", (v >> 11) & 0x1F, (v >> 8) & 0x07, v & 0xFF),
            Err(_) => addr.to_string(),
        },
    }
}

/// Check whether `s` is already a canonical 3-level address.
pub fn is_canonical_address(s: &str) -> bool {
    let mut parts = s.split('/');
    let (Some(main), Some(middle), Some(sub), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    [main, middle, sub]
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}
