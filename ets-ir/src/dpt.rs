//! Datapoint type normalization and pattern matching.

use regex::Regex;
use std::sync::LazyLock;

static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d{3}$").expect("canonical dpt pattern"));
static DPST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DPST-(\d+)-(\d+)").expect("dpst pattern"));
static DPT_MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DPT-?(\d+)").expect("dpt pattern"));
static PARTIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)$").expect("partial dpt pattern"));

/// Normalize an ETS datapoint type string to `main.sub` with a 3-digit
/// subtype.
///
/// Rules are tried from the exact canonical form down to the loosest
/// pattern. Unrecognized input is passed through unchanged.
pub fn normalize_datapoint(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if CANONICAL.is_match(raw) {
        return raw.to_string();
    }
    if let Some(caps) = DPST.captures(raw) {
        return format!("{}.{:0>3}", &caps[1], &caps[2]);
    }
    if let Some(caps) = DPT_MAIN.captures(raw) {
        return format!("{}.001", &caps[1]);
    }
    if let Some(caps) = PARTIAL.captures(raw) {
        return format!("{}.{:0>3}", &caps[1], &caps[2]);
    }
    raw.to_string()
}

pub fn is_canonical_datapoint(dpt: &str) -> bool {
    CANONICAL.is_match(dpt)
}

/// Main type of a datapoint (`"9.001"` -> `"9"`). Empty input yields an
/// empty string.
pub fn main_type(dpt: &str) -> &str {
    dpt.split_once('.').map_or(dpt, |(main, _)| main)
}

/// Match an actual datapoint against a rule pattern.
///
/// A pattern is either an exact type (`"5.001"`), a wildcard over a main
/// type (`"1.*"`), or a bare main type (`"1"`). An empty datapoint never
/// matches.
pub fn matches_datapoint(actual: &str, pattern: &str) -> bool {
    if actual.is_empty() {
        return false;
    }
    if actual == pattern {
        return true;
    }
    if let Some(main) = pattern.strip_suffix(".*") {
        return actual
            .strip_prefix(main)
            .is_some_and(|rest| rest.starts_with('.'));
    }
    if !pattern.contains('.') {
        return actual
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with('.'));
    }
    false
}
