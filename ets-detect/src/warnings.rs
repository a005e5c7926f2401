//! Non-fatal checks that attach [`ParseWarning`]s to a result.
//!
//! Address checks run on the extracted pool before classification; device
//! checks run on the combined device list of both tiers.

use ets_ir::dpt::is_canonical_datapoint;
use ets_ir::{DetectedDevice, GroupAddress, ParseWarning, WarningCode};
use std::collections::HashSet;

/// Longest suggested device name kept as is, in characters.
pub const MAX_NAME_LEN: usize = 128;
/// Devices below this confidence are listed in a `LOW_CONFIDENCE` warning.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Drop repeated canonical addresses, keeping the first occurrence.
pub fn dedupe_addresses(addresses: &mut Vec<GroupAddress>) -> Option<ParseWarning> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    addresses.retain(|ga| {
        let first = seen.insert(ga.address.clone());
        if !first {
            duplicates.push(ga.address.clone());
        }
        first
    });
    if duplicates.is_empty() {
        return None;
    }
    Some(
        ParseWarning::new(
            WarningCode::DuplicateGa,
            format!("{} duplicate group addresses ignored", duplicates.len()),
        )
        .with_addresses(duplicates),
    )
}

/// Report missing datapoint types and clear ones that did not normalize.
pub fn check_datapoints(addresses: &mut [GroupAddress]) -> Vec<ParseWarning> {
    let mut missing = Vec::new();
    let mut unknown = Vec::new();
    for ga in addresses.iter_mut() {
        if ga.dpt.is_empty() {
            missing.push(ga.address.clone());
        } else if !is_canonical_datapoint(&ga.dpt) {
            log::debug!("{}: unrecognized datapoint type '{}'", ga.address, ga.dpt);
            unknown.push(ga.address.clone());
            ga.dpt.clear();
        }
    }

    let mut warnings = Vec::new();
    if !missing.is_empty() {
        warnings.push(
            ParseWarning::new(
                WarningCode::MissingDpt,
                format!("{} group addresses have no datapoint type", missing.len()),
            )
            .with_addresses(missing),
        );
    }
    if !unknown.is_empty() {
        warnings.push(
            ParseWarning::new(
                WarningCode::DptUnknown,
                format!("{} group addresses have an unrecognized datapoint type", unknown.len()),
            )
            .with_addresses(unknown),
        );
    }
    warnings
}

/// Make suggested IDs unique by appending `-2`, `-3`, ... to later devices.
pub fn resolve_id_conflicts(devices: &mut [DetectedDevice]) -> Vec<ParseWarning> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut warnings = Vec::new();

    for device in devices.iter_mut() {
        if taken.insert(device.suggested_id.clone()) {
            continue;
        }
        let original = device.suggested_id.clone();
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{original}-{n}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(renamed.clone());
        warnings.push(
            ParseWarning::new(
                WarningCode::DeviceConflict,
                format!("device id '{}' already used, renamed to '{}'", original, renamed),
            )
            .with_devices(vec![renamed.clone()]),
        );
        device.suggested_id = renamed;
    }
    warnings
}

pub fn truncate_names(devices: &mut [DetectedDevice]) -> Vec<ParseWarning> {
    let mut warnings = Vec::new();
    for device in devices.iter_mut() {
        if device.suggested_name.chars().count() <= MAX_NAME_LEN {
            continue;
        }
        device.suggested_name = device.suggested_name.chars().take(MAX_NAME_LEN).collect();
        warnings.push(
            ParseWarning::new(
                WarningCode::NameTruncated,
                format!("device name truncated to {MAX_NAME_LEN} characters"),
            )
            .with_devices(vec![device.suggested_id.clone()]),
        );
    }
    warnings
}

pub fn low_confidence(devices: &[DetectedDevice]) -> Option<ParseWarning> {
    let low: Vec<String> = devices
        .iter()
        .filter(|d| d.confidence < LOW_CONFIDENCE_THRESHOLD)
        .map(|d| d.suggested_id.clone())
        .collect();
    if low.is_empty() {
        return None;
    }
    Some(
        ParseWarning::new(
            WarningCode::LowConfidence,
            format!("{} devices detected with low confidence, review them", low.len()),
        )
        .with_devices(low),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> DetectedDevice {
        DetectedDevice::new(id, "light_switch", "lighting", 0.9)
    }

    #[test]
    fn duplicates_keep_first() {
        let mut pool = vec![
            GroupAddress::new("1/0/0", "First", "1.001"),
            GroupAddress::new("1/0/0", "Second", "1.001"),
            GroupAddress::new("1/0/1", "Third", "1.001"),
        ];
        let warning = dedupe_addresses(&mut pool).expect("warning");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].name, "First");
        assert_eq!(warning.code, WarningCode::DuplicateGa);
        assert_eq!(warning.affected_addresses, vec!["1/0/0"]);

        assert!(dedupe_addresses(&mut pool).is_none());
    }

    #[test]
    fn datapoint_checks() {
        let mut pool = vec![
            GroupAddress::new("1/0/0", "Ok", "DPST-1-1"),
            GroupAddress::new("1/0/1", "Missing", ""),
            GroupAddress::new("1/0/2", "Odd", "Custom Type"),
        ];
        let warnings = check_datapoints(&mut pool);
        let codes: Vec<WarningCode> = warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![WarningCode::MissingDpt, WarningCode::DptUnknown]);
        assert_eq!(warnings[0].affected_addresses, vec!["1/0/1"]);
        assert_eq!(warnings[1].affected_addresses, vec!["1/0/2"]);
        assert_eq!(pool[2].dpt, "");
        assert_eq!(pool[0].dpt, "1.001");
    }

    #[test]
    fn conflicting_ids_get_suffixes() {
        let mut devices = vec![device("Hall"), device("Hall"), device("Hall-2"), device("Hall")];
        let warnings = resolve_id_conflicts(&mut devices);
        let ids: Vec<&str> = devices.iter().map(|d| d.suggested_id.as_str()).collect();
        assert_eq!(ids, vec!["hall", "hall-2", "hall-2-2", "hall-3"]);
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.code == WarningCode::DeviceConflict));
    }

    #[test]
    fn long_names_are_truncated() {
        let mut devices = vec![device(&"x".repeat(200)), device("short")];
        let warnings = truncate_names(&mut devices);
        assert_eq!(devices[0].suggested_name.chars().count(), MAX_NAME_LEN);
        assert_eq!(devices[1].suggested_name, "Short");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn one_warning_for_all_low_confidence_devices() {
        let mut a = device("a");
        a.confidence = 0.4;
        let mut b = device("b");
        b.confidence = 0.49;
        let warning = low_confidence(&[a, b, device("c")]).expect("warning");
        assert_eq!(warning.affected_devices, vec!["a", "b"]);
        assert!(low_confidence(&[device("c")]).is_none());
    }
}
