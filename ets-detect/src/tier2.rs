//! Tier 2: pattern detection over name-grouped addresses.

use ets_ir::{DetectedDevice, DeviceAddress, GroupAddress};
use ets_project::{Deadline, ImportError};
use std::collections::{HashMap, HashSet};

use crate::infer::{
    extract_name_prefix, infer_domain_from_dpt, infer_flags, infer_function, infer_type_from_dpt,
};
use crate::rules::DetectionRule;

/// Reason attached to addresses no rule or fallback claimed.
pub const UNMAPPED_REASON: &str = "no matching device pattern";
/// Confidence of a device built from a lone address.
pub const SINGLE_ADDRESS_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Default)]
pub struct Tier2Outcome {
    pub devices: Vec<DetectedDevice>,
    pub unmapped: Vec<GroupAddress>,
}

/// Group addresses by device name prefix, in order of first appearance.
///
/// An address whose name yields no prefix is grouped under its own
/// address string.
pub fn group_by_prefix(addresses: Vec<GroupAddress>) -> Vec<(String, Vec<GroupAddress>)> {
    let mut groups: Vec<(String, Vec<GroupAddress>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for ga in addresses {
        let mut prefix = extract_name_prefix(&ga.name);
        if prefix.is_empty() {
            prefix.clone_from(&ga.address);
        }
        match slots.get(&prefix) {
            Some(&slot) => groups[slot].1.push(ga),
            None => {
                slots.insert(prefix.clone(), groups.len());
                groups.push((prefix, vec![ga]));
            }
        }
    }
    groups
}

/// First matching rule wins; a lone address with a known datapoint falls
/// back to a low-confidence device of its own.
pub fn detect_device(
    rules: &[DetectionRule],
    prefix: &str,
    group: &[GroupAddress],
) -> Option<DetectedDevice> {
    if let Some(m) = rules.iter().find_map(|rule| rule.try_match(group)) {
        let mut device = DetectedDevice::new(prefix, m.rule.name, m.rule.domain, m.confidence);
        device.addresses = m
            .slots
            .iter()
            .map(|slot| {
                DeviceAddress::from_group(
                    slot.address,
                    slot.requirement.function,
                    slot.requirement.flags,
                )
            })
            .collect();
        device.source_location = m
            .slots
            .iter()
            .map(|slot| slot.address.location.as_str())
            .find(|loc| !loc.is_empty())
            .unwrap_or_default()
            .to_string();
        return Some(device);
    }

    let [ga] = group else {
        return None;
    };
    let device_type = infer_type_from_dpt(&ga.dpt);
    if device_type == "unknown" {
        return None;
    }
    let mut device = DetectedDevice::new(
        prefix,
        device_type,
        infer_domain_from_dpt(&ga.dpt),
        SINGLE_ADDRESS_CONFIDENCE,
    );
    device.addresses = vec![DeviceAddress::from_group(
        ga,
        infer_function(&ga.dpt, &ga.name),
        &infer_flags(&ga.dpt, &ga.name),
    )];
    device.source_location.clone_from(&ga.location);
    Some(device)
}

/// Classify the remaining address pool.
///
/// Unmapped addresses keep their pool order and carry [`UNMAPPED_REASON`].
pub fn classify_patterns(
    rules: &[DetectionRule],
    pool: Vec<GroupAddress>,
    deadline: &Deadline,
) -> Result<Tier2Outcome, ImportError> {
    let order: Vec<String> = pool.iter().map(|ga| ga.address.clone()).collect();
    let mut outcome = Tier2Outcome::default();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut leftovers: HashMap<String, GroupAddress> = HashMap::new();

    for (prefix, group) in group_by_prefix(pool) {
        deadline.check("pattern detection")?;

        match detect_device(rules, &prefix, &group) {
            Some(device) => {
                log::debug!(
                    "'{}': {} ({:.2}) from {} of {} addresses",
                    prefix,
                    device.detected_type,
                    device.confidence,
                    device.addresses.len(),
                    group.len()
                );
                claimed.extend(device.addresses.iter().map(|a| a.ga.clone()));
                outcome.devices.push(device);
            }
            None => log::debug!("'{}': no pattern for {} addresses", prefix, group.len()),
        }
        for ga in group {
            if !claimed.contains(&ga.address) {
                leftovers.insert(ga.address.clone(), ga);
            }
        }
    }

    outcome.unmapped = order
        .iter()
        .filter_map(|address| leftovers.remove(address))
        .map(|mut ga| {
            ga.reason = Some(UNMAPPED_REASON.to_string());
            ga
        })
        .collect();

    log::info!(
        "tier 2 detected {} devices, {} addresses unmapped",
        outcome.devices.len(),
        outcome.unmapped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::default_detection_rules;

    fn ga(address: &str, name: &str, dpt: &str) -> GroupAddress {
        GroupAddress::new(address, name, dpt)
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let groups = group_by_prefix(vec![
            ga("1/0/0", "Kitchen Light Switch", "1.001"),
            ga("2/0/0", "Hall Blind Move", "1.008"),
            ga("1/0/1", "Kitchen Light Dimming", "5.001"),
        ]);
        let names: Vec<(&str, usize)> = groups.iter().map(|(p, g)| (p.as_str(), g.len())).collect();
        assert_eq!(names, vec![("Kitchen Light", 2), ("Hall Blind", 1)]);
    }

    #[test]
    fn nameless_addresses_group_alone() {
        let groups = group_by_prefix(vec![ga("1/0/0", "", "1.001"), ga("1/0/1", "", "1.001")]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "1/0/0");
    }

    #[test]
    fn single_address_fallback() {
        let rules = default_detection_rules();
        let device = detect_device(&rules, "Garden Socket", &[ga("1/2/3", "Garden Socket", "1.001")])
            .expect("light switch rule");
        assert_eq!(device.detected_type, "light_switch");

        let device = detect_device(&rules, "Meter", &[ga("7/0/0", "Meter", "13.010")]).unwrap();
        assert_eq!(device.detected_type, "energy_meter");
        assert_eq!(device.suggested_domain, "energy");
        assert_eq!(device.confidence, SINGLE_ADDRESS_CONFIDENCE);
        assert_eq!(device.addresses[0].suggested_function, "active_energy");

        assert!(detect_device(&rules, "Spare", &[ga("7/0/1", "Spare", "")]).is_none());
    }

    #[test]
    fn leftovers_are_unmapped_in_pool_order() {
        let pool = vec![
            ga("3/0/0", "Heating Actuator : Ch1 Valve", "5.001"),
            ga("4/0/1", "Spare", ""),
            ga("3/0/1", "Heating Actuator : Ch1 Valve Status", "5.001"),
            ga("3/0/2", "Heating Actuator : Ch2 Valve", "5.001"),
        ];
        let outcome =
            classify_patterns(&default_detection_rules(), pool, &Deadline::unbounded()).unwrap();

        assert_eq!(outcome.devices.len(), 1);
        assert_eq!(outcome.devices[0].detected_type, "heating_actuator");
        let unmapped: Vec<&str> = outcome.unmapped.iter().map(|g| g.address.as_str()).collect();
        assert_eq!(unmapped, vec!["4/0/1", "3/0/2"]);
        assert!(
            outcome
                .unmapped
                .iter()
                .all(|g| g.reason.as_deref() == Some(UNMAPPED_REASON))
        );
    }

    #[test]
    fn empty_rule_set_uses_fallback_only() {
        let pool = vec![
            ga("1/0/0", "Kitchen Light Switch", "1.001"),
            ga("1/0/1", "Kitchen Light Dimming", "5.001"),
            ga("9/0/0", "Outside Temperature", "9.001"),
        ];
        let outcome = classify_patterns(&[], pool, &Deadline::unbounded()).unwrap();
        assert_eq!(outcome.devices.len(), 1);
        assert_eq!(outcome.devices[0].detected_type, "temperature_sensor");
        assert_eq!(outcome.unmapped.len(), 2);
    }
}
