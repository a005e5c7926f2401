use ets_ir::{ConfidenceLevel, DetectedDevice, GroupAddress, ParseStatistics};

/// Summary counts over the final device and unmapped lists.
pub fn compute(devices: &[DetectedDevice], unmapped: &[GroupAddress]) -> ParseStatistics {
    let mut stats = ParseStatistics {
        detected_devices: devices.len(),
        unmapped_addresses: unmapped.len(),
        total_group_addresses: unmapped.len(),
        ..Default::default()
    };

    for device in devices {
        stats.total_group_addresses += device.addresses.len();
        if device.is_tier1() {
            stats.tier1_devices += 1;
        }
        match device.confidence_level() {
            ConfidenceLevel::High => stats.high_confidence += 1,
            ConfidenceLevel::Medium => stats.medium_confidence += 1,
            ConfidenceLevel::Low => stats.low_confidence += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_ir::DeviceAddress;

    #[test]
    fn counts_levels_and_addresses() {
        let ga = GroupAddress::new("1/0/0", "Switch", "1.001");
        let mut tier1 = DetectedDevice::new("A", "light_switch", "lighting", 0.99);
        tier1.function_type = Some("SwitchableLight".to_string());
        tier1.addresses = vec![DeviceAddress::from_group(&ga, "switch", &[])];
        let mut medium = DetectedDevice::new("B", "light_switch", "lighting", 0.5);
        medium.addresses = vec![
            DeviceAddress::from_group(&ga, "switch", &[]),
            DeviceAddress::from_group(&ga, "switch_status", &[]),
        ];
        let low = DetectedDevice::new("C", "switch", "lighting", 0.4);

        let stats = compute(&[tier1, medium, low], std::slice::from_ref(&ga));
        assert_eq!(
            stats,
            ParseStatistics {
                total_group_addresses: 4,
                detected_devices: 3,
                tier1_devices: 1,
                high_confidence: 1,
                medium_confidence: 1,
                low_confidence: 1,
                unmapped_addresses: 1,
            }
        );
    }
}
