use anyhow::Result;
use ets_detect::EtsParser;
use ets_ir::{LocationType, ParseResult};
use std::collections::BTreeMap;
use std::path::Path;

use crate::parse::parse_input;

pub fn run_info(parser: &EtsParser, input: &Path) -> Result<()> {
    let result = parse_input(parser, input)?;
    print!("{}", summary(input, &result));
    Ok(())
}

pub fn summary(input: &Path, result: &ParseResult) -> String {
    let stats = &result.statistics;
    let mut lines = vec![
        format!("File:        {}", input.display()),
        format!("Format:      {}", result.format),
    ];
    if let Some(version) = &result.ets_version {
        lines.push(format!("ETS version: {version}"));
    }
    lines.push(format!("Addresses:   {}", stats.total_group_addresses));
    lines.push(format!(
        "Devices:     {} ({} from ETS functions)",
        stats.detected_devices, stats.tier1_devices
    ));
    lines.push(format!(
        "Confidence:  {} high, {} medium, {} low",
        stats.high_confidence, stats.medium_confidence, stats.low_confidence
    ));
    lines.push(format!("Unmapped:    {}", stats.unmapped_addresses));

    let floors = result
        .locations
        .iter()
        .filter(|l| l.location_type == LocationType::Floor)
        .count();
    if !result.locations.is_empty() {
        let rooms = result.locations.len() - floors;
        lines.push(format!("Locations:   {floors} floors, {rooms} rooms"));
    }

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for device in &result.devices {
        *by_type.entry(device.detected_type.as_str()).or_default() += 1;
    }
    for (device_type, count) in by_type {
        lines.push(format!("  {device_type}: {count}"));
    }

    if !result.warnings.is_empty() {
        lines.push(format!("Warnings:    {}", result.warnings.len()));
        for warning in &result.warnings {
            lines.push(format!("  {:?}: {}", warning.code, warning.message));
        }
    }

    lines.join("\n") + "\n"
}
