use crate::address::is_canonical_address;
use crate::dpt::is_canonical_datapoint;
use crate::types::{MAX_CONFIDENCE, ParseResult};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("address '{0}' is not in main/middle/sub form")]
    NonCanonicalAddress(String),
    #[error("datapoint type '{1}' on address '{0}' is not in main.sub form")]
    NonCanonicalDatapoint(String, String),
    #[error("address '{0}' is claimed more than once")]
    AddressClaimedTwice(String),
    #[error("device '{0}' has confidence {1} outside [0, 0.99]")]
    ConfidenceOutOfRange(String, f64),
    #[error("device '{0}' has no addresses")]
    EmptyDevice(String),
    #[error("duplicate location id '{0}'")]
    DuplicateLocationId(String),
    #[error("location '{0}' references unknown parent '{1}'")]
    UnknownParent(String, String),
}

/// Validate a ParseResult against the model invariants.
pub fn validate_result(result: &ParseResult) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut claimed = HashSet::new();

    let device_addresses = result
        .devices
        .iter()
        .flat_map(|d| d.addresses.iter().map(|a| (a.ga.as_str(), a.dpt.as_str())));
    let unmapped = result
        .unmapped_addresses
        .iter()
        .map(|a| (a.address.as_str(), a.dpt.as_str()));

    for (address, dpt) in device_addresses.chain(unmapped) {
        if !is_canonical_address(address) {
            errors.push(ValidationError::NonCanonicalAddress(address.to_string()));
        }
        if !dpt.is_empty() && !is_canonical_datapoint(dpt) {
            errors.push(ValidationError::NonCanonicalDatapoint(
                address.to_string(),
                dpt.to_string(),
            ));
        }
        if !claimed.insert(address) {
            errors.push(ValidationError::AddressClaimedTwice(address.to_string()));
        }
    }

    for device in &result.devices {
        if !(0.0..=MAX_CONFIDENCE).contains(&device.confidence) {
            errors.push(ValidationError::ConfidenceOutOfRange(
                device.suggested_id.clone(),
                device.confidence,
            ));
        }
        if device.addresses.is_empty() {
            errors.push(ValidationError::EmptyDevice(device.suggested_id.clone()));
        }
    }

    let mut location_ids = HashSet::new();
    for loc in &result.locations {
        if !location_ids.insert(loc.id.as_str()) {
            errors.push(ValidationError::DuplicateLocationId(loc.id.clone()));
        }
    }
    for loc in &result.locations {
        if !loc.parent_id.is_empty() && !location_ids.contains(loc.parent_id.as_str()) {
            errors.push(ValidationError::UnknownParent(
                loc.id.clone(),
                loc.parent_id.clone(),
            ));
        }
    }

    if result.statistics.detected_devices != result.devices.len() {
        log::warn!(
            "statistics report {} devices, result holds {}",
            result.statistics.detected_devices,
            result.devices.len()
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
