//! Tier 1: classification from ETS `Function` metadata.
//!
//! Only runs on project documents with a `Trades` section. Each function
//! with a known type becomes one device holding the group addresses it
//! references. Consumed addresses leave the pool before Tier 2 runs.

use ets_ir::{DetectedDevice, DeviceAddress, GroupAddress};
use ets_project::{Deadline, ImportError, ProjectIndex, parse_knx_document};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::function_types::classify_function;
use crate::infer::{infer_flags, infer_function};

#[derive(Debug, Default)]
pub struct Tier1Outcome {
    pub devices: Vec<DetectedDevice>,
    /// Group address XML IDs of every resolved function reference.
    pub consumed_ids: BTreeSet<String>,
    /// Canonical addresses behind `consumed_ids`.
    pub consumed_addresses: HashSet<String>,
}

/// Classify the functions of `project_xml` against the address `pool`.
///
/// A document that cannot be read as a project is not an error here; the
/// structural parsers already produced the pool. Only the deadline aborts.
pub fn classify_functions(
    project_xml: &str,
    pool: &[GroupAddress],
    deadline: &Deadline,
) -> Result<Tier1Outcome, ImportError> {
    let doc = match parse_knx_document(project_xml) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("skipping function classification: {}", e);
            return Ok(Tier1Outcome::default());
        }
    };
    if !doc.has_functions() {
        log::debug!("no Trades/Function section, skipping tier 1");
        return Ok(Tier1Outcome::default());
    }

    let index = ProjectIndex::build(&doc);
    let by_address: HashMap<&str, &GroupAddress> =
        pool.iter().map(|ga| (ga.address.as_str(), ga)).collect();
    let mut outcome = Tier1Outcome::default();

    for function in &index.functions {
        deadline.check("function classification")?;

        let name = function.name.as_deref().unwrap_or_default();
        let function_type = function.function_type.as_deref().unwrap_or_default();
        let comment = function.comment.as_deref().unwrap_or_default();
        let Some(class) = classify_function(function_type, comment) else {
            log::debug!("function '{}': unmapped type '{}'", name, function_type);
            continue;
        };

        let refs: Vec<_> = function
            .group_address_refs
            .iter()
            .flat_map(|w| w.items.iter())
            .collect();

        let mut addresses = Vec::new();
        let mut source_location = String::new();
        for ga_ref in &refs {
            let Some(ref_id) = ga_ref.ref_id.as_deref() else {
                continue;
            };
            let Some(address) = index.address_for_ga_id(ref_id) else {
                log::debug!("function '{}': unresolved reference {}", name, ref_id);
                continue;
            };
            if outcome.consumed_addresses.contains(address) {
                log::debug!("function '{}': {} already claimed", name, address);
                continue;
            }
            let Some(ga) = by_address.get(address) else {
                continue;
            };

            let role = ga_ref
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| infer_function(&ga.dpt, &ga.name));
            addresses.push(DeviceAddress::from_group(
                ga,
                role,
                &infer_flags(&ga.dpt, &ga.name),
            ));
            if source_location.is_empty() {
                source_location.clone_from(&ga.location);
            }
            outcome.consumed_ids.insert(ref_id.to_string());
            outcome.consumed_addresses.insert(address.to_string());
        }

        if addresses.is_empty() {
            log::debug!("function '{}': no resolvable group addresses", name);
            continue;
        }

        // The function's own location wins over the group range path
        if let Some(path) = function
            .location_refs
            .first()
            .and_then(|l| l.ref_id.as_deref())
            .and_then(|id| index.location_path(id))
        {
            source_location = path.to_string();
        }

        let metadata = refs
            .iter()
            .filter_map(|r| r.ref_id.as_deref())
            .find_map(|id| index.device_for_ga_ref(id))
            .map(|record| index.device_metadata(record))
            .unwrap_or_default();

        let mut device =
            DetectedDevice::new(name, class.device_type, class.domain, class.confidence);
        device.addresses = addresses;
        device.source_location = source_location;
        device.manufacturer = metadata.manufacturer;
        device.product_model = metadata.product_model;
        device.application_program = metadata.application_program;
        device.individual_address = metadata.individual_address;
        device.function_type = Some(function_type.to_string());
        device.function_comment = Some(comment.to_string()).filter(|c| !c.is_empty());
        outcome.devices.push(device);
    }

    log::info!(
        "tier 1 classified {} devices, consumed {} group address references",
        outcome.devices.len(),
        outcome.consumed_ids.len()
    );
    Ok(outcome)
}
