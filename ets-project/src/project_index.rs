//! ID-indexed lookup tables over a parsed ETS project document.
//!
//! Functions, topology, and manufacturer data reference each other by XML
//! ID. The index resolves those references once so classification can
//! follow them cheaply. Everything is borrowed from the `KnxDocument`.

use ets_ir::normalize_address;
use std::collections::HashMap;

use crate::ets_model::*;
use crate::ga_parser::join_path;

/// Device instance together with its resolved individual address.
pub struct DeviceRecord<'a> {
    pub instance: &'a DeviceInstance,
    pub individual_address: Option<String>,
}

/// Manufacturer and product metadata of one device instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceMetadata {
    pub manufacturer: Option<String>,
    pub product_model: Option<String>,
    pub application_program: Option<String>,
    pub individual_address: Option<String>,
}

pub struct ProjectIndex<'a> {
    pub manufacturers: HashMap<&'a str, &'a str>,
    pub application_programs: HashMap<&'a str, &'a str>,
    pub hardware: HashMap<&'a str, &'a str>,
    pub devices: Vec<DeviceRecord<'a>>,
    pub devices_by_id: HashMap<&'a str, usize>,
    /// Building location ID -> `" > "`-joined path.
    pub location_paths: HashMap<&'a str, String>,
    /// All functions of all trades, depth-first in document order.
    pub functions: Vec<&'a Function>,
    ga_addresses: HashMap<&'a str, String>,
    ga_devices: HashMap<&'a str, usize>,
}

impl<'a> ProjectIndex<'a> {
    /// Build an index from the parsed project root.
    pub fn build(doc: &'a KnxDocument) -> Self {
        let mut idx = ProjectIndex {
            manufacturers: HashMap::new(),
            application_programs: HashMap::new(),
            hardware: HashMap::new(),
            devices: Vec::new(),
            devices_by_id: HashMap::new(),
            location_paths: HashMap::new(),
            functions: Vec::new(),
            ga_addresses: HashMap::new(),
            ga_devices: HashMap::new(),
        };

        if let Some(data) = &doc.manufacturer_data {
            for mfr in &data.manufacturers {
                idx.index_manufacturer(mfr);
            }
        }

        for range in doc.group_ranges() {
            idx.index_range(range);
        }

        for installation in doc.installations() {
            if let Some(topology) = &installation.topology {
                idx.index_topology(topology);
            }
            if let Some(trades) = &installation.trades {
                for trade in &trades.items {
                    idx.index_trade(trade);
                }
            }
            if let Some(locations) = &installation.locations {
                for loc in locations.locations.iter().chain(locations.spaces.iter()) {
                    idx.index_location(loc, "");
                }
            }
        }

        log::debug!(
            "project index: {} functions, {} devices, {} group address ids, {} locations",
            idx.functions.len(),
            idx.devices.len(),
            idx.ga_addresses.len(),
            idx.location_paths.len()
        );
        idx
    }

    fn index_manufacturer(&mut self, mfr: &'a Manufacturer) {
        if let (Some(id), Some(name)) = (mfr.id.as_deref(), mfr.name.as_deref()) {
            self.manufacturers.insert(id, name);
        }
        let wrapped = mfr
            .application_programs_wrapper
            .iter()
            .flat_map(|w| w.items.iter());
        for app in mfr.application_programs.iter().chain(wrapped) {
            if let (Some(id), Some(name)) = (app.id.as_deref(), app.name.as_deref()) {
                self.application_programs.insert(id, name);
            }
        }
        for hw in &mfr.hardware {
            self.index_hardware(hw);
        }
    }

    fn index_hardware(&mut self, hw: &'a Hardware) {
        if let (Some(id), Some(name)) = (hw.id.as_deref(), hw.name.as_deref()) {
            self.hardware.insert(id, name);
        }
        for child in &hw.items {
            self.index_hardware(child);
        }
    }

    fn index_range(&mut self, range: &'a GroupRange) {
        for ga in &range.addresses {
            if let (Some(id), Some(address)) = (ga.id.as_deref(), ga.address.as_deref()) {
                let address = normalize_address(address);
                if let Some(short) = short_ga_id(id) {
                    self.ga_addresses.entry(short).or_insert_with(|| address.clone());
                }
                self.ga_addresses.insert(id, address);
            }
        }
        for child in &range.ranges {
            self.index_range(child);
        }
    }

    fn index_topology(&mut self, topology: &'a Topology) {
        for area in &topology.areas {
            for line in &area.lines {
                let segment_devices = line.segments.iter().flat_map(|s| s.devices.iter());
                for device in line.devices.iter().chain(segment_devices) {
                    let individual_address = device
                        .individual_address
                        .clone()
                        .filter(|a| !a.is_empty())
                        .or_else(|| compose_individual_address(area, line, device));
                    self.add_device(DeviceRecord {
                        instance: device,
                        individual_address,
                    });
                }
            }
        }
    }

    fn add_device(&mut self, record: DeviceRecord<'a>) {
        let slot = self.devices.len();
        let instance = record.instance;
        if let Some(id) = instance.id.as_deref() {
            self.devices_by_id.entry(id).or_insert(slot);
        }

        let com_objects = instance
            .com_object_refs
            .iter()
            .flat_map(|w| w.items.iter());
        for co in com_objects {
            if let Some(connectors) = &co.connectors {
                let refs = connectors.send.iter().chain(connectors.receive.iter());
                for ga_ref in refs.filter_map(|c| c.group_address_ref_id.as_deref()) {
                    self.ga_devices.entry(ga_ref).or_insert(slot);
                }
            }
            if let Some(links) = co.links.as_deref() {
                for ga_ref in links.split_whitespace() {
                    self.ga_devices.entry(ga_ref).or_insert(slot);
                }
            }
        }

        self.devices.push(record);
    }

    fn index_trade(&mut self, trade: &'a Trade) {
        self.functions.extend(trade.functions.iter());
        for child in &trade.trades {
            self.index_trade(child);
        }
    }

    fn index_location(&mut self, loc: &'a BuildingLocation, parent_path: &str) {
        let path = join_path(parent_path, loc.name.as_deref().unwrap_or_default());
        for child in loc.children() {
            self.index_location(child, &path);
        }
        if let Some(id) = loc.id.as_deref() {
            self.location_paths.insert(id, path);
        }
    }

    /// Canonical address of a group address XML ID.
    ///
    /// Accepts full IDs (`P-0341-0_GA-12`) and the short form (`GA-12`)
    /// used by ETS6 link attributes.
    pub fn address_for_ga_id(&self, id: &str) -> Option<&str> {
        self.ga_addresses
            .get(id)
            .or_else(|| short_ga_id(id).and_then(|s| self.ga_addresses.get(s)))
            .map(String::as_str)
    }

    /// Device instance linked to a group address through a com object.
    pub fn device_for_ga_ref(&self, id: &str) -> Option<&DeviceRecord<'a>> {
        self.ga_devices
            .get(id)
            .or_else(|| short_ga_id(id).and_then(|s| self.ga_devices.get(s)))
            .map(|&slot| &self.devices[slot])
    }

    pub fn location_path(&self, id: &str) -> Option<&str> {
        self.location_paths.get(id).map(String::as_str)
    }

    /// Resolve manufacturer, hardware, and application program names.
    pub fn device_metadata(&self, record: &DeviceRecord<'a>) -> DeviceMetadata {
        let product_ref = record.instance.product_ref_id.as_deref().unwrap_or_default();
        let lookup = |map: &HashMap<&'a str, &'a str>, key: Option<&str>| {
            key.and_then(|k| map.get(k)).map(|name| (*name).to_string())
        };
        DeviceMetadata {
            manufacturer: lookup(&self.manufacturers, manufacturer_id(product_ref)),
            product_model: lookup(&self.hardware, hardware_id(product_ref)),
            application_program: lookup(
                &self.application_programs,
                record.instance.application_program_ref.as_deref(),
            ),
            individual_address: record.individual_address.clone(),
        }
    }
}

/// Manufacturer ID prefix of a product reference (`M-0083_H-...` -> `M-0083`).
pub fn manufacturer_id(product_ref: &str) -> Option<&str> {
    product_ref
        .split('_')
        .next()
        .filter(|id| !id.is_empty())
}

/// Hardware ID of a product reference: everything before `-HP-`.
pub fn hardware_id(product_ref: &str) -> Option<&str> {
    match product_ref.find("-HP-") {
        Some(idx) if idx > 0 => Some(&product_ref[..idx]),
        _ => None,
    }
}

fn short_ga_id(id: &str) -> Option<&str> {
    id.rsplit_once('_')
        .map(|(_, short)| short)
        .filter(|short| short.starts_with("GA-"))
}

fn compose_individual_address(area: &Area, line: &Line, device: &DeviceInstance) -> Option<String> {
    match (&area.address, &line.address, &device.address) {
        (Some(a), Some(l), Some(d)) if !a.is_empty() && !l.is_empty() && !d.is_empty() => {
            Some(format!("{a}.{l}.{d}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_ref_parts() {
        assert_eq!(manufacturer_id("M-0083_H-0001-HP-0001"), Some("M-0083"));
        assert_eq!(hardware_id("M-0083_H-0001-HP-0001"), Some("M-0083_H-0001"));
        assert_eq!(hardware_id("-HP-0001"), None);
        assert_eq!(hardware_id("M-0083_H-0001"), None);
        assert_eq!(manufacturer_id(""), None);
    }

    #[test]
    fn short_ids() {
        assert_eq!(short_ga_id("P-0341-0_GA-12"), Some("GA-12"));
        assert_eq!(short_ga_id("P-0341-0_DI-1"), None);
        assert_eq!(short_ga_id("GA-12"), None);
    }
}
