//! ETS XML deserialization model.
//!
//! Serde-deserializable types for the two ETS layouts this crate reads:
//! the standalone `GroupAddresses.xml` export and the `KNX` project document
//! (`0.xml`). Uses quick-xml with `#[serde(rename = "@Attr")]` for
//! attributes. Unknown elements and attributes (including `xmlns`) are
//! ignored, so one model covers ETS4 through ETS6 files.

use serde::Deserialize;

use crate::error::ImportError;

// --- GroupAddresses.xml ---

#[derive(Debug, Deserialize, Default)]
pub struct GroupAddressesDocument {
    #[serde(rename = "GroupRange", default)]
    pub ranges: Vec<GroupRange>,
}

// --- Group ranges (shared by both layouts) ---

#[derive(Debug, Deserialize)]
pub struct GroupRange {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "GroupRange", default)]
    pub ranges: Vec<GroupRange>,
    #[serde(rename = "GroupAddress", default)]
    pub addresses: Vec<XmlGroupAddress>,
}

#[derive(Debug, Deserialize)]
pub struct XmlGroupAddress {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Address")]
    pub address: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "@DatapointType")]
    pub datapoint_type: Option<String>,
    #[serde(rename = "@Description")]
    pub description: Option<String>,
    #[serde(rename = "Links")]
    pub links: Option<LinksWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct LinksWrapper {
    #[serde(rename = "Link", default)]
    pub items: Vec<Link>,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    #[serde(rename = "@RefId")]
    pub ref_id: Option<String>,
}

// --- KNX project document (0.xml) ---

#[derive(Debug, Deserialize, Default)]
pub struct KnxDocument {
    #[serde(rename = "@ToolVersion")]
    pub tool_version: Option<String>,
    #[serde(rename = "ManufacturerData")]
    pub manufacturer_data: Option<ManufacturerData>,
    #[serde(rename = "Project", default)]
    pub projects: Vec<Project>,
}

impl KnxDocument {
    pub fn installations(&self) -> impl Iterator<Item = &Installation> {
        self.projects
            .iter()
            .filter_map(|p| p.installations.as_ref())
            .flat_map(|w| w.items.iter())
    }

    /// Top-level group ranges of every installation.
    pub fn group_ranges(&self) -> impl Iterator<Item = &GroupRange> {
        self.installations()
            .filter_map(|i| i.group_addresses.as_ref())
            .filter_map(|g| g.group_ranges.as_ref())
            .flat_map(|w| w.items.iter())
    }

    pub fn has_functions(&self) -> bool {
        self.installations()
            .filter_map(|i| i.trades.as_ref())
            .any(|t| t.items.iter().any(Trade::has_functions))
    }
}

#[derive(Debug, Deserialize)]
pub struct Project {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "Installations")]
    pub installations: Option<InstallationsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct InstallationsWrapper {
    #[serde(rename = "Installation", default)]
    pub items: Vec<Installation>,
}

#[derive(Debug, Deserialize)]
pub struct Installation {
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "GroupAddresses")]
    pub group_addresses: Option<GroupAddressesSection>,
    #[serde(rename = "Topology")]
    pub topology: Option<Topology>,
    #[serde(rename = "Trades")]
    pub trades: Option<TradesWrapper>,
    #[serde(rename = "Locations")]
    pub locations: Option<LocationsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct GroupAddressesSection {
    #[serde(rename = "GroupRanges")]
    pub group_ranges: Option<GroupRangesWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct GroupRangesWrapper {
    #[serde(rename = "GroupRange", default)]
    pub items: Vec<GroupRange>,
}

// --- Topology ---

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(rename = "Area", default)]
    pub areas: Vec<Area>,
}

#[derive(Debug, Deserialize)]
pub struct Area {
    #[serde(rename = "@Address")]
    pub address: Option<String>,
    #[serde(rename = "Line", default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
pub struct Line {
    #[serde(rename = "@Address")]
    pub address: Option<String>,
    #[serde(rename = "DeviceInstance", default)]
    pub devices: Vec<DeviceInstance>,
    // ETS6 nests devices one level deeper
    #[serde(rename = "Segment", default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
pub struct Segment {
    #[serde(rename = "DeviceInstance", default)]
    pub devices: Vec<DeviceInstance>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceInstance {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "@Address")]
    pub address: Option<String>,
    #[serde(rename = "@IndividualAddress")]
    pub individual_address: Option<String>,
    #[serde(rename = "@ProductRefId")]
    pub product_ref_id: Option<String>,
    #[serde(rename = "@ApplicationProgramRef")]
    pub application_program_ref: Option<String>,
    #[serde(rename = "ComObjectInstanceRefs")]
    pub com_object_refs: Option<ComObjectInstanceRefsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct ComObjectInstanceRefsWrapper {
    #[serde(rename = "ComObjectInstanceRef", default)]
    pub items: Vec<ComObjectInstanceRef>,
}

#[derive(Debug, Deserialize)]
pub struct ComObjectInstanceRef {
    #[serde(rename = "@RefId")]
    pub ref_id: Option<String>,
    #[serde(rename = "@DatapointType")]
    pub datapoint_type: Option<String>,
    /// Space-separated group address references (ETS5.7+).
    #[serde(rename = "@Links")]
    pub links: Option<String>,
    #[serde(rename = "Connectors")]
    pub connectors: Option<Connectors>,
}

#[derive(Debug, Deserialize)]
pub struct Connectors {
    #[serde(rename = "Send", default)]
    pub send: Vec<Connector>,
    #[serde(rename = "Receive", default)]
    pub receive: Vec<Connector>,
}

#[derive(Debug, Deserialize)]
pub struct Connector {
    #[serde(rename = "@GroupAddressRefId")]
    pub group_address_ref_id: Option<String>,
}

// --- Trades / Functions ---

#[derive(Debug, Deserialize)]
pub struct TradesWrapper {
    #[serde(rename = "Trade", default)]
    pub items: Vec<Trade>,
}

#[derive(Debug, Deserialize)]
pub struct Trade {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "Function", default)]
    pub functions: Vec<Function>,
    #[serde(rename = "Trade", default)]
    pub trades: Vec<Trade>,
}

impl Trade {
    fn has_functions(&self) -> bool {
        !self.functions.is_empty() || self.trades.iter().any(Trade::has_functions)
    }
}

#[derive(Debug, Deserialize)]
pub struct Function {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "@Type")]
    pub function_type: Option<String>,
    #[serde(rename = "@Comment")]
    pub comment: Option<String>,
    #[serde(rename = "GroupAddressRefs")]
    pub group_address_refs: Option<GroupAddressRefsWrapper>,
    #[serde(rename = "LocationReference", default)]
    pub location_refs: Vec<LocationReference>,
}

#[derive(Debug, Deserialize)]
pub struct GroupAddressRefsWrapper {
    #[serde(rename = "GroupAddressRef", default)]
    pub items: Vec<GroupAddressRef>,
}

#[derive(Debug, Deserialize)]
pub struct GroupAddressRef {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@RefId")]
    pub ref_id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationReference {
    #[serde(rename = "@RefId")]
    pub ref_id: Option<String>,
}

// --- Building locations ---

#[derive(Debug, Deserialize)]
pub struct LocationsWrapper {
    #[serde(rename = "Location", default)]
    pub locations: Vec<BuildingLocation>,
    #[serde(rename = "Space", default)]
    pub spaces: Vec<BuildingLocation>,
}

/// A `Location` (ETS project files) or `Space` (ETS5+) element.
#[derive(Debug, Deserialize)]
pub struct BuildingLocation {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "@Type")]
    pub location_type: Option<String>,
    #[serde(rename = "Location", default)]
    pub locations: Vec<BuildingLocation>,
    #[serde(rename = "Space", default)]
    pub spaces: Vec<BuildingLocation>,
}

impl BuildingLocation {
    pub fn children(&self) -> impl Iterator<Item = &BuildingLocation> {
        self.locations.iter().chain(self.spaces.iter())
    }
}

// --- Manufacturer data ---

#[derive(Debug, Deserialize)]
pub struct ManufacturerData {
    #[serde(rename = "Manufacturer", default)]
    pub manufacturers: Vec<Manufacturer>,
}

#[derive(Debug, Deserialize)]
pub struct Manufacturer {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "ApplicationProgram", default)]
    pub application_programs: Vec<NamedItem>,
    #[serde(rename = "ApplicationPrograms")]
    pub application_programs_wrapper: Option<ApplicationProgramsWrapper>,
    /// Either a flat `Hardware` item or the ETS `Hardware` container.
    #[serde(rename = "Hardware", default)]
    pub hardware: Vec<Hardware>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationProgramsWrapper {
    #[serde(rename = "ApplicationProgram", default)]
    pub items: Vec<NamedItem>,
}

#[derive(Debug, Deserialize)]
pub struct NamedItem {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Hardware {
    #[serde(rename = "@Id")]
    pub id: Option<String>,
    #[serde(rename = "@Name")]
    pub name: Option<String>,
    #[serde(rename = "Hardware", default)]
    pub items: Vec<Hardware>,
}

// --- Entry points ---

pub fn parse_group_addresses_document(xml: &str) -> Result<GroupAddressesDocument, ImportError> {
    quick_xml::de::from_str(xml)
        .map_err(|e| ImportError::invalid(format!("GroupAddresses.xml schema: {e}")))
}

pub fn parse_knx_document(xml: &str) -> Result<KnxDocument, ImportError> {
    quick_xml::de::from_str(xml).map_err(|e| ImportError::invalid(format!("project schema: {e}")))
}
