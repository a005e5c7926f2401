use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::normalize_address;
use crate::dpt::normalize_datapoint;
use crate::slug::{clean_name, slugify};

/// Upper bound for any suggested confidence. Suggestions are never certain.
pub const MAX_CONFIDENCE: f64 = 0.99;
/// Lower bound of the `high` confidence level.
pub const CONFIDENCE_HIGH: f64 = 0.80;
/// Lower bound of the `medium` confidence level.
pub const CONFIDENCE_MEDIUM: f64 = 0.50;

// --- Enumerations ---

/// Source format of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Knxproj,
    Xml,
    Csv,
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportFormat::Knxproj => "knxproj",
            ImportFormat::Xml => "xml",
            ImportFormat::Csv => "csv",
        })
    }
}

/// Communication flag suggested for a group address within a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFlag {
    Read,
    Write,
    Transmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Room,
    Floor,
}

/// Machine-readable code of a non-fatal parse warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    RoomNotFound,
    DptUnknown,
    DuplicateGa,
    DeviceConflict,
    LowConfidence,
    MissingDpt,
    NameTruncated,
    LocationAmbiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= CONFIDENCE_HIGH {
            ConfidenceLevel::High
        } else if confidence >= CONFIDENCE_MEDIUM {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

// --- Addresses ---

/// A group address as read from an ETS export.
///
/// `address` is always canonical `main/middle/sub` when it came through
/// [`GroupAddress::new`]; `dpt` is canonical `X.YYY` or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroupAddress {
    pub address: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dpt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Hierarchy path, segments joined with `" > "`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_devices: Vec<String>,
    /// Why the address was left unmapped. Only set on unmapped output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GroupAddress {
    /// Build a group address from raw export values, normalizing the
    /// address and datapoint type.
    pub fn new(raw_address: &str, name: &str, raw_dpt: &str) -> Self {
        GroupAddress {
            address: normalize_address(raw_address),
            name: name.to_string(),
            dpt: normalize_datapoint(raw_dpt.trim()),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A group address in the context of one detected device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub ga: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dpt: String,
    pub suggested_function: String,
    pub suggested_flags: Vec<AddressFlag>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl DeviceAddress {
    pub fn from_group(ga: &GroupAddress, function: &str, flags: &[AddressFlag]) -> Self {
        DeviceAddress {
            ga: ga.address.clone(),
            name: ga.name.clone(),
            dpt: ga.dpt.clone(),
            suggested_function: function.to_string(),
            suggested_flags: flags.to_vec(),
            description: ga.description.clone(),
        }
    }
}

// --- Devices ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedDevice {
    pub suggested_id: String,
    pub suggested_name: String,
    pub detected_type: String,
    pub confidence: f64,
    pub suggested_domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_room: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_area: String,
    pub addresses: Vec<DeviceAddress>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_location: String,

    // Tier-1 metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_comment: Option<String>,
}

impl DetectedDevice {
    /// A device without addresses, its ID and display name derived from
    /// `name`.
    pub fn new(name: &str, detected_type: &str, domain: &str, confidence: f64) -> Self {
        DetectedDevice {
            suggested_id: slugify(name),
            suggested_name: clean_name(name),
            detected_type: detected_type.to_string(),
            confidence,
            suggested_domain: domain.to_string(),
            suggested_room: String::new(),
            suggested_area: String::new(),
            addresses: Vec::new(),
            source_location: String::new(),
            manufacturer: None,
            product_model: None,
            application_program: None,
            individual_address: None,
            function_type: None,
            function_comment: None,
        }
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }

    /// Whether this device was classified from ETS function metadata.
    pub fn is_tier1(&self) -> bool {
        self.function_type.is_some()
    }
}

// --- Locations ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    /// Empty for root locations.
    #[serde(default)]
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_area_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_room_id: String,
}

// --- Result ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_addresses: Vec<String>,
}

impl ParseWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        ParseWarning {
            code,
            message: message.into(),
            affected_devices: Vec::new(),
            affected_addresses: Vec::new(),
        }
    }

    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.affected_devices = devices;
        self
    }

    pub fn with_addresses(mut self, addresses: Vec<String>) -> Self {
        self.affected_addresses = addresses;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ParseStatistics {
    pub total_group_addresses: usize,
    pub detected_devices: usize,
    pub tier1_devices: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    pub unmapped_addresses: usize,
}

/// Aggregate root of one parse invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub import_id: String,
    pub source_file: String,
    pub format: ImportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ets_version: Option<String>,
    pub parsed_at: DateTime<Utc>,
    pub statistics: ParseStatistics,
    pub devices: Vec<DetectedDevice>,
    pub unmapped_addresses: Vec<GroupAddress>,
    pub locations: Vec<Location>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseResult {
    pub fn warnings_with(&self, code: WarningCode) -> impl Iterator<Item = &ParseWarning> {
        self.warnings.iter().filter(move |w| w.code == code)
    }
}
