//! The import pipeline: extraction, both classifier tiers, locations,
//! warnings, and statistics.

use chrono::Utc;
use ets_ir::{DetectedDevice, GroupAddress, ParseResult, ParseWarning};
use ets_project::{Deadline, ImportError, ParseOptions, extract_source};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

use crate::location::{assign_location, build_locations};
use crate::rules::{DetectionRule, default_detection_rules};
use crate::statistics;
use crate::tier1::classify_functions;
use crate::tier2::classify_patterns;
use crate::warnings::{
    check_datapoints, dedupe_addresses, low_confidence, resolve_id_conflicts, truncate_names,
};

/// Parses ETS exports into device suggestions.
///
/// A parser holds no per-parse state; one instance can serve concurrent
/// parses from several threads.
#[derive(Debug, Clone)]
pub struct EtsParser {
    options: ParseOptions,
    rules: Vec<DetectionRule>,
}

impl Default for EtsParser {
    fn default() -> Self {
        EtsParser {
            options: ParseOptions::default(),
            rules: default_detection_rules(),
        }
    }
}

impl EtsParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the Tier-2 rule table. Rules are tried in the given order.
    pub fn with_rules(mut self, rules: Vec<DetectionRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }

    /// Read and parse a file from disk. The file name drives format
    /// detection.
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult, ImportError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = std::fs::metadata(path)?.len();
        if size > self.options.max_file_size {
            return Err(ImportError::FileTooLarge {
                entry: filename,
                limit: self.options.max_file_size,
            });
        }
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes, &filename)
    }

    /// Parse an upload under the configured timeout.
    pub fn parse_bytes(&self, bytes: &[u8], filename: &str) -> Result<ParseResult, ImportError> {
        self.parse_bytes_with_deadline(bytes, filename, &self.options.deadline())
    }

    /// Parse an upload under a caller-supplied deadline, which may carry a
    /// cancellation flag.
    pub fn parse_bytes_with_deadline(
        &self,
        bytes: &[u8],
        filename: &str,
        deadline: &Deadline,
    ) -> Result<ParseResult, ImportError> {
        let source_file = base_name(filename).to_string();
        let source = extract_source(bytes, &source_file, &self.options, deadline)?;
        log::debug!(
            "{}: extracted {} group addresses",
            source_file,
            source.addresses.len()
        );

        let mut warnings: Vec<ParseWarning> = Vec::new();
        let mut pool = source.addresses;
        warnings.extend(dedupe_addresses(&mut pool));
        warnings.extend(check_datapoints(&mut pool));

        let mut devices: Vec<DetectedDevice> = Vec::new();
        if let Some(xml) = source.project_xml.as_deref() {
            let tier1 = classify_functions(xml, &pool, deadline)?;
            pool.retain(|ga| !tier1.consumed_addresses.contains(&ga.address));
            devices = tier1.devices;
        }
        deadline.check("tier 1 classification")?;

        let tier2 = classify_patterns(&self.rules, pool, deadline)?;
        devices.extend(tier2.devices);
        let unmapped = tier2.unmapped;

        warnings.extend(resolve_id_conflicts(&mut devices));
        warnings.extend(truncate_names(&mut devices));

        let paths = hierarchy_paths(&unmapped, &devices);
        let (locations, location_warnings) = build_locations(paths.iter().map(String::as_str));
        warnings.extend(location_warnings);
        for device in &mut devices {
            warnings.extend(assign_location(device, &locations));
        }
        warnings.extend(low_confidence(&devices));

        let statistics = statistics::compute(&devices, &unmapped);
        let result = ParseResult {
            import_id: new_import_id(),
            source_file,
            format: source.format,
            ets_version: source.ets_version,
            parsed_at: Utc::now(),
            statistics,
            devices,
            unmapped_addresses: unmapped,
            locations,
            warnings,
        };

        log::info!(
            "{} ({}): {} devices ({} from functions), {} unmapped, {} locations, {} warnings",
            result.source_file,
            result.format,
            result.statistics.detected_devices,
            result.statistics.tier1_devices,
            result.statistics.unmapped_addresses,
            result.locations.len(),
            result.warnings.len()
        );
        Ok(result)
    }
}

/// Distinct non-empty paths, unmapped addresses first, in first-seen order.
fn hierarchy_paths(unmapped: &[GroupAddress], devices: &[DetectedDevice]) -> Vec<String> {
    let mut seen = HashSet::new();
    unmapped
        .iter()
        .map(|ga| ga.location.as_str())
        .chain(devices.iter().map(|d| d.source_location.as_str()))
        .filter(|path| !path.is_empty() && seen.insert(*path))
        .map(str::to_string)
        .collect()
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// `imp_` followed by 16 hex characters of a random UUID.
fn new_import_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("imp_{}", &hex[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_ids_are_unique() {
        let a = new_import_id();
        let b = new_import_id();
        assert_eq!(a.len(), 20);
        assert!(a.starts_with("imp_"));
        assert!(a[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn base_names() {
        assert_eq!(base_name("uploads/house.knxproj"), "house.knxproj");
        assert_eq!(base_name(r"C:\exports\ga.csv"), "ga.csv");
        assert_eq!(base_name("ga.xml"), "ga.xml");
    }

    #[test]
    fn paths_are_unique_and_ordered() {
        let unmapped = vec![
            GroupAddress::new("1/0/0", "A", "").with_location("Lighting > Hall"),
            GroupAddress::new("1/0/1", "B", ""),
            GroupAddress::new("1/0/2", "C", "").with_location("Lighting > Hall"),
        ];
        let mut device = DetectedDevice::new("D", "light_switch", "lighting", 0.9);
        device.source_location = "Lighting > Kitchen".to_string();
        assert_eq!(
            hierarchy_paths(&unmapped, &[device]),
            vec!["Lighting > Hall", "Lighting > Kitchen"]
        );
    }

    #[test]
    fn builder_overrides() {
        let parser = EtsParser::new()
            .with_rules(Vec::new())
            .with_options(ParseOptions {
                timeout: None,
                ..Default::default()
            });
        assert!(parser.rules().is_empty());
        assert_eq!(parser.options().timeout, None);
        assert_eq!(EtsParser::new().rules().len(), 11);
    }
}
