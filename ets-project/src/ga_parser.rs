//! Structural group address parsers and their fallback chain.
//!
//! Each [`Schema`] is an independent attempt over the same XML text. A
//! chain runs its attempts in order and keeps the first non-empty result.

use ets_ir::{GroupAddress, is_valid_address};

use crate::deadline::Deadline;
use crate::error::ImportError;
use crate::ets_model::{self, GroupRange};
use crate::generic_scan::scan_generic;

/// Separator between hierarchy path segments.
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Standalone `GroupAddresses.xml` export.
    GroupAddresses,
    /// `KNX > Project > Installations > Installation > GroupAddresses`.
    Project,
    /// Attribute scan over every element.
    Generic,
}

impl Schema {
    pub fn name(self) -> &'static str {
        match self {
            Schema::GroupAddresses => "GroupAddresses.xml schema",
            Schema::Project => "project schema",
            Schema::Generic => "generic scan",
        }
    }

    fn attempt(self, xml: &str, deadline: &Deadline) -> Result<Vec<GroupAddress>, ImportError> {
        match self {
            Schema::GroupAddresses => parse_group_addresses_xml(xml),
            Schema::Project => parse_project_xml(xml),
            Schema::Generic => scan_generic(xml, deadline),
        }
    }
}

/// Chain for `GroupAddresses.xml` found inside an archive.
pub const GROUP_ADDRESSES_CHAIN: &[Schema] = &[Schema::GroupAddresses, Schema::Generic];
/// Chain for the project file (`0.xml`) inside an archive.
pub const PROJECT_CHAIN: &[Schema] = &[Schema::Project, Schema::Generic];
/// Chain for a standalone XML upload of unknown layout.
pub const STANDALONE_CHAIN: &[Schema] = &[Schema::GroupAddresses, Schema::Project, Schema::Generic];

/// Run `chain` over `xml` and return the first non-empty address list.
///
/// Fails with `NoGroupAddresses` when every attempt came back empty, or
/// with the last attempt's error when none of them could read the text.
pub fn parse_with_fallback(
    xml: &str,
    chain: &[Schema],
    deadline: &Deadline,
) -> Result<Vec<GroupAddress>, ImportError> {
    let mut tried = Vec::new();
    let mut last_error = None;
    let mut any_readable = false;

    for schema in chain {
        deadline.check("xml parsing")?;
        tried.push(schema.name());
        match schema.attempt(xml, deadline) {
            Ok(addresses) if !addresses.is_empty() => {
                log::debug!("{}: {} group addresses", schema.name(), addresses.len());
                return Ok(addresses);
            }
            Ok(_) => {
                any_readable = true;
                log::debug!("{}: no group addresses", schema.name());
            }
            Err(e) if e.is_timeout() => return Err(e),
            Err(e) => {
                log::debug!("{} failed: {}", schema.name(), e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !any_readable => Err(e),
        _ => Err(ImportError::no_addresses(&tried)),
    }
}

/// Parser (a): nested `GroupRange` elements under the document root.
pub fn parse_group_addresses_xml(xml: &str) -> Result<Vec<GroupAddress>, ImportError> {
    let doc = ets_model::parse_group_addresses_document(xml)?;
    let mut out = Vec::new();
    collect_ranges(&doc.ranges, "", &mut out);
    Ok(out)
}

/// Parser (b): group ranges at the fixed installation path of a project
/// document.
pub fn parse_project_xml(xml: &str) -> Result<Vec<GroupAddress>, ImportError> {
    let doc = ets_model::parse_knx_document(xml)?;
    let ranges: Vec<&GroupRange> = doc.group_ranges().collect();
    log::debug!("project schema: {} top-level group ranges", ranges.len());
    let mut out = Vec::new();
    for range in ranges {
        collect_range(range, "", &mut out);
    }
    Ok(out)
}

fn collect_ranges(ranges: &[GroupRange], parent_path: &str, out: &mut Vec<GroupAddress>) {
    for range in ranges {
        collect_range(range, parent_path, out);
    }
}

fn collect_range(range: &GroupRange, parent_path: &str, out: &mut Vec<GroupAddress>) {
    let name = range.name.as_deref().unwrap_or_default();
    let path = join_path(parent_path, name);

    for xml_ga in &range.addresses {
        let raw = xml_ga.address.as_deref().unwrap_or_default().trim();
        if raw.is_empty() {
            continue;
        }
        if !is_valid_address(raw) {
            log::warn!("skipping group address '{}' in '{}': not a group address", raw, path);
            continue;
        }
        let mut ga = GroupAddress::new(
            raw,
            xml_ga.name.as_deref().unwrap_or_default(),
            xml_ga.datapoint_type.as_deref().unwrap_or_default(),
        )
        .with_location(path.clone())
        .with_description(xml_ga.description.as_deref().unwrap_or_default());
        if let Some(links) = &xml_ga.links {
            ga.linked_devices = links
                .items
                .iter()
                .filter_map(|l| l.ref_id.clone())
                .collect();
        }
        out.push(ga);
    }

    collect_ranges(&range.ranges, &path, out);
}

/// Append `segment` to a `" > "`-joined path.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GA_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<GroupAddresses xmlns="http://knx.org/xml/ga-export/01">
  <GroupRange Name="Lighting" RangeStart="2048" RangeEnd="4095">
    <GroupRange Name="Kitchen">
      <GroupAddress Name="Kitchen Switch" Address="1/0/1" DatapointType="DPST-1-1">
        <Links><Link RefId="P-0001-0_DI-1"/></Links>
      </GroupAddress>
      <GroupAddress Name="Kitchen Dimming" Address="2050" DatapointType="DPST-5-1" Description="main light"/>
    </GroupRange>
  </GroupRange>
</GroupAddresses>"#;

    const PROJECT_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<KNX xmlns="http://knx.org/xml/project/21">
  <Project Id="P-0001">
    <Installations>
      <Installation Name="">
        <GroupAddresses>
          <GroupRanges>
            <GroupRange Id="P-0001-0_GR-1" Name="HVAC">
              <GroupAddress Id="P-0001-0_GA-1" Address="4352" Name="Bath Temperature" DatapointType="DPST-9-1"/>
            </GroupRange>
          </GroupRanges>
        </GroupAddresses>
      </Installation>
    </Installations>
  </Project>
</KNX>"#;

    #[test]
    fn group_addresses_schema_builds_paths() {
        let gas = parse_group_addresses_xml(GA_XML).unwrap();
        assert_eq!(gas.len(), 2);
        assert_eq!(gas[0].address, "1/0/1");
        assert_eq!(gas[0].location, "Lighting > Kitchen");
        assert_eq!(gas[0].linked_devices, vec!["P-0001-0_DI-1".to_string()]);
        assert_eq!(gas[1].address, "1/0/2");
        assert_eq!(gas[1].dpt, "5.001");
        assert_eq!(gas[1].description, "main light");
    }

    #[test]
    fn project_schema_reads_installation_ranges() {
        let gas = parse_project_xml(PROJECT_XML).unwrap();
        assert_eq!(gas.len(), 1);
        assert_eq!(gas[0].address, "2/1/0");
        assert_eq!(gas[0].location, "HVAC");
        assert_eq!(gas[0].dpt, "9.001");
    }

    #[test]
    fn malformed_addresses_are_skipped() {
        let xml = r#"<GroupAddresses>
  <GroupRange Name="Lighting">
    <GroupAddress Name="Broken" Address="x/y" DatapointType="DPST-1-1"/>
    <GroupAddress Name="Overflow" Address="99999999999" DatapointType="DPST-1-1"/>
    <GroupAddress Name="Hall Switch" Address=" 1/0/7 " DatapointType="DPST-1-1"/>
  </GroupRange>
</GroupAddresses>"#;
        let gas = parse_group_addresses_xml(xml).unwrap();
        let addresses: Vec<&str> = gas.iter().map(|g| g.address.as_str()).collect();
        assert_eq!(addresses, vec!["1/0/7"]);

        let project = PROJECT_XML.replace(r#"Address="4352""#, r#"Address="4/x""#);
        assert!(parse_project_xml(&project).unwrap().is_empty());
    }

    #[test]
    fn schemas_do_not_read_each_other() {
        assert!(parse_group_addresses_xml(PROJECT_XML).unwrap().is_empty());
        assert!(parse_project_xml(GA_XML).unwrap().is_empty());
    }

    #[test]
    fn standalone_chain_falls_through_to_project() {
        let gas = parse_with_fallback(PROJECT_XML, STANDALONE_CHAIN, &Deadline::unbounded()).unwrap();
        assert_eq!(gas[0].location, "HVAC");
    }

    #[test]
    fn chain_reports_every_attempt() {
        let err = parse_with_fallback("<Empty/>", STANDALONE_CHAIN, &Deadline::unbounded())
            .unwrap_err();
        match err {
            ImportError::NoGroupAddresses { tried } => assert_eq!(tried.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_xml_is_invalid() {
        let err = parse_with_fallback("<a><b></a>", PROJECT_CHAIN, &Deadline::unbounded())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidFile { .. }), "{err}");
    }
}
