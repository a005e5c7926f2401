use ets_project::{DeviceMetadata, ProjectIndex, parse_knx_document};
use pretty_assertions::assert_eq;

fn project_functions_xml() -> &'static str {
    include_str!("../../test-fixtures/ets/project_functions.xml")
}

const ETS6_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<KNX xmlns="http://knx.org/xml/project/23">
  <Project Id="P-0341">
    <Installations>
      <Installation Name="">
        <Topology>
          <Area Id="P-0341-0_A-1" Address="1">
            <Line Id="P-0341-0_L-1" Address="2">
              <Segment Id="P-0341-0_S-1">
                <DeviceInstance Id="P-0341-0_DI-7" Address="5" ProductRefId="M-00C8_H-77-HP-01">
                  <ComObjectInstanceRefs>
                    <ComObjectInstanceRef RefId="O-1_R-1" Links="GA-12 GA-13"/>
                  </ComObjectInstanceRefs>
                </DeviceInstance>
              </Segment>
            </Line>
          </Area>
        </Topology>
        <Locations>
          <Space Id="P-0341-0_BP-1" Name="House" Type="Building">
            <Space Id="P-0341-0_BP-2" Name="Ground Floor" Type="Floor">
              <Space Id="P-0341-0_BP-3" Name="Hall" Type="Room"/>
            </Space>
          </Space>
        </Locations>
        <GroupAddresses>
          <GroupRanges>
            <GroupRange Id="P-0341-0_GR-1" Name="Lighting">
              <GroupAddress Id="P-0341-0_GA-12" Address="2305" Name="Hall Light"/>
              <GroupAddress Id="P-0341-0_GA-13" Address="2306" Name="Hall Light Status"/>
            </GroupRange>
          </GroupRanges>
        </GroupAddresses>
        <Trades>
          <Trade Id="P-0341-0_T-1" Name="Electrical">
            <Trade Id="P-0341-0_T-2" Name="Lighting">
              <Function Id="P-0341-0_F-1" Name="Hall Light" Type="SwitchableLight">
                <GroupAddressRefs>
                  <GroupAddressRef Id="P-0341-0_F-1_GAR-1" RefId="P-0341-0_GA-12" Name="switch"/>
                </GroupAddressRefs>
                <LocationReference RefId="P-0341-0_BP-3"/>
              </Function>
            </Trade>
          </Trade>
        </Trades>
      </Installation>
    </Installations>
  </Project>
  <ManufacturerData>
    <Manufacturer Id="M-00C8" Name="MDT">
      <Hardware>
        <Hardware Id="M-00C8_H-77" Name="AKS-0816.03"/>
      </Hardware>
    </Manufacturer>
  </ManufacturerData>
</KNX>"#;

#[test]
fn test_group_address_ids_resolve() {
    let doc = parse_knx_document(project_functions_xml()).unwrap();
    let index = ProjectIndex::build(&doc);

    assert_eq!(index.address_for_ga_id("GA-001"), Some("1/0/1"));
    assert_eq!(index.address_for_ga_id("GA-006"), Some("4/0/1"));
    assert_eq!(index.address_for_ga_id("GA-999"), None);
}

#[test]
fn test_functions_in_document_order() {
    let doc = parse_knx_document(project_functions_xml()).unwrap();
    assert!(doc.has_functions());
    let index = ProjectIndex::build(&doc);

    let names: Vec<&str> = index
        .functions
        .iter()
        .filter_map(|f| f.name.as_deref())
        .collect();
    assert_eq!(names, vec!["Kitchen Light", "Kitchen Thermostat", "Kitchen Presence"]);
}

#[test]
fn test_device_metadata_from_send_connectors() {
    let doc = parse_knx_document(project_functions_xml()).unwrap();
    let index = ProjectIndex::build(&doc);

    let record = index.device_for_ga_ref("GA-002").expect("linked device");
    assert_eq!(record.instance.id.as_deref(), Some("D-0001"));
    assert_eq!(
        index.device_metadata(record),
        DeviceMetadata {
            manufacturer: Some("ABB".to_string()),
            product_model: Some("UD/S 4.315.2.1".to_string()),
            application_program: Some("Dimming Actuator 4-fold".to_string()),
            individual_address: Some("1.1.1".to_string()),
        }
    );
    assert!(index.device_for_ga_ref("GA-006").is_none());
}

#[test]
fn test_ets6_segments_links_and_spaces() {
    let doc = parse_knx_document(ETS6_XML).unwrap();
    let index = ProjectIndex::build(&doc);

    assert_eq!(index.devices.len(), 1);
    assert_eq!(index.address_for_ga_id("P-0341-0_GA-12"), Some("1/1/1"));

    // Links attributes use the short ID form
    let record = index.device_for_ga_ref("P-0341-0_GA-13").expect("linked device");
    let meta = index.device_metadata(record);
    assert_eq!(meta.manufacturer.as_deref(), Some("MDT"));
    assert_eq!(meta.product_model.as_deref(), Some("AKS-0816.03"));
    assert_eq!(meta.application_program, None);
    assert_eq!(meta.individual_address.as_deref(), Some("1.2.5"));

    assert_eq!(
        index.location_path("P-0341-0_BP-3"),
        Some("House > Ground Floor > Hall")
    );
    assert_eq!(index.functions.len(), 1);
}
