use ets_project::Deadline;
use ets_project::error::ImportError;
use ets_project::knxproj_reader::read_knxproj;
use std::io::{Cursor, Write};

const LIMIT: u64 = 1024 * 1024;

fn living_room_xml() -> &'static str {
    include_str!("../../test-fixtures/ets/living_room.xml")
}

fn create_knxproj_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let buf = Vec::new();
    let cursor = Cursor::new(buf);
    let mut zip = zip::ZipWriter::new(cursor);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }

    let cursor = zip.finish().unwrap();
    cursor.into_inner()
}

#[test]
fn test_finds_group_addresses_at_any_depth() {
    let bytes = create_knxproj_bytes(&[
        ("knx_master.xml", b"<KNX/>"),
        ("P-TEST/GroupAddresses.xml", living_room_xml().as_bytes()),
    ]);
    let contents = read_knxproj(&bytes, LIMIT, &Deadline::unbounded()).unwrap();
    assert_eq!(
        contents.group_addresses_xml.as_deref(),
        Some(living_room_xml().as_bytes())
    );
    assert!(contents.project_xml.is_none());
}

#[test]
fn test_entry_names_are_case_insensitive() {
    let bytes = create_knxproj_bytes(&[
        ("P-TEST/GROUPADDRESSES.XML", b"<GroupAddresses/>"),
        ("P-TEST/0.XML", b"<KNX/>"),
    ]);
    let contents = read_knxproj(&bytes, LIMIT, &Deadline::unbounded()).unwrap();
    assert!(contents.group_addresses_xml.is_some());
    assert!(contents.project_xml.is_some());
}

#[test]
fn test_first_project_file_wins() {
    let bytes = create_knxproj_bytes(&[
        ("P-0001/0.xml", b"<KNX first=\"1\"/>"),
        ("P-0002/0.xml", b"<KNX second=\"1\"/>"),
    ]);
    let contents = read_knxproj(&bytes, LIMIT, &Deadline::unbounded()).unwrap();
    assert_eq!(contents.project_xml.as_deref(), Some(&b"<KNX first=\"1\"/>"[..]));
}

#[test]
fn test_tool_version_from_project_xml() {
    let project = br#"<?xml version="1.0"?><KNX CreatedBy="ETS5" ToolVersion="5.7.1093.38570"><Project/></KNX>"#;
    let bytes = create_knxproj_bytes(&[
        ("P-TEST/project.xml", project),
        ("P-TEST/GroupAddresses.xml", living_room_xml().as_bytes()),
    ]);
    let contents = read_knxproj(&bytes, LIMIT, &Deadline::unbounded()).unwrap();
    assert_eq!(contents.ets_version.as_deref(), Some("5.7.1093.38570"));
}

#[test]
fn test_nested_project_archive_is_scanned() {
    let inner = create_knxproj_bytes(&[
        ("project.xml", br#"<KNX ToolVersion="6.1.0"/>"#),
        ("0.xml", b"<KNX/>"),
    ]);
    let outer = create_knxproj_bytes(&[("knx_master.xml", b"<KNX/>"), ("P-0341.zip", &inner)]);

    let contents = read_knxproj(&outer, LIMIT, &Deadline::unbounded()).unwrap();
    assert_eq!(contents.project_xml.as_deref(), Some(&b"<KNX/>"[..]));
    assert_eq!(contents.ets_version.as_deref(), Some("6.1.0"));
}

#[test]
fn test_nested_archive_ignored_when_payload_present() {
    let inner = create_knxproj_bytes(&[("0.xml", b"<KNX inner=\"1\"/>")]);
    let outer = create_knxproj_bytes(&[("P-0341/0.xml", b"<KNX/>"), ("P-0341.zip", &inner)]);

    let contents = read_knxproj(&outer, LIMIT, &Deadline::unbounded()).unwrap();
    assert_eq!(contents.project_xml.as_deref(), Some(&b"<KNX/>"[..]));
}

#[test]
fn test_oversized_entry_is_rejected() {
    let bytes = create_knxproj_bytes(&[("P-TEST/GroupAddresses.xml", living_room_xml().as_bytes())]);
    let err = read_knxproj(&bytes, 64, &Deadline::unbounded()).unwrap_err();
    match err {
        ImportError::FileTooLarge { entry, limit } => {
            assert_eq!(entry, "P-TEST/GroupAddresses.xml");
            assert_eq!(limit, 64);
        }
        other => panic!("expected FileTooLarge, got {other}"),
    }
}

#[test]
fn test_not_a_zip_is_corrupt() {
    let err = read_knxproj(b"not a zip file", LIMIT, &Deadline::unbounded()).unwrap_err();
    assert!(matches!(err, ImportError::CorruptArchive(_)), "{err}");
}

#[test]
fn test_archive_without_payload_is_empty() {
    let bytes = create_knxproj_bytes(&[("README.txt", b"nothing here")]);
    let contents = read_knxproj(&bytes, LIMIT, &Deadline::unbounded()).unwrap();
    assert!(contents.group_addresses_xml.is_none());
    assert!(contents.project_xml.is_none());
    assert!(contents.ets_version.is_none());
}

#[test]
fn test_expired_deadline_stops_scan() {
    let bytes = create_knxproj_bytes(&[("0.xml", b"<KNX/>")]);
    let deadline = Deadline::after(std::time::Duration::ZERO);
    let err = read_knxproj(&bytes, LIMIT, &deadline).unwrap_err();
    assert!(err.is_timeout(), "{err}");
}
