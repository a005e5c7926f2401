//! Bytes-to-addresses front end: format dispatch, container reading, and
//! the structural parsers.

use ets_ir::{GroupAddress, ImportFormat};

use crate::csv_parser::parse_csv;
use crate::deadline::Deadline;
use crate::error::ImportError;
use crate::format::detect_format;
use crate::ga_parser::{GROUP_ADDRESSES_CHAIN, PROJECT_CHAIN, STANDALONE_CHAIN, parse_with_fallback};
use crate::knxproj_reader::{extract_tool_version, read_knxproj};
use crate::options::ParseOptions;
use crate::text::decode_text;

/// Group addresses extracted from one ETS export, before classification.
#[derive(Debug)]
pub struct ExtractedSource {
    pub format: ImportFormat,
    pub ets_version: Option<String>,
    /// Flat list in document order; duplicates are kept.
    pub addresses: Vec<GroupAddress>,
    /// Project XML text, kept for function-based classification.
    pub project_xml: Option<String>,
}

/// Detect the format of `bytes` and extract its group addresses.
pub fn extract_source(
    bytes: &[u8],
    filename: &str,
    options: &ParseOptions,
    deadline: &Deadline,
) -> Result<ExtractedSource, ImportError> {
    if bytes.len() as u64 > options.max_file_size {
        return Err(ImportError::FileTooLarge {
            entry: filename.to_string(),
            limit: options.max_file_size,
        });
    }

    let format = detect_format(filename, bytes)?;
    log::debug!("{}: {} bytes as {}", filename, bytes.len(), format);
    deadline.check("format detection")?;

    match format {
        ImportFormat::Knxproj => extract_archive(bytes, options, deadline),
        ImportFormat::Xml => {
            let text = decode_text(bytes, filename)?;
            let addresses = parse_with_fallback(&text, STANDALONE_CHAIN, deadline)?;
            Ok(ExtractedSource {
                format,
                ets_version: extract_tool_version(&text),
                addresses,
                project_xml: Some(text),
            })
        }
        ImportFormat::Csv => {
            let text = decode_text(bytes, filename)?;
            Ok(ExtractedSource {
                format,
                ets_version: None,
                addresses: parse_csv(&text, deadline)?,
                project_xml: None,
            })
        }
    }
}

fn extract_archive(
    bytes: &[u8],
    options: &ParseOptions,
    deadline: &Deadline,
) -> Result<ExtractedSource, ImportError> {
    let contents = read_knxproj(bytes, options.max_entry_size, deadline)?;

    let (addresses, project_xml) = match (&contents.group_addresses_xml, &contents.project_xml) {
        (Some(data), project_data) => {
            let text = decode_text(data, "GroupAddresses.xml")?;
            let project = project_data.as_deref().and_then(decode_project_leniently);
            let addresses = match parse_with_fallback(&text, GROUP_ADDRESSES_CHAIN, deadline) {
                Ok(addresses) => addresses,
                Err(ImportError::NoGroupAddresses { mut tried }) => {
                    let Some(project_text) = project.as_deref() else {
                        return Err(ImportError::NoGroupAddresses { tried });
                    };
                    log::info!("GroupAddresses.xml is empty, reading 0.xml instead");
                    match parse_with_fallback(project_text, PROJECT_CHAIN, deadline) {
                        Err(ImportError::NoGroupAddresses { tried: more }) => {
                            tried.extend(more);
                            return Err(ImportError::NoGroupAddresses { tried });
                        }
                        other => other?,
                    }
                }
                Err(e) => return Err(e),
            };
            (addresses, project)
        }
        (None, Some(data)) => {
            log::info!("no GroupAddresses.xml in archive, reading 0.xml");
            let project = decode_text(data, "0.xml")?;
            (parse_with_fallback(&project, PROJECT_CHAIN, deadline)?, Some(project))
        }
        (None, None) => {
            return Err(ImportError::no_addresses(&["GroupAddresses.xml", "0.xml"]));
        }
    };

    Ok(ExtractedSource {
        format: ImportFormat::Knxproj,
        ets_version: contents.ets_version,
        addresses,
        project_xml,
    })
}

/// Decode `0.xml` when it only feeds function-based classification. A
/// broken project file then costs Tier-1 results, not the import.
fn decode_project_leniently(data: &[u8]) -> Option<String> {
    match decode_text(data, "0.xml") {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("ignoring project file: {}", e);
            None
        }
    }
}
