use regex::Regex;
use std::io::{Cursor, Read, Seek};
use std::sync::LazyLock;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::deadline::Deadline;
use crate::error::ImportError;

static TOOL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ToolVersion="([^"]+)""#).expect("tool version pattern"));

/// XML payloads pulled out of a `.knxproj` archive.
#[derive(Debug, Default)]
pub struct ArchiveContents {
    /// First `GroupAddresses.xml` at any depth.
    pub group_addresses_xml: Option<Vec<u8>>,
    /// First `0.xml` (the ETS project file).
    pub project_xml: Option<Vec<u8>>,
    /// `ToolVersion` attribute of `project.xml`.
    pub ets_version: Option<String>,
}

impl ArchiveContents {
    fn has_payload(&self) -> bool {
        self.group_addresses_xml.is_some() || self.project_xml.is_some()
    }
}

enum EntryKind {
    GroupAddresses,
    Project,
    ProjectInfo,
}

struct NestedProject {
    index: usize,
    name: String,
    encrypted: bool,
}

/// Read a `.knxproj` archive from memory.
///
/// Every decompressed entry is capped at `max_entry_size` bytes. When the
/// archive carries its project only inside a `P-*.zip` entry, that inner
/// archive is scanned once.
pub fn read_knxproj(
    bytes: &[u8],
    max_entry_size: u64,
    deadline: &Deadline,
) -> Result<ArchiveContents, ImportError> {
    read_archive(Cursor::new(bytes), max_entry_size, deadline, true)
}

fn read_archive<R: Read + Seek>(
    reader: R,
    limit: u64,
    deadline: &Deadline,
    allow_nested: bool,
) -> Result<ArchiveContents, ImportError> {
    let mut archive = ZipArchive::new(reader)?;
    log::debug!("archive contains {} entries", archive.len());

    let mut contents = ArchiveContents::default();
    let mut nested: Option<NestedProject> = None;

    for i in 0..archive.len() {
        deadline.check("archive scan")?;

        let (name, encrypted) = {
            let raw = archive.by_index_raw(i)?;
            if raw.is_dir() {
                continue;
            }
            (raw.name().to_string(), raw.encrypted())
        };
        let base = base_name(&name).to_lowercase();

        let kind = match base.as_str() {
            "groupaddresses.xml" if contents.group_addresses_xml.is_none() => EntryKind::GroupAddresses,
            "0.xml" if contents.project_xml.is_none() => EntryKind::Project,
            "project.xml" if contents.ets_version.is_none() => EntryKind::ProjectInfo,
            b if allow_nested && nested.is_none() && b.starts_with("p-") && b.ends_with(".zip") => {
                nested = Some(NestedProject {
                    index: i,
                    name,
                    encrypted,
                });
                continue;
            }
            _ => continue,
        };

        if encrypted {
            return Err(password_protected(&name));
        }
        let data = read_entry(&mut archive, i, &name, limit)?;
        match kind {
            EntryKind::GroupAddresses => contents.group_addresses_xml = Some(data),
            EntryKind::Project => contents.project_xml = Some(data),
            EntryKind::ProjectInfo => {
                contents.ets_version = extract_tool_version(&String::from_utf8_lossy(&data));
            }
        }
    }

    if !contents.has_payload() {
        if let Some(inner) = nested {
            if inner.encrypted {
                return Err(password_protected(&inner.name));
            }
            log::info!("descending into nested project archive {}", inner.name);
            let data = read_entry(&mut archive, inner.index, &inner.name, limit)?;
            let inner_contents = read_archive(Cursor::new(data), limit, deadline, false)?;
            return Ok(ArchiveContents {
                ets_version: inner_contents.ets_version.or(contents.ets_version),
                ..inner_contents
            });
        }
    }

    Ok(contents)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    name: &str,
    limit: u64,
) -> Result<Vec<u8>, ImportError> {
    let mut entry = archive.by_index(index).map_err(|e| match e {
        ZipError::UnsupportedArchive(msg) => {
            ImportError::UnsupportedVersion(format!("'{name}': {msg}"))
        }
        other => ImportError::CorruptArchive(other),
    })?;

    let too_large = || ImportError::FileTooLarge {
        entry: name.to_string(),
        limit,
    };
    if entry.size() > limit {
        return Err(too_large());
    }

    // Declared sizes can lie; cap the actual read as well.
    let mut data = Vec::new();
    entry
        .by_ref()
        .take(limit.saturating_add(1))
        .read_to_end(&mut data)
        .map_err(|e| ImportError::CorruptArchive(ZipError::Io(e)))?;
    if data.len() as u64 > limit {
        return Err(too_large());
    }

    log::info!("read archive entry {} ({} bytes)", name, data.len());
    Ok(data)
}

fn password_protected(name: &str) -> ImportError {
    ImportError::UnsupportedVersion(format!("'{name}' is password-protected"))
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Pull the `ToolVersion="..."` attribute value out of ETS project metadata.
pub fn extract_tool_version(text: &str) -> Option<String> {
    TOOL_VERSION
        .captures(text)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_names() {
        assert_eq!(base_name("P-0001/GroupAddresses.xml"), "GroupAddresses.xml");
        assert_eq!(base_name("P-0001\\0.xml"), "0.xml");
        assert_eq!(base_name("0.xml"), "0.xml");
    }

    #[test]
    fn tool_version() {
        let xml = r#"<KNX CreatedBy="ETS5" ToolVersion="5.7.1093.38570">"#;
        assert_eq!(extract_tool_version(xml).as_deref(), Some("5.7.1093.38570"));
        assert_eq!(extract_tool_version("<KNX/>"), None);
    }
}
