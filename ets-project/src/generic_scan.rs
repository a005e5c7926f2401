//! Schema-agnostic group address scan.
//!
//! Streams every start element and accepts any element carrying a
//! syntactically valid `Address` attribute. Hierarchy information is lost,
//! but unknown ETS layouts still yield their addresses.

use ets_ir::{GroupAddress, is_valid_address};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::deadline::Deadline;
use crate::error::ImportError;

const DEADLINE_CHECK_INTERVAL: usize = 4096;

#[derive(Default)]
struct CandidateAttrs {
    address: Option<String>,
    name: Option<String>,
    datapoint_type: Option<String>,
    dpt: Option<String>,
}

pub fn scan_generic(xml: &str, deadline: &Deadline) -> Result<Vec<GroupAddress>, ImportError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut events = 0usize;

    loop {
        events += 1;
        if events % DEADLINE_CHECK_INTERVAL == 0 {
            deadline.check("generic xml scan")?;
        }

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let attrs = candidate_attrs(&e)?;
                if let Some(ga) = to_group_address(attrs) {
                    out.push(ga);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ImportError::invalid(format!(
                    "generic scan at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }

    Ok(out)
}

fn candidate_attrs(e: &BytesStart<'_>) -> Result<CandidateAttrs, ImportError> {
    let mut attrs = CandidateAttrs::default();
    for a in e.attributes() {
        let a = a.map_err(|err| ImportError::invalid(format!("generic scan: {err}")))?;
        let slot = match a.key.local_name().as_ref() {
            b"Address" => &mut attrs.address,
            b"Name" => &mut attrs.name,
            b"DatapointType" => &mut attrs.datapoint_type,
            b"DPT" => &mut attrs.dpt,
            _ => continue,
        };
        let value = a
            .unescape_value()
            .map_err(|err| ImportError::invalid(format!("generic scan: {err}")))?;
        *slot = Some(value.into_owned());
    }
    Ok(attrs)
}

fn to_group_address(attrs: CandidateAttrs) -> Option<GroupAddress> {
    let address = attrs.address.filter(|a| is_valid_address(a))?;
    let dpt = attrs
        .datapoint_type
        .filter(|d| !d.is_empty())
        .or(attrs.dpt)
        .unwrap_or_default();
    Some(GroupAddress::new(
        &address,
        attrs.name.as_deref().unwrap_or_default(),
        &dpt,
    ))
}
