//! ETS CSV group address export parser.

use ets_ir::{GroupAddress, is_valid_address};
use std::collections::HashMap;

use crate::deadline::Deadline;
use crate::error::ImportError;

const ADDRESS_COLUMNS: &[&str] = &["address", "groupaddress", "group address", "ga"];
const NAME_COLUMNS: &[&str] = &["name", "group name", "description", "bezeichnung"];
const DPT_COLUMNS: &[&str] = &["datapointtype", "dpt", "datapoint"];
const DESCRIPTION_COLUMNS: &[&str] = &["description", "beschreibung"];

const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Separators ETS and spreadsheet exports use, in tie-break order.
const DELIMITERS: &[u8] = b",\t;";

/// Parse a CSV export. The first record is the header; rows whose address
/// is not a valid group address are skipped.
pub fn parse_csv(text: &str, deadline: &Deadline) -> Result<Vec<GroupAddress>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| ImportError::invalid(format!("CSV header: {e}")))?,
        None => return Err(ImportError::no_addresses(&["csv"])),
    };
    if header.iter().all(str::is_empty) {
        return Err(ImportError::no_addresses(&["csv"]));
    }

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, col)| (col.to_lowercase(), i))
        .collect();

    let address_col = find_column(&columns, ADDRESS_COLUMNS).ok_or_else(|| {
        ImportError::invalid(format!(
            "CSV header has no address column (expected one of: {})",
            ADDRESS_COLUMNS.join(", ")
        ))
    })?;
    let name_col = find_column(&columns, NAME_COLUMNS);
    let dpt_col = find_column(&columns, DPT_COLUMNS);
    let description_col =
        find_column(&columns, DESCRIPTION_COLUMNS).filter(|c| Some(*c) != name_col);

    let mut out = Vec::new();
    for (row, record) in records.enumerate() {
        if row % DEADLINE_CHECK_INTERVAL == 0 {
            deadline.check("csv parsing")?;
        }
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::debug!("csv: skipping row {}: {}", row + 2, e);
                continue;
            }
        };
        let field = |col: Option<usize>| col.and_then(|c| record.get(c));

        let Some(address) = field(Some(address_col)) else {
            continue;
        };
        if !is_valid_address(address) {
            continue;
        }

        let ga = GroupAddress::new(
            address,
            field(name_col).unwrap_or_default(),
            field(dpt_col).unwrap_or_default(),
        )
        .with_description(field(description_col).unwrap_or_default());
        out.push(ga);
    }

    if out.is_empty() {
        return Err(ImportError::no_addresses(&["csv"]));
    }
    log::debug!("csv: {} group addresses", out.len());
    Ok(out)
}

/// Pick the separator that occurs most often in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = (DELIMITERS[0], 0);
    for &delimiter in DELIMITERS {
        let count = header.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn find_column(columns: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| columns.get(*n).copied())
}
