use anyhow::{Result, bail};
use ets_detect::EtsParser;
use ets_ir::{ParseResult, validate_result};
use std::path::Path;

use crate::parse::parse_input;

/// Invariant violations of a finished result, as display strings.
pub fn collect_errors(result: &ParseResult) -> Vec<String> {
    let mut errors: Vec<String> = match validate_result(result) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };
    if result.statistics.detected_devices != result.devices.len() {
        errors.push(format!(
            "statistics report {} devices, result holds {}",
            result.statistics.detected_devices,
            result.devices.len()
        ));
    }
    errors
}

pub fn run_validate(parser: &EtsParser, input: &Path, quiet: bool) -> Result<()> {
    let result = parse_input(parser, input)?;
    let errors = collect_errors(&result);

    if errors.is_empty() {
        if !quiet {
            println!(
                "{}: valid ({} devices, {} warnings)",
                input.display(),
                result.devices.len(),
                result.warnings.len()
            );
        }
        return Ok(());
    }

    if !quiet {
        for e in &errors {
            eprintln!("{}: {e}", input.display());
        }
    }

    bail!(
        "{} validation error{} in {}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        input.display()
    );
}
