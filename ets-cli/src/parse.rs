use anyhow::{Context, Result, bail};
use ets_detect::EtsParser;
use ets_ir::ParseResult;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::OutputFormat;

pub fn render(result: &ParseResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(result).context("writing JSON")?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Yaml => serde_yaml::to_string(result).context("writing YAML"),
    }
}

pub fn parse_input(parser: &EtsParser, input: &Path) -> Result<ParseResult> {
    let start = Instant::now();
    let result = parser
        .parse_file(input)
        .with_context(|| format!("parsing {}", input.display()))?;
    log::debug!(
        "Parse time for {}: {:.1}ms",
        input.display(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(result)
}

/// Parse one input and write the result to `output`, or stdout.
pub fn run_parse(
    parser: &EtsParser,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let result = parse_input(parser, input)?;
    let text = render(&result, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Written: {}", path.display());
            eprintln!(
                "Parsed {} -> {} ({} devices, {} unmapped)",
                input.display(),
                path.display(),
                result.statistics.detected_devices,
                result.statistics.unmapped_addresses
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub fn run_batch_parse(
    parser: &EtsParser,
    inputs: &[PathBuf],
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    use rayon::prelude::*;

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    }

    let results: Vec<(PathBuf, Result<()>)> = inputs
        .par_iter()
        .map(|input| {
            let stem = input.file_stem().unwrap_or_default();
            let out_path =
                output_dir.join(format!("{}.{}", stem.to_string_lossy(), format.extension()));
            let result = run_parse(parser, input, Some(&out_path), format);
            (input.clone(), result)
        })
        .collect();

    let mut failed = 0;
    for (input, result) in &results {
        if let Err(e) = result {
            eprintln!("FAILED {}: {e:#}", input.display());
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files failed to parse", inputs.len());
    }

    println!(
        "Batch complete: {} files parsed to {}",
        inputs.len(),
        output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen_csv() -> &'static str {
        include_str!("../../test-fixtures/ets/kitchen.csv")
    }

    #[test]
    fn render_json_and_yaml() {
        let result = EtsParser::new()
            .parse_bytes(kitchen_csv().as_bytes(), "kitchen.csv")
            .unwrap();

        let json = render(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["devices"][0]["detected_type"], "light_dimmer");

        let yaml = render(&result, OutputFormat::Yaml).unwrap();
        let back: ParseResult = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.devices.len(), 1);
        assert_eq!(back.import_id, result.import_id);
    }

    #[test]
    fn batch_writes_one_file_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("kitchen.csv");
        let b = dir.path().join("hall.csv");
        std::fs::write(&a, kitchen_csv()).unwrap();
        std::fs::write(&b, "Address,Name,DatapointType\n1/1/0,Hall Light Switch,DPST-1-1\n")
            .unwrap();
        let out = dir.path().join("out");

        run_batch_parse(&EtsParser::new(), &[a, b], &out, OutputFormat::Json).unwrap();
        assert!(out.join("kitchen.json").exists());
        assert!(out.join("hall.json").exists());
    }

    #[test]
    fn batch_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("kitchen.csv");
        std::fs::write(&good, kitchen_csv()).unwrap();
        let missing = dir.path().join("missing.csv");

        let err = run_batch_parse(
            &EtsParser::new(),
            &[good, missing],
            dir.path(),
            OutputFormat::Yaml,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 files failed to parse");
        assert!(dir.path().join("kitchen.yml").exists());
    }
}
