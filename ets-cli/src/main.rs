mod info;
mod parse;
mod validate;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ets_detect::EtsParser;
use ets_project::ParseOptions;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "ets-import",
    about = "Import KNX ETS exports and suggest devices, rooms, and areas"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Reject inputs larger than this many MiB
    #[arg(long, global = true, default_value_t = 50)]
    max_size_mb: u64,

    /// Abort a parse after this many seconds (0 disables the limit)
    #[arg(long, global = true, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Parse ETS exports (.knxproj, .xml, .csv) into import results
    Parse {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file for a single input (default: stdout)
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Output directory, one result file per input
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Result serialization
        #[arg(long, value_enum, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Print a summary of what an export contains
    Info {
        /// Input file (.knxproj, .xml, .csv)
        input: PathBuf,
    },

    /// Parse an export and check the result's invariants
    Validate {
        /// Input file (.knxproj, .xml, .csv)
        input: PathBuf,

        /// Suppress individual error output
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yml",
        }
    }
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

fn init_logging(level: &str) -> Result<()> {
    if !LOG_LEVELS.contains(&level) {
        bail!(
            "Unknown log level: {level}. Use one of {}",
            LOG_LEVELS.join(", ")
        );
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    Ok(())
}

fn build_parser(max_size_mb: u64, timeout_secs: u64) -> EtsParser {
    let max_size = max_size_mb.saturating_mul(1024 * 1024);
    EtsParser::new().with_options(ParseOptions {
        max_file_size: max_size,
        max_entry_size: max_size,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    let parser = build_parser(cli.max_size_mb, cli.timeout_secs);

    match cli.command {
        Command::Parse {
            inputs,
            output,
            out_dir,
            output_format,
        } => match (inputs.as_slice(), out_dir) {
            (_, Some(dir)) => parse::run_batch_parse(&parser, &inputs, &dir, output_format),
            ([input], None) => parse::run_parse(&parser, input, output.as_deref(), output_format),
            _ => bail!("Several inputs need --out-dir to write one result per input"),
        },

        Command::Info { input } => info::run_info(&parser, &input),

        Command::Validate { input, quiet } => validate::run_validate(&parser, &input, quiet),
    }
}
