use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use crater_fsw::FswConfig;

use crate::exit::{fsw_error, io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod run;
pub mod step;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one flight executive tick over a recorded input file.
    Step(StepArgs),
    /// Run the flight executive tick loop until Ctrl-C or a tick limit.
    Run(RunArgs),
    /// Print the frames found in a byte file.
    Decode(DecodeArgs),
    /// Encode JSON messages into frame bytes.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Step(args) => step::run(args, format),
        Command::Run(args) => run::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Load an executive configuration file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> CliResult<FswConfig> {
    let Some(path) = path else {
        return Ok(FswConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    FswConfig::from_json(&text)
        .map_err(|err| fsw_error(&format!("failed loading {}", path.display()), err))
}

#[derive(Args, Debug)]
pub struct StepArgs {
    /// Executive configuration (JSON). Default: built-in defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Bytes received since the previous tick.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,
    /// Where to write the frames produced by the tick.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Executive configuration (JSON). Default: built-in defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Input byte stream. Default: no input.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Output byte stream (created or truncated).
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,
    /// Stop after N ticks.
    #[arg(long)]
    pub ticks: Option<u64>,
    /// Sleep one tick period between ticks.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Byte file to scan for frames.
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// One message object or an array of them, tagged with `"type"`.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON document from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Write frames here instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Sequence number of the first frame.
    #[arg(long, default_value_t = 0)]
    pub seq: u8,
    /// System id stamped on every frame.
    #[arg(long, default_value_t = crater_link::SYSTEM_ID)]
    pub sys_id: u8,
    /// Component id stamped on every frame.
    #[arg(long, default_value_t = 1)]
    pub comp_id: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
