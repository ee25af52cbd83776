use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod cat;
pub mod verify;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append records to a file.
    Write(WriteArgs),
    /// Print the records of a file, optionally following new ones.
    Cat(CatArgs),
    /// Check every record checksum in a file.
    Verify(VerifyArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Write(args) => write::run(args, format),
        Command::Cat(args) => cat::run(args, format),
        Command::Verify(args) => verify::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Record file to write.
    pub path: PathBuf,
    /// Record payload (repeatable, one record each).
    #[arg(long, short = 'd', conflicts_with_all = ["file", "stdin"])]
    pub data: Vec<String>,
    /// Write the contents of a file as a single record.
    #[arg(long, conflicts_with_all = ["data", "stdin"])]
    pub file: Option<PathBuf>,
    /// Write one record per line read from stdin.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub stdin: bool,
    /// Append to an existing file instead of truncating it.
    #[arg(long)]
    pub append: bool,
}

#[derive(Args, Debug)]
pub struct CatArgs {
    /// Record file to read.
    pub path: PathBuf,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<u64>,
    /// Keep waiting for records appended by a live writer.
    #[arg(long, short = 'f')]
    pub follow: bool,
    /// Delay between polls while following (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms", requires = "follow")]
    pub poll_interval: String,
    /// Stop following after this long without a new record (e.g. 30s).
    #[arg(long, requires = "follow")]
    pub idle_timeout: Option<String>,
    /// Refuse records larger than this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Record file to check.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
