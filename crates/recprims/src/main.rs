mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "recprims", version, about = "Checksummed record file CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_subcommand() {
        let cli = Cli::try_parse_from([
            "recprims",
            "write",
            "/tmp/test.rec",
            "--data",
            "one",
            "--data",
            "two",
        ])
        .expect("write args should parse");

        match cli.command {
            Command::Write(args) => assert_eq!(args.data, vec!["one", "two"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "recprims",
            "write",
            "/tmp/test.rec",
            "--stdin",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn idle_timeout_requires_follow() {
        let err = Cli::try_parse_from([
            "recprims",
            "cat",
            "/tmp/test.rec",
            "--idle-timeout",
            "1s",
        ])
        .expect_err("idle timeout without follow should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_cat_follow_with_global_flags() {
        let cli = Cli::try_parse_from([
            "recprims",
            "cat",
            "/tmp/test.rec",
            "--follow",
            "--count",
            "3",
            "--format",
            "json",
            "--log-level",
            "error",
        ])
        .expect("cat args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        match cli.command {
            Command::Cat(args) => {
                assert!(args.follow);
                assert_eq!(args.count, Some(3));
                assert_eq!(args.poll_interval, "100ms");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
