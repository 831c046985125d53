//! CLI argument parsing

use crate::backend;
use clap::{Parser, Subcommand};
use mramflash_core::driver::DEFAULT_NAME;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u64
pub fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Bus to use, e.g. dummy:chip=mr25h40 [available: {}]",
        backend::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "mramflash")]
#[command(author, version, about = "Everspin MR25Hxx SPI MRAM tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Device selection shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Programmer string: <bus>:chip=<variant>,key=value,...
    #[arg(short, long, help = programmer_help(), conflicts_with = "board")]
    pub programmer: Option<String>,

    /// Board file (RON) describing the attached MRAM devices
    #[arg(short, long)]
    pub board: Option<PathBuf>,

    /// Logical name of the device to operate on
    #[arg(short, long, default_value = DEFAULT_NAME)]
    pub device: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show device geometry and registration details
    Info {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Read MRAM contents to file
    Read {
        #[command(flatten)]
        target: TargetArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start offset (hex, e.g., 0x1000)
        #[arg(long, value_parser = parse_hex_u64, default_value = "0")]
        offset: u64,

        /// Number of bytes to read (default: to end of device)
        #[arg(long, value_parser = parse_hex_u64)]
        length: Option<u64>,
    },

    /// Write file to MRAM
    Write {
        #[command(flatten)]
        target: TargetArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start offset (hex, e.g., 0x1000)
        #[arg(long, value_parser = parse_hex_u64, default_value = "0")]
        offset: u64,

        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,
    },

    /// Fill MRAM with zeros
    Erase {
        #[command(flatten)]
        target: TargetArgs,

        /// Start offset (hex, e.g., 0x1000)
        #[arg(long, value_parser = parse_hex_u64, default_value = "0")]
        offset: u64,

        /// Number of bytes to erase (default: to end of device)
        #[arg(long, value_parser = parse_hex_u64)]
        length: Option<u64>,
    },

    /// List supported MRAM variants
    ListChips,

    /// List available buses
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x3FF0"), Ok(0x3FF0));
        assert_eq!(parse_hex_u64("0X10"), Ok(0x10));
        assert_eq!(parse_hex_u64("4096"), Ok(4096));
        assert!(parse_hex_u64("0xZZ").is_err());
        assert!(parse_hex_u64("").is_err());
    }

    #[test]
    fn test_parse_read_command() {
        let cli = Cli::try_parse_from([
            "mramflash",
            "read",
            "-p",
            "dummy:chip=mr25h40",
            "-o",
            "out.bin",
            "--offset",
            "0x100",
            "--length",
            "16",
        ])
        .unwrap();

        match cli.command {
            Commands::Read {
                target,
                output,
                offset,
                length,
            } => {
                assert_eq!(target.programmer.as_deref(), Some("dummy:chip=mr25h40"));
                assert_eq!(target.device, "mram0");
                assert_eq!(output, PathBuf::from("out.bin"));
                assert_eq!(offset, 0x100);
                assert_eq!(length, Some(16));
            }
            _ => panic!("expected read command"),
        }
    }

    #[test]
    fn test_verbosity_sets_log_filter() {
        let levels = [
            (vec!["mramflash", "list-chips"], log::LevelFilter::Info),
            (vec!["mramflash", "-v", "list-chips"], log::LevelFilter::Debug),
            (vec!["mramflash", "list-chips", "-vv"], log::LevelFilter::Trace),
        ];

        for (args, expected) in levels {
            let cli = Cli::try_parse_from(args).unwrap();
            let logger = env_logger::Builder::new()
                .parse_filters(cli.log_filter())
                .build();
            assert_eq!(logger.filter(), expected);
        }
    }

    #[test]
    fn test_programmer_conflicts_with_board() {
        let result = Cli::try_parse_from([
            "mramflash",
            "info",
            "-p",
            "dummy:chip=mr25h40",
            "-b",
            "board.ron",
        ]);
        assert!(result.is_err());
    }
}
