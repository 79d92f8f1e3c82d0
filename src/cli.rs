//! CLI argument parsing

use crate::targets;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the target argument
fn target_help() -> String {
    format!(
        "Target to use, as name[:key=value,...] [available: {}]",
        targets::target_names_short()
    )
}

#[derive(Parser)]
#[command(name = "atflasher")]
#[command(author, version, about = "Flash programmer for Artery AT32 microcontrollers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target and bank options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(short, long, help = target_help(), default_value = "dummy")]
    pub target: String,

    /// Flash bank as <base>,<size>,<index>,<target> (repeatable).
    /// Without any, bank 0 is main bank 1 at 0x08000000.
    #[arg(short, long = "bank")]
    pub banks: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every configured bank and print its geometry
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the chip identification line
    Info {
        #[command(flatten)]
        target: TargetArgs,

        /// Bank index
        #[arg(default_value_t = 0)]
        bank: u32,
    },

    /// Erase a whole main bank
    MassErase {
        #[command(flatten)]
        target: TargetArgs,

        /// Bank index
        #[arg(default_value_t = 0)]
        bank: u32,
    },

    /// Erase an inclusive range of sectors
    Erase {
        #[command(flatten)]
        target: TargetArgs,

        /// Bank index
        bank: u32,

        /// First sector
        first: u32,

        /// Last sector (inclusive)
        last: u32,
    },

    /// Program a file into an erased bank
    Write {
        #[command(flatten)]
        target: TargetArgs,

        /// Bank index
        bank: u32,

        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Offset into the bank (hex with 0x prefix, or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        offset: u32,

        /// Verify after writing
        #[arg(long)]
        verify: bool,
    },

    /// List supported chips
    ListChips {
        /// Only show chips whose name contains this string
        #[arg(long)]
        filter: Option<String>,
    },

    /// List available targets
    ListTargets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("0X1f"), Ok(0x1F));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xzz").is_err());
        assert!(parse_hex_u32("-1").is_err());
    }

    #[test]
    fn test_parse_write_command() {
        let cli = Cli::parse_from([
            "atflasher",
            "-v",
            "write",
            "-t",
            "dummy:flash_kb=64",
            "-b",
            "0x08000000,0,0,dummy",
            "0",
            "-i",
            "fw.bin",
            "--offset",
            "0x400",
            "--verify",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Write {
                target,
                bank,
                input,
                offset,
                verify,
            } => {
                assert_eq!(target.target, "dummy:flash_kb=64");
                assert_eq!(target.banks, vec!["0x08000000,0,0,dummy".to_string()]);
                assert_eq!(bank, 0);
                assert_eq!(input, PathBuf::from("fw.bin"));
                assert_eq!(offset, 0x400);
                assert!(verify);
            }
            _ => panic!("expected write command"),
        }
    }

    #[test]
    fn test_parse_erase_command() {
        let cli = Cli::parse_from(["atflasher", "erase", "1", "2", "5"]);
        match cli.command {
            Commands::Erase {
                target,
                bank,
                first,
                last,
            } => {
                assert_eq!(target.target, "dummy");
                assert!(target.banks.is_empty());
                assert_eq!((bank, first, last), (1, 2, 5));
            }
            _ => panic!("expected erase command"),
        }
    }

    #[test]
    fn test_erase_needs_three_arguments() {
        assert!(Cli::try_parse_from(["atflasher", "erase", "0", "1"]).is_err());
    }
}
