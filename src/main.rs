//! atflasher - Flash programmer for Artery AT32 microcontrollers
//!
//! Drives the embedded flash controller (EFC) of AT32 parts through a debug
//! probe's memory access port.
//!
//! # Architecture
//!
//! All flash logic lives in `atflasher-core`, written against the
//! `MemoryTransport` trait. A target is anything that implements that trait,
//! such as the in-memory emulator in `atflasher-dummy`. Banks are configured
//! per target and addressed by index on the command line.

mod cli;
mod commands;
mod targets;

use clap::Parser;
use cli::{Cli, Commands, TargetArgs};
use targets::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set log level based on verbosity
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Probe { target } => {
            let mut session = open_session(&target)?;
            commands::run_probe(&mut session)
        }
        Commands::Info { target, bank } => {
            let mut session = open_session(&target)?;
            commands::run_info(&mut session, bank, cli.verbose > 0)
        }
        Commands::MassErase { target, bank } => {
            let mut session = open_session(&target)?;
            commands::run_mass_erase(&mut session, bank)
        }
        Commands::Erase {
            target,
            bank,
            first,
            last,
        } => {
            let mut session = open_session(&target)?;
            commands::run_erase(&mut session, bank, first, last)
        }
        Commands::Write {
            target,
            bank,
            input,
            offset,
            verify,
        } => {
            let mut session = open_session(&target)?;
            commands::run_write(&mut session, bank, &input, offset, verify)
        }
        Commands::ListChips { filter } => {
            commands::list_chips(filter.as_deref());
            Ok(())
        }
        Commands::ListTargets => {
            commands::list_targets();
            Ok(())
        }
    }
}

fn open_session(args: &TargetArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::open(&args.target, &args.banks)?;
    log::debug!(
        "Opened target '{}' with {} bank(s)",
        session.name,
        session.banks.len()
    );
    Ok(session)
}
