//! Erase command implementation

use crate::commands::spinner;
use crate::targets::Session;

/// Erase a whole main bank
pub fn run_mass_erase(session: &mut Session, index: u32) -> Result<(), Box<dyn std::error::Error>> {
    let (bank, target) = session.bank_mut(index)?;

    let pb = spinner(format!("Erasing bank {} (this may take a while)...", index))?;
    match bank.mass_erase(target) {
        Ok(()) => {
            pb.finish_and_clear();
            println!("mass erase complete");
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            println!("mass erase failed");
            Err(e.into())
        }
    }
}

/// Erase sectors `first..=last` of a bank
pub fn run_erase(
    session: &mut Session,
    index: u32,
    first: u32,
    last: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bank, target) = session.bank_mut(index)?;

    let pb = spinner(format!("Erasing sectors {}..={}...", first, last))?;
    let result = bank.erase(target, first, last);
    pb.finish_and_clear();
    result?;

    println!("Erased {} sector(s) of bank {}", last - first + 1, index);
    Ok(())
}
