//! Info command implementation

use crate::targets::Session;
use atflasher_core::flash::read_unique_id;

/// Print the chip identification line, and with `verbose` the unique ID
pub fn run_info(
    session: &mut Session,
    index: u32,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bank, target) = session.bank_mut(index)?;
    println!("{}", bank.info(target)?);

    if verbose {
        let uid = read_unique_id(target)?;
        println!("Unique ID: {:08X} {:08X} {:08X}", uid[0], uid[1], uid[2]);
    }
    Ok(())
}
