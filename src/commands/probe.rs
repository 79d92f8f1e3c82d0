//! Probe command implementation

use crate::targets::Session;

/// Probe every configured bank and print its geometry
pub fn run_probe(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    for bank in session.banks.iter_mut() {
        bank.probe(&mut session.target)?;

        let kind = bank.kind().map(|k| k.name()).unwrap_or("unknown");
        println!("Bank {} ({}) at 0x{:08X}:", bank.index(), kind, bank.base());
        match bank.chip() {
            Some(chip) => println!("  Chip:    {}", chip.name),
            None => println!("  Chip:    unknown"),
        }
        println!("  Flash:   {} KiB total", bank.flash_size_kb());
        println!("  Size:    {} bytes", bank.size());
        if bank.declared_size() != 0 && bank.declared_size() != bank.size() {
            println!("  (configured size {} ignored)", bank.declared_size());
        }
        if bank.sector_count() > 0 {
            println!(
                "  Sectors: {} x {} bytes",
                bank.sector_count(),
                bank.sector_size()
            );
        }
    }
    Ok(())
}
