//! List commands implementation

use crate::targets;
use atflasher_core::chip;

/// List all available targets
pub fn list_targets() {
    println!("Available targets:");
    println!();
    for target in targets::available_targets() {
        if target.aliases.is_empty() {
            println!("  {:<10} - {}", target.name, target.description);
        } else {
            println!(
                "  {:<10} - {} (aliases: {})",
                target.name,
                target.description,
                target.aliases.join(", ")
            );
        }
    }
}

/// List supported chips, optionally filtered by name
pub fn list_chips(filter: Option<&str>) {
    println!("Supported chips:");
    println!();
    println!(
        "{:<22} {:>10} {:>10} {:>8} {:>8}",
        "Name", "ID", "Flash", "Sector", "Sectors"
    );
    println!("{}", "-".repeat(63));

    let mut count = 0;
    for dev in chip::search(filter.unwrap_or("")) {
        println!(
            "{:<22} {:>10} {:>10} {:>8} {:>8}",
            dev.name,
            format!("{:08X}", dev.id),
            format_size(dev.flash_size()),
            dev.sector_size,
            dev.sector_count()
        );
        count += 1;
    }

    println!();
    println!("{} chip(s)", count);
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else {
        format!("{} KiB", bytes / 1024)
    }
}
