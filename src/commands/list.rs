//! List commands implementation

use mramflash_core::chip::GEOMETRY_TABLE;

use crate::backend;

/// List all available buses
pub fn list_programmers() {
    println!("Available programmers:");
    println!();
    for bus in backend::available_backends() {
        let aliases = if bus.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", bus.aliases.join(", "))
        };
        println!("  {:<10} - {}{}", bus.name, bus.description, aliases);
    }
}

/// List all supported MRAM variants
pub fn list_chips() {
    println!("Supported MRAM chips:");
    println!();
    println!("{:<12} {:<10} {:>10} {:>10}", "Chip", "Compatible", "Size", "Addr bytes");
    println!("{}", "-".repeat(45));

    for (variant, geometry) in GEOMETRY_TABLE.iter() {
        println!(
            "{:<12} {:<10} {:>10} {:>10}",
            variant.to_string(),
            variant.compatible(),
            format!("{:#x}", geometry.size),
            geometry.addr_bytes
        );
    }
}
