//! Info command implementation

use crate::session::Session;

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

/// Print geometry and registration details of a device
pub fn run_info(session: &Session, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle = session.handle(name)?;
    let info = handle.info();

    println!("Device:        {}", info.name);
    if let Some(variant) = session.variant(name) {
        println!("Chip:          Everspin {}", variant);
    }
    println!("Size:          {} bytes ({})", info.size, format_size(info.size));
    if let Some(device) = session.device(name) {
        println!("Address bytes: {}", device.geometry().addr_bytes);
        if let Some(id) = device.context().registration() {
            println!("Registration:  {}", id);
        }
    }
    println!("Type:          {:?}", info.kind);
    println!("Flags:         {:#06x} ({:?})", info.flags.bits(), info.flags);
    println!("Write size:    {}", info.write_size);
    println!("Erase size:    {}", info.erase_size);

    let others: Vec<&str> = session.names().filter(|n| *n != name).collect();
    if !others.is_empty() {
        println!("Also attached: {}", others.join(", "));
    }

    Ok(())
}
