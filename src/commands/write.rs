//! Write command implementation

use std::path::Path;

use crate::session::Session;

use super::{create_progress_bar, read_chunked, resolve_range};

/// Write a file to the device, optionally verifying it
pub fn run_write(
    session: &Session,
    name: &str,
    input: &Path,
    offset: u64,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    write_data(session, name, offset, &data, verify)?;
    println!("Wrote {} bytes at {:#x}", data.len(), offset);
    Ok(())
}

/// Write `data` at `offset` in chunks
pub fn write_data(
    session: &Session,
    name: &str,
    offset: u64,
    data: &[u8],
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = session.handle(name)?;
    let (offset, len) = resolve_range(&handle, offset, Some(data.len() as u64))?;
    let chunk = session.chunk_size(name).max(1);

    let pb = create_progress_bar(len, "Writing")?;
    let mut pos = offset;
    for part in data.chunks(chunk) {
        handle.write(pos, part)?;
        pos += part.len() as u64;
        pb.inc(part.len() as u64);
    }
    handle.sync()?;
    pb.finish_with_message("Write complete");

    if verify {
        let mut readback = vec![0u8; data.len()];
        let pb = create_progress_bar(len, "Verifying")?;
        read_chunked(&handle, offset, &mut readback, chunk, &pb)?;
        pb.finish_with_message("Verify complete");

        if let Some(i) = readback.iter().zip(data).position(|(a, b)| a != b) {
            return Err(format!(
                "Verification failed at {:#x}: expected {:#04x}, read {:#04x}",
                offset + i as u64,
                data[i],
                readback[i]
            )
            .into());
        }
        println!("Verified {} bytes", data.len());
    }

    Ok(())
}
