//! Erase command implementation
//!
//! MRAM has no erase instruction; erasing fills the range with zeros.

use crate::session::Session;

use super::{create_progress_bar, resolve_range};

/// Zero-fill a device range
pub fn run_erase(
    session: &Session,
    name: &str,
    offset: u64,
    length: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = session.handle(name)?;
    let (offset, len) = resolve_range(&handle, offset, length)?;
    let chunk = session.chunk_size(name).max(1) as u64;

    let pb = create_progress_bar(len, "Erasing")?;
    let mut pos = offset;
    let end = offset + len;
    while pos < end {
        let n = chunk.min(end - pos);
        handle.erase(pos, n)?;
        pos += n;
        pb.inc(n);
    }
    handle.sync()?;
    pb.finish_with_message("Erase complete");

    println!("Erased {} bytes starting at {:#x}", len, offset);
    Ok(())
}
