//! Read command implementation

use std::path::Path;

use crate::session::Session;

use super::{create_progress_bar, read_chunked, resolve_range};

/// Read a device range into a file
pub fn run_read(
    session: &Session,
    name: &str,
    output: &Path,
    offset: u64,
    length: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_range(session, name, offset, length)?;
    std::fs::write(output, &data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read a device range with a progress bar
pub fn read_range(
    session: &Session,
    name: &str,
    offset: u64,
    length: Option<u64>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let handle = session.handle(name)?;
    let (offset, len) = resolve_range(&handle, offset, length)?;
    let mut data = vec![0u8; len as usize];

    let pb = create_progress_bar(len, "Reading")?;
    read_chunked(&handle, offset, &mut data, session.chunk_size(name), &pb)?;
    pb.finish_with_message("Read complete");

    Ok(data)
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::commands::tests::session;
    use mramflash_core::chip::Variant;

    #[test]
    fn test_read_range() {
        let session = session(Variant::Mr25h10);
        let pattern: Vec<u8> = (0..=255u8).cycle().take(0x2100).collect();
        session.handle("mram0").unwrap().write(0x1000, &pattern).unwrap();

        let data = read_range(&session, "mram0", 0x1000, Some(0x2100)).unwrap();
        assert_eq!(data, pattern);

        let tail = read_range(&session, "mram0", 0x1FFF0, None).unwrap();
        assert_eq!(tail.len(), 0x10);

        session.close().unwrap();
    }

    #[test]
    fn test_read_out_of_range() {
        let session = session(Variant::Mr25h128);
        assert!(read_range(&session, "mram0", 0x3000, Some(0x2000)).is_err());
        session.close().unwrap();
    }
}
