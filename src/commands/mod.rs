//! CLI command implementations
//!
//! Every command works on an [`MtdHandle`] opened from the session registry,
//! so requests go through the same range checks any other registry user
//! would see.

mod erase;
mod info;
mod list;
mod read;
mod write;

pub use erase::run_erase;
pub use info::run_info;
pub use list::{list_chips, list_programmers};
pub use read::run_read;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use mramflash_mtd::MtdHandle;

/// Create a progress bar with a phase message
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Resolve an optional length to an in-range `(offset, len)` pair
fn resolve_range(
    handle: &MtdHandle,
    offset: u64,
    length: Option<u64>,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let size = handle.size();
    if offset > size {
        return Err(format!("Offset {:#x} is beyond device size {:#x}", offset, size).into());
    }
    let len = length.unwrap_or(size - offset);
    if offset.checked_add(len).map_or(true, |end| end > size) {
        return Err(format!(
            "Range {:#x}+{:#x} exceeds device size {:#x}",
            offset, len, size
        )
        .into());
    }
    Ok((offset, len))
}

/// Read `buf.len()` bytes at `offset` in chunks, advancing `pb`
fn read_chunked(
    handle: &MtdHandle,
    offset: u64,
    buf: &mut [u8],
    chunk: usize,
    pb: &ProgressBar,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pos = offset;
    for part in buf.chunks_mut(chunk.max(1)) {
        handle.read(pos, part)?;
        pos += part.len() as u64;
        pb.inc(part.len() as u64);
    }
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::session::{DeviceSpec, Session};
    use mramflash_core::chip::Variant;

    pub(crate) fn session(variant: Variant) -> Session {
        Session::open(&[DeviceSpec {
            name: "mram0".to_string(),
            variant,
            bus: "dummy".to_string(),
        }])
        .unwrap()
    }

    #[test]
    fn test_resolve_range() {
        let session = session(Variant::Mr25h128);
        let handle = session.handle("mram0").unwrap();

        assert_eq!(resolve_range(&handle, 0, None).unwrap(), (0, 0x4000));
        assert_eq!(resolve_range(&handle, 0x3FF0, None).unwrap(), (0x3FF0, 0x10));
        assert_eq!(resolve_range(&handle, 0x100, Some(0x10)).unwrap(), (0x100, 0x10));
        assert!(resolve_range(&handle, 0x4001, None).is_err());
        assert!(resolve_range(&handle, 0x3FF0, Some(0x11)).is_err());
        assert!(resolve_range(&handle, 1, Some(u64::MAX)).is_err());
    }
}
