//! Storage device trait

use alloc::string::String;
use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Capability flags reported to the storage registry
    ///
    /// Values follow the Linux MTD flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StorageFlags: u32 {
        /// Device is writable
        const WRITEABLE     = 0x400;
        /// Single bits can be flipped in both directions
        const BIT_WRITEABLE = 0x800;
        /// Device does not require erase before write
        const NO_ERASE      = 0x1000;

        /// RAM-like storage
        const CAP_RAM = Self::WRITEABLE.bits() | Self::BIT_WRITEABLE.bits() | Self::NO_ERASE.bits();
    }
}

/// Kind of medium behind a storage device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Byte-addressable RAM (MRAM, FRAM, SRAM)
    Ram,
    /// Read-only memory
    Rom,
    /// NOR flash with block erase
    NorFlash,
}

/// Metadata submitted to the storage registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    /// Logical device name (e.g., "mram0")
    pub name: String,
    /// Medium kind
    pub kind: StorageKind,
    /// Capability flags
    pub flags: StorageFlags,
    /// Total size in bytes
    pub size: u64,
    /// Minimum write granularity in bytes
    pub write_size: u32,
    /// Erase granularity in bytes
    pub erase_size: u32,
    /// Number of non-uniform erase regions
    pub erase_regions: u32,
}

/// Storage device operations
///
/// All operations are synchronous and run to completion. There is no
/// partial success: a read or write either transfers every requested byte
/// or fails.
pub trait StorageDevice {
    /// Read `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Write `data` starting at `offset`
    ///
    /// Returns the number of bytes written.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize>;

    /// Erase `len` bytes starting at `offset`
    fn erase(&mut self, offset: u64, len: u64) -> Result<()>;

    /// Flush any buffered writes
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}
