//! Error types for registry access

use thiserror::Error;

/// Errors returned by [`MtdHandle`](crate::MtdHandle) and device lookup
#[derive(Debug, Error)]
pub enum MtdError {
    /// No device is registered under the name
    #[error("storage device not found: {0}")]
    DeviceNotFound(String),

    /// Request extends past the end of the device
    #[error("access of {len} bytes at offset {offset:#x} exceeds device size {size:#x}")]
    OutOfRange { offset: u64, len: u64, size: u64 },

    /// Erase request is not aligned to the erase granularity
    #[error("erase of {len} bytes at offset {offset:#x} is not aligned to {erase_size:#x}")]
    Misaligned {
        offset: u64,
        len: u64,
        erase_size: u32,
    },

    /// Device is not writable
    #[error("storage device is not writable")]
    NotWritable,

    /// The device driver failed the request
    #[error("device error: {0}")]
    Device(#[from] mramflash_core::Error),
}

/// Result type for registry access
pub type Result<T> = std::result::Result<T, MtdError>;
