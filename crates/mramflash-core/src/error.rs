//! Error types for mramflash-core
//!
//! This module provides a no_std compatible error type that is shared by the
//! driver, the bus implementations and the storage registry.

use core::fmt;

/// Why the storage registry refused a register or unregister request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFailure {
    /// Another device is already registered under the same name
    NameInUse,
    /// The device is still in use and cannot be removed
    Busy,
    /// No device is registered under the given handle
    NotRegistered,
    /// The registry rejected the device metadata
    Rejected,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// The SPI bus could not be claimed for exclusive use
    BusClaimFailed,
    /// An SPI sub-transfer failed
    SpiTransferFailed,
    /// A mid-window transfer was issued without an open chip-select window
    ChipSelectNotAsserted,

    // Geometry errors
    /// The device geometry carries an address width the protocol cannot encode
    UnsupportedGeometry {
        /// The offending number of address bytes
        addr_bytes: u8,
    },
    /// The variant identifier does not name a supported chip
    UnknownVariant,
    /// Address range is beyond the device size
    AddressOutOfBounds,

    // Registry errors
    /// The storage registry refused a register or unregister request
    Registration(RegistryFailure),

    // Lifecycle errors
    /// The device context was invalidated by a failed detach
    DeviceInert,
    /// The device context is already in use by another call
    DeviceBusy,
}

impl fmt::Display for RegistryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameInUse => write!(f, "name already registered"),
            Self::Busy => write!(f, "device busy"),
            Self::NotRegistered => write!(f, "device not registered"),
            Self::Rejected => write!(f, "device rejected"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusClaimFailed => write!(f, "failed to claim SPI bus"),
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::ChipSelectNotAsserted => write!(f, "transfer outside of a chip-select window"),
            Self::UnsupportedGeometry { addr_bytes } => {
                write!(f, "number of address bytes not supported: {}", addr_bytes)
            }
            Self::UnknownVariant => write!(f, "unknown MRAM variant"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::Registration(failure) => write!(f, "storage registry: {}", failure),
            Self::DeviceInert => write!(f, "device context is inert"),
            Self::DeviceBusy => write!(f, "device context is busy"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
