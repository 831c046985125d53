//! Chip type definitions

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::spi::AddressWidth;

/// Supported Everspin MR25Hxx variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Variant {
    /// MR25H40 - 4 Mbit
    Mr25h40,
    /// MR25H10 - 1 Mbit
    Mr25h10,
    /// MR25H256 - 256 Kbit
    Mr25h256,
    /// MR25H128 - 128 Kbit
    Mr25h128,
}

impl Variant {
    /// All supported variants, largest first
    pub const ALL: [Variant; 4] = [
        Variant::Mr25h40,
        Variant::Mr25h10,
        Variant::Mr25h256,
        Variant::Mr25h128,
    ];

    /// The numeric model identifier (the suffix of the part number)
    pub const fn model(&self) -> u16 {
        match self {
            Self::Mr25h40 => 40,
            Self::Mr25h10 => 10,
            Self::Mr25h256 => 256,
            Self::Mr25h128 => 128,
        }
    }

    /// Find a variant by its numeric model identifier
    pub fn from_model(model: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.model() == model)
    }

    /// The device-tree style compatible string
    pub const fn compatible(&self) -> &'static str {
        match self {
            Self::Mr25h40 => "mr25h40",
            Self::Mr25h10 => "mr25h10",
            Self::Mr25h256 => "mr25h256",
            Self::Mr25h128 => "mr25h128",
        }
    }

    /// Find a variant by its compatible string
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.compatible().eq_ignore_ascii_case(compatible))
    }

    /// Geometry of this variant
    pub fn geometry(&self) -> Geometry {
        super::lookup(*self)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MR25H{}", self.model())
    }
}

impl FromStr for Variant {
    type Err = Error;

    /// Accepts a compatible string (`mr25h40`) or a bare model number (`40`)
    fn from_str(s: &str) -> Result<Self> {
        if let Some(v) = Self::from_compatible(s) {
            return Ok(v);
        }
        s.parse::<u16>()
            .ok()
            .and_then(Self::from_model)
            .ok_or(Error::UnknownVariant)
    }
}

/// Addressing geometry of an MRAM device
///
/// `addr_bytes` is kept as the raw byte count rather than an
/// [`AddressWidth`] so that a malformed geometry is reported at use time
/// instead of being silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Total size in bytes
    pub size: u32,
    /// Number of address bytes in memory commands
    pub addr_bytes: u8,
}

impl Geometry {
    /// Create a new geometry
    pub const fn new(size: u32, addr_bytes: u8) -> Self {
        Self { size, addr_bytes }
    }

    /// The address width, or [`Error::UnsupportedGeometry`]
    pub fn address_width(&self) -> Result<AddressWidth> {
        AddressWidth::try_from(self.addr_bytes)
    }

    /// Check if an address range is valid for this device
    pub fn is_valid_range(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size as u64)
    }
}
