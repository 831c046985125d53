//! Address width types

use crate::error::{Error, Result};

/// Address width for MR25Hxx memory commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 2-byte (16-bit) address - up to 64 KiB
    TwoByte,
    /// 3-byte (24-bit) address - up to 16 MiB
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::TwoByte => 2,
            Self::ThreeByte => 3,
        }
    }

    /// Returns the number of address bits clocked out on the bus
    pub const fn bits(&self) -> usize {
        self.bytes() as usize * 8
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u32 {
        match self {
            Self::TwoByte => 64 * 1024,
            Self::ThreeByte => 16 * 1024 * 1024,
        }
    }

    /// Encode an address into a 3-byte buffer, big-endian
    ///
    /// For 2-byte widths the last byte is padding and stays zero.
    pub fn encode(&self, offset: u64) -> EncodedAddress {
        let bytes = match self {
            Self::TwoByte => [(offset >> 8) as u8, offset as u8, 0x00],
            Self::ThreeByte => [(offset >> 16) as u8, (offset >> 8) as u8, offset as u8],
        };
        EncodedAddress { bytes, width: *self }
    }
}

impl TryFrom<u8> for AddressWidth {
    type Error = Error;

    fn try_from(addr_bytes: u8) -> Result<Self> {
        match addr_bytes {
            2 => Ok(Self::TwoByte),
            3 => Ok(Self::ThreeByte),
            _ => Err(Error::UnsupportedGeometry { addr_bytes }),
        }
    }
}

/// An address field ready to be clocked out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedAddress {
    bytes: [u8; 3],
    width: AddressWidth,
}

impl EncodedAddress {
    /// The full 3-byte buffer, including padding
    pub fn raw(&self) -> &[u8; 3] {
        &self.bytes
    }

    /// The bytes that are actually transmitted
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.width.bytes() as usize]
    }

    /// Number of bits to transmit
    pub fn bit_len(&self) -> usize {
        self.width.bits()
    }

    /// The width this address was encoded for
    pub fn width(&self) -> AddressWidth {
        self.width
    }
}

/// Encode `offset` for a chip using `addr_bytes` address bytes
///
/// Fails with [`Error::UnsupportedGeometry`] for anything but 2 or 3.
pub fn encode_address(offset: u64, addr_bytes: u8) -> Result<EncodedAddress> {
    AddressWidth::try_from(addr_bytes).map(|width| width.encode(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_three_byte() {
        for offset in [0u64, 0x1, 0xFF, 0x1234, 0x7_FFFF, 0x12_3456, 0xAB_CDEF] {
            let addr = encode_address(offset, 3).unwrap();
            assert_eq!(
                addr.as_bytes(),
                &[(offset >> 16) as u8, (offset >> 8) as u8, offset as u8]
            );
            assert_eq!(addr.bit_len(), 24);
        }
    }

    #[test]
    fn test_encode_two_byte() {
        for offset in [0u64, 0x1, 0xFF, 0x3FF0, 0x7FFF] {
            let addr = encode_address(offset, 2).unwrap();
            assert_eq!(addr.raw(), &[(offset >> 8) as u8, offset as u8, 0x00]);
            assert_eq!(addr.as_bytes().len(), 2);
            assert_eq!(addr.bit_len(), 16);
        }
    }

    #[test]
    fn test_encode_truncates_high_bits() {
        let addr = AddressWidth::TwoByte.encode(0x1_2345);
        assert_eq!(addr.as_bytes(), &[0x23, 0x45]);
    }

    #[test]
    fn test_unsupported_widths() {
        for addr_bytes in [0u8, 1, 4, 255] {
            assert_eq!(
                encode_address(0, addr_bytes),
                Err(Error::UnsupportedGeometry { addr_bytes })
            );
        }
    }
}
