//! MRAM storage device
//!
//! This module provides `MramStorage`, which implements [`StorageDevice`]
//! for an MR25Hxx chip on an [`SpiBus`].

use alloc::vec;

use crate::bus::SpiBus;
use crate::chip::Geometry;
use crate::error::{Error, Result};
use crate::protocol;
use crate::spi::{encode_address, EncodedAddress};
use crate::storage::StorageDevice;

/// Storage device backed by an MR25Hxx chip
///
/// The bus is held in an `Option` so that a context which could not be
/// unregistered can be made inert: the bus is taken away and every later
/// call fails with [`Error::DeviceInert`] instead of touching hardware.
///
/// Range checks on read and write are the registry's job; only erase
/// validates its range because it allocates a buffer of the requested size.
pub struct MramStorage<B: SpiBus> {
    bus: Option<B>,
    geometry: Geometry,
}

impl<B: SpiBus> MramStorage<B> {
    /// Create a storage device over an already claimed bus
    pub fn new(bus: B, geometry: Geometry) -> Self {
        Self {
            bus: Some(bus),
            geometry,
        }
    }

    /// Get the device geometry
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns true once the bus has been taken away
    pub fn is_inert(&self) -> bool {
        self.bus.is_none()
    }

    /// Take the bus out, leaving the device inert
    pub fn take_bus(&mut self) -> Option<B> {
        self.bus.take()
    }

    fn address(&self, offset: u64) -> Result<EncodedAddress> {
        encode_address(offset, self.geometry.addr_bytes).inspect_err(|_| {
            log::error!(
                "mr25hxx: number of address bytes not supported: {}",
                self.geometry.addr_bytes
            )
        })
    }

    fn bus(&mut self) -> Result<&mut B> {
        self.bus.as_mut().ok_or(Error::DeviceInert)
    }
}

impl<B: SpiBus> StorageDevice for MramStorage<B> {
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let addr = self.address(offset)?;
        protocol::read(self.bus()?, &addr, buf)?;
        Ok(buf.len())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        let addr = self.address(offset)?;
        protocol::write(self.bus()?, &addr, data)?;
        Ok(data.len())
    }

    /// MRAM has no erase instruction; erasing writes zeros
    fn erase(&mut self, offset: u64, len: u64) -> Result<()> {
        self.bus()?;
        if len == 0 {
            return Ok(());
        }
        if !self.geometry.is_valid_range(offset, len) {
            return Err(Error::AddressOutOfBounds);
        }

        let zeros = vec![0u8; len as usize];
        self.write(offset, &zeros).map(|_| ())
    }

    /// Writes are never buffered; only an inert device fails
    fn sync(&mut self) -> Result<()> {
        self.bus().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::XferFlags;
    use crate::chip::Variant;
    use crate::testutil::{MockBus, Xfer};

    #[test]
    fn test_read_two_byte_example() {
        let mut dev = MramStorage::new(MockBus::new(), Geometry::new(0x4000, 2));
        let mut buf = [0u8; 16];

        let n = dev.read(0x3FF0, &mut buf).unwrap();

        assert_eq!(n, 16);
        let bus = dev.take_bus().unwrap();
        assert_eq!(bus.log[1], Xfer::send(16, &[0x3F, 0xF0], XferFlags::empty()));
        assert_eq!(bus.log[2], Xfer::recv(128, 16, XferFlags::END));
    }

    #[test]
    fn test_unsupported_geometry_never_touches_bus() {
        for addr_bytes in [0u8, 1, 4] {
            let mut dev = MramStorage::new(MockBus::new(), Geometry::new(0x4000, addr_bytes));
            let mut buf = [0u8; 4];

            let expected = Err(Error::UnsupportedGeometry { addr_bytes });
            assert_eq!(dev.read(0, &mut buf), expected);
            assert_eq!(dev.write(0, &buf), expected);
            assert_eq!(dev.erase(0, 4), expected.map(|_| ()));

            let bus = dev.take_bus().unwrap();
            assert!(bus.log.is_empty());
        }
    }

    #[test]
    fn test_erase_writes_zeros() {
        let mut dev = MramStorage::new(MockBus::new(), Variant::Mr25h10.geometry());

        dev.erase(0x100, 8).unwrap();

        let bus = dev.take_bus().unwrap();
        assert_eq!(bus.log.len(), 4);
        assert_eq!(bus.log[0], Xfer::send(8, &[0x06], XferFlags::ONCE));
        assert_eq!(bus.log[3], Xfer::send(64, &[0u8; 8], XferFlags::END));
    }

    #[test]
    fn test_erase_out_of_range_fails_fast() {
        let mut dev = MramStorage::new(MockBus::new(), Variant::Mr25h128.geometry());

        assert_eq!(dev.erase(0x3FFF, 2), Err(Error::AddressOutOfBounds));
        assert_eq!(dev.erase(u64::MAX, 1), Err(Error::AddressOutOfBounds));
        assert_eq!(dev.erase(0x3FFF, 0), Ok(()));

        let bus = dev.take_bus().unwrap();
        assert!(bus.log.is_empty());
    }

    #[test]
    fn test_transfer_failure_propagates() {
        let mut bus = MockBus::new();
        bus.fail_at = Some(3);
        let mut dev = MramStorage::new(bus, Variant::Mr25h40.geometry());

        assert_eq!(dev.write(0, &[1, 2, 3]), Err(Error::SpiTransferFailed));
    }

    #[test]
    fn test_inert_device() {
        let mut dev = MramStorage::new(MockBus::new(), Variant::Mr25h40.geometry());
        assert!(dev.take_bus().is_some());
        assert!(dev.is_inert());

        let mut buf = [0u8; 1];
        assert_eq!(dev.read(0, &mut buf), Err(Error::DeviceInert));
        assert_eq!(dev.write(0, &buf), Err(Error::DeviceInert));
        assert_eq!(dev.erase(0, 0), Err(Error::DeviceInert));
        assert_eq!(dev.erase(0, 4), Err(Error::DeviceInert));
        assert_eq!(dev.sync(), Err(Error::DeviceInert));
    }

    #[test]
    fn test_sync_is_noop() {
        let mut dev = MramStorage::new(MockBus::new(), Variant::Mr25h256.geometry());

        assert_eq!(dev.sync(), Ok(()));

        let bus = dev.take_bus().unwrap();
        assert!(bus.log.is_empty());
    }
}
