//! Open device handle

use std::cell::Cell;
use std::rc::Rc;

use log::trace;
use mramflash_core::registry::SharedDevice;
use mramflash_core::storage::{StorageDevice, StorageFlags, StorageInfo};
use mramflash_core::Error;

use crate::error::{MtdError, Result};

/// An open registered device
///
/// Every request is validated against the registered [`StorageInfo`]
/// before it reaches the driver. The device stays pinned in the registry
/// until the handle is dropped.
pub struct MtdHandle {
    info: StorageInfo,
    device: SharedDevice,
    users: Rc<Cell<usize>>,
}

impl MtdHandle {
    pub(crate) fn open(info: StorageInfo, device: SharedDevice, users: Rc<Cell<usize>>) -> Self {
        users.set(users.get() + 1);
        Self {
            info,
            device,
            users,
        }
    }

    /// Metadata the device was registered with
    pub fn info(&self) -> &StorageInfo {
        &self.info
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Device size in bytes
    pub fn size(&self) -> u64 {
        self.info.size
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        let in_range = offset
            .checked_add(len)
            .is_some_and(|end| end <= self.info.size);
        if in_range {
            Ok(())
        } else {
            Err(MtdError::OutOfRange {
                offset,
                len,
                size: self.info.size,
            })
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.info.flags.contains(StorageFlags::WRITEABLE) {
            Ok(())
        } else {
            Err(MtdError::NotWritable)
        }
    }

    fn with_device<T>(
        &self,
        f: impl FnOnce(&mut dyn StorageDevice) -> mramflash_core::Result<T>,
    ) -> Result<T> {
        let mut device = self.device.try_borrow_mut().map_err(|_| Error::DeviceBusy)?;
        Ok(f(&mut *device)?)
    }

    /// Read `buf.len()` bytes starting at `offset`
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.check_range(offset, buf.len() as u64)?;
        if buf.is_empty() {
            return Ok(0);
        }
        trace!("mtd: {} read {:#x}+{:#x}", self.info.name, offset, buf.len());
        self.with_device(|dev| dev.read(offset, buf))
    }

    /// Write `data` starting at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<usize> {
        self.check_writable()?;
        self.check_range(offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(0);
        }
        trace!("mtd: {} write {:#x}+{:#x}", self.info.name, offset, data.len());
        self.with_device(|dev| dev.write(offset, data))
    }

    /// Erase `len` bytes starting at `offset`
    ///
    /// Both `offset` and `len` must be multiples of the erase size.
    pub fn erase(&self, offset: u64, len: u64) -> Result<()> {
        self.check_writable()?;
        self.check_range(offset, len)?;

        let erase_size = self.info.erase_size;
        let granule = erase_size as u64;
        if offset % granule != 0 || len % granule != 0 {
            return Err(MtdError::Misaligned {
                offset,
                len,
                erase_size,
            });
        }

        trace!("mtd: {} erase {:#x}+{:#x}", self.info.name, offset, len);
        self.with_device(|dev| dev.erase(offset, len))
    }

    /// Flush pending writes
    pub fn sync(&self) -> Result<()> {
        self.with_device(|dev| dev.sync())
    }
}

impl Drop for MtdHandle {
    fn drop(&mut self) {
        self.users.set(self.users.get().saturating_sub(1));
    }
}

impl std::fmt::Debug for MtdHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MtdHandle")
            .field("info", &self.info)
            .field("users", &self.users.get())
            .finish_non_exhaustive()
    }
}
