//! Device context - per-instance state of an attached MRAM

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use crate::bus::SpiBus;
use crate::chip::Geometry;
use crate::error::{Error, Result};
use crate::registry::{RegistrationId, SharedDevice};
use crate::storage::{MramStorage, StorageFlags, StorageInfo, StorageKind};

/// Runtime context of one attached device
///
/// The storage half is shared with the registry once the device is
/// registered; the registration handle is owned here and its presence is
/// what "registered" means.
pub struct DeviceContext<B: SpiBus> {
    name: String,
    geometry: Geometry,
    storage: Rc<RefCell<MramStorage<B>>>,
    registration: Option<RegistrationId>,
}

impl<B: SpiBus> DeviceContext<B> {
    /// Create a new context over a claimed bus
    pub fn new(name: String, geometry: Geometry, bus: B) -> Self {
        Self {
            name,
            geometry,
            storage: Rc::new(RefCell::new(MramStorage::new(bus, geometry))),
            registration: None,
        }
    }

    /// Logical device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device geometry
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The active registration, if any
    pub fn registration(&self) -> Option<RegistrationId> {
        self.registration
    }

    /// Returns true if the device is registered
    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    pub(crate) fn set_registration(&mut self, id: Option<RegistrationId>) {
        self.registration = id;
    }

    /// Metadata submitted to the registry
    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            name: self.name.clone(),
            kind: StorageKind::Ram,
            flags: StorageFlags::CAP_RAM,
            size: self.geometry.size as u64,
            write_size: 1,
            erase_size: 1,
            erase_regions: 0,
        }
    }

    /// Run `f` against the storage device
    pub fn with_storage<T>(&self, f: impl FnOnce(&mut MramStorage<B>) -> Result<T>) -> Result<T> {
        let mut storage = self.storage.try_borrow_mut().map_err(|_| Error::DeviceBusy)?;
        f(&mut storage)
    }

    /// Take the bus out of the shared storage
    ///
    /// Whatever still holds the shared storage sees an inert device from
    /// now on.
    pub fn take_bus(&self) -> Option<B> {
        self.storage
            .try_borrow_mut()
            .ok()
            .and_then(|mut storage| storage.take_bus())
    }
}

impl<B: SpiBus + 'static> DeviceContext<B> {
    /// The storage device as handed to the registry
    pub fn shared(&self) -> SharedDevice {
        self.storage.clone()
    }
}
