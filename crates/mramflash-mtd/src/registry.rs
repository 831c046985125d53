//! In-memory storage registry

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, info, warn};
use mramflash_core::registry::{RegistrationId, SharedDevice, StorageRegistry};
use mramflash_core::storage::StorageInfo;
use mramflash_core::{Error, RegistryFailure};

use crate::error::{MtdError, Result};
use crate::handle::MtdHandle;

struct Entry {
    id: RegistrationId,
    info: StorageInfo,
    device: SharedDevice,
    users: Rc<Cell<usize>>,
}

/// Registry of named storage devices
#[derive(Default)]
pub struct MtdRegistry {
    devices: BTreeMap<String, Entry>,
    next_id: u32,
}

impl MtdRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a registered device by name
    pub fn get_device(&self, name: &str) -> Result<MtdHandle> {
        let entry = self
            .devices
            .get(name)
            .ok_or_else(|| MtdError::DeviceNotFound(name.to_string()))?;
        Ok(MtdHandle::open(
            entry.info.clone(),
            entry.device.clone(),
            entry.users.clone(),
        ))
    }

    /// Metadata of every registered device, ordered by name
    pub fn list(&self) -> impl Iterator<Item = &StorageInfo> {
        self.devices.values().map(|entry| &entry.info)
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no device is registered
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of open handles to a device
    pub fn users(&self, name: &str) -> usize {
        self.devices.get(name).map_or(0, |entry| entry.users.get())
    }

    fn validate(info: &StorageInfo) -> bool {
        !info.name.is_empty() && info.size > 0 && info.write_size > 0 && info.erase_size > 0
    }
}

impl StorageRegistry for MtdRegistry {
    fn register(&mut self, info: StorageInfo, device: SharedDevice) -> mramflash_core::Result<RegistrationId> {
        if !Self::validate(&info) {
            warn!("mtd: rejecting {:?}: invalid geometry", info.name);
            return Err(Error::Registration(RegistryFailure::Rejected));
        }
        if self.devices.contains_key(&info.name) {
            warn!("mtd: {} is already registered", info.name);
            return Err(Error::Registration(RegistryFailure::NameInUse));
        }

        let id = RegistrationId(self.next_id);
        self.next_id += 1;

        info!(
            "mtd: registered {} ({:?}, {} bytes, flags {:#x}) as {}",
            info.name,
            info.kind,
            info.size,
            info.flags.bits(),
            id
        );
        self.devices.insert(
            info.name.clone(),
            Entry {
                id,
                info,
                device,
                users: Rc::new(Cell::new(0)),
            },
        );
        Ok(id)
    }

    fn unregister(&mut self, id: RegistrationId) -> mramflash_core::Result<()> {
        let (name, users) = self
            .devices
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(name, entry)| (name.clone(), entry.users.get()))
            .ok_or(Error::Registration(RegistryFailure::NotRegistered))?;

        if users > 0 {
            warn!("mtd: {} is still open ({} users)", name, users);
            return Err(Error::Registration(RegistryFailure::Busy));
        }

        self.devices.remove(&name);
        debug!("mtd: unregistered {} ({})", name, id);
        Ok(())
    }

    fn find(&self, name: &str) -> Option<RegistrationId> {
        self.devices.get(name).map(|entry| entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mramflash_core::chip::{Geometry, Variant};
    use mramflash_core::driver::{Detached, DriverConfig, Mr25hxx};
    use mramflash_core::storage::{MramStorage, StorageFlags, StorageKind};
    use mramflash_dummy::DummyMram;
    use std::cell::RefCell;

    fn probe(registry: &mut MtdRegistry, variant: Variant) -> Mr25hxx<DummyMram> {
        let config = DriverConfig::new("mram0").with_register(true);
        Mr25hxx::probe(DummyMram::for_variant(variant), variant, config, registry).unwrap()
    }

    fn raw_device(variant: Variant) -> SharedDevice {
        Rc::new(RefCell::new(MramStorage::new(
            DummyMram::for_variant(variant),
            variant.geometry(),
        )))
    }

    fn info(name: &str, size: u64, erase_size: u32) -> StorageInfo {
        StorageInfo {
            name: name.to_string(),
            kind: StorageKind::Ram,
            flags: StorageFlags::CAP_RAM,
            size,
            write_size: 1,
            erase_size,
            erase_regions: 0,
        }
    }

    #[test]
    fn test_read_write_through_handle() {
        let mut registry = MtdRegistry::new();
        let _dev = probe(&mut registry, Variant::Mr25h40);

        let handle = registry.get_device("mram0").unwrap();
        assert_eq!(handle.size(), 0x80000);
        assert_eq!(handle.write(0x7FFF0, &[0xAB; 16]).unwrap(), 16);

        let mut buf = [0u8; 16];
        assert_eq!(handle.read(0x7FFF0, &mut buf).unwrap(), 16);
        assert_eq!(buf, [0xAB; 16]);

        handle.erase(0x7FFF8, 8).unwrap();
        handle.read(0x7FFF0, &mut buf).unwrap();
        assert_eq!(&buf[..8], &[0xAB; 8]);
        assert_eq!(&buf[8..], &[0x00; 8]);
        handle.sync().unwrap();
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = MtdRegistry::new();
        let _dev = probe(&mut registry, Variant::Mr25h10);

        let err = registry
            .register(info("mram0", 0x8000, 1), raw_device(Variant::Mr25h256))
            .unwrap_err();
        assert_eq!(err, Error::Registration(RegistryFailure::NameInUse));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let mut registry = MtdRegistry::new();

        for bad in [info("", 0x8000, 1), info("mram1", 0, 1), info("mram1", 0x8000, 0)] {
            let err = registry
                .register(bad, raw_device(Variant::Mr25h256))
                .unwrap_err();
            assert_eq!(err, Error::Registration(RegistryFailure::Rejected));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_out_of_range_never_reaches_device() {
        let mut registry = MtdRegistry::new();
        let dev = probe(&mut registry, Variant::Mr25h128);
        let handle = registry.get_device("mram0").unwrap();

        let mut buf = [0u8; 2];
        assert!(matches!(
            handle.read(0x3FFF, &mut buf),
            Err(MtdError::OutOfRange { size: 0x4000, .. })
        ));
        assert!(matches!(
            handle.write(u64::MAX, &buf),
            Err(MtdError::OutOfRange { .. })
        ));
        assert!(matches!(
            handle.erase(0x4000, 1),
            Err(MtdError::OutOfRange { .. })
        ));

        drop(handle);
        match dev.detach(&mut registry) {
            Detached::Released(chip) => assert!(chip.transfers().is_empty()),
            Detached::Inert(e) => panic!("unexpected inert detach: {}", e),
        }
    }

    #[test]
    fn test_misaligned_erase() {
        let mut registry = MtdRegistry::new();
        registry
            .register(info("mram1", 0x8000, 4), raw_device(Variant::Mr25h256))
            .unwrap();
        let handle = registry.get_device("mram1").unwrap();

        assert!(matches!(handle.erase(2, 4), Err(MtdError::Misaligned { .. })));
        assert!(matches!(handle.erase(4, 3), Err(MtdError::Misaligned { .. })));
        assert!(handle.erase(4, 8).is_ok());
    }

    #[test]
    fn test_read_only_device() {
        let mut registry = MtdRegistry::new();
        let mut rom = info("rom0", 0x4000, 1);
        rom.kind = StorageKind::Rom;
        rom.flags = StorageFlags::empty();
        registry.register(rom, raw_device(Variant::Mr25h128)).unwrap();

        let handle = registry.get_device("rom0").unwrap();
        assert!(matches!(handle.write(0, &[1]), Err(MtdError::NotWritable)));
        assert!(matches!(handle.erase(0, 1), Err(MtdError::NotWritable)));
        let mut buf = [0xFFu8; 1];
        assert_eq!(handle.read(0, &mut buf).unwrap(), 1);
    }

    #[test]
    fn test_open_handle_pins_device() {
        let mut registry = MtdRegistry::new();
        let dev = probe(&mut registry, Variant::Mr25h40);
        let handle = registry.get_device("mram0").unwrap();
        assert_eq!(registry.users("mram0"), 1);

        let outcome = dev.detach(&mut registry);
        assert!(matches!(
            outcome,
            Detached::Inert(Error::Registration(RegistryFailure::Busy))
        ));

        let mut buf = [0u8; 4];
        assert!(matches!(
            handle.read(0, &mut buf),
            Err(MtdError::Device(Error::DeviceInert))
        ));
        assert!(matches!(
            handle.erase(0, 0),
            Err(MtdError::Device(Error::DeviceInert))
        ));
        assert!(matches!(
            handle.sync(),
            Err(MtdError::Device(Error::DeviceInert))
        ));

        drop(handle);
        assert_eq!(registry.users("mram0"), 0);

        // A fresh attach replaces the stale binding
        let dev = probe(&mut registry, Variant::Mr25h40);
        let handle = registry.get_device("mram0").unwrap();
        assert_eq!(handle.write(0, &[1, 2, 3, 4]).unwrap(), 4);
        drop(handle);
        assert!(matches!(dev.detach(&mut registry), Detached::Released(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_device() {
        let registry = MtdRegistry::new();
        assert!(matches!(
            registry.get_device("mram9"),
            Err(MtdError::DeviceNotFound(name)) if name == "mram9"
        ));
    }

    #[test]
    fn test_unregister_unknown_id() {
        let mut registry = MtdRegistry::new();
        assert_eq!(
            registry.unregister(RegistrationId(7)),
            Err(Error::Registration(RegistryFailure::NotRegistered))
        );
    }

    #[test]
    fn test_list_devices() {
        let mut registry = MtdRegistry::new();
        registry
            .register(info("mram1", 0x8000, 1), raw_device(Variant::Mr25h256))
            .unwrap();
        let _dev = probe(&mut registry, Variant::Mr25h10);

        let names: Vec<&str> = registry.list().map(|info| info.name.as_str()).collect();
        assert_eq!(names, ["mram0", "mram1"]);
        assert_eq!(registry.find("mram1"), Some(RegistrationId(0)));
    }

    #[test]
    fn test_custom_geometry_through_registry() {
        let mut registry = MtdRegistry::new();
        let geometry = Geometry::new(0x100, 2);
        let config = DriverConfig::new("tiny");
        let mut dev = Mr25hxx::attach_with_geometry(
            DummyMram::for_variant(Variant::Mr25h128),
            geometry,
            config,
        )
        .unwrap();
        dev.register(&mut registry).unwrap();

        let handle = registry.get_device("tiny").unwrap();
        assert_eq!(handle.size(), 0x100);
        assert!(handle.write(0xFF, &[1, 2]).is_err());
    }
}
