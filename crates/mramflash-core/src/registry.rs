//! Storage registry seam
//!
//! A registry makes attached devices reachable by name. The driver hands it
//! a [`StorageInfo`] record and a shared [`StorageDevice`]; the registry
//! hands back a [`RegistrationId`] that the driver keeps in its context.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::error::Result;
use crate::storage::{StorageDevice, StorageInfo};

/// A storage device shared between its driver and the registry
pub type SharedDevice = Rc<RefCell<dyn StorageDevice>>;

/// Handle of one active registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub u32);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry of named storage devices
pub trait StorageRegistry {
    /// Register a device under `info.name`
    ///
    /// On success the device is reachable by name until it is unregistered.
    fn register(&mut self, info: StorageInfo, device: SharedDevice) -> Result<RegistrationId>;

    /// Remove a registration
    ///
    /// Fails if the registry still needs the device; the registration then
    /// stays active.
    fn unregister(&mut self, id: RegistrationId) -> Result<()>;

    /// Find the active registration for a name
    fn find(&self, name: &str) -> Option<RegistrationId>;
}
