//! Attach, register, detach
//!
//! ```text
//!            attach                register
//! Detached ─────────► Attached ─────────────► Attached
//!    ▲              (unregistered) ◄───────── (registered)
//!    │                    │        unregister      │
//!    │      detach        │                        │ detach
//!    └────────────────────┴────────────────────────┤
//!                                                  │ unregister refused
//!                                                  ▼
//!                                                Inert
//! ```

use alloc::string::String;
use core::fmt;

use log::{debug, error, warn};

use crate::bus::SpiBus;
use crate::chip::{Geometry, Variant};
use crate::driver::context::DeviceContext;
use crate::error::{Error, Result};
use crate::registry::{RegistrationId, StorageRegistry};
use crate::storage::StorageDevice;

/// Default logical name of the first MRAM device
pub const DEFAULT_NAME: &str = "mram0";

/// Per-instance driver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Logical name the device is registered under
    pub name: String,
    /// Register with the storage registry on probe
    pub register: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: String::from(DEFAULT_NAME),
            register: cfg!(feature = "mtd"),
        }
    }
}

impl DriverConfig {
    /// Create a configuration for the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Enable or disable registration on probe
    pub fn with_register(mut self, register: bool) -> Self {
        self.register = register;
        self
    }
}

/// Outcome of [`Mr25hxx::detach`]
#[derive(Debug)]
pub enum Detached<B> {
    /// The context was released and the bus handed back, claim dropped
    Released(B),
    /// The registry refused to let go of the device
    ///
    /// The shared context stays allocated for the registry but has lost its
    /// bus; every call through it fails with [`Error::DeviceInert`].
    Inert(Error),
}

/// Error returned by [`Mr25hxx::probe`]
pub enum ProbeError<B: SpiBus + 'static> {
    /// Attach failed; nothing is held
    Attach(Error),
    /// The device is attached but registration failed
    Register {
        /// The attached, unregistered device
        device: Mr25hxx<B>,
        /// Why registration failed
        error: Error,
    },
}

impl<B: SpiBus + 'static> ProbeError<B> {
    /// The underlying error
    pub fn error(&self) -> Error {
        match self {
            Self::Attach(error) | Self::Register { error, .. } => *error,
        }
    }

    /// The attached device, if attach itself succeeded
    pub fn into_device(self) -> Option<Mr25hxx<B>> {
        match self {
            Self::Attach(_) => None,
            Self::Register { device, .. } => Some(device),
        }
    }
}

impl<B: SpiBus + 'static> fmt::Debug for ProbeError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach(error) => f.debug_tuple("Attach").field(error).finish(),
            Self::Register { error, .. } => {
                f.debug_struct("Register").field("error", error).finish_non_exhaustive()
            }
        }
    }
}

impl<B: SpiBus + 'static> fmt::Display for ProbeError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach(error) => write!(f, "attach failed: {}", error),
            Self::Register { error, .. } => write!(f, "registration failed: {}", error),
        }
    }
}

#[cfg(feature = "std")]
impl<B: SpiBus + 'static> std::error::Error for ProbeError<B> {}

/// An attached MR25Hxx device
///
/// Owns the bus claim and the device context for as long as it lives.
/// Operations run synchronously on the calling thread; the type is not
/// `Send` and must not be shared across threads.
pub struct Mr25hxx<B: SpiBus + 'static> {
    ctx: DeviceContext<B>,
    config: DriverConfig,
}

impl<B: SpiBus + 'static> Mr25hxx<B> {
    /// Attach to a chip of the given variant
    ///
    /// Claims the bus and builds the device context. The device is not
    /// registered.
    pub fn attach(bus: B, variant: Variant, config: DriverConfig) -> Result<Self> {
        debug!("mr25hxx: attaching {} as {}", variant, config.name);
        Self::attach_with_geometry(bus, variant.geometry(), config)
    }

    /// Attach to a chip with an explicit geometry
    pub fn attach_with_geometry(mut bus: B, geometry: Geometry, config: DriverConfig) -> Result<Self> {
        if let Err(e) = bus.claim() {
            error!("mr25hxx: failed to claim SPI bus: {}", e);
            return Err(Error::BusClaimFailed);
        }

        debug!(
            "mr25hxx: driver data -> size: {:#x}, addr_bytes: {}",
            geometry.size, geometry.addr_bytes
        );

        Ok(Self {
            ctx: DeviceContext::new(config.name.clone(), geometry, bus),
            config,
        })
    }

    /// Attach and, if the configuration asks for it, register
    ///
    /// A registration failure does not undo the attach: the device is
    /// returned inside [`ProbeError::Register`], attached and unregistered.
    pub fn probe<R: StorageRegistry + ?Sized>(
        bus: B,
        variant: Variant,
        config: DriverConfig,
        registry: &mut R,
    ) -> core::result::Result<Self, ProbeError<B>> {
        let mut device = Self::attach(bus, variant, config).map_err(ProbeError::Attach)?;

        if device.config.register {
            match device.register(registry) {
                Ok(id) => debug!("mr25hxx: {} registered ({})", device.name(), id),
                Err(error) => return Err(ProbeError::Register { device, error }),
            }
        }

        Ok(device)
    }

    /// Register with the storage registry
    ///
    /// Any earlier binding under this name is removed first: the device's own
    /// handle, or a stale one left in the registry by an incomplete detach.
    /// If that removal fails, nothing is registered and the error is
    /// returned.
    pub fn register<R: StorageRegistry + ?Sized>(&mut self, registry: &mut R) -> Result<RegistrationId> {
        let own = self.ctx.registration();
        if let Some(stale) = own.or_else(|| registry.find(self.ctx.name())) {
            debug!("mr25hxx: removing previous registration {} of {}", stale, self.ctx.name());
            registry.unregister(stale)?;
            self.ctx.set_registration(None);
        }

        let id = registry.register(self.ctx.storage_info(), self.ctx.shared())?;
        self.ctx.set_registration(Some(id));
        Ok(id)
    }

    /// Remove the device from the storage registry
    ///
    /// Does nothing if the device is not registered.
    pub fn unregister<R: StorageRegistry + ?Sized>(&mut self, registry: &mut R) -> Result<()> {
        if let Some(id) = self.ctx.registration() {
            registry.unregister(id)?;
            self.ctx.set_registration(None);
        }
        Ok(())
    }

    /// Detach from the chip
    ///
    /// Unregisters first if needed. If the registry refuses, the context
    /// cannot be freed because the registry still holds it; it is made inert
    /// instead and the claim is released.
    pub fn detach<R: StorageRegistry + ?Sized>(mut self, registry: &mut R) -> Detached<B> {
        if let Err(e) = self.unregister(registry) {
            error!("mr25hxx: failed to unregister {}: {}", self.ctx.name(), e);
            if let Some(mut bus) = self.ctx.take_bus() {
                bus.release();
            }
            return Detached::Inert(e);
        }

        match self.ctx.take_bus() {
            Some(mut bus) => {
                bus.release();
                debug!("mr25hxx: {} detached", self.ctx.name());
                Detached::Released(bus)
            }
            None => {
                warn!("mr25hxx: {} has no bus to release", self.ctx.name());
                Detached::Inert(Error::DeviceBusy)
            }
        }
    }

    /// Logical device name
    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    /// Device geometry
    pub fn geometry(&self) -> Geometry {
        self.ctx.geometry()
    }

    /// Returns true if the device is registered
    pub fn is_registered(&self) -> bool {
        self.ctx.is_registered()
    }

    /// Get a reference to the device context
    pub fn context(&self) -> &DeviceContext<B> {
        &self.ctx
    }

    /// Read `buf.len()` bytes starting at `offset`
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.ctx.with_storage(|s| s.read(offset, buf))
    }

    /// Write `data` starting at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<usize> {
        self.ctx.with_storage(|s| s.write(offset, data))
    }

    /// Overwrite `len` bytes starting at `offset` with zeros
    pub fn erase(&self, offset: u64, len: u64) -> Result<()> {
        self.ctx.with_storage(|s| s.erase(offset, len))
    }

    /// Flush pending writes (a no-op on MRAM)
    pub fn sync(&self) -> Result<()> {
        self.ctx.with_storage(|s| s.sync())
    }
}

impl<B: SpiBus + 'static> fmt::Debug for Mr25hxx<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mr25hxx")
            .field("name", &self.ctx.name())
            .field("geometry", &self.ctx.geometry())
            .field("registration", &self.ctx.registration())
            .finish_non_exhaustive()
    }
}
