//! mramflash-mtd - Name-keyed storage registry
//!
//! This crate provides [`MtdRegistry`], an in-memory registry that plays the
//! role of the Linux MTD layer for attached MRAM devices: drivers register a
//! [`StorageDevice`](mramflash_core::storage::StorageDevice) under a name,
//! users open it by name and get an [`MtdHandle`] that checks every request
//! against the registered geometry before forwarding it.
//!
//! Open handles pin their device. Like an MTD use-count, a device cannot be
//! unregistered while a handle to it is alive.
//!
//! # Example
//!
//! ```ignore
//! use mramflash_mtd::MtdRegistry;
//!
//! let mut registry = MtdRegistry::new();
//! let dev = Mr25hxx::probe(bus, Variant::Mr25h40, DriverConfig::default(), &mut registry)?;
//!
//! let handle = registry.get_device("mram0")?;
//! handle.write(0x100, b"hello")?;
//! ```

mod error;
mod handle;
mod registry;

pub use error::{MtdError, Result};
pub use handle::MtdHandle;
pub use registry::MtdRegistry;
