//! mramflash-core - Driver core for Everspin MR25Hxx SPI MRAM
//!
//! This crate drives the MR25Hxx family of serial MRAM chips over a
//! half-duplex SPI transfer primitive and presents them as linear,
//! byte-addressable storage devices. It is `no_std` (with `alloc`) so the
//! same driver can run on a host with a Linux spidev bus or on a target.
//!
//! # Layers
//!
//! - [`chip`] - per-variant geometry table
//! - [`spi`] - opcodes and address encoding
//! - [`bus`] - the [`SpiBus`](bus::SpiBus) transfer primitive
//! - [`protocol`] - READ / WREN / WRITE command framing
//! - [`storage`] - the [`StorageDevice`](storage::StorageDevice) facade
//! - [`registry`] - the storage registry seam
//! - [`driver`] - attach/detach and registration lifecycle
//!
//! # Features
//!
//! - `mtd` (default) - register attached devices with the storage registry
//! - `std` - `std::error::Error` for [`Error`] and serde support for [`chip::Variant`]
//!
//! # Example
//!
//! ```ignore
//! use mramflash_core::chip::Variant;
//! use mramflash_core::driver::{DriverConfig, Mr25hxx};
//!
//! let mut dev = Mr25hxx::probe(bus, Variant::Mr25h40, DriverConfig::default(), &mut registry)?;
//! let mut buf = [0u8; 16];
//! dev.read(0x100, &mut buf)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod chip;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod spi;
pub mod storage;

#[cfg(test)]
mod testutil;

pub use error::{Error, RegistryFailure, Result};
