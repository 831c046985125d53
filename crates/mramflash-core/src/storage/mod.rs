//! Storage device contract and the MRAM implementation
//!
//! This module provides the [`StorageDevice`] trait that the registry
//! dispatches read/write/erase/sync through, and [`MramStorage`], the
//! implementation backed by an MR25Hxx chip on an [`SpiBus`](crate::bus::SpiBus).

mod device;
mod mram;

pub use device::{StorageDevice, StorageFlags, StorageInfo, StorageKind};
pub use mram::MramStorage;
