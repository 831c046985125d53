//! SPI opcodes and address encoding
//!
//! This module provides the MR25Hxx instruction set and the encoding of
//! linear offsets into the chip's big-endian address field.

mod address;
pub mod opcodes;

pub use address::{encode_address, AddressWidth, EncodedAddress};
pub use opcodes::*;
