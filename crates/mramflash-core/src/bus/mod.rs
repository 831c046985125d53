//! SPI bus abstraction
//!
//! This module defines the transfer primitive the driver issues its command
//! windows over.

mod traits;

pub use traits::*;
