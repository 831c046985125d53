//! mramflash-linux-spi - Linux spidev bus support
//!
//! This crate provides an [`SpiBus`](mramflash_core::bus::SpiBus) over the
//! `/dev/spidevX.Y` device interface.
//!
//! # Overview
//!
//! spidev cannot keep chip-select asserted between ioctl calls. The bus
//! therefore buffers every sub-transfer of a chip-select window and submits
//! the whole window as one `SPI_IOC_MESSAGE` with one segment per
//! sub-transfer when the window ends. Received data is only supported on
//! the last sub-transfer, which is the only place the MR25Hxx protocol
//! reads.
//!
//! # Example
//!
//! ```no_run
//! use mramflash_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! // Open with default settings (2 MHz, mode 0)
//! let spi = LinuxSpi::open_device("/dev/spidev0.0")?;
//!
//! // Or with custom settings
//! let config = LinuxSpiConfig::new("/dev/spidev0.0")
//!     .with_speed(4_000_000)  // 4 MHz
//!     .with_mode(0);
//! let spi = LinuxSpi::open(&config)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with mramflash CLI
//!
//! ```bash
//! mramflash info -p linux_spi:dev=/dev/spidev0.0,chip=mr25h40
//! mramflash read -p linux_spi:dev=/dev/spidev0.0,chip=mr25h256,spispeed=4000 -o mram.bin
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device

pub mod device;
pub mod error;
mod window;

// Re-exports
pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
