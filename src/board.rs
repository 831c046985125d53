//! Board files
//!
//! A board file lists the MRAM devices wired to a board, one entry per chip:
//!
//! ```ron
//! Board(
//!     devices: [
//!         (name: "mram0", chip: mr25h40, bus: "linux_spi:dev=/dev/spidev0.0"),
//!         (name: "mram1", chip: mr25h256, bus: "dummy:image=mram1.bin"),
//!     ],
//! )
//! ```

use std::path::Path;

use mramflash_core::chip::Variant;
use serde::Deserialize;

/// One MRAM device on the board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceEntry {
    /// Logical device name
    pub name: String,
    /// Chip variant
    pub chip: Variant,
    /// Programmer string of the bus the chip sits on
    pub bus: String,
}

/// All MRAM devices on a board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Board {
    /// Devices, attached in order
    pub devices: Vec<DeviceEntry>,
}

impl Board {
    /// Parse a board description
    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let board: Board = ron::from_str(content)?;

        for (i, entry) in board.devices.iter().enumerate() {
            if board.devices[..i].iter().any(|other| other.name == entry.name) {
                return Err(format!("Duplicate device name '{}' in board file", entry.name).into());
            }
        }

        Ok(board)
    }

    /// Load a board file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read board file {:?}: {}", path, e))?;
        let board = Self::parse(&content)?;
        log::debug!("Loaded {} device(s) from {:?}", board.devices.len(), path);
        Ok(board)
    }

    /// Find a device by name
    pub fn device(&self, name: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|entry| entry.name == name)
    }
}
