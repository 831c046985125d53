//! Everspin MR25Hxx SPI opcodes
//!
//! The MR25H family implements a subset of the common serial memory
//! instruction set. There is no erase instruction and no busy polling: a
//! write completes before chip-select is released.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - sets the write enable latch, required before every WRITE
pub const WREN: u8 = 0x06;
/// Write Disable - clears the write enable latch
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;

// ============================================================================
// Memory array
// ============================================================================

/// Read Data Bytes
pub const READ: u8 = 0x03;
/// Write Data Bytes
pub const WRITE: u8 = 0x02;

// ============================================================================
// Power management
// ============================================================================

/// Enter Sleep Mode
pub const SLEEP: u8 = 0xB9;
/// Exit Sleep Mode
pub const WAKE: u8 = 0xAB;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register: Write Enable Latch
pub const SR_WEL: u8 = 0x02;
/// Status Register: Block Protect bit 0
pub const SR_BP0: u8 = 0x04;
/// Status Register: Block Protect bit 1
pub const SR_BP1: u8 = 0x08;
/// Status Register: Status Register Write Disable
pub const SR_SRWD: u8 = 0x80;
