//! MR25Hxx command framing
//!
//! Every memory command is one chip-select window made of three
//! sub-transfers: the opcode opens the window, the address continues it and
//! the payload closes it.
//!
//! ```text
//!  CS  ‾‾\____________________________________________/‾‾
//!        | opcode (8) | address (16/24) | payload (8*N) |
//!          BEGIN                          END
//! ```
//!
//! A failed sub-transfer is returned as-is. Nothing is retried and the
//! window is not closed here; releasing chip-select after a failure is part
//! of the [`SpiBus`] contract.

use log::trace;

use crate::bus::{SpiBus, XferFlags};
use crate::error::Result;
use crate::spi::{opcodes, EncodedAddress};

/// Send a single-byte instruction as a standalone transaction
pub fn command<B: SpiBus + ?Sized>(bus: &mut B, opcode: u8) -> Result<()> {
    trace!("mr25h: cmd {:02X}", opcode);
    bus.transfer(8, Some(&[opcode]), None, XferFlags::ONCE)
}

/// Send the Write Enable command
pub fn write_enable<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    command(bus, opcodes::WREN)
}

/// Send the Write Disable command
pub fn write_disable<B: SpiBus + ?Sized>(bus: &mut B) -> Result<()> {
    command(bus, opcodes::WRDI)
}

/// Read the status register
pub fn read_status<B: SpiBus + ?Sized>(bus: &mut B) -> Result<u8> {
    let mut buf = [0u8; 1];
    bus.transfer(8, Some(&[opcodes::RDSR]), None, XferFlags::BEGIN)?;
    bus.transfer(8, None, Some(&mut buf), XferFlags::END)?;
    Ok(buf[0])
}

/// Read `buf.len()` bytes starting at `addr`
pub fn read<B: SpiBus + ?Sized>(bus: &mut B, addr: &EncodedAddress, buf: &mut [u8]) -> Result<()> {
    trace!("mr25h: READ @{:02X?} len={}", addr.as_bytes(), buf.len());

    bus.transfer(8, Some(&[opcodes::READ]), None, XferFlags::BEGIN)?;
    bus.transfer(addr.bit_len(), Some(addr.as_bytes()), None, XferFlags::empty())?;
    bus.transfer(buf.len() * 8, None, Some(buf), XferFlags::END)
}

/// Write `data` starting at `addr`
///
/// The write enable latch is cleared by the chip after every write, so a
/// WREN transaction is issued before each WRITE window.
pub fn write<B: SpiBus + ?Sized>(bus: &mut B, addr: &EncodedAddress, data: &[u8]) -> Result<()> {
    trace!("mr25h: WRITE @{:02X?} len={}", addr.as_bytes(), data.len());

    write_enable(bus)?;

    bus.transfer(8, Some(&[opcodes::WRITE]), None, XferFlags::BEGIN)?;
    bus.transfer(addr.bit_len(), Some(addr.as_bytes()), None, XferFlags::empty())?;
    bus.transfer(data.len() * 8, Some(data), None, XferFlags::END)
}
