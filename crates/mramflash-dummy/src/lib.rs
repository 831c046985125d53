//! mramflash-dummy - In-memory MR25Hxx emulator for testing
//!
//! This crate provides an [`SpiBus`] that emulates an MR25Hxx chip in memory.
//! It decodes chip-select windows byte by byte the way the chip does, so the
//! driver can be exercised end to end without hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use log::trace;
use mramflash_core::bus::{SpiBus, XferFlags};
use mramflash_core::chip::Variant;
use mramflash_core::error::{Error, Result};
use mramflash_core::spi::opcodes;

/// Configuration for the dummy MRAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyConfig {
    /// Array size in bytes
    pub size: usize,
    /// Number of address bytes the chip decodes
    pub addr_bytes: u8,
}

impl DummyConfig {
    /// Configuration matching a chip variant
    pub fn for_variant(variant: Variant) -> Self {
        let geometry = variant.geometry();
        Self {
            size: geometry.size as usize,
            addr_bytes: geometry.addr_bytes,
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Mr25h40)
    }
}

/// One sub-transfer as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Number of bits clocked
    pub bit_len: usize,
    /// Bytes sent, if any
    pub tx: Option<Vec<u8>>,
    /// Size of the receive buffer, if any
    pub rx_len: Option<usize>,
    /// Chip-select flags
    pub flags: XferFlags,
}

/// Decoder state inside an open chip-select window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opcode,
    Address { opcode: u8, addr: usize, remaining: u8 },
    Read { addr: usize },
    Write { addr: usize, enabled: bool },
    Status,
    WriteStatus { enabled: bool },
    Ignore,
}

/// Dummy MRAM chip
///
/// Emulates an MR25Hxx on its own SPI bus. Unlike flash, writes replace
/// bytes outright and there is no busy time.
pub struct DummyMram {
    config: DummyConfig,
    data: Vec<u8>,
    status: u8,
    write_enabled: bool,
    asleep: bool,
    window: Option<Phase>,
    write_command: bool,
    claimed: bool,
    log: Vec<Transfer>,
    /// Refuse the next claim
    pub refuse_claim: bool,
    /// Fail the sub-transfer with this index in the transfer log
    pub fail_at: Option<usize>,
}

impl DummyMram {
    /// Create a new dummy MRAM, zero-filled
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            data: vec![0x00; config.size],
            status: 0,
            write_enabled: false,
            asleep: false,
            window: None,
            write_command: false,
            claimed: false,
            log: Vec::new(),
            refuse_claim: false,
            fail_at: None,
        }
    }

    /// Create a dummy MRAM for a chip variant
    pub fn for_variant(variant: Variant) -> Self {
        Self::new(DummyConfig::for_variant(variant))
    }

    /// Create a dummy MRAM with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut mram = Self::new(config);
        let len = core::cmp::min(initial_data.len(), mram.data.len());
        mram.data[..len].copy_from_slice(&initial_data[..len]);
        mram
    }

    /// Get a reference to the memory array
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the memory array
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Sub-transfers seen so far
    pub fn transfers(&self) -> &[Transfer] {
        &self.log
    }

    /// Forget recorded sub-transfers
    pub fn clear_transfers(&mut self) {
        self.log.clear();
    }

    /// Returns true while the bus is claimed
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Status register as RDSR reports it
    pub fn status(&self) -> u8 {
        if self.write_enabled {
            self.status | opcodes::SR_WEL
        } else {
            self.status & !opcodes::SR_WEL
        }
    }

    fn open_window(&mut self) {
        self.window = Some(Phase::Opcode);
        self.write_command = false;
    }

    fn close_window(&mut self) {
        // The chip clears the latch when a WRITE or WRSR window ends,
        // however many bytes were clocked
        if self.write_command {
            self.write_enabled = false;
        }
        self.window = None;
        self.write_command = false;
    }

    /// Clock one byte through the decoder
    fn clock(&mut self, phase: Phase, mosi: u8) -> (Phase, u8) {
        match phase {
            Phase::Opcode => (self.decode_opcode(mosi), 0xFF),
            Phase::Address {
                opcode,
                addr,
                remaining,
            } => {
                let addr = (addr << 8) | mosi as usize;
                let next = match (remaining - 1, opcode) {
                    (0, opcodes::READ) => Phase::Read {
                        addr: addr % self.config.size,
                    },
                    (0, _) => Phase::Write {
                        addr: addr % self.config.size,
                        enabled: self.write_enabled,
                    },
                    (remaining, opcode) => Phase::Address {
                        opcode,
                        addr,
                        remaining,
                    },
                };
                (next, 0xFF)
            }
            Phase::Read { addr } => {
                let miso = self.data[addr];
                (
                    Phase::Read {
                        addr: (addr + 1) % self.config.size,
                    },
                    miso,
                )
            }
            Phase::Write { addr, enabled } => {
                if enabled {
                    self.data[addr] = mosi;
                }
                (
                    Phase::Write {
                        addr: (addr + 1) % self.config.size,
                        enabled,
                    },
                    0xFF,
                )
            }
            Phase::Status => (Phase::Status, self.status()),
            Phase::WriteStatus { enabled } => {
                if enabled {
                    let mask = opcodes::SR_BP0 | opcodes::SR_BP1 | opcodes::SR_SRWD;
                    self.status = mosi & mask;
                }
                (Phase::Ignore, 0xFF)
            }
            Phase::Ignore => (Phase::Ignore, 0xFF),
        }
    }

    fn decode_opcode(&mut self, opcode: u8) -> Phase {
        trace!("dummy: opcode {:02X}", opcode);

        if self.asleep {
            if opcode == opcodes::WAKE {
                self.asleep = false;
            }
            return Phase::Ignore;
        }

        if opcode == opcodes::WRITE || opcode == opcodes::WRSR {
            self.write_command = true;
        }

        match opcode {
            opcodes::WREN => {
                self.write_enabled = true;
                Phase::Ignore
            }
            opcodes::WRDI => {
                self.write_enabled = false;
                Phase::Ignore
            }
            opcodes::RDSR => Phase::Status,
            opcodes::WRSR => Phase::WriteStatus {
                enabled: self.write_enabled,
            },
            // A zero-sized array has nothing to address
            opcodes::READ | opcodes::WRITE
                if self.config.addr_bytes > 0 && self.config.size > 0 =>
            {
                Phase::Address {
                    opcode,
                    addr: 0,
                    remaining: self.config.addr_bytes,
                }
            }
            opcodes::SLEEP => {
                self.asleep = true;
                Phase::Ignore
            }
            _ => Phase::Ignore,
        }
    }
}

impl SpiBus for DummyMram {
    fn claim(&mut self) -> Result<()> {
        if self.refuse_claim || self.claimed {
            return Err(Error::BusClaimFailed);
        }
        self.claimed = true;
        Ok(())
    }

    fn release(&mut self) {
        self.claimed = false;
    }

    fn transfer(
        &mut self,
        bit_len: usize,
        tx: Option<&[u8]>,
        mut rx: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        let len = bit_len / 8;
        let index = self.log.len();
        self.log.push(Transfer {
            bit_len,
            tx: tx.map(|tx| tx[..len].to_vec()),
            rx_len: rx.as_ref().map(|rx| rx.len()),
            flags,
        });

        if self.fail_at == Some(index) {
            self.close_window();
            return Err(Error::SpiTransferFailed);
        }

        if flags.contains(XferFlags::BEGIN) {
            self.open_window();
        }
        let Some(mut phase) = self.window else {
            return Err(Error::ChipSelectNotAsserted);
        };

        for i in 0..len {
            let mosi = tx.map_or(0xFF, |tx| tx[i]);
            let (next, miso) = self.clock(phase, mosi);
            if let Some(rx) = rx.as_deref_mut() {
                rx[i] = miso;
            }
            phase = next;
        }
        self.window = Some(phase);

        if flags.contains(XferFlags::END) {
            self.close_window();
        }
        Ok(())
    }
}
