//! SPI bus trait definitions

use crate::error::Result;
use bitflags::bitflags;

bitflags! {
    /// Chip-select window flags for a single sub-transfer
    ///
    /// `BEGIN` asserts chip-select before the sub-transfer, `END` releases it
    /// afterwards. A sub-transfer with neither flag continues the window that
    /// is already open.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct XferFlags: u8 {
        /// Assert chip-select before transferring
        const BEGIN = 1 << 0;
        /// Release chip-select after transferring
        const END   = 1 << 1;

        /// A complete standalone transaction
        const ONCE = Self::BEGIN.bits() | Self::END.bits();
    }
}

impl Default for XferFlags {
    fn default() -> Self {
        XferFlags::empty()
    }
}

/// Half-duplex SPI bus with explicit chip-select windows
///
/// A command is built from one or more sub-transfers. All sub-transfers
/// between a `BEGIN` and an `END` are seen by the chip as one continuous
/// command.
///
/// ## Contract
///
/// - `bit_len` is the number of bits to clock; the driver always passes a
///   multiple of 8 and buffers at least `bit_len / 8` bytes long.
/// - `tx` set, `rx` unset: send only. `rx` set, `tx` unset: receive only
///   (the bus clocks out idle bytes). Both set: full duplex.
/// - If a sub-transfer fails, the implementation must release chip-select
///   before returning the error; the caller never closes a failed window.
///
/// ## Example
///
/// ```ignore
/// impl SpiBus for MyController {
///     fn claim(&mut self) -> Result<()> {
///         self.lock().map_err(|_| Error::BusClaimFailed)
///     }
///
///     fn transfer(
///         &mut self,
///         bit_len: usize,
///         tx: Option<&[u8]>,
///         rx: Option<&mut [u8]>,
///         flags: XferFlags,
///     ) -> Result<()> {
///         if flags.contains(XferFlags::BEGIN) {
///             self.cs_low();
///         }
///         let result = self.shift(bit_len, tx, rx);
///         if flags.contains(XferFlags::END) || result.is_err() {
///             self.cs_high();
///         }
///         result
///     }
/// }
/// ```
pub trait SpiBus {
    /// Claim the bus for exclusive use by this device
    fn claim(&mut self) -> Result<()>;

    /// Release a previous claim
    fn release(&mut self) {}

    /// Perform one sub-transfer of `bit_len` bits
    fn transfer(
        &mut self,
        bit_len: usize,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()>;
}

// Blanket impl for boxed buses to allow trait objects
impl<B: SpiBus + ?Sized> SpiBus for alloc::boxed::Box<B> {
    fn claim(&mut self) -> Result<()> {
        (**self).claim()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn transfer(
        &mut self,
        bit_len: usize,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        (**self).transfer(bit_len, tx, rx, flags)
    }
}
