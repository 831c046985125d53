//! Chip-select window accumulation
//!
//! spidev has no way to hold chip-select across separate ioctl calls, so the
//! sub-transfers of one window are buffered here and submitted together as a
//! single `SPI_IOC_MESSAGE` once the window ends.

use crate::error::{LinuxSpiError, Result};

/// One buffered sub-transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    /// Bytes to send, or `None` to clock out idle bytes
    pub tx: Option<Vec<u8>>,
    /// Length in bytes
    pub len: usize,
}

/// Sub-transfers of the window currently open
#[derive(Debug, Default)]
pub(crate) struct Window {
    segments: Vec<Segment>,
    open: bool,
}

impl Window {
    /// Assert chip-select, dropping anything left from an unfinished window
    pub fn begin(&mut self) {
        if self.open && !self.segments.is_empty() {
            log::warn!(
                "linux_spi: discarding {} sub-transfers of an unfinished window",
                self.segments.len()
            );
        }
        self.segments.clear();
        self.open = true;
    }

    /// Buffer a sub-transfer that continues the window
    pub fn push(&mut self, len: usize, tx: Option<&[u8]>) -> Result<()> {
        if !self.open {
            return Err(LinuxSpiError::NoWindow);
        }
        self.segments.push(Segment {
            tx: tx.map(|tx| tx[..len].to_vec()),
            len,
        });
        Ok(())
    }

    /// Release chip-select and hand out the buffered sub-transfers
    pub fn finish(&mut self) -> Result<Vec<Segment>> {
        if !self.open {
            return Err(LinuxSpiError::NoWindow);
        }
        self.open = false;
        Ok(std::mem::take(&mut self.segments))
    }

    /// Drop the window without submitting it
    pub fn abort(&mut self) {
        self.segments.clear();
        self.open = false;
    }

    /// Bytes buffered so far
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_until_finish() {
        let mut window = Window::default();
        window.begin();
        window.push(1, Some(&[0x03])).unwrap();
        window.push(3, Some(&[0x01, 0x02, 0x03, 0xFF])).unwrap();
        assert_eq!(window.len(), 4);

        let segments = window.finish().unwrap();
        assert_eq!(
            segments,
            vec![
                Segment {
                    tx: Some(vec![0x03]),
                    len: 1
                },
                Segment {
                    tx: Some(vec![0x01, 0x02, 0x03]),
                    len: 3
                },
            ]
        );
        assert!(!window.is_open());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_push_without_begin() {
        let mut window = Window::default();
        assert!(matches!(window.push(1, None), Err(LinuxSpiError::NoWindow)));
        assert!(matches!(window.finish(), Err(LinuxSpiError::NoWindow)));
    }

    #[test]
    fn test_begin_restarts_window() {
        let mut window = Window::default();
        window.begin();
        window.push(2, None).unwrap();
        window.begin();
        assert_eq!(window.len(), 0);
        assert!(window.is_open());
    }

    #[test]
    fn test_abort_closes_window() {
        let mut window = Window::default();
        window.begin();
        window.push(1, Some(&[0x02])).unwrap();
        window.abort();
        assert!(!window.is_open());
        assert!(matches!(window.push(1, None), Err(LinuxSpiError::NoWindow)));
    }
}
