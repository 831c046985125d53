//! Recording bus and registry doubles for unit tests

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::bus::{SpiBus, XferFlags};
use crate::error::{Error, RegistryFailure, Result};
use crate::registry::{RegistrationId, SharedDevice, StorageRegistry};
use crate::storage::StorageInfo;

/// One recorded sub-transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xfer {
    pub bit_len: usize,
    pub tx: Option<Vec<u8>>,
    pub rx_len: Option<usize>,
    pub flags: XferFlags,
}

impl Xfer {
    pub fn send(bit_len: usize, tx: &[u8], flags: XferFlags) -> Self {
        Self {
            bit_len,
            tx: Some(tx.to_vec()),
            rx_len: None,
            flags,
        }
    }

    pub fn recv(bit_len: usize, rx_len: usize, flags: XferFlags) -> Self {
        Self {
            bit_len,
            tx: None,
            rx_len: Some(rx_len),
            flags,
        }
    }
}

/// Bus that records every sub-transfer and fills receive buffers with a constant
#[derive(Debug, Default)]
pub struct MockBus {
    pub log: Vec<Xfer>,
    pub fail_at: Option<usize>,
    pub refuse_claim: bool,
    pub claimed: bool,
    pub rx_fill: u8,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpiBus for MockBus {
    fn claim(&mut self) -> Result<()> {
        if self.refuse_claim {
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
        rx: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        let index = self.log.len();
        let len = bit_len / 8;
        self.log.push(Xfer {
            bit_len,
            tx: tx.map(|tx| tx[..len].to_vec()),
            rx_len: rx.as_ref().map(|rx| rx.len()),
            flags,
        });
        if self.fail_at == Some(index) {
            return Err(Error::SpiTransferFailed);
        }
        if let Some(rx) = rx {
            rx.fill(self.rx_fill);
        }
        Ok(())
    }
}

/// Registry call, in order of arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Unregister(RegistrationId),
}

/// Registry that records calls and can refuse them
#[derive(Default)]
pub struct MockRegistry {
    pub calls: Vec<Call>,
    pub entries: BTreeMap<RegistrationId, (StorageInfo, SharedDevice)>,
    pub refuse_register: bool,
    pub refuse_unregister: bool,
    next_id: u32,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(&self, name: &str) -> Option<SharedDevice> {
        self.entries
            .values()
            .find(|(info, _)| info.name == name)
            .map(|(_, dev)| dev.clone())
    }
}

impl StorageRegistry for MockRegistry {
    fn register(&mut self, info: StorageInfo, device: SharedDevice) -> Result<RegistrationId> {
        self.calls.push(Call::Register(info.name.to_string()));
        if self.refuse_register {
            return Err(Error::Registration(RegistryFailure::Rejected));
        }
        if self.find(&info.name).is_some() {
            return Err(Error::Registration(RegistryFailure::NameInUse));
        }
        let id = RegistrationId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, (info, device));
        Ok(id)
    }

    fn unregister(&mut self, id: RegistrationId) -> Result<()> {
        self.calls.push(Call::Unregister(id));
        if self.refuse_unregister {
            return Err(Error::Registration(RegistryFailure::Busy));
        }
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::Registration(RegistryFailure::NotRegistered))
    }

    fn find(&self, name: &str) -> Option<RegistrationId> {
        self.entries
            .iter()
            .find(|(_, (info, _))| info.name == name)
            .map(|(id, _)| *id)
    }
}
