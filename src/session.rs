//! Attach, register and detach the selected devices around a command

use std::path::PathBuf;

use mramflash_core::chip::Variant;
use mramflash_core::driver::{Detached, DriverConfig, Mr25hxx, ProbeError};
use mramflash_mtd::{MtdHandle, MtdRegistry};

use crate::backend::{self, Bus};
use crate::board::Board;
use crate::cli::TargetArgs;

/// One device to attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Logical device name
    pub name: String,
    /// Chip variant
    pub variant: Variant,
    /// Programmer string of its bus
    pub bus: String,
}

impl DeviceSpec {
    /// Resolve the command line target into the devices to attach
    pub fn from_target(target: &TargetArgs) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        if let Some(programmer) = &target.programmer {
            let params = backend::parse_programmer_params(programmer)?;
            let variant = params
                .variant()?
                .ok_or("Missing chip parameter, e.g. chip=mr25h40")?;
            return Ok(vec![Self {
                name: target.device.clone(),
                variant,
                bus: programmer.clone(),
            }]);
        }

        let Some(path) = &target.board else {
            return Err("No target given. Use --programmer or --board".into());
        };
        let board = Board::load(path)?;
        if board.device(&target.device).is_none() {
            return Err(format!("No device named '{}' in {:?}", target.device, path).into());
        }

        Ok(board
            .devices
            .into_iter()
            .map(|entry| Self {
                name: entry.name,
                variant: entry.chip,
                bus: entry.bus,
            })
            .collect())
    }
}

struct Attached {
    device: Mr25hxx<Bus>,
    variant: Variant,
    chunk: usize,
    image: Option<PathBuf>,
}

/// Devices attached and registered for the duration of one command
pub struct Session {
    registry: MtdRegistry,
    attached: Vec<Attached>,
}

impl Session {
    /// Attach and register every device in `specs`
    ///
    /// On failure, devices attached so far are detached again.
    pub fn open(specs: &[DeviceSpec]) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session = Self {
            registry: MtdRegistry::new(),
            attached: Vec::new(),
        };

        for spec in specs {
            if let Err(e) = session.attach(spec) {
                if let Err(close_err) = session.close() {
                    log::warn!("Cleanup after failed attach: {}", close_err);
                }
                return Err(e);
            }
        }

        Ok(session)
    }

    fn attach(&mut self, spec: &DeviceSpec) -> Result<(), Box<dyn std::error::Error>> {
        // Registering would replace the earlier binding of the same name
        if self.find(&spec.name).is_some() {
            return Err(format!("Device '{}' is already attached", spec.name).into());
        }

        let params = backend::parse_programmer_params(&spec.bus)?;
        if let Some(variant) = params.variant()? {
            if variant != spec.variant {
                log::warn!(
                    "{}: bus string names {}, using {}",
                    spec.name,
                    variant,
                    spec.variant
                );
            }
        }

        let opened = backend::open_bus(&params, spec.variant)?;
        let chunk = opened.bus.max_chunk();
        let config = DriverConfig::new(spec.name.clone()).with_register(true);

        let device = match Mr25hxx::probe(opened.bus, spec.variant, config, &mut self.registry) {
            Ok(device) => device,
            Err(ProbeError::Attach(e)) => {
                return Err(format!("{}: attach failed: {}", spec.name, e).into());
            }
            Err(ProbeError::Register { device, error }) => {
                if let Detached::Inert(e) = device.detach(&mut self.registry) {
                    log::warn!("{}: {}", spec.name, e);
                }
                return Err(format!("{}: registration failed: {}", spec.name, error).into());
            }
        };

        log::info!(
            "{}: {} attached ({} bytes)",
            spec.name,
            spec.variant,
            device.geometry().size
        );
        self.attached.push(Attached {
            device,
            variant: spec.variant,
            chunk,
            image: opened.image,
        });
        Ok(())
    }

    /// Open a registered device by name
    pub fn handle(&self, name: &str) -> Result<MtdHandle, Box<dyn std::error::Error>> {
        Ok(self.registry.get_device(name)?)
    }

    /// Variant of an attached device
    pub fn variant(&self, name: &str) -> Option<Variant> {
        self.find(name).map(|a| a.variant)
    }

    /// Largest chunk the device's bus moves in one window
    pub fn chunk_size(&self, name: &str) -> usize {
        self.find(name).map_or(1, |a| a.chunk)
    }

    /// Names of all attached devices, in attach order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attached.iter().map(|a| a.device.name())
    }

    /// Registration details of an attached device
    pub fn device(&self, name: &str) -> Option<&Mr25hxx<Bus>> {
        self.find(name).map(|a| &a.device)
    }

    fn find(&self, name: &str) -> Option<&Attached> {
        self.attached.iter().find(|a| a.device.name() == name)
    }

    /// Detach every device and save emulator images
    ///
    /// All devices are detached even if one of them fails; the first error
    /// is returned.
    pub fn close(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut first_error: Option<Box<dyn std::error::Error>> = None;

        while let Some(attached) = self.attached.pop() {
            let name = attached.device.name().to_string();
            match attached.device.detach(&mut self.registry) {
                Detached::Released(bus) => {
                    log::debug!("{}: detached", name);
                    if let Err(e) = save_image(&bus, attached.image.as_ref()) {
                        first_error.get_or_insert(e);
                    }
                }
                Detached::Inert(e) => {
                    log::error!("{}: device left inert: {}", name, e);
                    first_error.get_or_insert(format!("{}: detach failed: {}", name, e).into());
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[allow(unused_variables)]
fn save_image(bus: &Bus, image: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "dummy")]
    if let (Bus::Dummy(chip), Some(path)) = (bus, image) {
        std::fs::write(path, chip.data())
            .map_err(|e| format!("Failed to save image {:?}: {}", path, e))?;
        log::info!("Saved {} bytes to {:?}", chip.data().len(), path);
    }
    Ok(())
}
