//! Bus backends and programmer-string dispatch
//!
//! A programmer string names a bus backend and its options:
//! `dummy:chip=mr25h40,image=mram.bin` or
//! `linux_spi:dev=/dev/spidev0.0,chip=mr25h256,spispeed=4000`.

use std::collections::HashMap;
use std::path::PathBuf;

use mramflash_core::bus::{SpiBus, XferFlags};
use mramflash_core::chip::Variant;

#[cfg(not(any(feature = "dummy", feature = "linux-spi")))]
compile_error!("enable at least one bus backend: dummy or linux-spi");

/// Default chunk size for reads and writes
const DEFAULT_CHUNK: usize = 4096;

/// Opcode and 3 address bytes share the window with the payload
const WINDOW_OVERHEAD: usize = 4;

/// Information about a bus backend
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Information about all available backends (enabled at compile time)
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BusInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BusInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory MR25Hxx emulator (image=<file>)",
    });

    #[cfg(feature = "linux-spi")]
    backends.push(BusInfo {
        name: "linux_spi",
        aliases: &["spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    backends
}

/// Generate a short list of backend names for CLI help
pub fn backend_names_short() -> String {
    let names: Vec<&str> = available_backends().iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Resolve a backend name or alias to its canonical name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Parsed programmer parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Backend name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    /// The chip variant named by the `chip` parameter
    pub fn variant(&self) -> Result<Option<Variant>, Box<dyn std::error::Error>> {
        let Some(chip) = self.params.get("chip") else {
            return Ok(None);
        };
        let variant = chip
            .parse::<Variant>()
            .map_err(|_| format!("Unknown chip '{}'", chip))?;
        Ok(Some(variant))
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// An opened bus
pub enum Bus {
    /// In-memory emulator
    #[cfg(feature = "dummy")]
    Dummy(mramflash_dummy::DummyMram),
    /// Linux spidev
    #[cfg(feature = "linux-spi")]
    LinuxSpi(mramflash_linux_spi::LinuxSpi),
}

impl Bus {
    /// Largest payload that fits one chip-select window
    pub fn max_chunk(&self) -> usize {
        match self {
            #[cfg(feature = "dummy")]
            Bus::Dummy(_) => DEFAULT_CHUNK,
            #[cfg(feature = "linux-spi")]
            Bus::LinuxSpi(spi) => spi
                .max_window_len()
                .saturating_sub(WINDOW_OVERHEAD)
                .clamp(1, DEFAULT_CHUNK),
        }
    }
}

impl SpiBus for Bus {
    fn claim(&mut self) -> mramflash_core::Result<()> {
        match self {
            #[cfg(feature = "dummy")]
            Bus::Dummy(bus) => bus.claim(),
            #[cfg(feature = "linux-spi")]
            Bus::LinuxSpi(bus) => bus.claim(),
        }
    }

    fn release(&mut self) {
        match self {
            #[cfg(feature = "dummy")]
            Bus::Dummy(bus) => bus.release(),
            #[cfg(feature = "linux-spi")]
            Bus::LinuxSpi(bus) => bus.release(),
        }
    }

    fn transfer(
        &mut self,
        bit_len: usize,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> mramflash_core::Result<()> {
        match self {
            #[cfg(feature = "dummy")]
            Bus::Dummy(bus) => bus.transfer(bit_len, tx, rx, flags),
            #[cfg(feature = "linux-spi")]
            Bus::LinuxSpi(bus) => bus.transfer(bit_len, tx, rx, flags),
        }
    }
}

/// A bus together with where its backing image lives, if it has one
pub struct OpenedBus {
    /// The bus, not yet claimed
    pub bus: Bus,
    /// Emulator image to save after a clean detach
    pub image: Option<PathBuf>,
}

/// Open the bus a programmer string describes
pub fn open_bus(
    params: &ProgrammerParams,
    variant: Variant,
) -> Result<OpenedBus, Box<dyn std::error::Error>> {
    let name = find_backend(&params.name).ok_or_else(|| {
        format!(
            "Unknown programmer '{}' [available: {}]",
            params.name,
            backend_names_short()
        )
    })?;

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(params, variant),
        #[cfg(feature = "linux-spi")]
        "linux_spi" => open_linux_spi(params),
        _ => Err(format!("Programmer '{}' is not supported", name).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ProgrammerParams,
    variant: Variant,
) -> Result<OpenedBus, Box<dyn std::error::Error>> {
    use mramflash_dummy::{DummyConfig, DummyMram};

    let config = DummyConfig::for_variant(variant);
    let image = params.params.get("image").map(PathBuf::from);

    let chip = match &image {
        Some(path) if path.exists() => {
            let data = std::fs::read(path)?;
            if data.len() != config.size {
                log::warn!(
                    "dummy: image {:?} is {} bytes, {} has {} bytes",
                    path,
                    data.len(),
                    variant,
                    config.size
                );
            }
            DummyMram::with_data(config, &data)
        }
        _ => DummyMram::new(config),
    };

    log::info!("dummy: emulating {} ({} bytes)", variant, config.size);
    Ok(OpenedBus {
        bus: Bus::Dummy(chip),
        image,
    })
}

#[cfg(feature = "linux-spi")]
fn open_linux_spi(params: &ProgrammerParams) -> Result<OpenedBus, Box<dyn std::error::Error>> {
    let options: Vec<(&str, &str)> = params
        .params
        .iter()
        .filter(|(key, _)| key.as_str() != "chip")
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    let config = mramflash_linux_spi::parse_options(&options)?;
    let spi = mramflash_linux_spi::LinuxSpi::open(&config)?;
    Ok(OpenedBus {
        bus: Bus::LinuxSpi(spi),
        image: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_params() {
        let params = parse_programmer_params("dummy:chip=mr25h256,image=mram.bin").unwrap();
        assert_eq!(params.name, "dummy");
        assert_eq!(params.params.get("image").map(String::as_str), Some("mram.bin"));
        assert_eq!(params.variant().unwrap(), Some(Variant::Mr25h256));
    }

    #[test]
    fn test_parse_programmer_without_options() {
        let params = parse_programmer_params("dummy").unwrap();
        assert_eq!(params.name, "dummy");
        assert!(params.params.is_empty());
        assert_eq!(params.variant().unwrap(), None);
    }

    #[test]
    fn test_parse_programmer_errors() {
        assert!(parse_programmer_params("dummy:chip").is_err());
        let params = parse_programmer_params("dummy:chip=mr25h99").unwrap();
        assert!(params.variant().is_err());
    }

    #[test]
    fn test_find_backend_by_alias() {
        #[cfg(feature = "dummy")]
        assert_eq!(find_backend("emulator"), Some("dummy"));
        #[cfg(feature = "linux-spi")]
        assert_eq!(find_backend("spidev"), Some("linux_spi"));
        assert_eq!(find_backend("ch341a"), None);

        let names = backend_names_short();
        for bus in available_backends() {
            assert!(names.contains(bus.name));
        }
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_by_alias() {
        let params = parse_programmer_params("emulator:chip=mr25h128").unwrap();
        let opened = open_bus(&params, Variant::Mr25h128).unwrap();
        assert!(opened.image.is_none());
        match opened.bus {
            Bus::Dummy(chip) => assert_eq!(chip.data().len(), 0x4000),
            #[allow(unreachable_patterns)]
            _ => panic!("expected dummy bus"),
        }
    }

    #[test]
    fn test_unknown_backend() {
        let params = parse_programmer_params("ch341a").unwrap();
        assert!(open_bus(&params, Variant::Mr25h40).is_err());
    }
}
