//! Bank descriptor, geometry resolution and probing

use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, error, info, warn};

use super::regs::*;
use crate::chip::{self, DeviceRecord};
use crate::error::{Error, Result};
use crate::transport::MemoryTransport;

/// Which physical flash region a bank covers
///
/// Resolved from the configured base address when the bank is probed and
/// carried on the bank from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    /// Main flash bank 1, driven by the primary EFC register block
    Main1,
    /// Main flash bank 2 of the dual-bank parts, driven by the secondary block
    Main2,
    /// User system data (option byte) area
    OptionArea,
}

impl BankKind {
    /// Classify a bank base address; zero selects main bank 1
    pub fn from_base(base: u32) -> Option<Self> {
        match base {
            0 | FLASH_BASE => Some(Self::Main1),
            FLASH_BANK2_BASE_4032K | FLASH_BANK2_BASE_1024K => Some(Self::Main2),
            USD_BASE => Some(Self::OptionArea),
            _ => None,
        }
    }

    /// EFC register block serving this region
    pub const fn register_base(self) -> u32 {
        match self {
            Self::Main1 | Self::OptionArea => EFC_BASE,
            Self::Main2 => EFC_BANK2_BASE,
        }
    }

    /// Whether this is the user system data area
    pub const fn is_option_area(self) -> bool {
        matches!(self, Self::OptionArea)
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main1 => "bank 1",
            Self::Main2 => "bank 2",
            Self::OptionArea => "user system data",
        }
    }
}

/// Erase state of a sector as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErasedState {
    /// Not checked
    #[default]
    Unknown,
    /// All bytes read back as erased
    Erased,
    /// At least one programmed byte
    NotErased,
}

/// Write protection state of a sector
///
/// Protection is never read back from the device, so probed sectors always
/// carry [`ProtectedState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtectedState {
    /// Not checked
    #[default]
    Unknown,
    /// Sector is write protected
    Protected,
    /// Sector is writable
    Unprotected,
}

/// One erasable unit of a bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Offset from the bank base in bytes
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
    /// Erase state
    pub erased: ErasedState,
    /// Protection state
    pub protected: ProtectedState,
}

/// Polling budgets for the EFC status loops
///
/// Each budget counts busy polls; consecutive polls are separated by
/// `poll_interval_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfcTimeouts {
    /// Per sector erase
    pub erase: u32,
    /// Whole bank erase
    pub mass_erase: u32,
    /// Per programmed unit (byte, halfword or word)
    pub write: u32,
    /// Reads of CTRL while waiting for the user area unlock bit
    pub user_unlock_polls: u32,
    /// Delay between busy polls in microseconds
    pub poll_interval_us: u32,
}

impl Default for EfcTimeouts {
    fn default() -> Self {
        Self {
            erase: 100,
            mass_erase: 100_000,
            write: 10,
            user_unlock_polls: 1000,
            poll_interval_us: 1000,
        }
    }
}

/// Bank configuration as supplied by the user
///
/// The declared size is informational only; probing always recomputes the
/// size from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    /// Base address of the region
    pub base: u32,
    /// Declared size in bytes
    pub size: u32,
    /// Bank index within the host tool
    pub index: u32,
    /// Name of the target the bank belongs to
    pub target: String,
}

impl BankConfig {
    /// Configuration for a bank at `base`
    pub fn new(base: u32, index: u32, target: impl Into<String>) -> Self {
        Self {
            base,
            size: 0,
            index,
            target: target.into(),
        }
    }

    /// Main bank 1 at index 0 with no target name
    pub fn main_bank() -> Self {
        Self::new(FLASH_BASE, 0, String::new())
    }

    /// Parse positional bank parameters `<base> <size> <index> <target>`
    ///
    /// Numbers accept a `0x` prefix for hex. Fewer than four fields, or a
    /// field that does not parse, is a syntax error.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        if args.len() < 4 {
            return Err(Error::CommandSyntax);
        }
        let base = parse_u32(args[0])?;
        let size = parse_u32(args[1])?;
        let index = parse_u32(args[2])?;
        let target = args[3].trim();
        if target.is_empty() {
            return Err(Error::CommandSyntax);
        }
        Ok(Self {
            base,
            size,
            index,
            target: target.into(),
        })
    }
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| Error::CommandSyntax)
}

/// Sector size guess for a flash capacity in KiB
///
/// Irregular capacities belong to the large-sector families. Everything up to
/// 128 KiB uses 1 KiB sectors and larger power-of-two parts use 2 KiB. Zero
/// takes the power-of-two path.
pub fn resolve_sector_size(flash_size_kb: u32) -> u32 {
    if flash_size_kb & flash_size_kb.wrapping_sub(1) != 0 {
        4096
    } else if flash_size_kb <= 128 {
        1024
    } else {
        2048
    }
}

/// One configured flash region and its probed geometry
#[derive(Debug, Clone)]
pub struct FlashBank {
    index: u32,
    base: u32,
    declared_size: u32,
    target: String,
    pub(crate) kind: Option<BankKind>,
    size: u32,
    sector_size: u32,
    sectors: Vec<Sector>,
    probed: bool,
    chip: Option<&'static DeviceRecord>,
    flash_size_kb: u32,
    pub(crate) timeouts: EfcTimeouts,
}

impl FlashBank {
    /// Create an unprobed bank from its configuration
    pub fn new(config: BankConfig) -> Self {
        Self {
            index: config.index,
            base: config.base,
            declared_size: config.size,
            target: config.target,
            kind: None,
            size: 0,
            sector_size: 0,
            sectors: Vec::new(),
            probed: false,
            chip: None,
            flash_size_kb: 0,
            timeouts: EfcTimeouts::default(),
        }
    }

    /// Replace the polling budgets
    pub fn with_timeouts(mut self, timeouts: EfcTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Bank index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Base address; normalized by probing for bank 2
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Size given at configuration time
    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    /// Name of the target this bank belongs to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Region kind, known once probed
    pub fn kind(&self) -> Option<BankKind> {
        self.kind
    }

    /// EFC register block for this bank, known once probed
    pub fn register_base(&self) -> Option<u32> {
        self.kind.map(BankKind::register_base)
    }

    /// Bank size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Sector size in bytes
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Number of sectors
    pub fn sector_count(&self) -> u32 {
        self.sectors.len() as u32
    }

    /// Sector table
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Whether the geometry has been populated
    pub fn is_probed(&self) -> bool {
        self.probed
    }

    /// Catalog entry matched by the last probe
    pub fn chip(&self) -> Option<&'static DeviceRecord> {
        self.chip
    }

    /// Total flash of the part in KiB, as used by the last probe
    pub fn flash_size_kb(&self) -> u32 {
        self.flash_size_kb
    }

    /// Polling budgets
    pub fn timeouts(&self) -> &EfcTimeouts {
        &self.timeouts
    }

    /// Identify the chip and populate the bank geometry
    ///
    /// Any previous sector table is discarded first. On failure the bank is
    /// left unprobed.
    pub fn probe<T: MemoryTransport + ?Sized>(&mut self, target: &mut T) -> Result<()> {
        self.probed = false;
        self.sectors = Vec::new();
        self.size = 0;
        self.chip = None;
        self.kind = None;

        if !target.is_examined() {
            error!("Target not examined yet");
            return Err(Error::TargetNotExamined);
        }

        let device_id = target.read_u32(DEVICE_ID_ADDR).map_err(|e| {
            warn!("Cannot read device ID at 0x{:08X}: {}", DEVICE_ID_ADDR, e);
            e
        })?;

        let reported_kb = match target.read_u16(FLASH_SIZE_ADDR) {
            Ok(0) | Ok(0xFFFF) => {
                warn!("Cannot read flash size");
                None
            }
            Ok(kb) => Some(u32::from(kb)),
            Err(e) => {
                warn!("Cannot read flash size at 0x{:08X}: {}", FLASH_SIZE_ADDR, e);
                None
            }
        };

        let chip = chip::lookup(device_id);
        let (flash_kb, mut sector_size) = match (chip, reported_kb) {
            (Some(dev), None) => {
                info!(
                    "Chip: {}, {}kB FLASH, {} bytes sectors",
                    dev.name, dev.flash_size_kb, dev.sector_size
                );
                (dev.flash_size_kb, dev.sector_size)
            }
            (Some(dev), Some(kb)) if kb == dev.flash_size_kb => {
                info!(
                    "Chip: {}, {}kB FLASH, {} bytes sectors",
                    dev.name, kb, dev.sector_size
                );
                (kb, dev.sector_size)
            }
            (Some(dev), Some(kb)) => {
                let guess = resolve_sector_size(kb);
                info!(
                    "Chip: {}, {}kB FLASH expected, but {}kB detected. Guessing {} bytes sectors",
                    dev.name, dev.flash_size_kb, kb, guess
                );
                (kb, guess)
            }
            (None, kb) => {
                let kb = kb.unwrap_or(0);
                let guess = resolve_sector_size(kb);
                info!(
                    "Unknown chip id: 0x{:08x}, {}kB FLASH detected. Guessing {} bytes sectors",
                    device_id, kb, guess
                );
                (kb, guess)
            }
        };

        if self.base == 0 {
            self.base = FLASH_BASE;
        }
        let kind = BankKind::from_base(self.base).ok_or_else(|| {
            error!("Unsupported bank base address 0x{:08x}", self.base);
            Error::UnsupportedBank { base: self.base }
        })?;

        let size = match kind {
            BankKind::OptionArea => {
                let area = if flash_kb == 4032 || flash_kb == 448 {
                    4096
                } else {
                    512
                };
                sector_size = area;
                info!("User system area: {} bytes", area);
                area
            }
            BankKind::Main1 => {
                let size = match flash_kb {
                    4032 => 2048 * 1024,
                    1024 => 512 * 1024,
                    kb => kb * 1024,
                };
                info!("Bank 1: {}kB", size / 1024);
                size
            }
            BankKind::Main2 => {
                let (size, canonical_base) = match flash_kb {
                    4032 => (1984 * 1024, Some(FLASH_BANK2_BASE_4032K)),
                    1024 => (512 * 1024, Some(FLASH_BANK2_BASE_1024K)),
                    _ => (0, None),
                };
                if let Some(canonical) = canonical_base {
                    if self.base != canonical {
                        info!("Fixing base address for bank 2: 0x{:08x}", canonical);
                        self.base = canonical;
                    }
                }
                info!("Bank 2: {}kB", size / 1024);
                size
            }
        };

        if size != 0 {
            let count = size / sector_size;
            if count * sector_size != size {
                warn!(
                    "Bank size {} is not a multiple of the {} byte sector size",
                    size, sector_size
                );
            }
            self.sectors = (0..count)
                .map(|i| Sector {
                    offset: i * sector_size,
                    size: sector_size,
                    erased: ErasedState::Unknown,
                    protected: ProtectedState::Unknown,
                })
                .collect();
            if count != 0 {
                debug!("allocated {} sectors", count);
            }
        } else {
            debug!("Chip has no {}", kind.name());
        }

        self.kind = Some(kind);
        self.size = size;
        self.sector_size = sector_size;
        self.chip = chip;
        self.flash_size_kb = flash_kb;
        self.probed = true;
        Ok(())
    }

    /// Probe only if the bank has not been probed yet
    pub fn auto_probe<T: MemoryTransport + ?Sized>(&mut self, target: &mut T) -> Result<()> {
        if self.probed {
            return Ok(());
        }
        self.probe(target)
    }

    /// Region kind of a probed bank
    pub(crate) fn probed_kind(&self) -> Result<BankKind> {
        self.kind.ok_or(Error::InvalidBank)
    }
}
