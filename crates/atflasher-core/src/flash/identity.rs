//! Chip identity read at runtime

use alloc::string::{String, ToString};
use core::fmt;

use log::warn;

use super::bank::FlashBank;
use super::regs::{DEVICE_ID_ADDR, FLASH_SIZE_ADDR, MASK_VERSION_ADDR, UNIQUE_ID_ADDR};
use crate::chip::{self, DeviceRecord};
use crate::error::{Error, Result};
use crate::transport::MemoryTransport;

/// Identification values read from the target
///
/// Read fresh on every call, nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeIdentity {
    /// Debug MCU device ID register
    pub device_id: u32,
    /// Flash size register in KiB
    pub flash_size_kb: u16,
    /// Raw mask version byte
    pub mask_revision: u8,
}

impl RuntimeIdentity {
    /// Read the identity registers
    ///
    /// Fails if any register cannot be read or the flash size register holds
    /// an erased or zero value.
    pub fn read<T: MemoryTransport + ?Sized>(target: &mut T) -> Result<Self> {
        let device_id = target.read_u32(DEVICE_ID_ADDR).map_err(|e| {
            warn!("Cannot read device ID.");
            e
        })?;

        let mask_revision = target.read_u8(MASK_VERSION_ADDR).map_err(|e| {
            warn!("Cannot read mask version.");
            e
        })?;

        let flash_size_kb = match target.read_u16(FLASH_SIZE_ADDR) {
            Ok(0) | Ok(0xFFFF) | Err(_) => {
                warn!("Cannot read flash size.");
                return Err(Error::FlashSizeUnreadable);
            }
            Ok(kb) => kb,
        };

        Ok(Self {
            device_id,
            flash_size_kb,
            mask_revision,
        })
    }

    /// Silicon revision letter, `A` through `H`
    pub fn revision(&self) -> char {
        char::from(b'A' + ((self.mask_revision >> 4) & 0x07))
    }

    /// Catalog entry for the device ID
    pub fn chip(&self) -> Option<&'static DeviceRecord> {
        chip::lookup(self.device_id)
    }
}

impl fmt::Display for RuntimeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chip() {
            Some(dev) => write!(
                f,
                "Chip: {} Rev. {}, {}kB FLASH",
                dev.name,
                self.revision(),
                self.flash_size_kb
            ),
            None => write!(
                f,
                "Unknown chip, Id: 0x{:08x}, Rev: {}, {}kB FLASH",
                self.device_id,
                self.revision(),
                self.flash_size_kb
            ),
        }
    }
}

/// Read the 96-bit unique device ID as three words, lowest address first
pub fn read_unique_id<T: MemoryTransport + ?Sized>(target: &mut T) -> Result<[u32; 3]> {
    let mut uid = [0u32; 3];
    for (i, word) in uid.iter_mut().enumerate() {
        *word = target.read_u32(UNIQUE_ID_ADDR + 4 * i as u32)?;
    }
    Ok(uid)
}

impl FlashBank {
    /// One-line chip summary
    pub fn info<T: MemoryTransport + ?Sized>(&self, target: &mut T) -> Result<String> {
        Ok(RuntimeIdentity::read(target)?.to_string())
    }
}
