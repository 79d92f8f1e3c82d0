//! Device record type

/// One entry of the device catalog
///
/// Records are compiled in and never change at runtime. `flash_size_kb` is
/// the total flash of the part across all banks, while `sector_size` is the
/// erase granularity of its main flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Value of the debug MCU device ID register
    pub id: u32,
    /// Total main flash in KiB
    pub flash_size_kb: u32,
    /// Sector (erase page) size in bytes
    pub sector_size: u32,
    /// Part number
    pub name: &'static str,
}

impl DeviceRecord {
    /// Create a new device record
    pub const fn new(id: u32, flash_size_kb: u32, sector_size: u32, name: &'static str) -> Self {
        Self {
            id,
            flash_size_kb,
            sector_size,
            name,
        }
    }

    /// Total main flash in bytes
    pub const fn flash_size(&self) -> u32 {
        self.flash_size_kb * 1024
    }

    /// Number of sectors covering the whole main flash
    pub const fn sector_count(&self) -> u32 {
        self.flash_size() / self.sector_size
    }
}
