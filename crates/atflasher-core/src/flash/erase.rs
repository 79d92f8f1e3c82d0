//! Mass and sector erase

use log::{debug, error};

use super::bank::FlashBank;
use super::regs::{Ctrl, EFC_ADDR};
use crate::error::{Error, Result};
use crate::transport::MemoryTransport;

impl FlashBank {
    /// Erase the whole bank in one controller operation
    ///
    /// Not available on the user system data area.
    pub fn mass_erase<T: MemoryTransport + ?Sized>(&mut self, target: &mut T) -> Result<()> {
        self.prepare(target)?;

        let kind = self.probed_kind()?;
        if kind.is_option_area() {
            error!("Mass erase for USD area is not supported");
            return Err(Error::InvalidBank);
        }
        if self.size() == 0 {
            error!("Chip has no {}", kind.name());
            return Err(Error::InvalidBank);
        }

        let timeouts = self.timeouts;
        let mut efc = self.efc(target)?;
        efc.unlock()?;
        efc.wait_not_busy(timeouts.erase)?;
        efc.clear_status()?;

        efc.write_ctrl(Ctrl::BANKERS)?;
        efc.write_ctrl(Ctrl::BANKERS | Ctrl::RSTR)?;
        efc.wait_not_busy_and_check(timeouts.mass_erase)?;

        efc.lock()
    }

    /// Erase sectors `first..=last`
    ///
    /// The first sector that fails aborts the range; the controller is then
    /// left unlocked.
    pub fn erase<T: MemoryTransport + ?Sized>(
        &mut self,
        target: &mut T,
        first: u32,
        last: u32,
    ) -> Result<()> {
        self.prepare(target)?;

        let count = self.sector_count();
        if first > last || last >= count {
            error!("Invalid sector range {}..={} for {} sectors", first, last, count);
            return Err(Error::SectorOutOfRange { first, last, count });
        }

        let kind = self.probed_kind()?;
        let mode = if kind.is_option_area() {
            Ctrl::USD_ERS | Ctrl::USD_UNLOCK
        } else {
            Ctrl::PGERS
        };

        let base = self.base();
        let timeouts = self.timeouts;
        let sectors = self.sectors();
        let mut efc = self.efc(target)?;

        efc.unlock()?;
        efc.wait_not_busy(timeouts.erase)?;

        for sector in &sectors[first as usize..=last as usize] {
            efc.clear_status()?;
            efc.write_ctrl(mode)?;
            if !kind.is_option_area() {
                let addr = base + sector.offset;
                debug!("Erasing sector at 0x{:08x}", addr);
                efc.write_reg(EFC_ADDR, addr)?;
            }
            efc.write_ctrl(mode | Ctrl::RSTR)?;
            efc.wait_not_busy_and_check(timeouts.erase)?;
        }

        efc.lock()
    }
}
