//! EFC register access, unlock/lock and status polling

use log::error;

use super::bank::{BankKind, EfcTimeouts, FlashBank};
use super::regs::*;
use crate::error::{Error, Result};
use crate::transport::MemoryTransport;

/// Register-level handle on the flash controller serving one bank
///
/// Borrows the target for the duration of one erase or program sequence.
/// Every register access is a 32-bit transport access at the bank's register
/// block plus the register offset.
pub struct Efc<'a, T: ?Sized> {
    target: &'a mut T,
    kind: BankKind,
    timeouts: EfcTimeouts,
}

impl<'a, T: MemoryTransport + ?Sized> Efc<'a, T> {
    /// Create a controller handle for a bank of the given kind
    pub fn new(target: &'a mut T, kind: BankKind, timeouts: EfcTimeouts) -> Self {
        Self {
            target,
            kind,
            timeouts,
        }
    }

    /// Bank kind this handle drives
    pub fn kind(&self) -> BankKind {
        self.kind
    }

    /// Polling budgets in use
    pub fn timeouts(&self) -> &EfcTimeouts {
        &self.timeouts
    }

    /// Underlying transport, for data accesses into the flash array
    pub fn target(&mut self) -> &mut T {
        &mut *self.target
    }

    /// Absolute address of a controller register
    pub fn reg_addr(&self, offset: u32) -> u32 {
        self.kind.register_base() + offset
    }

    /// Read a controller register
    pub fn read_reg(&mut self, offset: u32) -> Result<u32> {
        let addr = self.reg_addr(offset);
        self.target.read_u32(addr).map_err(|e| {
            error!("error while reading from address 0x{:08x}: {}", addr, e);
            Error::from(e)
        })
    }

    /// Write a controller register
    pub fn write_reg(&mut self, offset: u32, value: u32) -> Result<()> {
        let addr = self.reg_addr(offset);
        self.target.write_u32(addr, value).map_err(|e| {
            error!("error while writing to address 0x{:08x}: {}", addr, e);
            Error::from(e)
        })
    }

    /// Read CTRL
    pub fn read_ctrl(&mut self) -> Result<Ctrl> {
        self.read_reg(EFC_CTRL).map(Ctrl::from_bits_retain)
    }

    /// Write CTRL
    pub fn write_ctrl(&mut self, ctrl: Ctrl) -> Result<()> {
        self.write_reg(EFC_CTRL, ctrl.bits())
    }

    /// Read STS
    pub fn read_status(&mut self) -> Result<Sts> {
        self.read_reg(EFC_STS).map(Sts::from_bits_retain)
    }

    /// Clear the done and error flags left by the previous operation
    pub fn clear_status(&mut self) -> Result<()> {
        self.write_reg(EFC_STS, Sts::CLEAR.bits())
    }

    /// Unlock the controller for this bank
    ///
    /// Main banks use the FCKEY sequence; the user system data area also
    /// needs its own key sequence. Already unlocked controllers are left
    /// untouched.
    pub fn unlock(&mut self) -> Result<()> {
        if self.kind.is_option_area() {
            self.unlock_user()
        } else {
            self.unlock_main()
        }
    }

    fn write_keys(&mut self, offset: u32) -> Result<()> {
        self.write_reg(offset, EFC_KEY1)?;
        self.write_reg(offset, EFC_KEY2)
    }

    fn unlock_main(&mut self) -> Result<()> {
        if !self.read_ctrl()?.contains(Ctrl::LOCK) {
            return Ok(());
        }

        self.write_keys(EFC_FCKEY)?;

        let ctrl = self.read_ctrl()?;
        if ctrl.contains(Ctrl::LOCK) {
            error!("flash not unlocked FLASH_CTRL: 0x{:08x}", ctrl.bits());
            return Err(Error::UnlockFailed);
        }
        Ok(())
    }

    fn unlock_user(&mut self) -> Result<()> {
        if self.read_ctrl()?.contains(Ctrl::USD_UNLOCK) {
            return Ok(());
        }

        self.write_keys(EFC_FCKEY)?;
        self.write_keys(EFC_USD_UNLOCK)?;

        let mut ctrl = Ctrl::empty();
        for _ in 0..self.timeouts.user_unlock_polls {
            ctrl = self.read_ctrl()?;
            if ctrl.contains(Ctrl::USD_UNLOCK) {
                return Ok(());
            }
        }

        error!("user flash not unlocked FLASH_CTRL: 0x{:08x}", ctrl.bits());
        Err(Error::UnlockFailed)
    }

    /// Lock the controller again
    ///
    /// The user system data area is locked by clearing every CTRL mode bit.
    pub fn lock(&mut self) -> Result<()> {
        if self.kind.is_option_area() {
            self.write_ctrl(Ctrl::empty())
        } else {
            self.write_ctrl(Ctrl::LOCK)
        }
    }

    /// Poll STS until the busy flag clears
    ///
    /// Each busy poll consumes one unit of `timeout` and is followed by the
    /// poll interval delay. Returns the first non-busy status.
    pub fn wait_not_busy(&mut self, timeout: u32) -> Result<Sts> {
        let mut remaining = timeout;
        loop {
            let status = self.read_status()?;
            if !status.contains(Sts::BUSY) {
                return Ok(status);
            }
            if remaining == 0 {
                error!("timed out waiting for flash");
                return Err(Error::Timeout);
            }
            remaining -= 1;
            self.target.delay_us(self.timeouts.poll_interval_us);
        }
    }

    /// Poll STS until not busy, then fail on a hardware error flag
    ///
    /// The flags stay set until the next [`Efc::clear_status`].
    pub fn wait_not_busy_and_check(&mut self, timeout: u32) -> Result<()> {
        let status = self.wait_not_busy(timeout)?;

        if status.contains(Sts::EPP_ERR) {
            error!("Device protected");
        }
        if status.contains(Sts::PRGM_ERR) {
            error!("Attempt to write an address that has not been erased before");
        }

        if status.contains(Sts::EPP_ERR) {
            Err(Error::ProtectionViolation)
        } else if status.contains(Sts::PRGM_ERR) {
            Err(Error::ProgramError)
        } else {
            Ok(())
        }
    }
}

impl FlashBank {
    /// Controller handle for this bank; the bank must have been probed
    pub fn efc<'a, T: MemoryTransport + ?Sized>(&self, target: &'a mut T) -> Result<Efc<'a, T>> {
        Ok(Efc::new(target, self.probed_kind()?, self.timeouts))
    }

    /// Probe if needed and require a halted target
    pub(crate) fn prepare<T: MemoryTransport + ?Sized>(&mut self, target: &mut T) -> Result<()> {
        self.auto_probe(target)?;
        if !target.is_halted() {
            error!("Target not halted");
            return Err(Error::TargetNotHalted);
        }
        Ok(())
    }
}
