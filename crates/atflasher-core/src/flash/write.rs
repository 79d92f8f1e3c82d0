//! Programming the main banks and the user system data area

use log::{error, trace};

use super::bank::FlashBank;
use super::efc::Efc;
use super::regs::Ctrl;
use crate::error::{Error, Result};
use crate::transport::{MemoryTransport, TransportError};

impl FlashBank {
    /// Program `data` at `offset` bytes into the bank
    ///
    /// The target range must already be erased. Main banks accept any offset
    /// and length; the user system data area is programmed in halfwords, so
    /// both must be even there.
    pub fn write<T: MemoryTransport + ?Sized>(
        &mut self,
        target: &mut T,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.prepare(target)?;
        self.check_write(offset, data.len())?;

        let addr = self.base() + offset;
        let mut efc = self.efc(target)?;
        if efc.kind().is_option_area() {
            write_user(&mut efc, addr, data)
        } else {
            write_main(&mut efc, addr, data)
        }
    }

    /// Validate a write of `len` bytes at `offset` without touching the target
    ///
    /// Fails with `OutOfBounds` if the range does not fit the bank, and with
    /// `UnalignedAccess` for an odd offset or length on the user system data
    /// area. The bank must be probed.
    pub fn check_write(&self, offset: u32, len: usize) -> Result<()> {
        let kind = self.probed_kind()?;
        let end = u32::try_from(len)
            .ok()
            .and_then(|len| offset.checked_add(len));
        if !matches!(end, Some(end) if end <= self.size()) {
            error!(
                "Write of {} bytes at offset 0x{:x} exceeds {} byte bank",
                len,
                offset,
                self.size()
            );
            return Err(Error::OutOfBounds);
        }

        if kind.is_option_area() && (offset & 1 != 0 || len & 1 != 0) {
            error!("Destination address or count is not aligned to two bytes");
            return Err(Error::UnalignedAccess);
        }
        Ok(())
    }
}

fn log_data_error(addr: u32) -> impl FnOnce(TransportError) -> Error {
    move |e| {
        error!("error while writing to address 0x{:08x}: {}", addr, e);
        Error::from(e)
    }
}

fn program_byte<T: MemoryTransport + ?Sized>(
    efc: &mut Efc<'_, T>,
    addr: u32,
    byte: u8,
) -> Result<()> {
    let timeout = efc.timeouts().write;
    efc.write_ctrl(Ctrl::PRGM)?;
    efc.target()
        .write_u8(addr, byte)
        .map_err(log_data_error(addr))?;
    efc.wait_not_busy_and_check(timeout)
}

/// Bytes up to a word boundary, whole words, then the remaining bytes
fn write_main<T: MemoryTransport + ?Sized>(
    efc: &mut Efc<'_, T>,
    mut addr: u32,
    data: &[u8],
) -> Result<()> {
    let timeout = efc.timeouts().write;
    efc.unlock()?;

    let mut rest = data;
    while let Some((&byte, tail)) = rest.split_first() {
        if addr & 3 == 0 {
            break;
        }
        program_byte(efc, addr, byte)?;
        addr += 1;
        rest = tail;
    }

    while rest.len() >= 4 {
        let (word, tail) = rest.split_at(4);
        trace!("Programming word at 0x{:08x}", addr);
        efc.write_ctrl(Ctrl::PRGM)?;
        efc.target()
            .write_block(addr, word)
            .map_err(log_data_error(addr))?;
        efc.wait_not_busy_and_check(timeout)?;
        addr += 4;
        rest = tail;
    }

    for &byte in rest {
        program_byte(efc, addr, byte)?;
        addr += 1;
    }

    efc.lock()
}

/// Halfword by halfword, keeping the user area unlocked between units
fn write_user<T: MemoryTransport + ?Sized>(
    efc: &mut Efc<'_, T>,
    mut addr: u32,
    data: &[u8],
) -> Result<()> {
    let timeout = efc.timeouts().write;
    efc.unlock()?;
    if data.is_empty() {
        return efc.lock();
    }

    efc.clear_status()?;
    for half in data.chunks_exact(2) {
        let value = u16::from_le_bytes([half[0], half[1]]);
        efc.write_ctrl(Ctrl::USD_PRGM | Ctrl::USD_UNLOCK)?;
        efc.target()
            .write_u16(addr, value)
            .map_err(log_data_error(addr))?;
        efc.wait_not_busy_and_check(timeout)?;
        addr += 2;
    }

    efc.lock()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::mock::{probed_bank, Access};
    use crate::flash::BankConfig;
    use crate::flash::regs::*;
    use alloc::vec;
    use alloc::vec::Vec;

    const AT32F415: u32 = 0x7003_0109;
    const AT32F435: u32 = 0x7008_4549;

    /// Accesses that touch the flash array rather than the controller
    fn data_writes(log: &[Access]) -> Vec<Access> {
        log.iter()
            .filter(|a| a.is_write() && !(EFC_BASE..EFC_BASE + 0x80).contains(&a.addr()))
            .cloned()
            .collect()
    }

    fn sts_reads(log: &[Access]) -> usize {
        log.iter()
            .filter(|a| **a == Access::Read32(EFC_BASE + EFC_STS))
            .count()
    }

    #[test]
    fn test_misaligned_write_uses_three_passes() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        let data = [1, 2, 3, 4, 5, 6, 7];
        bank.write(&mut target, 0x102, &data).unwrap();

        assert_eq!(
            data_writes(&target.log),
            vec![
                Access::Write8(FLASH_BASE + 0x102, 1),
                Access::Write8(FLASH_BASE + 0x103, 2),
                Access::Block(FLASH_BASE + 0x104, vec![3, 4, 5, 6]),
                Access::Write8(FLASH_BASE + 0x108, 7),
            ]
        );
        // One checked wait per programmed unit
        assert_eq!(sts_reads(&target.log), 4);
        let ctrl = target.reg_writes(EFC_BASE, EFC_CTRL);
        assert_eq!(ctrl.len(), 5);
        assert!(ctrl[..4].iter().all(|&v| v == Ctrl::PRGM.bits()));
        assert_eq!(ctrl[4], Ctrl::LOCK.bits());
    }

    #[test]
    fn test_aligned_write_is_all_words() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        bank.write(&mut target, 0x400, &[0xAA; 8]).unwrap();
        assert_eq!(
            data_writes(&target.log),
            vec![
                Access::Block(FLASH_BASE + 0x400, vec![0xAA; 4]),
                Access::Block(FLASH_BASE + 0x404, vec![0xAA; 4]),
            ]
        );
    }

    #[test]
    fn test_short_write_is_all_bytes() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        bank.write(&mut target, 0, &[9, 8, 7]).unwrap();
        assert_eq!(
            data_writes(&target.log),
            vec![
                Access::Write8(FLASH_BASE, 9),
                Access::Write8(FLASH_BASE + 1, 8),
                Access::Write8(FLASH_BASE + 2, 7),
            ]
        );
    }

    #[test]
    fn test_program_error_aborts_remaining_passes() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        target.script_sts(&[0, 0, Sts::PRGM_ERR.bits()]);
        let result = bank.write(&mut target, 0x102, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(result, Err(Error::ProgramError));
        assert_eq!(data_writes(&target.log).len(), 3);
        assert!(!target
            .reg_writes(EFC_BASE, EFC_CTRL)
            .contains(&Ctrl::LOCK.bits()));
    }

    #[test]
    fn test_lock_failure_overrides_success() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        target.fail_lock = true;
        let result = bank.write(&mut target, 0, &[1, 2, 3, 4]);
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(data_writes(&target.log).len(), 1);
    }

    #[test]
    fn test_zero_length_write() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        bank.write(&mut target, 0x10, &[]).unwrap();
        assert_eq!(
            target.writes(),
            vec![
                Access::Write32(EFC_BASE + EFC_FCKEY, EFC_KEY1),
                Access::Write32(EFC_BASE + EFC_FCKEY, EFC_KEY2),
                Access::Write32(EFC_BASE + EFC_CTRL, Ctrl::LOCK.bits()),
            ]
        );

        let (mut bank, mut target) = probed_bank(AT32F435, 4032, USD_BASE);
        bank.write(&mut target, 0, &[]).unwrap();
        assert!(data_writes(&target.log).is_empty());
        assert!(target.reg_writes(EFC_BASE, EFC_STS).is_empty());
        assert_eq!(target.reg_writes(EFC_BASE, EFC_CTRL), vec![0]);
    }

    #[test]
    fn test_write_out_of_bounds() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        let size = bank.size();
        assert_eq!(
            bank.write(&mut target, size - 2, &[0; 4]),
            Err(Error::OutOfBounds)
        );
        assert_eq!(
            bank.write(&mut target, u32::MAX, &[0; 4]),
            Err(Error::OutOfBounds)
        );
        assert!(target.log.is_empty());

        bank.write(&mut target, size - 4, &[0; 4]).unwrap();
    }

    #[test]
    fn test_check_write_without_target_access() {
        let (bank, _) = probed_bank(AT32F415, 64, FLASH_BASE);
        let size = bank.size();
        assert_eq!(bank.check_write(0, size as usize), Ok(()));
        assert_eq!(bank.check_write(size, 0), Ok(()));
        assert_eq!(bank.check_write(1, size as usize), Err(Error::OutOfBounds));
        assert_eq!(bank.check_write(u32::MAX, 1), Err(Error::OutOfBounds));

        let (usd, _) = probed_bank(AT32F435, 4032, USD_BASE);
        assert_eq!(usd.check_write(0, 4096), Ok(()));
        assert_eq!(usd.check_write(0, 4098), Err(Error::OutOfBounds));
        assert_eq!(usd.check_write(1, 2), Err(Error::UnalignedAccess));
        assert_eq!(usd.check_write(2, 3), Err(Error::UnalignedAccess));

        let unprobed = FlashBank::new(BankConfig::main_bank());
        assert_eq!(unprobed.check_write(0, 4), Err(Error::InvalidBank));
    }

    #[test]
    fn test_data_write_fault_aborts_without_lock() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        target.fail_data = true;
        assert_eq!(
            bank.write(&mut target, 0x10, &[1, 2, 3, 4]),
            Err(Error::Transport(TransportError::Fault {
                addr: FLASH_BASE + 0x10
            }))
        );
        assert_eq!(sts_reads(&target.log), 0);
        assert_eq!(
            target.reg_writes(EFC_BASE, EFC_CTRL),
            vec![Ctrl::PRGM.bits()]
        );

        let (mut usd, mut target) = probed_bank(AT32F435, 4032, USD_BASE);
        target.fail_data = true;
        assert!(matches!(
            usd.write(&mut target, 0, &[0xA5, 0x5A]),
            Err(Error::Transport(_))
        ));
        assert!(!target.reg_writes(EFC_BASE, EFC_CTRL).contains(&0));
    }

    #[test]
    fn test_option_area_rejects_odd_offset_or_length() {
        let (mut bank, mut target) = probed_bank(AT32F435, 4032, USD_BASE);
        assert_eq!(
            bank.write(&mut target, 1, &[0, 0]),
            Err(Error::UnalignedAccess)
        );
        assert_eq!(
            bank.write(&mut target, 2, &[0, 0, 0]),
            Err(Error::UnalignedAccess)
        );
        assert!(target.log.is_empty());
    }

    #[test]
    fn test_option_area_halfword_writes() {
        let (mut bank, mut target) = probed_bank(AT32F435, 4032, USD_BASE);
        bank.write(&mut target, 2, &[0x5A, 0xA5, 0x12, 0x34]).unwrap();

        assert_eq!(
            data_writes(&target.log),
            vec![
                Access::Write16(USD_BASE + 2, 0xA55A),
                Access::Write16(USD_BASE + 4, 0x3412),
            ]
        );
        let mode = (Ctrl::USD_PRGM | Ctrl::USD_UNLOCK).bits();
        assert_eq!(target.reg_writes(EFC_BASE, EFC_CTRL), vec![mode, mode, 0]);
        assert_eq!(
            target.reg_writes(EFC_BASE, EFC_STS),
            vec![Sts::CLEAR.bits()]
        );
    }

    #[test]
    fn test_write_requires_halted_target() {
        let (mut bank, mut target) = probed_bank(AT32F415, 64, FLASH_BASE);
        target.halted = false;
        assert_eq!(
            bank.write(&mut target, 0, &[1]),
            Err(Error::TargetNotHalted)
        );
        assert!(target.log.is_empty());
    }
}
