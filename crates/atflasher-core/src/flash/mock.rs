//! Scripted memory transport for unit tests
//!
//! Answers the identification reads, models the lock and key state of the
//! EFC, returns STS values from a script and records every access so tests
//! can assert ordering and abort behavior.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use super::regs::*;
use super::{BankConfig, FlashBank};
use crate::transport::{MemoryTransport, TransportError, TransportResult};

/// Probe a bank at `base` against a fresh mock and clear the access log
pub(crate) fn probed_bank(
    device_id: u32,
    flash_size_kb: u16,
    base: u32,
) -> (FlashBank, MockTarget) {
    let mut target = MockTarget::new(device_id, flash_size_kb);
    let mut bank = FlashBank::new(BankConfig::new(base, 0, "at32"));
    bank.probe(&mut target).unwrap();
    target.clear_log();
    (bank, target)
}

/// One recorded access
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Access {
    Read8(u32),
    Read16(u32),
    Read32(u32),
    Write8(u32, u8),
    Write16(u32, u16),
    Write32(u32, u32),
    Block(u32, Vec<u8>),
}

impl Access {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Access::Write8(..) | Access::Write16(..) | Access::Write32(..) | Access::Block(..)
        )
    }

    pub fn addr(&self) -> u32 {
        match *self {
            Access::Read8(a)
            | Access::Read16(a)
            | Access::Read32(a)
            | Access::Write8(a, _)
            | Access::Write16(a, _)
            | Access::Write32(a, _)
            | Access::Block(a, _) => a,
        }
    }
}

pub(crate) struct MockTarget {
    pub halted: bool,
    pub examined: bool,
    /// `None` makes the device ID read fault
    pub device_id: Option<u32>,
    /// `None` makes the flash size read fault
    pub flash_size_kb: Option<u16>,
    pub mask: u8,
    pub locked: bool,
    pub usd_unlocked: bool,
    /// Whether correct key sequences unlock the controller
    pub accept_keys: bool,
    /// STS values returned by successive reads; `idle_sts` once empty
    pub sts: VecDeque<u32>,
    pub idle_sts: u32,
    /// Fault any CTRL write that sets the lock bit
    pub fail_lock: bool,
    /// Fault every STS read
    pub fail_sts: bool,
    /// Fault every write into the flash array
    pub fail_data: bool,
    pub log: Vec<Access>,
    pub delays: u32,
    key_seen: bool,
    usd_key_seen: bool,
}

impl MockTarget {
    pub fn new(device_id: u32, flash_size_kb: u16) -> Self {
        Self {
            halted: true,
            examined: true,
            device_id: Some(device_id),
            flash_size_kb: Some(flash_size_kb),
            mask: 0x10,
            locked: true,
            usd_unlocked: false,
            accept_keys: true,
            sts: VecDeque::new(),
            idle_sts: 0,
            fail_lock: false,
            fail_sts: false,
            fail_data: false,
            log: Vec::new(),
            delays: 0,
            key_seen: false,
            usd_key_seen: false,
        }
    }

    /// Queue STS values for the next status reads
    pub fn script_sts(&mut self, values: &[u32]) {
        self.sts.extend(values.iter().copied());
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn writes(&self) -> Vec<Access> {
        self.log.iter().filter(|a| a.is_write()).cloned().collect()
    }

    pub fn reads(&self) -> usize {
        self.log.iter().filter(|a| !a.is_write()).count()
    }

    /// Values written to the register at `offset` in the given block
    pub fn reg_writes(&self, block: u32, offset: u32) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Write32(addr, v) if addr == block + offset => Some(v),
                _ => None,
            })
            .collect()
    }

    fn reg_offset(addr: u32) -> Option<u32> {
        if (EFC_BASE..EFC_BASE + 0x80).contains(&addr) {
            Some((addr - EFC_BASE) % 0x40)
        } else {
            None
        }
    }

    fn data_write(&self, addr: u32) -> TransportResult<()> {
        if self.fail_data {
            Err(TransportError::Fault { addr })
        } else {
            Ok(())
        }
    }

    fn ctrl(&self) -> u32 {
        let mut ctrl = 0;
        if self.locked {
            ctrl |= Ctrl::LOCK.bits();
        }
        if self.usd_unlocked {
            ctrl |= Ctrl::USD_UNLOCK.bits();
        }
        ctrl
    }
}

impl MemoryTransport for MockTarget {
    fn read_u8(&mut self, addr: u32) -> TransportResult<u8> {
        self.log.push(Access::Read8(addr));
        match addr {
            MASK_VERSION_ADDR => Ok(self.mask),
            _ => Ok(0xFF),
        }
    }

    fn read_u16(&mut self, addr: u32) -> TransportResult<u16> {
        self.log.push(Access::Read16(addr));
        match addr {
            FLASH_SIZE_ADDR => self.flash_size_kb.ok_or(TransportError::Fault { addr }),
            _ => Ok(0xFFFF),
        }
    }

    fn read_u32(&mut self, addr: u32) -> TransportResult<u32> {
        self.log.push(Access::Read32(addr));
        if addr == DEVICE_ID_ADDR {
            return self.device_id.ok_or(TransportError::Fault { addr });
        }
        if (UNIQUE_ID_ADDR..UNIQUE_ID_ADDR + 12).contains(&addr) {
            return Ok(0x1111_1111 * ((addr - UNIQUE_ID_ADDR) / 4 + 1));
        }
        match Self::reg_offset(addr) {
            Some(EFC_CTRL) => Ok(self.ctrl()),
            Some(EFC_STS) if self.fail_sts => Err(TransportError::Fault { addr }),
            Some(EFC_STS) => Ok(self.sts.pop_front().unwrap_or(self.idle_sts)),
            Some(_) => Ok(0),
            None => Ok(0xFFFF_FFFF),
        }
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> TransportResult<()> {
        self.log.push(Access::Write8(addr, value));
        self.data_write(addr)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> TransportResult<()> {
        self.log.push(Access::Write16(addr, value));
        self.data_write(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> TransportResult<()> {
        self.log.push(Access::Write32(addr, value));
        match Self::reg_offset(addr) {
            Some(EFC_FCKEY) => {
                if value == EFC_KEY2 && self.key_seen && self.accept_keys {
                    self.locked = false;
                }
                self.key_seen = value == EFC_KEY1;
            }
            Some(EFC_USD_UNLOCK) => {
                if value == EFC_KEY2 && self.usd_key_seen && self.accept_keys {
                    self.usd_unlocked = true;
                }
                self.usd_key_seen = value == EFC_KEY1;
            }
            Some(EFC_CTRL) => {
                let ctrl = Ctrl::from_bits_retain(value);
                if ctrl.contains(Ctrl::LOCK) {
                    if self.fail_lock {
                        return Err(TransportError::Fault { addr });
                    }
                    self.locked = true;
                }
                if !ctrl.contains(Ctrl::USD_UNLOCK) {
                    self.usd_unlocked = false;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn write_block(&mut self, addr: u32, data: &[u8]) -> TransportResult<()> {
        self.log.push(Access::Block(addr, data.to_vec()));
        self.data_write(addr)
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn is_examined(&self) -> bool {
        self.examined
    }

    fn delay_us(&mut self, _us: u32) {
        self.delays += 1;
    }
}
