//! atflasher-dummy - In-memory AT32 target for testing
//!
//! This crate provides a dummy target that emulates the parts of an Artery
//! AT32 microcontroller the flash driver touches: the identification
//! registers, the main flash array, the user system data area and both EFC
//! register blocks. It's useful for testing and development without a probe
//! or a board.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use atflasher_core::chip;
use atflasher_core::flash::regs::*;
use atflasher_core::flash::resolve_sector_size;
use atflasher_core::transport::{MemoryTransport, TransportError, TransportResult};
use log::trace;

/// Base of the system information block holding flash size, UID and mask
const SYSINFO_BASE: u32 = FLASH_SIZE_ADDR;
const SYSINFO_LEN: u32 = 0x20;

/// Configuration for the dummy target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Debug MCU device ID
    pub device_id: u32,
    /// Value of the flash size register in KiB
    pub flash_size_kb: u16,
    /// Mask version byte
    pub mask_revision: u8,
    /// Unique device ID words
    pub unique_id: [u32; 3],
    /// Core halted
    pub halted: bool,
    /// Examined by the debugger
    pub examined: bool,
    /// Busy polls reported after each erase or program
    pub busy_cycles: u32,
    /// Reject every erase and program with a protection error
    pub write_protected: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: 0x7008_4549, // AT32F435CMT7
            flash_size_kb: 4032,
            mask_revision: 0x10,
            unique_id: [0x3038_4E12, 0x3331_5107, 0x0024_0036],
            halted: true,
            examined: true,
            busy_cycles: 0,
            write_protected: false,
        }
    }
}

impl DummyConfig {
    /// Total main flash in bytes
    pub fn flash_size(&self) -> usize {
        usize::from(self.flash_size_kb) * 1024
    }

    /// Bytes served by the first EFC block
    pub fn bank1_size(&self) -> usize {
        match self.flash_size_kb {
            4032 => 2048 * 1024,
            1024 => 512 * 1024,
            _ => self.flash_size(),
        }
    }

    /// Size of the user system data area
    pub fn user_area_size(&self) -> usize {
        match self.flash_size_kb {
            4032 | 448 => 4096,
            _ => 512,
        }
    }

    /// Page erase granularity of the main flash
    pub fn sector_size(&self) -> usize {
        let kb = u32::from(self.flash_size_kb);
        let size = match chip::lookup(self.device_id) {
            Some(dev) if dev.flash_size_kb == kb => dev.sector_size,
            _ => resolve_sector_size(kb),
        };
        size as usize
    }
}

/// State of one EFC register block
#[derive(Debug, Clone)]
struct Controller {
    locked: bool,
    key_armed: bool,
    usd_key_armed: bool,
    usd_unlocked: bool,
    mode: Ctrl,
    addr: u32,
    status: Sts,
    busy: u32,
}

impl Controller {
    fn new() -> Self {
        Self {
            locked: true,
            key_armed: false,
            usd_key_armed: false,
            usd_unlocked: false,
            mode: Ctrl::empty(),
            addr: 0,
            status: Sts::empty(),
            busy: 0,
        }
    }

    fn ctrl(&self) -> Ctrl {
        let mut ctrl = self.mode;
        ctrl.set(Ctrl::LOCK, self.locked);
        ctrl.set(Ctrl::USD_UNLOCK, self.usd_unlocked);
        ctrl
    }

    fn read_status(&mut self) -> Sts {
        if self.busy > 0 {
            self.busy -= 1;
            self.status | Sts::BUSY
        } else {
            self.status
        }
    }
}

/// Where a flash access lands
enum Region {
    Main { offset: usize, bank: usize },
    User { offset: usize },
}

/// Dummy AT32 target
///
/// Emulates the EFC in memory: the key sequences, lock and user-unlock
/// bits, busy cycles, done and error flags, page, bank and user area erase
/// and programming with the usual only-erased-bytes rule.
pub struct DummyTarget {
    config: DummyConfig,
    flash: Vec<u8>,
    user: Vec<u8>,
    efc: [Controller; 2],
    elapsed_us: u64,
}

impl DummyTarget {
    /// Create a new dummy target with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![0xFF; config.flash_size()];
        let user = vec![0xFF; config.user_area_size()];
        Self {
            config,
            flash,
            user,
            efc: [Controller::new(), Controller::new()],
            elapsed_us: 0,
        }
    }

    /// Create a new dummy target with default configuration (AT32F435CMT7)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Main flash contents, both banks
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Mutable main flash contents, for preparing test images
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    /// User system data area contents
    pub fn user_area(&self) -> &[u8] {
        &self.user
    }

    /// Halt or resume the core
    pub fn set_halted(&mut self, halted: bool) {
        self.config.halted = halted;
    }

    /// Turn the protection error on or off
    pub fn set_write_protected(&mut self, protected: bool) {
        self.config.write_protected = protected;
    }

    /// Whether the EFC block for `bank` (0 or 1) is locked
    pub fn is_locked(&self, bank: usize) -> bool {
        self.efc[bank].locked
    }

    /// Total time spent in `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn sysinfo(&self) -> [u8; SYSINFO_LEN as usize] {
        let mut info = [0xFF; SYSINFO_LEN as usize];
        info[0..2].copy_from_slice(&self.config.flash_size_kb.to_le_bytes());
        for (i, word) in self.config.unique_id.iter().enumerate() {
            let at = (UNIQUE_ID_ADDR - SYSINFO_BASE) as usize + 4 * i;
            info[at..at + 4].copy_from_slice(&word.to_le_bytes());
        }
        // The mask byte overlays the third UID word
        info[(MASK_VERSION_ADDR - SYSINFO_BASE) as usize] = self.config.mask_revision;
        info
    }

    fn bank_range(&self, bank: usize) -> Range<usize> {
        let split = self.config.bank1_size().min(self.flash.len());
        if bank == 0 {
            0..split
        } else {
            split..self.flash.len()
        }
    }

    fn region(&self, addr: u32, len: usize) -> Option<Region> {
        let end = u64::from(addr) + len as u64;
        if addr >= FLASH_BASE && end <= u64::from(FLASH_BASE) + self.flash.len() as u64 {
            let offset = (addr - FLASH_BASE) as usize;
            let bank = usize::from(offset >= self.config.bank1_size());
            return Some(Region::Main { offset, bank });
        }
        if addr >= USD_BASE && end <= u64::from(USD_BASE) + self.user.len() as u64 {
            return Some(Region::User {
                offset: (addr - USD_BASE) as usize,
            });
        }
        None
    }

    fn efc_register(addr: u32) -> Option<(usize, u32)> {
        if (EFC_BASE..EFC_BASE + 0x80).contains(&addr) {
            let rel = addr - EFC_BASE;
            Some(((rel / 0x40) as usize, rel % 0x40))
        } else {
            None
        }
    }

    fn peek(&self, addr: u32) -> Option<u8> {
        match self.region(addr, 1) {
            Some(Region::Main { offset, .. }) => return Some(self.flash[offset]),
            Some(Region::User { offset }) => return Some(self.user[offset]),
            None => {}
        }
        if (SYSINFO_BASE..SYSINFO_BASE + SYSINFO_LEN).contains(&addr) {
            return Some(self.sysinfo()[(addr - SYSINFO_BASE) as usize]);
        }
        None
    }

    fn read_le(&mut self, addr: u32, len: u32) -> TransportResult<u32> {
        if addr % len != 0 {
            return Err(TransportError::Unaligned { addr });
        }
        if len == 4 {
            if addr == DEVICE_ID_ADDR {
                return Ok(self.config.device_id);
            }
            if let Some((bank, offset)) = Self::efc_register(addr) {
                return Ok(self.read_reg(bank, offset));
            }
        }
        let mut value = 0u32;
        for i in 0..len {
            let byte = self.peek(addr + i).ok_or(TransportError::Fault { addr })?;
            value |= u32::from(byte) << (8 * i);
        }
        Ok(value)
    }

    fn read_reg(&mut self, bank: usize, offset: u32) -> u32 {
        let efc = &mut self.efc[bank];
        match offset {
            EFC_CTRL => efc.ctrl().bits(),
            EFC_STS => efc.read_status().bits(),
            EFC_ADDR => efc.addr,
            _ => 0,
        }
    }

    fn write_reg(&mut self, bank: usize, offset: u32, value: u32) {
        let efc = &mut self.efc[bank];
        match offset {
            EFC_FCKEY => {
                if value == EFC_KEY2 && efc.key_armed {
                    trace!("EFC{}: unlocked", bank);
                    efc.locked = false;
                }
                efc.key_armed = value == EFC_KEY1;
            }
            EFC_USD_UNLOCK if bank == 0 => {
                if value == EFC_KEY2 && efc.usd_key_armed && !efc.locked {
                    trace!("EFC: user area unlocked");
                    efc.usd_unlocked = true;
                }
                efc.usd_key_armed = value == EFC_KEY1;
            }
            EFC_STS => efc.status.remove(Sts::from_bits_truncate(value) & Sts::CLEAR),
            EFC_ADDR => efc.addr = value,
            EFC_CTRL => self.write_ctrl(bank, Ctrl::from_bits_retain(value)),
            _ => {}
        }
    }

    fn write_ctrl(&mut self, bank: usize, value: Ctrl) {
        let efc = &mut self.efc[bank];
        if !value.contains(Ctrl::USD_UNLOCK) {
            efc.usd_unlocked = false;
        }
        if value.contains(Ctrl::LOCK) {
            efc.locked = true;
            efc.mode = Ctrl::empty();
            return;
        }
        if efc.locked {
            return;
        }
        efc.mode = value
            & (Ctrl::PRGM | Ctrl::PGERS | Ctrl::BANKERS | Ctrl::USD_PRGM | Ctrl::USD_ERS);
        if value.contains(Ctrl::RSTR) {
            self.start_erase(bank);
        }
    }

    fn start_erase(&mut self, bank: usize) {
        let mode = self.efc[bank].mode;
        let sector = self.config.sector_size();

        let target = if mode.contains(Ctrl::BANKERS) {
            Some((false, self.bank_range(bank)))
        } else if mode.contains(Ctrl::PGERS) {
            match self.region(self.efc[bank].addr, 1) {
                Some(Region::Main { offset, bank: owner }) if owner == bank => {
                    let start = offset - offset % sector;
                    Some((false, start..(start + sector).min(self.flash.len())))
                }
                _ => None,
            }
        } else if mode.contains(Ctrl::USD_ERS) && bank == 0 && self.efc[0].usd_unlocked {
            Some((true, 0..self.user.len()))
        } else {
            None
        };

        let protected = self.config.write_protected;
        let busy = self.config.busy_cycles;
        let efc = &mut self.efc[bank];
        match target {
            Some(_) if protected => efc.status |= Sts::EPP_ERR,
            Some((user, range)) => {
                trace!("EFC{}: erasing {:?}", bank, range);
                let memory = if user { &mut self.user } else { &mut self.flash };
                memory[range].fill(0xFF);
            }
            None => trace!("EFC{}: erase start ignored", bank),
        }
        efc.status |= Sts::PRCDN;
        efc.busy = busy;
    }

    /// Program one unit into flash; only erased bytes may be programmed
    fn program(&mut self, addr: u32, data: &[u8]) -> TransportResult<()> {
        let (bank, memory, offset) = match self.region(addr, data.len()) {
            Some(Region::Main { offset, bank }) => {
                let efc = &self.efc[bank];
                if efc.locked || !efc.mode.contains(Ctrl::PRGM) {
                    return Err(TransportError::Fault { addr });
                }
                (bank, &mut self.flash, offset)
            }
            Some(Region::User { offset }) => {
                let efc = &self.efc[0];
                if !efc.usd_unlocked || !efc.mode.contains(Ctrl::USD_PRGM) {
                    return Err(TransportError::Fault { addr });
                }
                if data.len() != 2 {
                    return Err(TransportError::Unaligned { addr });
                }
                (0, &mut self.user, offset)
            }
            None => return Err(TransportError::Fault { addr }),
        };

        let efc = &mut self.efc[bank];
        let cells = &mut memory[offset..offset + data.len()];
        if self.config.write_protected {
            efc.status |= Sts::EPP_ERR;
        } else if cells.iter().any(|&b| b != 0xFF) {
            efc.status |= Sts::PRGM_ERR;
        } else {
            cells.copy_from_slice(data);
        }
        efc.status |= Sts::PRCDN;
        efc.busy = self.config.busy_cycles;
        Ok(())
    }

    fn write_le(&mut self, addr: u32, value: u32, len: u32) -> TransportResult<()> {
        if addr % len != 0 {
            return Err(TransportError::Unaligned { addr });
        }
        if len == 4 {
            if let Some((bank, offset)) = Self::efc_register(addr) {
                self.write_reg(bank, offset, value);
                return Ok(());
            }
        }
        let bytes = value.to_le_bytes();
        self.program(addr, &bytes[..len as usize])
    }
}

impl MemoryTransport for DummyTarget {
    fn read_u8(&mut self, addr: u32) -> TransportResult<u8> {
        self.read_le(addr, 1).map(|v| v as u8)
    }

    fn read_u16(&mut self, addr: u32) -> TransportResult<u16> {
        self.read_le(addr, 2).map(|v| v as u16)
    }

    fn read_u32(&mut self, addr: u32) -> TransportResult<u32> {
        self.read_le(addr, 4)
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> TransportResult<()> {
        self.write_le(addr, u32::from(value), 1)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> TransportResult<()> {
        self.write_le(addr, u32::from(value), 2)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> TransportResult<()> {
        self.write_le(addr, value, 4)
    }

    fn write_block(&mut self, addr: u32, data: &[u8]) -> TransportResult<()> {
        if data.len() == 4 {
            let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
            return self.write_u32(addr, word);
        }
        self.program(addr, data)
    }

    fn is_halted(&self) -> bool {
        self.config.halted
    }

    fn is_examined(&self) -> bool {
        self.config.examined
    }

    fn delay_us(&mut self, us: u32) {
        // No real delay needed for in-memory operations
        self.elapsed_us += u64::from(us);
    }
}
