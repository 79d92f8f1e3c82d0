//! AT32 flash controller register definitions
//!
//! Fixed target addresses and the EFC register layout. The controller has
//! one register block per main bank; the second block sits 0x40 above the
//! first and serves bank 2 of the dual-bank parts. The user system data area
//! is driven from the first block.

use bitflags::bitflags;

// ============================================================================
// Fixed target addresses
// ============================================================================

/// Debug MCU device ID register (32 bits)
pub const DEVICE_ID_ADDR: u32 = 0xE004_2000;
/// Flash size in KiB (16 bits)
pub const FLASH_SIZE_ADDR: u32 = 0x1FFF_F7E0;
/// 96-bit unique device ID
pub const UNIQUE_ID_ADDR: u32 = 0x1FFF_F7E8;
/// Mask revision byte
pub const MASK_VERSION_ADDR: u32 = 0x1FFF_F7F1;

/// Main flash, bank 1
pub const FLASH_BASE: u32 = 0x0800_0000;
/// Bank 2 on 4032 KiB parts
pub const FLASH_BANK2_BASE_4032K: u32 = 0x0820_0000;
/// Bank 2 on 1024 KiB parts
pub const FLASH_BANK2_BASE_1024K: u32 = 0x0808_0000;
/// User system data (option byte) area
pub const USD_BASE: u32 = 0x1FFF_C000;

/// EFC register block for bank 1 and the user system data area
pub const EFC_BASE: u32 = 0x4002_3C00;
/// EFC register block for bank 2
pub const EFC_BANK2_BASE: u32 = EFC_BASE + 0x40;

// ============================================================================
// Register offsets (relative to the bank's register block)
// ============================================================================

/// Flash unlock key register
pub const EFC_FCKEY: u32 = 0x04;
/// User system data unlock register
pub const EFC_USD_UNLOCK: u32 = 0x08;
/// Status register
pub const EFC_STS: u32 = 0x0C;
/// Control register
pub const EFC_CTRL: u32 = 0x10;
/// Address register for sector erase
pub const EFC_ADDR: u32 = 0x14;

/// First unlock key
pub const EFC_KEY1: u32 = 0x4567_0123;
/// Second unlock key
pub const EFC_KEY2: u32 = 0xCDEF_89AB;

bitflags! {
    /// EFC control register (CTRL) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Ctrl: u32 {
        /// Main flash program mode
        const PRGM       = 1 << 0;
        /// Sector (page) erase mode
        const PGERS      = 1 << 1;
        /// Bank erase mode
        const BANKERS    = 1 << 2;
        /// User system data program mode
        const USD_PRGM   = 1 << 4;
        /// User system data erase mode
        const USD_ERS    = 1 << 5;
        /// Start erase
        const RSTR       = 1 << 6;
        /// Controller locked
        const LOCK       = 1 << 7;
        /// User system data unlocked
        const USD_UNLOCK = 1 << 9;
    }
}

bitflags! {
    /// EFC status register (STS) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sts: u32 {
        /// Operation in progress
        const BUSY     = 1 << 0;
        /// Programming targeted a location that was not erased
        const PRGM_ERR = 1 << 2;
        /// Erase/program protection error
        const EPP_ERR  = 1 << 4;
        /// Operation done
        const PRCDN    = 1 << 5;

        /// Flags cleared before every erase and program sequence
        const CLEAR = Self::PRCDN.bits() | Self::PRGM_ERR.bits() | Self::EPP_ERR.bits();
    }
}
