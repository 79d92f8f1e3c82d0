//! Flash bank operations
//!
//! A [`FlashBank`] describes one flash region of the target (main bank 1,
//! main bank 2, or the user system data area). Probing a bank reads the chip
//! identity and fills in its geometry; erase and write operations then drive
//! the EFC through the unlock, operate, check and lock sequence.
//!
//! All operations take the target transport as a parameter, so several banks
//! can share one probe connection.

mod bank;
mod efc;
mod erase;
mod identity;
pub mod regs;
mod write;

#[cfg(test)]
pub(crate) mod mock;

pub use bank::{
    resolve_sector_size, BankConfig, BankKind, EfcTimeouts, ErasedState, FlashBank,
    ProtectedState, Sector,
};
pub use efc::Efc;
pub use identity::{read_unique_id, RuntimeIdentity};
