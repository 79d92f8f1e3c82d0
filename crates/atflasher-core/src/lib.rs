//! atflasher-core - Core library for Artery AT32 flash programming
//!
//! This crate drives the embedded flash controller (EFC) of Artery AT32
//! microcontrollers through a debug probe's memory interface. It knows how to
//! identify the chip, work out the bank geometry, unlock the controller, and
//! erase and program the main banks and the user system data (option byte)
//! area. It is `no_std` compatible and only needs `alloc` for the sector
//! table.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the error types
//!
//! # Example
//!
//! ```ignore
//! use atflasher_core::flash::{BankConfig, FlashBank};
//! use atflasher_core::transport::MemoryTransport;
//!
//! fn erase_all<T: MemoryTransport>(target: &mut T) -> atflasher_core::Result<()> {
//!     let mut bank = FlashBank::new(BankConfig::main_bank());
//!     bank.probe(target)?;
//!     println!("{} sectors of {} bytes", bank.sector_count(), bank.sector_size());
//!     bank.mass_erase(target)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod transport;

pub use error::{Error, Result};
