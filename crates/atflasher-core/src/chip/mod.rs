//! Device catalog
//!
//! This module maps the identifier read from the debug MCU device ID register
//! to the part number and flash parameters of known Artery parts.

mod database;
mod types;

pub use database::{lookup, search, KNOWN_DEVICES};
pub use types::DeviceRecord;
