//! Error types for atflasher-core
//!
//! This module provides a no_std compatible error type that is used
//! throughout the crate.

use core::fmt;

use crate::transport::TransportError;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The memory transport failed; passed through unchanged
    Transport(TransportError),

    // Target state
    /// The debugger has not examined the target yet
    TargetNotExamined,
    /// The operation requires a halted target
    TargetNotHalted,

    // Controller errors
    /// Key sequence was written but the controller stayed locked
    UnlockFailed,
    /// The busy flag did not clear within the polling budget
    Timeout,
    /// The controller refused an erase or program of a protected area
    ProtectionViolation,
    /// Programming targeted an address that was not erased
    ProgramError,

    // Bank and argument errors
    /// Bank base address does not match any flash region of the family
    UnsupportedBank {
        /// The configured base address
        base: u32,
    },
    /// The operation is not available on this bank
    InvalidBank,
    /// Sector range is empty or extends past the sector table
    SectorOutOfRange {
        /// First sector requested
        first: u32,
        /// Last sector requested (inclusive)
        last: u32,
        /// Number of sectors in the bank
        count: u32,
    },
    /// Offset and length extend past the end of the bank
    OutOfBounds,
    /// Offset or length does not meet the bank's write alignment
    UnalignedAccess,
    /// The flash size register holds no usable value
    FlashSizeUnreadable,
    /// Malformed command or bank configuration
    CommandSyntax,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::TargetNotExamined => write!(f, "target not examined yet"),
            Self::TargetNotHalted => write!(f, "target not halted"),
            Self::UnlockFailed => write!(f, "flash controller did not unlock"),
            Self::Timeout => write!(f, "timed out waiting for flash"),
            Self::ProtectionViolation => write!(f, "device or sector is protected"),
            Self::ProgramError => write!(f, "programmed address was not erased"),
            Self::UnsupportedBank { base } => {
                write!(f, "unsupported bank base address 0x{:08X}", base)
            }
            Self::InvalidBank => write!(f, "operation not supported on this bank"),
            Self::SectorOutOfRange { first, last, count } => write!(
                f,
                "sector range {}..={} is invalid for a bank of {} sectors",
                first, last, count
            ),
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::UnalignedAccess => write!(f, "offset or length not aligned"),
            Self::FlashSizeUnreadable => write!(f, "cannot read flash size"),
            Self::CommandSyntax => write!(f, "command syntax error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
