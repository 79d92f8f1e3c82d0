//! Memory transport trait
//!
//! The flash engine never talks to a debug probe directly. Every access to the
//! target goes through [`MemoryTransport`], which provides byte, halfword and
//! word access to the target's address space plus the two target state
//! predicates the flash sequences depend on.
//!
//! All calls are blocking. A transport is driven by exactly one caller at a
//! time and every call is a full round trip to the target.

use core::fmt;

/// Error reported by a memory transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The target answered the access with a bus fault
    Fault {
        /// Address of the faulting access
        addr: u32,
    },
    /// The access width is not supported at this address
    Unaligned {
        /// Address of the rejected access
        addr: u32,
    },
    /// The probe did not answer
    NoResponse,
    /// The probe or the target went away
    Disconnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault { addr } => write!(f, "bus fault at 0x{:08X}", addr),
            Self::Unaligned { addr } => write!(f, "unaligned access at 0x{:08X}", addr),
            Self::NoResponse => write!(f, "no response from probe"),
            Self::Disconnected => write!(f, "probe disconnected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Result type for transport operations
pub type TransportResult<T> = core::result::Result<T, TransportError>;

/// Access to the target's memory through a debug probe
///
/// Implementations are expected to perform each access with exactly the width
/// requested, since the flash controller reacts differently to byte, halfword
/// and word writes.
///
/// ## Example
///
/// ```ignore
/// impl MemoryTransport for SwdProbe {
///     fn read_u32(&mut self, addr: u32) -> TransportResult<u32> {
///         self.ap_read(addr, AccessSize::Word)
///     }
///     // ...
/// }
/// ```
pub trait MemoryTransport {
    /// Read one byte
    fn read_u8(&mut self, addr: u32) -> TransportResult<u8>;

    /// Read one halfword (16-bit access)
    fn read_u16(&mut self, addr: u32) -> TransportResult<u16>;

    /// Read one word (32-bit access)
    fn read_u32(&mut self, addr: u32) -> TransportResult<u32>;

    /// Write one byte
    fn write_u8(&mut self, addr: u32, value: u8) -> TransportResult<()>;

    /// Write one halfword (16-bit access)
    fn write_u16(&mut self, addr: u32, value: u16) -> TransportResult<()>;

    /// Write one word (32-bit access)
    fn write_u32(&mut self, addr: u32, value: u32) -> TransportResult<()>;

    /// Write a block of bytes starting at `addr`
    ///
    /// A block of exactly four bytes at a word-aligned address must reach the
    /// target as a single 32-bit access.
    fn write_block(&mut self, addr: u32, data: &[u8]) -> TransportResult<()>;

    /// Whether the target core is halted
    fn is_halted(&self) -> bool;

    /// Whether the target has been examined by the debugger
    fn is_examined(&self) -> bool;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: MemoryTransport + ?Sized> MemoryTransport for alloc::boxed::Box<T> {
    fn read_u8(&mut self, addr: u32) -> TransportResult<u8> {
        (**self).read_u8(addr)
    }

    fn read_u16(&mut self, addr: u32) -> TransportResult<u16> {
        (**self).read_u16(addr)
    }

    fn read_u32(&mut self, addr: u32) -> TransportResult<u32> {
        (**self).read_u32(addr)
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> TransportResult<()> {
        (**self).write_u8(addr, value)
    }

    fn write_u16(&mut self, addr: u32, value: u16) -> TransportResult<()> {
        (**self).write_u16(addr, value)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> TransportResult<()> {
        (**self).write_u32(addr, value)
    }

    fn write_block(&mut self, addr: u32, data: &[u8]) -> TransportResult<()> {
        (**self).write_block(addr, data)
    }

    fn is_halted(&self) -> bool {
        (**self).is_halted()
    }

    fn is_examined(&self) -> bool {
        (**self).is_examined()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
