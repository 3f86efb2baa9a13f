// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for vipcore
//!
//! Everything in here is recoverable at the boundary of the [CPU](crate::cpu::CPU):
//! the driving loop decides whether to halt, reset, or carry on.

use std::ops::Range;
use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for vipcore.
#[derive(Debug, Error)]
pub enum Error {
    /// Represents a breakpoint being hit
    #[error("breakpoint hit: {addr:03x} ({next:04x})")]
    BreakpointHit {
        /// The address of the breakpoint
        addr: u16,
        /// The instruction at the breakpoint
        next: u16,
    },
    /// Tried to access a single byte outside of memory
    #[error("address {addr:04x} is outside of memory")]
    InvalidAddress {
        /// The offending address
        addr: usize,
    },
    /// Tried to access a range of bytes which is not entirely inside memory
    #[error("range {range:04x?} is outside of memory")]
    InvalidAddressRange {
        /// The offending range
        range: Range<usize>,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Tried to test a key that doesn't exist
    #[error("tried to read key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Called a subroutine with every stack slot in use
    #[error("stack overflow calling from {addr:03x}")]
    StackOverflow {
        /// Address of the call which did not fit
        addr: u16,
    },
    /// Returned from a subroutine with nothing on the stack
    #[error("stack underflow")]
    StackUnderflow,
    /// The program does not fit in program memory
    #[error("program is {len} bytes, but only {max} fit in program memory")]
    ProgramTooLarge {
        /// Length of the rejected program
        len: usize,
        /// Size of program memory
        max: usize,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Error originated in [std::array::TryFromSliceError]
    #[error(transparent)]
    TryFromSliceError(#[from] std::array::TryFromSliceError),
}
