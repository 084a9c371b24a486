//! Execution-time faults raised by the datapath and control unit.
//!
//! Every fault is fatal: the control unit aborts the run loop and the
//! simulator driver reports it to the caller. There is no recovery path —
//! `original_source/machine.py` relies on unchecked Python operations
//! (`assert`, dict access, bare `/`) for the same situations, which would
//! raise uncaught exceptions; this repository makes each of those failure
//! modes an explicit, typed variant instead.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Fault {
    /// A data-stack or return-stack operation (`pop`, `swap`, `ret`, a binary
    /// ALU op) was attempted with too few items on the stack.
    StackUnderflow,
    /// An address fell outside the allocated range of the memory it was
    /// addressed against.
    OutOfRangeMemory { address: usize },
    /// A cell was allocated but never written before being read.
    UninitializedRead { address: usize },
    /// `div` or `mod` was attempted with a zero divisor.
    DivideByZero,
    /// A write targeted address 0 (`INPUT`, read-only).
    ForbiddenWrite { address: usize },
    /// A read targeted address 1 (`OUTPUT`, write-only).
    ForbiddenRead { address: usize },
    /// `INPUT` was read after the input buffer was exhausted.
    InputExhausted,
    /// An opcode string in the object file did not match the catalogue.
    UnknownOpcode(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StackUnderflow => write!(f, "stack underflow"),
            Fault::OutOfRangeMemory { address } => {
                write!(f, "memory access out of range: {}", address)
            }
            Fault::UninitializedRead { address } => {
                write!(f, "read of uninitialized cell at address {}", address)
            }
            Fault::DivideByZero => write!(f, "division or modulo by zero"),
            Fault::ForbiddenWrite { address } => {
                write!(f, "forbidden write to address {} (INPUT)", address)
            }
            Fault::ForbiddenRead { address } => {
                write!(f, "forbidden read from address {} (OUTPUT)", address)
            }
            Fault::InputExhausted => write!(f, "read from INPUT after input was exhausted"),
            Fault::UnknownOpcode(name) => write!(f, "unknown opcode \"{}\"", name),
        }
    }
}

impl std::error::Error for Fault {}
