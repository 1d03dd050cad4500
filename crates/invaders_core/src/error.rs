use std::fmt;

use thiserror::Error;

/// Why a memory access was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryFaultKind {
    /// A write whose mirror-resolved target lies in the ROM region.
    RomWrite,
    /// A word access, fetch, push or pop that would step past 0xFFFF (or
    /// below 0x0000 for the stack).
    AddressWrap,
    /// An opcode fetch outside the loaded ROM image (strict fetch mode only).
    FetchOutsideRom,
}

impl fmt::Display for MemoryFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MemoryFaultKind::RomWrite => "write to ROM",
            MemoryFaultKind::AddressWrap => "address wraps the 16-bit space",
            MemoryFaultKind::FetchOutsideRom => "opcode fetch outside ROM",
        };
        f.write_str(text)
    }
}

/// Unrecoverable conditions raised while executing guest code.
///
/// Each variant stops the current run. HLT is not a fault; it is reported
/// through [`crate::machine::ExecOutcome::Halted`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Fault {
    #[error("invalid opcode 0x{opcode:02X} at 0x{addr:04X}")]
    Decode { opcode: u8, addr: u16 },

    #[error("memory fault at 0x{addr:04X}: {kind}")]
    Memory { addr: u16, kind: MemoryFaultKind },

    #[error("cycle accounting fault: opcode 0x{opcode:02X} cost {cycles} out of range")]
    CycleAccounting { opcode: u8, cycles: u32 },
}

impl Fault {
    pub(crate) fn rom_write(addr: u16) -> Self {
        Fault::Memory {
            addr,
            kind: MemoryFaultKind::RomWrite,
        }
    }

    pub(crate) fn wrap(addr: u16) -> Self {
        Fault::Memory {
            addr,
            kind: MemoryFaultKind::AddressWrap,
        }
    }
}

/// Errors raised while building a machine from a ROM image.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LoadError {
    #[error("ROM image is empty")]
    EmptyRom,

    #[error("ROM image is {len} bytes, at most {max} fit the ROM region")]
    RomTooLarge { len: usize, max: usize },
}
