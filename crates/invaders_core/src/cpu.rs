pub mod alu;
pub mod cycles;
pub mod decode;
mod exec;
mod interrupts;
pub mod regs;

pub use decode::{disassemble, Instruction};
pub use regs::{Flags, RegisterPair, Registers};

use crate::error::Fault;
use decode::{Condition, Reg};

/// Bus interface for the 8080 core.
///
/// The CPU reaches memory and IO ports only through this trait, so it knows
/// nothing about the concrete board. Reads always succeed; writes may be
/// refused with a [`Fault`].
pub trait Bus {
    fn read8(&mut self, addr: u16) -> u8;
    fn write8(&mut self, addr: u16, value: u8) -> Result<(), Fault>;

    /// Read an opcode byte. Buses that restrict where code may run override
    /// this; the default is a plain read.
    fn fetch8(&mut self, addr: u16) -> Result<u8, Fault> {
        Ok(self.read8(addr))
    }

    /// Little-endian word read at `addr`, `addr + 1`.
    fn read16(&mut self, addr: u16) -> Result<u16, Fault> {
        let hi_addr = addr.checked_add(1).ok_or(Fault::wrap(addr))?;
        Ok(u16::from_le_bytes([self.read8(addr), self.read8(hi_addr)]))
    }

    /// Little-endian word write at `addr`, `addr + 1`.
    ///
    /// Either both bytes land or neither does. The default only holds for
    /// buses whose `write8` never refuses; others must override it.
    fn write16(&mut self, addr: u16, value: u16) -> Result<(), Fault> {
        let hi_addr = addr.checked_add(1).ok_or(Fault::wrap(addr))?;
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo)?;
        self.write8(hi_addr, hi)
    }

    fn io_read(&mut self, port: u8) -> u8;
    fn io_write(&mut self, port: u8, value: u8);
}

/// Intel 8080 core: register file, interrupt enable flip-flop and halt
/// state.
#[derive(Clone, Debug, Default)]
pub struct Cpu {
    pub regs: Registers,
    /// Interrupt enable flip-flop (INTE).
    pub inte: bool,
    /// Set by HLT. A halted core retires nothing further.
    pub halted: bool,
}

impl Cpu {
    /// Create a new CPU instance in reset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fetch, decode and execute one instruction, returning its cost in
    /// clock states.
    ///
    /// A halted core returns `Ok(0)` without touching the bus.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, Fault> {
        if self.halted {
            return Ok(0);
        }

        let addr = self.regs.pc;
        let opcode = bus.fetch8(addr)?;
        self.advance_pc()?;

        let Some(instr) = Instruction::decode(opcode) else {
            return Err(Fault::Decode { opcode, addr });
        };

        if log::log_enabled!(log::Level::Trace) {
            self.trace(bus, addr, opcode);
        }

        let taken = self.execute(bus, instr)?;
        cycles::cost(opcode, taken)
    }

    /// Log the instruction about to run with the register file before it.
    fn trace<B: Bus>(&self, bus: &mut B, addr: u16, opcode: u8) {
        let next = self.regs.pc;
        let bytes = [opcode, bus.read8(next), bus.read8(next.wrapping_add(1))];
        let Some((line, _)) = disassemble(&bytes, addr) else {
            return;
        };
        let r = &self.regs;
        log::trace!(
            "{line:<28} A={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} F={:08b}",
            r.a,
            r.bc.get16(),
            r.de.get16(),
            r.hl.get16(),
            r.sp,
            r.flags.to_byte(),
        );
    }

    #[inline]
    fn advance_pc(&mut self) -> Result<(), Fault> {
        self.regs.pc = self
            .regs
            .pc
            .checked_add(1)
            .ok_or(Fault::wrap(self.regs.pc))?;
        Ok(())
    }

    /// Read the operand byte at PC and step past it.
    fn fetch8<B: Bus>(&mut self, bus: &mut B) -> Result<u8, Fault> {
        let value = bus.read8(self.regs.pc);
        self.advance_pc()?;
        Ok(value)
    }

    /// Read a little-endian operand word at PC and step past it.
    fn fetch16<B: Bus>(&mut self, bus: &mut B) -> Result<u16, Fault> {
        let lo = self.fetch8(bus)?;
        let hi = self.fetch8(bus)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Push a word: high byte at SP-1, low byte at SP-2. A refused push
    /// leaves memory and SP untouched.
    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) -> Result<(), Fault> {
        let sp = self.regs.sp;
        let new_sp = sp.checked_sub(2).ok_or(Fault::wrap(sp))?;
        bus.write16(new_sp, value)?;
        self.regs.sp = new_sp;
        Ok(())
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> Result<u16, Fault> {
        let sp = self.regs.sp;
        let new_sp = sp.checked_add(2).ok_or(Fault::wrap(sp))?;
        let value = bus.read16(sp)?;
        self.regs.sp = new_sp;
        Ok(value)
    }

    /// Read an 8-bit operand named by the 3-bit register field.
    fn read_reg<B: Bus>(&mut self, bus: &mut B, reg: Reg) -> u8 {
        let r = &self.regs;
        match reg {
            Reg::B => r.b(),
            Reg::C => r.c(),
            Reg::D => r.d(),
            Reg::E => r.e(),
            Reg::H => r.h(),
            Reg::L => r.l(),
            Reg::M => bus.read8(r.hl.get16()),
            Reg::A => r.a,
        }
    }

    fn write_reg<B: Bus>(&mut self, bus: &mut B, reg: Reg, value: u8) -> Result<(), Fault> {
        let r = &mut self.regs;
        match reg {
            Reg::B => r.set_b(value),
            Reg::C => r.set_c(value),
            Reg::D => r.set_d(value),
            Reg::E => r.set_e(value),
            Reg::H => r.set_h(value),
            Reg::L => r.set_l(value),
            Reg::M => bus.write8(r.hl.get16(), value)?,
            Reg::A => r.a = value,
        }
        Ok(())
    }

    fn condition(&self, cond: Condition) -> bool {
        let f = self.regs.flags;
        match cond {
            Condition::NotZero => !f.contains(Flags::ZERO),
            Condition::Zero => f.contains(Flags::ZERO),
            Condition::NoCarry => !f.contains(Flags::CARRY),
            Condition::Carry => f.contains(Flags::CARRY),
            Condition::ParityOdd => !f.contains(Flags::PARITY),
            Condition::ParityEven => f.contains(Flags::PARITY),
            Condition::Plus => !f.contains(Flags::SIGN),
            Condition::Minus => f.contains(Flags::SIGN),
        }
    }
}
