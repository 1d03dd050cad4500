mod alu;
mod control;
mod incdec;
mod ld;
mod stack;
mod system;

use super::decode::{Instruction, Pair};
use super::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    /// Execute one decoded instruction.
    ///
    /// Returns whether a conditional CALL/RET took its branch; every other
    /// instruction reports `true`. The caller turns that into a cycle cost.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, instr: Instruction) -> Result<bool, Fault> {
        use Instruction::*;

        match instr {
            Nop => {}
            Hlt => self.exec_hlt(),

            // Data transfer
            Mov { dst, src } => self.exec_mov(bus, dst, src)?,
            Mvi(reg) => self.exec_mvi(bus, reg)?,
            Lxi(pair) => self.exec_lxi(bus, pair)?,
            Lda => self.exec_lda(bus)?,
            Sta => self.exec_sta(bus)?,
            Lhld => self.exec_lhld(bus)?,
            Shld => self.exec_shld(bus)?,
            Ldax(pair) => self.exec_ldax(bus, pair),
            Stax(pair) => self.exec_stax(bus, pair)?,
            Xchg => self.exec_xchg(),

            // Arithmetic and logic
            Alu(op, reg) => {
                let value = self.read_reg(bus, reg);
                self.exec_alu(op, value);
            }
            AluImm(op) => {
                let value = self.fetch8(bus)?;
                self.exec_alu(op, value);
            }
            Daa => self.exec_daa(),
            Dad(pair) => self.exec_dad(pair),
            Rlc | Rrc | Ral | Rar => self.exec_rotate(instr),
            Cma => self.regs.a = !self.regs.a,
            Stc => self.regs.flags.insert(super::Flags::CARRY),
            Cmc => self.regs.flags.toggle(super::Flags::CARRY),

            // Increment and decrement
            Inr(reg) => self.exec_inr(bus, reg)?,
            Dcr(reg) => self.exec_dcr(bus, reg)?,
            Inx(pair) => self.exec_inx(pair),
            Dcx(pair) => self.exec_dcx(pair),

            // Branching
            Jmp => self.exec_jmp(bus, true)?,
            Jcc(cond) => {
                let taken = self.condition(cond);
                self.exec_jmp(bus, taken)?;
            }
            Call => return self.exec_call(bus, true),
            Ccc(cond) => {
                let taken = self.condition(cond);
                return self.exec_call(bus, taken);
            }
            Ret => return self.exec_ret(bus, true),
            Rcc(cond) => {
                let taken = self.condition(cond);
                return self.exec_ret(bus, taken);
            }
            Rst(n) => self.restart(bus, n)?,
            Pchl => self.regs.pc = self.regs.hl.get16(),

            // Stack
            Push(pair) => self.exec_push(bus, pair)?,
            Pop(pair) => self.exec_pop(bus, pair)?,
            Xthl => self.exec_xthl(bus)?,
            Sphl => self.regs.sp = self.regs.hl.get16(),

            // Machine control
            In => self.exec_in(bus)?,
            Out => self.exec_out(bus)?,
            Ei => self.inte = true,
            Di => self.inte = false,
        }

        Ok(true)
    }

    #[inline]
    fn pair(&self, pair: Pair) -> u16 {
        match pair {
            Pair::BC => self.regs.bc.get16(),
            Pair::DE => self.regs.de.get16(),
            Pair::HL => self.regs.hl.get16(),
            Pair::SP => self.regs.sp,
        }
    }

    #[inline]
    fn set_pair(&mut self, pair: Pair, value: u16) {
        match pair {
            Pair::BC => self.regs.bc.set16(value),
            Pair::DE => self.regs.de.set16(value),
            Pair::HL => self.regs.hl.set16(value),
            Pair::SP => self.regs.sp = value,
        }
    }
}
