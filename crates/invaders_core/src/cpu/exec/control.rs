use crate::cpu::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    /// JMP / Jcc. The operand is consumed whether or not the jump is taken.
    pub(super) fn exec_jmp<B: Bus>(&mut self, bus: &mut B, taken: bool) -> Result<(), Fault> {
        let target = self.fetch16(bus)?;
        if taken {
            self.regs.pc = target;
        }
        Ok(())
    }

    /// CALL / Ccc. Returns `taken` so the caller can pick the cost.
    pub(super) fn exec_call<B: Bus>(&mut self, bus: &mut B, taken: bool) -> Result<bool, Fault> {
        let target = self.fetch16(bus)?;
        if taken {
            self.push(bus, self.regs.pc)?;
            self.regs.pc = target;
        }
        Ok(taken)
    }

    pub(super) fn exec_ret<B: Bus>(&mut self, bus: &mut B, taken: bool) -> Result<bool, Fault> {
        if taken {
            self.regs.pc = self.pop(bus)?;
        }
        Ok(taken)
    }

    /// RST n: push PC and continue at `8 * n`. Interrupt acceptance goes
    /// through here as well.
    pub(in crate::cpu) fn restart<B: Bus>(&mut self, bus: &mut B, n: u8) -> Result<(), Fault> {
        self.push(bus, self.regs.pc)?;
        self.regs.pc = u16::from(n & 0x07) * 8;
        Ok(())
    }
}
