use crate::cpu::decode::StackPair;
use crate::cpu::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    pub(super) fn exec_push<B: Bus>(&mut self, bus: &mut B, pair: StackPair) -> Result<(), Fault> {
        let value = match pair {
            StackPair::BC => self.regs.bc.get16(),
            StackPair::DE => self.regs.de.get16(),
            StackPair::HL => self.regs.hl.get16(),
            StackPair::PSW => self.regs.psw(),
        };
        self.push(bus, value)
    }

    pub(super) fn exec_pop<B: Bus>(&mut self, bus: &mut B, pair: StackPair) -> Result<(), Fault> {
        let value = self.pop(bus)?;
        match pair {
            StackPair::BC => self.regs.bc.set16(value),
            StackPair::DE => self.regs.de.set16(value),
            StackPair::HL => self.regs.hl.set16(value),
            StackPair::PSW => self.regs.set_psw(value),
        }
        Ok(())
    }

    /// XTHL: swap HL with the word at SP. SP itself does not move.
    pub(super) fn exec_xthl<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let sp = self.regs.sp;
        let top = bus.read16(sp)?;
        let hl = self.regs.hl.get16();
        bus.write16(sp, hl)?;
        self.regs.hl.set16(top);
        Ok(())
    }
}
