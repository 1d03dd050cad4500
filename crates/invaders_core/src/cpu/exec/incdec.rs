use crate::cpu::alu;
use crate::cpu::decode::{Pair, Reg};
use crate::cpu::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    pub(super) fn exec_inr<B: Bus>(&mut self, bus: &mut B, reg: Reg) -> Result<(), Fault> {
        let value = self.read_reg(bus, reg);
        let result = alu::inr(&mut self.regs.flags, value);
        self.write_reg(bus, reg, result)
    }

    pub(super) fn exec_dcr<B: Bus>(&mut self, bus: &mut B, reg: Reg) -> Result<(), Fault> {
        let value = self.read_reg(bus, reg);
        let result = alu::dcr(&mut self.regs.flags, value);
        self.write_reg(bus, reg, result)
    }

    // INX/DCX are plain 16-bit counters: no flags, and SP wraps silently.

    pub(super) fn exec_inx(&mut self, pair: Pair) {
        let value = self.pair(pair).wrapping_add(1);
        self.set_pair(pair, value);
    }

    pub(super) fn exec_dcx(&mut self, pair: Pair) {
        let value = self.pair(pair).wrapping_sub(1);
        self.set_pair(pair, value);
    }
}
