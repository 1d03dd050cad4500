use crate::cpu::decode::{Pair, Reg};
use crate::cpu::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    pub(super) fn exec_mov<B: Bus>(&mut self, bus: &mut B, dst: Reg, src: Reg) -> Result<(), Fault> {
        let value = self.read_reg(bus, src);
        self.write_reg(bus, dst, value)
    }

    pub(super) fn exec_mvi<B: Bus>(&mut self, bus: &mut B, reg: Reg) -> Result<(), Fault> {
        let value = self.fetch8(bus)?;
        self.write_reg(bus, reg, value)
    }

    pub(super) fn exec_lxi<B: Bus>(&mut self, bus: &mut B, pair: Pair) -> Result<(), Fault> {
        let value = self.fetch16(bus)?;
        self.set_pair(pair, value);
        Ok(())
    }

    pub(super) fn exec_lda<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let addr = self.fetch16(bus)?;
        self.regs.a = bus.read8(addr);
        Ok(())
    }

    pub(super) fn exec_sta<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let addr = self.fetch16(bus)?;
        bus.write8(addr, self.regs.a)
    }

    pub(super) fn exec_lhld<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let addr = self.fetch16(bus)?;
        let value = bus.read16(addr)?;
        self.regs.hl.set16(value);
        Ok(())
    }

    pub(super) fn exec_shld<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let addr = self.fetch16(bus)?;
        let value = self.regs.hl.get16();
        bus.write16(addr, value)
    }

    /// LDAX B/D. The decoder only hands out BC and DE.
    pub(super) fn exec_ldax<B: Bus>(&mut self, bus: &mut B, pair: Pair) {
        debug_assert!(matches!(pair, Pair::BC | Pair::DE));
        let addr = self.pair(pair);
        self.regs.a = bus.read8(addr);
    }

    pub(super) fn exec_stax<B: Bus>(&mut self, bus: &mut B, pair: Pair) -> Result<(), Fault> {
        debug_assert!(matches!(pair, Pair::BC | Pair::DE));
        let addr = self.pair(pair);
        bus.write8(addr, self.regs.a)
    }

    pub(super) fn exec_xchg(&mut self) {
        std::mem::swap(&mut self.regs.de, &mut self.regs.hl);
    }
}
