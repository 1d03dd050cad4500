use crate::cpu::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    pub(super) fn exec_hlt(&mut self) {
        log::debug!("HLT at {:04X}", self.regs.pc.wrapping_sub(1));
        self.halted = true;
    }

    pub(super) fn exec_in<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let port = self.fetch8(bus)?;
        self.regs.a = bus.io_read(port);
        Ok(())
    }

    pub(super) fn exec_out<B: Bus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let port = self.fetch8(bus)?;
        bus.io_write(port, self.regs.a);
        Ok(())
    }
}
