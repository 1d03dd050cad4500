use super::{Bus, Cpu};
use crate::error::Fault;

impl Cpu {
    #[inline]
    pub fn interrupts_enabled(&self) -> bool {
        self.inte
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Request a maskable interrupt on RST `vector`.
    ///
    /// Accepted only when INTE is set and the core is not halted; acceptance
    /// clears INTE and behaves like `RST vector`. A refused request is
    /// dropped, there is no pending latch. Returns whether it was accepted.
    ///
    /// `vector` is masked to 0..=7. If the push faults, INTE stays set.
    pub fn interrupt<B: Bus>(&mut self, bus: &mut B, vector: u8) -> Result<bool, Fault> {
        if !self.inte || self.halted {
            log::trace!(
                "interrupt RST {} dropped (inte={}, halted={})",
                vector & 0x07,
                self.inte,
                self.halted
            );
            return Ok(false);
        }

        let from = self.regs.pc;
        self.restart(bus, vector)?;
        self.inte = false;
        log::trace!("interrupt RST {} accepted at {from:04X}", vector & 0x07);
        Ok(true)
    }
}
