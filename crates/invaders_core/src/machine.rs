use typed_builder::TypedBuilder;

use crate::cpu::{Bus, Cpu};
use crate::error::{Fault, LoadError, MemoryFaultKind};
use crate::io::{DipConfig, InputLine, IoPorts};
use crate::memory::MemoryImage;

/// 8080 clock and frame timing for Space Invaders.
pub const CPU_CLOCK_HZ: u32 = 2_000_000;
/// Cycles from the start of a frame to the vblank-start interrupt (RST 1).
pub const CYCLES_BEFORE_VBLANK: u32 = 28_527;
/// Cycles from vblank start to the end-of-frame interrupt (RST 2).
pub const CYCLES_AFTER_VBLANK: u32 = 4_839;
pub const CYCLES_PER_FRAME: u32 = CYCLES_BEFORE_VBLANK + CYCLES_AFTER_VBLANK;
/// Wall-clock length of one frame at 59.94 Hz.
pub const NS_PER_FRAME: u64 = 16_683_350;

/// RST vector raised at vblank start.
pub const VBLANK_START_VECTOR: u8 = 1;
/// RST vector raised at the end of the frame.
pub const VBLANK_END_VECTOR: u8 = 2;

/// Construction options for [`Machine`].
#[derive(Clone, Copy, Debug, TypedBuilder)]
pub struct MachineConfig {
    /// Byte RAM is filled with at power-on and on reset.
    #[builder(default = 0x00)]
    pub ram_fill: u8,
    /// Treat an opcode fetch beyond the loaded ROM image as a memory fault.
    #[builder(default = false)]
    pub strict_fetch: bool,
    #[builder(default)]
    pub dip: DipConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How a call to [`Machine::execute`] ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecOutcome {
    /// The budget was reached; carries the cycles consumed (may overshoot).
    BudgetMet(u32),
    /// HLT retired (or the machine was already halted).
    Halted(u32),
}

impl ExecOutcome {
    pub fn cycles(self) -> u32 {
        match self {
            ExecOutcome::BudgetMet(c) | ExecOutcome::Halted(c) => c,
        }
    }

    pub fn is_halted(self) -> bool {
        matches!(self, ExecOutcome::Halted(_))
    }
}

/// Result of one [`Machine::run_frame`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameOutcome {
    pub cycles: u32,
    pub halted: bool,
}

/// Memory and IO as seen from the CPU.
#[derive(Debug)]
struct SystemBus {
    memory: MemoryImage,
    io: IoPorts,
    strict_fetch: bool,
}

impl Bus for SystemBus {
    fn read8(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    fn write8(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        self.memory.write(addr, value)
    }

    fn read16(&mut self, addr: u16) -> Result<u16, Fault> {
        self.memory.read_word(addr)
    }

    fn write16(&mut self, addr: u16, value: u16) -> Result<(), Fault> {
        self.memory.write_word(addr, value)
    }

    fn fetch8(&mut self, addr: u16) -> Result<u8, Fault> {
        if self.strict_fetch && usize::from(addr) >= self.memory.rom_len() {
            return Err(Fault::Memory {
                addr,
                kind: MemoryFaultKind::FetchOutsideRom,
            });
        }
        Ok(self.memory.read(addr))
    }

    fn io_read(&mut self, port: u8) -> u8 {
        self.io.read(port)
    }

    fn io_write(&mut self, port: u8, value: u8) {
        self.io.write(port, value);
    }
}

/// The Space Invaders board: 8080 core, memory map and IO ports.
///
/// A machine is driven in cycle-budgeted slices by [`Machine::execute`],
/// with interrupts injected between slices. [`Machine::run_frame`] bundles
/// the standard two-slice frame.
#[derive(Debug)]
pub struct Machine {
    cpu: Cpu,
    bus: SystemBus,
    total_cycles: u64,
}

impl Machine {
    pub fn new(rom: &[u8], config: MachineConfig) -> Result<Self, LoadError> {
        let memory = MemoryImage::new(rom, config.ram_fill)?;
        log::debug!(
            "machine up: {} byte ROM, ram fill 0x{:02X}, strict fetch {}, {:?}",
            rom.len(),
            config.ram_fill,
            config.strict_fetch,
            config.dip
        );

        Ok(Self {
            cpu: Cpu::new(),
            bus: SystemBus {
                memory,
                io: IoPorts::new(config.dip),
                strict_fetch: config.strict_fetch,
            },
            total_cycles: 0,
        })
    }

    /// Build a machine with the default configuration.
    pub fn from_rom(rom: &[u8]) -> Result<Self, LoadError> {
        Self::new(rom, MachineConfig::default())
    }

    /// Return to power-on state. ROM and DIP switches are kept, RAM is
    /// re-filled and inputs are released.
    pub fn reset(&mut self) {
        log::debug!("machine reset after {} cycles", self.total_cycles);
        self.cpu.reset();
        self.bus.memory.clear_ram();
        self.bus.io.reset();
        self.total_cycles = 0;
    }

    /// Run whole instructions until at least `budget` cycles have been
    /// consumed, HLT retires, or a fault stops the run.
    ///
    /// The last instruction may carry the total past `budget`; the excess is
    /// not credited to the next call.
    pub fn execute(&mut self, budget: u32) -> Result<ExecOutcome, Fault> {
        if self.cpu.is_halted() {
            return Ok(ExecOutcome::Halted(0));
        }

        let mut consumed: u32 = 0;
        while consumed < budget {
            let cycles = match self.cpu.step(&mut self.bus) {
                Ok(cycles) => cycles,
                Err(fault) => {
                    self.total_cycles += u64::from(consumed);
                    self.log_fault(&fault);
                    return Err(fault);
                }
            };
            consumed = consumed.saturating_add(cycles);

            if self.cpu.is_halted() {
                self.total_cycles += u64::from(consumed);
                log::info!("halted at {:04X}", self.cpu.regs.pc.wrapping_sub(1));
                return Ok(ExecOutcome::Halted(consumed));
            }
        }

        self.total_cycles += u64::from(consumed);
        Ok(ExecOutcome::BudgetMet(consumed))
    }

    /// Request an interrupt on RST `vector`. Returns `false` when it was
    /// dropped because interrupts are disabled or the machine is halted.
    ///
    /// Only the low three bits of `vector` are used, as on the data bus of
    /// the real part: `raise_interrupt(9)` is `RST 1`.
    pub fn raise_interrupt(&mut self, vector: u8) -> Result<bool, Fault> {
        self.cpu
            .interrupt(&mut self.bus, vector)
            .inspect_err(|fault| self.log_fault(fault))
    }

    /// Run one video frame: the pre-vblank slice, RST 1, the post-vblank
    /// slice, RST 2.
    pub fn run_frame(&mut self) -> Result<FrameOutcome, Fault> {
        let first = self.execute(CYCLES_BEFORE_VBLANK)?;
        if first.is_halted() {
            return Ok(FrameOutcome {
                cycles: first.cycles(),
                halted: true,
            });
        }
        self.raise_interrupt(VBLANK_START_VECTOR)?;

        let second = self.execute(CYCLES_AFTER_VBLANK)?;
        let cycles = first.cycles() + second.cycles();
        if second.is_halted() {
            return Ok(FrameOutcome {
                cycles,
                halted: true,
            });
        }
        self.raise_interrupt(VBLANK_END_VECTOR)?;

        Ok(FrameOutcome {
            cycles,
            halted: false,
        })
    }

    pub fn set_input(&mut self, line: InputLine, pressed: bool) {
        self.bus.io.inputs_mut().set(line, pressed);
    }

    /// Frame buffer: 0x1c00 bytes from 0x2400, 32 bytes per scan line.
    pub fn video_ram(&self) -> &[u8] {
        self.bus.memory.video_ram()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.bus.memory
    }

    pub fn io(&self) -> &IoPorts {
        &self.bus.io
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Cycles retired since construction or the last reset.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    fn log_fault(&self, fault: &Fault) {
        let r = &self.cpu.regs;
        log::error!(
            "{fault}; A={:02X} F={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} PC={:04X} INTE={}",
            r.a,
            r.flags.to_byte(),
            r.bc.get16(),
            r.de.get16(),
            r.hl.get16(),
            r.sp,
            r.pc,
            self.cpu.inte,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::PORT_SHIFT_RESULT;

    fn machine_with(program: &[u8]) -> Machine {
        let _ = env_logger::builder().is_test(true).try_init();
        Machine::from_rom(program).unwrap()
    }

    #[test]
    fn power_on_state() {
        let m = machine_with(&[0x00]);
        let regs = &m.cpu().regs;
        assert_eq!(regs.pc, 0x0000);
        assert_eq!(regs.sp, 0x2400);
        assert_eq!(regs.flags.to_byte(), 0x02);
        assert_eq!(regs.a, 0);
        assert!(!m.cpu().interrupts_enabled());
        assert_eq!(m.video_ram().len(), 0x1c00);
    }

    #[test]
    fn rom_size_is_checked() {
        assert_eq!(Machine::from_rom(&[]).unwrap_err(), LoadError::EmptyRom);
        assert_eq!(
            Machine::from_rom(&[0; 0x2001]).unwrap_err(),
            LoadError::RomTooLarge {
                len: 0x2001,
                max: 0x2000
            }
        );
    }

    #[test]
    fn ram_fill_pattern_is_applied() {
        let config = MachineConfig::builder().ram_fill(0xaa).build();
        let m = Machine::new(&[0x00], config).unwrap();
        assert!(m.memory().ram().iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn mirrored_store_reads_back_through_alias() {
        // MVI A,5Ah; STA 6100h; LDA 2100h; HLT
        let mut m = machine_with(&[0x3e, 0x5a, 0x32, 0x00, 0x61, 0x3a, 0x00, 0x21, 0x76]);
        assert!(m.execute(1_000).unwrap().is_halted());
        assert_eq!(m.cpu().regs.a, 0x5a);
        assert_eq!(m.memory().read(0x2100), 0x5a);
    }

    #[test]
    fn rom_write_faults_and_leaves_rom_intact() {
        // MVI A,FFh; STA 0001h
        let mut m = machine_with(&[0x3e, 0xff, 0x32, 0x01, 0x00]);
        assert_eq!(
            m.execute(100),
            Err(Fault::Memory {
                addr: 0x0001,
                kind: MemoryFaultKind::RomWrite
            })
        );
        assert_eq!(m.memory().read(0x0001), 0xff);
        assert_eq!(m.memory().read(0x0002), 0x32);
    }

    #[test]
    fn execute_meets_budget() {
        // JMP 0000h forever.
        let mut m = machine_with(&[0xc3, 0x00, 0x00]);
        for budget in [1, 10, 11, 100, CYCLES_BEFORE_VBLANK] {
            let outcome = m.execute(budget).unwrap();
            assert!(outcome.cycles() >= budget);
            assert!(outcome.cycles() < budget + 10);
            assert!(!outcome.is_halted());
        }
        assert_eq!(m.execute(0), Ok(ExecOutcome::BudgetMet(0)));
    }

    #[test]
    fn halt_is_terminal() {
        let mut m = machine_with(&[0x00, 0x76, 0x00]);
        assert_eq!(m.execute(1_000), Ok(ExecOutcome::Halted(11)));
        assert_eq!(m.execute(1_000), Ok(ExecOutcome::Halted(0)));
        assert_eq!(m.total_cycles(), 11);
        assert!(m.is_halted());
    }

    #[test]
    fn decode_fault_stops_the_run() {
        let mut m = machine_with(&[0x00, 0x00, 0xdd]);
        assert_eq!(
            m.execute(100),
            Err(Fault::Decode {
                opcode: 0xdd,
                addr: 0x0002
            })
        );
        assert_eq!(m.total_cycles(), 8);
    }

    #[test]
    fn strict_fetch_guards_code_outside_rom() {
        // JMP 2000h
        let program = [0xc3, 0x00, 0x20];
        let config = MachineConfig::builder().strict_fetch(true).build();
        let mut m = Machine::new(&program, config).unwrap();
        assert_eq!(
            m.execute(100),
            Err(Fault::Memory {
                addr: 0x2000,
                kind: MemoryFaultKind::FetchOutsideRom
            })
        );

        // Without the guard, RAM holds NOPs and execution carries on.
        let mut m = machine_with(&program);
        assert!(m.execute(100).is_ok());
    }

    #[test]
    fn refused_push_leaves_ram_and_sp_untouched() {
        // LXI SP,2001h; LXI B,ABCDh; PUSH B
        let mut m = machine_with(&[0x31, 0x01, 0x20, 0x01, 0xcd, 0xab, 0xc5]);
        let before = m.memory().read(0x2000);

        assert_eq!(
            m.execute(100),
            Err(Fault::Memory {
                addr: 0x1fff,
                kind: MemoryFaultKind::RomWrite
            })
        );
        assert_eq!(m.memory().read(0x2000), before);
        assert_eq!(m.cpu().regs.sp, 0x2001);
    }

    #[test]
    fn refused_call_leaves_ram_untouched() {
        // LXI SP,2001h; CALL 0000h
        let mut m = machine_with(&[0x31, 0x01, 0x20, 0xcd, 0x00, 0x00]);
        assert!(m.execute(100).is_err());
        assert_eq!(m.memory().read(0x2000), 0x00);
        assert_eq!(m.cpu().regs.sp, 0x2001);
    }

    #[test]
    fn shld_straddling_rom_writes_nothing() {
        // LXI H,BEEFh; SHLD 1FFFh
        let mut m = machine_with(&[0x21, 0xef, 0xbe, 0x22, 0xff, 0x1f]);
        assert!(m.execute(100).is_err());
        assert_eq!(m.memory().read(0x2000), 0x00);
    }

    #[test]
    fn refused_interrupt_keeps_inte() {
        // EI; LXI SP,2001h
        let mut m = machine_with(&[0xfb, 0x31, 0x01, 0x20]);
        m.execute(14).unwrap();
        assert!(m.cpu().interrupts_enabled());

        assert_eq!(
            m.raise_interrupt(1),
            Err(Fault::Memory {
                addr: 0x1fff,
                kind: MemoryFaultKind::RomWrite
            })
        );
        assert!(m.cpu().interrupts_enabled());
        assert_eq!(m.cpu().regs.sp, 0x2001);
        assert_eq!(m.memory().read(0x2000), 0x00);
    }

    #[test]
    fn interrupt_vector_uses_low_three_bits() {
        // EI; JMP 0001h
        let mut m = machine_with(&[0xfb, 0xc3, 0x01, 0x00]);
        m.execute(4).unwrap();
        assert_eq!(m.raise_interrupt(9), Ok(true));
        assert_eq!(m.cpu().regs.pc, 0x0008);
    }

    // Runs about 2^32 cycles; `cargo test -p invaders_core -- --ignored`.
    #[test]
    #[ignore]
    fn budget_near_u32_max_saturates() {
        // JMP 0000h forever.
        let mut m = machine_with(&[0xc3, 0x00, 0x00]);
        let outcome = m.execute(u32::MAX).unwrap();
        assert_eq!(outcome, ExecOutcome::BudgetMet(u32::MAX));
    }

    #[test]
    fn interrupt_sequencing() {
        let mut program = vec![0x00; 0x1001];
        program[0x0000] = 0xfb; // EI
        program[0x0001] = 0xc3; // JMP 1000h
        program[0x0002] = 0x00;
        program[0x0003] = 0x10;
        let mut m = machine_with(&program);

        m.execute(14).unwrap();
        assert_eq!(m.cpu().regs.pc, 0x1000);
        assert!(m.cpu().interrupts_enabled());

        assert_eq!(m.raise_interrupt(1), Ok(true));
        assert_eq!(m.memory().read(0x23ff), 0x10);
        assert_eq!(m.memory().read(0x23fe), 0x00);
        assert_eq!(m.cpu().regs.sp, 0x23fe);
        assert_eq!(m.cpu().regs.pc, 0x0008);
        assert!(!m.cpu().interrupts_enabled());

        assert_eq!(m.raise_interrupt(2), Ok(false));
        assert_eq!(m.cpu().regs.pc, 0x0008);
    }

    #[test]
    fn run_frame_delivers_both_vectors() {
        // 0000: EI; JMP 0001h (spin)
        // 0008: MVI A,01h; STA 2000h; EI; RET
        // 0010: MVI A,02h; STA 2001h; EI; RET
        let mut program = vec![0x00; 0x18];
        program[..4].copy_from_slice(&[0xfb, 0xc3, 0x01, 0x00]);
        program[0x08..0x10].copy_from_slice(&[0x3e, 0x01, 0x32, 0x00, 0x20, 0xfb, 0xc9, 0x00]);
        program[0x10..0x18].copy_from_slice(&[0x3e, 0x02, 0x32, 0x01, 0x20, 0xfb, 0xc9, 0x00]);
        let mut m = machine_with(&program);

        let frame = m.run_frame().unwrap();
        assert!(!frame.halted);
        assert!(frame.cycles >= CYCLES_PER_FRAME);
        assert_eq!(m.memory().read(0x2000), 0x01);

        m.run_frame().unwrap();
        assert_eq!(m.memory().read(0x2001), 0x02);
    }

    #[test]
    fn shift_register_through_ports() {
        // MVI A,AAh; OUT 4; MVI A,FFh; OUT 4; MVI A,02h; OUT 2; IN 3; HLT
        let mut m = machine_with(&[
            0x3e, 0xaa, 0xd3, 0x04, 0x3e, 0xff, 0xd3, 0x04, 0x3e, 0x02, 0xd3, 0x02, 0xdb,
            PORT_SHIFT_RESULT, 0x76,
        ]);
        m.execute(1_000).unwrap();
        assert_eq!(m.io().shift_register().value(), 0xffaa);
        assert_eq!(m.cpu().regs.a, 0xfe);
    }

    #[test]
    fn inputs_reach_port_1() {
        // IN 1; HLT
        let mut m = machine_with(&[0xdb, 0x01, 0x76]);
        m.set_input(InputLine::Coin, true);
        m.set_input(InputLine::P1Start, true);
        m.execute(100).unwrap();
        assert_eq!(m.cpu().regs.a, 0x0d);
    }

    #[test]
    fn reset_restores_power_on_state() {
        // MVI A,77h; STA 2400h; HLT
        let mut m = machine_with(&[0x3e, 0x77, 0x32, 0x00, 0x24, 0x76]);
        m.set_input(InputLine::Coin, true);
        m.execute(100).unwrap();
        assert!(m.is_halted());
        assert_eq!(m.video_ram()[0], 0x77);

        m.reset();
        assert!(!m.is_halted());
        assert_eq!(m.cpu().regs.pc, 0);
        assert_eq!(m.video_ram()[0], 0x00);
        assert_eq!(m.total_cycles(), 0);
        assert!(!m.io().inputs().is_pressed(InputLine::Coin));
        assert_eq!(m.memory().read(0x0000), 0x3e);
    }
}
