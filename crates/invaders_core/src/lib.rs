//! Intel 8080 core and the Space Invaders board around it.
//!
//! The board is driven through [`Machine`]: load a ROM, run cycle-budgeted
//! slices with [`Machine::execute`] and inject the two per-frame interrupts
//! with [`Machine::raise_interrupt`], or let [`Machine::run_frame`] do both.

pub mod cpu;
pub mod error;
pub mod io;
pub mod machine;
pub mod memory;

pub use cpu::{Bus, Cpu};
pub use error::{Fault, LoadError, MemoryFaultKind};
pub use io::{DipConfig, InputLine};
pub use machine::{ExecOutcome, FrameOutcome, Machine, MachineConfig};

/// Logical screen width in pixels (Space Invaders is 224x256, rotated).
pub const SCREEN_WIDTH: usize = 224;
/// Logical screen height in pixels.
pub const SCREEN_HEIGHT: usize = 256;
