//! IO port side of the Space Invaders board: the external shift register
//! and the input latches read by `IN`.

/// Input port numbers.
pub const PORT_BOARD: u8 = 0;
pub const PORT_INPUT1: u8 = 1;
pub const PORT_INPUT2: u8 = 2;
pub const PORT_SHIFT_RESULT: u8 = 3;

/// Output port numbers.
pub const PORT_SHIFT_OFFSET: u8 = 2;
pub const PORT_SOUND1: u8 = 3;
pub const PORT_SHIFT_FILL: u8 = 4;
pub const PORT_SOUND2: u8 = 5;
pub const PORT_WATCHDOG: u8 = 6;

/// Fixed value returned by port 0.
const BOARD_PORT_VALUE: u8 = 0x0d;

/// Bit positions for input port 1 (IN 1).
const IN1_BIT_COIN: u8 = 0;
const IN1_BIT_P2_START: u8 = 1;
const IN1_BIT_P1_START: u8 = 2;
const IN1_BIT_ALWAYS_ONE: u8 = 3;
const IN1_BIT_P1_SHOOT: u8 = 4;
const IN1_BIT_P1_LEFT: u8 = 5;
const IN1_BIT_P1_RIGHT: u8 = 6;

/// Bit positions for input port 2 (IN 2).
///
/// - bits 0–1: number of ships per credit (DIP)
/// - bit 2:    tilt input
/// - bits 4–6: player 2 controls
/// - bit 7:    "display coin info" DIP (0 = show, 1 = hide)
const IN2_BIT_TILT: u8 = 2;
const IN2_BIT_P2_SHOOT: u8 = 4;
const IN2_BIT_P2_LEFT: u8 = 5;
const IN2_BIT_P2_RIGHT: u8 = 6;
const IN2_BIT_COIN_INFO: u8 = 7;

const IN2_MASK_SHIPS_PER_CREDIT: u8 = 0x03;

/// The 16-bit shift register used by the game for fast sprite shifting.
///
/// `OUT 4` shifts a new byte in from the top, `OUT 2` picks a 3-bit offset
/// and `IN 3` reads 8 bits starting `offset` bits below the high byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShiftRegister {
    value: u16,
    offset: u8,
}

impl ShiftRegister {
    /// The incoming byte becomes the high byte, the old high byte drops to
    /// the low byte.
    pub fn fill(&mut self, byte: u8) {
        self.value = (self.value >> 8) | (u16::from(byte) << 8);
    }

    pub fn set_offset(&mut self, offset: u8) {
        self.offset = offset & 0x07;
    }

    pub fn result(&self) -> u8 {
        ((u32::from(self.value) << self.offset) >> 8) as u8
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }
}

/// Named input lines wired to ports 1 and 2.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InputLine {
    Coin,
    P1Start,
    P2Start,
    P1Shoot,
    P1Left,
    P1Right,
    P2Shoot,
    P2Left,
    P2Right,
    Tilt,
}

impl InputLine {
    pub const ALL: [InputLine; 10] = [
        InputLine::Coin,
        InputLine::P1Start,
        InputLine::P2Start,
        InputLine::P1Shoot,
        InputLine::P1Left,
        InputLine::P1Right,
        InputLine::P2Shoot,
        InputLine::P2Left,
        InputLine::P2Right,
        InputLine::Tilt,
    ];

    /// Port number and bit position backing this line.
    pub const fn port_bit(self) -> (u8, u8) {
        match self {
            InputLine::Coin => (PORT_INPUT1, IN1_BIT_COIN),
            InputLine::P2Start => (PORT_INPUT1, IN1_BIT_P2_START),
            InputLine::P1Start => (PORT_INPUT1, IN1_BIT_P1_START),
            InputLine::P1Shoot => (PORT_INPUT1, IN1_BIT_P1_SHOOT),
            InputLine::P1Left => (PORT_INPUT1, IN1_BIT_P1_LEFT),
            InputLine::P1Right => (PORT_INPUT1, IN1_BIT_P1_RIGHT),
            InputLine::Tilt => (PORT_INPUT2, IN2_BIT_TILT),
            InputLine::P2Shoot => (PORT_INPUT2, IN2_BIT_P2_SHOOT),
            InputLine::P2Left => (PORT_INPUT2, IN2_BIT_P2_LEFT),
            InputLine::P2Right => (PORT_INPUT2, IN2_BIT_P2_RIGHT),
        }
    }
}

/// Simple configuration for the Space Invaders DIP switches that we model.
///
/// - `ships_per_credit`: number of ships per game (3–6), encoded in bits 0–1
///   of port 2 as `value - 3`.
/// - `show_coin_info`: whether the attract mode shows the coin/credit line.
///   The ROM treats bit 7 = 1 as "hide coin info".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DipConfig {
    pub ships_per_credit: u8,
    pub show_coin_info: bool,
}

impl Default for DipConfig {
    fn default() -> Self {
        Self {
            ships_per_credit: 3,
            show_coin_info: true,
        }
    }
}

impl DipConfig {
    fn port2_bits(&self) -> u8 {
        let ships = self.ships_per_credit.clamp(3, 6);
        let mut bits = (ships - 3) & IN2_MASK_SHIPS_PER_CREDIT;
        if !self.show_coin_info {
            bits |= 1 << IN2_BIT_COIN_INFO;
        }
        bits
    }
}

/// Latched state of every input line.
///
/// Owned by the machine and set by whatever maps host input to the board.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Inputs {
    port1: u8,
    port2: u8,
}

impl Inputs {
    pub fn set(&mut self, line: InputLine, pressed: bool) {
        let (port, bit) = line.port_bit();
        let latch = if port == PORT_INPUT1 {
            &mut self.port1
        } else {
            &mut self.port2
        };
        set_input_bit(latch, bit, pressed);
    }

    pub fn is_pressed(&self, line: InputLine) -> bool {
        let (port, bit) = line.port_bit();
        let latch = if port == PORT_INPUT1 {
            self.port1
        } else {
            self.port2
        };
        latch & (1 << bit) != 0
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

/// Board-side IO: shift register, input latches and DIP switches.
#[derive(Clone, Debug, Default)]
pub struct IoPorts {
    shift: ShiftRegister,
    inputs: Inputs,
    dip: DipConfig,
}

impl IoPorts {
    pub fn new(dip: DipConfig) -> Self {
        Self {
            shift: ShiftRegister::default(),
            inputs: Inputs::default(),
            dip,
        }
    }

    /// Return to power-on state, keeping the DIP switches.
    pub fn reset(&mut self) {
        self.shift = ShiftRegister::default();
        self.inputs.release_all();
    }

    pub fn read(&mut self, port: u8) -> u8 {
        match port {
            PORT_BOARD => BOARD_PORT_VALUE,
            PORT_INPUT1 => self.inputs.port1 | (1 << IN1_BIT_ALWAYS_ONE),
            PORT_INPUT2 => self.inputs.port2 | self.dip.port2_bits(),
            PORT_SHIFT_RESULT => self.shift.result(),
            _ => {
                log::warn!("IN from unmapped port {port}");
                0
            }
        }
    }

    pub fn write(&mut self, port: u8, value: u8) {
        match port {
            PORT_SHIFT_OFFSET => self.shift.set_offset(value),
            PORT_SHIFT_FILL => self.shift.fill(value),
            // Sound latches and watchdog: accepted, nothing emulated.
            PORT_SOUND1 | PORT_SOUND2 | PORT_WATCHDOG => {}
            _ => log::warn!("OUT 0x{value:02X} to unmapped port {port}"),
        }
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut Inputs {
        &mut self.inputs
    }

    pub fn shift_register(&self) -> &ShiftRegister {
        &self.shift
    }

    pub fn dip(&self) -> DipConfig {
        self.dip
    }
}

fn set_input_bit(port: &mut u8, bit: u8, pressed: bool) {
    let mask = 1 << bit;
    if pressed {
        *port |= mask;
    } else {
        *port &= !mask;
    }
}
