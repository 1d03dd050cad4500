use bitflags::bitflags;

/// Initial stack pointer: top of work RAM, just below video RAM.
pub const STACK_TOP: u16 = 0x2400;

/// A 16-bit register pair with byte views over the same storage.
///
/// Writes through `set_high`/`set_low` are visible through `get16` and the
/// other way round; there is only one slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegisterPair(u16);

impl RegisterPair {
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    #[inline]
    pub fn high(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn low(&self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn set_high(&mut self, value: u8) {
        self.0 = (self.0 & 0x00ff) | (u16::from(value) << 8);
    }

    #[inline]
    pub fn set_low(&mut self, value: u8) {
        self.0 = (self.0 & 0xff00) | u16::from(value);
    }

    #[inline]
    pub fn get16(&self) -> u16 {
        self.0
    }

    #[inline]
    pub fn set16(&mut self, value: u16) {
        self.0 = value;
    }
}

bitflags! {
    /// Condition flags of the 8080.
    ///
    /// Layout (bit 7 to bit 0): S Z 0 AC 0 P 1 C.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct Flags: u8 {
        const SIGN = 0x80;
        const ZERO = 0x40;
        const AUX_CARRY = 0x10;
        const PARITY = 0x04;
        const CARRY = 0x01;
    }
}

/// Bit 1 of the packed flags byte always reads as 1.
const FLAGS_ALWAYS_ONE: u8 = 0x02;

impl Default for Flags {
    fn default() -> Self {
        Flags::empty()
    }
}

impl Flags {
    /// Packed byte as pushed by `PUSH PSW`.
    #[inline]
    pub fn to_byte(self) -> u8 {
        self.bits() | FLAGS_ALWAYS_ONE
    }

    /// Unpack a byte popped by `POP PSW`; the constant bits are dropped.
    #[inline]
    pub fn from_byte(value: u8) -> Self {
        Flags::from_bits_truncate(value)
    }

    /// Update S, Z and P from a result byte.
    #[inline]
    pub fn set_szp(&mut self, value: u8) {
        self.set(Flags::ZERO, value == 0);
        self.set(Flags::SIGN, value & 0x80 != 0);
        self.set(Flags::PARITY, parity(value));
    }

    #[inline]
    pub fn carry(self) -> bool {
        self.contains(Flags::CARRY)
    }
}

/// `true` when `value` has an even number of set bits.
#[inline]
pub fn parity(value: u8) -> bool {
    value.count_ones() % 2 == 0
}

/// 8080 register file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Registers {
    pub a: u8,
    pub flags: Flags,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,
    pub sp: u16,
    pub pc: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            a: 0,
            flags: Flags::empty(),
            bc: RegisterPair::default(),
            de: RegisterPair::default(),
            hl: RegisterPair::default(),
            sp: STACK_TOP,
            pc: 0,
        }
    }
}

impl Registers {
    #[inline]
    pub fn b(&self) -> u8 {
        self.bc.high()
    }

    #[inline]
    pub fn c(&self) -> u8 {
        self.bc.low()
    }

    #[inline]
    pub fn d(&self) -> u8 {
        self.de.high()
    }

    #[inline]
    pub fn e(&self) -> u8 {
        self.de.low()
    }

    #[inline]
    pub fn h(&self) -> u8 {
        self.hl.high()
    }

    #[inline]
    pub fn l(&self) -> u8 {
        self.hl.low()
    }

    #[inline]
    pub fn set_b(&mut self, value: u8) {
        self.bc.set_high(value);
    }

    #[inline]
    pub fn set_c(&mut self, value: u8) {
        self.bc.set_low(value);
    }

    #[inline]
    pub fn set_d(&mut self, value: u8) {
        self.de.set_high(value);
    }

    #[inline]
    pub fn set_e(&mut self, value: u8) {
        self.de.set_low(value);
    }

    #[inline]
    pub fn set_h(&mut self, value: u8) {
        self.hl.set_high(value);
    }

    #[inline]
    pub fn set_l(&mut self, value: u8) {
        self.hl.set_low(value);
    }

    /// A in the high byte, packed flags in the low byte.
    #[inline]
    pub fn psw(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.to_byte()])
    }

    #[inline]
    pub fn set_psw(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.flags = Flags::from_byte(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_views_share_storage() {
        let mut bc = RegisterPair::default();
        bc.set16(0x1234);
        assert_eq!(bc.high(), 0x12);
        assert_eq!(bc.low(), 0x34);

        bc.set_high(0xab);
        assert_eq!(bc.get16(), 0xab34);
        bc.set_low(0xcd);
        assert_eq!(bc.get16(), 0xabcd);
    }

    #[test]
    fn register_accessors_go_through_pairs() {
        let mut regs = Registers::default();
        regs.set_d(0x01);
        regs.set_e(0x02);
        assert_eq!(regs.de.get16(), 0x0102);

        regs.hl.set16(0xfeed);
        assert_eq!((regs.h(), regs.l()), (0xfe, 0xed));
    }

    #[test]
    fn power_on_state() {
        let regs = Registers::default();
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.sp, 0x2400);
        assert_eq!(regs.flags.to_byte(), 0x02);
        assert_eq!(regs.bc.get16(), 0);
    }

    #[test]
    fn flags_byte_layout() {
        let all = Flags::all();
        assert_eq!(all.to_byte(), 0b1101_0111);

        let popped = Flags::from_byte(0xff);
        assert_eq!(popped, Flags::all());
        assert_eq!(popped.to_byte() & 0x28, 0);
    }

    #[test]
    fn psw_round_trip() {
        let mut regs = Registers::default();
        regs.set_psw(0x42ff);
        assert_eq!(regs.a, 0x42);
        assert_eq!(regs.psw(), 0x42d7);
    }

    #[test]
    fn parity_examples() {
        assert!(parity(0x00));
        assert!(parity(0xff));
        assert!(!parity(0x01));
        assert!(parity(0x03));
    }
}
