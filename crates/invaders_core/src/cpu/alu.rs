//! 8-bit arithmetic and the flag rules that go with it.
//!
//! Each helper takes the flag register explicitly so the rules can be
//! checked in isolation; the executor feeds it `self.regs.flags`.

use super::regs::Flags;

/// ADD/ADC: `a + b + carry_in`.
///
/// C is the carry out of bit 7, AC the carry out of bit 3.
pub fn add(flags: &mut Flags, a: u8, b: u8, carry_in: bool) -> u8 {
    let c = u8::from(carry_in);
    let full = u16::from(a) + u16::from(b) + u16::from(c);
    let half = (a & 0x0f) + (b & 0x0f) + c;
    let result = full as u8;

    flags.set(Flags::CARRY, full > 0xff);
    flags.set(Flags::AUX_CARRY, half > 0x0f);
    flags.set_szp(result);
    result
}

/// SUB/SBB/CMP: `a - b - borrow_in`.
///
/// C is the borrow out of bit 7 (set when `a < b + borrow_in`), AC the
/// borrow out of bit 3.
pub fn sub(flags: &mut Flags, a: u8, b: u8, borrow_in: bool) -> u8 {
    let c = i16::from(borrow_in);
    let full = i16::from(a) - i16::from(b) - c;
    let half = i16::from(a & 0x0f) - i16::from(b & 0x0f) - c;
    let result = full as u8;

    flags.set(Flags::CARRY, full < 0);
    flags.set(Flags::AUX_CARRY, half < 0);
    flags.set_szp(result);
    result
}

/// INR: +1 with S, Z, AC, P updated. Carry is never touched.
pub fn inr(flags: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    flags.set(Flags::AUX_CARRY, (value & 0x0f) == 0x0f);
    flags.set_szp(result);
    result
}

/// DCR: -1 with S, Z, AC, P updated. Carry is never touched.
pub fn dcr(flags: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    flags.set(Flags::AUX_CARRY, (value & 0x0f) == 0x00);
    flags.set_szp(result);
    result
}

pub fn and(flags: &mut Flags, a: u8, b: u8) -> u8 {
    logical(flags, a & b)
}

pub fn or(flags: &mut Flags, a: u8, b: u8) -> u8 {
    logical(flags, a | b)
}

pub fn xor(flags: &mut Flags, a: u8, b: u8) -> u8 {
    logical(flags, a ^ b)
}

#[inline]
fn logical(flags: &mut Flags, result: u8) -> u8 {
    flags.remove(Flags::CARRY | Flags::AUX_CARRY);
    flags.set_szp(result);
    result
}

/// Decimal adjust after a BCD addition.
///
/// The low-nibble stage is a full `add` of 0 or 6 and owns S, Z, P and AC.
/// The high-nibble stage adds 0x60 and only ever sets C; a carry that was
/// already set stays set.
pub fn daa(flags: &mut Flags, a: u8) -> u8 {
    let carry_before = flags.carry();

    let low_adjust = if (a & 0x0f) > 9 || flags.contains(Flags::AUX_CARRY) {
        0x06
    } else {
        0x00
    };
    let a = add(flags, a, low_adjust, false);
    let carry_low = flags.carry();

    let carry = carry_before || carry_low;
    if (a >> 4) > 9 || carry {
        let (result, carry_high) = a.overflowing_add(0x60);
        flags.set(Flags::CARRY, carry || carry_high);
        result
    } else {
        flags.set(Flags::CARRY, carry);
        a
    }
}

/// DAD: `hl + value`, only C is affected.
pub fn dad(flags: &mut Flags, hl: u16, value: u16) -> u16 {
    let (result, carry) = hl.overflowing_add(value);
    flags.set(Flags::CARRY, carry);
    result
}

/// RLC: rotate left, bit 7 into C and bit 0.
pub fn rlc(flags: &mut Flags, a: u8) -> u8 {
    flags.set(Flags::CARRY, a & 0x80 != 0);
    a.rotate_left(1)
}

/// RRC: rotate right, bit 0 into C and bit 7.
pub fn rrc(flags: &mut Flags, a: u8) -> u8 {
    flags.set(Flags::CARRY, a & 0x01 != 0);
    a.rotate_right(1)
}

/// RAL: rotate left through carry.
pub fn ral(flags: &mut Flags, a: u8) -> u8 {
    let carry_in = u8::from(flags.carry());
    flags.set(Flags::CARRY, a & 0x80 != 0);
    (a << 1) | carry_in
}

/// RAR: rotate right through carry.
pub fn rar(flags: &mut Flags, a: u8) -> u8 {
    let carry_in = if flags.carry() { 0x80 } else { 0x00 };
    flags.set(Flags::CARRY, a & 0x01 != 0);
    (a >> 1) | carry_in
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::regs::parity;

    #[test]
    fn add_matches_truth_table_for_all_pairs() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let mut flags = Flags::empty();
                let res = add(&mut flags, a, b, false);
                let sum = a as u16 + b as u16;
                assert_eq!(res, sum as u8);
                assert_eq!(flags.contains(Flags::ZERO), sum % 256 == 0, "{a:02X}+{b:02X}");
                assert_eq!(flags.contains(Flags::CARRY), sum > 255, "{a:02X}+{b:02X}");
                assert_eq!(flags.contains(Flags::SIGN), res & 0x80 != 0);
                assert_eq!(flags.contains(Flags::PARITY), parity(res));
                assert_eq!(
                    flags.contains(Flags::AUX_CARRY),
                    (a & 0x0f) + (b & 0x0f) > 0x0f
                );
            }
        }
    }

    #[test]
    fn sub_sets_borrow_and_aux_borrow() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let mut flags = Flags::empty();
                let res = sub(&mut flags, a, b, false);
                assert_eq!(res, a.wrapping_sub(b));
                assert_eq!(flags.contains(Flags::CARRY), a < b);
                assert_eq!(flags.contains(Flags::AUX_CARRY), (a & 0x0f) < (b & 0x0f));
                assert_eq!(flags.contains(Flags::ZERO), a == b);
            }
        }
    }

    #[test]
    fn adc_and_sbb_use_incoming_carry() {
        let mut flags = Flags::empty();
        assert_eq!(add(&mut flags, 0x0f, 0x00, true), 0x10);
        assert!(flags.contains(Flags::AUX_CARRY));
        assert!(!flags.contains(Flags::CARRY));

        assert_eq!(add(&mut flags, 0xff, 0x00, true), 0x00);
        assert!(flags.contains(Flags::CARRY | Flags::ZERO));

        assert_eq!(sub(&mut flags, 0x00, 0x00, true), 0xff);
        assert!(flags.contains(Flags::CARRY | Flags::AUX_CARRY | Flags::SIGN));

        assert_eq!(sub(&mut flags, 0x10, 0x0f, true), 0x00);
        assert!(!flags.contains(Flags::CARRY));
        assert!(flags.contains(Flags::ZERO | Flags::AUX_CARRY));
    }

    #[test]
    fn inr_dcr_leave_carry_alone() {
        let mut flags = Flags::CARRY;
        assert_eq!(inr(&mut flags, 0xff), 0x00);
        assert!(flags.contains(Flags::CARRY | Flags::ZERO | Flags::AUX_CARRY));

        let mut flags = Flags::empty();
        assert_eq!(dcr(&mut flags, 0x00), 0xff);
        assert!(!flags.contains(Flags::CARRY));
        assert!(flags.contains(Flags::SIGN | Flags::AUX_CARRY | Flags::PARITY));

        let mut flags = Flags::CARRY;
        assert_eq!(dcr(&mut flags, 0x11), 0x10);
        assert!(flags.contains(Flags::CARRY));
        assert!(!flags.contains(Flags::AUX_CARRY));
    }

    #[test]
    fn logical_ops_clear_carries() {
        let mut flags = Flags::CARRY | Flags::AUX_CARRY;
        assert_eq!(and(&mut flags, 0xf0, 0x0f), 0x00);
        assert_eq!(flags, Flags::ZERO | Flags::PARITY);

        let mut flags = Flags::CARRY | Flags::AUX_CARRY;
        assert_eq!(or(&mut flags, 0x80, 0x01), 0x81);
        assert_eq!(flags, Flags::SIGN | Flags::PARITY);

        let mut flags = Flags::CARRY;
        assert_eq!(xor(&mut flags, 0xff, 0xfe), 0x01);
        assert_eq!(flags, Flags::empty());
    }

    #[test]
    fn daa_two_stage_adjust() {
        let mut flags = Flags::empty();
        assert_eq!(daa(&mut flags, 0x9a), 0x00);
        assert!(flags.carry());

        // 0x15 + 0x27 = 0x3c -> BCD 42
        let mut flags = Flags::empty();
        let sum = add(&mut flags, 0x15, 0x27, false);
        assert_eq!(daa(&mut flags, sum), 0x42);
        assert!(!flags.carry());

        // 0x09 + 0x08 = 0x11 with AC -> BCD 17
        let mut flags = Flags::empty();
        let sum = add(&mut flags, 0x09, 0x08, false);
        assert!(flags.contains(Flags::AUX_CARRY));
        assert_eq!(daa(&mut flags, sum), 0x17);
    }

    #[test]
    fn daa_keeps_incoming_carry() {
        // 0x99 + 0x99 = 0x132 -> A=0x32, C=1, AC=1 -> BCD 98 with carry
        let mut flags = Flags::empty();
        let sum = add(&mut flags, 0x99, 0x99, false);
        assert_eq!(daa(&mut flags, sum), 0x98);
        assert!(flags.carry());
    }

    #[test]
    fn daa_without_adjust_is_identity() {
        let mut flags = Flags::empty();
        assert_eq!(daa(&mut flags, 0x42), 0x42);
        assert!(!flags.carry());
        assert!(flags.contains(Flags::PARITY));
    }

    #[test]
    fn dad_only_touches_carry() {
        let mut flags = Flags::ZERO;
        assert_eq!(dad(&mut flags, 0xffff, 0x0002), 0x0001);
        assert_eq!(flags, Flags::ZERO | Flags::CARRY);
        assert_eq!(dad(&mut flags, 0x1000, 0x0234), 0x1234);
        assert_eq!(flags, Flags::ZERO);
    }

    #[test]
    fn rotates() {
        let mut flags = Flags::empty();
        assert_eq!(rlc(&mut flags, 0x81), 0x03);
        assert!(flags.carry());
        assert_eq!(rrc(&mut flags, 0x01), 0x80);
        assert!(flags.carry());

        let mut flags = Flags::empty();
        assert_eq!(ral(&mut flags, 0x80), 0x00);
        assert!(flags.carry());
        assert_eq!(ral(&mut flags, 0x00), 0x01);
        assert!(!flags.carry());

        let mut flags = Flags::CARRY;
        assert_eq!(rar(&mut flags, 0x02), 0x81);
        assert!(!flags.carry());
    }
}
