use crate::error::Fault;

/// Cheapest and dearest instruction on the 8080 (NOP..XTHL).
pub const MIN_CYCLES: u32 = 4;
pub const MAX_CYCLES: u32 = 18;

/// Cost of a conditional CALL whose condition fails.
const CALL_NOT_TAKEN: u32 = 11;
/// Cost of a conditional RET whose condition fails.
const RET_NOT_TAKEN: u32 = 5;

/// Base cost of every opcode in clock states. Conditional CALL/RET hold the
/// taken cost. Alternate encodings are 0: they never reach accounting.
#[rustfmt::skip]
const BASE_CYCLES: [u8; 256] = [
//  x0  x1  x2  x3  x4  x5  x6  x7  x8  x9  xA  xB  xC  xD  xE  xF
     4, 10,  7,  5,  5,  5,  7,  4,  0, 10,  7,  5,  5,  5,  7,  4, // 0x
     0, 10,  7,  5,  5,  5,  7,  4,  0, 10,  7,  5,  5,  5,  7,  4, // 1x
     0, 10, 16,  5,  5,  5,  7,  4,  0, 10, 16,  5,  5,  5,  7,  4, // 2x
     0, 10, 13,  5, 10, 10, 10,  4,  0, 10, 13,  5,  5,  5,  7,  4, // 3x
     5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 4x
     5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 5x
     5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 6x
     7,  7,  7,  7,  7,  7,  7,  7,  5,  5,  5,  5,  5,  5,  7,  5, // 7x
     4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 8x
     4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 9x
     4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // Ax
     4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // Bx
    11, 10, 10, 10, 17, 11,  7, 11, 11, 10, 10,  0, 17, 17,  7, 11, // Cx
    11, 10, 10, 10, 17, 11,  7, 11, 11,  0, 10, 10, 17,  0,  7, 11, // Dx
    11, 10, 10, 18, 17, 11,  7, 11, 11,  5, 10,  4, 17,  0,  7, 11, // Ex
    11, 10, 10,  4, 17, 11,  7, 11, 11,  5, 10,  4, 17,  0,  7, 11, // Fx
];

#[inline]
fn is_conditional_call(opcode: u8) -> bool {
    opcode & 0xc7 == 0xc4
}

#[inline]
fn is_conditional_ret(opcode: u8) -> bool {
    opcode & 0xc7 == 0xc0
}

/// Cost of retiring `opcode`. `taken` only matters for conditional
/// CALL/RET; everything else has a single cost.
pub fn cost(opcode: u8, taken: bool) -> Result<u32, Fault> {
    let cycles = match (taken, opcode) {
        (false, op) if is_conditional_call(op) => CALL_NOT_TAKEN,
        (false, op) if is_conditional_ret(op) => RET_NOT_TAKEN,
        (_, op) => u32::from(BASE_CYCLES[op as usize]),
    };

    if !(MIN_CYCLES..=MAX_CYCLES).contains(&cycles) {
        return Err(Fault::CycleAccounting { opcode, cycles });
    }
    Ok(cycles)
}
