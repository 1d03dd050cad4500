//! Opcode decoding.
//!
//! Every byte is looked up in a 256-entry table built at compile time. The
//! table is filled by partitioning the opcode with the usual 8080 bit masks;
//! the handful of alternate encodings the silicon also accepts stay `None`
//! and surface as a decode fault.

use std::fmt;

/// 3-bit register field: B, C, D, E, H, L, M (memory at HL), A.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    M,
    A,
}

impl Reg {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Reg::B,
            1 => Reg::C,
            2 => Reg::D,
            3 => Reg::E,
            4 => Reg::H,
            5 => Reg::L,
            6 => Reg::M,
            _ => Reg::A,
        }
    }
}

/// 2-bit register pair field for LXI/INX/DCX/DAD/LDAX/STAX.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pair {
    BC,
    DE,
    HL,
    SP,
}

impl Pair {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Pair::BC,
            1 => Pair::DE,
            2 => Pair::HL,
            _ => Pair::SP,
        }
    }
}

/// 2-bit register pair field for PUSH/POP, where SP's slot means PSW.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackPair {
    BC,
    DE,
    HL,
    PSW,
}

impl StackPair {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::PSW,
        }
    }
}

/// 3-bit condition field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Condition {
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Condition {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Plus,
            _ => Condition::Minus,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NoCarry => "NC",
            Condition::Carry => "C",
            Condition::ParityOdd => "PO",
            Condition::ParityEven => "PE",
            Condition::Plus => "P",
            Condition::Minus => "M",
        }
    }
}

/// The eight accumulator operations of the 0x80–0xbf block and their
/// immediate forms.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Adc => "ADC",
            AluOp::Sub => "SUB",
            AluOp::Sbb => "SBB",
            AluOp::Ana => "ANA",
            AluOp::Xra => "XRA",
            AluOp::Ora => "ORA",
            AluOp::Cmp => "CMP",
        }
    }

    fn immediate_mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADI",
            AluOp::Adc => "ACI",
            AluOp::Sub => "SUI",
            AluOp::Sbb => "SBI",
            AluOp::Ana => "ANI",
            AluOp::Xra => "XRI",
            AluOp::Ora => "ORI",
            AluOp::Cmp => "CPI",
        }
    }
}

/// A decoded 8080 instruction. Operand bytes are not part of the value;
/// they are fetched during execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Instruction {
    Nop,
    Hlt,

    // Data transfer.
    Mov { dst: Reg, src: Reg },
    Mvi(Reg),
    Lxi(Pair),
    Lda,
    Sta,
    Lhld,
    Shld,
    Ldax(Pair),
    Stax(Pair),
    Xchg,

    // Arithmetic and logical.
    Alu(AluOp, Reg),
    AluImm(AluOp),
    Inr(Reg),
    Dcr(Reg),
    Inx(Pair),
    Dcx(Pair),
    Dad(Pair),
    Daa,
    Rlc,
    Rrc,
    Ral,
    Rar,
    Cma,
    Stc,
    Cmc,

    // Branch.
    Jmp,
    Jcc(Condition),
    Call,
    Ccc(Condition),
    Ret,
    Rcc(Condition),
    Rst(u8),
    Pchl,

    // Stack.
    Push(StackPair),
    Pop(StackPair),
    Xthl,
    Sphl,

    // IO and control.
    In,
    Out,
    Ei,
    Di,
}

impl Instruction {
    /// Look up `opcode` in the decode table.
    #[inline]
    pub fn decode(opcode: u8) -> Option<Self> {
        DECODE_TABLE[opcode as usize]
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            Instruction::Mvi(_) | Instruction::AluImm(_) | Instruction::In | Instruction::Out => 1,
            Instruction::Lxi(_)
            | Instruction::Lda
            | Instruction::Sta
            | Instruction::Lhld
            | Instruction::Shld
            | Instruction::Jmp
            | Instruction::Jcc(_)
            | Instruction::Call
            | Instruction::Ccc(_) => 2,
            _ => 0,
        }
    }
}

const fn decode_opcode(op: u8) -> Option<Instruction> {
    // 01dd dsss: MOV, with MOV M,M repurposed as HLT.
    if op & 0xc0 == 0x40 {
        if op == 0x76 {
            return Some(Instruction::Hlt);
        }
        return Some(Instruction::Mov {
            dst: Reg::from_bits(op >> 3),
            src: Reg::from_bits(op),
        });
    }

    // 10oo osss: accumulator ops against a register or M.
    if op & 0xc0 == 0x80 {
        return Some(Instruction::Alu(AluOp::from_bits(op >> 3), Reg::from_bits(op)));
    }

    // 00pp 0001 / 0011 / 1001 / 1011
    match op & 0xcf {
        0x01 => return Some(Instruction::Lxi(Pair::from_bits(op >> 4))),
        0x03 => return Some(Instruction::Inx(Pair::from_bits(op >> 4))),
        0x09 => return Some(Instruction::Dad(Pair::from_bits(op >> 4))),
        0x0b => return Some(Instruction::Dcx(Pair::from_bits(op >> 4))),
        0xc1 => return Some(Instruction::Pop(StackPair::from_bits(op >> 4))),
        0xc5 => return Some(Instruction::Push(StackPair::from_bits(op >> 4))),
        _ => {}
    }

    // 00rr r100 / 101 / 110, 11cc c000 / 010 / 100, 11ooo110, 11nnn111
    match op & 0xc7 {
        0x04 => return Some(Instruction::Inr(Reg::from_bits(op >> 3))),
        0x05 => return Some(Instruction::Dcr(Reg::from_bits(op >> 3))),
        0x06 => return Some(Instruction::Mvi(Reg::from_bits(op >> 3))),
        0xc0 => return Some(Instruction::Rcc(Condition::from_bits(op >> 3))),
        0xc2 => return Some(Instruction::Jcc(Condition::from_bits(op >> 3))),
        0xc4 => return Some(Instruction::Ccc(Condition::from_bits(op >> 3))),
        0xc6 => return Some(Instruction::AluImm(AluOp::from_bits(op >> 3))),
        0xc7 => return Some(Instruction::Rst((op >> 3) & 0x07)),
        _ => {}
    }

    match op {
        0x00 => Some(Instruction::Nop),
        0x02 => Some(Instruction::Stax(Pair::BC)),
        0x12 => Some(Instruction::Stax(Pair::DE)),
        0x0a => Some(Instruction::Ldax(Pair::BC)),
        0x1a => Some(Instruction::Ldax(Pair::DE)),
        0x22 => Some(Instruction::Shld),
        0x2a => Some(Instruction::Lhld),
        0x32 => Some(Instruction::Sta),
        0x3a => Some(Instruction::Lda),
        0x07 => Some(Instruction::Rlc),
        0x0f => Some(Instruction::Rrc),
        0x17 => Some(Instruction::Ral),
        0x1f => Some(Instruction::Rar),
        0x27 => Some(Instruction::Daa),
        0x2f => Some(Instruction::Cma),
        0x37 => Some(Instruction::Stc),
        0x3f => Some(Instruction::Cmc),
        0xc3 => Some(Instruction::Jmp),
        0xc9 => Some(Instruction::Ret),
        0xcd => Some(Instruction::Call),
        0xd3 => Some(Instruction::Out),
        0xdb => Some(Instruction::In),
        0xe3 => Some(Instruction::Xthl),
        0xe9 => Some(Instruction::Pchl),
        0xeb => Some(Instruction::Xchg),
        0xf3 => Some(Instruction::Di),
        0xf9 => Some(Instruction::Sphl),
        0xfb => Some(Instruction::Ei),
        // 0x08/0x10/../0x38 (NOP aliases), 0xcb (JMP), 0xd9 (RET),
        // 0xdd/0xed/0xfd (CALL).
        _ => None,
    }
}

const fn build_table() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    let mut op = 0;
    while op < 256 {
        table[op] = decode_opcode(op as u8);
        op += 1;
    }
    table
}

static DECODE_TABLE: [Option<Instruction>; 256] = build_table();

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::B => "B",
            Reg::C => "C",
            Reg::D => "D",
            Reg::E => "E",
            Reg::H => "H",
            Reg::L => "L",
            Reg::M => "M",
            Reg::A => "A",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Intel syntax names a pair by its high register.
        let name = match self {
            Pair::BC => "B",
            Pair::DE => "D",
            Pair::HL => "H",
            Pair::SP => "SP",
        };
        f.write_str(name)
    }
}

impl fmt::Display for StackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StackPair::BC => "B",
            StackPair::DE => "D",
            StackPair::HL => "H",
            StackPair::PSW => "PSW",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Nop => f.write_str("NOP"),
            Instruction::Hlt => f.write_str("HLT"),
            Instruction::Mov { dst, src } => write!(f, "MOV {dst},{src}"),
            Instruction::Mvi(r) => write!(f, "MVI {r}"),
            Instruction::Lxi(p) => write!(f, "LXI {p}"),
            Instruction::Lda => f.write_str("LDA"),
            Instruction::Sta => f.write_str("STA"),
            Instruction::Lhld => f.write_str("LHLD"),
            Instruction::Shld => f.write_str("SHLD"),
            Instruction::Ldax(p) => write!(f, "LDAX {p}"),
            Instruction::Stax(p) => write!(f, "STAX {p}"),
            Instruction::Xchg => f.write_str("XCHG"),
            Instruction::Alu(op, r) => write!(f, "{} {r}", op.mnemonic()),
            Instruction::AluImm(op) => f.write_str(op.immediate_mnemonic()),
            Instruction::Inr(r) => write!(f, "INR {r}"),
            Instruction::Dcr(r) => write!(f, "DCR {r}"),
            Instruction::Inx(p) => write!(f, "INX {p}"),
            Instruction::Dcx(p) => write!(f, "DCX {p}"),
            Instruction::Dad(p) => write!(f, "DAD {p}"),
            Instruction::Daa => f.write_str("DAA"),
            Instruction::Rlc => f.write_str("RLC"),
            Instruction::Rrc => f.write_str("RRC"),
            Instruction::Ral => f.write_str("RAL"),
            Instruction::Rar => f.write_str("RAR"),
            Instruction::Cma => f.write_str("CMA"),
            Instruction::Stc => f.write_str("STC"),
            Instruction::Cmc => f.write_str("CMC"),
            Instruction::Jmp => f.write_str("JMP"),
            Instruction::Jcc(c) => write!(f, "J{}", c.suffix()),
            Instruction::Call => f.write_str("CALL"),
            Instruction::Ccc(c) => write!(f, "C{}", c.suffix()),
            Instruction::Ret => f.write_str("RET"),
            Instruction::Rcc(c) => write!(f, "R{}", c.suffix()),
            Instruction::Rst(n) => write!(f, "RST {n}"),
            Instruction::Pchl => f.write_str("PCHL"),
            Instruction::Push(p) => write!(f, "PUSH {p}"),
            Instruction::Pop(p) => write!(f, "POP {p}"),
            Instruction::Xthl => f.write_str("XTHL"),
            Instruction::Sphl => f.write_str("SPHL"),
            Instruction::In => f.write_str("IN"),
            Instruction::Out => f.write_str("OUT"),
            Instruction::Ei => f.write_str("EI"),
            Instruction::Di => f.write_str("DI"),
        }
    }
}

/// Render the instruction at the start of `bytes` (located at `addr`) as a
/// single listing line, e.g. `0100  21 34 12  LXI H,1234h`.
///
/// Returns the line and the instruction length, or `None` when the opcode
/// is not decodable or its operands run past the end of `bytes`.
pub fn disassemble(bytes: &[u8], addr: u16) -> Option<(String, usize)> {
    let (&opcode, rest) = bytes.split_first()?;
    let instr = Instruction::decode(opcode)?;
    let operands = rest.get(..instr.operand_len() as usize)?;

    let raw: Vec<String> = bytes[..1 + operands.len()]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect();
    let text = match operands {
        &[imm] => match instr {
            Instruction::Mvi(_) => format!("{instr},{imm:02X}h"),
            _ => format!("{instr} {imm:02X}h"),
        },
        &[lo, hi] => {
            let word = u16::from_le_bytes([lo, hi]);
            match instr {
                Instruction::Lxi(_) => format!("{instr},{word:04X}h"),
                _ => format!("{instr} {word:04X}h"),
            }
        }
        _ => instr.to_string(),
    };

    Some((
        format!("{addr:04X}  {:<9} {text}", raw.join(" ")),
        1 + operands.len(),
    ))
}
