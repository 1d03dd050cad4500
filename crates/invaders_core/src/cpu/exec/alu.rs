use crate::cpu::alu;
use crate::cpu::decode::{AluOp, Instruction, Pair};
use crate::cpu::Cpu;

impl Cpu {
    /// Accumulator group: `A <op> value`. CMP only updates flags.
    pub(super) fn exec_alu(&mut self, op: AluOp, value: u8) {
        let a = self.regs.a;
        let flags = &mut self.regs.flags;
        let carry = flags.carry();

        let result = match op {
            AluOp::Add => alu::add(flags, a, value, false),
            AluOp::Adc => alu::add(flags, a, value, carry),
            AluOp::Sub => alu::sub(flags, a, value, false),
            AluOp::Sbb => alu::sub(flags, a, value, carry),
            AluOp::Ana => alu::and(flags, a, value),
            AluOp::Xra => alu::xor(flags, a, value),
            AluOp::Ora => alu::or(flags, a, value),
            AluOp::Cmp => {
                alu::sub(flags, a, value, false);
                return;
            }
        };
        self.regs.a = result;
    }

    pub(super) fn exec_daa(&mut self) {
        self.regs.a = alu::daa(&mut self.regs.flags, self.regs.a);
    }

    pub(super) fn exec_dad(&mut self, pair: Pair) {
        let value = self.pair(pair);
        let hl = alu::dad(&mut self.regs.flags, self.regs.hl.get16(), value);
        self.regs.hl.set16(hl);
    }

    pub(super) fn exec_rotate(&mut self, instr: Instruction) {
        let a = self.regs.a;
        let flags = &mut self.regs.flags;
        self.regs.a = match instr {
            Instruction::Rlc => alu::rlc(flags, a),
            Instruction::Rrc => alu::rrc(flags, a),
            Instruction::Ral => alu::ral(flags, a),
            Instruction::Rar => alu::rar(flags, a),
            _ => unreachable!("not a rotate: {instr}"),
        };
    }
}
