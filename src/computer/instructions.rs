use phf::phf_map;
use smallvec::SmallVec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    Ldi,
    Prn,
    Cmp,
    Jmp,
    Jeq,
    Jne,
}

pub static OPCODE: phf::Map<u8, Opcode> = phf_map! {
    0b1000_0010u8 => Opcode::Ldi,
    0b0100_0111u8 => Opcode::Prn,
    0b1010_0111u8 => Opcode::Cmp,
    0b0101_0100u8 => Opcode::Jmp,
    0b0101_0101u8 => Opcode::Jeq,
    0b0101_0110u8 => Opcode::Jne,
};

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        OPCODE.get(&byte).copied()
    }

    pub fn byte(self) -> u8 {
        match self {
            Opcode::Ldi => 0b1000_0010,
            Opcode::Prn => 0b0100_0111,
            Opcode::Cmp => 0b1010_0111,
            Opcode::Jmp => 0b0101_0100,
            Opcode::Jeq => 0b0101_0101,
            Opcode::Jne => 0b0101_0110,
        }
    }

    /// Number of operand bytes following the opcode in memory.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Ldi | Opcode::Cmp => 2,
            Opcode::Prn | Opcode::Jmp | Opcode::Jeq | Opcode::Jne => 1,
        }
    }

    /// Encoded length in bytes, which is also the PC advance for
    /// non-jumping execution.
    pub fn encoded_len(self) -> u8 {
        1 + self.operand_count() as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
        }
    }
}

/// A decoded view over the bytes at the program counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Op {
        opcode: Opcode,
        operands: SmallVec<[u8; 2]>,
    },
    /// Any byte that is not a recognized opcode stops the machine.
    Halt(u8),
}

impl Instruction {
    pub fn operand(&self, index: usize) -> u8 {
        match self {
            Instruction::Op { operands, .. } => operands.get(index).copied().unwrap_or(0),
            Instruction::Halt(_) => 0,
        }
    }
}
