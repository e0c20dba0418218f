use serde::{Deserialize, Serialize};

use crate::instructions::{InstrDesc, Operand, Reg};

/// Execution effect of an instruction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Nop,
    Mvi,
    Sta,
    Lda,
    Hlt,
    Adi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub op: Op,
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub width: u8, // 1, 2 or 3
    pub reg: Option<Reg>,
    pub imm: u16,
}

impl Decoded {
    /// The operand the assembler would have to be given to produce this encoding.
    pub fn operand(&self) -> Operand {
        match (self.op, self.reg) {
            (Op::Mvi, Some(reg)) => Operand::RegByte(reg, self.imm as u8),
            (Op::Sta | Op::Lda, _) => Operand::Addr(self.imm),
            (Op::Adi, _) => Operand::Byte(self.imm as u8),
            _ => Operand::None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty instruction window")]
    Empty,
    #[error("unknown opcode {0:#04x}")]
    Unknown(u8),
    #[error("{} needs {} bytes, only {have} available", .desc.mnemonic, .desc.len)]
    Truncated {
        desc: &'static InstrDesc,
        have: usize,
    },
}

pub trait Decoder {
    /// Decode the instruction at the start of `window`.
    fn decode(&self, window: &[u8]) -> Result<Decoded, DecodeError>;
}
