//! The instruction table shared by the assembler, the disassembler and the VM.
//!
//! Every supported opcode has exactly one [`InstrDesc`] row in [`TABLE`]. The
//! row names the mnemonic, the operand shape, the encoded length and the
//! [`Op`] the executor applies. Nothing else in the crate hard-codes opcodes.

use serde::{Deserialize, Serialize};

use crate::decoder::Op;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    A,
    B,
    C,
}

impl Reg {
    pub const fn name(self) -> &'static str {
        match self {
            Reg::A => "A",
            Reg::B => "B",
            Reg::C => "C",
        }
    }
}

/// Operand shape following the opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrMode {
    None,
    /// Register selected by the opcode itself, one immediate byte in the stream.
    RegisterPlusByte,
    /// 16-bit address, high byte first.
    Address16,
    Byte,
}

impl AddrMode {
    /// Operand bytes in the encoded stream.
    pub const fn width(self) -> u8 {
        match self {
            AddrMode::None => 0,
            AddrMode::RegisterPlusByte | AddrMode::Byte => 1,
            AddrMode::Address16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub mode: AddrMode,
    pub len: u8,
    /// Register the opcode targets; only `MVI` rows carry one.
    pub reg: Option<Reg>,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Op::Nop,
        mnemonic: "NOP",
        opcode: 0x00,
        mode: AddrMode::None,
        len: 1,
        reg: None,
    },
    InstrDesc {
        op: Op::Mvi,
        mnemonic: "MVI",
        opcode: 0x3E,
        mode: AddrMode::RegisterPlusByte,
        len: 2,
        reg: Some(Reg::A),
    },
    InstrDesc {
        op: Op::Mvi,
        mnemonic: "MVI",
        opcode: 0x06,
        mode: AddrMode::RegisterPlusByte,
        len: 2,
        reg: Some(Reg::B),
    },
    InstrDesc {
        op: Op::Mvi,
        mnemonic: "MVI",
        opcode: 0x0E,
        mode: AddrMode::RegisterPlusByte,
        len: 2,
        reg: Some(Reg::C),
    },
    InstrDesc {
        op: Op::Sta,
        mnemonic: "STA",
        opcode: 0x32,
        mode: AddrMode::Address16,
        len: 3,
        reg: None,
    },
    InstrDesc {
        op: Op::Lda,
        mnemonic: "LDA",
        opcode: 0x3A,
        mode: AddrMode::Address16,
        len: 3,
        reg: None,
    },
    InstrDesc {
        op: Op::Hlt,
        mnemonic: "HLT",
        opcode: 0x76,
        mode: AddrMode::None,
        len: 1,
        reg: None,
    },
    InstrDesc {
        op: Op::Adi,
        mnemonic: "ADI",
        opcode: 0xC6,
        mode: AddrMode::Byte,
        len: 2,
        reg: None,
    },
];

const fn max_len(table: &[InstrDesc]) -> usize {
    let mut i = 0;
    let mut max = 0;
    while i < table.len() {
        if table[i].len as usize > max {
            max = table[i].len as usize;
        }
        i += 1;
    }
    max
}

/// Widest encoding in [`TABLE`].
pub const MAX_INSTR_LEN: usize = max_len(TABLE);

pub fn by_opcode(opcode: u8) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.opcode == opcode)
}

/// First row for `mnemonic`. All rows sharing a mnemonic share its operand shape.
pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

/// Row for a register-selecting mnemonic, e.g. `("MVI", "B")`.
pub fn by_register(mnemonic: &str, reg: &str) -> Option<&'static InstrDesc> {
    TABLE
        .iter()
        .find(|d| d.mnemonic == mnemonic && d.reg.map(Reg::name) == Some(reg))
}

/// Registers accepted by `mnemonic`, with the opcode each one selects.
pub fn register_encoding(mnemonic: &str) -> impl Iterator<Item = (Reg, u8)> + '_ {
    TABLE
        .iter()
        .filter(move |d| d.mnemonic == mnemonic)
        .filter_map(|d| d.reg.map(|r| (r, d.opcode)))
}

/// Operand values as the assembler parsed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    None,
    RegByte(Reg, u8),
    Addr(u16),
    Byte(u8),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unknown mnemonic {0:?}")]
    UnknownMnemonic(String),
    #[error("invalid operands for {mnemonic}: {operand:?}")]
    InvalidOperands {
        mnemonic: &'static str,
        operand: Operand,
    },
}

/// Append the encoding of `mnemonic operand` to `out`.
pub fn encode(mnemonic: &str, operand: Operand, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let first =
        by_mnemonic(mnemonic).ok_or_else(|| EncodeError::UnknownMnemonic(mnemonic.to_string()))?;
    let invalid = || EncodeError::InvalidOperands {
        mnemonic: first.mnemonic,
        operand,
    };
    match (first.mode, operand) {
        (AddrMode::None, Operand::None) => out.push(first.opcode),
        (AddrMode::RegisterPlusByte, Operand::RegByte(reg, imm)) => {
            let desc = by_register(mnemonic, reg.name()).ok_or_else(invalid)?;
            out.extend_from_slice(&[desc.opcode, imm]);
        }
        (AddrMode::Address16, Operand::Addr(addr)) => {
            out.push(first.opcode);
            out.extend_from_slice(&addr.to_be_bytes());
        }
        (AddrMode::Byte, Operand::Byte(imm)) => out.extend_from_slice(&[first.opcode, imm]),
        _ => return Err(invalid()),
    }
    Ok(())
}
