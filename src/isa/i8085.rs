use crate::decoder::{Decoded, DecodeError, Decoder};
use crate::instructions::{self, AddrMode};

/// 8085 subset decoder driven by [`instructions::TABLE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct I8085Decoder;

impl I8085Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for I8085Decoder {
    fn decode(&self, window: &[u8]) -> Result<Decoded, DecodeError> {
        let &opcode = window.first().ok_or(DecodeError::Empty)?;
        let desc = instructions::by_opcode(opcode).ok_or(DecodeError::Unknown(opcode))?;
        let len = desc.len as usize;
        if window.len() < len {
            return Err(DecodeError::Truncated {
                desc,
                have: window.len(),
            });
        }
        let imm = match desc.mode {
            AddrMode::None => 0,
            AddrMode::RegisterPlusByte | AddrMode::Byte => window[1] as u16,
            // addresses are stored high byte first
            AddrMode::Address16 => u16::from_be_bytes([window[1], window[2]]),
        };
        Ok(Decoded {
            op: desc.op,
            mnemonic: desc.mnemonic,
            opcode,
            width: desc.len,
            reg: desc.reg,
            imm,
        })
    }
}
