use std::fmt;
use std::io;

use serde::Serialize;
use tracing::debug;

use crate::decoder::{Decoded, DecodeError, Decoder};
use crate::instructions::{AddrMode, InstrDesc, Operand, MAX_INSTR_LEN};

pub const UNKNOWN: &str = "Unknown Instruction";

pub fn fmt_decoded(d: &Decoded) -> String {
    match d.operand() {
        Operand::None => d.mnemonic.to_string(),
        Operand::RegByte(reg, imm) => format!("{} {}, {:02x}", d.mnemonic, reg.name(), imm),
        Operand::Addr(addr) => format!("{} {:04x}", d.mnemonic, addr),
        Operand::Byte(imm) => format!("{} {:02x}", d.mnemonic, imm),
    }
}

/// Text for an instruction cut short by the end of the buffer; missing bytes show as `??`.
fn fmt_truncated(desc: &InstrDesc, operands: &[u8]) -> String {
    let hex = |i: usize| {
        operands
            .get(i)
            .map_or_else(|| "??".to_string(), |b| format!("{b:02x}"))
    };
    match (desc.mode, desc.reg) {
        (AddrMode::RegisterPlusByte, Some(reg)) => {
            format!("{} {}, {}", desc.mnemonic, reg.name(), hex(0))
        }
        (AddrMode::Address16, _) => format!("{} {}{}", desc.mnemonic, hex(0), hex(1)),
        (AddrMode::None, _) => desc.mnemonic.to_string(),
        _ => format!("{} {}", desc.mnemonic, hex(0)),
    }
}

/// One listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub text: String,
    pub known: bool,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..MAX_INSTR_LEN {
            match self.bytes.get(i) {
                Some(b) => write!(f, "{b:02x} ")?,
                None => f.write_str("   ")?,
            }
        }
        f.write_str(&self.text)
    }
}

/// Decode all of `bytes`. Never fails: unknown opcodes become a one-byte
/// [`UNKNOWN`] row and decoding resumes at the next byte.
pub fn disassemble<D: Decoder>(dec: &D, bytes: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pc = 0usize;
    while pc < bytes.len() {
        let window = &bytes[pc..(pc + MAX_INSTR_LEN).min(bytes.len())];
        match dec.decode(window) {
            Ok(d) => {
                let width = d.width as usize;
                lines.push(Line {
                    offset: pc,
                    bytes: window[..width].to_vec(),
                    text: fmt_decoded(&d),
                    known: true,
                });
                pc += width;
            }
            Err(DecodeError::Unknown(opcode)) => {
                debug!("unknown opcode {opcode:#04x} at {pc:#06x}");
                lines.push(Line {
                    offset: pc,
                    bytes: vec![opcode],
                    text: UNKNOWN.to_string(),
                    known: false,
                });
                pc += 1;
            }
            Err(DecodeError::Truncated { desc, .. }) => {
                debug!("{} at {pc:#06x} runs past end of input", desc.mnemonic);
                lines.push(Line {
                    offset: pc,
                    bytes: window.to_vec(),
                    text: fmt_truncated(desc, &window[1..]),
                    known: true,
                });
                pc = bytes.len();
            }
            Err(DecodeError::Empty) => break,
        }
    }
    lines
}

pub fn write_listing<W: io::Write>(out: &mut W, lines: &[Line]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
