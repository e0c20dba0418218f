//! Single-pass assembler for the instruction table.
//!
//! Source is a sequence of instructions separated by whitespace. Mnemonics
//! and register names are uppercase, operands are fixed-width uppercase hex
//! (`MVI A, 0F`, `STA 1004`, `ADI 30`). `;` starts a comment running to the
//! end of the line. An instruction may not span lines.

use std::collections::TryReserveError;

use tracing::debug;

use crate::instructions::{self, AddrMode, EncodeError, Operand, MAX_INSTR_LEN};

/// Output growth step.
pub const BLOCK_SIZE: usize = 256;

/// Half-open byte span `[start, end)` of the source plus its decoded value, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub value: Option<u16>,
}

impl Token {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected a mnemonic")]
    ExpectedMnemonic,
    #[error("unknown mnemonic {0:?}")]
    UnknownMnemonic(String),
    #[error("unknown register {0:?}")]
    UnknownRegister(String),
    #[error("expected {0:?}")]
    ExpectedSeparator(char),
    #[error("expected {expected_digits} uppercase hex digits")]
    BadHex { expected_digits: usize },
    #[error("instruction continues past end of line")]
    UnexpectedNewline,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    /// Byte offset into the source where the problem was found.
    pub offset: usize,
    pub kind: ParseErrorKind,
}

#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("could not grow output buffer: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Cursor over the source text.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn text(&self, tok: &Token) -> &'a str {
        &self.src[tok.start..tok.end]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            offset: self.pos,
            kind,
        }
    }

    /// Skip blanks, newlines and comments. Returns whether a newline was crossed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start_line = self.line;
        while let Some(c) = self.peek() {
            match c {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b';' => {
                    // the newline ending the comment is left for the next round
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        self.line != start_line
    }

    /// Skip blanks inside an instruction; the instruction must continue on this line.
    fn skip_inline(&mut self) -> Result<(), ParseError> {
        let line = self.line;
        if self.skip_whitespace() {
            return Err(ParseError {
                line,
                offset: self.pos,
                kind: ParseErrorKind::UnexpectedNewline,
            });
        }
        if self.is_done() {
            return Err(self.err(ParseErrorKind::UnexpectedEnd));
        }
        Ok(())
    }

    /// Maximal run of `A`..=`Z`; possibly empty.
    pub fn word(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
            self.pos += 1;
        }
        Token {
            start,
            end: self.pos,
            value: None,
        }
    }

    /// Exactly `digits` uppercase hex digits, most significant first. Does not backtrack.
    pub fn hex(&mut self, digits: usize) -> Result<Token, ParseError> {
        let start = self.pos;
        let mut value: u16 = 0;
        for _ in 0..digits {
            let nib = self
                .peek()
                .and_then(hex_nibble)
                .ok_or_else(|| self.err(ParseErrorKind::BadHex { expected_digits: digits }))?;
            value = (value << 4) | nib as u16;
            self.pos += 1;
        }
        Ok(Token {
            start,
            end: self.pos,
            value: Some(value),
        })
    }

    fn separator(&mut self, sep: u8) -> Result<(), ParseError> {
        if self.peek() != Some(sep) {
            return Err(self.err(ParseErrorKind::ExpectedSeparator(sep as char)));
        }
        self.pos += 1;
        Ok(())
    }

    fn byte(&mut self) -> Result<u8, ParseError> {
        Ok(self.hex(2)?.value.unwrap_or_default() as u8)
    }

    /// Parse one instruction at the cursor and append its encoding to `out`.
    pub fn instruction(&mut self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        let tok = self.word();
        if tok.is_empty() {
            return Err(self.err(ParseErrorKind::ExpectedMnemonic));
        }
        let mnemonic = self.text(&tok);
        let desc = instructions::by_mnemonic(mnemonic).ok_or_else(|| ParseError {
            line: self.line,
            offset: tok.start,
            kind: ParseErrorKind::UnknownMnemonic(mnemonic.to_string()),
        })?;

        let operand = match desc.mode {
            AddrMode::None => Operand::None,
            AddrMode::RegisterPlusByte => {
                self.skip_inline()?;
                let reg_tok = self.word();
                let name = self.text(&reg_tok);
                let reg = instructions::by_register(desc.mnemonic, name)
                    .and_then(|row| row.reg)
                    .ok_or_else(|| ParseError {
                        line: self.line,
                        offset: reg_tok.start,
                        kind: ParseErrorKind::UnknownRegister(name.to_string()),
                    })?;
                self.skip_inline()?;
                self.separator(b',')?;
                self.skip_inline()?;
                Operand::RegByte(reg, self.byte()?)
            }
            AddrMode::Address16 => {
                self.skip_inline()?;
                Operand::Addr(self.hex(4)?.value.unwrap_or_default())
            }
            AddrMode::Byte => {
                self.skip_inline()?;
                Operand::Byte(self.byte()?)
            }
        };

        instructions::encode(desc.mnemonic, operand, out).map_err(|e| self.err(e.into()))
    }
}

/// Assemble `src` into a byte stream. Any error discards the partial output.
pub fn assemble(src: &str) -> Result<Vec<u8>, AsmError> {
    let mut lex = Lexer::new(src);
    let mut out = Vec::new();
    out.try_reserve_exact(BLOCK_SIZE)?;

    lex.skip_whitespace();
    while !lex.is_done() {
        // room for the widest instruction before encoding any
        if out.capacity() - out.len() < MAX_INSTR_LEN {
            out.try_reserve_exact(BLOCK_SIZE)?;
        }
        if let Err(e) = lex.instruction(&mut out) {
            debug!(line = e.line, offset = e.offset, "assembly failed: {}", e.kind);
            return Err(e.into());
        }
        lex.skip_whitespace();
    }
    debug!(bytes = out.len(), lines = lex.line(), "assembled");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_counts_lines_and_skips_comments() {
        let mut lex = Lexer::new(" \t; note\r\n\n  NOP");
        assert!(lex.skip_whitespace());
        assert_eq!(lex.line(), 3);
        assert_eq!(lex.pos(), 13);
        assert!(!lex.skip_whitespace());
    }

    #[test]
    fn comment_stops_before_newline() {
        let mut lex = Lexer::new("; only a comment");
        assert!(!lex.skip_whitespace());
        assert!(lex.is_done());
        assert_eq!(lex.line(), 1);
    }

    #[test]
    fn word_is_uppercase_run() {
        let mut lex = Lexer::new("MVIa");
        let tok = lex.word();
        assert_eq!(lex.text(&tok), "MVI");
        assert_eq!((tok.start, tok.end), (0, 3));
    }

    #[test]
    fn hex_reads_fixed_width() {
        let mut lex = Lexer::new("BEEF7");
        let tok = lex.hex(4).unwrap();
        assert_eq!(tok.value, Some(0xBEEF));
        assert_eq!(lex.pos(), 4);
    }

    #[test]
    fn hex_rejects_lowercase_and_short_input() {
        assert_eq!(
            Lexer::new("ff").hex(2).unwrap_err().kind,
            ParseErrorKind::BadHex { expected_digits: 2 }
        );
        assert_eq!(
            Lexer::new("12G4").hex(4).unwrap_err().kind,
            ParseErrorKind::BadHex { expected_digits: 4 }
        );
        assert_eq!(
            Lexer::new("1").hex(2).unwrap_err().kind,
            ParseErrorKind::BadHex { expected_digits: 2 }
        );
    }

    #[test]
    fn operand_on_next_line_is_rejected() {
        let mut lex = Lexer::new("STA\n1234");
        let mut out = Vec::new();
        let err = lex.instruction(&mut out).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedNewline);
        assert_eq!(err.line, 1);
    }
}
