use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::decoder::{DecodeError, Decoder};
use crate::exec::Executor;
use crate::instructions::{Reg, MAX_INSTR_LEN};
use crate::memory::Bus;

/// Working RAM of the reference platform.
pub const DEFAULT_RAM_SIZE: usize = 64_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub ram_size: usize,
    /// Instructions a single run may execute; `None` runs unbounded.
    pub max_steps: Option<u64>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_SIZE,
            max_steps: Some(10_000_000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub halted: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Invalid instruction {opcode:#04x} at {pc:#06x}")]
    InvalidInstruction { pc: u16, opcode: u8 },
    #[error("Truncated instruction at {pc:#06x}")]
    Truncated { pc: u16 },
    #[error("Bus error at {addr:#06x}: {source}")]
    Bus {
        addr: u16,
        #[source]
        source: Error,
    },
    #[error("CPU is halted")]
    Halted,
    #[error("Step budget of {0} instructions exhausted")]
    StepBudget(u64),
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, reset_pc: u16) {
        *self = Self {
            pc: reset_pc,
            ..Self::default()
        };
    }

    pub fn reg(&self, r: Reg) -> u8 {
        match r {
            Reg::A => self.a,
            Reg::B => self.b,
            Reg::C => self.c,
        }
    }

    pub fn set_reg(&mut self, r: Reg, val: u8) {
        match r {
            Reg::A => self.a = val,
            Reg::B => self.b = val,
            Reg::C => self.c = val,
        }
    }

    /// Execute one instruction, fetching from anywhere in RAM.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let end = bus.size();
        self.step_within(bus, dec, exec, end).map(|_| ())
    }

    /// Execute one instruction whose bytes must all lie below `end`.
    /// Returns the address following it, which may be 0x10000 when PC wraps.
    ///
    /// PC only moves once the effect has been applied, so a trapping step
    /// leaves registers and memory as they were.
    pub fn step_within<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
        end: usize,
    ) -> Result<usize, Trap> {
        if self.halted {
            return Err(Trap::Halted);
        }
        let pc = self.pc;
        let opcode = bus
            .read_u8(pc)
            .map_err(|source| Trap::Bus { addr: pc, source })?;

        let mut window = [opcode; MAX_INSTR_LEN];
        let avail = end.min(bus.size()).saturating_sub(pc as usize).min(MAX_INSTR_LEN);
        for i in 1..avail {
            let addr = pc.wrapping_add(i as u16);
            window[i] = bus
                .read_u8(addr)
                .map_err(|source| Trap::Bus { addr, source })?;
        }

        if avail == 0 {
            return Err(Trap::Truncated { pc });
        }
        let d = dec.decode(&window[..avail]).map_err(|e| match e {
            DecodeError::Unknown(opcode) => Trap::InvalidInstruction { pc, opcode },
            DecodeError::Empty | DecodeError::Truncated { .. } => Trap::Truncated { pc },
        })?;
        trace!("{pc:#06x}: {:02x} {}", d.opcode, d.mnemonic);

        exec.exec(self, bus, d)?;
        self.pc = pc.wrapping_add(d.width as u16);
        Ok(pc as usize + d.width as usize)
    }
}
