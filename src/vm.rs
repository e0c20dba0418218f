//! Program runner: RAM at address 0 holds the program, execution starts at
//! PC 0 and ends at `HLT` or when PC reaches the end of the loaded bytes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cpu::{Cpu, CpuConfig, Trap};
use crate::exec::IntExecutor;
use crate::isa::i8085::I8085Decoder;
use crate::memory::{Bus, LinearMemory};

/// Largest RAM a 16-bit address can reach.
pub const MAX_RAM_SIZE: usize = 0x1_0000;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("RAM size {0} outside 1..={MAX_RAM_SIZE}")]
    RamSize(usize),
    #[error("program of {len} bytes does not fit in {capacity} bytes of RAM")]
    ProgramTooLarge { len: usize, capacity: usize },
    #[error("could not copy program into RAM: {0}")]
    Memory(#[source] anyhow::Error),
}

/// How a run ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exit {
    Halted,
    EndOfProgram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Running,
    Finished(Exit),
}

/// Register file snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub pc: u16,
    pub halted: bool,
    pub steps: u64,
}

#[derive(Debug)]
pub struct Machine {
    pub cpu: Cpu,
    pub mem: LinearMemory,
    cfg: CpuConfig,
    program_len: usize,
    /// Unwrapped address of the next instruction; reaches `program_len` at the end.
    next: usize,
    steps: u64,
    dec: I8085Decoder,
    exec: IntExecutor,
}

impl Machine {
    /// Fresh machine with `program` copied to address 0.
    pub fn load(cfg: CpuConfig, program: &[u8]) -> Result<Self, LoadError> {
        if cfg.ram_size == 0 || cfg.ram_size > MAX_RAM_SIZE {
            return Err(LoadError::RamSize(cfg.ram_size));
        }
        if program.len() > cfg.ram_size {
            return Err(LoadError::ProgramTooLarge {
                len: program.len(),
                capacity: cfg.ram_size,
            });
        }
        let mut mem = LinearMemory::new(cfg.ram_size);
        mem.load(0, program).map_err(LoadError::Memory)?;

        let mut cpu = Cpu::new();
        cpu.reset(0);
        debug!(bytes = program.len(), ram = cfg.ram_size, "program loaded");
        Ok(Self {
            cpu,
            mem,
            cfg,
            program_len: program.len(),
            next: 0,
            steps: 0,
            dec: I8085Decoder::new(),
            exec: IntExecutor,
        })
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn status(&self) -> Status {
        if self.cpu.halted {
            Status::Finished(Exit::Halted)
        } else if self.next >= self.program_len {
            Status::Finished(Exit::EndOfProgram)
        } else {
            Status::Running
        }
    }

    pub fn read(&mut self, addr: u16) -> anyhow::Result<u8> {
        self.mem.read_u8(addr)
    }

    /// Execute one instruction unless already finished. Stepping a halted
    /// machine is [`Trap::Halted`]; stepping past the program end is a no-op.
    pub fn step(&mut self) -> Result<Status, Trap> {
        if let Status::Finished(Exit::EndOfProgram) = self.status() {
            return Ok(self.status());
        }
        let end = self.program_len;
        self.next = self
            .cpu
            .step_within(&mut self.mem, &self.dec, &self.exec, end)?;
        self.steps += 1;
        Ok(self.status())
    }

    /// Step until a terminal state, an execution error or the step budget runs out.
    pub fn run(&mut self) -> Result<Exit, Trap> {
        loop {
            if let Status::Finished(exit) = self.status() {
                debug!(?exit, steps = self.steps, "run finished");
                return Ok(exit);
            }
            if let Some(max) = self.cfg.max_steps {
                if self.steps >= max {
                    return Err(Trap::StepBudget(max));
                }
            }
            if let Err(trap) = self.step() {
                debug!(pc = self.cpu.pc, steps = self.steps, "trap: {trap}");
                return Err(trap);
            }
        }
    }

    pub fn state(&self) -> MachineState {
        MachineState {
            a: self.cpu.a,
            b: self.cpu.b,
            c: self.cpu.c,
            pc: self.cpu.pc,
            halted: self.cpu.halted,
            steps: self.steps,
        }
    }
}
