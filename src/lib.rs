pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod vm;

pub mod isa {
    pub mod i8085; // table-driven decoder for the 8085 subset
}

pub use asm::assemble;
pub use cpu::{Cpu, CpuConfig, Trap};
pub use memory::{Bus, LinearMemory};
pub use vm::{Exit, Machine, MachineState};
