use crate::cpu::{Cpu, Trap};
use crate::decoder::{Decoded, Op};
use crate::instructions::Reg;
use crate::memory::Bus;

pub trait Executor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<(), Trap>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<(), Trap> {
        match d.op {
            Op::Nop => {}
            Op::Mvi => {
                let reg = d.reg.ok_or(Trap::InvalidInstruction {
                    pc: cpu.pc,
                    opcode: d.opcode,
                })?;
                cpu.set_reg(reg, d.imm as u8);
            }
            Op::Sta => {
                let addr = d.imm;
                bus.write_u8(addr, cpu.reg(Reg::A))
                    .map_err(|source| Trap::Bus { addr, source })?;
            }
            Op::Lda => {
                let addr = d.imm;
                cpu.a = bus
                    .read_u8(addr)
                    .map_err(|source| Trap::Bus { addr, source })?;
            }
            Op::Hlt => cpu.halted = true,
            // no flags are modelled
            Op::Adi => cpu.a = cpu.a.wrapping_add(d.imm as u8),
        }
        Ok(())
    }
}
