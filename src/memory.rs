use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub trait Bus {
    /// Addressable bytes; every valid address is below this.
    fn size(&self) -> usize;
    fn read_u8(&mut self, addr: u16) -> Result<u8>;
    fn write_u8(&mut self, addr: u16, val: u8) -> Result<()>;
}

/// Flat RAM starting at address 0. Every access is bounds-checked.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinearMemory {
    pub mem: Vec<u8>,
}

impl LinearMemory {
    pub fn new(size: usize) -> Self {
        Self { mem: vec![0; size] }
    }

    /// Copy `bytes` into memory starting at `addr`.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) -> Result<()> {
        let start = addr as usize;
        let Some(end) = start.checked_add(bytes.len()).filter(|&e| e <= self.mem.len()) else {
            bail!(
                "{} bytes at {addr:#06x} do not fit in {} bytes of RAM",
                bytes.len(),
                self.mem.len()
            );
        };
        self.mem[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn check(&self, addr: u16) -> Result<usize> {
        let off = addr as usize;
        if off >= self.mem.len() {
            bail!("address {addr:#06x} outside RAM of {} bytes", self.mem.len());
        }
        Ok(off)
    }
}

impl std::fmt::Debug for LinearMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMemory")
            .field("size", &self.mem.len())
            .finish()
    }
}

impl Bus for LinearMemory {
    fn size(&self) -> usize {
        self.mem.len()
    }
    fn read_u8(&mut self, addr: u16) -> Result<u8> {
        let off = self.check(addr)?;
        Ok(self.mem[off])
    }
    fn write_u8(&mut self, addr: u16, val: u8) -> Result<()> {
        let off = self.check(addr)?;
        self.mem[off] = val;
        Ok(())
    }
}
