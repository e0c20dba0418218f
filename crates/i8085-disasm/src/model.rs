use anyhow::{Context, Result};
use std::path::Path;

/// Read `path`, drop the first `skip` bytes and keep at most `len` of the rest.
pub fn load_raw_bin(path: &Path, skip: usize, len: Option<usize>) -> Result<Vec<u8>> {
    let file = std::fs::read(path).with_context(|| format!("Failed to open file {}", path.display()))?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(payload.to_vec())
}
