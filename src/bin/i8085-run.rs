use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use i8085_rs::{CpuConfig, Machine};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run an 8085-subset binary, loaded at address 0"
)]
struct Opts {
    /// JSON file with a `CpuConfig` (flags below override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// RAM size in bytes (1..=65536)
    #[arg(long)]
    ram_size: Option<usize>,
    /// Abort after this many instructions (0 disables the limit)
    #[arg(long)]
    max_steps: Option<u64>,
    /// Print the final register state as JSON
    #[arg(long)]
    dump_state: bool,
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
}

fn load_config(opts: &Opts) -> Result<CpuConfig> {
    let mut cfg: CpuConfig = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&txt)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => CpuConfig::default(),
    };
    if let Some(size) = opts.ram_size {
        cfg.ram_size = size;
    }
    if let Some(max) = opts.max_steps {
        cfg.max_steps = (max != 0).then_some(max);
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;

    let bytes = std::fs::read(&opts.input)
        .with_context(|| format!("Failed to open file {}", opts.input.display()))?;
    let mut vm = Machine::load(cfg, &bytes).context("Failed to initialize VM")?;

    let exit = vm.run().context("Failed to execute instruction");
    if opts.dump_state {
        println!("{}", serde_json::to_string_pretty(&vm.state())?);
    }
    exit?;
    Ok(())
}
