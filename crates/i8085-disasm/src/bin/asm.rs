use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use i8085_rs::assemble;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiny 8085-subset assembler")]
struct Opts {
    /// Input assembly file (uppercase mnemonics, hex operands, `;` comments)
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output binary file (raw bytes, addresses high byte first)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)
        .with_context(|| format!("Failed to read input file {}", opts.input.display()))?;
    // nothing is written unless assembly succeeds
    let code = assemble(&src)
        .with_context(|| format!("Failed to assemble {}", opts.input.display()))?;
    fs::write(&opts.output, &code)
        .with_context(|| format!("Failed to open output file {}", opts.output.display()))?;
    Ok(())
}
