use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use i8085_rs::disasm::{disassemble, write_listing};
use i8085_rs::isa::i8085::I8085Decoder;

use i8085_disasm::load_raw_bin;

#[derive(Parser, Debug)]
#[command(author, version, about = "8085-subset disassembler CLI", long_about=None)]
struct Cli {
    /// Skip N bytes at start of file before decoding
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Limit bytes decoded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write output to file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<String>,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let bytes = load_raw_bin(Path::new(&cli.input), cli.skip, cli.len)?;

    let dec = I8085Decoder::new();
    let lines = disassemble(&dec, &bytes);

    let mut buf = Vec::new();
    match cli.format {
        OutputFormat::Text => write_listing(&mut buf, &lines)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut buf, &lines)?;
            buf.push(b'\n');
        }
    }
    if let Some(path) = cli.out {
        std::fs::write(path, buf)?;
    } else {
        std::io::stdout().lock().write_all(&buf)?;
    }
    Ok(())
}
