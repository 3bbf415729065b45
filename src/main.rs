use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hufpack::bitstream::payload_len;

/// Base name used when no path is given, as in the original menu tool.
const DEFAULT_BASE: &str = "compressed";

#[derive(Debug, Parser)]
#[command(version, about = "Static Huffman file compressor")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress INPUT into BASE and BASE.header
    Compress {
        input: PathBuf,
        #[arg(short, long, default_value = DEFAULT_BASE)]
        output: PathBuf,
    },
    /// Restore BASE and BASE.header into OUTPUT
    Decompress {
        output: PathBuf,
        #[arg(short, long, default_value = DEFAULT_BASE)]
        input: PathBuf,
    },
    /// Print and check the header stored next to BASE
    Inspect {
        #[arg(default_value = DEFAULT_BASE)]
        base: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compress { input, output } => {
            hufpack::compress(&input, &output)
                .with_context(|| format!("compress {}", input.display()))?;
            println!("Compression completed.");
        }
        Command::Decompress { output, input } => {
            hufpack::decompress(&input, &output)
                .with_context(|| format!("decompress {}", input.display()))?;
            println!("Decompression completed.");
        }
        Command::Inspect { base } => {
            let header = hufpack::inspect(&base)
                .with_context(|| format!("read header of {}", base.display()))?;
            let payload = std::fs::metadata(&base)
                .with_context(|| format!("stat {}", base.display()))?
                .len();
            println!(
                "Bits: {}, OriginalLength: {}, Symbols: {}, Payload: {} bytes (expected {})",
                header.bit_count,
                header.original_len(),
                header.frequencies.distinct(),
                payload,
                payload_len(header.bit_count),
            );
            if let Err(e) = header.validate(payload) {
                bail!("{} is not a consistent archive: {e}", base.display());
            }
            println!("Check: ok");
        }
    }

    Ok(())
}
