//! SparseDev CLI
//!
//! Demo driver for the in-memory sparse device store. The store is transient,
//! so each invocation builds a fresh registry from the command-line geometry,
//! exercises it in-process, and prints the diagnostic dump.

use clap::{Parser, Subcommand};
use sparsedev::{Config, DeviceRegistry, OpenMode, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// SparseDev CLI
#[derive(Parser, Debug)]
#[command(name = "sparsedev-cli")]
#[command(about = "In-memory sparse pseudo-device store")]
#[command(version)]
struct Args {
    /// Quantum size in bytes
    #[arg(short, long, default_value = "4000")]
    quantum: usize,

    /// Slots per quantum set
    #[arg(short = 's', long, default_value = "1000")]
    qset_size: usize,

    /// Number of devices to create
    #[arg(short, long, default_value = "4")]
    devices: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write data at an offset, read it back, and verify
    Roundtrip {
        /// Device index
        #[arg(long, default_value = "0")]
        device: usize,

        /// Byte offset to write at
        #[arg(long, default_value = "0")]
        offset: u64,

        /// The data to write
        data: String,
    },

    /// Touch a single far-away byte and show what actually got allocated
    Sparse {
        /// Device index
        #[arg(long, default_value = "0")]
        device: usize,

        /// Byte offset to touch
        #[arg(long, default_value = "1000000")]
        offset: u64,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sparsedev=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("SparseDev v{}", sparsedev::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Build config from args
    let config = Config::builder()
        .quantum(args.quantum)
        .qset_size(args.qset_size)
        .device_count(args.devices)
        .build();

    let registry = DeviceRegistry::new(config)?;

    match args.command {
        Commands::Roundtrip {
            device,
            offset,
            data,
        } => roundtrip(&registry, device, offset, data.as_bytes()),
        Commands::Sparse { device, offset } => sparse(&registry, device, offset),
    }
}

/// Write `data` at `offset`, read it back, and compare.
fn roundtrip(registry: &DeviceRegistry, device: usize, offset: u64, data: &[u8]) -> Result<()> {
    let mut handle = registry.open(device, OpenMode::ReadWrite)?;

    // Write, looping over partial completions.
    handle.seek(offset);
    let mut remaining = data;
    let mut calls = 0;
    while !remaining.is_empty() {
        let n = handle.write(remaining)?;
        remaining = &remaining[n..];
        calls += 1;
    }
    tracing::info!("wrote {} bytes in {} calls", data.len(), calls);

    // Read back, looping until the store stops producing.
    handle.seek(offset);
    let mut readback = Vec::with_capacity(data.len());
    while readback.len() < data.len() {
        let chunk = handle.read(data.len() - readback.len())?;
        if chunk.is_empty() {
            break;
        }
        readback.extend_from_slice(&chunk);
    }

    if readback == data {
        tracing::info!("verified {} bytes at offset {}", data.len(), offset);
    } else {
        tracing::error!("readback mismatch: got {} bytes", readback.len());
    }

    print!("{}", registry.dump());
    Ok(())
}

/// Write one byte at `offset` and report the allocation footprint.
fn sparse(registry: &DeviceRegistry, device: usize, offset: u64) -> Result<()> {
    let mut handle = registry.open(device, OpenMode::ReadWrite)?;
    handle.seek(offset);
    handle.write(b"*")?;

    let stats = registry.device(device)?.stats();
    tracing::info!(
        "size {} bytes, {} chain sets, {} quanta allocated ({} bytes held)",
        stats.size,
        stats.chain_len(),
        stats.allocated_quanta(),
        stats.allocated_bytes()
    );

    print!("{}", registry.dump());
    Ok(())
}
