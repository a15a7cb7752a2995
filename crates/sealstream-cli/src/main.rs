//! Sealstream command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # 32 random bytes as a key
//! head -c 32 /dev/urandom > stream.key
//!
//! sealstream encrypt --key-file stream.key --input notes.txt --output notes.sealed
//! sealstream decrypt --key-file stream.key < notes.sealed > notes.txt
//! ```
//!
//! Logs go to stderr so stdout can carry the stream.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use sealstream_cli::{Mode, load_key, run};
use sealstream_io::FrameConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Chunked authenticated file encryption
#[derive(Parser, Debug)]
#[command(name = "sealstream")]
#[command(about = "Encrypt and decrypt files as authenticated chunk streams")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt plaintext into a sealed stream
    Encrypt(StreamArgs),
    /// Verify and decrypt a sealed stream
    Decrypt(StreamArgs),
}

#[derive(clap::Args, Debug)]
struct StreamArgs {
    /// Key file: 32 raw bytes or 64 hex characters
    #[arg(short, long)]
    key_file: PathBuf,

    /// Input file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plaintext bytes per chunk
    #[arg(long, default_value_t = FrameConfig::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let (mode, stream) = match args.command {
        Command::Encrypt(stream) => (Mode::Encrypt, stream),
        Command::Decrypt(stream) => (Mode::Decrypt, stream),
    };

    let key = match load_key(&stream.key_file) {
        Ok(key) => key,
        Err(err) => {
            tracing::error!(%err, "cannot load key");
            return ExitCode::FAILURE;
        },
    };

    let config = FrameConfig { chunk_size: stream.chunk_size, ..Default::default() };

    match run(mode, &key, stream.input.as_deref(), stream.output.as_deref(), config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, ?mode, "stream failed");
            ExitCode::FAILURE
        },
    }
}
