/// zvol command-line tool: inspect, validate and decode compressed volume
/// containers.
///
/// # Command overview
///
/// ```text
/// zvol <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print the metadata frame of a container
///   validate   Decode a container and report whether it is well formed
///   decode     Decode a container and write the raw elements
///   help       Print help information
///
/// Global options:
///   -v, --verbose          Log decode steps to stderr
///   --max-memory <BYTES>   Cap on engine memory (default 2 GiB)
///   -h, --help             Print help
///   -V, --version          Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
///
/// `RUST_LOG` overrides the level chosen by `--verbose`.
///
/// `--max-memory` also bounds what a container can claim: the output
/// buffer is sized from the frame's declared content size, so lower it
/// when decoding files from untrusted sources.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use zvol_engine::EngineConfig;

mod cmd_decode;
mod cmd_inspect;
mod cmd_validate;

// ── CLI root ──────────────────────────────────────────────────────────

/// Inspect, validate and decode zstd volume containers.
#[derive(Parser)]
#[command(name = "zvol", version, about = "Compressed volume container CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decode steps to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Largest engine memory in bytes; bounds the declared output size.
    #[arg(long, global = true, value_name = "BYTES")]
    max_memory: Option<usize>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        match self.max_memory {
            Some(bytes) => EngineConfig::default().with_max_memory(bytes),
            None => EngineConfig::default(),
        }
    }
}

// ── Sub-commands ──────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print the metadata frame of a container without decompressing it.
    Inspect(InspectArgs),
    /// Decode a container and report whether it is well formed.
    Validate(ValidateArgs),
    /// Decode a container and write its elements as little-endian bytes.
    Decode(DecodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────

/// Arguments for `zvol inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the container.
    pub file: PathBuf,

    /// Print the header as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `zvol validate`.
///
/// Runs a full decode. Exits 0 when the container decodes and its element
/// count matches the declared dimensions, 1 otherwise.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the container.
    pub file: PathBuf,
}

/// Arguments for `zvol decode`.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Effect                                               │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ -o/--output  │ Write elements to this file instead of stdout        │
/// │ --isolated   │ Decode on a fresh engine instance                    │
/// │ --strict     │ Fail when the element count differs from the header  │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Path to the container.
    pub file: PathBuf,

    /// Write the decoded elements to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Instantiate a fresh engine for this decode instead of sharing one.
    #[arg(long)]
    pub isolated: bool,

    /// Reject volumes whose element count differs from the header.
    #[arg(long)]
    pub strict: bool,
}

// ── Entry point ───────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.engine_config();
    let result = match &cli.command {
        Commands::Inspect(args) => cmd_inspect::run(args),
        Commands::Validate(args) => cmd_validate::run(args, config),
        Commands::Decode(args) => cmd_decode::run(args, config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    builder.parse_default_env();
    builder.init();
}
