//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use fftacc_core::SampleMode;
use std::path::PathBuf;

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "Backend to use, name[:key=value,...] [available: {}]",
        fftacc_host::backend_names_short()
    )
}

/// Sample width on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// One 32-bit sample per DATAIN write
    #[value(name = "32")]
    Bits32,
    /// Two 16-bit samples per DATAIN write
    #[value(name = "16")]
    Bits16,
}

impl From<ModeArg> for SampleMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Bits32 => SampleMode::Bits32,
            ModeArg::Bits16 => SampleMode::Bits16,
        }
    }
}

#[derive(Parser)]
#[command(name = "fftacc")]
#[command(author, version, about = "FFT accelerator test client", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Host configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Waveform options shared by `gen` and `run`
#[derive(clap::Args, Debug, Clone)]
pub struct WaveArgs {
    /// Component frequencies in Hz (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = vec![300.0, 550.0])]
    pub freq: Vec<f64>,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 10_000.0)]
    pub rate: f64,

    /// Number of samples
    #[arg(short = 'n', long, default_value_t = 1024)]
    pub count: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available backends
    ListBackends,

    /// Print the readable registers (reading STATUS clears it)
    Regs {
        /// Backend to use
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,
    },

    /// Run a complete load/process/drain session
    Run {
        /// Backend to use
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Sample file (generated waveform if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Sample width
        #[arg(short, long, value_enum, default_value_t = ModeArg::Bits32)]
        mode: ModeArg,

        /// Write the spectrum here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compare with the engine run directly on the same samples
        #[arg(long)]
        check: bool,

        #[command(flatten)]
        wave: WaveArgs,
    },

    /// Run the transform engine directly on a sample file
    Transform {
        /// Sample file
        #[arg(short, long)]
        input: PathBuf,

        /// Sample width (selects the output scale)
        #[arg(short, long, value_enum, default_value_t = ModeArg::Bits32)]
        mode: ModeArg,

        /// Write the spectrum here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute driver requests one by one
    ///
    /// Each request is one of: reset, configure <cfg>, load <word>, process,
    /// result, get <reg>, set <reg> <value>, code <code> [arg], ioctl <nr> [arg].
    Exec {
        /// Backend to use
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// File with one request per line
        #[arg(short, long, conflicts_with = "request")]
        script: Option<PathBuf>,

        /// Request given inline (repeatable)
        #[arg(short, long)]
        request: Vec<String>,
    },

    /// Generate a composed-sine sample file scaled to 0..255
    Gen {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// C array name
        #[arg(long, default_value = "wave_samples")]
        name: String,

        #[command(flatten)]
        wave: WaveArgs,
    },
}
