use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use garment_pattern::Padding;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "garment", version, about = "Sewing pattern specification toolkit")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a pattern specification
    Info {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Encode a pattern as a tensor bundle (JSON)
    Encode {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,

        /// Edge rows per panel (defaults to the longest panel)
        #[arg(long, value_name = "N")]
        pad: Option<usize>,

        /// Emit rotations as two rotation matrix columns instead of Euler angles
        #[arg(long)]
        two_column: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Rebuild a pattern from a tensor bundle
    Decode {
        #[arg(value_name = "TENSORS")]
        tensors: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Name of the rebuilt pattern
        #[arg(long)]
        name: Option<String>,

        /// Template whose parameters and properties the rebuilt pattern keeps
        #[arg(long, value_name = "SPEC")]
        template: Option<PathBuf>,

        /// Drop trailing rows close to the zero vector
        #[arg(long)]
        padded: bool,

        /// Drop trailing rows close to this vector instead
        #[arg(
            long,
            value_name = "X,Y,CX,CY",
            value_delimiter = ',',
            num_args = 4,
            allow_hyphen_values = true
        )]
        pad_vector: Option<Vec<f64>>,
    },
    /// Write one randomized sample of a parametric pattern
    Randomize {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Name of the sample (defaults to <pattern>_<seed>)
        #[arg(long)]
        name: Option<String>,
    },
    /// Sample a dataset of randomized patterns
    Dataset {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn padding(padded: bool, pad_vector: Option<Vec<f64>>) -> Result<Padding, CliError> {
    match pad_vector {
        Some(values) => {
            let pad: [f64; 4] = values
                .try_into()
                .map_err(|_| CliError::usage("--pad-vector takes exactly 4 values"))?;
            Ok(Padding::Padded(pad))
        }
        None if padded => Ok(Padding::ZEROS),
        None => Ok(Padding::Unpadded),
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Info { spec } => commands::info(&spec),
        Command::Encode {
            spec,
            pad,
            two_column,
            output,
        } => commands::encode(&spec, pad, two_column, output.as_deref()),
        Command::Decode {
            tensors,
            output,
            name,
            template,
            padded,
            pad_vector,
        } => commands::decode(commands::DecodeArgs {
            tensors,
            output,
            name,
            template,
            padding: padding(padded, pad_vector)?,
        }),
        Command::Randomize {
            spec,
            output,
            seed,
            name,
        } => commands::randomize(&spec, &output, seed, name),
        Command::Dataset { config } => commands::dataset(&config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => error::ErrorCode::Usage as u8,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.debug);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.code as u8)
        }
    }
}
