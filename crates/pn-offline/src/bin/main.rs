//! peaknorm — batch peak normalizer
//!
//! Usage:
//!   peaknorm <input_directory> <output_directory> [target_peak]
//!   peaknorm in/ out/ 0.9 -j 8 -e wav -e flac --log-file run.log

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use log::LevelFilter;

use pn_offline::{BatchConfig, BatchSummary, Dispatcher, OfflineError};

#[derive(Parser, Debug)]
#[command(
    name = "peaknorm",
    version,
    about = "Normalize every audio file in a directory to a target peak level"
)]
struct Cli {
    /// Directory containing the source audio files
    input_directory: PathBuf,

    /// Directory for normalized output (created if missing)
    output_directory: PathBuf,

    /// Target peak as a linear amplitude (default 1.0)
    #[arg(allow_negative_numbers = true)]
    target_peak: Option<f64>,

    /// Worker thread count
    #[arg(short = 'j', long = "workers")]
    workers: Option<usize>,

    /// Accepted file extension; repeat to build the list
    #[arg(short = 'e', long = "ext")]
    extensions: Vec<String>,

    /// Run log path
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Output file-name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// defaults < config file < command line
    fn batch_config(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => BatchConfig::default(),
        };

        if let Some(target) = self.target_peak {
            config = config.with_target_peak(target);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if !self.extensions.is_empty() {
            config = config.with_extensions(&self.extensions);
        }
        if let Some(path) = &self.log_file {
            config = config.with_log_path(path);
        }
        if let Some(prefix) = &self.prefix {
            config = config.with_output_prefix(prefix);
        }

        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<BatchSummary> {
    let config = cli.batch_config()?;
    log::debug!("effective configuration: {:?}", config);

    let summary = Dispatcher::new(config)
        .run(&cli.input_directory, &cli.output_directory)
        .context("batch aborted")?;
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    init_logging(cli.verbose);
    log::info!("peaknorm {}", pn_offline::VERSION);

    match run(&cli) {
        Ok(summary) => {
            log::info!("{:?}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<OfflineError>() {
                Some(err) if err.is_configuration() => {
                    eprintln!("Configuration error: {:#}", e)
                }
                _ => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
