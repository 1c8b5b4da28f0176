//! Command-line interface for ttstream
//!
//! Provides argument parsing using clap derive macros, plus the command
//! implementations the binary dispatches to.

use crate::config::Config;
use crate::error::StreamError;
use crate::pipeline::error::{ErrorReporter, LogReporter, SilentReporter};
use crate::pipeline::orchestrator::{PipelineConfig, StreamPipeline};
use crate::pipeline::sink::WriterSink;
use crate::pipeline::types::StreamStats;
use crate::source::{CapturingSource, ChunkSource, ReaderSource};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reassemble MP3 audio from a streamed text-to-speech response
#[derive(Parser, Debug)]
#[command(
    name = "ttstream",
    version,
    about = "Reassemble MP3 audio from a streamed text-to-speech response",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress diagnostics (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stream summary)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Captured event stream to read (default: stdin)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Where to write the MP3 stream (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Read size in bytes (overrides config)
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Audio event discriminator (overrides config)
    #[arg(long, value_name = "EVENT")]
    pub audio_event: Option<String>,

    /// Save the raw response chunks to this directory
    #[arg(long, value_name = "DIR")]
    pub capture_dir: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

/// Load config from an explicit path, or the default location, then apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(StreamError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Config::load(path)?
        }
        None => Config::load_or_default(&Config::default_path())?,
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(cli: &Cli, mut config: Config) -> anyhow::Result<Config> {
    if let Some(size) = cli.chunk_size {
        config.source.chunk_size = size;
    }
    if let Some(ref event) = cli.audio_event {
        config.protocol.audio_event = event.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Read the input, reassemble frames and write them to the output.
pub fn run_convert(cli: &Cli, config: &Config) -> anyhow::Result<StreamStats> {
    let chunk_size = config.source.chunk_size;
    let reader = match cli.input {
        Some(ref path) => ReaderSource::from_path(path, chunk_size)?,
        None => ReaderSource::from_stdin(chunk_size),
    };
    let mut source: Box<dyn ChunkSource> = match cli.capture_dir {
        Some(ref dir) => {
            let capture = CapturingSource::new(reader, dir)
                .with_context(|| format!("Failed to prepare capture in {}", dir.display()))?;
            Box::new(capture)
        }
        None => Box::new(reader),
    };

    let writer: Box<dyn Write + Send> = match cli.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut sink = WriterSink::new(writer);

    let reporter: Arc<dyn ErrorReporter> = if cli.quiet {
        Arc::new(SilentReporter)
    } else {
        Arc::new(LogReporter)
    };
    let mut pipeline =
        StreamPipeline::new(PipelineConfig::from_config(config)).with_error_reporter(reporter);

    let stats = pipeline.run(source.as_mut(), &mut sink)?;
    Ok(stats)
}

/// Handle `ttstream config ...`.
pub fn handle_config_command(action: &ConfigAction, path: Option<&Path>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
