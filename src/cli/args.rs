//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::recording::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "opus-recorder",
    version,
    about = "Record audio from the default input device into Ogg/Opus or WAV"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record from the default input device to a file
    Record(RecordArgs),

    /// Show whether MIME types are supported by this build
    Check {
        /// MIME types to check, e.g. "audio/ogg;codecs=opus"
        #[arg(required = true)]
        mime: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Output file (named after the container if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Recording length, e.g. "10s", "1m30s" or plain seconds
    #[arg(short, long, default_value = "10s")]
    pub duration: Duration,

    /// Container MIME type (config file value when omitted)
    #[arg(short, long)]
    pub mime: Option<String>,

    /// Target bitrate in bits per second
    #[arg(short, long)]
    pub bitrate: Option<u32>,

    /// Deliver encoded data every interval instead of once at stop
    #[arg(short, long)]
    pub timeslice: Option<Duration>,

    /// Read defaults from a TOML config file
    #[arg(short, long, value_name = "FILE", env = "OPUS_RECORDER_CONFIG")]
    pub config: Option<PathBuf>,
}
