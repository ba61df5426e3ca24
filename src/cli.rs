use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "audioscribe",
    version,
    about = "Upload an audio file to a cloud transcription API and save the transcript"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload, transcribe and save <title>.txt
    Run {
        /// Audio file to transcribe
        audio: PathBuf,

        /// Transcript file name without extension (default: audio file stem)
        #[arg(short, long)]
        title: Option<String>,

        /// Directory for the transcript (overrides [output] directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seconds between status checks (overrides [polling] interval_secs)
        #[arg(long)]
        interval: Option<u64>,

        /// Give up after this many status checks, 0 for no limit
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Upload an audio file and print its upload URL
    Upload {
        audio: PathBuf,
    },

    /// Show the current status of a transcript job
    Status {
        job_id: String,
    },

    /// Write a commented default config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,

        /// Where to write it (default: platform config directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
