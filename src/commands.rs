use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{self, Config};
use crate::transcribe::assemblyai::AssemblyAiClient;
use crate::transcribe::backend::{JobId, JobPayload, TranscriptionApi};
use crate::transcribe::runner::{self, TranscribeRequest};

/// Overrides given on the `run` command line.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub title: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub interval: Option<u64>,
    pub max_attempts: Option<u32>,
}

/// Fold command-line overrides into the config and build the request.
pub fn prepare_run(
    mut config: Config,
    audio: &Path,
    overrides: RunOverrides,
) -> Result<(Config, TranscribeRequest)> {
    if let Some(secs) = overrides.interval {
        config.polling.interval_secs = secs;
    }
    if let Some(max) = overrides.max_attempts {
        config.polling.max_attempts = max;
    }
    if let Some(dir) = overrides.output_dir {
        config.output.directory = dir;
    }

    let title = match overrides.title {
        Some(t) => t,
        None => runner::default_title(audio).with_context(|| {
            format!("cannot derive a title from {}, pass --title", audio.display())
        })?,
    };

    let request = TranscribeRequest {
        audio: audio.to_path_buf(),
        title,
        output_dir: config.output.directory.clone(),
        chunk_size: config.upload.chunk_size,
    };
    Ok((config, request))
}

/// Upload only and print the resulting URL.
pub fn upload_only(config: &Config, audio: &Path) -> Result<()> {
    let api = AssemblyAiClient::from_config(&config.api)?;
    let reference = runner::upload_file(&api, audio, config.upload.chunk_size)?;
    println!("{}", reference);
    Ok(())
}

/// Query a job once and print what the service reports.
pub fn show_job_status(config: &Config, job_id: &str) -> Result<()> {
    let api = AssemblyAiClient::from_config(&config.api)?;
    let payload = api.job_status(&JobId(job_id.to_string()))?;
    print!("{}", format_status(&payload));
    Ok(())
}

fn format_status(payload: &JobPayload) -> String {
    let mut out = format!("Transcript {}: {}\n", payload.id, payload.status());
    if let Some(error) = &payload.error {
        out.push_str(&format!("  error: {}\n", error));
    }
    if let Some(text) = &payload.text {
        out.push_str(&format!("  text:  {}\n", text));
    }
    out
}

/// Write the commented default config. Refuses to clobber unless `force`.
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config::platform_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Config::generate_default_commented())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote config: {}", path.display());
    Ok(path)
}
