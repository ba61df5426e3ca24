use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::transcribe::assemblyai::AssemblyAiClient;
use crate::transcribe::backend::{TranscriptOutcome, TranscriptionApi, UploadReference};
use crate::transcribe::chunks::ChunkReader;
use crate::transcribe::poller::{self, PollPolicy};
use crate::transcribe::writer;

/// One audio file to transcribe and where to put the result.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio: PathBuf,
    pub title: String,
    pub output_dir: PathBuf,
    pub chunk_size: usize,
}

/// What the pipeline did with the terminal job state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResult {
    Saved(PathBuf),
    Failed(String),
}

/// Title used when none is given: the audio file stem.
pub fn default_title(audio: &Path) -> Option<String> {
    audio
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
}

/// Stream `audio` to the upload endpoint.
pub fn upload_file<A>(api: &A, audio: &Path, chunk_size: usize) -> crate::Result<UploadReference>
where
    A: TranscriptionApi + ?Sized,
{
    let chunks = ChunkReader::open(audio, chunk_size)?;
    tracing::info!("Uploading {} via {}", audio.display(), api.name());
    let reference = api.upload(chunks)?;
    tracing::info!("Uploaded: {}", reference);
    Ok(reference)
}

/// Create a job for `reference` and poll it to a terminal state.
pub fn transcribe_reference<A, S>(
    api: &A,
    reference: &UploadReference,
    policy: &PollPolicy,
    sleep: S,
) -> crate::Result<TranscriptOutcome>
where
    A: TranscriptionApi + ?Sized,
    S: FnMut(Duration),
{
    let job = api.request_transcript(reference)?;
    tracing::info!("Transcript job created: {}", job);
    let payload = poller::poll_until_terminal(api, &job, policy, sleep)?;
    poller::into_outcome(payload)
}

/// Upload, transcribe, poll and save. A failed job is reported, not written.
pub fn run_pipeline<A, S>(
    api: &A,
    request: &TranscribeRequest,
    policy: &PollPolicy,
    sleep: S,
) -> crate::Result<SaveResult>
where
    A: TranscriptionApi + ?Sized,
    S: FnMut(Duration),
{
    // Validate the title up front so a bad one never costs an upload.
    writer::transcript_path(&request.output_dir, &request.title)?;

    let reference = upload_file(api, &request.audio, request.chunk_size)?;
    match transcribe_reference(api, &reference, policy, sleep)? {
        TranscriptOutcome::Completed { text } => {
            let path = writer::write_transcript(&request.output_dir, &request.title, &text)?;
            tracing::info!("Transcript saved: {}", path.display());
            Ok(SaveResult::Saved(path))
        }
        TranscriptOutcome::Failed { error } => {
            tracing::error!("Transcription failed: {}", error);
            Ok(SaveResult::Failed(error))
        }
    }
}

/// Command-line entry point for `run`.
pub fn run_transcribe(config: &Config, request: &TranscribeRequest) -> Result<()> {
    let api = AssemblyAiClient::from_config(&config.api)?;
    let policy = PollPolicy::from(&config.polling);

    match run_pipeline(&api, request, &policy, std::thread::sleep)? {
        SaveResult::Saved(path) => {
            println!("Transcript saved: {}", path.display());
            Ok(())
        }
        SaveResult::Failed(error) => anyhow::bail!("Transcription failed: {}", error),
    }
}
