use std::fmt;
use std::fs::File;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transcribe::chunks::ChunkReader;

/// URL returned by the service identifying previously uploaded audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadReference(pub String);

impl UploadReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side transcript job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    /// A status string this client does not know; treated as still running.
    Other(String),
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Status body returned by the transcript endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(default)]
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobPayload {
    pub fn status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Terminal result of a transcript job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    Completed { text: String },
    Failed { error: String },
}

/// The three remote calls the pipeline needs.
pub trait TranscriptionApi {
    fn name(&self) -> &str;

    /// Stream the chunks to the upload endpoint.
    fn upload(&self, chunks: ChunkReader<File>) -> Result<UploadReference>;

    /// Create a transcript job for previously uploaded audio.
    fn request_transcript(&self, audio: &UploadReference) -> Result<JobId>;

    /// Fetch the current state of a job.
    fn job_status(&self, id: &JobId) -> Result<JobPayload>;
}
