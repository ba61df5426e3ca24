use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::transcribe::backend::{JobId, JobPayload, TranscriptionApi, UploadReference};
use crate::transcribe::chunks::{ChunkReader, ChunkStream};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptCreated {
    id: String,
}

/// Blocking client for the AssemblyAI v2 upload/transcript endpoints.
pub struct AssemblyAiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for AssemblyAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AssemblyAiClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        if base_url.is_empty() {
            return Err(Error::Config("API base_url is empty".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Build a client from config, resolving the API key from the environment
    /// when the config leaves it empty.
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Stream any chunked reader to the upload endpoint. A local read error
    /// during the send wins over whatever the transport reports.
    pub fn upload_chunks<R>(&self, chunks: ChunkReader<R>) -> Result<UploadReference>
    where
        R: Read + Send + 'static,
    {
        let url = self.url("upload");
        tracing::debug!("Uploading audio to {}", url);

        let source = chunks
            .source()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| "upload body".into());
        let (body, read_failure) = ChunkStream::new(chunks);

        let sent = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .body(Body::new(body))
            .send();

        if let Some(e) = read_failure.take() {
            return Err(Error::io(source, e));
        }
        let response = check_status(sent?, "upload")?;
        let body: UploadResponse = parse_json(response, "upload")?;
        Ok(UploadReference(body.upload_url))
    }
}

/// Reject non-2xx responses with the status code and body text.
fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(Error::Remote(format!(
        "{} returned HTTP {}: {}",
        what,
        status.as_u16(),
        body
    )))
}

fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = response.text()?;
    serde_json::from_str(&body)
        .map_err(|e| Error::Remote(format!("malformed {} response: {}", what, e)))
}

impl TranscriptionApi for AssemblyAiClient {
    fn name(&self) -> &str {
        "assemblyai"
    }

    fn upload(&self, chunks: ChunkReader<File>) -> Result<UploadReference> {
        self.upload_chunks(chunks)
    }

    fn request_transcript(&self, audio: &UploadReference) -> Result<JobId> {
        let url = self.url("transcript");
        let response = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .json(&TranscriptRequest {
                audio_url: audio.as_str(),
            })
            .send()?;

        let response = check_status(response, "transcript request")?;
        let body: TranscriptCreated = parse_json(response, "transcript request")?;
        Ok(JobId(body.id))
    }

    fn job_status(&self, id: &JobId) -> Result<JobPayload> {
        let url = self.url(&format!("transcript/{}", id));
        let response = self
            .client
            .get(&url)
            .header("authorization", &self.api_key)
            .send()?;

        let response = check_status(response, "transcript status")?;
        parse_json(response, "transcript status")
    }
}
