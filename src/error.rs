use std::path::PathBuf;

/// Errors produced by the upload / transcribe / poll / save pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transcription service answered with a non-success status, an
    /// unparseable body, or could not be reached at all.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("transcript {job_id} still not finished after {attempts} status checks")]
    PollTimeout { job_id: String, attempts: u32 },

    #[error("invalid transcript title {0:?}")]
    InvalidTitle(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Remote(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
